//! Reconciliation of local edits into push intents.
//!
//! Every tracked mutation reduces to a [`ChangeKind`] for one uid. The
//! repository keeps at most one pending intent per uid; when a new change
//! arrives, [`reconcile`] decides how the pending intent evolves. The
//! interesting case is an object created and then deleted before a push: both
//! intents cancel and the store never hears about it.

/// The kind of change pending for an object since the last sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    New,
    Update,
    Delete,
}

/// What the repository must do with an incoming change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconciled {
    /// Drop the pending intent entirely; the object never existed remotely.
    Discard,
    /// Record a deletion and move the object into the tombstone caches.
    RecordDelete,
    /// Record a creation and insert the object into the live caches.
    RecordNew,
    /// Record an update, but only if the value actually changed.
    RecordUpdateIfChanged,
    /// A pending intent already covers this change.
    Ignore,
}

/// Combine the pending intent for a uid with an incoming change.
pub(crate) fn reconcile(pending: Option<ChangeKind>, incoming: ChangeKind) -> Reconciled {
    match (pending, incoming) {
        (Some(ChangeKind::New), ChangeKind::Delete) => Reconciled::Discard,
        (_, ChangeKind::Delete) => Reconciled::RecordDelete,
        (_, ChangeKind::New) => Reconciled::RecordNew,
        (None, ChangeKind::Update) => Reconciled::RecordUpdateIfChanged,
        (Some(_), ChangeKind::Update) => Reconciled::Ignore,
    }
}
