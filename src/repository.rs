//! The local, in-memory copy of the note store.
//!
//! A [`LocalRepository`] holds the notebooks and notes as last seen from the
//! server, together with everything needed to push local edits back: one
//! pending [`ChangeKind`] per object uid, tombstone caches for deleted
//! objects, and the pre-rename summary of renamed notebooks. Mutations made
//! through the repository are tracked; mutations of notes and notebooks
//! already in the repository go through the [`NoteMut`] and [`NotebookMut`]
//! guards returned by [`note_mut`](LocalRepository::note_mut) and
//! [`notebook_mut`](LocalRepository::notebook_mut).
//!
//! While the sync engine replays server state into the repository it
//! suspends tracking; a suspended repository drops tracked mutations
//! entirely. Suspension is a plain flag, not a counter, so it does not nest.

use std::collections::BTreeMap;

use crate::tracker::{reconcile, ChangeKind, Reconciled};
use crate::types::{
    AuditInformation, Classification, Color, Identification, Note, Notebook, Tag, PRODUCT_ID,
};

/// What a tracked mutation did, carried alongside the [`ChangeKind`].
enum Change {
    /// A notebook lifecycle change; the value is present for creations.
    Notebook(Option<Notebook>),
    /// A note lifecycle change within the given notebook.
    Note {
        notebook: String,
        value: Option<Note>,
    },
    /// The tag set of a note changed. Always treated as a content update.
    Categories,
    /// A plain field changed (or didn't).
    Field { changed: bool },
}

/// The client-side cache of notebooks, notes and pending changes.
#[derive(Debug, Default)]
pub struct LocalRepository {
    notebooks: BTreeMap<String, Notebook>,
    deleted_notebooks: BTreeMap<String, Notebook>,
    deleted_notes: BTreeMap<String, BTreeMap<String, Note>>,
    changes: BTreeMap<String, ChangeKind>,
    renames: BTreeMap<String, String>,
    suspended: bool,
}

impl LocalRepository {
    pub fn new() -> Self {
        LocalRepository::default()
    }

    /// Whether the repository holds no notebooks at all.
    pub fn is_empty(&self) -> bool {
        self.notebooks.is_empty() && self.deleted_notebooks.is_empty()
    }

    pub fn notebooks(&self) -> impl Iterator<Item = &Notebook> {
        self.notebooks.values()
    }

    pub fn notebook(&self, uid: &str) -> Option<&Notebook> {
        self.notebooks.get(uid)
    }

    pub fn notebook_by_summary(&self, summary: &str) -> Option<&Notebook> {
        self.notebooks.values().find(|b| b.summary() == summary)
    }

    /// Look a note up by uid across all live notebooks.
    pub fn note(&self, uid: &str) -> Option<&Note> {
        self.notebooks.values().find_map(|b| b.note(uid))
    }

    /// The pending change for a uid, if any.
    pub fn change(&self, uid: &str) -> Option<ChangeKind> {
        self.changes.get(uid).copied()
    }

    pub fn tracked_changes(&self) -> impl Iterator<Item = (&str, ChangeKind)> {
        self.changes.iter().map(|(uid, kind)| (uid.as_str(), *kind))
    }

    /// Adopt already-synchronized notebooks as the clean baseline.
    ///
    /// Nothing is tracked; the notebooks are assumed to exist remotely
    /// exactly as given.
    pub fn track_existing(&mut self, notebooks: Vec<Notebook>) {
        for book in notebooks {
            self.insert_notebook(book);
        }
    }

    /// Create a notebook and track it as new.
    ///
    /// Returns `None` when tracking is suspended (the creation is dropped).
    pub fn create_notebook(&mut self, uid: &str, summary: &str) -> Option<&Notebook> {
        let book = Notebook::new(
            Identification::new(uid, PRODUCT_ID),
            AuditInformation::now(),
            Classification::Public,
            summary,
        );
        if self.apply(uid, ChangeKind::New, Change::Notebook(Some(book))) {
            self.notebooks.get(uid)
        } else {
            None
        }
    }

    /// Delete a notebook and all of its notes, tracking the deletion.
    pub fn delete_notebook(&mut self, uid: &str) -> bool {
        if !self.notebooks.contains_key(uid) {
            return false;
        }
        self.apply(uid, ChangeKind::Delete, Change::Notebook(None))
    }

    /// Create a note inside a notebook and track it as new.
    ///
    /// Returns the uid of the new note, or `None` when the notebook does not
    /// exist or tracking is suspended.
    pub fn create_note(&mut self, notebook_uid: &str, summary: &str) -> Option<String> {
        if !self.notebooks.contains_key(notebook_uid) {
            return None;
        }
        let note = Note::new(
            Identification::generate(),
            AuditInformation::now(),
            Classification::Public,
            summary,
        );
        let uid = note.uid().to_string();
        if self.apply(
            &uid,
            ChangeKind::New,
            Change::Note {
                notebook: notebook_uid.to_string(),
                value: Some(note),
            },
        ) {
            Some(uid)
        } else {
            None
        }
    }

    /// Add a fully assembled note to a notebook, tracking it as new.
    pub fn add_note(&mut self, notebook_uid: &str, note: Note) -> bool {
        if !self.notebooks.contains_key(notebook_uid) {
            return false;
        }
        let uid = note.uid().to_string();
        self.apply(
            &uid,
            ChangeKind::New,
            Change::Note {
                notebook: notebook_uid.to_string(),
                value: Some(note),
            },
        )
    }

    /// Delete a note, tracking the deletion.
    pub fn delete_note(&mut self, uid: &str) -> bool {
        let notebook = match self.containing_notebook(uid) {
            Some(b) => b,
            None => return false,
        };
        self.apply(
            uid,
            ChangeKind::Delete,
            Change::Note {
                notebook,
                value: None,
            },
        )
    }

    /// Mutable, change-tracked access to a live note.
    pub fn note_mut(&mut self, uid: &str) -> Option<NoteMut<'_>> {
        let notebook = self.containing_notebook(uid)?;
        Some(NoteMut {
            repo: self,
            notebook,
            uid: uid.to_string(),
        })
    }

    /// Mutable, change-tracked access to a live notebook.
    pub fn notebook_mut(&mut self, uid: &str) -> Option<NotebookMut<'_>> {
        if !self.notebooks.contains_key(uid) {
            return None;
        }
        Some(NotebookMut {
            repo: self,
            uid: uid.to_string(),
        })
    }

    fn containing_notebook(&self, note_uid: &str) -> Option<String> {
        self.notebooks
            .values()
            .find(|b| b.note(note_uid).is_some())
            .map(|b| b.uid().to_string())
    }

    /// Record one tracked mutation. Returns whether it was applied.
    fn apply(&mut self, uid: &str, kind: ChangeKind, change: Change) -> bool {
        if self.suspended {
            return false;
        }
        // tag-set changes are content updates of the note, whatever the
        // tag-level operation was
        let kind = if matches!(change, Change::Categories) {
            ChangeKind::Update
        } else {
            kind
        };
        match reconcile(self.changes.get(uid).copied(), kind) {
            Reconciled::Discard => {
                self.changes.remove(uid);
                self.drop_unpushed(uid, &change);
                true
            }
            Reconciled::RecordDelete => {
                match &change {
                    Change::Notebook(_) => self.tombstone_notebook(uid),
                    Change::Note { notebook, .. } => {
                        let notebook = notebook.clone();
                        self.tombstone_note(&notebook, uid);
                    }
                    _ => {}
                }
                self.changes.insert(uid.to_string(), ChangeKind::Delete);
                true
            }
            Reconciled::RecordNew => {
                match change {
                    Change::Notebook(Some(book)) => {
                        self.notebooks.insert(uid.to_string(), book);
                    }
                    Change::Note {
                        notebook,
                        value: Some(note),
                    } => {
                        if let Some(book) = self.notebooks.get_mut(&notebook) {
                            book.add_note(note);
                        } else {
                            return false;
                        }
                    }
                    _ => {}
                }
                self.changes.insert(uid.to_string(), ChangeKind::New);
                true
            }
            Reconciled::RecordUpdateIfChanged => {
                let changed = match change {
                    Change::Field { changed } => changed,
                    _ => true,
                };
                if changed {
                    self.changes.insert(uid.to_string(), ChangeKind::Update);
                    self.touch(uid);
                }
                changed
            }
            Reconciled::Ignore => true,
        }
    }

    /// Remove an object that was created and deleted without ever being
    /// pushed. No tombstone is kept.
    fn drop_unpushed(&mut self, uid: &str, change: &Change) {
        match change {
            Change::Notebook(_) => {
                if let Some(book) = self.notebooks.remove(uid) {
                    for note in book.notes() {
                        self.changes.remove(note.uid());
                    }
                    self.renames.remove(uid);
                }
            }
            Change::Note { notebook, .. } => {
                if let Some(book) = self.notebooks.get_mut(notebook) {
                    book.remove_note(uid);
                }
            }
            _ => {}
        }
    }

    fn tombstone_notebook(&mut self, uid: &str) {
        if let Some(book) = self.notebooks.remove(uid) {
            let tomb = self
                .deleted_notes
                .entry(uid.to_string())
                .or_default();
            for note in book.notes() {
                tomb.insert(note.uid().to_string(), note.clone());
            }
            self.deleted_notebooks.insert(uid.to_string(), book);
        }
    }

    fn tombstone_note(&mut self, notebook_uid: &str, uid: &str) {
        if let Some(book) = self.notebooks.get_mut(notebook_uid) {
            if let Some(note) = book.remove_note(uid) {
                self.deleted_notes
                    .entry(notebook_uid.to_string())
                    .or_default()
                    .insert(uid.to_string(), note);
            }
        }
    }

    fn touch(&mut self, uid: &str) {
        if let Some(book) = self.notebooks.get_mut(uid) {
            book.audit_information_mut().touch();
            return;
        }
        if let Some(note) = self.note_mut_raw(uid) {
            note.audit_information_mut().touch();
        }
    }

    // -- engine-facing plumbing --------------------------------------------

    pub(crate) fn suspend(&mut self) {
        self.suspended = true;
    }

    pub(crate) fn resume(&mut self) {
        self.suspended = false;
    }

    /// Insert a notebook directly, bypassing tracking.
    pub(crate) fn insert_notebook(&mut self, book: Notebook) {
        self.notebooks.insert(book.uid().to_string(), book);
    }

    /// Add a note to a live notebook directly, bypassing tracking.
    pub(crate) fn insert_note(&mut self, notebook_uid: &str, note: Note) {
        if let Some(book) = self.notebooks.get_mut(notebook_uid) {
            book.add_note(note);
        }
    }

    /// Untracked mutable access to a live note, stubs included.
    pub(crate) fn note_mut_raw(&mut self, uid: &str) -> Option<&mut Note> {
        self.notebooks.values_mut().find_map(|b| b.note_mut(uid))
    }

    /// Drop all live notebooks, keeping tombstones and pending changes.
    pub(crate) fn clear_live(&mut self) {
        self.notebooks.clear();
    }

    /// Forget all pending changes, tombstones and rename memory.
    pub(crate) fn clear_tracking(&mut self) {
        self.changes.clear();
        self.deleted_notebooks.clear();
        self.deleted_notes.clear();
        self.renames.clear();
    }

    pub(crate) fn deleted_notebooks(&self) -> impl Iterator<Item = &Notebook> {
        self.deleted_notebooks.values()
    }

    pub(crate) fn deleted_notebook(&self, uid: &str) -> Option<&Notebook> {
        self.deleted_notebooks.get(uid)
    }

    pub(crate) fn deleted_notes(&self, notebook_uid: &str) -> impl Iterator<Item = &Note> {
        self.deleted_notes
            .get(notebook_uid)
            .into_iter()
            .flat_map(|m| m.values())
    }

    /// The summary a notebook had before it was renamed locally.
    pub(crate) fn rename_of(&self, uid: &str) -> Option<&str> {
        self.renames.get(uid).map(String::as_str)
    }

    fn remember_rename(&mut self, uid: &str, old_summary: String) {
        // only the oldest name matters; the store still knows it by that one
        self.renames.entry(uid.to_string()).or_insert(old_summary);
    }
}

/// Change-tracked mutable access to one note.
///
/// Every setter records the appropriate change with the repository; setters
/// that find the new value equal to the old one record nothing.
pub struct NoteMut<'a> {
    repo: &'a mut LocalRepository,
    notebook: String,
    uid: String,
}

impl NoteMut<'_> {
    pub fn get(&self) -> Option<&Note> {
        self.repo
            .notebooks
            .get(&self.notebook)
            .and_then(|b| b.note(&self.uid))
    }

    fn with_note<R>(&mut self, f: impl FnOnce(&mut Note) -> R) -> Option<R> {
        self.repo
            .notebooks
            .get_mut(&self.notebook)
            .and_then(|b| b.note_mut(&self.uid))
            .map(f)
    }

    fn record_update(&mut self, changed: bool) {
        let uid = self.uid.clone();
        self.repo
            .apply(&uid, ChangeKind::Update, Change::Field { changed });
    }

    fn record_categories(&mut self, kind: ChangeKind) {
        let uid = self.uid.clone();
        self.repo.apply(&uid, kind, Change::Categories);
    }

    pub fn set_summary(&mut self, summary: &str) {
        let changed = self
            .with_note(|n| {
                let changed = n.summary() != summary;
                n.set_summary(summary);
                changed
            })
            .unwrap_or(false);
        self.record_update(changed);
    }

    pub fn set_description(&mut self, description: Option<String>) {
        let changed = self
            .with_note(|n| {
                let changed = n.description() != description.as_deref();
                n.set_description(description);
                changed
            })
            .unwrap_or(false);
        self.record_update(changed);
    }

    pub fn set_classification(&mut self, classification: Classification) {
        let changed = self
            .with_note(|n| {
                let changed = n.classification() != classification;
                n.set_classification(classification);
                changed
            })
            .unwrap_or(false);
        self.record_update(changed);
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        let changed = self
            .with_note(|n| {
                let changed = n.color() != color.as_ref();
                n.set_color(color);
                changed
            })
            .unwrap_or(false);
        self.record_update(changed);
    }

    /// Attach a tag to the note.
    pub fn add_tag(&mut self, tag: Tag) {
        let added = self.with_note(|n| n.add_category(tag)).unwrap_or(false);
        if added {
            self.record_categories(ChangeKind::New);
        }
    }

    /// Detach a tag from the note.
    pub fn remove_tag(&mut self, name: &str) {
        let removed = self.with_note(|n| n.remove_category(name)).unwrap_or(false);
        if removed {
            self.record_categories(ChangeKind::Delete);
        }
    }

    pub fn add_attachment(&mut self, attachment: crate::types::Attachment) {
        self.with_note(|n| n.add_attachment(attachment));
        self.record_update(true);
    }

    pub fn remove_attachment(&mut self, id: &str) {
        let removed = self
            .with_note(|n| n.remove_attachment(id).is_some())
            .unwrap_or(false);
        self.record_update(removed);
    }
}

/// Change-tracked mutable access to one notebook.
pub struct NotebookMut<'a> {
    repo: &'a mut LocalRepository,
    uid: String,
}

impl NotebookMut<'_> {
    pub fn get(&self) -> Option<&Notebook> {
        self.repo.notebooks.get(&self.uid)
    }

    /// Rename the notebook. The old summary is remembered so the push can
    /// rename the folder on the server rather than recreate it.
    pub fn set_summary(&mut self, summary: &str) {
        let uid = self.uid.clone();
        let old = match self.repo.notebooks.get_mut(&uid) {
            Some(book) => {
                let old = book.summary().to_string();
                book.set_summary(summary);
                old
            }
            None => return,
        };
        let changed = old != summary;
        if changed && !self.repo.suspended {
            self.repo.remember_rename(&uid, old);
        }
        self.repo
            .apply(&uid, ChangeKind::Update, Change::Field { changed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_with_book(uid: &str, summary: &str) -> LocalRepository {
        let mut repo = LocalRepository::new();
        repo.create_notebook(uid, summary);
        repo
    }

    #[test]
    fn create_notebook_records_new() {
        let repo = repo_with_book("b1", "Notes");
        assert_eq!(repo.change("b1"), Some(ChangeKind::New));
        assert_eq!(repo.notebook("b1").map(|b| b.summary()), Some("Notes"));
    }

    #[test]
    fn create_then_delete_leaves_no_trace() {
        let mut repo = repo_with_book("b1", "Notes");
        assert!(repo.delete_notebook("b1"));
        assert_eq!(repo.change("b1"), None);
        assert!(repo.notebook("b1").is_none());
        assert_eq!(repo.deleted_notebooks().count(), 0);
    }

    #[test]
    fn delete_tracked_notebook_moves_notes_to_tombstones() {
        let mut repo = LocalRepository::new();
        repo.track_existing(vec![{
            let mut book = Notebook::new(
                Identification::new("b1", "p"),
                AuditInformation::now(),
                Classification::Public,
                "Notes",
            );
            book.add_note(Note::new(
                Identification::new("n1", "p"),
                AuditInformation::now(),
                Classification::Public,
                "hello",
            ));
            book
        }]);
        assert_eq!(repo.change("b1"), None);

        assert!(repo.delete_notebook("b1"));
        assert_eq!(repo.change("b1"), Some(ChangeKind::Delete));
        assert!(repo.notebook("b1").is_none());
        assert_eq!(repo.deleted_notebooks().count(), 1);
        assert_eq!(repo.deleted_notes("b1").count(), 1);
    }

    #[test]
    fn note_create_update_keeps_new_intent() {
        let mut repo = repo_with_book("b1", "Notes");
        let uid = repo.create_note("b1", "draft").unwrap();
        assert_eq!(repo.change(&uid), Some(ChangeKind::New));

        repo.note_mut(&uid).unwrap().set_summary("final");
        // still NEW: the store has never seen this note
        assert_eq!(repo.change(&uid), Some(ChangeKind::New));
        assert_eq!(repo.note(&uid).unwrap().summary(), "final");
    }

    #[test]
    fn noop_update_records_nothing() {
        let mut repo = LocalRepository::new();
        let mut book = Notebook::new(
            Identification::new("b1", "p"),
            AuditInformation::now(),
            Classification::Public,
            "Notes",
        );
        book.add_note(Note::new(
            Identification::new("n1", "p"),
            AuditInformation::now(),
            Classification::Public,
            "same",
        ));
        repo.track_existing(vec![book]);

        let before = repo
            .note("n1")
            .unwrap()
            .audit_information()
            .last_modification_date();
        repo.note_mut("n1").unwrap().set_summary("same");
        assert_eq!(repo.change("n1"), None);
        assert_eq!(
            repo.note("n1")
                .unwrap()
                .audit_information()
                .last_modification_date(),
            before
        );

        repo.note_mut("n1").unwrap().set_summary("different");
        assert_eq!(repo.change("n1"), Some(ChangeKind::Update));
        assert!(
            repo.note("n1")
                .unwrap()
                .audit_information()
                .last_modification_date()
                >= before
        );
    }

    #[test]
    fn tag_changes_downgrade_to_update() {
        let mut repo = LocalRepository::new();
        let mut book = Notebook::new(
            Identification::new("b1", "p"),
            AuditInformation::now(),
            Classification::Public,
            "Notes",
        );
        book.add_note(Note::new(
            Identification::new("n1", "p"),
            AuditInformation::now(),
            Classification::Public,
            "tagged",
        ));
        repo.track_existing(vec![book]);

        repo.note_mut("n1").unwrap().add_tag(Tag::new("work"));
        assert_eq!(repo.change("n1"), Some(ChangeKind::Update));

        repo.clear_tracking();
        repo.note_mut("n1").unwrap().remove_tag("work");
        assert_eq!(repo.change("n1"), Some(ChangeKind::Update));
    }

    #[test]
    fn update_then_delete_records_delete() {
        let mut repo = LocalRepository::new();
        let mut book = Notebook::new(
            Identification::new("b1", "p"),
            AuditInformation::now(),
            Classification::Public,
            "Notes",
        );
        book.add_note(Note::new(
            Identification::new("n1", "p"),
            AuditInformation::now(),
            Classification::Public,
            "doomed",
        ));
        repo.track_existing(vec![book]);

        repo.note_mut("n1").unwrap().set_summary("edited");
        repo.delete_note("n1");
        assert_eq!(repo.change("n1"), Some(ChangeKind::Delete));
        assert!(repo.note("n1").is_none());
        assert_eq!(repo.deleted_notes("b1").count(), 1);
    }

    #[test]
    fn deleting_a_fresh_note_leaves_its_fresh_notebook_intact() {
        let mut repo = repo_with_book("b1", "Notes");
        let uid = repo.create_note("b1", "fleeting").unwrap();
        assert!(repo.delete_note(&uid));

        assert_eq!(repo.change("b1"), Some(ChangeKind::New));
        assert_eq!(repo.change(&uid), None);
        assert!(repo.note(&uid).is_none());
        assert_eq!(repo.deleted_notes("b1").count(), 0);
    }

    #[test]
    fn suspension_drops_mutations() {
        let mut repo = LocalRepository::new();
        repo.suspend();
        assert!(repo.create_notebook("b1", "Notes").is_none());
        assert!(repo.is_empty());
        assert_eq!(repo.tracked_changes().count(), 0);

        repo.resume();
        assert!(repo.create_notebook("b1", "Notes").is_some());
        assert_eq!(repo.change("b1"), Some(ChangeKind::New));
    }

    #[test]
    fn rename_remembers_oldest_summary() {
        let mut repo = LocalRepository::new();
        repo.track_existing(vec![Notebook::new(
            Identification::new("b1", "p"),
            AuditInformation::now(),
            Classification::Public,
            "Notes",
        )]);

        repo.notebook_mut("b1").unwrap().set_summary("Work");
        repo.notebook_mut("b1").unwrap().set_summary("Work 2026");
        assert_eq!(repo.rename_of("b1"), Some("Notes"));
        assert_eq!(repo.notebook("b1").unwrap().summary(), "Work 2026");
        assert_eq!(repo.change("b1"), Some(ChangeKind::Update));
    }
}
