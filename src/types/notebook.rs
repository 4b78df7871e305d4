use std::collections::BTreeMap;

use super::{AuditInformation, Classification, Identification, Note};

/// Access rights to a notebook shared by another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sharing {
    short_name: String,
    note_creation_allowed: bool,
    note_modification_allowed: bool,
}

impl Sharing {
    pub fn new(
        short_name: impl Into<String>,
        note_creation_allowed: bool,
        note_modification_allowed: bool,
    ) -> Self {
        Sharing {
            short_name: short_name.into(),
            note_creation_allowed,
            note_modification_allowed,
        }
    }

    /// The folder's own name, without the shared-namespace prefix.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn note_creation_allowed(&self) -> bool {
        self.note_creation_allowed
    }

    pub fn note_modification_allowed(&self) -> bool {
        self.note_modification_allowed
    }
}

/// A folder of notes.
///
/// A notebook is itself described by a [`Note`] value (identity, audit dates,
/// summary) and owns its child notes keyed by uid. Notebooks of other users
/// additionally carry a [`Sharing`] record with the rights granted to us.
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    note: Note,
    notes: BTreeMap<String, Note>,
    sharing: Option<Sharing>,
}

impl Notebook {
    pub fn new(
        identification: Identification,
        audit: AuditInformation,
        classification: Classification,
        summary: impl Into<String>,
    ) -> Self {
        Notebook {
            note: Note::new(identification, audit, classification, summary),
            notes: BTreeMap::new(),
            sharing: None,
        }
    }

    /// A notebook shared by another user.
    pub fn shared(
        identification: Identification,
        audit: AuditInformation,
        classification: Classification,
        summary: impl Into<String>,
        sharing: Sharing,
    ) -> Self {
        let mut book = Notebook::new(identification, audit, classification, summary);
        book.sharing = Some(sharing);
        book
    }

    /// The note value describing the notebook itself.
    pub fn as_note(&self) -> &Note {
        &self.note
    }

    pub fn identification(&self) -> &Identification {
        self.note.identification()
    }

    pub fn uid(&self) -> &str {
        self.note.uid()
    }

    pub fn audit_information(&self) -> &AuditInformation {
        self.note.audit_information()
    }

    pub(crate) fn audit_information_mut(&mut self) -> &mut AuditInformation {
        self.note.audit_information_mut()
    }

    pub fn summary(&self) -> &str {
        self.note.summary()
    }

    pub(crate) fn set_summary(&mut self, summary: impl Into<String>) {
        self.note.set_summary(summary);
    }

    pub fn is_shared(&self) -> bool {
        self.sharing.is_some()
    }

    pub fn sharing(&self) -> Option<&Sharing> {
        self.sharing.as_ref()
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn note(&self, uid: &str) -> Option<&Note> {
        self.notes.get(uid)
    }

    pub(crate) fn note_mut(&mut self, uid: &str) -> Option<&mut Note> {
        self.notes.get_mut(uid)
    }

    pub(crate) fn add_note(&mut self, note: Note) {
        self.notes.insert(note.uid().to_string(), note);
    }

    pub(crate) fn remove_note(&mut self, uid: &str) -> Option<Note> {
        self.notes.remove(uid)
    }
}
