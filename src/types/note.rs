use std::collections::BTreeMap;

use super::{Attachment, AuditInformation, Classification, Color, Identification, Tag};

/// Summary sentinel carried by notes whose body was skipped during an
/// incremental refresh. See [`Note::is_stub`].
pub const NOT_LOADED: &str = "NOT_LOADED";

/// A single note.
///
/// Notes obtained from a
/// [`LocalRepository`](crate::repository::LocalRepository) should be mutated
/// through [`note_mut`](crate::repository::LocalRepository::note_mut) so the
/// change is tracked; the plain setters here are for assembling notes that
/// have not been handed to a repository yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    identification: Identification,
    audit: AuditInformation,
    classification: Classification,
    summary: String,
    description: Option<String>,
    color: Option<Color>,
    categories: Vec<Tag>,
    attachments: BTreeMap<String, Attachment>,
}

impl Note {
    pub fn new(
        identification: Identification,
        audit: AuditInformation,
        classification: Classification,
        summary: impl Into<String>,
    ) -> Self {
        Note {
            identification,
            audit,
            classification,
            summary: summary.into(),
            description: None,
            color: None,
            categories: Vec::new(),
            attachments: BTreeMap::new(),
        }
    }

    /// A placeholder for a note whose message body was not fetched.
    pub fn stub(identification: Identification, audit: AuditInformation) -> Self {
        Note::new(identification, audit, Classification::Public, NOT_LOADED)
    }

    /// Whether this note is an unloaded placeholder.
    pub fn is_stub(&self) -> bool {
        self.summary == NOT_LOADED
    }

    pub fn identification(&self) -> &Identification {
        &self.identification
    }

    pub fn uid(&self) -> &str {
        self.identification.uid()
    }

    pub fn audit_information(&self) -> &AuditInformation {
        &self.audit
    }

    pub fn audit_information_mut(&mut self) -> &mut AuditInformation {
        &mut self.audit
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn set_classification(&mut self, classification: Classification) {
        self.classification = classification;
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    /// The tags attached to this note, in attachment order.
    pub fn categories(&self) -> &[Tag] {
        &self.categories
    }

    /// Attach a tag. A tag with the same name is attached at most once.
    pub fn add_category(&mut self, tag: Tag) -> bool {
        if self.categories.iter().any(|t| t.name() == tag.name()) {
            return false;
        }
        self.categories.push(tag);
        true
    }

    pub fn remove_category(&mut self, name: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|t| t.name() != name);
        self.categories.len() != before
    }

    pub fn set_categories(&mut self, tags: Vec<Tag>) {
        self.categories.clear();
        for tag in tags {
            self.add_category(tag);
        }
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.values()
    }

    pub fn attachment(&self, id: &str) -> Option<&Attachment> {
        self.attachments.get(id)
    }

    pub fn attachment_mut(&mut self, id: &str) -> Option<&mut Attachment> {
        self.attachments.get_mut(id)
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments
            .insert(attachment.id().to_string(), attachment);
    }

    pub fn remove_attachment(&mut self, id: &str) -> Option<Attachment> {
        self.attachments.remove(id)
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Replace this note's content with that of a fully loaded copy.
    ///
    /// Identity is kept; everything else, audit dates included, is taken
    /// from `loaded`.
    pub fn fill_from(&mut self, loaded: &Note) {
        self.audit = loaded.audit.clone();
        self.classification = loaded.classification;
        self.summary = loaded.summary.clone();
        self.description = loaded.description.clone();
        self.color = loaded.color.clone();
        self.categories = loaded.categories.clone();
        self.attachments = loaded.attachments.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(summary: &str) -> Note {
        Note::new(
            Identification::generate(),
            AuditInformation::now(),
            Classification::Public,
            summary,
        )
    }

    #[test]
    fn categories_are_unique_by_name() {
        let mut n = note("groceries");
        assert!(n.add_category(Tag::new("todo")));
        let mut dup = Tag::new("todo");
        dup.set_priority(9);
        assert!(!n.add_category(dup));
        assert_eq!(n.categories().len(), 1);
        assert_eq!(n.categories()[0].priority(), 0);
    }

    #[test]
    fn stub_detection() {
        let stub = Note::stub(Identification::generate(), AuditInformation::now());
        assert!(stub.is_stub());
        assert!(!note("loaded").is_stub());
    }

    #[test]
    fn fill_from_keeps_identity() {
        let mut stub = Note::stub(Identification::new("u1", "p"), AuditInformation::now());
        let mut loaded = note("now loaded");
        loaded.set_description(Some("body".to_string()));
        stub.fill_from(&loaded);
        assert_eq!(stub.uid(), "u1");
        assert_eq!(stub.summary(), "now loaded");
        assert_eq!(stub.description(), Some("body"));
        assert!(!stub.is_stub());
    }
}
