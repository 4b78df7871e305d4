use std::collections::BTreeSet;

use super::{AuditInformation, Color, Identification};

/// A tag as seen from a note: a name with display properties.
///
/// Identity is the name alone; priority and color are presentation details.
#[derive(Debug, Clone)]
pub struct Tag {
    name: String,
    priority: i32,
    color: Option<Color>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            priority: 0,
            color: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Tag) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag {}

/// The full server-side record of a tag: a relation document listing the
/// uids of its member notes.
#[derive(Debug, Clone, PartialEq)]
pub struct TagDetails {
    identification: Identification,
    audit: AuditInformation,
    tag: Tag,
    members: BTreeSet<String>,
    deleted: bool,
}

impl TagDetails {
    pub fn new(
        identification: Identification,
        audit: AuditInformation,
        tag: Tag,
        members: BTreeSet<String>,
    ) -> Self {
        TagDetails {
            identification,
            audit,
            tag,
            members,
            deleted: false,
        }
    }

    /// A brand-new tag record with fresh identity and no members.
    pub fn create(tag: Tag) -> Self {
        TagDetails::new(
            Identification::generate(),
            AuditInformation::now(),
            tag,
            BTreeSet::new(),
        )
    }

    pub fn identification(&self) -> &Identification {
        &self.identification
    }

    pub fn audit_information(&self) -> &AuditInformation {
        &self.audit
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn tag_mut(&mut self) -> &mut Tag {
        &mut self.tag
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    pub fn add_member(&mut self, uid: impl Into<String>) -> bool {
        self.members.insert(uid.into())
    }

    pub fn remove_member(&mut self, uid: &str) -> bool {
        self.members.remove(uid)
    }

    pub fn contains_member(&self, uid: &str) -> bool {
        self.members.contains(uid)
    }

    /// Whether this record has been marked for deletion from the store.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Whether two records describe the same tag content.
    ///
    /// Identity and audit dates are ignored; name, priority, color, and the
    /// member set must agree. Two records with no color at all are equal.
    pub fn same_content(&self, other: &TagDetails) -> bool {
        self.tag.name() == other.tag.name()
            && self.tag.priority() == other.tag.priority()
            && self.tag.color() == other.tag.color()
            && self.members == other.members
    }
}
