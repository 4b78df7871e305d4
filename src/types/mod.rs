//! The domain objects stored in a Kolab mailbox.
//!
//! Every entity carries an [`Identification`] (a globally unique id plus the
//! product that produced it) and an [`AuditInformation`] (creation and last
//! modification timestamps). [`Note`]s live inside [`Notebook`]s; tags are
//! modeled as standalone [`TagDetails`] relations that reference their member
//! notes by uid.

use chrono::{DateTime, Utc};
use uuid::Uuid;

mod attachment;
mod color;
mod note;
mod notebook;
mod tag;

pub use self::attachment::Attachment;
pub use self::color::Color;
pub use self::note::{Note, NOT_LOADED};
pub use self::notebook::{Notebook, Sharing};
pub use self::tag::{Tag, TagDetails};

/// Product id written into documents produced by this crate.
pub const PRODUCT_ID: &str = "kolab-note-sync";

/// A globally unique identity for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identification {
    uid: String,
    product_id: String,
}

impl Identification {
    pub fn new(uid: impl Into<String>, product_id: impl Into<String>) -> Self {
        Identification {
            uid: uid.into(),
            product_id: product_id.into(),
        }
    }

    /// A fresh random identity produced by this crate.
    pub fn generate() -> Self {
        Identification {
            uid: Uuid::new_v4().to_string(),
            product_id: PRODUCT_ID.to_string(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }
}

/// Creation and last-modification timestamps of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditInformation {
    creation_date: DateTime<Utc>,
    last_modification_date: DateTime<Utc>,
}

impl AuditInformation {
    pub fn new(creation_date: DateTime<Utc>, last_modification_date: DateTime<Utc>) -> Self {
        AuditInformation {
            creation_date,
            last_modification_date,
        }
    }

    /// Both timestamps set to the current instant.
    pub fn now() -> Self {
        let now = Utc::now();
        AuditInformation::new(now, now)
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn last_modification_date(&self) -> DateTime<Utc> {
        self.last_modification_date
    }

    pub fn set_last_modification_date(&mut self, date: DateTime<Utc>) {
        self.last_modification_date = date;
    }

    /// Bump the last modification date to now.
    pub fn touch(&mut self) {
        self.last_modification_date = Utc::now();
    }
}

/// Visibility classification of a note or notebook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Classification {
    #[default]
    Public,
    Private,
    Confidential,
}

impl Classification {
    /// Parse a classification, ignoring case. Returns `None` for values
    /// outside the allowed domain.
    pub fn parse(value: &str) -> Option<Classification> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Classification::Public),
            "private" => Some(Classification::Private),
            "confidential" => Some(Classification::Confidential),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Public => "PUBLIC",
            Classification::Private => "PRIVATE",
            Classification::Confidential => "CONFIDENTIAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_parses_any_case() {
        assert_eq!(Classification::parse("PUBLIC"), Some(Classification::Public));
        assert_eq!(Classification::parse("private"), Some(Classification::Private));
        assert_eq!(
            Classification::parse("Confidential"),
            Some(Classification::Confidential)
        );
        assert_eq!(Classification::parse("secret"), None);
    }

    #[test]
    fn generated_identifications_are_unique() {
        let a = Identification::generate();
        let b = Identification::generate();
        assert_ne!(a.uid(), b.uid());
        assert_eq!(a.product_id(), PRODUCT_ID);
    }
}
