//! Access to the mailbox that backs the note store.
//!
//! The sync engine talks to the server through the [`RemoteStore`] trait;
//! [`imap::ImapStore`](crate::remote::imap_store::ImapStore) is the real
//! implementation. A [`StoreConnector`] produces a fresh store per sync run,
//! since every refresh and merge opens and closes its own connection.

pub mod annotation;
pub mod imap_store;
#[cfg(test)]
pub(crate) mod memory;
pub mod mime;
pub mod rights;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::Attachment;

/// The Kolab type a folder is annotated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderType {
    /// A folder holding notes.
    Note,
    /// The folder holding configuration objects, tags among them.
    Configuration,
}

impl FolderType {
    /// The shared annotation value.
    pub fn annotation_value(&self) -> &'static str {
        match self {
            FolderType::Note => "note",
            FolderType::Configuration => "configuration",
        }
    }

    /// The private annotation value, marking the user's default folder of
    /// this type.
    pub fn default_annotation_value(&self) -> &'static str {
        match self {
            FolderType::Note => "note.default",
            FolderType::Configuration => "configuration.default",
        }
    }
}

/// The rights the current user holds on a folder, reduced to what matters
/// for notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderRights {
    /// Insert, keep-seen and write rights are all present.
    pub can_create: bool,
    /// Expunge and delete-message rights are present on top of the
    /// creation rights.
    pub can_modify: bool,
}

/// A cheap per-message listing: everything needed to decide whether the
/// body has to be fetched at all.
#[derive(Debug, Clone)]
pub struct MessageSummary {
    /// Message sequence number within the currently selected folder.
    pub seq: u32,
    /// The subject, which for Kolab objects is the entity uid.
    pub subject: String,
    /// The sent date, if the message carries one.
    pub sent: Option<DateTime<Utc>>,
    /// The `X-Kolab-Type` header value, if any.
    pub kolab_type: Option<String>,
}

/// One decoded MIME leaf part of a fetched message.
#[derive(Debug, Clone)]
pub struct MessagePart {
    pub content_type: String,
    pub content_id: Option<String>,
    pub file_name: Option<String>,
    /// The payload with any transfer encoding already undone.
    pub body: Vec<u8>,
}

/// A fetched message, decoded down to its leaf parts.
#[derive(Debug, Clone)]
pub struct RemoteMessage {
    pub subject: String,
    pub sent: Option<DateTime<Utc>>,
    pub kolab_type: Option<String>,
    pub parts: Vec<MessagePart>,
}

impl RemoteMessage {
    /// The Kolab XML part of this message, if it has one.
    pub fn kolab_xml(&self) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| {
                p.content_type
                    .to_ascii_lowercase()
                    .starts_with(crate::codec::KOLAB_XML_MEDIA_TYPE)
            })
            .map(|p| p.body.as_slice())
    }
}

/// A Kolab object waiting to be appended to a folder.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    /// Becomes the subject: the entity uid.
    pub subject: String,
    /// The `X-Kolab-Type` header value.
    pub kolab_type: String,
    /// Becomes the sent date.
    pub date: DateTime<Utc>,
    /// Sender and recipient of the message.
    pub user: String,
    /// The serialized Kolab XML document.
    pub xml: String,
    /// Attachment parts to add after the XML part.
    pub attachments: Vec<Attachment>,
}

/// The operations the sync engine needs from a mailbox server.
///
/// Folder names are always full paths from the server root, with `/` as the
/// hierarchy separator.
pub trait RemoteStore {
    /// List all folders visible to the account.
    fn folders(&mut self) -> Result<Vec<String>>;

    fn folder_exists(&mut self, folder: &str) -> Result<bool>;

    fn create_folder(&mut self, folder: &str) -> Result<()>;

    /// Delete a folder together with its messages.
    fn delete_folder(&mut self, folder: &str) -> Result<()>;

    fn rename_folder(&mut self, from: &str, to: &str) -> Result<()>;

    /// List the messages of a folder without fetching their bodies.
    fn summaries(&mut self, folder: &str) -> Result<Vec<MessageSummary>>;

    /// Fetch and decode one message.
    fn message(&mut self, folder: &str, seq: u32) -> Result<RemoteMessage>;

    /// Append a batch of drafts to a folder.
    fn append(&mut self, folder: &str, drafts: &[MessageDraft]) -> Result<()>;

    /// Delete the message whose subject equals `subject`. Returns whether
    /// such a message existed.
    fn delete_message(&mut self, folder: &str, subject: &str) -> Result<bool>;

    /// The folder's Kolab type annotation, if the server knows one.
    fn folder_type(&mut self, folder: &str) -> Result<Option<FolderType>>;

    /// Annotate a folder with its Kolab type. Fails unless the server
    /// explicitly confirms the annotation.
    fn set_folder_type(&mut self, folder: &str, folder_type: FolderType) -> Result<()>;

    fn my_rights(&mut self, folder: &str) -> Result<FolderRights>;

    /// Flush pending expunges and end the session.
    fn close(&mut self) -> Result<()>;
}

/// Produces a connected [`RemoteStore`] per sync run.
pub trait StoreConnector {
    type Store: RemoteStore;

    fn connect(&self) -> Result<Self::Store>;
}
