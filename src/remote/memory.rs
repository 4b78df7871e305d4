//! An in-memory [`RemoteStore`] for exercising the sync engine without a
//! server. Handles are cheap clones of the same store, so tests can keep one
//! for inspection while the engine consumes another.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use chrono::{DateTime, Utc};

use super::{
    FolderRights, FolderType, MessageDraft, MessagePart, MessageSummary, RemoteMessage,
    RemoteStore, StoreConnector,
};
use crate::codec::KOLAB_XML_MEDIA_TYPE;
use crate::error::{Error, Result};

/// A store operation observed by the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    CreateFolder(String),
    DeleteFolder(String),
    RenameFolder(String, String),
    Append(String, String),
    DeleteMessage(String, String),
    SetFolderType(String, FolderType),
}

#[derive(Debug, Default)]
struct Folder {
    folder_type: Option<FolderType>,
    rights: FolderRights,
    messages: Vec<RemoteMessage>,
}

#[derive(Debug, Default)]
struct Inner {
    folders: BTreeMap<String, Folder>,
    failing: BTreeSet<String>,
    ops: Vec<Op>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn add_folder(&self, name: &str, folder_type: Option<FolderType>) {
        let mut inner = self.inner.borrow_mut();
        inner.folders.insert(
            name.to_string(),
            Folder {
                folder_type,
                rights: FolderRights {
                    can_create: true,
                    can_modify: true,
                },
                messages: Vec::new(),
            },
        );
    }

    pub fn set_rights(&self, name: &str, rights: FolderRights) {
        if let Some(folder) = self.inner.borrow_mut().folders.get_mut(name) {
            folder.rights = rights;
        }
    }

    /// Make `summaries` fail for one folder, isolating per-folder error
    /// handling in tests.
    pub fn fail_folder(&self, name: &str) {
        self.inner.borrow_mut().failing.insert(name.to_string());
    }

    /// Seed a folder with a Kolab message holding the given document.
    pub fn seed_message(
        &self,
        folder: &str,
        subject: &str,
        kolab_type: &str,
        sent: DateTime<Utc>,
        xml: &str,
    ) {
        let message = RemoteMessage {
            subject: subject.to_string(),
            sent: Some(sent),
            kolab_type: Some(kolab_type.to_string()),
            parts: vec![MessagePart {
                content_type: KOLAB_XML_MEDIA_TYPE.to_string(),
                content_id: None,
                file_name: Some("kolab.xml".to_string()),
                body: xml.as_bytes().to_vec(),
            }],
        };
        if let Some(f) = self.inner.borrow_mut().folders.get_mut(folder) {
            f.messages.push(message);
        }
    }

    pub fn ops(&self) -> Vec<Op> {
        self.inner.borrow().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.inner.borrow_mut().ops.clear();
    }

    pub fn subjects(&self, folder: &str) -> Vec<String> {
        self.inner
            .borrow()
            .folders
            .get(folder)
            .map(|f| f.messages.iter().map(|m| m.subject.clone()).collect())
            .unwrap_or_default()
    }

    pub fn has_folder(&self, folder: &str) -> bool {
        self.inner.borrow().folders.contains_key(folder)
    }

    fn record(&self, op: Op) {
        self.inner.borrow_mut().ops.push(op);
    }
}

impl RemoteStore for MemoryStore {
    fn folders(&mut self) -> Result<Vec<String>> {
        Ok(self.inner.borrow().folders.keys().cloned().collect())
    }

    fn folder_exists(&mut self, folder: &str) -> Result<bool> {
        Ok(self.has_folder(folder))
    }

    fn create_folder(&mut self, folder: &str) -> Result<()> {
        self.add_folder(folder, None);
        self.record(Op::CreateFolder(folder.to_string()));
        Ok(())
    }

    fn delete_folder(&mut self, folder: &str) -> Result<()> {
        if self.inner.borrow_mut().folders.remove(folder).is_none() {
            return Err(Error::Protocol(format!("no such folder: {}", folder)));
        }
        self.record(Op::DeleteFolder(folder.to_string()));
        Ok(())
    }

    fn rename_folder(&mut self, from: &str, to: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let folder = inner
            .folders
            .remove(from)
            .ok_or_else(|| Error::Protocol(format!("no such folder: {}", from)))?;
        inner.folders.insert(to.to_string(), folder);
        inner
            .ops
            .push(Op::RenameFolder(from.to_string(), to.to_string()));
        Ok(())
    }

    fn summaries(&mut self, folder: &str) -> Result<Vec<MessageSummary>> {
        let inner = self.inner.borrow();
        if inner.failing.contains(folder) {
            return Err(Error::Protocol(format!("injected failure in {}", folder)));
        }
        let folder = inner
            .folders
            .get(folder)
            .ok_or_else(|| Error::Protocol(format!("no such folder: {}", folder)))?;
        Ok(folder
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| MessageSummary {
                seq: (i + 1) as u32,
                subject: m.subject.clone(),
                sent: m.sent,
                kolab_type: m.kolab_type.clone(),
            })
            .collect())
    }

    fn message(&mut self, folder: &str, seq: u32) -> Result<RemoteMessage> {
        self.inner
            .borrow()
            .folders
            .get(folder)
            .and_then(|f| f.messages.get(seq as usize - 1))
            .cloned()
            .ok_or_else(|| Error::Protocol(format!("message {} not found in {}", seq, folder)))
    }

    fn append(&mut self, folder: &str, drafts: &[MessageDraft]) -> Result<()> {
        for draft in drafts {
            let mut parts = vec![MessagePart {
                content_type: KOLAB_XML_MEDIA_TYPE.to_string(),
                content_id: None,
                file_name: Some("kolab.xml".to_string()),
                body: draft.xml.as_bytes().to_vec(),
            }];
            for attachment in &draft.attachments {
                parts.push(MessagePart {
                    content_type: attachment.mime_type().to_string(),
                    content_id: Some(attachment.id().to_string()),
                    file_name: Some(attachment.file_name().to_string()),
                    body: attachment.data().to_vec(),
                });
            }
            let message = RemoteMessage {
                subject: draft.subject.clone(),
                sent: Some(draft.date),
                kolab_type: Some(draft.kolab_type.clone()),
                parts,
            };
            let mut inner = self.inner.borrow_mut();
            let target = inner
                .folders
                .get_mut(folder)
                .ok_or_else(|| Error::Protocol(format!("no such folder: {}", folder)))?;
            target.messages.push(message);
            inner
                .ops
                .push(Op::Append(folder.to_string(), draft.subject.clone()));
        }
        Ok(())
    }

    fn delete_message(&mut self, folder: &str, subject: &str) -> Result<bool> {
        let mut inner = self.inner.borrow_mut();
        let found = match inner.folders.get_mut(folder) {
            Some(f) => {
                let before = f.messages.len();
                f.messages.retain(|m| m.subject != subject);
                f.messages.len() != before
            }
            None => false,
        };
        if found {
            inner
                .ops
                .push(Op::DeleteMessage(folder.to_string(), subject.to_string()));
        }
        Ok(found)
    }

    fn folder_type(&mut self, folder: &str) -> Result<Option<FolderType>> {
        Ok(self
            .inner
            .borrow()
            .folders
            .get(folder)
            .and_then(|f| f.folder_type))
    }

    fn set_folder_type(&mut self, folder: &str, folder_type: FolderType) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let target = inner
            .folders
            .get_mut(folder)
            .ok_or_else(|| Error::Protocol(format!("no such folder: {}", folder)))?;
        target.folder_type = Some(folder_type);
        inner
            .ops
            .push(Op::SetFolderType(folder.to_string(), folder_type));
        Ok(())
    }

    fn my_rights(&mut self, folder: &str) -> Result<FolderRights> {
        Ok(self
            .inner
            .borrow()
            .folders
            .get(folder)
            .map(|f| f.rights)
            .unwrap_or_default())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Hands out clones of one [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnector(pub MemoryStore);

impl StoreConnector for MemoryConnector {
    type Store = MemoryStore;

    fn connect(&self) -> Result<MemoryStore> {
        Ok(self.0.clone())
    }
}
