//! Tags, stored remotely as relation documents in the configuration folder.
//!
//! [`RemoteTags`] keeps the full set of tag records plus an index from note
//! uid to the names of the tags on that note. The set is loaded lazily on
//! first use and merged back with delete-then-insert semantics: a relation
//! message whose content already matches is left untouched, so a merge with
//! no local changes performs no store writes at all.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::account::Account;
use crate::codec::{relation, RELATION_KOLAB_TYPE};
use crate::error::{ParseError, Result};
use crate::remote::{FolderType, MessageDraft, RemoteStore};
use crate::types::{Tag, TagDetails};

/// Name of the configuration folder created when none exists yet.
const DEFAULT_CONFIG_FOLDER: &str = "Configuration";

/// The tag records of one account.
pub struct RemoteTags {
    account: Account,
    loaded: bool,
    config_folder: Option<String>,
    details: BTreeMap<String, TagDetails>,
    tags_per_note: BTreeMap<String, BTreeSet<String>>,
}

impl RemoteTags {
    pub fn new(account: Account) -> Self {
        RemoteTags {
            account,
            loaded: false,
            config_folder: None,
            details: BTreeMap::new(),
            tags_per_note: BTreeMap::new(),
        }
    }

    /// Load the tag set from the store, once.
    ///
    /// Messages that are not tag relations are skipped; malformed relation
    /// documents fail the load.
    pub fn init(&mut self, store: &mut dyn RemoteStore) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;

        self.config_folder = self.find_config_folder(store)?;
        let folder = match self.config_folder.clone() {
            Some(folder) => folder,
            None => return Ok(()),
        };

        for summary in store.summaries(&folder)? {
            if summary.kolab_type.as_deref() != Some(RELATION_KOLAB_TYPE) {
                continue;
            }
            let message = store.message(&folder, summary.seq)?;
            let xml = match message.kolab_xml() {
                Some(xml) => xml,
                None => continue,
            };
            match relation::parse(&String::from_utf8_lossy(xml)) {
                Ok(details) => self.index(details),
                Err(ParseError::NotARelation) => {
                    debug!(subject = %summary.subject, "skipping foreign configuration object");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn find_config_folder(&self, store: &mut dyn RemoteStore) -> Result<Option<String>> {
        for folder in store.folders()? {
            let is_config = if self.account.folder_annotations_enabled() {
                store.folder_type(&folder)? == Some(FolderType::Configuration)
            } else {
                leaf_name(&folder).eq_ignore_ascii_case(DEFAULT_CONFIG_FOLDER)
            };
            if is_config {
                return Ok(Some(folder));
            }
        }
        Ok(None)
    }

    fn index(&mut self, details: TagDetails) {
        for member in details.members() {
            self.tags_per_note
                .entry(member.clone())
                .or_default()
                .insert(details.tag().name().to_string());
        }
        self.details
            .insert(details.tag().name().to_string(), details);
    }

    /// All known tags, deleted ones excluded.
    pub fn tags(&self) -> impl Iterator<Item = &TagDetails> {
        self.details.values().filter(|d| !d.is_deleted())
    }

    pub fn tag(&self, name: &str) -> Option<&TagDetails> {
        self.details.get(name).filter(|d| !d.is_deleted())
    }

    /// Display properties of a tag, for editing priority or color.
    pub fn tag_mut(&mut self, name: &str) -> Option<&mut Tag> {
        self.details
            .get_mut(name)
            .filter(|d| !d.is_deleted())
            .map(TagDetails::tag_mut)
    }

    /// The tags attached to the note with the given uid.
    pub fn tags_for_note(&self, uid: &str) -> Vec<&TagDetails> {
        let names = match self.tags_per_note.get(uid) {
            Some(names) => names,
            None => return Vec::new(),
        };
        names
            .iter()
            .filter_map(|name| self.details.get(name))
            .filter(|d| !d.is_deleted())
            .collect()
    }

    /// Attach tags to a note, creating records for names never seen before.
    ///
    /// Creation allocates a fresh identity only the first time a name
    /// appears; later attachments reuse the existing record.
    pub fn attach_tags(&mut self, uid: &str, tags: &[Tag]) {
        for tag in tags {
            let details = self
                .details
                .entry(tag.name().to_string())
                .or_insert_with(|| TagDetails::create(tag.clone()));
            details.add_member(uid);
            self.tags_per_note
                .entry(uid.to_string())
                .or_default()
                .insert(tag.name().to_string());
        }
    }

    /// Detach every tag from the note with the given uid.
    pub fn remove_tags(&mut self, uid: &str) {
        if let Some(names) = self.tags_per_note.remove(uid) {
            for name in names {
                if let Some(details) = self.details.get_mut(&name) {
                    details.remove_member(uid);
                }
            }
        }
    }

    /// Mark a tag for deletion from the store. Returns whether it existed.
    pub fn delete_tag(&mut self, name: &str) -> bool {
        match self.details.get_mut(name) {
            Some(details) => {
                details.mark_deleted();
                for names in self.tags_per_note.values_mut() {
                    names.remove(name);
                }
                true
            }
            None => false,
        }
    }

    /// Push the tag set back to the store.
    ///
    /// The configuration folder is created (and annotated, when the account
    /// supports annotations) if missing. Per record: an unchanged remote
    /// message is kept as is; a stale one is deleted and re-appended; a
    /// record marked deleted has its message removed. Appends happen as one
    /// batch after all deletions.
    pub fn merge(&mut self, store: &mut dyn RemoteStore) -> Result<()> {
        self.init(store)?;

        let folder = match self.config_folder.clone() {
            Some(folder) => folder,
            None => {
                store.create_folder(DEFAULT_CONFIG_FOLDER)?;
                if self.account.folder_annotations_enabled() {
                    store.set_folder_type(DEFAULT_CONFIG_FOLDER, FolderType::Configuration)?;
                }
                self.config_folder = Some(DEFAULT_CONFIG_FOLDER.to_string());
                DEFAULT_CONFIG_FOLDER.to_string()
            }
        };

        let remote = store.summaries(&folder)?;
        let mut to_add = Vec::new();
        for details in self.details.values() {
            let uid = details.identification().uid();
            let existing = remote.iter().find(|s| s.subject == uid);

            if details.is_deleted() {
                if existing.is_some() {
                    store.delete_message(&folder, uid)?;
                }
                continue;
            }

            let mut push = true;
            if let Some(summary) = existing {
                let matches = store
                    .message(&folder, summary.seq)?
                    .kolab_xml()
                    .map(|xml| relation::parse(&String::from_utf8_lossy(xml)))
                    .and_then(|parsed| parsed.ok())
                    .is_some_and(|remote_details| remote_details.same_content(details));
                if matches {
                    push = false;
                } else {
                    store.delete_message(&folder, uid)?;
                }
            }
            if push {
                to_add.push(MessageDraft {
                    subject: uid.to_string(),
                    kolab_type: RELATION_KOLAB_TYPE.to_string(),
                    date: details.audit_information().last_modification_date(),
                    user: self.account.username().to_string(),
                    xml: relation::write(details),
                    attachments: Vec::new(),
                });
            }
        }
        if !to_add.is_empty() {
            store.append(&folder, &to_add)?;
        }

        // deleted records have been removed remotely; forget them locally
        self.details.retain(|_, d| !d.is_deleted());
        Ok(())
    }
}

fn leaf_name(folder: &str) -> &str {
    folder.rsplit('/').next().unwrap_or(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::{MemoryStore, Op};
    use crate::types::{AuditInformation, Identification};
    use chrono::{TimeZone, Utc};

    fn account() -> Account {
        Account::builder("imap.example.org")
            .username("jon")
            .password("pw")
            .build()
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_folder("Notes", None);
        store.add_folder("Configuration", None);
        let details = TagDetails::new(
            Identification::new("tag-uid-1", "kolabnotes-java"),
            AuditInformation::new(
                Utc.with_ymd_and_hms(2015, 8, 16, 9, 12, 30).unwrap(),
                Utc.with_ymd_and_hms(2015, 8, 16, 9, 12, 30).unwrap(),
            ),
            Tag::new("work"),
            ["n1".to_string()].into_iter().collect(),
        );
        store.seed_message(
            "Configuration",
            "tag-uid-1",
            RELATION_KOLAB_TYPE,
            Utc.with_ymd_and_hms(2015, 8, 16, 9, 12, 30).unwrap(),
            &relation::write(&details),
        );
        store
    }

    #[test]
    fn init_finds_config_folder_by_name() {
        let store = seeded_store();
        let mut tags = RemoteTags::new(account());
        tags.init(&mut store.clone()).unwrap();

        assert_eq!(tags.tags().count(), 1);
        assert_eq!(tags.tag("work").unwrap().members().len(), 1);
        assert_eq!(tags.tags_for_note("n1").len(), 1);
        assert!(tags.tags_for_note("unknown").is_empty());
    }

    #[test]
    fn attach_creates_once_and_reuses() {
        let mut tags = RemoteTags::new(account());
        tags.attach_tags("n1", &[Tag::new("home")]);
        let uid = tags.tag("home").unwrap().identification().uid().to_string();

        tags.attach_tags("n2", &[Tag::new("home")]);
        assert_eq!(tags.tag("home").unwrap().identification().uid(), uid);
        assert_eq!(tags.tag("home").unwrap().members().len(), 2);
        assert_eq!(tags.tags_for_note("n2").len(), 1);
    }

    #[test]
    fn remove_tags_detaches_a_note_everywhere() {
        let mut tags = RemoteTags::new(account());
        tags.attach_tags("n1", &[Tag::new("a"), Tag::new("b")]);
        tags.remove_tags("n1");
        assert!(tags.tags_for_note("n1").is_empty());
        assert!(!tags.tag("a").unwrap().contains_member("n1"));
        // the records themselves survive with empty member sets
        assert_eq!(tags.tags().count(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let store = seeded_store();
        let mut tags = RemoteTags::new(account());
        tags.init(&mut store.clone()).unwrap();

        store.clear_ops();
        tags.merge(&mut store.clone()).unwrap();
        assert_eq!(store.ops(), Vec::new());

        // and again, for good measure
        tags.merge(&mut store.clone()).unwrap();
        assert_eq!(store.ops(), Vec::new());
    }

    #[test]
    fn merge_replaces_stale_records() {
        let store = seeded_store();
        let mut tags = RemoteTags::new(account());
        tags.init(&mut store.clone()).unwrap();
        tags.attach_tags("n2", &[Tag::new("work")]);

        store.clear_ops();
        tags.merge(&mut store.clone()).unwrap();
        assert_eq!(
            store.ops(),
            vec![
                Op::DeleteMessage("Configuration".to_string(), "tag-uid-1".to_string()),
                Op::Append("Configuration".to_string(), "tag-uid-1".to_string()),
            ]
        );
    }

    #[test]
    fn merge_creates_missing_config_folder() {
        let store = MemoryStore::new();
        store.add_folder("Notes", None);
        let mut tags = RemoteTags::new(account());
        tags.attach_tags("n1", &[Tag::new("new")]);

        tags.merge(&mut store.clone()).unwrap();
        assert!(store.has_folder("Configuration"));
        let subjects = store.subjects("Configuration");
        assert_eq!(subjects.len(), 1);
        assert!(store
            .ops()
            .iter()
            .any(|op| matches!(op, Op::CreateFolder(f) if f == "Configuration")));
    }

    #[test]
    fn deleted_tags_are_removed_on_merge() {
        let store = seeded_store();
        let mut tags = RemoteTags::new(account());
        tags.init(&mut store.clone()).unwrap();

        assert!(tags.delete_tag("work"));
        assert!(tags.tag("work").is_none());
        assert!(tags.tags_for_note("n1").is_empty());

        tags.merge(&mut store.clone()).unwrap();
        assert!(store.subjects("Configuration").is_empty());
        // the record is gone for good, a later merge does nothing
        store.clear_ops();
        tags.merge(&mut store.clone()).unwrap();
        assert_eq!(store.ops(), Vec::new());
    }

    #[test]
    fn annotated_config_folder_is_preferred_over_name() {
        let store = MemoryStore::new();
        store.add_folder("Configuration", None);
        store.add_folder("Kolab/Config", Some(FolderType::Configuration));
        let account = Account::builder("h")
            .username("jon")
            .password("pw")
            .folder_annotations(true)
            .build();
        let details = TagDetails::new(
            Identification::new("t1", "p"),
            AuditInformation::now(),
            Tag::new("annotated"),
            BTreeSet::new(),
        );
        store.seed_message(
            "Kolab/Config",
            "t1",
            RELATION_KOLAB_TYPE,
            Utc::now(),
            &relation::write(&details),
        );

        let mut tags = RemoteTags::new(account);
        tags.init(&mut store.clone()).unwrap();
        assert!(tags.tag("annotated").is_some());
    }
}
