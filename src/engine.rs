//! The synchronization engine.
//!
//! [`ImapNotesRepository`] owns the local caches and drives the two sync
//! directions: [`refresh`](ImapNotesRepository::refresh) replaces the local
//! state with what the server has, [`merge`](ImapNotesRepository::merge)
//! pushes pending local changes back. Both open a fresh store connection,
//! work folder by folder, and report per-folder failures through a
//! [`SyncObserver`] instead of aborting the whole run: one broken folder
//! must not keep the others from syncing.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::account::Account;
use crate::codec::{self, NOTE_KOLAB_TYPE};
use crate::error::Result;
use crate::remote::{
    imap_store::ImapConnector, FolderType, MessageDraft, RemoteMessage, RemoteStore,
    StoreConnector,
};
use crate::repository::LocalRepository;
use crate::tags::RemoteTags;
use crate::tracker::ChangeKind;
use crate::types::{
    AuditInformation, Classification, Identification, Note, Notebook, Sharing, PRODUCT_ID,
};

/// Namespace prefixes under which other users' folders appear.
const SHARED_PREFIXES: [&str; 2] = ["Other Users", "Shared Folders"];

/// Callbacks fired while a sync run walks the folders.
pub trait SyncObserver {
    /// A folder finished syncing.
    fn folder_synced(&mut self, _folder: &str) {}

    /// A folder failed; the run continues with the next one.
    fn folder_failed(&mut self, _folder: &str, _error: &crate::error::Error) {}
}

/// The no-op observer.
impl SyncObserver for () {}

/// A note store backed by a mailbox server.
pub struct ImapNotesRepository<C: StoreConnector = ImapConnector> {
    connector: C,
    account: Account,
    root_folder: String,
    repo: LocalRepository,
    tags: RemoteTags,
}

impl ImapNotesRepository<ImapConnector> {
    /// A repository connecting to the account's IMAP server, with notes
    /// rooted at `root_folder`.
    pub fn new(account: Account, root_folder: impl Into<String>) -> Self {
        let connector = ImapConnector::new(account.clone());
        ImapNotesRepository::with_connector(connector, account, root_folder)
    }
}

impl<C: StoreConnector> ImapNotesRepository<C> {
    pub fn with_connector(connector: C, account: Account, root_folder: impl Into<String>) -> Self {
        ImapNotesRepository {
            connector,
            account: account.clone(),
            root_folder: root_folder.into(),
            repo: LocalRepository::new(),
            tags: RemoteTags::new(account),
        }
    }

    pub fn local(&self) -> &LocalRepository {
        &self.repo
    }

    pub fn local_mut(&mut self) -> &mut LocalRepository {
        &mut self.repo
    }

    pub fn tags(&self) -> &RemoteTags {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut RemoteTags {
        &mut self.tags
    }

    /// Whether a note's body has been fetched. Notes skipped by an
    /// incremental refresh only know their uid and dates until
    /// [`fill_unloaded_note`](Self::fill_unloaded_note) completes them.
    pub fn note_completely_loaded(note: &Note) -> bool {
        !note.is_stub()
    }

    /// Replace the local state with the server's, discarding all pending
    /// changes.
    pub fn refresh(&mut self) -> Result<()> {
        self.refresh_with(None, &mut ())
    }

    /// Like [`refresh`](Self::refresh), but messages sent before `cutoff`
    /// are only loaded as stubs, and per-folder progress is reported to
    /// `observer`.
    pub fn refresh_with(
        &mut self,
        cutoff: Option<DateTime<Utc>>,
        observer: &mut dyn SyncObserver,
    ) -> Result<()> {
        let mut store = self.connector.connect()?;
        self.repo.suspend();
        let result = self.do_refresh(&mut store, cutoff, observer);
        self.repo.resume();
        let _ = store.close();
        result?;
        self.repo.clear_tracking();
        Ok(())
    }

    fn do_refresh(
        &mut self,
        store: &mut C::Store,
        cutoff: Option<DateTime<Utc>>,
        observer: &mut dyn SyncObserver,
    ) -> Result<()> {
        self.tags = RemoteTags::new(self.account.clone());
        self.tags.init(store)?;
        self.repo.clear_live();

        let annotations = self.account.folder_annotations_enabled();
        for folder in store.folders()? {
            let shared = is_shared(&folder);
            let in_root = folder == self.root_folder
                || folder.starts_with(&format!("{}/", self.root_folder));
            if !shared && !in_root {
                continue;
            }
            // shared folders can only be told apart by their annotation
            if shared && !annotations {
                continue;
            }
            match self.load_folder(store, &folder, cutoff, shared) {
                Ok(true) => observer.folder_synced(&folder),
                Ok(false) => debug!(folder = %folder, "not a notes folder, skipped"),
                Err(e) => {
                    warn!(folder = %folder, error = %e, "folder failed to sync");
                    observer.folder_failed(&folder, &e);
                }
            }
        }
        Ok(())
    }

    /// Load one folder into the repository. Returns `false` when the folder
    /// turned out not to hold notes.
    fn load_folder(
        &mut self,
        store: &mut C::Store,
        folder: &str,
        cutoff: Option<DateTime<Utc>>,
        shared: bool,
    ) -> Result<bool> {
        if self.account.folder_annotations_enabled()
            && store.folder_type(folder)? != Some(FolderType::Note)
        {
            return Ok(false);
        }

        let book = if shared {
            let rights = store.my_rights(folder)?;
            Notebook::shared(
                Identification::generate(),
                AuditInformation::now(),
                Classification::Public,
                folder,
                Sharing::new(leaf_name(folder), rights.can_create, rights.can_modify),
            )
        } else {
            let summary = if folder == self.root_folder {
                folder.to_string()
            } else {
                folder[self.root_folder.len() + 1..].to_string()
            };
            Notebook::new(
                Identification::generate(),
                AuditInformation::now(),
                Classification::Public,
                summary,
            )
        };
        let book_uid = book.uid().to_string();
        self.repo.insert_notebook(book);

        for summary in store.summaries(folder)? {
            if summary.subject.is_empty() {
                continue;
            }
            let note = match (cutoff, summary.sent) {
                (Some(cutoff), Some(sent)) if cutoff > sent => Note::stub(
                    Identification::new(summary.subject.clone(), PRODUCT_ID),
                    AuditInformation::new(sent, sent),
                ),
                _ => {
                    let message = store.message(folder, summary.seq)?;
                    match self.decode_note(&message)? {
                        Some(note) => note,
                        None => continue,
                    }
                }
            };
            self.repo.insert_note(&book_uid, note);
        }
        Ok(true)
    }

    /// Decode a fetched message into a note, or `None` when the message
    /// carries no Kolab XML part.
    fn decode_note(&self, message: &RemoteMessage) -> Result<Option<Note>> {
        let xml = match message.kolab_xml() {
            Some(xml) => xml,
            None => return Ok(None),
        };
        let mut note = codec::note::parse(&String::from_utf8_lossy(xml))?;
        for part in &message.parts {
            // payloads are keyed by Content-ID, with the part filename as a
            // fallback for producers that omit the header
            let key = part.content_id.as_ref().or(part.file_name.as_ref());
            if let Some(key) = key {
                if let Some(attachment) = note.attachment_mut(key) {
                    attachment.set_data(part.body.clone());
                }
            }
        }
        for details in self.tags.tags_for_note(note.uid()) {
            note.add_category(details.tag().clone());
        }
        Ok(Some(note))
    }

    /// Complete a stub with a fully loaded copy of the same note, without
    /// tracking the change.
    pub fn fill_unloaded_note(&mut self, loaded: &Note) {
        self.repo.suspend();
        if let Some(stub) = self.repo.note_mut_raw(loaded.uid()) {
            if stub.is_stub() {
                stub.fill_from(loaded);
            }
        }
        self.repo.resume();
    }

    /// Push all pending local changes to the server.
    pub fn merge(&mut self) -> Result<()> {
        self.merge_with(&mut ())
    }

    /// Like [`merge`](Self::merge), with per-folder failures reported to
    /// `observer`. On full success all pending changes are cleared; folder
    /// failures reported through the observer do not fail the run.
    pub fn merge_with(&mut self, observer: &mut dyn SyncObserver) -> Result<()> {
        if self.repo.is_empty() {
            self.refresh_with(None, observer)?;
        }
        let mut store = self.connector.connect()?;
        self.repo.suspend();
        let result = self.do_merge(&mut store, observer);
        self.repo.resume();
        let _ = store.close();
        result?;
        self.repo.clear_tracking();
        Ok(())
    }

    fn do_merge(&mut self, store: &mut C::Store, observer: &mut dyn SyncObserver) -> Result<()> {
        self.tags.init(store)?;

        let book_uids: Vec<String> = self
            .repo
            .notebooks()
            .map(|b| b.uid().to_string())
            .chain(self.repo.deleted_notebooks().map(|b| b.uid().to_string()))
            .collect();
        for uid in book_uids {
            if let Err(e) = self.merge_notebook(store, &uid) {
                let name = self.notebook_summary(&uid);
                warn!(folder = %name, error = %e, "folder failed to merge");
                observer.folder_failed(&name, &e);
            }
        }

        self.tags.merge(store)?;
        Ok(())
    }

    fn merge_notebook(&mut self, store: &mut C::Store, uid: &str) -> Result<()> {
        let (summary, shared) = match self
            .repo
            .notebook(uid)
            .or_else(|| self.repo.deleted_notebook(uid))
        {
            Some(book) => (book.summary().to_string(), book.is_shared()),
            None => return Ok(()),
        };
        let folder = self.resolve_folder(&summary, shared);

        match self.repo.change(uid) {
            Some(ChangeKind::Delete) => {
                store.delete_folder(&folder)?;
                return Ok(());
            }
            Some(ChangeKind::New) => {
                store.create_folder(&folder)?;
                if self.account.folder_annotations_enabled() {
                    store.set_folder_type(&folder, FolderType::Note)?;
                }
            }
            Some(ChangeKind::Update) => {
                if let Some(old) = self.repo.rename_of(uid) {
                    if old != summary {
                        let old_folder = self.resolve_folder(old, shared);
                        store.rename_folder(&old_folder, &folder)?;
                    }
                }
                if self.account.folder_annotations_enabled() {
                    store.set_folder_type(&folder, FolderType::Note)?;
                }
            }
            _ => {}
        }

        // a notebook that only ever existed locally and carries no intent
        // has nothing to push into
        if !store.folder_exists(&folder)? {
            return Ok(());
        }

        let mut notes: Vec<Note> = match self.repo.notebook(uid) {
            Some(book) => book.notes().cloned().collect(),
            None => Vec::new(),
        };
        notes.extend(self.repo.deleted_notes(uid).cloned());

        // messages are immutable: an update deletes the old message and
        // appends a fresh one
        let mut deletions = Vec::new();
        let mut additions = Vec::new();
        for note in &notes {
            let note_uid = note.uid();
            match self.repo.change(note_uid) {
                Some(ChangeKind::New) => {
                    additions.push(self.note_draft(note));
                    self.tags.remove_tags(note_uid);
                    self.tags.attach_tags(note_uid, note.categories());
                }
                Some(ChangeKind::Update) => {
                    deletions.push(note_uid.to_string());
                    additions.push(self.note_draft(note));
                    self.tags.remove_tags(note_uid);
                    self.tags.attach_tags(note_uid, note.categories());
                }
                Some(ChangeKind::Delete) => {
                    deletions.push(note_uid.to_string());
                    self.tags.remove_tags(note_uid);
                }
                _ => {}
            }
        }
        for subject in &deletions {
            store.delete_message(&folder, subject)?;
        }
        if !additions.is_empty() {
            store.append(&folder, &additions)?;
        }
        Ok(())
    }

    fn note_draft(&self, note: &Note) -> MessageDraft {
        MessageDraft {
            subject: note.uid().to_string(),
            kolab_type: NOTE_KOLAB_TYPE.to_string(),
            date: note.audit_information().last_modification_date(),
            user: self.account.username().to_string(),
            xml: codec::note::write(note),
            attachments: note.attachments().cloned().collect(),
        }
    }

    fn resolve_folder(&self, summary: &str, shared: bool) -> String {
        if shared || summary == self.root_folder {
            summary.to_string()
        } else {
            format!("{}/{}", self.root_folder, summary)
        }
    }

    fn notebook_summary(&self, uid: &str) -> String {
        self.repo
            .notebook(uid)
            .or_else(|| self.repo.deleted_notebook(uid))
            .map(|b| b.summary().to_string())
            .unwrap_or_else(|| uid.to_string())
    }
}

fn is_shared(folder: &str) -> bool {
    SHARED_PREFIXES
        .iter()
        .any(|prefix| folder.starts_with(prefix))
}

fn leaf_name(folder: &str) -> &str {
    folder.rsplit('/').next().unwrap_or(folder)
}
