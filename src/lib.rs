//! A client-side synchronization engine for notes kept in a Kolab v3
//! mailbox.
//!
//! Kolab stores groupware objects as ordinary e-mail messages: every note is
//! a MIME message whose subject is the note's uid and whose `kolab.xml`
//! attachment carries the note as an XML document, filed in an IMAP folder
//! that acts as the notebook. Tags live apart from the notes, as relation
//! documents in a configuration folder that reference their member notes by
//! uid.
//!
//! This crate keeps a local, in-memory copy of that store and reconciles it
//! with the server in two directions:
//!
//! - [`ImapNotesRepository::refresh`] replaces the local state with the
//!   server's, discarding pending local changes, and
//! - [`ImapNotesRepository::merge`] pushes tracked local changes back,
//!   folder by folder, using delete-then-append since messages on an IMAP
//!   server are immutable.
//!
//! Local edits made between the two are tracked automatically: every
//! mutation made through [`LocalRepository`] records an intent (new, update,
//! or delete) per object uid, and consecutive intents collapse sensibly. A
//! note created and deleted locally never reaches the server at all.
//!
//! # Example
//!
//! ```no_run
//! use kolab_note_sync::{Account, ImapNotesRepository};
//!
//! # fn main() -> Result<(), kolab_note_sync::Error> {
//! let account = Account::builder("imap.example.org")
//!     .username("jon")
//!     .password("hunter2")
//!     .build();
//! let mut repo = ImapNotesRepository::new(account, "Notes");
//!
//! // pull everything the server has
//! repo.refresh()?;
//!
//! // work locally
//! let book_uid = repo
//!     .local()
//!     .notebook_by_summary("Notes")
//!     .map(|b| b.uid().to_string())
//!     .ok_or(kolab_note_sync::Error::Protocol("no root notebook".into()))?;
//! let note_uid = repo.local_mut().create_note(&book_uid, "groceries");
//!
//! // push the changes back
//! repo.merge()?;
//! # let _ = note_uid;
//! # Ok(())
//! # }
//! ```
//!
//! # Incremental loading
//!
//! [`ImapNotesRepository::refresh_with`] takes an optional cutoff date;
//! messages sent before it are loaded as cheap stubs that only know their
//! uid and dates. [`ImapNotesRepository::fill_unloaded_note`] completes a
//! stub later without marking the note as locally modified.

mod account;
pub mod codec;
mod engine;
mod error;
pub mod remote;
mod repository;
mod tags;
mod tracker;
pub mod types;

pub use crate::account::{Account, AccountBuilder};
pub use crate::engine::{ImapNotesRepository, SyncObserver};
pub use crate::error::{Error, ParseError, Result};
pub use crate::repository::{LocalRepository, NoteMut, NotebookMut};
pub use crate::tags::RemoteTags;
pub use crate::tracker::ChangeKind;
