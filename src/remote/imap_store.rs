//! The IMAP-backed [`RemoteStore`].
//!
//! One [`ImapStore`] wraps one authenticated session. Folder selection is
//! cached; messages flagged `\Deleted` are expunged when the folder is left,
//! so a delete-then-append cycle within one folder behaves like an atomic
//! replace from the next session's point of view.

use imap::{ClientBuilder, ConnectionMode, Session};
use mailparse::MailHeaderMap;
use tracing::debug;

use super::{
    annotation, mime, rights, FolderRights, FolderType, MessageDraft, MessageSummary,
    RemoteMessage, RemoteStore, StoreConnector,
};
use crate::account::Account;
use crate::error::{Error, Result};

/// Connects an [`ImapStore`] per sync run.
#[derive(Debug, Clone)]
pub struct ImapConnector {
    account: Account,
}

impl ImapConnector {
    pub fn new(account: Account) -> Self {
        ImapConnector { account }
    }
}

impl StoreConnector for ImapConnector {
    type Store = ImapStore;

    fn connect(&self) -> Result<ImapStore> {
        let account = &self.account;
        let client = if account.use_tls() {
            match ClientBuilder::new(account.host(), account.port())
                .mode(ConnectionMode::Tls)
                .connect()
            {
                Ok(client) => client,
                Err(e) => {
                    debug!(error = %e, "implicit TLS failed, retrying with STARTTLS");
                    ClientBuilder::new(account.host(), account.port())
                        .mode(ConnectionMode::StartTls)
                        .connect()?
                }
            }
        } else {
            ClientBuilder::new(account.host(), account.port())
                .mode(ConnectionMode::Plaintext)
                .connect()?
        };
        let session = client
            .login(account.username(), account.password())
            .map_err(|(e, _)| Error::Imap(e))?;
        Ok(ImapStore {
            session,
            selected: None,
            writable: false,
            exists: 0,
        })
    }
}

/// A [`RemoteStore`] talking to a live IMAP session.
pub struct ImapStore {
    session: Session<imap::Connection>,
    selected: Option<String>,
    writable: bool,
    exists: u32,
}

impl ImapStore {
    /// Select `folder`, reusing the current selection when possible.
    /// Returns the number of messages in the folder.
    fn select(&mut self, folder: &str, writable: bool) -> Result<u32> {
        if self.selected.as_deref() == Some(folder) && self.writable == writable {
            return Ok(self.exists);
        }
        self.unselect()?;
        let mailbox = if writable {
            self.session.select(folder)?
        } else {
            self.session.examine(folder)?
        };
        self.selected = Some(folder.to_string());
        self.writable = writable;
        self.exists = mailbox.exists;
        Ok(self.exists)
    }

    /// Leave the selected folder, expunging flagged messages.
    fn unselect(&mut self) -> Result<()> {
        if self.selected.take().is_some() {
            self.session.close()?;
        }
        Ok(())
    }
}

impl RemoteStore for ImapStore {
    fn folders(&mut self) -> Result<Vec<String>> {
        let names = self.session.list(Some(""), Some("*"))?;
        Ok(names.iter().map(|n| n.name().to_string()).collect())
    }

    fn folder_exists(&mut self, folder: &str) -> Result<bool> {
        let names = self.session.list(Some(""), Some(folder))?;
        Ok(names.iter().any(|n| n.name() == folder))
    }

    fn create_folder(&mut self, folder: &str) -> Result<()> {
        self.unselect()?;
        self.session.create(folder)?;
        Ok(())
    }

    fn delete_folder(&mut self, folder: &str) -> Result<()> {
        self.unselect()?;
        self.session.delete(folder)?;
        Ok(())
    }

    fn rename_folder(&mut self, from: &str, to: &str) -> Result<()> {
        self.unselect()?;
        self.session.rename(from, to)?;
        Ok(())
    }

    fn summaries(&mut self, folder: &str) -> Result<Vec<MessageSummary>> {
        if self.select(folder, false)? == 0 {
            return Ok(Vec::new());
        }
        let fetches = self
            .session
            .fetch("1:*", "(ENVELOPE INTERNALDATE BODY.PEEK[HEADER])")?;
        let mut summaries = Vec::new();
        for fetch in fetches.iter() {
            let subject = fetch
                .envelope()
                .and_then(|e| e.subject.as_ref())
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .unwrap_or_default();
            let mut sent = None;
            let mut kolab_type = None;
            if let Some(header) = fetch.header() {
                if let Ok((headers, _)) = mailparse::parse_headers(header) {
                    kolab_type = headers.get_first_value(mime::KOLAB_TYPE_HEADER);
                    sent = headers
                        .get_first_value("Date")
                        .and_then(|d| mailparse::dateparse(&d).ok())
                        .and_then(|secs| {
                            use chrono::TimeZone;
                            chrono::Utc.timestamp_opt(secs, 0).single()
                        });
                }
            }
            if sent.is_none() {
                sent = fetch
                    .internal_date()
                    .map(|d| d.with_timezone(&chrono::Utc));
            }
            summaries.push(MessageSummary {
                seq: fetch.message,
                subject,
                sent,
                kolab_type,
            });
        }
        Ok(summaries)
    }

    fn message(&mut self, folder: &str, seq: u32) -> Result<RemoteMessage> {
        self.select(folder, false)?;
        let fetches = self.session.fetch(&seq.to_string(), "BODY.PEEK[]")?;
        let body = fetches
            .iter()
            .next()
            .and_then(|f| f.body())
            .ok_or_else(|| Error::Protocol(format!("message {} not found in {}", seq, folder)))?;
        mime::parse_message(body)
    }

    fn append(&mut self, folder: &str, drafts: &[MessageDraft]) -> Result<()> {
        // leaving the folder first expunges anything flagged by a preceding
        // delete pass
        self.unselect()?;
        for draft in drafts {
            let bytes = mime::render(draft)?;
            self.session.append(folder, &bytes).finish()?;
        }
        Ok(())
    }

    fn delete_message(&mut self, folder: &str, subject: &str) -> Result<bool> {
        if self.select(folder, true)? == 0 {
            return Ok(false);
        }
        let seq = {
            let fetches = self.session.fetch("1:*", "ENVELOPE")?;
            fetches.iter().find_map(|fetch| {
                let matches = fetch
                    .envelope()
                    .and_then(|e| e.subject.as_ref())
                    .is_some_and(|s| **s == *subject.as_bytes());
                matches.then_some(fetch.message)
            })
        };
        match seq {
            Some(seq) => {
                self.session
                    .store(&seq.to_string(), "+FLAGS (\\Deleted)")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn folder_type(&mut self, folder: &str) -> Result<Option<FolderType>> {
        let response = self
            .session
            .run_command_and_read_response(&annotation::get_command(folder))?;
        Ok(annotation::parse_folder_type(&String::from_utf8_lossy(
            &response,
        )))
    }

    fn set_folder_type(&mut self, folder: &str, folder_type: FolderType) -> Result<()> {
        self.session
            .run_command_and_read_response(&annotation::set_command(folder, folder_type))
            .map_err(|e| match e {
                // anything but an explicit OK means the annotation is not set
                imap::Error::No(..) | imap::Error::Bad(..) => Error::Protocol(format!(
                    "server refused folder-type annotation on {}: {}",
                    folder, e
                )),
                other => Error::Imap(other),
            })?;
        Ok(())
    }

    fn my_rights(&mut self, folder: &str) -> Result<FolderRights> {
        let response = self
            .session
            .run_command_and_read_response(&format!("MYRIGHTS {}", annotation::quote(folder)))?;
        Ok(rights::parse_my_rights(&String::from_utf8_lossy(&response)))
    }

    fn close(&mut self) -> Result<()> {
        let _ = self.unselect();
        self.session.logout()?;
        Ok(())
    }
}
