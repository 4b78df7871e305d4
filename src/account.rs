//! Connection settings for a Kolab account.
//!
//! An [`Account`] bundles everything needed to reach the mailbox that backs
//! the note store: host, port, credentials, whether to negotiate TLS, and
//! whether the server understands the Kolab folder annotations. Accounts are
//! built with [`Account::builder`]:
//!
//! ```
//! use kolab_note_sync::Account;
//!
//! let account = Account::builder("imap.example.org")
//!     .username("jon")
//!     .password("hunter2")
//!     .folder_annotations(true)
//!     .build();
//! assert_eq!(account.port(), 993);
//! ```

/// Settings for one server account.
#[derive(Debug, Clone)]
pub struct Account {
    host: String,
    port: u16,
    username: String,
    password: String,
    tls: bool,
    folder_annotations: bool,
}

impl Account {
    /// Start building an account for the given host.
    pub fn builder(host: impl Into<String>) -> AccountBuilder {
        AccountBuilder {
            host: host.into(),
            port: 993,
            username: String::new(),
            password: String::new(),
            tls: true,
            folder_annotations: false,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether to negotiate TLS when connecting.
    ///
    /// When enabled and the server refuses an implicit TLS session, the
    /// connector falls back to STARTTLS on the cleartext port.
    pub fn use_tls(&self) -> bool {
        self.tls
    }

    /// Whether the server supports `/vendor/kolab/folder-type` annotations.
    ///
    /// With annotations enabled, folders are classified by their annotation
    /// value and shared folders of other users become visible. Without them,
    /// every folder under the root is treated as a notes folder and the
    /// configuration folder is found by name.
    pub fn folder_annotations_enabled(&self) -> bool {
        self.folder_annotations
    }
}

/// Builder for [`Account`].
#[derive(Debug)]
pub struct AccountBuilder {
    host: String,
    port: u16,
    username: String,
    password: String,
    tls: bool,
    folder_annotations: bool,
}

impl AccountBuilder {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Override the default port (993).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Connect in plaintext instead of negotiating TLS.
    pub fn insecure(mut self) -> Self {
        self.tls = false;
        self
    }

    pub fn folder_annotations(mut self, enabled: bool) -> Self {
        self.folder_annotations = enabled;
        self
    }

    pub fn build(self) -> Account {
        Account {
            host: self.host,
            port: self.port,
            username: self.username,
            password: self.password,
            tls: self.tls,
            folder_annotations: self.folder_annotations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let account = Account::builder("imap.example.org")
            .username("jon")
            .password("hunter2")
            .build();
        assert_eq!(account.host(), "imap.example.org");
        assert_eq!(account.port(), 993);
        assert!(account.use_tls());
        assert!(!account.folder_annotations_enabled());
    }

    #[test]
    fn overrides() {
        let account = Account::builder("localhost")
            .port(3143)
            .insecure()
            .folder_annotations(true)
            .build();
        assert_eq!(account.port(), 3143);
        assert!(!account.use_tls());
        assert!(account.folder_annotations_enabled());
    }
}
