//! Credentials and per-call authentication metadata.

use std::fmt;
use std::path::PathBuf;

/// Username, password and TLS settings used to reach a cluster.
///
/// Immutable once built; each server stub holds its own copy.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    username: String,
    password: String,
    tls_enabled: bool,
    tls_root_ca: Option<PathBuf>,
}

impl Credential {
    /// A credential for a plaintext (non-TLS) connection.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            tls_enabled: false,
            tls_root_ca: None,
        }
    }

    /// A TLS credential. With no root CA the platform trust store is used.
    pub fn with_tls(
        username: impl Into<String>,
        password: impl Into<String>,
        tls_root_ca: Option<PathBuf>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            tls_enabled: true,
            tls_root_ca,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls_enabled
    }

    pub fn tls_root_ca(&self) -> Option<&PathBuf> {
        self.tls_root_ca.as_ref()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tls_enabled", &self.tls_enabled)
            .field("tls_root_ca", &self.tls_root_ca)
            .finish()
    }
}

/// The secret presented with a call.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// Plaintext password, only sent while no token is held.
    Password(String),
    Token(String),
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Password(_) => f.write_str("Password(<redacted>)"),
            Secret::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}

/// Authentication metadata attached to every outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMetadata {
    pub username: String,
    pub secret: Secret,
}

impl CallMetadata {
    pub const USERNAME_KEY: &'static str = "username";
    pub const PASSWORD_KEY: &'static str = "password";
    pub const TOKEN_KEY: &'static str = "token";

    /// Metadata for `credential`, preferring `token` when one is held.
    pub fn for_credential(credential: &Credential, token: Option<&str>) -> Self {
        let secret = match token {
            Some(token) => Secret::Token(token.to_string()),
            None => Secret::Password(credential.password().to_string()),
        };
        Self {
            username: credential.username().to_string(),
            secret,
        }
    }

    /// Key/value pairs as they go on the wire.
    pub fn pairs(&self) -> [(&'static str, &str); 2] {
        let secret = match &self.secret {
            Secret::Password(password) => (Self::PASSWORD_KEY, password.as_str()),
            Secret::Token(token) => (Self::TOKEN_KEY, token.as_str()),
        };
        [(Self::USERNAME_KEY, self.username.as_str()), secret]
    }

    pub fn token(&self) -> Option<&str> {
        match &self.secret {
            Secret::Token(token) => Some(token),
            Secret::Password(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let credential = Credential::new("admin", "hunter2");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn metadata_sends_password_until_token_is_held() {
        let credential = Credential::new("admin", "hunter2");

        let first = CallMetadata::for_credential(&credential, None);
        assert_eq!(first.pairs(), [("username", "admin"), ("password", "hunter2")]);
        assert!(first.token().is_none());

        let later = CallMetadata::for_credential(&credential, Some("tok-1"));
        assert_eq!(later.pairs(), [("username", "admin"), ("token", "tok-1")]);
        assert_eq!(later.token(), Some("tok-1"));
    }

    #[test]
    fn tls_credential_keeps_root_ca() {
        let credential = Credential::with_tls("u", "p", Some(PathBuf::from("/etc/ca.pem")));
        assert!(credential.tls_enabled());
        assert_eq!(credential.tls_root_ca(), Some(&PathBuf::from("/etc/ca.pem")));
    }
}
