//! Error types for the graphwire driver.
//!
//! Every failure that crosses the driver API is a [`DriverError`]. Callers
//! branch on [`DriverError::kind`], which is stable across releases, rather
//! than on the human-readable message.

use thiserror::Error;

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Server error codes the driver recovers from locally.
pub mod codes {
    /// The token presented with the call has expired or was revoked.
    pub const TOKEN_CREDENTIAL_INVALID: &str = "AUT3";
    /// The replica that received a write is not the primary.
    pub const NOT_PRIMARY: &str = "RPL1";
    /// The replica does not currently know the primary.
    pub const UNKNOWN_LEADER: &str = "RPL2";
}

/// Stable classification of a [`DriverError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Authentication,
    Routing,
    Availability,
    Server,
    TransactionClosed,
    SessionClosed,
    Protocol,
    Configuration,
    InvalidArgument,
    Unsupported,
}

/// Errors that can occur while talking to a cluster.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("token credential invalid: {0}")]
    TokenCredentialInvalid(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("replica is not the primary: {0}")]
    NotPrimary(String),

    #[error("replica does not know the primary: {0}")]
    UnknownLeader(String),

    #[error("unable to reach a primary replica: {0}")]
    Unavailable(String),

    #[error("[{code}] {message}")]
    Server { code: String, message: String },

    #[error("the transaction has been closed")]
    TransactionClosed,

    #[error("the session has been closed")]
    SessionClosed,

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not supported by server: {0}")]
    Unsupported(String),
}

impl DriverError {
    /// Classify a server-reported error by its message code.
    pub fn from_server(code: &str, message: &str) -> Self {
        let message = message.to_string();
        match code {
            codes::TOKEN_CREDENTIAL_INVALID => DriverError::TokenCredentialInvalid(message),
            codes::NOT_PRIMARY => DriverError::NotPrimary(message),
            codes::UNKNOWN_LEADER => DriverError::UnknownLeader(message),
            _ => DriverError::Server {
                code: code.to_string(),
                message,
            },
        }
    }

    /// Parse a `[CODE] message` string as sent by the server.
    ///
    /// Returns `None` when the text carries no code prefix.
    pub fn from_coded_message(text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('[')?;
        let (code, message) = rest.split_once(']')?;
        if code.is_empty() || code.contains(char::is_whitespace) {
            return None;
        }
        Some(Self::from_server(code, message.trim_start()))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::Transport(_) => ErrorKind::Transport,
            DriverError::TokenCredentialInvalid(_) | DriverError::Authentication(_) => {
                ErrorKind::Authentication
            }
            DriverError::NotPrimary(_) | DriverError::UnknownLeader(_) => ErrorKind::Routing,
            DriverError::Unavailable(_) => ErrorKind::Availability,
            DriverError::Server { .. } => ErrorKind::Server,
            DriverError::TransactionClosed => ErrorKind::TransactionClosed,
            DriverError::SessionClosed => ErrorKind::SessionClosed,
            DriverError::Protocol(_) => ErrorKind::Protocol,
            DriverError::Configuration(_) => ErrorKind::Configuration,
            DriverError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DriverError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Whether the token renewal guard should renew and retry.
    pub fn is_token_invalid(&self) -> bool {
        matches!(self, DriverError::TokenCredentialInvalid(_))
    }

    /// Whether the cluster router should re-resolve the primary and retry.
    ///
    /// An unreachable replica counts: its leadership may have moved.
    pub fn is_routing(&self) -> bool {
        matches!(self.kind(), ErrorKind::Routing | ErrorKind::Transport)
    }

    /// The server's message code, when the error came from the server.
    pub fn code(&self) -> Option<&str> {
        match self {
            DriverError::Server { code, .. } => Some(code),
            DriverError::TokenCredentialInvalid(_) => Some(codes::TOKEN_CREDENTIAL_INVALID),
            DriverError::NotPrimary(_) => Some(codes::NOT_PRIMARY),
            DriverError::UnknownLeader(_) => Some(codes::UNKNOWN_LEADER),
            _ => None,
        }
    }
}

impl From<tonic::Status> for DriverError {
    fn from(status: tonic::Status) -> Self {
        if let Some(error) = DriverError::from_coded_message(status.message()) {
            return error;
        }
        let message = status.message().to_string();
        match status.code() {
            tonic::Code::Unavailable
            | tonic::Code::Cancelled
            | tonic::Code::Aborted
            | tonic::Code::DeadlineExceeded => DriverError::Transport(message),
            tonic::Code::Unauthenticated => DriverError::Authentication(message),
            tonic::Code::Unimplemented => DriverError::Unsupported(message),
            code => DriverError::Server {
                code: format!("{code:?}"),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_classify_as_recoverable() {
        assert!(DriverError::from_server("AUT3", "expired").is_token_invalid());
        assert_eq!(
            DriverError::from_server("RPL1", "not primary").kind(),
            ErrorKind::Routing
        );
        assert_eq!(
            DriverError::from_server("RPL2", "no leader").kind(),
            ErrorKind::Routing
        );
    }

    #[test]
    fn unknown_code_is_surfaced_verbatim() {
        let err = DriverError::from_server("TXN08", "commit conflict");
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.code(), Some("TXN08"));
        assert_eq!(err.to_string(), "[TXN08] commit conflict");
    }

    #[test]
    fn coded_message_parsing() {
        let err = DriverError::from_coded_message("[AUT3] token expired").unwrap();
        assert_eq!(err, DriverError::TokenCredentialInvalid("token expired".into()));

        assert!(DriverError::from_coded_message("no code here").is_none());
        assert!(DriverError::from_coded_message("[] empty").is_none());
        assert!(DriverError::from_coded_message("[two words] nope").is_none());
    }

    #[test]
    fn status_codes_map_to_kinds() {
        let unavailable: DriverError = tonic::Status::unavailable("connection refused").into();
        assert_eq!(unavailable.kind(), ErrorKind::Transport);

        let unimplemented: DriverError = tonic::Status::unimplemented("user_token").into();
        assert_eq!(unimplemented.kind(), ErrorKind::Unsupported);

        let unauthenticated: DriverError = tonic::Status::unauthenticated("bad password").into();
        assert_eq!(unauthenticated.kind(), ErrorKind::Authentication);
        assert!(!unauthenticated.is_token_invalid());

        let coded: DriverError = tonic::Status::unauthenticated("[AUT3] expired").into();
        assert!(coded.is_token_invalid());
    }

    #[test]
    fn routing_includes_transport_failures() {
        assert!(DriverError::Transport("reset".into()).is_routing());
        assert!(DriverError::NotPrimary("x".into()).is_routing());
        assert!(!DriverError::Unavailable("x".into()).is_routing());
        assert!(!DriverError::TransactionClosed.is_routing());
    }
}
