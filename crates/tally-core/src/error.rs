//! Shared error type across tally crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed configuration.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// The backing store rejected or could not complete the update.
    StoreFailure,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::StoreFailure => "STORE_FAILURE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("store operation failed: {0}")]
    Store(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TallyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TallyError::BadRequest(_) => ClientCode::BadRequest,
            TallyError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            TallyError::Store(_) => ClientCode::StoreFailure,
            TallyError::Internal(_) => ClientCode::Internal,
        }
    }

    /// True for the one domain failure: the store could not apply the add.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, TallyError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_codes_are_stable() {
        assert_eq!(TallyError::Store("x".into()).client_code().as_str(), "STORE_FAILURE");
        assert_eq!(TallyError::UnsupportedVersion.client_code().as_str(), "UNSUPPORTED_VERSION");
        assert_eq!(TallyError::BadRequest("x".into()).client_code().as_str(), "BAD_REQUEST");
        assert_eq!(TallyError::Internal("x".into()).client_code().as_str(), "INTERNAL");
    }

    #[test]
    fn store_error_display_keeps_detail() {
        let e = TallyError::Store("ProvisionedThroughputExceeded".into());
        assert!(e.is_store_failure());
        assert_eq!(e.to_string(), "store operation failed: ProvisionedThroughputExceeded");
    }
}
