//! Shared error type across kubehook crates.

use thiserror::Error;

/// Client-facing error codes (stable API, also used as metric labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed request body or embedded object.
    DecodeError,
    /// `kind` is not a registered review kind.
    UnknownKind,
    /// Response could not be produced or written.
    WriteError,
    /// Inbound trace headers were unusable.
    TraceExtraction,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::DecodeError => "DECODE_ERROR",
            ClientCode::UnknownKind => "UNKNOWN_KIND",
            ClientCode::WriteError => "WRITE_ERROR",
            ClientCode::TraceExtraction => "TRACE_EXTRACTION",
            ClientCode::BadConfig => "BAD_CONFIG",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, KubehookError>;

/// Unified error type used by core and gateway.
///
/// Every variant is scoped to a single request (or to startup, for config
/// errors); none of them is fatal to a running process.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KubehookError {
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unhandled kind: {0}")]
    UnknownKind(String),
    #[error("write error: {0}")]
    Write(String),
    #[error("trace extraction failed: {0}")]
    TraceExtraction(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl KubehookError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            KubehookError::Decode(_) => ClientCode::DecodeError,
            KubehookError::UnknownKind(_) => ClientCode::UnknownKind,
            KubehookError::Write(_) => ClientCode::WriteError,
            KubehookError::TraceExtraction(_) => ClientCode::TraceExtraction,
            KubehookError::BadConfig(_) => ClientCode::BadConfig,
            KubehookError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            KubehookError::Internal(_) => ClientCode::Internal,
        }
    }
}

impl From<serde_json::Error> for KubehookError {
    fn from(e: serde_json::Error) -> Self {
        KubehookError::Decode(e.to_string())
    }
}
