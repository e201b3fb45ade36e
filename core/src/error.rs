//! Error taxonomy for the adapter.
//!
//! Mirrors the three-way split from the design: user errors are surfaced to
//! the DAP client as error responses, silent errors are logged and
//! swallowed, fatal errors tear the session down. Only [`AdapterError`]
//! crosses component boundaries; silent failures are logged at their source
//! and never constructed as this type.

use thiserror::Error;

/// Errors that the top-level DAP request handler turns into an error
/// response. Everything else (source-map fetch/parse failures, stale script
/// lookups, predictor scan errors) is logged at the call site and discarded.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("unable to attach to main target")]
    NoMainTarget,

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("thread {0} is not paused")]
    NotPaused(crate::thread::ThreadId),

    #[error("unknown thread: {0}")]
    UnknownThread(crate::thread::ThreadId),

    #[error("unknown variables reference: {0}")]
    UnknownVariablesReference(i64),

    #[error("unknown frame id: {0}")]
    UnknownFrameId(i64),

    #[error("CDP session gone")]
    SessionGone,

    #[error("CDP command failed: {0}")]
    Cdp(#[from] crate::cdp::client::CdpError),
}

pub type AdapterResult<T> = Result<T, AdapterError>;
