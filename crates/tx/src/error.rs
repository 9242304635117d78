//! Error types for the apply engine.
//!
//! [`TxError`] is the fatal tier only: conditions that abort the enclosing
//! transaction because the engine detected an impossible state or a
//! sub-operation returned a code it has no mapping for. Ordinary operation
//! failures are not errors — they are typed result codes returned in
//! `Ok(...)` and rolled back by the caller.

use thiserror::Error;

/// Fatal conditions during operation apply.
#[derive(Debug, Error)]
pub enum TxError {
    /// The operation's source account does not exist in the ledger.
    #[error("source account not found")]
    SourceAccountNotFound,

    /// Account not found (with context).
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// A nested sub-operation returned a code the caller cannot map.
    #[error("unexpected sub-operation result: {0}")]
    UnexpectedSubOperationResult(String),

    /// Internal error: an invariant the engine relies on was violated.
    #[error("internal error: {0}")]
    Internal(String),
}
