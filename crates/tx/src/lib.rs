//! Transactional apply engine for the hayashi ledger.
//!
//! This crate implements the apply-time semantics of the ledger's
//! value-movement operations — trustline changes, payments, and path
//! payments routed through the order book — over an in-memory ledger state
//! with savepoint/rollback semantics.
//!
//! # Key Types
//!
//! - [`LedgerStateManager`]: the ledger view operations read and write,
//!   with journaled mutations, nested savepoints, and write-set derivation.
//!
//! - [`LedgerContext`]: ledger-level parameters (sequence, protocol
//!   version) an apply runs under.
//!
//! - [`OperationResult`]: the typed, consensus-observable outcome of each
//!   operation. Failures are values; [`TxError`] is reserved for fatal
//!   conditions that abort the enclosing transaction.
//!
//! # Applying an operation
//!
//! ```
//! use hayashi_common::types::{AccountEntry, AccountId, AccountType};
//! use hayashi_common::asset::Asset;
//! use hayashi_tx::operations::{Operation, OperationBody, PaymentOp};
//! use hayashi_tx::{apply_operation, LedgerContext, LedgerStateManager};
//!
//! let mut state = LedgerStateManager::new(10);
//! for seed in [1u8, 2] {
//!     state.create_account(AccountEntry {
//!         account_id: AccountId([seed; 32]),
//!         balance: 1000,
//!         num_sub_entries: 0,
//!         flags: 0,
//!         account_type: AccountType::Client,
//!     });
//! }
//!
//! let savepoint = state.savepoint();
//! let op = Operation::new(OperationBody::Payment(PaymentOp {
//!     destination: AccountId([2; 32]),
//!     asset: Asset::Native,
//!     amount: 250,
//! }));
//! let result = apply_operation(&op, &AccountId([1; 32]), &mut state, &LedgerContext::latest(1))
//!     .expect("no fatal error");
//! assert!(result.is_success());
//!
//! // the write-set since the savepoint is what a store would persist
//! assert!(state.delta_since(savepoint).has_changes());
//! ```

pub mod apply;
mod error;
pub mod operations;
pub mod result;
pub mod state;
pub mod validation;

pub use apply::apply_operation;
pub use error::TxError;
pub use result::{
    ChangeTrustResult, ClaimedOffer, CreateAccountResult, OperationResult, PathPaymentResult,
    PathPaymentSuccess, PaymentResult, SimplePaymentResult,
};
pub use state::{
    LedgerDelta, LedgerEntry, LedgerEntryChange, LedgerKey, LedgerStateManager, Savepoint,
};
pub use validation::LedgerContext;

/// Result type alias for the apply engine; the error side is the fatal
/// tier only.
pub type Result<T> = std::result::Result<T, TxError>;
