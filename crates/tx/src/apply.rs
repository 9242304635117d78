//! Operation application.
//!
//! [`apply_operation`] is the engine's entry point: it dispatches one
//! operation to its executor under a savepoint and guarantees all-or-nothing
//! visibility — a failed operation (typed failure code or fatal error)
//! leaves the ledger state byte-identical to where it started.

use hayashi_common::types::AccountId;
use tracing::{debug, warn};

use crate::operations::execute::{
    execute_change_trust, execute_create_account, execute_path_payment, execute_payment,
};
use crate::operations::{Operation, OperationBody};
use crate::result::OperationResult;
use crate::state::LedgerStateManager;
use crate::validation::LedgerContext;
use crate::{Result, TxError};

/// Apply a single operation against the ledger state.
///
/// On a successful result the writes stay in the state manager (and in any
/// delta derived from a savepoint taken before the call). On a failure —
/// typed code or fatal error — every write is rolled back before this
/// returns.
pub fn apply_operation(
    op: &Operation,
    source: &AccountId,
    state: &mut LedgerStateManager,
    context: &LedgerContext,
) -> Result<OperationResult> {
    let op_source = op.source_account.unwrap_or(*source);
    if state.get_account(&op_source).is_none() {
        return Err(TxError::SourceAccountNotFound);
    }

    let savepoint = state.savepoint();
    let result = match &op.body {
        OperationBody::CreateAccount(body) => {
            execute_create_account(body, &op_source, state, context)
        }
        OperationBody::Payment(body) => execute_payment(body, &op_source, state, context),
        OperationBody::ChangeTrust(body) => execute_change_trust(body, &op_source, state, context),
        OperationBody::PathPayment(body) => execute_path_payment(body, &op_source, state, context),
    };

    match &result {
        Ok(outcome) if outcome.is_success() => {}
        Ok(outcome) => {
            debug!(op = op.body.name(), outcome = ?outcome, "operation failed, rolling back");
            state.rollback_to(savepoint);
        }
        Err(error) => {
            warn!(op = op.body.name(), %error, "operation aborted, rolling back");
            state.rollback_to(savepoint);
        }
    }
    result
}
