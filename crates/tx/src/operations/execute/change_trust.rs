//! ChangeTrust operation execution.

use hayashi_common::protocol::{native_trust_forbidden, self_trust_forbidden};
use hayashi_common::types::{AccountId, TrustLineEntry};

use crate::operations::ChangeTrustOp;
use crate::result::{ChangeTrustResult, OperationResult};
use crate::state::LedgerStateManager;
use crate::validation::LedgerContext;
use crate::{Result, TxError};

/// Execute a ChangeTrust operation.
///
/// With a positive limit, creates the source's trustline to `op.line` or
/// raises/lowers its limit; with limit 0, removes an empty trustline. The
/// limit can never drop below the balance currently held.
pub fn execute_change_trust(
    op: &ChangeTrustOp,
    source: &AccountId,
    state: &mut LedgerStateManager,
    context: &LedgerContext,
) -> Result<OperationResult> {
    // Validation; no writes yet
    if op.limit < 0 {
        return Ok(make_result(ChangeTrustResult::Malformed));
    }
    if !op.line.is_valid() {
        return Ok(make_result(ChangeTrustResult::Malformed));
    }
    if native_trust_forbidden(context.protocol_version) && op.line.is_native() {
        return Ok(make_result(ChangeTrustResult::Malformed));
    }

    if state.get_account(source).is_none() {
        return Err(TxError::SourceAccountNotFound);
    }

    let (trustline, issuer) = state.get_trustline_with_issuer(source, &op.line);
    let trustline = trustline.cloned();
    let issuer = issuer.cloned();

    // The self-trust gate tests the loaded issuer account; with no issuer
    // account it cannot fire and the issuer checks below decide instead.
    if self_trust_forbidden(context.protocol_version) {
        if let Some(issuer_account) = &issuer {
            if issuer_account.account_id == *source {
                return Ok(make_result(ChangeTrustResult::SelfNotAllowed));
            }
        }
    }

    if let Some(existing) = trustline {
        // Modifying an existing trustline. The limit cannot drop below the
        // balance currently held with the issuer.
        if op.limit < existing.balance {
            return Ok(make_result(ChangeTrustResult::InvalidLimit));
        }

        if op.limit == 0 {
            state.delete_trustline(source, &op.line);
            if !state.add_num_entries(source, -1)? {
                return Err(TxError::Internal(
                    "subentry decrement failed while deleting trustline".to_string(),
                ));
            }
            return Ok(make_result(ChangeTrustResult::Success));
        }

        if issuer.is_none() {
            return Ok(make_result(ChangeTrustResult::NoIssuer));
        }
        let line = state
            .get_trustline_mut(source, &op.line)
            .ok_or_else(|| TxError::Internal("trustline vanished during apply".to_string()))?;
        line.limit = op.limit;
        Ok(make_result(ChangeTrustResult::Success))
    } else {
        // Creating a new trustline
        if op.limit == 0 {
            return Ok(make_result(ChangeTrustResult::InvalidLimit));
        }
        let Some(issuer) = issuer else {
            return Ok(make_result(ChangeTrustResult::NoIssuer));
        };

        let mut line = TrustLineEntry {
            account_id: *source,
            asset: op.line,
            balance: 0,
            limit: op.limit,
            flags: 0,
        };
        line.set_authorized(!issuer.is_auth_required());

        if !state.add_num_entries(source, 1)? {
            return Ok(make_result(ChangeTrustResult::LowReserve));
        }
        state.create_trustline(line);
        Ok(make_result(ChangeTrustResult::Success))
    }
}

fn make_result(code: ChangeTrustResult) -> OperationResult {
    OperationResult::ChangeTrust(code)
}
