//! Payment operation execution.
//!
//! A payment is the degenerate path payment: same asset on both ends, no
//! intermediate hops, and the spend cap equal to the delivered amount. The
//! executor builds that path payment, runs it, and maps the result codes
//! back onto the payment's own set.

use hayashi_common::types::AccountId;

use super::path_payment::execute_path_payment;
use crate::operations::{PathPaymentOp, PaymentOp};
use crate::result::{OperationResult, PathPaymentResult, PaymentResult};
use crate::state::LedgerStateManager;
use crate::validation::LedgerContext;
use crate::{Result, TxError};

/// Execute a Payment operation.
pub fn execute_payment(
    op: &PaymentOp,
    source: &AccountId,
    state: &mut LedgerStateManager,
    context: &LedgerContext,
) -> Result<OperationResult> {
    if op.amount <= 0 {
        return Ok(make_result(PaymentResult::Malformed));
    }
    if !op.asset.is_valid() {
        return Ok(make_result(PaymentResult::Malformed));
    }

    let path_op = PathPaymentOp {
        send_asset: op.asset,
        send_max: op.amount,
        destination: op.destination,
        dest_asset: op.asset,
        dest_amount: op.amount,
        path: Vec::new(),
    };
    let result = execute_path_payment(&path_op, source, state, context)?;
    let OperationResult::PathPayment(inner) = result else {
        return Err(TxError::Internal(
            "path payment returned a foreign result".to_string(),
        ));
    };

    let mapped = match inner {
        PathPaymentResult::Success(success) => {
            // a degenerate path payment must deliver this payment exactly,
            // with no conversions
            if !success.offers.is_empty()
                || success.last.destination != op.destination
                || success.last.asset != op.asset
                || success.last.amount != op.amount
            {
                return Err(TxError::Internal(
                    "direct payment produced an inconsistent delivery".to_string(),
                ));
            }
            PaymentResult::Success
        }
        PathPaymentResult::Malformed => PaymentResult::Malformed,
        PathPaymentResult::Underfunded => PaymentResult::Underfunded,
        PathPaymentResult::SrcNoTrust => PaymentResult::SrcNoTrust,
        PathPaymentResult::SrcNotAuthorized => PaymentResult::SrcNotAuthorized,
        PathPaymentResult::NoDestination => PaymentResult::NoDestination,
        PathPaymentResult::NoTrust => PaymentResult::NoTrust,
        PathPaymentResult::NotAuthorized => PaymentResult::NotAuthorized,
        PathPaymentResult::LineFull => PaymentResult::LineFull,
        PathPaymentResult::NoIssuer(asset) => PaymentResult::NoIssuer(asset),
        // a same-asset payment has no conversions to fail these ways
        other @ (PathPaymentResult::TooFewOffers
        | PathPaymentResult::OfferCrossSelf
        | PathPaymentResult::OverSendmax) => {
            return Err(TxError::UnexpectedSubOperationResult(format!(
                "path payment: {other:?}"
            )))
        }
    };
    Ok(make_result(mapped))
}

fn make_result(code: PaymentResult) -> OperationResult {
    OperationResult::Payment(code)
}
