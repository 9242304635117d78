//! PathPayment operation execution.
//!
//! A path payment delivers an exact amount of the destination asset and
//! works backwards from there: the last leg is credited first, then each
//! hop converts against the order book to find out what the previous leg
//! must produce, and finally the source is debited — provided the total
//! stays within `send_max`. Everything in between is all-or-nothing; the
//! caller rolls back on any failure code.

use hayashi_common::asset::Asset;
use hayashi_common::protocol::reload_source_on_native_debit;
use hayashi_common::types::{AccountId, AccountType, TrustLineEntry};
use tracing::debug;

use super::offer_exchange::{convert_with_offers, ConvertResult, OfferFilterResult};
use super::{add_account_balance, add_trustline_balance, execute_create_account};
use crate::operations::{CreateAccountOp, PathPaymentOp, MAX_PATH_LENGTH};
use crate::result::{
    ClaimedOffer, CreateAccountResult, OperationResult, PathPaymentResult, PathPaymentSuccess,
    SimplePaymentResult,
};
use crate::state::LedgerStateManager;
use crate::validation::LedgerContext;
use crate::{Result, TxError};

/// Native balance a destination created on the fly starts with.
pub const IMPLICIT_CREATE_STARTING_BALANCE: i64 = 20;

/// Execute a PathPayment operation.
pub fn execute_path_payment(
    op: &PathPaymentOp,
    source: &AccountId,
    state: &mut LedgerStateManager,
    context: &LedgerContext,
) -> Result<OperationResult> {
    // Validation; no writes yet
    if op.dest_amount <= 0 || op.send_max <= 0 {
        return Ok(make_result(PathPaymentResult::Malformed));
    }
    if !op.send_asset.is_valid() || !op.dest_asset.is_valid() {
        return Ok(make_result(PathPaymentResult::Malformed));
    }
    if op.path.len() > MAX_PATH_LENGTH || !op.path.iter().all(Asset::is_valid) {
        return Ok(make_result(PathPaymentResult::Malformed));
    }

    // tracks the last amount traded while walking backwards
    let mut cur_b = op.dest_asset;
    let mut cur_b_received = op.dest_amount;

    // full path to the destination, starting with the send asset
    let mut full_path = Vec::with_capacity(1 + op.path.len());
    full_path.push(op.send_asset);
    full_path.extend(op.path.iter().copied());

    // A direct send of an asset back to its issuer must always work: the
    // issuer holds no trustline over its own asset and its account is not
    // re-validated through the issuer lookup.
    let bypass_issuer_check = !op.dest_asset.is_native()
        && full_path.len() == 1
        && op.send_asset == op.dest_asset
        && op.dest_asset.is_issuer(&op.destination);

    if state.get_account(&op.destination).is_none() {
        if !create_destination(op, source, state, context)? {
            debug!(destination = %op.destination, "path payment could not set up destination");
            return Ok(make_result(PathPaymentResult::NoDestination));
        }
    }

    // re-read the destination to pick up creation side effects
    if !bypass_issuer_check && state.get_account(&op.destination).is_none() {
        return Ok(make_result(PathPaymentResult::NoDestination));
    }

    // credit the destination with the last leg
    if cur_b.is_native() {
        let destination = state
            .get_account_mut(&op.destination)
            .ok_or_else(|| TxError::Internal("destination vanished before credit".to_string()))?;
        if !add_account_balance(destination, cur_b_received) {
            debug!(destination = %op.destination, "destination balance overflow");
            return Ok(make_result(PathPaymentResult::Malformed));
        }
    } else {
        if !bypass_issuer_check {
            let (_, issuer) = state.get_trustline_with_issuer(&op.destination, &cur_b);
            if issuer.is_none() {
                return Ok(make_result(PathPaymentResult::NoIssuer(cur_b)));
            }
        }
        // issuers take their own asset back without a trustline
        if !cur_b.is_issuer(&op.destination) {
            let Some(line) = state.get_trustline(&op.destination, &cur_b) else {
                return Ok(make_result(PathPaymentResult::NoTrust));
            };
            if !line.is_authorized() {
                return Ok(make_result(PathPaymentResult::NotAuthorized));
            }
            let line = state
                .get_trustline_mut(&op.destination, &cur_b)
                .ok_or_else(|| TxError::Internal("destination trustline vanished".to_string()))?;
            if !add_trustline_balance(line, cur_b_received) {
                return Ok(make_result(PathPaymentResult::LineFull));
            }
        }
    }

    let last = SimplePaymentResult {
        destination: op.destination,
        asset: cur_b,
        amount: cur_b_received,
    };
    let mut offers: Vec<ClaimedOffer> = Vec::new();

    // walk the path backwards, converting at each hop
    for cur_a in full_path.iter().rev() {
        if *cur_a == cur_b {
            continue;
        }

        if let Some(issuer) = cur_a.issuer() {
            if state.get_account(issuer).is_none() {
                return Ok(make_result(PathPaymentResult::NoIssuer(*cur_a)));
            }
        }

        let mut cur_a_sent = 0;
        let mut actual_cur_b_received = 0;
        let mut offer_trail = Vec::new();
        let convert_result = convert_with_offers(
            state,
            cur_a,
            i64::MAX,
            &mut cur_a_sent,
            &cur_b,
            cur_b_received,
            &mut actual_cur_b_received,
            &mut offer_trail,
            |offer| {
                if offer.seller_id == *source {
                    // crossing our own offer could invalidate the source
                    // account mid-operation
                    OfferFilterResult::Stop
                } else {
                    OfferFilterResult::Keep
                }
            },
        )?;

        if cur_a_sent < 0 {
            return Err(TxError::Internal(
                "conversion produced a negative amount".to_string(),
            ));
        }

        match convert_result {
            ConvertResult::FilterStop => {
                return Ok(make_result(PathPaymentResult::OfferCrossSelf));
            }
            ConvertResult::Ok if actual_cur_b_received == cur_b_received => {}
            // a short fill fails the same way as an exhausted budget
            ConvertResult::Ok | ConvertResult::Partial => {
                return Ok(make_result(PathPaymentResult::TooFewOffers));
            }
        }

        // the next hop must produce what this one consumed
        cur_b_received = cur_a_sent;
        cur_b = *cur_a;

        // claimed offers accumulate in forward path order
        offers.splice(0..0, offer_trail);
    }

    // we've reached the send asset; settle with the source
    let cur_b_sent = cur_b_received;
    if cur_b_sent > op.send_max {
        return Ok(make_result(PathPaymentResult::OverSendmax));
    }

    if cur_b.is_native() {
        if reload_source_on_native_debit(context.protocol_version)
            && state.get_account(source).is_none()
        {
            debug!(source = %source, "source account missing before native debit");
            return Ok(make_result(PathPaymentResult::Malformed));
        }
        let source_account = state
            .get_account(source)
            .ok_or(TxError::SourceAccountNotFound)?;
        let min_balance = state.minimum_balance(source_account.num_sub_entries);
        if source_account.balance - cur_b_sent < min_balance {
            return Ok(make_result(PathPaymentResult::Underfunded));
        }
        let source_account = state
            .get_account_mut(source)
            .ok_or(TxError::SourceAccountNotFound)?;
        if !add_account_balance(source_account, -cur_b_sent) {
            return Err(TxError::Internal(
                "source debit failed after balance check".to_string(),
            ));
        }
    } else {
        if !bypass_issuer_check {
            let (_, issuer) = state.get_trustline_with_issuer(source, &cur_b);
            if issuer.is_none() {
                return Ok(make_result(PathPaymentResult::NoIssuer(cur_b)));
            }
        }
        // issuers send their own asset without holding it
        if !cur_b.is_issuer(source) {
            let Some(line) = state.get_trustline(source, &cur_b) else {
                return Ok(make_result(PathPaymentResult::SrcNoTrust));
            };
            if !line.is_authorized() {
                return Ok(make_result(PathPaymentResult::SrcNotAuthorized));
            }
            let line = state
                .get_trustline_mut(source, &cur_b)
                .ok_or_else(|| TxError::Internal("source trustline vanished".to_string()))?;
            if !add_trustline_balance(line, -cur_b_sent) {
                return Ok(make_result(PathPaymentResult::Underfunded));
            }
        }
    }

    Ok(make_result(PathPaymentResult::Success(PathPaymentSuccess {
        offers,
        last,
    })))
}

/// Create the missing destination through a nested CreateAccount funded by
/// the payment source, plus the destination trustline when the delivered
/// asset is issued. `false` means the destination could not be set up and
/// the payment fails with `NoDestination`.
fn create_destination(
    op: &PathPaymentOp,
    source: &AccountId,
    state: &mut LedgerStateManager,
    context: &LedgerContext,
) -> Result<bool> {
    let create_op = CreateAccountOp {
        destination: op.destination,
        starting_balance: IMPLICIT_CREATE_STARTING_BALANCE,
        account_type: AccountType::Client,
    };
    let result = execute_create_account(&create_op, source, state, context)?;
    let OperationResult::CreateAccount(code) = result else {
        return Err(TxError::Internal(
            "create-account returned a foreign result".to_string(),
        ));
    };
    match code {
        CreateAccountResult::Success => {}
        CreateAccountResult::Underfunded
        | CreateAccountResult::LowReserve
        | CreateAccountResult::Underauthorized => return Ok(false),
        // a malformed or conflicting nested create is an engine bug
        other => {
            return Err(TxError::UnexpectedSubOperationResult(format!(
                "create-account: {other:?}"
            )))
        }
    }

    if !op.dest_asset.is_native() {
        return create_destination_trustline(&op.destination, &op.dest_asset, state);
    }
    Ok(true)
}

fn create_destination_trustline(
    destination: &AccountId,
    asset: &Asset,
    state: &mut LedgerStateManager,
) -> Result<bool> {
    if state.get_trustline(destination, asset).is_some() {
        return Ok(true);
    }
    let issuer_id = asset
        .issuer()
        .ok_or_else(|| TxError::Internal("trustline over the native asset".to_string()))?;
    // the destination may be the issuer itself; issuers hold no line over
    // their own asset
    if issuer_id == destination {
        return Ok(true);
    }
    let issuer = state.get_account(issuer_id).ok_or_else(|| {
        TxError::Internal("issuer missing while creating destination trustline".to_string())
    })?;

    let mut line = TrustLineEntry {
        account_id: *destination,
        asset: *asset,
        balance: 0,
        limit: i64::MAX,
        flags: 0,
    };
    line.set_authorized(!issuer.is_auth_required());

    if !state.add_num_entries(destination, 1)? {
        return Ok(false);
    }
    state.create_trustline(line);
    Ok(true)
}

fn make_result(code: PathPaymentResult) -> OperationResult {
    OperationResult::PathPayment(code)
}
