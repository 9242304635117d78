//! Order-book conversion.
//!
//! [`convert_with_offers`] walks the book for one asset pair, crossing the
//! best-priced offers until the requested amount of the bought asset is
//! filled, the book runs dry, or the spend budget runs out. The per-offer
//! filter is consulted before an offer is consumed and can stop the whole
//! conversion.
//!
//! Terminology follows the order book's point of view: the offer's seller
//! gives up `wheat` (the asset the converter wants to receive) in exchange
//! for `sheep` (the asset the converter pays with).

use hayashi_common::asset::Asset;
use hayashi_common::types::{AccountId, OfferEntry};

use super::{add_account_balance, add_trustline_balance};
use crate::result::ClaimedOffer;
use crate::state::LedgerStateManager;
use crate::{Result, TxError};

/// Filter decision for one offer, taken before the offer is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferFilterResult {
    Keep,
    Stop,
}

/// Outcome of a conversion.
///
/// `Ok` covers both a full fill and a book exhausted short of the target;
/// callers compare the received amount against what they asked for.
/// `Partial` means the spend budget ran out with wheat still owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertResult {
    Ok,
    Partial,
    FilterStop,
}

/// Convert `sheep` into up to `max_wheat_receive` of `wheat` against the
/// order book, spending at most `max_sheep_send`.
///
/// Crossed offers are appended to `offer_trail` in crossing order. The
/// amounts actually moved come back through `sheep_sent` and
/// `wheat_received`.
#[allow(clippy::too_many_arguments)]
pub fn convert_with_offers<F>(
    state: &mut LedgerStateManager,
    sheep: &Asset,
    max_sheep_send: i64,
    sheep_sent: &mut i64,
    wheat: &Asset,
    max_wheat_receive: i64,
    wheat_received: &mut i64,
    offer_trail: &mut Vec<ClaimedOffer>,
    mut filter: F,
) -> Result<ConvertResult>
where
    F: FnMut(&OfferEntry) -> OfferFilterResult,
{
    offer_trail.clear();
    *sheep_sent = 0;
    *wheat_received = 0;

    let mut sheep_left = max_sheep_send;
    let mut wheat_left = max_wheat_receive;

    while wheat_left > 0 {
        let Some(offer) = state.best_offer(wheat, sheep) else {
            break;
        };

        if filter(&offer) == OfferFilterResult::Stop {
            return Ok(ConvertResult::FilterStop);
        }

        let crossed = cross_offer(state, &offer, wheat_left, sheep_left, offer_trail)?;

        if crossed.wheat_received == 0 && !crossed.offer_taken {
            // the remaining spend budget cannot move this offer
            return Ok(ConvertResult::Partial);
        }

        *wheat_received += crossed.wheat_received;
        *sheep_sent += crossed.sheep_sent;
        wheat_left -= crossed.wheat_received;
        sheep_left -= crossed.sheep_sent;

        if wheat_left > 0 && sheep_left == 0 {
            return Ok(ConvertResult::Partial);
        }
    }

    Ok(ConvertResult::Ok)
}

struct Crossed {
    wheat_received: i64,
    sheep_sent: i64,
    /// The offer was deleted or shrunk; the loop is guaranteed progress.
    offer_taken: bool,
}

/// Cross a single offer: move balances on the seller, shrink or delete the
/// offer, and record the claim.
fn cross_offer(
    state: &mut LedgerStateManager,
    offer: &OfferEntry,
    max_wheat_receive: i64,
    max_sheep_send: i64,
    offer_trail: &mut Vec<ClaimedOffer>,
) -> Result<Crossed> {
    let seller = offer.seller_id;
    let wheat = offer.selling;
    let sheep = offer.buying;

    if offer.price.n <= 0 || offer.price.d <= 0 {
        return Err(TxError::Internal("offer carries a non-positive price".to_string()));
    }

    let sellable = offer.amount.min(can_sell_at_most(state, &seller, &wheat));
    let absorbable = can_buy_at_most(state, &seller, &sheep);
    if sellable == 0 || absorbable == 0 {
        // the seller cannot honor the offer anymore; drop it from the book
        state.delete_offer(&seller, offer.offer_id);
        state.add_num_entries(&seller, -1)?;
        return Ok(Crossed {
            wheat_received: 0,
            sheep_sent: 0,
            offer_taken: true,
        });
    }

    let mut wheat_received = sellable.min(max_wheat_receive);
    // sheep owed for the wheat at the quoted price, rounded against the taker
    let mut sheep_sent = big_divide(
        (wheat_received as i128) * (offer.price.n as i128),
        offer.price.d as i128,
        Round::Up,
    )?;
    let sheep_cap = max_sheep_send.min(absorbable);
    if sheep_sent > sheep_cap {
        sheep_sent = sheep_cap;
        wheat_received = big_divide(
            (sheep_sent as i128) * (offer.price.d as i128),
            offer.price.n as i128,
            Round::Down,
        )?;
    }

    if wheat_received == 0 {
        return Ok(Crossed {
            wheat_received: 0,
            sheep_sent: 0,
            offer_taken: false,
        });
    }

    apply_balance_delta(state, &seller, &sheep, sheep_sent)?;
    apply_balance_delta(state, &seller, &wheat, -wheat_received)?;

    let new_amount = offer.amount - wheat_received;
    if new_amount == 0 {
        state.delete_offer(&seller, offer.offer_id);
        state.add_num_entries(&seller, -1)?;
    } else {
        state.update_offer(OfferEntry {
            amount: new_amount,
            ..offer.clone()
        });
    }

    offer_trail.push(ClaimedOffer {
        seller_id: seller,
        offer_id: offer.offer_id,
        asset_sold: wheat,
        amount_sold: wheat_received,
        asset_bought: sheep,
        amount_bought: sheep_sent,
    });

    Ok(Crossed {
        wheat_received,
        sheep_sent,
        offer_taken: true,
    })
}

/// How much of `asset` the account can part with.
fn can_sell_at_most(state: &LedgerStateManager, account: &AccountId, asset: &Asset) -> i64 {
    if asset.is_native() {
        let Some(account) = state.get_account(account) else {
            return 0;
        };
        let available = account.balance - state.minimum_balance(account.num_sub_entries);
        return available.max(0);
    }

    if asset.is_issuer(account) {
        return i64::MAX;
    }

    let Some(trustline) = state.get_trustline(account, asset) else {
        return 0;
    };
    if !trustline.is_authorized() {
        return 0;
    }
    trustline.balance
}

/// How much of `asset` the account can take on.
fn can_buy_at_most(state: &LedgerStateManager, account: &AccountId, asset: &Asset) -> i64 {
    if asset.is_native() {
        let Some(account) = state.get_account(account) else {
            return 0;
        };
        return (i64::MAX - account.balance).max(0);
    }

    if asset.is_issuer(account) {
        return i64::MAX;
    }

    let Some(trustline) = state.get_trustline(account, asset) else {
        return 0;
    };
    if !trustline.is_authorized() {
        return 0;
    }
    (trustline.limit - trustline.balance).max(0)
}

/// Move `delta` of `asset` on `account`, with issuance implicit: an issuer
/// neither holds nor runs out of its own asset.
fn apply_balance_delta(
    state: &mut LedgerStateManager,
    account: &AccountId,
    asset: &Asset,
    delta: i64,
) -> Result<()> {
    if asset.is_issuer(account) {
        return Ok(());
    }
    if asset.is_native() {
        let entry = state
            .get_account_mut(account)
            .ok_or_else(|| TxError::AccountNotFound(account.to_hex()))?;
        if !add_account_balance(entry, delta) {
            return Err(TxError::Internal(
                "seller balance update failed after capacity check".to_string(),
            ));
        }
        return Ok(());
    }
    let trustline = state
        .get_trustline_mut(account, asset)
        .ok_or_else(|| TxError::Internal("seller trustline vanished during crossing".to_string()))?;
    if !add_trustline_balance(trustline, delta) {
        return Err(TxError::Internal(
            "seller trustline update failed after capacity check".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Round {
    Down,
    Up,
}

fn big_divide(n: i128, d: i128, round: Round) -> Result<i64> {
    if d <= 0 {
        return Err(TxError::Internal("division by non-positive price term".to_string()));
    }
    let value = match round {
        Round::Down => n / d,
        Round::Up => {
            if n == 0 {
                0
            } else {
                (n + d - 1) / d
            }
        }
    };
    if value > i64::MAX as i128 {
        return Err(TxError::Internal("conversion amount overflow".to_string()));
    }
    Ok(value as i64)
}
