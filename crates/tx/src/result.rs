//! Typed operation results.
//!
//! Every operation resolves to one of its enumerated result codes. These
//! are consensus-observable values: the exact code an apply produces is
//! part of the protocol, so each executor returns them in `Ok(...)` rather
//! than through the error channel.

use hayashi_common::asset::Asset;
use hayashi_common::types::AccountId;

/// Result of applying a single operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    CreateAccount(CreateAccountResult),
    Payment(PaymentResult),
    ChangeTrust(ChangeTrustResult),
    PathPayment(PathPaymentResult),
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::CreateAccount(r) => matches!(r, CreateAccountResult::Success),
            OperationResult::Payment(r) => matches!(r, PaymentResult::Success),
            OperationResult::ChangeTrust(r) => matches!(r, ChangeTrustResult::Success),
            OperationResult::PathPayment(r) => matches!(r, PathPaymentResult::Success(_)),
        }
    }
}

/// Result codes for CreateAccount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateAccountResult {
    Success,
    Malformed,
    Underfunded,
    LowReserve,
    Underauthorized,
    AlreadyExist,
}

/// Result codes for ChangeTrust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTrustResult {
    Success,
    Malformed,
    NoIssuer,
    InvalidLimit,
    LowReserve,
    SelfNotAllowed,
}

/// Result codes for Payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResult {
    Success,
    Malformed,
    Underfunded,
    SrcNoTrust,
    SrcNotAuthorized,
    NoDestination,
    NoTrust,
    NotAuthorized,
    LineFull,
    NoIssuer(Asset),
}

/// Result codes for PathPayment. `NoIssuer` names the asset whose issuer
/// was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPaymentResult {
    Success(PathPaymentSuccess),
    Malformed,
    Underfunded,
    SrcNoTrust,
    SrcNotAuthorized,
    NoDestination,
    NoTrust,
    NotAuthorized,
    LineFull,
    NoIssuer(Asset),
    TooFewOffers,
    OfferCrossSelf,
    OverSendmax,
}

/// Payload of a successful path payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPaymentSuccess {
    /// Offers consumed along the way, in forward path order.
    pub offers: Vec<ClaimedOffer>,
    /// The delivery leg: what the destination received.
    pub last: SimplePaymentResult,
}

/// The delivery leg of a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplePaymentResult {
    pub destination: AccountId,
    pub asset: Asset,
    pub amount: i64,
}

/// One crossed offer in a path payment's offer trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedOffer {
    pub seller_id: AccountId,
    pub offer_id: i64,
    pub asset_sold: Asset,
    pub amount_sold: i64,
    pub asset_bought: Asset,
    pub amount_bought: i64,
}
