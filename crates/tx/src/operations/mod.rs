//! Operation envelopes.
//!
//! The validated inputs to the apply engine. An [`Operation`] optionally
//! overrides the transaction source for the single operation it wraps.

pub mod execute;

use hayashi_common::asset::Asset;
use hayashi_common::types::{AccountId, AccountType};

/// Longest allowed intermediate asset path in a path payment.
pub const MAX_PATH_LENGTH: usize = 5;

/// Create and fund a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountOp {
    pub destination: AccountId,
    pub starting_balance: i64,
    pub account_type: AccountType,
}

/// Send `amount` of `asset` to `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOp {
    pub destination: AccountId,
    pub asset: Asset,
    pub amount: i64,
}

/// Create, modify, or (with `limit` 0) remove the source's trustline to
/// `line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTrustOp {
    pub line: Asset,
    pub limit: i64,
}

/// Deliver exactly `dest_amount` of `dest_asset` to `destination`, spending
/// at most `send_max` of `send_asset`, converting through `path` against
/// the order book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPaymentOp {
    pub send_asset: Asset,
    pub send_max: i64,
    pub destination: AccountId,
    pub dest_asset: Asset,
    pub dest_amount: i64,
    pub path: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBody {
    CreateAccount(CreateAccountOp),
    Payment(PaymentOp),
    ChangeTrust(ChangeTrustOp),
    PathPayment(PathPaymentOp),
}

impl OperationBody {
    pub fn name(&self) -> &'static str {
        match self {
            OperationBody::CreateAccount(_) => "create-account",
            OperationBody::Payment(_) => "payment",
            OperationBody::ChangeTrust(_) => "change-trust",
            OperationBody::PathPayment(_) => "path-payment",
        }
    }
}

/// An operation with an optional per-operation source override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub source_account: Option<AccountId>,
    pub body: OperationBody,
}

impl Operation {
    pub fn new(body: OperationBody) -> Self {
        Self {
            source_account: None,
            body,
        }
    }
}
