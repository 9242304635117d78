//! Shared domain types for the hayashi ledger.
//!
//! This crate holds the data model the apply engine operates on — account
//! identifiers and entries, trustlines, offers, assets — plus the ledger
//! protocol version gates and configuration. It has no engine logic of its
//! own.

pub mod asset;
pub mod config;
pub mod protocol;
pub mod types;

pub use asset::{AlphaNum12, AlphaNum4, Asset};
pub use config::LedgerConfig;
pub use types::{
    AccountEntry, AccountId, AccountType, OfferEntry, Price, TrustLineEntry, AUTHORIZED_FLAG,
    AUTH_REQUIRED_FLAG,
};
