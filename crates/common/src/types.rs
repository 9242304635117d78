//! Core ledger entry types.
//!
//! These are the entry shapes the apply engine operates on: accounts keyed
//! by [`AccountId`], trustlines keyed by `(account, asset)`, and order-book
//! offers. Balances are signed 64-bit integers in the smallest unit of the
//! asset.

use std::cmp::Ordering;
use std::fmt;

use crate::asset::Asset;

/// Opaque 32-byte account identifier (a public key on the wire).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// All-zero account id, occasionally useful as a placeholder in tests.
    pub const ZERO: Self = Self([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // full hex is noise in test output; the first few bytes identify
        write!(f, "AccountId({}..)", hex::encode(&self.0[..4]))
    }
}

/// Account flag: new trustlines over this account's issued assets start
/// unauthorized until the issuer allows them.
pub const AUTH_REQUIRED_FLAG: u32 = 0x1;

/// Trustline flag: the holder may receive and send the asset.
pub const AUTHORIZED_FLAG: u32 = 0x1;

/// Classification of an account within the system.
///
/// Most accounts are `Client`. `Operational` accounts are infrastructure
/// accounts; creating one requires an operational funding source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Operational,
    Client,
}

/// A ledger account: native balance plus bookkeeping for dependent entries.
///
/// `num_sub_entries` counts the entries owned by this account (trustlines
/// and offers); it drives the minimum-balance reserve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEntry {
    pub account_id: AccountId,
    pub balance: i64,
    pub num_sub_entries: u32,
    pub flags: u32,
    pub account_type: AccountType,
}

impl AccountEntry {
    pub fn is_auth_required(&self) -> bool {
        self.flags & AUTH_REQUIRED_FLAG != 0
    }
}

/// A trustline: one account's holding of one issued asset.
///
/// Invariant maintained by the engine: `0 <= balance <= limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustLineEntry {
    pub account_id: AccountId,
    pub asset: Asset,
    pub balance: i64,
    pub limit: i64,
    pub flags: u32,
}

impl TrustLineEntry {
    pub fn is_authorized(&self) -> bool {
        self.flags & AUTHORIZED_FLAG != 0
    }

    pub fn set_authorized(&mut self, authorized: bool) {
        if authorized {
            self.flags |= AUTHORIZED_FLAG;
        } else {
            self.flags &= !AUTHORIZED_FLAG;
        }
    }
}

/// Price of the selling asset in terms of the buying asset, as a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Price {
    pub n: i32,
    pub d: i32,
}

impl Price {
    pub const fn new(n: i32, d: i32) -> Self {
        Self { n, d }
    }

    /// Ratio comparison by cross-multiplication; 128-bit to avoid overflow.
    pub fn cmp_ratio(&self, other: &Price) -> Ordering {
        let lhs = (self.n as i128) * (other.d as i128);
        let rhs = (other.n as i128) * (self.d as i128);
        lhs.cmp(&rhs)
    }
}

/// An order-book offer: `seller_id` sells `amount` of `selling`, priced in
/// `buying` at `price` (buying per selling). Offers count as one sub-entry
/// on the seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferEntry {
    pub seller_id: AccountId,
    pub offer_id: i64,
    pub selling: Asset,
    pub buying: Asset,
    pub amount: i64,
    pub price: Price,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_hex_round_trip() {
        let id = AccountId::from_bytes([7u8; 32]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(AccountId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn test_account_id_from_hex_rejects_bad_length() {
        assert!(AccountId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_trustline_authorization_flag() {
        let mut tl = TrustLineEntry {
            account_id: AccountId::ZERO,
            asset: Asset::Native,
            balance: 0,
            limit: 100,
            flags: 0,
        };
        assert!(!tl.is_authorized());
        tl.set_authorized(true);
        assert!(tl.is_authorized());
        tl.set_authorized(false);
        assert!(!tl.is_authorized());
    }

    #[test]
    fn test_price_ratio_comparison() {
        let half = Price::new(1, 2);
        let two_thirds = Price::new(2, 3);
        let also_half = Price::new(2, 4);

        assert_eq!(half.cmp_ratio(&two_thirds), Ordering::Less);
        assert_eq!(two_thirds.cmp_ratio(&half), Ordering::Greater);
        assert_eq!(half.cmp_ratio(&also_half), Ordering::Equal);
    }
}
