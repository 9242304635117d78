//! Operation executors.
//!
//! One submodule per operation type, plus the order-book conversion
//! primitive path payments cross offers with. Executors return the typed
//! operation result in `Ok(...)`; the error channel is reserved for fatal
//! conditions. Executors write through the state manager as they go — the
//! caller owns the savepoint and rolls failed operations back.

mod change_trust;
mod create_account;
mod offer_exchange;
mod path_payment;
mod payment;

pub use change_trust::execute_change_trust;
pub use create_account::execute_create_account;
pub use offer_exchange::{convert_with_offers, ConvertResult, OfferFilterResult};
pub use path_payment::{execute_path_payment, IMPLICIT_CREATE_STARTING_BALANCE};
pub use payment::execute_payment;

use hayashi_common::asset::add_balance;
use hayashi_common::types::{AccountEntry, TrustLineEntry};

/// Add a delta to an account's native balance.
///
/// Returns false when the result would overflow i64 or go negative.
pub(crate) fn add_account_balance(account: &mut AccountEntry, delta: i64) -> bool {
    match add_balance(account.balance, delta, i64::MAX) {
        Some(balance) => {
            account.balance = balance;
            true
        }
        None => false,
    }
}

/// Add a delta to a trustline balance, keeping `0 <= balance <= limit`.
pub(crate) fn add_trustline_balance(trustline: &mut TrustLineEntry, delta: i64) -> bool {
    match add_balance(trustline.balance, delta, trustline.limit) {
        Some(balance) => {
            trustline.balance = balance;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hayashi_common::asset::Asset;
    use hayashi_common::types::{AccountId, AccountType};

    #[test]
    fn test_add_account_balance_bounds() {
        let mut account = AccountEntry {
            account_id: AccountId::ZERO,
            balance: 100,
            num_sub_entries: 0,
            flags: 0,
            account_type: AccountType::Client,
        };
        assert!(add_account_balance(&mut account, 50));
        assert_eq!(account.balance, 150);
        assert!(!add_account_balance(&mut account, -200));
        assert_eq!(account.balance, 150);
        assert!(!add_account_balance(&mut account, i64::MAX));
    }

    #[test]
    fn test_add_trustline_balance_bounds() {
        let mut trustline = TrustLineEntry {
            account_id: AccountId::ZERO,
            asset: Asset::Native,
            balance: 40,
            limit: 100,
            flags: 0,
        };
        assert!(add_trustline_balance(&mut trustline, 60));
        assert_eq!(trustline.balance, 100);
        assert!(!add_trustline_balance(&mut trustline, 1));
        assert!(add_trustline_balance(&mut trustline, -100));
        assert_eq!(trustline.balance, 0);
        assert!(!add_trustline_balance(&mut trustline, -1));
    }
}
