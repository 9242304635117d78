//! Invariant framework for the hayashi ledger.
//!
//! Invariants are named checks run against the ledger state after an
//! apply. They encode the structural guarantees the engine promises —
//! trustline bounds, sub-entry accounting, conservation of the native
//! asset — and are wired into test harnesses and embedders that want a
//! safety net behind the engine.

use std::collections::HashMap;

use hayashi_common::protocol::self_trust_forbidden;
use hayashi_tx::LedgerStateManager;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvariantError {
    #[error("invariant {name} failed: {details}")]
    Violated { name: String, details: String },
}

/// Context passed to invariants.
pub struct InvariantContext<'a> {
    /// Post-apply ledger state.
    pub state: &'a LedgerStateManager,
    /// Protocol version the apply ran under.
    pub protocol_version: u32,
    /// Total native balance the ledger is expected to hold. Operations
    /// move the native asset, they never mint it.
    pub expected_native_total: i64,
}

pub trait Invariant: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, ctx: &InvariantContext) -> Result<(), InvariantError>;
}

pub struct InvariantManager {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantManager {
    pub fn new() -> Self {
        Self {
            invariants: Vec::new(),
        }
    }

    /// Manager with every invariant this crate ships.
    pub fn all() -> Self {
        let mut manager = Self::new();
        manager.add(TrustLineBounds);
        manager.add(SubEntriesMatchEntries);
        manager.add(ConservationOfNative);
        manager
    }

    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    pub fn check_all(&self, ctx: &InvariantContext) -> Result<(), InvariantError> {
        for invariant in &self.invariants {
            invariant.check(ctx)?;
        }
        Ok(())
    }
}

impl Default for InvariantManager {
    fn default() -> Self {
        Self::all()
    }
}

/// Invariant: every trustline sits within `0 <= balance <= limit`, no
/// trustline covers the native asset, and (once the protocol forbids it)
/// no account trusts an asset it issues.
pub struct TrustLineBounds;

impl Invariant for TrustLineBounds {
    fn name(&self) -> &str {
        "TrustLineBounds"
    }

    fn check(&self, ctx: &InvariantContext) -> Result<(), InvariantError> {
        for line in ctx.state.trustlines() {
            if line.balance < 0 || line.balance > line.limit {
                return Err(InvariantError::Violated {
                    name: self.name().to_string(),
                    details: format!(
                        "trustline {} over {} holds {} with limit {}",
                        line.account_id, line.asset, line.balance, line.limit
                    ),
                });
            }
            let Some(issuer) = line.asset.issuer() else {
                return Err(InvariantError::Violated {
                    name: self.name().to_string(),
                    details: format!("trustline {} over the native asset", line.account_id),
                });
            };
            if self_trust_forbidden(ctx.protocol_version) && issuer == &line.account_id {
                return Err(InvariantError::Violated {
                    name: self.name().to_string(),
                    details: format!("account {} trusts its own asset {}", line.account_id, line.asset),
                });
            }
        }
        Ok(())
    }
}

/// Invariant: each account's sub-entry count equals the trustlines and
/// offers it owns.
pub struct SubEntriesMatchEntries;

impl Invariant for SubEntriesMatchEntries {
    fn name(&self) -> &str {
        "SubEntriesMatchEntries"
    }

    fn check(&self, ctx: &InvariantContext) -> Result<(), InvariantError> {
        let mut owned: HashMap<[u8; 32], u32> = HashMap::new();
        for line in ctx.state.trustlines() {
            *owned.entry(line.account_id.0).or_default() += 1;
        }
        for offer in ctx.state.offers() {
            *owned.entry(offer.seller_id.0).or_default() += 1;
        }
        for account in ctx.state.accounts() {
            let expected = owned.get(&account.account_id.0).copied().unwrap_or(0);
            if account.num_sub_entries != expected {
                return Err(InvariantError::Violated {
                    name: self.name().to_string(),
                    details: format!(
                        "account {} records {} subentries but owns {}",
                        account.account_id, account.num_sub_entries, expected
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Invariant: the sum of native balances matches the expected total.
pub struct ConservationOfNative;

impl Invariant for ConservationOfNative {
    fn name(&self) -> &str {
        "ConservationOfNative"
    }

    fn check(&self, ctx: &InvariantContext) -> Result<(), InvariantError> {
        let mut total: i128 = 0;
        for account in ctx.state.accounts() {
            total += account.balance as i128;
        }
        if total != ctx.expected_native_total as i128 {
            return Err(InvariantError::Violated {
                name: self.name().to_string(),
                details: format!(
                    "native total is {total}, expected {}",
                    ctx.expected_native_total
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hayashi_common::asset::{str_to_asset_code, Asset};
    use hayashi_common::types::{AccountEntry, AccountId, AccountType, TrustLineEntry};
    use hayashi_common::protocol::CURRENT_LEDGER_PROTOCOL_VERSION;

    fn account_id(seed: u8) -> AccountId {
        AccountId([seed; 32])
    }

    fn state_with_account(balance: i64, subentries: u32) -> LedgerStateManager {
        let mut state = LedgerStateManager::new(10);
        state.create_account(AccountEntry {
            account_id: account_id(1),
            balance,
            num_sub_entries: subentries,
            flags: 0,
            account_type: AccountType::Client,
        });
        state
    }

    fn ctx(state: &LedgerStateManager, expected_native_total: i64) -> InvariantContext<'_> {
        InvariantContext {
            state,
            protocol_version: CURRENT_LEDGER_PROTOCOL_VERSION,
            expected_native_total,
        }
    }

    #[test]
    fn test_clean_state_passes() {
        let state = state_with_account(100, 0);
        assert!(InvariantManager::all().check_all(&ctx(&state, 100)).is_ok());
    }

    #[test]
    fn test_trustline_over_limit_detected() {
        let mut state = state_with_account(100, 1);
        state.create_trustline(TrustLineEntry {
            account_id: account_id(1),
            asset: Asset::alphanum4(str_to_asset_code("USD"), account_id(9)),
            balance: 200,
            limit: 100,
            flags: 0,
        });
        let result = TrustLineBounds.check(&ctx(&state, 100));
        assert!(matches!(result, Err(InvariantError::Violated { .. })));
    }

    #[test]
    fn test_self_trust_detected() {
        let mut state = state_with_account(100, 1);
        state.create_trustline(TrustLineEntry {
            account_id: account_id(1),
            asset: Asset::alphanum4(str_to_asset_code("USD"), account_id(1)),
            balance: 0,
            limit: 100,
            flags: 0,
        });
        assert!(TrustLineBounds.check(&ctx(&state, 100)).is_err());

        // legal before the gate
        let relaxed = InvariantContext {
            state: &state,
            protocol_version: 2,
            expected_native_total: 100,
        };
        assert!(TrustLineBounds.check(&relaxed).is_ok());
    }

    #[test]
    fn test_subentry_mismatch_detected() {
        let state = state_with_account(100, 3);
        let result = SubEntriesMatchEntries.check(&ctx(&state, 100));
        assert!(matches!(result, Err(InvariantError::Violated { .. })));
    }

    #[test]
    fn test_native_total_mismatch_detected() {
        let state = state_with_account(100, 0);
        assert!(ConservationOfNative.check(&ctx(&state, 99)).is_err());
    }
}
