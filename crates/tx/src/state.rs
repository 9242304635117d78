//! Ledger state management for operation execution.
//!
//! [`LedgerStateManager`] is the in-memory ledger view the apply engine
//! reads and writes: accounts, trustlines, and order-book offers, plus a
//! price-ordered offer index for best-offer lookups.
//!
//! Mutations are journaled. A [`Savepoint`] marks a position in the
//! journal; [`LedgerStateManager::rollback_to`] restores the state at that
//! position exactly, and [`LedgerStateManager::delta_since`] derives the
//! write-set (created / updated / deleted entries, in first-touch order)
//! accumulated since it. Savepoints nest, which is what gives sub-operations
//! their scoped commit-or-discard semantics: dropping a savepoint keeps the
//! writes in the enclosing scope, rolling back discards them.

use std::collections::{BTreeMap, HashMap, HashSet};

use hayashi_common::asset::Asset;
use hayashi_common::types::{AccountEntry, AccountId, OfferEntry, Price, TrustLineEntry};

use crate::{Result, TxError};

/// Asset key for trustline and order-book lookups.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssetKey {
    Native,
    CreditAlphanum4([u8; 4], [u8; 32]),
    CreditAlphanum12([u8; 12], [u8; 32]),
}

impl AssetKey {
    pub fn from_asset(asset: &Asset) -> Self {
        match asset {
            Asset::Native => AssetKey::Native,
            Asset::CreditAlphanum4(a) => AssetKey::CreditAlphanum4(a.asset_code, a.issuer.0),
            Asset::CreditAlphanum12(a) => AssetKey::CreditAlphanum12(a.asset_code, a.issuer.0),
        }
    }
}

type TrustLineKey = ([u8; 32], AssetKey);

/// Key for an offer in the offers map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OfferKey {
    pub seller: [u8; 32],
    pub offer_id: i64,
}

impl OfferKey {
    fn from_offer(offer: &OfferEntry) -> Self {
        Self {
            seller: offer.seller_id.0,
            offer_id: offer.offer_id,
        }
    }
}

/// Descriptor for an offer in the order book: lower price is better, ties
/// broken by lower offer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OfferDescriptor {
    price: Price,
    offer_id: i64,
}

impl Ord for OfferDescriptor {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.price
            .cmp_ratio(&other.price)
            .then_with(|| self.offer_id.cmp(&other.offer_id))
    }
}

impl PartialOrd for OfferDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Asset pair key for order-book lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AssetPair {
    buying: AssetKey,
    selling: AssetKey,
}

/// Index of all offers organized by asset pair for best-offer queries.
///
/// Each asset pair has its own order book, a `BTreeMap` sorted by
/// `(price, offer_id)`, plus a reverse index for removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OfferIndex {
    order_books: HashMap<AssetPair, BTreeMap<OfferDescriptor, OfferKey>>,
    offer_locations: HashMap<OfferKey, (AssetPair, OfferDescriptor)>,
}

impl OfferIndex {
    fn add_offer(&mut self, offer: &OfferEntry) {
        let key = OfferKey::from_offer(offer);
        let descriptor = OfferDescriptor {
            price: offer.price,
            offer_id: offer.offer_id,
        };
        let pair = AssetPair {
            buying: AssetKey::from_asset(&offer.buying),
            selling: AssetKey::from_asset(&offer.selling),
        };
        self.order_books.entry(pair).or_default().insert(descriptor, key);
        self.offer_locations.insert(key, (pair, descriptor));
    }

    fn remove_by_key(&mut self, key: &OfferKey) {
        if let Some((pair, descriptor)) = self.offer_locations.remove(key) {
            if let Some(book) = self.order_books.get_mut(&pair) {
                book.remove(&descriptor);
                if book.is_empty() {
                    self.order_books.remove(&pair);
                }
            }
        }
    }

    fn update_offer(&mut self, offer: &OfferEntry) {
        self.remove_by_key(&OfferKey::from_offer(offer));
        self.add_offer(offer);
    }

    /// Best (lowest-price) offer selling `selling` for `buying`.
    fn best_offer_key(&self, selling: &Asset, buying: &Asset) -> Option<OfferKey> {
        let pair = AssetPair {
            buying: AssetKey::from_asset(buying),
            selling: AssetKey::from_asset(selling),
        };
        self.order_books
            .get(&pair)
            .and_then(|book| book.first_key_value())
            .map(|(_, key)| *key)
    }
}

/// One ledger entry, for the write-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Account(AccountEntry),
    TrustLine(TrustLineEntry),
    Offer(OfferEntry),
}

/// Key of a ledger entry, for deletions in the write-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerKey {
    Account(AccountId),
    TrustLine(AccountId, Asset),
    Offer(AccountId, i64),
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntryChange {
    Created {
        current: LedgerEntry,
    },
    Updated {
        previous: LedgerEntry,
        current: LedgerEntry,
    },
    Deleted {
        key: LedgerKey,
        previous: LedgerEntry,
    },
}

/// Write-set accumulated by an apply: entry changes in first-touch order.
///
/// This is what a persistence layer consumes to store the outcome of a
/// committed operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerDelta {
    changes: Vec<LedgerEntryChange>,
}

impl LedgerDelta {
    fn record(&mut self, change: LedgerEntryChange) {
        self.changes.push(change);
    }

    pub fn changes(&self) -> &[LedgerEntryChange] {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Entries created, in recording order.
    pub fn created_entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.changes.iter().filter_map(|c| match c {
            LedgerEntryChange::Created { current } => Some(current),
            _ => None,
        })
    }

    /// Post-states of updated entries, in recording order.
    pub fn updated_entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.changes.iter().filter_map(|c| match c {
            LedgerEntryChange::Updated { current, .. } => Some(current),
            _ => None,
        })
    }

    /// Keys of deleted entries, in recording order.
    pub fn deleted_keys(&self) -> impl Iterator<Item = &LedgerKey> {
        self.changes.iter().filter_map(|c| match c {
            LedgerEntryChange::Deleted { key, .. } => Some(key),
            _ => None,
        })
    }
}

/// Pre-image of an entry, recorded before each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UndoRecord {
    Account([u8; 32], Option<AccountEntry>),
    TrustLine(TrustLineKey, Option<TrustLineEntry>),
    Offer(OfferKey, Option<OfferEntry>),
}

/// A position in the mutation journal. Rolling back to it restores the
/// state exactly as it was when the savepoint was taken.
#[derive(Debug, Clone, Copy)]
pub struct Savepoint {
    journal_len: usize,
}

/// In-memory ledger state with journaled mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStateManager {
    base_reserve: i64,
    accounts: HashMap<[u8; 32], AccountEntry>,
    trustlines: HashMap<TrustLineKey, TrustLineEntry>,
    offers: HashMap<OfferKey, OfferEntry>,
    offer_index: OfferIndex,
    journal: Vec<UndoRecord>,
}

impl LedgerStateManager {
    pub fn new(base_reserve: i64) -> Self {
        Self {
            base_reserve,
            accounts: HashMap::new(),
            trustlines: HashMap::new(),
            offers: HashMap::new(),
            offer_index: OfferIndex::default(),
            journal: Vec::new(),
        }
    }

    pub fn base_reserve(&self) -> i64 {
        self.base_reserve
    }

    /// Minimum native balance for an account with `num_sub_entries`
    /// dependent entries.
    pub fn minimum_balance(&self, num_sub_entries: u32) -> i64 {
        (2 + num_sub_entries as i64) * self.base_reserve
    }

    // ---- accounts ----

    pub fn get_account(&self, id: &AccountId) -> Option<&AccountEntry> {
        self.accounts.get(&id.0)
    }

    pub fn get_account_mut(&mut self, id: &AccountId) -> Option<&mut AccountEntry> {
        if !self.accounts.contains_key(&id.0) {
            return None;
        }
        self.journal_account(id.0);
        self.accounts.get_mut(&id.0)
    }

    pub fn create_account(&mut self, entry: AccountEntry) {
        let key = entry.account_id.0;
        self.journal_account(key);
        self.accounts.insert(key, entry);
    }

    /// Adjust an account's sub-entry count.
    ///
    /// An increase fails (returns `Ok(false)`) when the account's balance
    /// does not cover the minimum balance at the new count. A decrease
    /// below zero is an engine bug and errors out.
    pub fn add_num_entries(&mut self, id: &AccountId, count: i32) -> Result<bool> {
        let Some(account) = self.accounts.get(&id.0) else {
            return Err(TxError::AccountNotFound(id.to_hex()));
        };
        if count > 0 {
            let new_min = self.minimum_balance(account.num_sub_entries + count as u32);
            if account.balance < new_min {
                return Ok(false);
            }
        } else if account.num_sub_entries < count.unsigned_abs() {
            return Err(TxError::Internal(
                "subentry count would go negative".to_string(),
            ));
        }
        self.journal_account(id.0);
        if let Some(account) = self.accounts.get_mut(&id.0) {
            account.num_sub_entries = (account.num_sub_entries as i64 + count as i64) as u32;
        }
        Ok(true)
    }

    // ---- trustlines ----

    pub fn get_trustline(&self, account: &AccountId, asset: &Asset) -> Option<&TrustLineEntry> {
        self.trustlines.get(&(account.0, AssetKey::from_asset(asset)))
    }

    pub fn get_trustline_mut(
        &mut self,
        account: &AccountId,
        asset: &Asset,
    ) -> Option<&mut TrustLineEntry> {
        let key = (account.0, AssetKey::from_asset(asset));
        if !self.trustlines.contains_key(&key) {
            return None;
        }
        self.journal_trustline(key);
        self.trustlines.get_mut(&key)
    }

    /// Trustline together with the issuer account of its asset.
    ///
    /// The two sides are independently absent: a missing issuer is a
    /// different failure than a missing trustline and the executors map
    /// them to different codes. Native assets have neither.
    pub fn get_trustline_with_issuer(
        &self,
        account: &AccountId,
        asset: &Asset,
    ) -> (Option<&TrustLineEntry>, Option<&AccountEntry>) {
        match asset.issuer() {
            None => (None, None),
            Some(issuer) => (self.get_trustline(account, asset), self.get_account(issuer)),
        }
    }

    pub fn create_trustline(&mut self, entry: TrustLineEntry) {
        let key = (entry.account_id.0, AssetKey::from_asset(&entry.asset));
        self.journal_trustline(key);
        self.trustlines.insert(key, entry);
    }

    pub fn delete_trustline(&mut self, account: &AccountId, asset: &Asset) {
        let key = (account.0, AssetKey::from_asset(asset));
        if self.trustlines.contains_key(&key) {
            self.journal_trustline(key);
            self.trustlines.remove(&key);
        }
    }

    // ---- offers ----

    pub fn get_offer(&self, seller: &AccountId, offer_id: i64) -> Option<&OfferEntry> {
        self.offers.get(&OfferKey {
            seller: seller.0,
            offer_id,
        })
    }

    pub fn create_offer(&mut self, entry: OfferEntry) {
        let key = OfferKey::from_offer(&entry);
        self.journal_offer(key);
        self.offer_index.add_offer(&entry);
        self.offers.insert(key, entry);
    }

    pub fn update_offer(&mut self, entry: OfferEntry) {
        let key = OfferKey::from_offer(&entry);
        self.journal_offer(key);
        self.offer_index.update_offer(&entry);
        self.offers.insert(key, entry);
    }

    pub fn delete_offer(&mut self, seller: &AccountId, offer_id: i64) {
        let key = OfferKey {
            seller: seller.0,
            offer_id,
        };
        if self.offers.contains_key(&key) {
            self.journal_offer(key);
            self.offer_index.remove_by_key(&key);
            self.offers.remove(&key);
        }
    }

    /// Best-priced offer selling `selling` in exchange for `buying`.
    pub fn best_offer(&self, selling: &Asset, buying: &Asset) -> Option<OfferEntry> {
        self.offer_index
            .best_offer_key(selling, buying)
            .and_then(|key| self.offers.get(&key))
            .cloned()
    }

    // ---- iteration (invariant checks, tests) ----

    pub fn accounts(&self) -> impl Iterator<Item = &AccountEntry> {
        self.accounts.values()
    }

    pub fn trustlines(&self) -> impl Iterator<Item = &TrustLineEntry> {
        self.trustlines.values()
    }

    pub fn offers(&self) -> impl Iterator<Item = &OfferEntry> {
        self.offers.values()
    }

    // ---- savepoints ----

    pub fn savepoint(&self) -> Savepoint {
        Savepoint {
            journal_len: self.journal.len(),
        }
    }

    /// Undo every mutation recorded after `savepoint`.
    pub fn rollback_to(&mut self, savepoint: Savepoint) {
        while self.journal.len() > savepoint.journal_len {
            let Some(record) = self.journal.pop() else {
                break;
            };
            match record {
                UndoRecord::Account(key, previous) => match previous {
                    Some(entry) => {
                        self.accounts.insert(key, entry);
                    }
                    None => {
                        self.accounts.remove(&key);
                    }
                },
                UndoRecord::TrustLine(key, previous) => match previous {
                    Some(entry) => {
                        self.trustlines.insert(key, entry);
                    }
                    None => {
                        self.trustlines.remove(&key);
                    }
                },
                UndoRecord::Offer(key, previous) => match previous {
                    Some(entry) => {
                        self.offer_index.update_offer(&entry);
                        self.offers.insert(key, entry);
                    }
                    None => {
                        self.offer_index.remove_by_key(&key);
                        self.offers.remove(&key);
                    }
                },
            }
        }
    }

    /// Derive the write-set accumulated since `savepoint`.
    ///
    /// Each entry appears at most once, keyed by its first touch: the
    /// pre-image from the journal against the entry's current value
    /// decides whether it was created, updated, or deleted. Entries
    /// touched but left equal (e.g. created then deleted inside the
    /// window) produce no change.
    pub fn delta_since(&self, savepoint: Savepoint) -> LedgerDelta {
        let mut delta = LedgerDelta::default();
        let mut seen_accounts: HashSet<[u8; 32]> = HashSet::new();
        let mut seen_trustlines: HashSet<TrustLineKey> = HashSet::new();
        let mut seen_offers: HashSet<OfferKey> = HashSet::new();

        let start = savepoint.journal_len.min(self.journal.len());
        for record in &self.journal[start..] {
            match record {
                UndoRecord::Account(key, previous) => {
                    if !seen_accounts.insert(*key) {
                        continue;
                    }
                    record_change(
                        &mut delta,
                        previous.as_ref(),
                        self.accounts.get(key),
                        LedgerEntry::Account,
                        |entry| LedgerKey::Account(entry.account_id),
                    );
                }
                UndoRecord::TrustLine(key, previous) => {
                    if !seen_trustlines.insert(*key) {
                        continue;
                    }
                    record_change(
                        &mut delta,
                        previous.as_ref(),
                        self.trustlines.get(key),
                        LedgerEntry::TrustLine,
                        |entry| LedgerKey::TrustLine(entry.account_id, entry.asset),
                    );
                }
                UndoRecord::Offer(key, previous) => {
                    if !seen_offers.insert(*key) {
                        continue;
                    }
                    record_change(
                        &mut delta,
                        previous.as_ref(),
                        self.offers.get(key),
                        LedgerEntry::Offer,
                        |entry| LedgerKey::Offer(entry.seller_id, entry.offer_id),
                    );
                }
            }
        }
        delta
    }

    // ---- journal internals ----

    fn journal_account(&mut self, key: [u8; 32]) {
        let previous = self.accounts.get(&key).cloned();
        self.journal.push(UndoRecord::Account(key, previous));
    }

    fn journal_trustline(&mut self, key: TrustLineKey) {
        let previous = self.trustlines.get(&key).cloned();
        self.journal.push(UndoRecord::TrustLine(key, previous));
    }

    fn journal_offer(&mut self, key: OfferKey) {
        let previous = self.offers.get(&key).cloned();
        self.journal.push(UndoRecord::Offer(key, previous));
    }
}

/// Classify one entry's first-touch pre-image against its current value.
fn record_change<T: Clone + PartialEq>(
    delta: &mut LedgerDelta,
    previous: Option<&T>,
    current: Option<&T>,
    wrap: impl Fn(T) -> LedgerEntry,
    key_of: impl Fn(&T) -> LedgerKey,
) {
    match (previous, current) {
        (None, Some(current)) => delta.record(LedgerEntryChange::Created {
            current: wrap(current.clone()),
        }),
        (Some(previous), None) => delta.record(LedgerEntryChange::Deleted {
            key: key_of(previous),
            previous: wrap(previous.clone()),
        }),
        (Some(previous), Some(current)) if previous != current => {
            delta.record(LedgerEntryChange::Updated {
                previous: wrap(previous.clone()),
                current: wrap(current.clone()),
            })
        }
        _ => {}
    }
}
