//! Property tests: structural invariants of the apply engine.
//!
//! Random operation sequences run against a small ledger universe. After
//! every apply — success or failure — the shipped invariants must hold,
//! and any failed apply must leave the state byte-identical to what it
//! was before.

use proptest::prelude::*;

use hayashi_common::asset::{str_to_asset_code, Asset};
use hayashi_common::types::{
    AccountEntry, AccountId, AccountType, OfferEntry, Price, TrustLineEntry, AUTHORIZED_FLAG,
};
use hayashi_invariant::{InvariantContext, InvariantManager};
use hayashi_tx::operations::{
    ChangeTrustOp, CreateAccountOp, Operation, OperationBody, PathPaymentOp, PaymentOp,
};
use hayashi_tx::{apply_operation, LedgerContext, LedgerStateManager};

const USD_ISSUER: u8 = 5;
const EUR_ISSUER: u8 = 6;

fn account_id(seed: u8) -> AccountId {
    AccountId([seed; 32])
}

fn usd() -> Asset {
    Asset::alphanum4(str_to_asset_code("USD"), account_id(USD_ISSUER))
}

fn eur() -> Asset {
    Asset::alphanum4(str_to_asset_code("EUR"), account_id(EUR_ISSUER))
}

/// Initial ledger: actors 1-4 hold both credit assets, issuers 5 and 6
/// exist, and three offers give the books a native/USD/EUR cycle.
fn build_state(
    balances: [i64; 6],
    lines: [[(i64, i64); 2]; 4],
    offers: [(i64, (i32, i32)); 3],
) -> LedgerStateManager {
    let mut state = LedgerStateManager::new(10);

    for (index, balance) in balances.into_iter().enumerate() {
        let seed = index as u8 + 1;
        let subentries = match seed {
            1 => 2,
            2 | 3 | 4 => 3,
            _ => 0,
        };
        state.create_account(AccountEntry {
            account_id: account_id(seed),
            balance,
            num_sub_entries: subentries,
            flags: 0,
            account_type: AccountType::Client,
        });
    }

    for (index, line_pair) in lines.into_iter().enumerate() {
        let seed = index as u8 + 1;
        for (asset, (balance, limit)) in [usd(), eur()].into_iter().zip(line_pair) {
            state.create_trustline(TrustLineEntry {
                account_id: account_id(seed),
                asset,
                balance,
                limit,
                flags: AUTHORIZED_FLAG,
            });
        }
    }

    let shapes = [
        (2u8, Asset::Native, eur()),
        (3u8, usd(), Asset::Native),
        (4u8, eur(), usd()),
    ];
    for (offer_id, ((seller, selling, buying), (amount, (n, d)))) in
        shapes.into_iter().zip(offers).enumerate()
    {
        state.create_offer(OfferEntry {
            seller_id: account_id(seller),
            offer_id: offer_id as i64 + 1,
            selling,
            buying,
            amount,
            price: Price::new(n, d),
        });
    }

    state
}

fn asset_strategy() -> impl Strategy<Value = Asset> {
    prop_oneof![Just(Asset::Native), Just(usd()), Just(eur())]
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    let source = 1u8..=6;
    // destination 7 does not exist initially; payments there exercise the
    // implicit account creation
    let destination = 1u8..=7;
    prop_oneof![
        (source.clone(), destination.clone(), asset_strategy(), 0i64..2_000).prop_map(
            |(source, dest, asset, amount)| with_source(
                source,
                OperationBody::Payment(PaymentOp {
                    destination: account_id(dest),
                    asset,
                    amount,
                })
            )
        ),
        (source.clone(), asset_strategy(), 0i64..2_000).prop_map(|(source, line, limit)| {
            with_source(source, OperationBody::ChangeTrust(ChangeTrustOp { line, limit }))
        }),
        (
            source.clone(),
            destination,
            asset_strategy(),
            asset_strategy(),
            0i64..2_000,
            0i64..2_000,
            prop::collection::vec(asset_strategy(), 0..3),
        )
            .prop_map(
                |(source, dest, send_asset, dest_asset, dest_amount, send_max, path)| {
                    with_source(
                        source,
                        OperationBody::PathPayment(PathPaymentOp {
                            send_asset,
                            send_max,
                            destination: account_id(dest),
                            dest_asset,
                            dest_amount,
                            path,
                        }),
                    )
                }
            ),
        (source, 1u8..=8, 0i64..200).prop_map(|(source, dest, starting_balance)| {
            with_source(
                source,
                OperationBody::CreateAccount(CreateAccountOp {
                    destination: account_id(dest),
                    starting_balance,
                    account_type: AccountType::Client,
                }),
            )
        }),
    ]
}

fn with_source(seed: u8, body: OperationBody) -> Operation {
    Operation {
        source_account: Some(account_id(seed)),
        body,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_invariants_hold_and_failures_roll_back(
        balances in proptest::array::uniform6(100i64..10_000),
        lines in proptest::array::uniform4(proptest::array::uniform2((0i64..500, 500i64..2_000))),
        offers in proptest::array::uniform3((1i64..400, (1i32..=4, 1i32..=4))),
        ops in prop::collection::vec(operation_strategy(), 1..25),
    ) {
        let mut state = build_state(balances, lines, offers);
        let expected_native_total: i64 = state.accounts().map(|a| a.balance).sum();
        let context = LedgerContext::latest(1);
        let manager = InvariantManager::all();

        for op in &ops {
            let before = state.clone();
            let result = apply_operation(op, &account_id(1), &mut state, &context);

            let succeeded = matches!(&result, Ok(outcome) if outcome.is_success());
            if !succeeded {
                prop_assert_eq!(&state, &before, "failed apply must not change state: {:?}", op);
            }

            let ctx = InvariantContext {
                state: &state,
                protocol_version: context.protocol_version,
                expected_native_total,
            };
            if let Err(violation) = manager.check_all(&ctx) {
                prop_assert!(false, "{} after {:?}", violation, op);
            }
        }
    }

    #[test]
    fn prop_successful_path_payment_moves_exact_amounts(
        balances in proptest::array::uniform6(1_000i64..10_000),
        lines in proptest::array::uniform4(proptest::array::uniform2((100i64..500, 500i64..2_000))),
        offers in proptest::array::uniform3((50i64..400, (1i32..=3, 1i32..=3))),
        dest_amount in 1i64..200,
        send_max in 1i64..2_000,
    ) {
        let mut state = build_state(balances, lines, offers);
        let context = LedgerContext::latest(1);

        let op = Operation::new(OperationBody::PathPayment(PathPaymentOp {
            send_asset: Asset::Native,
            send_max,
            destination: account_id(2),
            dest_asset: usd(),
            dest_amount,
            path: vec![],
        }));

        let dest_before = state.get_trustline(&account_id(2), &usd()).unwrap().balance;
        let source_before = state.get_account(&account_id(1)).unwrap().balance;

        let result = apply_operation(&op, &account_id(1), &mut state, &context).unwrap();

        if let hayashi_tx::OperationResult::PathPayment(
            hayashi_tx::PathPaymentResult::Success(success),
        ) = result
        {
            // the destination got exactly what was asked for
            let dest_after = state.get_trustline(&account_id(2), &usd()).unwrap().balance;
            prop_assert_eq!(dest_after - dest_before, dest_amount);
            prop_assert_eq!(success.last.amount, dest_amount);

            // the source paid no more than the cap
            let source_after = state.get_account(&account_id(1)).unwrap().balance;
            let spent = source_before - source_after;
            prop_assert!(spent <= send_max, "spent {} over cap {}", spent, send_max);
        }
    }
}
