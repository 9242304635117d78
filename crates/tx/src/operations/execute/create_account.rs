//! CreateAccount operation execution.

use hayashi_common::types::{AccountEntry, AccountId, AccountType};

use super::add_account_balance;
use crate::operations::CreateAccountOp;
use crate::result::{CreateAccountResult, OperationResult};
use crate::state::LedgerStateManager;
use crate::validation::LedgerContext;
use crate::{Result, TxError};

/// Execute a CreateAccount operation.
///
/// Funds a new account out of the source's balance. The new account must
/// start at or above its own minimum balance, and the source must stay at
/// or above its own after the debit.
pub fn execute_create_account(
    op: &CreateAccountOp,
    source: &AccountId,
    state: &mut LedgerStateManager,
    _context: &LedgerContext,
) -> Result<OperationResult> {
    if op.starting_balance <= 0 {
        return Ok(make_result(CreateAccountResult::Malformed));
    }

    let source_account = state
        .get_account(source)
        .ok_or(TxError::SourceAccountNotFound)?;

    // Operational accounts are infrastructure; only an operational source
    // may create one.
    if op.account_type == AccountType::Operational
        && source_account.account_type != AccountType::Operational
    {
        return Ok(make_result(CreateAccountResult::Underauthorized));
    }

    if state.get_account(&op.destination).is_some() {
        return Ok(make_result(CreateAccountResult::AlreadyExist));
    }

    if op.starting_balance < state.minimum_balance(0) {
        return Ok(make_result(CreateAccountResult::LowReserve));
    }

    let source_account = state
        .get_account(source)
        .ok_or(TxError::SourceAccountNotFound)?;
    let available =
        source_account.balance - state.minimum_balance(source_account.num_sub_entries);
    if available < op.starting_balance {
        return Ok(make_result(CreateAccountResult::Underfunded));
    }

    let source_account = state
        .get_account_mut(source)
        .ok_or(TxError::SourceAccountNotFound)?;
    if !add_account_balance(source_account, -op.starting_balance) {
        return Err(TxError::Internal(
            "source debit failed after available-balance check".to_string(),
        ));
    }

    state.create_account(AccountEntry {
        account_id: op.destination,
        balance: op.starting_balance,
        num_sub_entries: 0,
        flags: 0,
        account_type: op.account_type,
    });

    Ok(make_result(CreateAccountResult::Success))
}

fn make_result(code: CreateAccountResult) -> OperationResult {
    OperationResult::CreateAccount(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_account_id(seed: u8) -> AccountId {
        AccountId([seed; 32])
    }

    fn create_test_account(seed: u8, balance: i64) -> AccountEntry {
        AccountEntry {
            account_id: create_test_account_id(seed),
            balance,
            num_sub_entries: 0,
            flags: 0,
            account_type: AccountType::Client,
        }
    }

    fn setup() -> (LedgerStateManager, LedgerContext) {
        (LedgerStateManager::new(10), LedgerContext::latest(1))
    }

    fn create_op(dest: u8, starting_balance: i64) -> CreateAccountOp {
        CreateAccountOp {
            destination: create_test_account_id(dest),
            starting_balance,
            account_type: AccountType::Client,
        }
    }

    #[test]
    fn test_create_account_success() {
        let (mut state, context) = setup();
        let source = create_test_account_id(1);
        state.create_account(create_test_account(1, 100));

        let result =
            execute_create_account(&create_op(2, 30), &source, &mut state, &context).unwrap();
        assert_eq!(result, make_result(CreateAccountResult::Success));

        assert_eq!(state.get_account(&source).unwrap().balance, 70);
        let dest = state.get_account(&create_test_account_id(2)).unwrap();
        assert_eq!(dest.balance, 30);
        assert_eq!(dest.num_sub_entries, 0);
        assert_eq!(dest.account_type, AccountType::Client);
    }

    #[test]
    fn test_create_account_malformed() {
        let (mut state, context) = setup();
        state.create_account(create_test_account(1, 100));

        let result = execute_create_account(
            &create_op(2, 0),
            &create_test_account_id(1),
            &mut state,
            &context,
        )
        .unwrap();
        assert_eq!(result, make_result(CreateAccountResult::Malformed));
    }

    #[test]
    fn test_create_account_already_exists() {
        let (mut state, context) = setup();
        state.create_account(create_test_account(1, 100));
        state.create_account(create_test_account(2, 50));

        let result = execute_create_account(
            &create_op(2, 30),
            &create_test_account_id(1),
            &mut state,
            &context,
        )
        .unwrap();
        assert_eq!(result, make_result(CreateAccountResult::AlreadyExist));
    }

    #[test]
    fn test_create_account_low_reserve() {
        let (mut state, context) = setup();
        state.create_account(create_test_account(1, 100));

        // minimum balance for an empty account is 20
        let result = execute_create_account(
            &create_op(2, 19),
            &create_test_account_id(1),
            &mut state,
            &context,
        )
        .unwrap();
        assert_eq!(result, make_result(CreateAccountResult::LowReserve));
    }

    #[test]
    fn test_create_account_underfunded() {
        let (mut state, context) = setup();
        // available over the source's own reserve: 45 - 20 = 25
        state.create_account(create_test_account(1, 45));

        let result = execute_create_account(
            &create_op(2, 30),
            &create_test_account_id(1),
            &mut state,
            &context,
        )
        .unwrap();
        assert_eq!(result, make_result(CreateAccountResult::Underfunded));
        assert_eq!(
            state.get_account(&create_test_account_id(1)).unwrap().balance,
            45
        );
    }

    #[test]
    fn test_create_operational_requires_operational_source() {
        let (mut state, context) = setup();
        state.create_account(create_test_account(1, 100));

        let op = CreateAccountOp {
            destination: create_test_account_id(2),
            starting_balance: 30,
            account_type: AccountType::Operational,
        };
        let result =
            execute_create_account(&op, &create_test_account_id(1), &mut state, &context)
                .unwrap();
        assert_eq!(result, make_result(CreateAccountResult::Underauthorized));

        // an operational source may
        let mut operational = create_test_account(3, 100);
        operational.account_type = AccountType::Operational;
        state.create_account(operational);
        let result =
            execute_create_account(&op, &create_test_account_id(3), &mut state, &context)
                .unwrap();
        assert_eq!(result, make_result(CreateAccountResult::Success));
        assert_eq!(
            state
                .get_account(&create_test_account_id(2))
                .unwrap()
                .account_type,
            AccountType::Operational
        );
    }
}
