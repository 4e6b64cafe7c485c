use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountKind, Engine, EngineError, ExpenseCmd, FamilyRole, IncomeCmd, NewAccountCmd,
    RecurrencePatch, Recurrence, TransactionKind, TransactionListFilter, TransferCmd,
    UpdateTransactionCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, role) VALUES (?, ?, ?)",
            vec![username.into(), "password".into(), "user".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn checking_account(engine: &Engine, user: &str, name: &str, balance: i64) -> Uuid {
    engine
        .new_account(
            NewAccountCmd::new(user, name, AccountKind::Checking, date(2025, 1, 1))
                .opening_balance_minor(balance),
        )
        .await
        .unwrap()
}

async fn balance_of(engine: &Engine, account_id: Uuid) -> i64 {
    engine.account(account_id).await.unwrap().balance_minor
}

#[tokio::test]
async fn opening_balance_is_recorded_as_a_ledger_entry() {
    let (engine, _db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 10_000).await;

    assert_eq!(balance_of(&engine, account_id).await, 10_000);

    // The balance is backed by an actual opening transaction, not a raw
    // balance write.
    let txs = engine
        .list_transactions_for_user("alice", 10, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].kind, TransactionKind::Income);
    assert_eq!(txs[0].amount_minor, 10_000);
    assert_eq!(txs[0].category.as_deref(), Some("opening"));
}

#[tokio::test]
async fn income_and_expense_move_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 0).await;

    engine
        .income(IncomeCmd::new("alice", account_id, 1_000, date(2025, 2, 1)).category("salary"))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 1_000);

    engine
        .expense(ExpenseCmd::new("alice", account_id, 200, date(2025, 2, 2)).category("food"))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 800);
}

#[tokio::test]
async fn create_then_delete_restores_balances_exactly() {
    let (engine, _db) = engine_with_db().await;
    let a = checking_account(&engine, "alice", "A", 10_000).await;
    let b = checking_account(&engine, "alice", "B", 5_000).await;

    // Scenario: A=100, B=50; transfer 20 from A to B; delete restores both.
    let transfer_id = engine
        .transfer(TransferCmd::new("alice", a, b, 2_000, date(2025, 2, 1)))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, a).await, 8_000);
    assert_eq!(balance_of(&engine, b).await, 7_000);

    engine.delete_transaction(transfer_id).await.unwrap();
    assert_eq!(balance_of(&engine, a).await, 10_000);
    assert_eq!(balance_of(&engine, b).await, 5_000);
}

#[tokio::test]
async fn updating_the_kind_undoes_and_reapplies() {
    let (engine, _db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 10_000).await;

    // A=100; expense of 30 brings it to 70.
    let tx_id = engine
        .expense(ExpenseCmd::new("alice", account_id, 3_000, date(2025, 2, 1)))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 7_000);

    // Flipping the same transaction to income must first undo the -30 and
    // then apply +30: 70 -> 100 -> 130.
    engine
        .update_transaction(UpdateTransactionCmd::new(tx_id).kind(TransactionKind::Income))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 13_000);
}

#[tokio::test]
async fn update_matches_delete_then_recreate() {
    let (engine, _db) = engine_with_db().await;
    let a = checking_account(&engine, "alice", "A", 10_000).await;
    let b = checking_account(&engine, "alice", "B", 10_000).await;

    let tx_id = engine
        .expense(ExpenseCmd::new("alice", a, 1_500, date(2025, 2, 1)))
        .await
        .unwrap();

    // Path 1: patch amount and move the expense from A to B.
    engine
        .update_transaction(
            UpdateTransactionCmd::new(tx_id)
                .amount_minor(2_500)
                .account_id(b),
        )
        .await
        .unwrap();
    let updated = (balance_of(&engine, a).await, balance_of(&engine, b).await);

    // Path 2: same edit expressed as delete + create.
    engine.delete_transaction(tx_id).await.unwrap();
    engine
        .expense(ExpenseCmd::new("alice", b, 2_500, date(2025, 2, 1)))
        .await
        .unwrap();
    let recreated = (balance_of(&engine, a).await, balance_of(&engine, b).await);

    assert_eq!(updated, recreated);
    assert_eq!(updated, (10_000, 7_500));
}

#[tokio::test]
async fn update_can_turn_an_expense_into_a_transfer() {
    let (engine, _db) = engine_with_db().await;
    let a = checking_account(&engine, "alice", "A", 10_000).await;
    let b = checking_account(&engine, "alice", "B", 0).await;

    let tx_id = engine
        .expense(ExpenseCmd::new("alice", a, 2_000, date(2025, 2, 1)))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, a).await, 8_000);

    // Becoming a transfer requires a destination.
    let missing_dest = engine
        .update_transaction(UpdateTransactionCmd::new(tx_id).kind(TransactionKind::Transfer))
        .await;
    assert!(matches!(missing_dest, Err(EngineError::InvalidTransfer(_))));
    // Failed updates leave balances untouched.
    assert_eq!(balance_of(&engine, a).await, 8_000);
    assert_eq!(balance_of(&engine, b).await, 0);

    engine
        .update_transaction(
            UpdateTransactionCmd::new(tx_id)
                .kind(TransactionKind::Transfer)
                .dest_account_id(b),
        )
        .await
        .unwrap();
    // Source side is unchanged (-20 either way); destination gains the 20.
    assert_eq!(balance_of(&engine, a).await, 8_000);
    assert_eq!(balance_of(&engine, b).await, 2_000);
}

#[tokio::test]
async fn update_retargets_a_transfer_between_accounts() {
    let (engine, _db) = engine_with_db().await;
    let a = checking_account(&engine, "alice", "A", 10_000).await;
    let b = checking_account(&engine, "alice", "B", 0).await;
    let c = checking_account(&engine, "alice", "C", 0).await;

    let tx_id = engine
        .transfer(TransferCmd::new("alice", a, b, 3_000, date(2025, 2, 1)))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, b).await, 3_000);

    engine
        .update_transaction(UpdateTransactionCmd::new(tx_id).dest_account_id(c))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, a).await, 7_000);
    assert_eq!(balance_of(&engine, b).await, 0);
    assert_eq!(balance_of(&engine, c).await, 3_000);
}

#[tokio::test]
async fn the_engine_permits_overdrafts() {
    let (engine, _db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 1_000).await;

    // Sufficient-funds enforcement is the API layer's policy, not a ledger
    // invariant: corrective entries may legitimately overdraw.
    engine
        .expense(ExpenseCmd::new("alice", account_id, 5_000, date(2025, 2, 1)))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, account_id).await, -4_000);
}

#[tokio::test]
async fn transfer_to_missing_account_mutates_nothing() {
    let (engine, _db) = engine_with_db().await;
    let a = checking_account(&engine, "alice", "A", 10_000).await;

    let result = engine
        .transfer(TransferCmd::new(
            "alice",
            a,
            Uuid::new_v4(),
            2_000,
            date(2025, 2, 1),
        ))
        .await;
    assert!(matches!(result, Err(EngineError::KeyNotFound(_))));
    assert_eq!(balance_of(&engine, a).await, 10_000);
}

#[tokio::test]
async fn deleting_a_referenced_account_is_a_conflict() {
    let (engine, _db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 1_000).await;

    let result = engine.delete_account(account_id).await;
    assert!(matches!(result, Err(EngineError::Conflict(_))));

    // Removing the history unblocks the deletion.
    let txs = engine
        .list_transactions_for_user("alice", 10, &TransactionListFilter::default())
        .await
        .unwrap();
    for tx in txs {
        engine.delete_transaction(tx.id).await.unwrap();
    }
    engine.delete_account(account_id).await.unwrap();
}

#[tokio::test]
async fn recompute_balances_repairs_a_corrupted_balance() {
    let (engine, db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 10_000).await;
    engine
        .expense(ExpenseCmd::new("alice", account_id, 2_500, date(2025, 2, 1)))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 7_500);

    // A consistent ledger recomputes to the same value.
    engine.recompute_balances("alice").await.unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 7_500);

    // Corrupt the denormalized balance behind the engine's back.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE accounts SET balance_minor = 0 WHERE id = ?",
        vec![account_id.to_string().into()],
    ))
    .await
    .unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 0);

    engine.recompute_balances("alice").await.unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 7_500);
}

#[tokio::test]
async fn family_listing_is_the_union_of_member_transactions() {
    let (engine, _db) = engine_with_db().await;
    let alice_account = checking_account(&engine, "alice", "Checking", 0).await;
    let bob_account = checking_account(&engine, "bob", "Checking", 0).await;

    engine
        .income(IncomeCmd::new("alice", alice_account, 100, date(2025, 1, 10)))
        .await
        .unwrap();
    engine
        .income(IncomeCmd::new("bob", bob_account, 200, date(2025, 1, 20)))
        .await
        .unwrap();

    let family_id = engine.new_family("Smiths", "alice").await.unwrap();
    engine
        .upsert_family_member(family_id, "bob", FamilyRole::Editor)
        .await
        .unwrap();

    let (txs, _next) = engine
        .list_transactions_for_family_page(family_id, 10, None, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 2);
    // Newest first.
    assert_eq!(txs[0].occurred_on, date(2025, 1, 20));
    assert_eq!(txs[0].user_id, "bob");
    assert_eq!(txs[1].user_id, "alice");
}

#[tokio::test]
async fn cursor_pagination_pages_without_overlap() {
    let (engine, _db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 0).await;

    for day in 1..=7 {
        engine
            .income(IncomeCmd::new("alice", account_id, 100, date(2025, 3, day)))
            .await
            .unwrap();
    }

    let filter = TransactionListFilter::default();
    let mut seen: Vec<Uuid> = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let (page, next) = engine
            .list_transactions_for_user_page("alice", 3, cursor.as_deref(), &filter)
            .await
            .unwrap();
        for tx in &page {
            assert!(!seen.contains(&tx.id), "page overlap");
            seen.push(tx.id);
        }
        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    assert_eq!(seen.len(), 7);
}

#[tokio::test]
async fn recurring_templates_expand_without_materializing_rows() {
    let (engine, _db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 0).await;

    let tx_id = engine
        .expense(
            ExpenseCmd::new("alice", account_id, 700, date(2025, 1, 31))
                .category("rent")
                .recurrence(Recurrence::monthly(31)),
        )
        .await
        .unwrap();

    let dates = engine
        .occurrences(tx_id, date(2025, 1, 1), date(2025, 5, 31))
        .await
        .unwrap();
    // The 31st skips short months: no February or April occurrence.
    assert_eq!(
        dates,
        vec![date(2025, 1, 31), date(2025, 3, 31), date(2025, 5, 31)]
    );

    // Only the template row exists.
    let txs = engine
        .list_transactions_for_user("alice", 50, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);

    // One-time transactions have no occurrences to expand.
    let one_time = engine
        .income(IncomeCmd::new("alice", account_id, 100, date(2025, 1, 1)))
        .await
        .unwrap();
    let result = engine
        .occurrences(one_time, date(2025, 1, 1), date(2025, 2, 1))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidRecurrence(_))));
}

#[tokio::test]
async fn clearing_a_recurrence_keeps_balances_intact() {
    let (engine, _db) = engine_with_db().await;
    let account_id = checking_account(&engine, "alice", "Checking", 10_000).await;

    let tx_id = engine
        .expense(
            ExpenseCmd::new("alice", account_id, 700, date(2025, 1, 15))
                .recurrence(Recurrence::monthly(15)),
        )
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, account_id).await, 9_300);

    engine
        .update_transaction(UpdateTransactionCmd::new(tx_id).recurrence(RecurrencePatch::Clear))
        .await
        .unwrap();

    // The template flag changed, the single applied effect did not.
    assert_eq!(balance_of(&engine, account_id).await, 9_300);
    let tx = engine.transaction(tx_id).await.unwrap();
    assert!(tx.recurrence.is_none());
}

#[tokio::test]
async fn statistics_exclude_transfers() {
    let (engine, _db) = engine_with_db().await;
    let a = checking_account(&engine, "alice", "A", 0).await;
    let b = checking_account(&engine, "alice", "B", 0).await;

    engine
        .income(IncomeCmd::new("alice", a, 5_000, date(2025, 2, 1)))
        .await
        .unwrap();
    engine
        .expense(ExpenseCmd::new("alice", a, 1_000, date(2025, 2, 2)))
        .await
        .unwrap();
    engine
        .transfer(TransferCmd::new("alice", a, b, 2_000, date(2025, 2, 3)))
        .await
        .unwrap();

    let stats = engine.user_statistics("alice").await.unwrap();
    assert_eq!(stats.balance_minor, 4_000);
    assert_eq!(stats.total_income_minor, 5_000);
    assert_eq!(stats.total_expense_minor, 1_000);
}
