use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountKind, Engine, ExpenseCmd, ForecastCmd, IncomeCmd, NewAccountCmd, Recurrence,
    TransferCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, role) VALUES (?, ?, ?)",
        vec!["alice".into(), "password".into(), "user".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn account(engine: &Engine, name: &str, balance: i64) -> Uuid {
    engine
        .new_account(
            NewAccountCmd::new("alice", name, AccountKind::Checking, date(2025, 1, 1))
                .opening_balance_minor(balance),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn forecast_projects_recurring_templates() {
    let (engine, _db) = engine_with_db().await;
    let account_id = account(&engine, "Checking", 100_000).await;

    // One monthly expense of 50 on the 15th; the estimate baseline is
    // disabled, so the series is flat apart from that single drop.
    engine
        .expense(
            ExpenseCmd::new("alice", account_id, 5_000, date(2025, 1, 15))
                .category("rent")
                .recurrence(Recurrence::monthly(15)),
        )
        .await
        .unwrap();

    let points = engine
        .forecast(
            ForecastCmd::new("alice", date(2025, 3, 1), 30).include_estimate(false),
        )
        .await
        .unwrap();

    assert_eq!(points.len(), 30);
    // Opening 100_000 minus the already-applied 5_000 template effect.
    let starting = 95_000;
    for point in &points {
        if point.date < date(2025, 3, 15) {
            assert_eq!(point.balance_minor, starting);
        } else {
            assert_eq!(point.balance_minor, starting - 5_000);
        }
    }
}

#[tokio::test]
async fn forecast_counts_known_one_time_future_transactions() {
    let (engine, _db) = engine_with_db().await;
    let account_id = account(&engine, "Checking", 50_000).await;

    engine
        .income(IncomeCmd::new("alice", account_id, 30_000, date(2025, 3, 20)).category("salary"))
        .await
        .unwrap();

    let points = engine
        .forecast(
            ForecastCmd::new("alice", date(2025, 3, 10), 15).include_estimate(false),
        )
        .await
        .unwrap();

    let payday = points.iter().find(|p| p.date == date(2025, 3, 20)).unwrap();
    assert_eq!(payday.income_minor, 30_000);
}

#[tokio::test]
async fn forecast_over_both_transfer_ends_nets_to_zero() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "A", 40_000).await;
    let b = account(&engine, "B", 10_000).await;

    engine
        .transfer(
            TransferCmd::new("alice", a, b, 7_500, date(2025, 1, 5))
                .recurrence(Recurrence::monthly(5)),
        )
        .await
        .unwrap();

    // Across both accounts the recurring transfer cancels out.
    let all = engine
        .forecast(
            ForecastCmd::new("alice", date(2025, 3, 1), 30).include_estimate(false),
        )
        .await
        .unwrap();
    let first = all.first().unwrap().balance_minor;
    let last = all.last().unwrap().balance_minor;
    assert_eq!(first, last);

    // Restricted to the source account only, it keeps draining.
    let source_only = engine
        .forecast(
            ForecastCmd::new("alice", date(2025, 3, 1), 30)
                .include_estimate(false)
                .account_ids(vec![a]),
        )
        .await
        .unwrap();
    let drained = source_only.last().unwrap().balance_minor;
    assert!(drained < source_only.first().unwrap().balance_minor);
}

#[tokio::test]
async fn forecast_never_writes_back() {
    let (engine, _db) = engine_with_db().await;
    let account_id = account(&engine, "Checking", 20_000).await;

    engine
        .expense(
            ExpenseCmd::new("alice", account_id, 1_000, date(2025, 1, 10))
                .recurrence(Recurrence::every_days(7)),
        )
        .await
        .unwrap();
    let before = engine.account(account_id).await.unwrap().balance_minor;

    engine
        .forecast(ForecastCmd::new("alice", date(2025, 3, 1), 90))
        .await
        .unwrap();

    let after = engine.account(account_id).await.unwrap().balance_minor;
    assert_eq!(before, after);
}
