use chrono::{TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Category, CategoryTotal, Engine, ErrorKind, MoneyCents, Month, MonthlyStatement, NewExpenseCmd,
    SetBudgetCmd, UpdateExpenseCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn amount(raw: &str) -> MoneyCents {
    raw.parse().unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

async fn spend(engine: &Engine, user: &str, raw: &str, category: Category, when: chrono::DateTime<Utc>) {
    engine
        .create_expense(NewExpenseCmd::new(user, amount(raw), category, "spend").date(when))
        .await
        .unwrap();
}

fn breakdown_sum(lines: &[CategoryTotal]) -> MoneyCents {
    MoneyCents::new(lines.iter().map(|line| line.total.cents()).sum())
}

fn assert_breakdown_sums(statement: &MonthlyStatement) {
    assert_eq!(
        breakdown_sum(&statement.category_breakdown),
        statement.total_spent
    );
    assert_eq!(
        statement.remaining.cents(),
        statement.total_budget.cents() - statement.total_spent.cents()
    );
}

#[tokio::test]
async fn statement_reconciles_budget_and_spending() {
    let (engine, _db) = engine_with_db().await;
    engine
        .set_budget(SetBudgetCmd::new("alice", "2024-03", amount("1000.00")))
        .await
        .unwrap();
    spend(&engine, "alice", "250.00", Category::Food, at(2024, 3, 4, 12, 0, 0)).await;
    spend(&engine, "alice", "100.50", Category::Transport, at(2024, 3, 9, 8, 0, 0)).await;

    let statement = engine.statement("alice", "2024-03").await.unwrap();

    assert_eq!(statement.month.to_string(), "2024-03");
    assert_eq!(statement.total_budget, amount("1000.00"));
    assert_eq!(statement.total_spent, amount("350.50"));
    assert_eq!(statement.remaining, amount("649.50"));
    assert!(!statement.is_over_budget());

    assert_eq!(statement.category_breakdown.len(), 2);
    assert_eq!(statement.category_breakdown[0].category, Category::Food);
    assert_eq!(statement.category_breakdown[0].total, amount("250.00"));
    assert_eq!(statement.category_breakdown[0].count, 1);
    assert_eq!(statement.category_breakdown[1].category, Category::Transport);
    assert_eq!(statement.category_breakdown[1].total, amount("100.50"));
    assert_breakdown_sums(&statement);
}

#[tokio::test]
async fn month_boundaries_are_half_open() {
    let (engine, _db) = engine_with_db().await;
    spend(&engine, "alice", "10.00", Category::Food, at(2024, 2, 29, 23, 59, 59)).await;
    spend(&engine, "alice", "20.00", Category::Food, at(2024, 3, 1, 0, 0, 0)).await;
    spend(&engine, "alice", "30.00", Category::Food, at(2024, 3, 31, 23, 59, 59)).await;
    spend(&engine, "alice", "40.00", Category::Food, at(2024, 4, 1, 0, 0, 0)).await;

    let statement = engine.statement("alice", "2024-03").await.unwrap();

    assert_eq!(statement.total_spent, amount("50.00"));
    assert_eq!(statement.category_breakdown[0].count, 2);
}

#[tokio::test]
async fn last_representable_month_is_aggregated() {
    let (engine, _db) = engine_with_db().await;
    engine
        .set_budget(SetBudgetCmd::new("alice", "9999-12", amount("100.00")))
        .await
        .unwrap();
    spend(&engine, "alice", "42.00", Category::Food, at(9999, 12, 15, 12, 0, 0)).await;
    spend(&engine, "alice", "8.00", Category::Food, at(9999, 12, 31, 23, 59, 59)).await;
    spend(&engine, "alice", "1.00", Category::Food, at(9999, 11, 30, 23, 59, 59)).await;

    let statement = engine.statement("alice", "9999-12").await.unwrap();
    assert_eq!(statement.total_spent, amount("50.00"));
    assert_eq!(statement.remaining, amount("50.00"));
    assert_eq!(statement.category_breakdown[0].count, 2);

    let stats = engine
        .expense_stats("alice", Some("9999-12"))
        .await
        .unwrap();
    assert_eq!(stats.total, amount("50.00"));
}

#[tokio::test]
async fn month_without_budget_or_expenses_is_all_zero() {
    let (engine, _db) = engine_with_db().await;

    let statement = engine.statement("alice", "2024-03").await.unwrap();

    assert!(statement.total_budget.is_zero());
    assert!(statement.total_spent.is_zero());
    assert!(statement.remaining.is_zero());
    assert!(statement.category_breakdown.is_empty());
    assert!(!statement.budget.is_persisted());
}

#[tokio::test]
async fn overspending_gives_negative_remaining() {
    let (engine, _db) = engine_with_db().await;
    engine
        .set_budget(SetBudgetCmd::new("alice", "2024-03", amount("100.00")))
        .await
        .unwrap();
    spend(&engine, "alice", "150.25", Category::Shopping, at(2024, 3, 20, 18, 0, 0)).await;

    let statement = engine.statement("alice", "2024-03").await.unwrap();

    assert_eq!(statement.remaining, amount("-50.25"));
    assert!(statement.is_over_budget());
    assert_breakdown_sums(&statement);
}

#[tokio::test]
async fn statement_reflects_every_change_immediately() {
    let (engine, _db) = engine_with_db().await;
    engine
        .set_budget(SetBudgetCmd::new("alice", "2024-03", amount("500.00")))
        .await
        .unwrap();
    let expense = engine
        .create_expense(
            NewExpenseCmd::new("alice", amount("40.00"), Category::Food, "market")
                .date(at(2024, 3, 12, 10, 0, 0)),
        )
        .await
        .unwrap();
    assert_eq!(
        engine.statement("alice", "2024-03").await.unwrap().total_spent,
        amount("40.00")
    );

    engine
        .update_expense(
            UpdateExpenseCmd::new("alice", expense.id)
                .amount(amount("55.00"))
                .category(Category::Entertainment),
        )
        .await
        .unwrap();
    let statement = engine.statement("alice", "2024-03").await.unwrap();
    assert_eq!(statement.total_spent, amount("55.00"));
    assert_eq!(
        statement.category_breakdown[0].category,
        Category::Entertainment
    );

    engine
        .update_expense(UpdateExpenseCmd::new("alice", expense.id).date(at(2024, 4, 2, 10, 0, 0)))
        .await
        .unwrap();
    assert!(
        engine
            .statement("alice", "2024-03")
            .await
            .unwrap()
            .total_spent
            .is_zero()
    );

    engine
        .set_budget(SetBudgetCmd::new("alice", "2024-03", amount("450.00")))
        .await
        .unwrap();
    assert_eq!(
        engine.statement("alice", "2024-03").await.unwrap().remaining,
        amount("450.00")
    );

    engine.delete_expense("alice", expense.id).await.unwrap();
    assert!(
        engine
            .statement("alice", "2024-04")
            .await
            .unwrap()
            .total_spent
            .is_zero()
    );
}

#[tokio::test]
async fn statement_ignores_other_users() {
    let (engine, _db) = engine_with_db().await;
    spend(&engine, "alice", "12.00", Category::Food, at(2024, 3, 3, 9, 0, 0)).await;
    spend(&engine, "bob", "99.00", Category::Food, at(2024, 3, 3, 9, 0, 0)).await;

    let statement = engine.statement("alice", "2024-03").await.unwrap();
    assert_eq!(statement.total_spent, amount("12.00"));
}

#[tokio::test]
async fn statement_lists_allocations() {
    let (engine, _db) = engine_with_db().await;
    engine
        .set_budget(
            SetBudgetCmd::new("alice", "2024-03", amount("1000.00"))
                .allocate(Category::Food, amount("300.00"))
                .allocate(Category::Rent, amount("600.00")),
        )
        .await
        .unwrap();
    spend(&engine, "alice", "80.00", Category::Food, at(2024, 3, 5, 12, 0, 0)).await;
    spend(&engine, "alice", "20.00", Category::Transport, at(2024, 3, 6, 12, 0, 0)).await;

    let statement = engine.statement("alice", "2024-03").await.unwrap();
    let line = |category: Category| {
        statement
            .category_breakdown
            .iter()
            .find(|line| line.category == category)
            .unwrap()
    };

    assert_eq!(statement.category_breakdown.len(), 3);
    assert_eq!(line(Category::Food).allocated, Some(amount("300.00")));
    assert_eq!(line(Category::Rent).total, MoneyCents::ZERO);
    assert_eq!(line(Category::Rent).count, 0);
    assert_eq!(line(Category::Transport).allocated, None);
    assert_eq!(statement.category_breakdown[0].category, Category::Food);
    assert_breakdown_sums(&statement);
}

#[tokio::test]
async fn statement_rejects_invalid_month() {
    let (engine, _db) = engine_with_db().await;
    let err = engine.statement("alice", "2024-3").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn current_statement_uses_current_month() {
    let (engine, _db) = engine_with_db().await;
    let month = Month::current();
    engine
        .set_budget(SetBudgetCmd::new("alice", month.to_string(), amount("200.00")))
        .await
        .unwrap();
    spend(&engine, "alice", "5.00", Category::Other, month.start()).await;

    let statement = engine.current_statement("alice").await.unwrap();

    assert_eq!(statement.month, month);
    assert_eq!(statement.remaining, amount("195.00"));
}

#[tokio::test]
async fn stats_cover_one_month_or_everything() {
    let (engine, _db) = engine_with_db().await;
    spend(&engine, "alice", "10.00", Category::Food, at(2024, 2, 10, 12, 0, 0)).await;
    spend(&engine, "alice", "15.00", Category::Food, at(2024, 3, 10, 12, 0, 0)).await;
    spend(&engine, "alice", "7.50", Category::Healthcare, at(2024, 3, 11, 12, 0, 0)).await;

    let march = engine
        .expense_stats("alice", Some("2024-03"))
        .await
        .unwrap();
    assert_eq!(march.month, Some("2024-03".parse().unwrap()));
    assert_eq!(march.total, amount("22.50"));
    assert_eq!(march.category_breakdown.len(), 2);

    let all = engine.expense_stats("alice", None).await.unwrap();
    assert_eq!(all.month, None);
    assert_eq!(all.total, amount("32.50"));
    assert_eq!(all.category_breakdown[0].category, Category::Food);
    assert_eq!(all.category_breakdown[0].count, 2);
    assert_eq!(breakdown_sum(&all.category_breakdown), all.total);

    let err = engine
        .expense_stats("alice", Some("2024-00"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
