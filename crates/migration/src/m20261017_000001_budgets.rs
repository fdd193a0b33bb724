//! Budgets and their per-category allocations.
//!
//! - `budgets`: one row per `(user_id, month)`, enforced by a unique index
//! - `budget_allocations`: optional split of a budget by category

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    UserId,
    Month,
    TotalBudgetMinor,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BudgetAllocations {
    Table,
    Id,
    BudgetId,
    Category,
    AmountMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Budgets::UserId).string().not_null())
                    .col(ColumnDef::new(Budgets::Month).string_len(7).not_null())
                    .col(
                        ColumnDef::new(Budgets::TotalBudgetMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Budgets::TotalBudgetMinor).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Budgets::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Budgets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Budgets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Backstop for concurrent `set_budget` calls on the same month.
        manager
            .create_index(
                Index::create()
                    .name("uidx-budgets-user_id-month")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .col(Budgets::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BudgetAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetAllocations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetAllocations::BudgetId).uuid().not_null())
                    .col(ColumnDef::new(BudgetAllocations::Category).string().not_null())
                    .col(
                        ColumnDef::new(BudgetAllocations::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(BudgetAllocations::AmountMinor).gte(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_allocations-budget_id")
                            .from(BudgetAllocations::Table, BudgetAllocations::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-budget_allocations-budget_id-category")
                    .table(BudgetAllocations::Table)
                    .col(BudgetAllocations::BudgetId)
                    .col(BudgetAllocations::Category)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BudgetAllocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        Ok(())
    }
}
