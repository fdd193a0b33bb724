use sea_orm::{
    DatabaseTransaction, FromQueryResult, QueryFilter, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    Budget, Category, CategoryTotal, EngineError, ExpenseStats, MoneyCents, Month,
    MonthlyStatement, ResultEngine, expenses,
};

use super::{Engine, budgets::find_budget, with_tx, within_month};

/// One row of the `GROUP BY category` query.
#[derive(Debug, FromQueryResult)]
struct CategoryTotalRow {
    category: String,
    total: i64,
    count: i64,
}

impl Engine {
    /// Spending vs. budget for `month`, recomputed from the stored expenses.
    ///
    /// A month without a budget is reported against [`Budget::unset`].
    pub async fn statement(&self, user_id: &str, month: &str) -> ResultEngine<MonthlyStatement> {
        let month: Month = month.parse()?;
        self.statement_for(user_id, month).await
    }

    /// Statement of the current UTC month.
    pub async fn current_statement(&self, user_id: &str) -> ResultEngine<MonthlyStatement> {
        self.statement_for(user_id, Month::current()).await
    }

    /// Category totals for one month, or for every expense when `month` is
    /// `None`.
    pub async fn expense_stats(
        &self,
        user_id: &str,
        month: Option<&str>,
    ) -> ResultEngine<ExpenseStats> {
        let month = month.map(str::parse::<Month>).transpose()?;
        with_tx!(self, |db_tx| {
            let rows = category_totals(&db_tx, user_id, month).await?;
            let category_breakdown = build_breakdown(rows, None)?;
            let total = grand_total(&category_breakdown)?;
            Ok(ExpenseStats {
                month,
                total,
                category_breakdown,
            })
        })
    }

    async fn statement_for(&self, user_id: &str, month: Month) -> ResultEngine<MonthlyStatement> {
        with_tx!(self, |db_tx| {
            let budget = find_budget(&db_tx, user_id, month)
                .await?
                .unwrap_or_else(|| Budget::unset(user_id, month));
            let rows = category_totals(&db_tx, user_id, Some(month)).await?;
            let category_breakdown = build_breakdown(rows, Some(&budget))?;
            let total_spent = grand_total(&category_breakdown)?;
            let remaining = budget
                .total_budget
                .checked_sub(total_spent)
                .ok_or_else(|| EngineError::InvalidAmount("remaining overflows".to_string()))?;

            Ok(MonthlyStatement {
                month,
                total_budget: budget.total_budget,
                total_spent,
                remaining,
                category_breakdown,
                budget,
            })
        })
    }
}

/// Sum and count the caller's expenses per category inside `month`, or over
/// all of them.
async fn category_totals(
    db_tx: &DatabaseTransaction,
    user_id: &str,
    month: Option<Month>,
) -> ResultEngine<Vec<CategoryTotalRow>> {
    let mut query = expenses::Entity::find()
        .select_only()
        .column(expenses::Column::Category)
        .column_as(expenses::Column::AmountMinor.sum(), "total")
        .column_as(expenses::Column::Id.count(), "count")
        .filter(expenses::Column::UserId.eq(user_id));
    if let Some(month) = month {
        query = query.filter(within_month(expenses::Column::Date, month));
    }

    query
        .group_by(expenses::Column::Category)
        .into_model::<CategoryTotalRow>()
        .all(db_tx)
        .await
        .map_err(Into::into)
}

/// Turn grouped rows into breakdown lines, largest total first.
///
/// With a budget, every allocated category gets a line even when nothing was
/// spent on it.
fn build_breakdown(
    rows: Vec<CategoryTotalRow>,
    budget: Option<&Budget>,
) -> ResultEngine<Vec<CategoryTotal>> {
    let mut breakdown = rows
        .into_iter()
        .map(|row| {
            let category = Category::try_from(row.category.as_str())?;
            let count = u64::try_from(row.count)
                .map_err(|_| EngineError::InvalidAmount("negative expense count".to_string()))?;
            Ok(CategoryTotal {
                category,
                total: MoneyCents::new(row.total),
                count,
                allocated: budget.and_then(|budget| budget.allocation_for(category)),
            })
        })
        .collect::<ResultEngine<Vec<_>>>()?;

    if let Some(budget) = budget {
        for allocation in &budget.allocations {
            if breakdown
                .iter()
                .all(|line| line.category != allocation.category)
            {
                breakdown.push(CategoryTotal {
                    category: allocation.category,
                    total: MoneyCents::ZERO,
                    count: 0,
                    allocated: Some(allocation.amount),
                });
            }
        }
    }

    breakdown.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));
    Ok(breakdown)
}

/// Grand total as the sum of the breakdown lines, so both always agree.
fn grand_total(breakdown: &[CategoryTotal]) -> ResultEngine<MoneyCents> {
    breakdown
        .iter()
        .try_fold(MoneyCents::ZERO, |acc, line| acc.checked_add(line.total))
        .ok_or_else(|| EngineError::InvalidAmount("total spent overflows".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CategoryAllocation;

    fn row(category: &str, total: i64, count: i64) -> CategoryTotalRow {
        CategoryTotalRow {
            category: category.to_string(),
            total,
            count,
        }
    }

    #[test]
    fn breakdown_is_sorted_by_total_and_sums_to_grand_total() {
        let breakdown = build_breakdown(
            vec![row("Transport", 10_050, 1), row("Food", 25_000, 2)],
            None,
        )
        .unwrap();

        assert_eq!(breakdown[0].category, Category::Food);
        assert_eq!(breakdown[1].category, Category::Transport);
        assert_eq!(grand_total(&breakdown).unwrap(), MoneyCents::new(35_050));
    }

    #[test]
    fn allocated_categories_without_spending_get_a_zero_line() {
        let mut budget = Budget::unset("alice", "2024-03".parse().unwrap());
        budget.allocations = vec![
            CategoryAllocation {
                category: Category::Food,
                amount: MoneyCents::new(40_000),
            },
            CategoryAllocation {
                category: Category::Rent,
                amount: MoneyCents::new(50_000),
            },
        ];

        let breakdown = build_breakdown(vec![row("Food", 25_000, 2)], Some(&budget)).unwrap();

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].allocated, Some(MoneyCents::new(40_000)));
        assert_eq!(breakdown[1].category, Category::Rent);
        assert_eq!(breakdown[1].count, 0);
        assert_eq!(grand_total(&breakdown).unwrap(), MoneyCents::new(25_000));
    }

    #[test]
    fn unknown_stored_category_is_an_error() {
        assert!(build_breakdown(vec![row("Pets", 100, 1)], None).is_err());
    }
}
