//! Derived, never persisted, spending summaries.

use serde::Serialize;

use crate::{Budget, Category, MoneyCents, Month};

/// Spending of one category over the aggregated window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: MoneyCents,
    pub count: u64,
    /// Amount the month's budget allocates to this category, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated: Option<MoneyCents>,
}

/// Spending vs. budget for one month.
///
/// `total_spent` always equals the sum of `category_breakdown[*].total`.
/// `remaining` is negative when the month is over budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyStatement {
    pub month: Month,
    pub budget: Budget,
    pub total_budget: MoneyCents,
    pub total_spent: MoneyCents,
    pub remaining: MoneyCents,
    pub category_breakdown: Vec<CategoryTotal>,
}

impl MonthlyStatement {
    pub fn is_over_budget(&self) -> bool {
        self.remaining.is_negative()
    }
}

/// Category totals over one month or over all of a user's expenses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpenseStats {
    /// `None` when the stats span every recorded month.
    pub month: Option<Month>,
    pub total: MoneyCents,
    pub category_breakdown: Vec<CategoryTotal>,
}
