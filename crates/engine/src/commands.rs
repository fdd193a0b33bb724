//! Command structs for engine operations.
//!
//! These types group parameters for write operations (set budget, create and
//! update expense), keeping call sites readable and avoiding long argument
//! lists. Values are validated by the engine, not by the builders.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Category, CategoryAllocation, MoneyCents, Month, PaymentMethod, RecurringFrequency};

/// Create or replace the budget of one month.
#[derive(Clone, Debug)]
pub struct SetBudgetCmd {
    pub user_id: String,
    pub month: String,
    pub total_budget: MoneyCents,
    /// Replaces any previous allocation list on update.
    pub allocations: Vec<CategoryAllocation>,
}

impl SetBudgetCmd {
    /// `month` is kept as raw input and validated as `YYYY-MM` by the engine.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        month: impl Into<String>,
        total_budget: MoneyCents,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            month: month.into(),
            total_budget,
            allocations: Vec::new(),
        }
    }

    #[must_use]
    pub fn allocate(mut self, category: Category, amount: MoneyCents) -> Self {
        self.allocations.push(CategoryAllocation { category, amount });
        self
    }
}

/// Create an expense.
#[derive(Clone, Debug)]
pub struct NewExpenseCmd {
    pub user_id: String,
    pub amount: MoneyCents,
    pub category: Category,
    pub description: String,
    /// Defaults to the creation instant.
    pub date: Option<DateTime<Utc>>,
    /// Defaults to [`PaymentMethod::Cash`].
    pub payment_method: Option<PaymentMethod>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub recurring: Option<RecurringFrequency>,
}

impl NewExpenseCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        amount: MoneyCents,
        category: Category,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            category,
            description: description.into(),
            date: None,
            payment_method: None,
            location: None,
            tags: Vec::new(),
            recurring: None,
        }
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn recurring(mut self, frequency: RecurringFrequency) -> Self {
        self.recurring = Some(frequency);
        self
    }
}

/// Partial update of an expense. `None` keeps the stored value.
///
/// `location` and `recurring` are nullable, so they take a nested option:
/// `Some(None)` clears the field.
#[derive(Clone, Debug)]
pub struct UpdateExpenseCmd {
    pub user_id: String,
    pub expense_id: Uuid,
    pub amount: Option<MoneyCents>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub location: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub recurring: Option<Option<RecurringFrequency>>,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, expense_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            expense_id,
            amount: None,
            category: None,
            description: None,
            date: None,
            payment_method: None,
            location: None,
            tags: None,
            recurring: None,
        }
    }

    /// `true` when no field would change.
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.payment_method.is_none()
            && self.location.is_none()
            && self.tags.is_none()
            && self.recurring.is_none()
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    #[must_use]
    pub fn location(mut self, location: Option<String>) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    #[must_use]
    pub fn recurring(mut self, frequency: Option<RecurringFrequency>) -> Self {
        self.recurring = Some(frequency);
        self
    }
}

/// Filters for listing expenses. Absent fields do not filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpenseListFilter {
    /// Restricts to `[first of month, first of next month)`.
    pub month: Option<Month>,
    pub category: Option<Category>,
}
