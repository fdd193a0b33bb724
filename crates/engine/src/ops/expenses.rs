use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseListFilter, NewExpenseCmd, ResultEngine, UpdateExpenseCmd,
    expenses,
    util::{ensure_non_negative, normalize_description, normalize_optional_text, normalize_tags},
};

use super::{Engine, with_tx, within_month};

impl Engine {
    /// Record a new expense owned by `cmd.user_id`.
    ///
    /// `date` defaults to now and `payment_method` to cash.
    pub async fn create_expense(&self, cmd: NewExpenseCmd) -> ResultEngine<Expense> {
        ensure_non_negative(cmd.amount, "amount")?;
        let description = normalize_description(&cmd.description)?;

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            user_id: cmd.user_id,
            amount: cmd.amount,
            category: cmd.category,
            description,
            date: cmd.date.unwrap_or(now),
            payment_method: cmd.payment_method.unwrap_or_default(),
            location: normalize_optional_text(cmd.location.as_deref()),
            tags: normalize_tags(&cmd.tags),
            recurring: cmd.recurring,
            created_at: now,
            updated_at: now,
        };

        let model: expenses::ActiveModel = (&expense).into();
        with_tx!(self, |db_tx| {
            model.insert(&db_tx).await?;
            tracing::debug!(
                user_id = %expense.user_id,
                expense_id = %expense.id,
                "expense created"
            );
            Ok(expense)
        })
    }

    /// Return one expense of the caller.
    pub async fn expense(&self, user_id: &str, expense_id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_expense_owner(&db_tx, expense_id, user_id)
                .await?;
            Expense::try_from(model)
        })
    }

    /// Merge the given fields into an expense. Unset fields keep their value.
    pub async fn update_expense(&self, cmd: UpdateExpenseCmd) -> ResultEngine<Expense> {
        if cmd.is_empty() {
            return Err(EngineError::InvalidInput(
                "update must change at least one field".to_string(),
            ));
        }
        if let Some(amount) = cmd.amount {
            ensure_non_negative(amount, "amount")?;
        }
        let description = cmd
            .description
            .as_deref()
            .map(normalize_description)
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_expense_owner(&db_tx, cmd.expense_id, &cmd.user_id)
                .await?;
            let mut expense = Expense::try_from(model)?;

            if let Some(amount) = cmd.amount {
                expense.amount = amount;
            }
            if let Some(category) = cmd.category {
                expense.category = category;
            }
            if let Some(description) = description {
                expense.description = description;
            }
            if let Some(date) = cmd.date {
                expense.date = date;
            }
            if let Some(method) = cmd.payment_method {
                expense.payment_method = method;
            }
            if let Some(location) = &cmd.location {
                expense.location = normalize_optional_text(location.as_deref());
            }
            if let Some(tags) = &cmd.tags {
                expense.tags = normalize_tags(tags);
            }
            if let Some(recurring) = cmd.recurring {
                expense.recurring = recurring;
            }
            expense.updated_at = Utc::now();

            let active: expenses::ActiveModel = (&expense).into();
            active.update(&db_tx).await?;
            Ok(expense)
        })
    }

    /// Delete an expense. Budgets are never touched.
    pub async fn delete_expense(&self, user_id: &str, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_expense_owner(&db_tx, expense_id, user_id)
                .await?;
            expenses::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            tracing::debug!(user_id, %expense_id, "expense deleted");
            Ok(())
        })
    }

    /// List the caller's expenses, newest first.
    pub async fn list_expenses(
        &self,
        user_id: &str,
        filter: ExpenseListFilter,
    ) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            let mut query = expenses::Entity::find().filter(expenses::Column::UserId.eq(user_id));
            if let Some(month) = filter.month {
                query = query.filter(within_month(expenses::Column::Date, month));
            }
            if let Some(category) = filter.category {
                query = query.filter(expenses::Column::Category.eq(category.as_str()));
            }

            query
                .order_by_desc(expenses::Column::Date)
                .order_by_desc(expenses::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Expense::try_from)
                .collect()
        })
    }
}
