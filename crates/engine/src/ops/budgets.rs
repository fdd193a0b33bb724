use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    Budget, CategoryAllocation, EngineError, Month, ResultEngine, SetBudgetCmd,
    budget_allocations, budgets,
    util::{ensure_non_negative, validate_allocations},
};

use super::{Engine, with_tx};

/// Maximum number of budgets returned by [`Engine::budget_history`].
pub const BUDGET_HISTORY_LIMIT: u64 = 12;

impl Engine {
    /// Create or update the budget of a month.
    ///
    /// The first call for a month inserts, later calls update `total_budget`
    /// and replace the allocations in place. The row is written with a single
    /// `INSERT .. ON CONFLICT (user_id, month) DO UPDATE`, so concurrent calls
    /// for the same `(user, month)` converge on one row: whoever inserts
    /// second updates the winner's row. Being the first statement of the
    /// transaction, the write also takes the store's write lock before
    /// anything is read.
    pub async fn set_budget(&self, cmd: SetBudgetCmd) -> ResultEngine<Budget> {
        let month: Month = cmd.month.parse()?;
        ensure_non_negative(cmd.total_budget, "total budget")?;
        validate_allocations(&cmd.allocations)?;

        let user_id = cmd.user_id.as_str();
        let candidate = Budget::new(user_id, month, cmd.total_budget, Vec::new());
        let insert: budgets::ActiveModel = (&candidate).into();

        with_tx!(self, |db_tx| {
            budgets::Entity::insert(insert)
                .on_conflict(
                    OnConflict::columns([budgets::Column::UserId, budgets::Column::Month])
                        .update_columns([
                            budgets::Column::TotalBudgetMinor,
                            budgets::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;

            let model = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id))
                .filter(budgets::Column::Month.eq(month.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!("budget for {month} not exists"))
                })?;

            replace_allocations(&db_tx, model.id, &cmd.allocations).await?;
            let allocations = load_allocations(&db_tx, model.id).await?;
            let budget = Budget::try_from((model, allocations))?;
            tracing::debug!(
                user_id,
                %month,
                budget_id = %budget.id,
                inserted = budget.id == candidate.id,
                "budget stored"
            );
            Ok(budget)
        })
    }

    /// Return the budget of `month`.
    pub async fn budget(&self, user_id: &str, month: &str) -> ResultEngine<Budget> {
        let month: Month = month.parse()?;
        with_tx!(self, |db_tx| {
            find_budget(&db_tx, user_id, month).await?.ok_or_else(|| {
                EngineError::KeyNotFound(format!("budget for {month} not exists"))
            })
        })
    }

    /// Return the budget of the current UTC month.
    ///
    /// A month without a stored budget yields [`Budget::unset`]: nothing is
    /// written, so the month stays out of [`Engine::budget_history`] until
    /// [`Engine::set_budget`] is called.
    pub async fn current_budget(&self, user_id: &str) -> ResultEngine<Budget> {
        let month = Month::current();
        with_tx!(self, |db_tx| {
            Ok(find_budget(&db_tx, user_id, month)
                .await?
                .unwrap_or_else(|| Budget::unset(user_id, month)))
        })
    }

    /// The most recent budgets, newest month first, at most
    /// [`BUDGET_HISTORY_LIMIT`].
    pub async fn budget_history(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| {
            let models = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id))
                .order_by_desc(budgets::Column::Month)
                .limit(BUDGET_HISTORY_LIMIT)
                .all(&db_tx)
                .await?;
            with_allocations(&db_tx, models).await
        })
    }

    /// Delete a budget and its allocations. Expenses are never touched.
    pub async fn delete_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget_owner(&db_tx, budget_id, user_id).await?;

            // FKs are not enforced by every SQLite connection, so cascade
            // explicitly.
            budget_allocations::Entity::delete_many()
                .filter(budget_allocations::Column::BudgetId.eq(model.id))
                .exec(&db_tx)
                .await?;
            budgets::Entity::delete_by_id(model.id).exec(&db_tx).await?;

            tracing::debug!(user_id, %budget_id, "budget deleted");
            Ok(())
        })
    }

    /// Toggle the soft-disable flag of a budget.
    pub async fn set_budget_active(
        &self,
        user_id: &str,
        budget_id: Uuid,
        active: bool,
    ) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget_owner(&db_tx, budget_id, user_id).await?;
            let update = budgets::ActiveModel {
                id: ActiveValue::Set(model.id),
                is_active: ActiveValue::Set(active),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let model = update.update(&db_tx).await?;
            let allocations = load_allocations(&db_tx, model.id).await?;
            Budget::try_from((model, allocations))
        })
    }
}

/// Look up the budget of `(user, month)`, allocations included.
pub(super) async fn find_budget(
    db_tx: &DatabaseTransaction,
    user_id: &str,
    month: Month,
) -> ResultEngine<Option<Budget>> {
    let Some(model) = budgets::Entity::find()
        .filter(budgets::Column::UserId.eq(user_id))
        .filter(budgets::Column::Month.eq(month.to_string()))
        .one(db_tx)
        .await?
    else {
        return Ok(None);
    };
    let allocations = load_allocations(db_tx, model.id).await?;
    Budget::try_from((model, allocations)).map(Some)
}

async fn load_allocations(
    db_tx: &DatabaseTransaction,
    budget_id: Uuid,
) -> ResultEngine<Vec<budget_allocations::Model>> {
    budget_allocations::Entity::find()
        .filter(budget_allocations::Column::BudgetId.eq(budget_id))
        .all(db_tx)
        .await
        .map_err(Into::into)
}

/// Attach allocations to a batch of budgets, preserving the batch order.
async fn with_allocations(
    db_tx: &DatabaseTransaction,
    models: Vec<budgets::Model>,
) -> ResultEngine<Vec<Budget>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = models.iter().map(|model| model.id).collect();
    let mut by_budget: HashMap<Uuid, Vec<budget_allocations::Model>> = HashMap::new();
    for allocation in budget_allocations::Entity::find()
        .filter(budget_allocations::Column::BudgetId.is_in(ids))
        .all(db_tx)
        .await?
    {
        by_budget
            .entry(allocation.budget_id)
            .or_default()
            .push(allocation);
    }

    models
        .into_iter()
        .map(|model| {
            let allocations = by_budget.remove(&model.id).unwrap_or_default();
            Budget::try_from((model, allocations))
        })
        .collect()
}

async fn replace_allocations(
    db_tx: &DatabaseTransaction,
    budget_id: Uuid,
    allocations: &[CategoryAllocation],
) -> ResultEngine<()> {
    budget_allocations::Entity::delete_many()
        .filter(budget_allocations::Column::BudgetId.eq(budget_id))
        .exec(db_tx)
        .await?;

    for allocation in allocations {
        let row = budget_allocations::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            budget_id: ActiveValue::Set(budget_id),
            category: ActiveValue::Set(allocation.category.as_str().to_string()),
            amount_minor: ActiveValue::Set(allocation.amount.cents()),
        };
        row.insert(db_tx).await?;
    }
    Ok(())
}
