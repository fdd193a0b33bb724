//! The module contains `Budget` struct and its persistence model.
//!
//! A budget is a user's spending ceiling for one calendar month. The store
//! holds at most one row per `(user_id, month)`; the unique index
//! `uidx-budgets-user_id-month` is what makes that hold under concurrent
//! writers.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{CategoryAllocation, EngineError, MoneyCents, Month, ResultEngine, budget_allocations};

/// A monthly budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Budget {
    /// Stable identifier. [`Uuid::nil`] for a budget that was never stored.
    pub id: Uuid,
    pub user_id: String,
    pub month: Month,
    pub total_budget: MoneyCents,
    /// Optional per-category split of `total_budget`.
    pub allocations: Vec<CategoryAllocation>,
    /// Soft-disable flag.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(
        user_id: &str,
        month: Month,
        total_budget: MoneyCents,
        allocations: Vec<CategoryAllocation>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            month,
            total_budget,
            allocations,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Zero-valued budget returned for a month nobody set. Never persisted.
    pub fn unset(user_id: &str, month: Month) -> Self {
        Self {
            id: Uuid::nil(),
            ..Self::new(user_id, month, MoneyCents::ZERO, Vec::new())
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_nil()
    }

    /// Allocated amount for `category`, if the budget splits it out.
    pub fn allocation_for(&self, category: crate::Category) -> Option<MoneyCents> {
        self.allocations
            .iter()
            .find(|allocation| allocation.category == category)
            .map(|allocation| allocation.amount)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub month: String,
    pub total_budget_minor: i64,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_allocations::Entity")]
    Allocations,
}

impl Related<super::budget_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(value: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            month: ActiveValue::Set(value.month.to_string()),
            total_budget_minor: ActiveValue::Set(value.total_budget.cents()),
            is_active: ActiveValue::Set(value.is_active),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<(Model, Vec<budget_allocations::Model>)> for Budget {
    type Error = EngineError;

    fn try_from(
        (model, allocation_models): (Model, Vec<budget_allocations::Model>),
    ) -> Result<Self, Self::Error> {
        let mut allocations = allocation_models
            .into_iter()
            .map(CategoryAllocation::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        allocations.sort_by_key(|allocation| allocation.category);

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            month: model.month.parse()?,
            total_budget: MoneyCents::new(model.total_budget_minor),
            allocations,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;

    fn march() -> Month {
        "2024-03".parse().unwrap()
    }

    #[test]
    fn unset_budget_is_zero_and_not_persisted() {
        let budget = Budget::unset("alice", march());
        assert!(!budget.is_persisted());
        assert_eq!(budget.total_budget, MoneyCents::ZERO);
        assert!(budget.allocations.is_empty());
        assert!(budget.is_active);
    }

    #[test]
    fn model_round_trip_sorts_allocations() {
        let budget = Budget::new("alice", march(), MoneyCents::new(100_000), Vec::new());
        let model = Model {
            id: budget.id,
            user_id: "alice".to_string(),
            month: "2024-03".to_string(),
            total_budget_minor: 100_000,
            is_active: true,
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        };
        let allocation = |category: Category, amount_minor| budget_allocations::Model {
            id: Uuid::new_v4(),
            budget_id: budget.id,
            category: category.as_str().to_string(),
            amount_minor,
        };

        let restored = Budget::try_from((
            model,
            vec![
                allocation(Category::Transport, 10_000),
                allocation(Category::Food, 30_000),
            ],
        ))
        .unwrap();

        assert_eq!(restored.month, march());
        assert_eq!(restored.allocations[0].category, Category::Food);
        assert_eq!(
            restored.allocation_for(Category::Transport),
            Some(MoneyCents::new(10_000))
        );
        assert_eq!(restored.allocation_for(Category::Rent), None);
    }
}
