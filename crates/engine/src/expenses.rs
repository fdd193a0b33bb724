//! The module contains `Expense` struct and its persistence model.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Category, EngineError, MoneyCents, PaymentMethod, RecurringFrequency,
    util::{tags_from_json, tags_to_json},
};

/// A single dated, categorized transaction recorded by its owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: String,
    pub amount: MoneyCents,
    pub category: Category,
    pub description: String,
    pub date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub location: Option<String>,
    pub tags: Vec<String>,
    /// `Some` for a recurring expense. No future occurrence is ever generated.
    pub recurring: Option<RecurringFrequency>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn is_recurring(&self) -> bool {
        self.recurring.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub amount_minor: i64,
    pub category: String,
    pub description: String,
    pub date: DateTimeUtc,
    pub payment_method: String,
    pub location: Option<String>,
    /// JSON array of strings.
    pub tags: String,
    pub is_recurring: bool,
    pub recurring_frequency: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(value: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            amount_minor: ActiveValue::Set(value.amount.cents()),
            category: ActiveValue::Set(value.category.as_str().to_string()),
            description: ActiveValue::Set(value.description.clone()),
            date: ActiveValue::Set(value.date),
            payment_method: ActiveValue::Set(value.payment_method.as_str().to_string()),
            location: ActiveValue::Set(value.location.clone()),
            tags: ActiveValue::Set(tags_to_json(&value.tags)),
            is_recurring: ActiveValue::Set(value.is_recurring()),
            recurring_frequency: ActiveValue::Set(
                value.recurring.map(|frequency| frequency.as_str().to_string()),
            ),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let recurring = match (model.is_recurring, model.recurring_frequency.as_deref()) {
            (true, Some(raw)) => Some(RecurringFrequency::try_from(raw)?),
            (true, None) => Some(RecurringFrequency::Monthly),
            (false, _) => None,
        };

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            amount: MoneyCents::new(model.amount_minor),
            category: Category::try_from(model.category.as_str())?,
            description: model.description,
            date: model.date,
            payment_method: PaymentMethod::try_from(model.payment_method.as_str())?,
            location: model.location,
            tags: tags_from_json(&model.tags)?,
            recurring,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
