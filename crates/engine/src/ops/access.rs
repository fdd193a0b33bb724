//! Ownership gates.
//!
//! Every read or write of a single budget or expense goes through one of the
//! `require_*_owner` methods: the record must exist (`KeyNotFound`) and then
//! belong to the caller (`Forbidden`). The existence check always comes first.

use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, budgets, expenses};

use super::Engine;

/// Generates a `require_*_owner` method for an entity with a `user_id` column.
macro_rules! impl_require_owner {
    ($require_fn:ident, $entity:path, $model:path, $label:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            record_id: Uuid,
            user_id: &str,
        ) -> ResultEngine<$model> {
            let model = <$entity>::find_by_id(record_id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(concat!($label, " not exists").to_string()))?;
            if model.user_id != user_id {
                return Err(EngineError::Forbidden(
                    concat!($label, " belongs to another user").to_string(),
                ));
            }
            Ok(model)
        }
    };
}

impl Engine {
    impl_require_owner!(
        require_budget_owner,
        budgets::Entity,
        budgets::Model,
        "budget"
    );

    impl_require_owner!(
        require_expense_owner,
        expenses::Entity,
        expenses::Model,
        "expense"
    );
}
