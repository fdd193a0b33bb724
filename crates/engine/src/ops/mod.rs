use sea_orm::{ColumnTrait, Condition, DatabaseConnection};

use crate::{Month, ResultEngine};

mod access;
mod budgets;
mod expenses;
mod statements;

pub use budgets::BUDGET_HISTORY_LIMIT;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// `column` falls inside `month`, bounded by its first and last instants.
fn within_month<C: ColumnTrait>(column: C, month: Month) -> Condition {
    Condition::all()
        .add(column.gte(month.start()))
        .add(column.lte(month.last_instant()))
}

/// Entry point of every budget, expense and statement operation.
///
/// The engine holds no state besides the store handle: every read goes back
/// to the database, so statements are never stale.
#[derive(Debug, Clone)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
