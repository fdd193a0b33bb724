//! Budget and expense reconciliation engine.
//!
//! The engine keeps one budget per user per calendar month, records expenses
//! owned by a user, and recomputes monthly statements on every read. All
//! persistence goes through the `DatabaseConnection` handed to
//! [`Engine::builder`].

pub use budget_allocations::CategoryAllocation;
pub use budgets::Budget;
pub use categories::{Category, PaymentMethod, RecurringFrequency};
pub use commands::{ExpenseListFilter, NewExpenseCmd, SetBudgetCmd, UpdateExpenseCmd};
pub use error::{EngineError, ErrorKind};
pub use expenses::Expense;
pub use money::MoneyCents;
pub use month::Month;
pub use ops::{BUDGET_HISTORY_LIMIT, Engine, EngineBuilder};
pub use statement::{CategoryTotal, ExpenseStats, MonthlyStatement};

mod budget_allocations;
mod budgets;
mod categories;
mod commands;
mod error;
mod expenses;
mod money;
mod month;
mod ops;
mod statement;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
