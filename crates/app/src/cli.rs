//! Command line surface of `trackify`.
//!
//! Every subcommand maps onto one engine operation and prints its result as
//! pretty JSON on stdout.
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{
    Category, Engine, EngineError, ExpenseListFilter, MoneyCents, Month, NewExpenseCmd,
    PaymentMethod, RecurringFrequency, SetBudgetCmd, UpdateExpenseCmd,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "trackify")]
#[command(about = "Monthly budgets and expenses, reconciled on every read")]
pub struct Cli {
    /// Identity of the caller. Every operation is scoped to it.
    #[arg(long, env = "TRACKIFY_USER")]
    pub user: String,

    /// Database connection string, overrides `settings.toml`.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage monthly budgets.
    Budget(Budget),
    /// Manage expenses.
    Expense(Expense),
    /// Spending vs. budget for a month (current month by default).
    Statement {
        #[arg(long, value_parser = parse_month)]
        month: Option<Month>,
    },
    /// Totals per category for a month, or over every expense.
    Stats {
        #[arg(long, value_parser = parse_month)]
        month: Option<Month>,
    },
}

#[derive(Args, Debug)]
pub struct Budget {
    #[command(subcommand)]
    command: BudgetCommand,
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    /// Create or replace the budget of a month.
    Set(BudgetSetArgs),
    Get {
        #[arg(long)]
        month: String,
    },
    Current,
    History,
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    Activate {
        #[arg(long)]
        id: Uuid,
    },
    Deactivate {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct BudgetSetArgs {
    /// `YYYY-MM`.
    #[arg(long)]
    month: String,
    #[arg(long, allow_hyphen_values = true, value_parser = parse_amount)]
    total: MoneyCents,
    /// `Category=AMOUNT`, repeatable.
    #[arg(long = "allocate", value_parser = parse_allocation)]
    allocations: Vec<(Category, MoneyCents)>,
}

#[derive(Args, Debug)]
pub struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseAddArgs),
    Get {
        #[arg(long)]
        id: Uuid,
    },
    Update(ExpenseUpdateArgs),
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    List {
        #[arg(long, value_parser = parse_month)]
        month: Option<Month>,
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    #[arg(long, allow_hyphen_values = true, value_parser = parse_amount)]
    amount: MoneyCents,
    #[arg(long, value_parser = parse_category)]
    category: Category,
    #[arg(long)]
    description: String,
    /// RFC 3339 instant or `YYYY-MM-DD` (midnight UTC). Defaults to now.
    #[arg(long, value_parser = parse_date)]
    date: Option<DateTime<Utc>>,
    #[arg(long, value_parser = parse_payment_method)]
    payment_method: Option<PaymentMethod>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long, value_parser = parse_frequency)]
    recurring: Option<RecurringFrequency>,
}

#[derive(Args, Debug)]
struct ExpenseUpdateArgs {
    #[arg(long)]
    id: Uuid,
    #[arg(long, allow_hyphen_values = true, value_parser = parse_amount)]
    amount: Option<MoneyCents>,
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_parser = parse_date)]
    date: Option<DateTime<Utc>>,
    #[arg(long, value_parser = parse_payment_method)]
    payment_method: Option<PaymentMethod>,
    #[arg(long, conflicts_with = "clear_location")]
    location: Option<String>,
    #[arg(long)]
    clear_location: bool,
    /// Replaces every stored tag, repeatable.
    #[arg(long = "tag", conflicts_with = "clear_tags")]
    tags: Vec<String>,
    #[arg(long)]
    clear_tags: bool,
    #[arg(long, value_parser = parse_frequency, conflicts_with = "clear_recurring")]
    recurring: Option<RecurringFrequency>,
    #[arg(long)]
    clear_recurring: bool,
}

impl ExpenseUpdateArgs {
    fn into_cmd(self, user_id: &str) -> UpdateExpenseCmd {
        let mut cmd = UpdateExpenseCmd::new(user_id, self.id);
        cmd.amount = self.amount;
        cmd.category = self.category;
        cmd.description = self.description;
        cmd.date = self.date;
        cmd.payment_method = self.payment_method;
        if self.clear_location {
            cmd = cmd.location(None);
        } else if let Some(location) = self.location {
            cmd = cmd.location(Some(location));
        }
        if self.clear_tags {
            cmd = cmd.tags(Vec::new());
        } else if !self.tags.is_empty() {
            cmd = cmd.tags(self.tags);
        }
        if self.clear_recurring {
            cmd = cmd.recurring(None);
        } else if let Some(frequency) = self.recurring {
            cmd = cmd.recurring(Some(frequency));
        }
        cmd
    }
}

fn parse_amount(raw: &str) -> std::result::Result<MoneyCents, String> {
    raw.parse().map_err(|err: EngineError| err.to_string())
}

fn parse_month(raw: &str) -> std::result::Result<Month, String> {
    raw.parse().map_err(|err: EngineError| err.to_string())
}

fn parse_category(raw: &str) -> std::result::Result<Category, String> {
    Category::try_from(raw).map_err(|err| err.to_string())
}

fn parse_payment_method(raw: &str) -> std::result::Result<PaymentMethod, String> {
    PaymentMethod::try_from(raw).map_err(|err| err.to_string())
}

fn parse_frequency(raw: &str) -> std::result::Result<RecurringFrequency, String> {
    RecurringFrequency::try_from(raw).map_err(|err| err.to_string())
}

fn parse_allocation(raw: &str) -> std::result::Result<(Category, MoneyCents), String> {
    let (category, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected Category=AMOUNT, got {raw}"))?;
    Ok((parse_category(category.trim())?, parse_amount(amount)?))
}

fn parse_date(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| format!("expected RFC 3339 or YYYY-MM-DD, got {raw}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

/// Run one subcommand against `engine` on behalf of `user_id`.
pub async fn run(engine: &Engine, user_id: &str, command: Command) -> Result<()> {
    match command {
        Command::Budget(Budget { command }) => match command {
            BudgetCommand::Set(args) => {
                let mut cmd = SetBudgetCmd::new(user_id, args.month, args.total);
                for (category, amount) in args.allocations {
                    cmd = cmd.allocate(category, amount);
                }
                print_json(&engine.set_budget(cmd).await?)
            }
            BudgetCommand::Get { month } => print_json(&engine.budget(user_id, &month).await?),
            BudgetCommand::Current => print_json(&engine.current_budget(user_id).await?),
            BudgetCommand::History => print_json(&engine.budget_history(user_id).await?),
            BudgetCommand::Delete { id } => {
                engine.delete_budget(user_id, id).await?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
            BudgetCommand::Activate { id } => {
                print_json(&engine.set_budget_active(user_id, id, true).await?)
            }
            BudgetCommand::Deactivate { id } => {
                print_json(&engine.set_budget_active(user_id, id, false).await?)
            }
        },
        Command::Expense(Expense { command }) => match command {
            ExpenseCommand::Add(args) => {
                let mut cmd =
                    NewExpenseCmd::new(user_id, args.amount, args.category, args.description);
                cmd.date = args.date;
                cmd.payment_method = args.payment_method;
                cmd.location = args.location;
                cmd.tags = args.tags;
                cmd.recurring = args.recurring;
                print_json(&engine.create_expense(cmd).await?)
            }
            ExpenseCommand::Get { id } => print_json(&engine.expense(user_id, id).await?),
            ExpenseCommand::Update(args) => {
                print_json(&engine.update_expense(args.into_cmd(user_id)).await?)
            }
            ExpenseCommand::Delete { id } => {
                engine.delete_expense(user_id, id).await?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
            ExpenseCommand::List { month, category } => {
                let filter = ExpenseListFilter { month, category };
                print_json(&engine.list_expenses(user_id, filter).await?)
            }
        },
        Command::Statement { month } => {
            let statement = match month {
                Some(month) => engine.statement(user_id, &month.to_string()).await?,
                None => engine.current_statement(user_id).await?,
            };
            print_json(&statement)
        }
        Command::Stats { month } => {
            let month = month.map(|month| month.to_string());
            print_json(&engine.expense_stats(user_id, month.as_deref()).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn unrenderable_output_is_a_json_error() {
        let by_pair = BTreeMap::from([((2024, 3), MoneyCents::new(100))]);
        let err = print_json(&by_pair).unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
    }

    #[test]
    fn date_accepts_rfc3339_and_plain_day() {
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("2024-03-01T10:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
        );
        assert!(parse_date("01/03/2024").is_err());
    }

    #[test]
    fn allocation_pairs() {
        assert_eq!(
            parse_allocation("Food=250.00").unwrap(),
            (Category::Food, MoneyCents::new(25_000))
        );
        assert!(parse_allocation("Food").is_err());
        assert!(parse_allocation("food=1").is_err());
    }

    #[test]
    fn update_flags_map_to_nested_options() {
        let cli = Cli::try_parse_from([
            "trackify",
            "--user",
            "alice",
            "expense",
            "update",
            "--id",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "--clear-location",
            "--tag",
            "work",
        ])
        .unwrap();
        let Command::Expense(Expense {
            command: ExpenseCommand::Update(args),
        }) = cli.command
        else {
            panic!("expected expense update");
        };

        let cmd = args.into_cmd("alice");
        assert_eq!(cmd.location, Some(None));
        assert_eq!(cmd.tags, Some(vec!["work".to_string()]));
        assert_eq!(cmd.recurring, None);
        assert!(cmd.amount.is_none());
    }

    #[test]
    fn negative_budget_total_reaches_the_engine() {
        let cli = Cli::try_parse_from([
            "trackify", "--user", "alice", "budget", "set", "--month", "2024-03", "--total",
            "-5",
        ])
        .unwrap();
        let Command::Budget(Budget {
            command: BudgetCommand::Set(args),
        }) = cli.command
        else {
            panic!("expected budget set");
        };
        assert_eq!(args.total, MoneyCents::new(-500));
    }
}
