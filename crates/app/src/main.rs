use std::process::ExitCode;

use clap::Parser;
use engine::ErrorKind;
use migration::{Migrator, MigratorTrait};

use crate::error::AppError;

mod cli;
mod error;
mod settings;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "trackify={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url());
    let db = connect_db(&url).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    tracing::info!(user = %cli.user, "trackify ready");

    match cli::run(&engine, &cli.user, cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            match &err {
                AppError::Engine(engine_err) => tracing::error!(
                    kind = ?engine_err.kind(),
                    retryable = engine_err.is_retryable(),
                    "{err}"
                ),
                AppError::Json(_) => tracing::error!("{err}"),
            }
            let (label, code) = outcome(&err);
            eprintln!("{label}: {err}");
            Ok(ExitCode::from(code))
        }
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    tracing::debug!(database_url, "opening database");
    let database = sea_orm::Database::connect(database_url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

/// Label and process exit code of a failed command.
fn outcome(err: &AppError) -> (&'static str, u8) {
    let AppError::Engine(err) = err else {
        return ("output error", 1);
    };
    match err.kind() {
        ErrorKind::Validation => ("invalid request", 2),
        ErrorKind::NotFound => ("not found", 3),
        ErrorKind::Forbidden => ("forbidden", 4),
        // EX_TEMPFAIL
        ErrorKind::StoreUnavailable => ("store unavailable, retry later", 75),
        ErrorKind::Store => ("store error", 1),
    }
}
