//! Settings of the `trackify` binary.
//!
//! Read from an optional `settings.toml` in the working directory, then from
//! `TRACKIFY_*` environment variables (`TRACKIFY_APP__LEVEL=debug`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_SETTINGS_FILE: &str = "settings";
const DEFAULT_SQLITE_PATH: &str = "trackify.db";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite(DEFAULT_SQLITE_PATH.to_string())
    }
}

impl Database {
    /// Connection string understood by `sea_orm::Database::connect`.
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(DEFAULT_SETTINGS_FILE).required(false))
            .add_source(Environment::with_prefix("TRACKIFY").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(
            settings.database,
            Database::Sqlite(DEFAULT_SQLITE_PATH.to_string())
        );
    }

    #[test]
    fn database_variants() {
        let memory = from_toml("database = \"memory\"");
        assert_eq!(memory.database, Database::Memory);
        assert_eq!(memory.database.url(), "sqlite::memory:");

        let sqlite = from_toml("[app]\nlevel = \"debug\"\n[database]\nsqlite = \"data/t.db\"\n");
        assert_eq!(sqlite.app.level, "debug");
        assert_eq!(sqlite.database.url(), "sqlite:data/t.db?mode=rwc");
    }
}
