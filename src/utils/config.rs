use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::storage::models::{TableMapping, MAX_BATCH_SIZE};

/// Default Config-Datei im Arbeitsverzeichnis (optional)
const DEFAULT_CONFIG_FILE: &str = "ddb-migrate";
const ENV_PREFIX: &str = "DDB_MIGRATE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("no table mappings configured")]
    NoTables,

    #[error("invalid table name {name:?}: {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    #[error("table {0} is mapped onto itself")]
    SameTable(String),

    #[error("batch_size must be between 1 and 25, got {0}")]
    BatchSize(usize),

    #[error("page_size must be at least 1, got {0}")]
    PageSize(i32),

    #[error("retry.max_attempts must be at least 1")]
    MaxAttempts,

    #[error("invalid table mapping {0:?}, expected SOURCE=DESTINATION")]
    MappingSyntax(String),
}

/// AWS Verbindung
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    pub region: Option<String>,
    /// Named profile aus ~/.aws/credentials
    pub profile: Option<String>,
    /// z.B. http://localhost:8000 für DynamoDB Local
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    pub batch_size: usize,
    pub page_size: Option<i32>,
    pub consistent_read: bool,
    pub dry_run: bool,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            page_size: None,
            consistent_read: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 50,
            max_delay_ms: 5_000,
        }
    }
}

/// Hauptkonfiguration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub aws: AwsSettings,
    pub migration: MigrationSettings,
    pub retry: RetrySettings,
    pub tables: Vec<TableMapping>,
}

impl Settings {
    /// Lade Config aus Datei und Environment Variablen.
    ///
    /// Ohne `path` wird `ddb-migrate.toml` im Arbeitsverzeichnis gelesen, falls vorhanden.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Parse Settings aus einem TOML String (ohne Environment)
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tables.is_empty() {
            return Err(ConfigError::NoTables);
        }

        for mapping in &self.tables {
            validate_table_name(&mapping.source)?;
            validate_table_name(&mapping.destination)?;
            if mapping.source == mapping.destination {
                return Err(ConfigError::SameTable(mapping.source.clone()));
            }
        }

        let batch_size = self.migration.batch_size;
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::BatchSize(batch_size));
        }
        if let Some(page_size) = self.migration.page_size {
            if page_size < 1 {
                return Err(ConfigError::PageSize(page_size));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::MaxAttempts);
        }

        let destinations: HashSet<&str> =
            self.tables.iter().map(|m| m.destination.as_str()).collect();
        if destinations.len() != self.tables.len() {
            tracing::warn!("Several source tables write into the same destination");
        }

        Ok(())
    }
}

/// DynamoDB Tabellennamen: 3-255 Zeichen aus [A-Za-z0-9_.-]
pub fn validate_table_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidTableName {
        name: name.to_string(),
        reason,
    };

    if name.len() < 3 || name.len() > 255 {
        return Err(invalid("must be between 3 and 255 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(invalid("only letters, digits, '_', '-' and '.' are allowed"));
    }
    Ok(())
}

/// Parse `SOURCE=DESTINATION`
pub fn parse_table_mapping(value: &str) -> Result<TableMapping, ConfigError> {
    match value.split_once('=') {
        Some((source, destination)) if !source.trim().is_empty() && !destination.trim().is_empty() => {
            Ok(TableMapping::new(source.trim(), destination.trim()))
        }
        _ => Err(ConfigError::MappingSyntax(value.to_string())),
    }
}
