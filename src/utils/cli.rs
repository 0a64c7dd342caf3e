use clap::Parser;
use std::path::PathBuf;

use super::config::{parse_table_mapping, Settings};
use super::logging::LogFormat;
use crate::storage::models::TableMapping;

/// Kopiert DynamoDB Tabellen per Scan + BatchWriteItem
#[derive(Debug, Parser)]
#[command(name = "ddb-migrate", version, about)]
pub struct Args {
    /// TOML config file (default: ./ddb-migrate.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SOURCE=DESTINATION, repeatable; replaces the tables from the config file
    #[arg(short, long = "table", value_parser = parse_mapping_arg)]
    pub tables: Vec<TableMapping>,

    #[arg(long)]
    pub region: Option<String>,

    /// Named AWS profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Custom endpoint, e.g. DynamoDB Local
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Items per BatchWriteItem call (1-25)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Scan page limit
    #[arg(long)]
    pub page_size: Option<i32>,

    /// Scan only, no writes
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Write Prometheus metrics here when the run ends
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,
}

fn parse_mapping_arg(value: &str) -> Result<TableMapping, String> {
    parse_table_mapping(value).map_err(|e| e.to_string())
}

impl Args {
    /// CLI Flags überschreiben Datei und Environment
    pub fn apply(&self, settings: &mut Settings) {
        if !self.tables.is_empty() {
            settings.tables = self.tables.clone();
        }
        if let Some(region) = &self.region {
            settings.aws.region = Some(region.clone());
        }
        if let Some(profile) = &self.profile {
            settings.aws.profile = Some(profile.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            settings.aws.endpoint_url = Some(endpoint.clone());
        }
        if let Some(batch_size) = self.batch_size {
            settings.migration.batch_size = batch_size;
        }
        if let Some(page_size) = self.page_size {
            settings.migration.page_size = Some(page_size);
        }
        if self.dry_run {
            settings.migration.dry_run = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_tables_in_order() {
        let args = Args::try_parse_from([
            "ddb-migrate",
            "--table",
            "User-develop=User-dev",
            "-t",
            "Email-develop=Email-dev",
            "--dry-run",
            "--log-format",
            "pretty",
        ])
        .unwrap();

        assert_eq!(
            args.tables,
            vec![
                TableMapping::new("User-develop", "User-dev"),
                TableMapping::new("Email-develop", "Email-dev"),
            ]
        );
        assert!(args.dry_run);
        assert_eq!(args.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_rejects_malformed_table() {
        assert!(Args::try_parse_from(["ddb-migrate", "--table", "User-develop"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut settings = Settings::from_toml(
            r#"
[aws]
region = "eu-west-1"

[[tables]]
source = "Plan-develop"
destination = "Plan-dev"
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "ddb-migrate",
            "--region",
            "us-east-1",
            "--profile",
            "PROFILE_NAME",
            "--batch-size",
            "10",
            "--table",
            "Form-develop=Form-dev",
        ])
        .unwrap();
        args.apply(&mut settings);

        assert_eq!(settings.aws.region.as_deref(), Some("us-east-1"));
        assert_eq!(settings.aws.profile.as_deref(), Some("PROFILE_NAME"));
        assert_eq!(settings.migration.batch_size, 10);
        assert_eq!(settings.tables, vec![TableMapping::new("Form-develop", "Form-dev")]);
    }

    #[test]
    fn test_no_flags_keep_file_settings() {
        let mut settings = Settings::from_toml(
            r#"
[[tables]]
source = "Plan-develop"
destination = "Plan-dev"
"#,
        )
        .unwrap();
        let before = settings.clone();

        Args::try_parse_from(["ddb-migrate"]).unwrap().apply(&mut settings);
        assert_eq!(settings, before);
    }
}
