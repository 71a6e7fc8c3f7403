use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lookup::DEFAULT_LOOKUP_TTL_SECS;
use crate::store::FIRST_SUBMISSION_NUMBER;
use crate::utils::RetryConfig;

const DEFAULT_CATALOG_CSV: &str = "data/products.csv";
const DEFAULT_CUSTOMERS_CSV: &str = "data/customers.csv";
const DEFAULT_REPS_CSV: &str = "data/sales_reps.csv";
const DEFAULT_EXPORT_DIR: &str = "exports";
const DEFAULT_LOG_FILTER: &str = "info,apparel_order_intake=debug";
const DEFAULT_STORE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog_csv: PathBuf,
    pub customers_csv: PathBuf,
    pub reps_csv: PathBuf,
    pub lookup_ttl: Duration,
    pub export_dir: PathBuf,
    pub first_submission_number: u64,
    pub activity_log: Option<PathBuf>,
    pub log_filter: String,
    pub store_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_csv: PathBuf::from(DEFAULT_CATALOG_CSV),
            customers_csv: PathBuf::from(DEFAULT_CUSTOMERS_CSV),
            reps_csv: PathBuf::from(DEFAULT_REPS_CSV),
            lookup_ttl: Duration::from_secs(DEFAULT_LOOKUP_TTL_SECS),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            first_submission_number: FIRST_SUBMISSION_NUMBER,
            activity_log: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            store_attempts: DEFAULT_STORE_ATTEMPTS,
        }
    }
}

impl AppConfig {
    /// CLI flags and env vars win over the config file, which wins over defaults
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file = match args.config.as_deref() {
            Some(path) => load_config_file(path)?,
            None => PartialConfig::default(),
        };
        let defaults = Self::default();

        let lookup_ttl_secs = args
            .lookup_ttl_secs
            .or(file.lookup_ttl_secs)
            .unwrap_or(DEFAULT_LOOKUP_TTL_SECS);
        let store_attempts = file.store_attempts.unwrap_or(DEFAULT_STORE_ATTEMPTS);
        anyhow::ensure!(store_attempts >= 1, "store_attempts must be at least 1");

        Ok(Self {
            catalog_csv: args.catalog.clone().or(file.catalog_csv).unwrap_or(defaults.catalog_csv),
            customers_csv: args
                .customers
                .clone()
                .or(file.customers_csv)
                .unwrap_or(defaults.customers_csv),
            reps_csv: args.reps.clone().or(file.reps_csv).unwrap_or(defaults.reps_csv),
            lookup_ttl: Duration::from_secs(lookup_ttl_secs),
            export_dir: args
                .export_dir
                .clone()
                .or(file.export_dir)
                .unwrap_or(defaults.export_dir),
            first_submission_number: args
                .first_submission_number
                .or(file.first_submission_number)
                .unwrap_or(defaults.first_submission_number),
            activity_log: args.activity_log.clone().or(file.activity_log),
            log_filter: file.log_filter.unwrap_or(defaults.log_filter),
            store_attempts,
        })
    }

    pub fn store_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.store_attempts,
            ..RetryConfig::default()
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "order-intake", about = "Apparel order intake: price, validate and submit orders", version)]
pub struct CliArgs {
    #[arg(long, value_name = "FILE", help = "Path to a JSON configuration file", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "ORDER_INTAKE_CATALOG", value_name = "FILE", help = "Products sheet CSV export", global = true)]
    pub catalog: Option<PathBuf>,

    #[arg(long, env = "ORDER_INTAKE_CUSTOMERS", value_name = "FILE", help = "Customers sheet CSV export", global = true)]
    pub customers: Option<PathBuf>,

    #[arg(long, env = "ORDER_INTAKE_REPS", value_name = "FILE", help = "SalesReps sheet CSV export", global = true)]
    pub reps: Option<PathBuf>,

    #[arg(
        long,
        env = "ORDER_INTAKE_LOOKUP_TTL",
        value_name = "SECS",
        help = "Seconds a loaded sheet stays fresh",
        global = true
    )]
    pub lookup_ttl_secs: Option<u64>,

    #[arg(long, env = "ORDER_INTAKE_EXPORT_DIR", value_name = "DIR", help = "Directory for export CSVs", global = true)]
    pub export_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "ORDER_INTAKE_FIRST_SUBMISSION",
        value_name = "N",
        help = "Number issued to the first submission",
        global = true
    )]
    pub first_submission_number: Option<u64>,

    #[arg(long, env = "ORDER_INTAKE_ACTIVITY_LOG", value_name = "FILE", help = "Append activity entries to this JSON-lines file", global = true)]
    pub activity_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Price an order document without submitting it
    Price {
        #[arg(long, value_name = "FILE")]
        order: PathBuf,
    },
    /// Validate, submit and export an order document
    Submit {
        #[arg(long, value_name = "FILE")]
        order: PathBuf,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    catalog_csv: Option<PathBuf>,
    customers_csv: Option<PathBuf>,
    reps_csv: Option<PathBuf>,
    lookup_ttl_secs: Option<u64>,
    export_dir: Option<PathBuf>,
    first_submission_number: Option<u64>,
    activity_log: Option<PathBuf>,
    log_filter: Option<String>,
    store_attempts: Option<u32>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read config file {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse JSON config {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_args(&parse(&["order-intake", "price", "--order", "o.json"])).unwrap();
        assert_eq!(config.lookup_ttl, Duration::from_secs(300));
        assert_eq!(config.first_submission_number, 1001);
        assert_eq!(config.catalog_csv, PathBuf::from("data/products.csv"));
        assert_eq!(config.store_retry().max_attempts, 3);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"catalog_csv": "sheets/products.csv", "first_submission_number": 2000, "lookup_ttl_secs": 60}}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let args = parse(&[
            "order-intake",
            "--config",
            &path,
            "--first-submission-number",
            "5000",
            "submit",
            "--order",
            "o.json",
        ]);
        let config = AppConfig::from_args(&args).unwrap();

        assert_eq!(config.catalog_csv, PathBuf::from("sheets/products.csv"));
        assert_eq!(config.first_submission_number, 5000);
        assert_eq!(config.lookup_ttl, Duration::from_secs(60));
        assert!(matches!(args.command, Command::Submit { .. }));
    }

    #[test]
    fn test_unknown_config_keys_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"catalog": "typo.csv"}}"#).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let args = parse(&["order-intake", "--config", &path, "price", "--order", "o.json"]);
        assert!(AppConfig::from_args(&args).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let args = parse(&["order-intake", "--config", "/nonexistent/cfg.json", "price", "--order", "o.json"]);
        assert!(AppConfig::from_args(&args).is_err());
    }
}
