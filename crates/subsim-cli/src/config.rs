use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use clap::Args;
use serde::Deserialize;
use thiserror::Error;

use subsim_core::Error as CoreError;
use subsim_generate::GenerateOptions;

/// Errors raised while loading or merging run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(#[from] CoreError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Generation settings read from a TOML file. Absent keys keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub out_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub horizon: Option<String>,
    pub providers: Option<u32>,
    pub plans_per_provider: Option<u32>,
    pub users: Option<u32>,
    pub subscriptions: Option<u32>,
    pub currencies: Option<Vec<String>>,
    pub billing_frequencies: Option<Vec<String>>,
    pub failure_rate: Option<f64>,
    pub cancellation_rate: Option<f64>,
    pub cancellation_lag_days: Option<i64>,
    pub workers: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn apply(&self, options: &mut GenerateOptions) -> ConfigResult<()> {
        if let Some(out_dir) = &self.out_dir {
            options.out_dir = out_dir.clone();
        }
        if let Some(horizon) = &self.horizon {
            options.horizon = Some(parse_horizon(horizon)?);
        }
        if let Some(currencies) = &self.currencies {
            options.currencies = parse_all(currencies)?;
        }
        if let Some(frequencies) = &self.billing_frequencies {
            options.billing_frequencies = parse_all(frequencies)?;
        }
        set(&mut options.seed, self.seed);
        set(&mut options.providers, self.providers);
        set(&mut options.plans_per_provider, self.plans_per_provider);
        set(&mut options.users, self.users);
        set(&mut options.subscriptions, self.subscriptions);
        set(&mut options.failure_rate, self.failure_rate);
        set(&mut options.cancellation_rate, self.cancellation_rate);
        set(&mut options.cancellation_lag_days, self.cancellation_lag_days);
        if self.workers.is_some() {
            options.workers = self.workers;
        }
        Ok(())
    }
}

/// Generation flags shared by `generate` and `validate-config`.
#[derive(Args, Debug, Default, Clone)]
pub struct OptionArgs {
    /// TOML file with generation settings. Flags override its values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Output directory for runs.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
    /// Master seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Simulation horizon (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS). Defaults to now.
    #[arg(long)]
    pub horizon: Option<String>,
    #[arg(long)]
    pub providers: Option<u32>,
    #[arg(long)]
    pub plans_per_provider: Option<u32>,
    #[arg(long)]
    pub users: Option<u32>,
    #[arg(long)]
    pub subscriptions: Option<u32>,
    /// Currency to price plans in (repeatable).
    #[arg(long = "currency", value_name = "CODE")]
    pub currencies: Vec<String>,
    /// Billing frequency to offer (repeatable).
    #[arg(long = "billing-frequency", value_name = "FREQUENCY")]
    pub billing_frequencies: Vec<String>,
    #[arg(long)]
    pub failure_rate: Option<f64>,
    #[arg(long)]
    pub cancellation_rate: Option<f64>,
    #[arg(long)]
    pub cancellation_lag_days: Option<i64>,
    /// Worker threads for simulation.
    #[arg(long)]
    pub workers: Option<usize>,
}

impl OptionArgs {
    /// Defaults, then the config file, then flags.
    pub fn resolve(&self) -> ConfigResult<GenerateOptions> {
        let mut options = GenerateOptions::default();
        if let Some(path) = &self.config {
            FileConfig::load(path)?.apply(&mut options)?;
        }
        self.as_file_config().apply(&mut options)?;
        Ok(options)
    }

    fn as_file_config(&self) -> FileConfig {
        FileConfig {
            out_dir: self.out.clone(),
            seed: self.seed,
            horizon: self.horizon.clone(),
            providers: self.providers,
            plans_per_provider: self.plans_per_provider,
            users: self.users,
            subscriptions: self.subscriptions,
            currencies: non_empty(&self.currencies),
            billing_frequencies: non_empty(&self.billing_frequencies),
            failure_rate: self.failure_rate,
            cancellation_rate: self.cancellation_rate,
            cancellation_lag_days: self.cancellation_lag_days,
            workers: self.workers,
        }
    }
}

pub fn parse_horizon(value: &str) -> Result<NaiveDateTime, CoreError> {
    let value = value.trim();
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(timestamp);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| CoreError::Configuration(format!("invalid horizon '{value}'")))
}

fn parse_all<T: std::str::FromStr<Err = CoreError>>(values: &[String]) -> Result<Vec<T>, CoreError> {
    values.iter().map(|value| value.parse()).collect()
}

fn set<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use subsim_core::{BillingFrequency, Currency};

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
seed = 7
subscriptions = 25
horizon = "2025-01-31"
currencies = ["eur", "GBP"]
billing_frequencies = ["annual"]
"#,
        )
        .expect("parse config");

        let mut options = GenerateOptions::default();
        file.apply(&mut options).expect("apply config");

        assert_eq!(options.seed, 7);
        assert_eq!(options.subscriptions, 25);
        assert_eq!(options.users, 200);
        assert_eq!(options.currencies, vec![Currency::Eur, Currency::Gbp]);
        assert_eq!(options.billing_frequencies, vec![BillingFrequency::Annual]);
        assert_eq!(
            options.horizon,
            Some(parse_horizon("2025-01-31T00:00:00").expect("horizon"))
        );
    }

    #[test]
    fn flags_override_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("subsim_cli_config_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "seed = 7\nusers = 10\n").expect("write config");

        let args = OptionArgs {
            config: Some(path.clone()),
            seed: Some(99),
            currencies: vec!["usd".to_string()],
            ..OptionArgs::default()
        };
        let options = args.resolve().expect("resolve options");
        std::fs::remove_file(&path).ok();

        assert_eq!(options.seed, 99);
        assert_eq!(options.users, 10);
        assert_eq!(options.currencies, vec![Currency::Usd]);
    }

    #[test]
    fn rejects_unknown_values() {
        let file: FileConfig = toml::from_str("currencies = [\"JPY\"]").expect("parse config");
        let mut options = GenerateOptions::default();
        assert!(matches!(
            file.apply(&mut options),
            Err(ConfigError::Invalid(CoreError::Configuration(_)))
        ));

        assert!(toml::from_str::<FileConfig>("colour = \"blue\"").is_err());
        assert!(parse_horizon("yesterday").is_err());
    }
}
