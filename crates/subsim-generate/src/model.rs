use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use subsim_core::{BillingFrequency, Currency};

use crate::errors::GenerationError;

const MAX_CANCELLATION_LAG_DAYS: i64 = 3650;
/// Longest billing period a renewal can advance by.
const LONGEST_PERIOD_DAYS: i64 = 365;
/// How far before the horizon subscriptions may start.
const START_WINDOW_MONTHS: u32 = 24;

/// Options for the generation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Directory where run artifacts are written.
    pub out_dir: PathBuf,
    /// Master seed; every random stream of a run derives from it.
    pub seed: u64,
    /// Instant treated as "now". Defaults to the current UTC time.
    pub horizon: Option<NaiveDateTime>,
    pub providers: u32,
    pub plans_per_provider: u32,
    pub users: u32,
    pub subscriptions: u32,
    pub currencies: Vec<Currency>,
    pub billing_frequencies: Vec<BillingFrequency>,
    /// Probability that a renewal attempt fails.
    pub failure_rate: f64,
    /// Probability that a failed renewal ends in cancellation.
    pub cancellation_rate: f64,
    /// Days between a failed renewal and the cancellation it triggers.
    pub cancellation_lag_days: i64,
    /// Worker threads for simulation. Defaults to the available cores.
    pub workers: Option<usize>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            seed: 42,
            horizon: None,
            providers: 5,
            plans_per_provider: 5,
            users: 200,
            subscriptions: 500,
            currencies: Currency::ALL.to_vec(),
            billing_frequencies: BillingFrequency::ALL.to_vec(),
            failure_rate: 0.10,
            cancellation_rate: 0.50,
            cancellation_lag_days: 7,
            workers: None,
        }
    }
}

impl GenerateOptions {
    /// Reject parameters that would make a run meaningless.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let counts = [
            ("providers", self.providers),
            ("plans_per_provider", self.plans_per_provider),
            ("users", self.users),
            ("subscriptions", self.subscriptions),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(GenerationError::Configuration(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        if self.currencies.is_empty() {
            return Err(GenerationError::Configuration(
                "currencies must not be empty".to_string(),
            ));
        }
        if self.billing_frequencies.is_empty() {
            return Err(GenerationError::Configuration(
                "billing_frequencies must not be empty".to_string(),
            ));
        }
        for (name, rate) in [
            ("failure_rate", self.failure_rate),
            ("cancellation_rate", self.cancellation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(GenerationError::Configuration(format!(
                    "{name} must be within [0, 1], got {rate}"
                )));
            }
        }
        if self.cancellation_lag_days <= 0 {
            return Err(GenerationError::Configuration(format!(
                "cancellation_lag_days must be positive, got {}",
                self.cancellation_lag_days
            )));
        }
        if self.cancellation_lag_days > MAX_CANCELLATION_LAG_DAYS {
            return Err(GenerationError::Configuration(format!(
                "cancellation_lag_days must be at most {MAX_CANCELLATION_LAG_DAYS}, got {}",
                self.cancellation_lag_days
            )));
        }
        if self.workers == Some(0) {
            return Err(GenerationError::Configuration(
                "workers must be greater than zero".to_string(),
            ));
        }
        if let Some(horizon) = self.horizon {
            self.validate_horizon(horizon)?;
        }
        Ok(())
    }

    /// Reject horizons whose start window or last possible cancellation
    /// falls outside the representable calendar.
    pub fn validate_horizon(&self, horizon: NaiveDateTime) -> Result<(), GenerationError> {
        let earliest = horizon.checked_sub_months(Months::new(START_WINDOW_MONTHS));
        let latest = Duration::days(LONGEST_PERIOD_DAYS)
            .checked_add(&self.cancellation_lag())
            .and_then(|reach| horizon.checked_add_signed(reach));
        if earliest.is_none() || latest.is_none() {
            return Err(GenerationError::Configuration(format!(
                "horizon {horizon} is out of range"
            )));
        }
        Ok(())
    }

    pub fn cancellation_lag(&self) -> Duration {
        Duration::try_days(self.cancellation_lag_days).unwrap_or(Duration::MAX)
    }
}

/// Summary of a written table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows: u64,
    pub bytes_written: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub horizon: NaiveDateTime,
    pub tables: Vec<TableReport>,
    pub events_by_type: BTreeMap<String, u64>,
    pub subscriptions_by_status: BTreeMap<String, u64>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64, horizon: NaiveDateTime) -> Self {
        Self {
            run_id,
            seed,
            horizon,
            tables: Vec::new(),
            events_by_type: BTreeMap::new(),
            subscriptions_by_status: BTreeMap::new(),
            bytes_written: 0,
            duration_ms: 0,
        }
    }

    pub fn record_table(&mut self, table: &str, rows: usize, bytes_written: u64) {
        self.bytes_written += bytes_written;
        self.tables.push(TableReport {
            table: table.to_string(),
            rows: rows as u64,
            bytes_written,
        });
    }

    pub fn record_event(&mut self, event_type: &str) {
        *self.events_by_type.entry(event_type.to_string()).or_insert(0) += 1;
    }

    pub fn record_status(&mut self, status: &str) {
        *self
            .subscriptions_by_status
            .entry(status.to_string())
            .or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GenerateOptions::default().validate().expect("defaults validate");
    }

    #[test]
    fn rejects_zero_counts() {
        let options = GenerateOptions {
            users: 0,
            ..GenerateOptions::default()
        };
        let err = options.validate().expect_err("zero users rejected");
        assert!(err.to_string().contains("users"));
    }

    #[test]
    fn rejects_rates_out_of_range() {
        let options = GenerateOptions {
            failure_rate: 1.5,
            ..GenerateOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_empty_currency_list() {
        let options = GenerateOptions {
            currencies: Vec::new(),
            ..GenerateOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_non_positive_lag() {
        let options = GenerateOptions {
            cancellation_lag_days: 0,
            ..GenerateOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn rejects_horizons_at_calendar_edges() {
        for horizon in [
            NaiveDateTime::MAX,
            NaiveDateTime::MIN + Duration::days(30),
        ] {
            let options = GenerateOptions {
                horizon: Some(horizon),
                ..GenerateOptions::default()
            };
            assert!(matches!(
                options.validate(),
                Err(GenerationError::Configuration(_))
            ));
        }
    }

    #[test]
    fn rejects_oversized_lag() {
        let options = GenerateOptions {
            cancellation_lag_days: i64::MAX,
            ..GenerateOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
