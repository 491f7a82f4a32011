use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{NaiveDateTime, Timelike, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use subsim_core::{Plan, Provider, SubscriptionEvent, SubscriptionSummary, User};

use crate::errors::GenerationError;
use crate::model::{GenerateOptions, GenerationReport};
use crate::output::csv::write_table_csv;
use crate::pool::{PoolConfig, ReferencePool};
use crate::sampling::{Sampler, hash_seed};
use crate::simulator::{LifecycleRates, Simulator};
use crate::summary::summarize;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub run_dir: PathBuf,
    pub report: GenerationReport,
}

/// The four generated tables plus the derived subscription rollup.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub horizon: NaiveDateTime,
    pub providers: Vec<Provider>,
    pub plans: Vec<Plan>,
    pub users: Vec<User>,
    /// Events grouped by subscription, in generation order.
    pub events: Vec<SubscriptionEvent>,
    pub subscriptions: Vec<SubscriptionSummary>,
}

/// Entry point for generating subscription datasets.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

struct SimulatedSubscription {
    events: Vec<SubscriptionEvent>,
    summary: SubscriptionSummary,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// The configured horizon, or the current UTC time to the second.
    pub fn resolve_horizon(&self) -> NaiveDateTime {
        self.options.horizon.unwrap_or_else(|| {
            let now = Utc::now().naive_utc();
            now.with_nanosecond(0).unwrap_or(now)
        })
    }

    /// Generate all tables in memory.
    pub fn generate(&self, horizon: NaiveDateTime) -> Result<Dataset, GenerationError> {
        self.options.validate()?;
        self.options.validate_horizon(horizon)?;

        let pool = ReferencePool::build(&PoolConfig::from(&self.options), self.options.seed, horizon)?;
        let simulator = Simulator::new(LifecycleRates::from(&self.options));

        let simulated = match self.options.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()?
                .install(|| self.simulate_all(&pool, &simulator, horizon))?,
            None => self.simulate_all(&pool, &simulator, horizon)?,
        };

        let mut events = Vec::new();
        let mut subscriptions = Vec::with_capacity(simulated.len());
        for subscription in simulated {
            events.extend(subscription.events);
            subscriptions.push(subscription.summary);
        }

        debug!(
            subscriptions = subscriptions.len(),
            events = events.len(),
            "subscriptions simulated"
        );

        Ok(Dataset {
            horizon,
            providers: pool.providers().to_vec(),
            plans: pool.plans().to_vec(),
            users: pool.users().to_vec(),
            events,
            subscriptions,
        })
    }

    /// Generate a dataset into a fresh run directory under `out_dir`.
    pub fn run(&self) -> Result<GenerationResult, GenerationError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
        let run_dir = self
            .options
            .out_dir
            .join(format!("{timestamp}__run_{run_id}"));
        let report = self.run_in(&run_dir, &run_id)?;
        Ok(GenerationResult { run_dir, report })
    }

    /// Generate a dataset into `run_dir`, creating it when missing.
    pub fn run_in(&self, run_dir: &Path, run_id: &str) -> Result<GenerationReport, GenerationError> {
        let start = Instant::now();
        let horizon = self.resolve_horizon();

        info!(
            run_id = %run_id,
            seed = self.options.seed,
            horizon = %horizon,
            subscriptions = self.options.subscriptions,
            "generation started"
        );

        let outcome = std::fs::create_dir_all(run_dir)
            .map_err(GenerationError::from)
            .and_then(|()| self.generate(horizon))
            .and_then(|dataset| {
                let mut report = GenerationReport::new(run_id.to_string(), self.options.seed, horizon);
                write_dataset(run_dir, &dataset, &mut report)?;
                Ok(report)
            });

        let mut report = match outcome {
            Ok(report) => report,
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "generation failed");
                return Err(err);
            }
        };

        report.duration_ms = start.elapsed().as_millis() as u64;
        let report_path = run_dir.join("generation_report.json");
        std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;

        info!(
            run_id = %run_id,
            tables = report.tables.len(),
            events = report.events_by_type.values().sum::<u64>(),
            duration_ms = report.duration_ms,
            bytes_written = report.bytes_written,
            "generation completed"
        );

        Ok(report)
    }

    fn simulate_all(
        &self,
        pool: &ReferencePool,
        simulator: &Simulator,
        horizon: NaiveDateTime,
    ) -> Result<Vec<SimulatedSubscription>, GenerationError> {
        let stream_seed = hash_seed(self.options.seed, "subscriptions");
        (0..self.options.subscriptions as usize)
            .into_par_iter()
            .map(|index| -> Result<SimulatedSubscription, GenerationError> {
                let mut sampler = Sampler::for_index(stream_seed, index as u64);
                let plan = pool.pick_plan(&mut sampler)?;
                let user = pool.pick_user(&mut sampler)?;
                let events = simulator.simulate(plan, user, horizon, &mut sampler)?;
                let summary =
                    summarize(&events, plan).ok_or_else(|| GenerationError::Consistency {
                        subscription_id: uuid::Uuid::nil(),
                        message: format!("subscription {index} produced no events"),
                    })?;
                Ok(SimulatedSubscription { events, summary })
            })
            .collect()
    }
}

/// Write every table of `dataset` as CSV into `dir`.
pub fn write_dataset(
    dir: &Path,
    dataset: &Dataset,
    report: &mut GenerationReport,
) -> Result<(), GenerationError> {
    let bytes = write_table_csv(&dir.join("providers.csv"), &dataset.providers)?;
    report.record_table("providers", dataset.providers.len(), bytes);

    let bytes = write_table_csv(&dir.join("plans.csv"), &dataset.plans)?;
    report.record_table("plans", dataset.plans.len(), bytes);

    let bytes = write_table_csv(&dir.join("users.csv"), &dataset.users)?;
    report.record_table("users", dataset.users.len(), bytes);

    let bytes = write_table_csv(&dir.join("subscription_events.csv"), &dataset.events)?;
    report.record_table("subscription_events", dataset.events.len(), bytes);

    let bytes = write_table_csv(&dir.join("subscriptions.csv"), &dataset.subscriptions)?;
    report.record_table("subscriptions", dataset.subscriptions.len(), bytes);

    for event in &dataset.events {
        report.record_event(event.event_type.as_str());
    }
    for subscription in &dataset.subscriptions {
        report.record_status(subscription.status.as_str());
    }

    Ok(())
}
