//! Subscription dataset generation for subsim.
//!
//! This crate builds seeded reference pools (providers, plans, users),
//! simulates per-subscription event timelines against a horizon, and writes
//! the resulting tables as CSV.

pub mod cosmetics;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod pool;
pub mod sampling;
pub mod simulator;
pub mod summary;

pub use engine::{Dataset, GenerationEngine, GenerationResult, write_dataset};
pub use errors::GenerationError;
pub use model::{GenerateOptions, GenerationReport, TableReport};
pub use pool::{PoolConfig, ReferencePool};
pub use sampling::{Sampler, Sampling};
pub use simulator::{LifecycleRates, Simulator, SubscriptionMachine};
