//! Core contracts for subsim.
//!
//! This crate defines the subscription-commerce record types, the closed
//! enumerations they use, the shared error taxonomy, and the timeline
//! validator applied to every simulated subscription.

pub mod error;
pub mod records;
pub mod types;
pub mod validation;

pub use error::{Error, Result};
pub use records::{Plan, Provider, SubscriptionEvent, SubscriptionSummary, User};
pub use types::{BillingFrequency, Currency, EventType, SubscriptionState, SubscriptionStatus};
pub use validation::validate_timeline;

/// Current contract version for generated datasets.
pub const DATASET_VERSION: &str = "0.1";
