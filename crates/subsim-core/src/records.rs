use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::{BillingFrequency, Currency, EventType, SubscriptionStatus};

/// A subscription provider (merchant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Provider {
    /// Sequential identifier starting at 1.
    pub provider_id: u32,
    pub name: String,
    /// Opaque credential-like token (hex digest).
    pub api_key: String,
    pub created_at: NaiveDateTime,
}

/// A pricing plan offered by a provider.
///
/// Price and billing frequency are fixed for the plan's lifetime and
/// drive every event amount and renewal cadence derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    pub plan_id: Uuid,
    pub provider_id: u32,
    pub name: String,
    /// Positive amount rounded to two decimals.
    pub price: f64,
    pub currency: Currency,
    pub billing_frequency: BillingFrequency,
    pub features: Map<String, Value>,
    pub created_at: NaiveDateTime,
}

/// A subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub country: String,
    pub created_at: NaiveDateTime,
}

/// One entry of a subscription timeline.
///
/// `subscription_id` is only a correlation key; there is no separate
/// subscription entity behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubscriptionEvent {
    pub event_id: Uuid,
    pub subscription_id: Uuid,
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub event_type: EventType,
    pub event_timestamp: NaiveDateTime,
    /// Plan price for billable events, zero otherwise.
    pub amount: f64,
    pub currency: Currency,
}

/// Per-subscription rollup derived from the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubscriptionSummary {
    pub subscription_id: Uuid,
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub provider_id: u32,
    pub start_date: NaiveDateTime,
    /// Cancellation timestamp, when the subscription churned.
    pub end_date: Option<NaiveDateTime>,
    pub status: SubscriptionStatus,
    pub renewals_successful: u32,
    pub renewals_failed: u32,
    pub total_billed: f64,
    pub currency: Currency,
}
