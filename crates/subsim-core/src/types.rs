use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Currency codes a plan can be priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Gbp];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            _ => Err(Error::Configuration(format!(
                "unsupported currency '{value}'"
            ))),
        }
    }
}

/// Billing cadence of a plan.
///
/// Periods are fixed day counts (30/90/365), not calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BillingFrequency {
    Monthly,
    Quarterly,
    Annual,
}

impl BillingFrequency {
    pub const ALL: [BillingFrequency; 3] = [
        BillingFrequency::Monthly,
        BillingFrequency::Quarterly,
        BillingFrequency::Annual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }

    pub fn period_days(self) -> i64 {
        match self {
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Annual => 365,
        }
    }

    pub fn period(self) -> Duration {
        Duration::days(self.period_days())
    }

    /// Inclusive price bounds, in currency units.
    pub fn price_range(self) -> (f64, f64) {
        match self {
            Self::Monthly => (20.0, 100.0),
            Self::Quarterly => (50.0, 250.0),
            Self::Annual => (200.0, 1000.0),
        }
    }
}

impl fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingFrequency {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "annual" => Ok(Self::Annual),
            _ => Err(Error::Configuration(format!(
                "unsupported billing frequency '{value}'"
            ))),
        }
    }
}

/// Lifecycle event kinds recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SubscriptionCreated,
    RenewalSuccessful,
    RenewalFailed,
    SubscriptionCancelled,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubscriptionCreated => "subscription_created",
            Self::RenewalSuccessful => "renewal_successful",
            Self::RenewalFailed => "renewal_failed",
            Self::SubscriptionCancelled => "subscription_cancelled",
        }
    }

    /// Whether events of this kind collect the plan price.
    pub fn is_billable(self) -> bool {
        matches!(self, Self::SubscriptionCreated | Self::RenewalSuccessful)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the per-subscription lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Active,
    Cancelled,
}

/// Status reported in the derived subscriptions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_parses_case_insensitively() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert!(matches!(
            "JPY".parse::<Currency>(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn frequency_periods_are_fixed_day_counts() {
        assert_eq!(BillingFrequency::Monthly.period_days(), 30);
        assert_eq!(BillingFrequency::Quarterly.period_days(), 90);
        assert_eq!(BillingFrequency::Annual.period_days(), 365);
        assert!("weekly".parse::<BillingFrequency>().is_err());
    }

    #[test]
    fn only_created_and_successful_are_billable() {
        assert!(EventType::SubscriptionCreated.is_billable());
        assert!(EventType::RenewalSuccessful.is_billable());
        assert!(!EventType::RenewalFailed.is_billable());
        assert!(!EventType::SubscriptionCancelled.is_billable());
    }
}
