use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::info;

use subsim_core::{BillingFrequency, Currency, Plan, Provider, User};

use crate::cosmetics;
use crate::errors::GenerationError;
use crate::model::GenerateOptions;
use crate::sampling::{Sampler, Sampling};

/// Sizes and enumerations a reference pool is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub providers: u32,
    pub plans_per_provider: u32,
    pub users: u32,
    pub currencies: Vec<Currency>,
    pub billing_frequencies: Vec<BillingFrequency>,
}

impl From<&GenerateOptions> for PoolConfig {
    fn from(options: &GenerateOptions) -> Self {
        Self {
            providers: options.providers,
            plans_per_provider: options.plans_per_provider,
            users: options.users,
            currencies: options.currencies.clone(),
            billing_frequencies: options.billing_frequencies.clone(),
        }
    }
}

impl PoolConfig {
    fn validate(&self) -> Result<(), GenerationError> {
        if self.providers == 0 {
            return Err(empty_pool("providers"));
        }
        if self.plans_per_provider == 0 {
            return Err(empty_pool("plans_per_provider"));
        }
        if self.users == 0 {
            return Err(empty_pool("users"));
        }
        if self.currencies.is_empty() {
            return Err(empty_pool("currencies"));
        }
        if self.billing_frequencies.is_empty() {
            return Err(empty_pool("billing_frequencies"));
        }
        Ok(())
    }
}

/// Immutable providers, plans and users the simulator draws foreign keys from.
#[derive(Debug, Clone)]
pub struct ReferencePool {
    providers: Vec<Provider>,
    plans: Vec<Plan>,
    users: Vec<User>,
}

impl ReferencePool {
    /// Build all pools from dedicated streams of `seed`.
    ///
    /// Reference `created_at` values fall between the start of the
    /// horizon's decade and the horizon.
    pub fn build(
        config: &PoolConfig,
        seed: u64,
        horizon: NaiveDateTime,
    ) -> Result<Self, GenerationError> {
        config.validate()?;
        let decade_start = decade_start(horizon);

        let mut rng = Sampler::derive(seed, "providers");
        let providers: Vec<Provider> = (1..=config.providers)
            .map(|provider_id| Provider {
                provider_id,
                name: cosmetics::company_name(&mut rng),
                api_key: cosmetics::api_key(&mut rng),
                created_at: rng.date_between(decade_start, horizon),
            })
            .collect();

        let mut rng = Sampler::derive(seed, "plans");
        let mut plans = Vec::with_capacity(providers.len() * config.plans_per_provider as usize);
        for provider in &providers {
            for _ in 0..config.plans_per_provider {
                let billing_frequency = *rng
                    .pick(&config.billing_frequencies)
                    .ok_or_else(|| empty_pool("billing_frequencies"))?;
                let (low, high) = billing_frequency.price_range();
                let price = round_cents(rng.uniform(low, high));
                let currency = *rng
                    .pick(&config.currencies)
                    .ok_or_else(|| empty_pool("currencies"))?;
                plans.push(Plan {
                    plan_id: rng.uuid(),
                    provider_id: provider.provider_id,
                    name: cosmetics::plan_name(&mut rng),
                    price,
                    currency,
                    billing_frequency,
                    features: cosmetics::features(&mut rng),
                    created_at: rng.date_between(decade_start, horizon),
                });
            }
        }

        let mut rng = Sampler::derive(seed, "users");
        let users: Vec<User> = (0..config.users as usize)
            .map(|index| {
                let currency = config.currencies[index % config.currencies.len()];
                let (locale, country) = cosmetics::region_for(currency);
                let contact = cosmetics::contact(locale, &mut rng);
                User {
                    user_id: rng.uuid(),
                    name: contact.name,
                    email: contact.email,
                    phone: contact.phone,
                    city: contact.city,
                    country: country.to_string(),
                    created_at: rng.date_between(decade_start, horizon),
                }
            })
            .collect();

        info!(
            providers = providers.len(),
            plans = plans.len(),
            users = users.len(),
            "reference pool built"
        );

        Self::from_parts(providers, plans, users)
    }

    /// Assemble a pool from existing records, checking it is usable.
    pub fn from_parts(
        providers: Vec<Provider>,
        plans: Vec<Plan>,
        users: Vec<User>,
    ) -> Result<Self, GenerationError> {
        if providers.is_empty() {
            return Err(empty_pool("providers"));
        }
        if plans.is_empty() {
            return Err(empty_pool("plans"));
        }
        if users.is_empty() {
            return Err(empty_pool("users"));
        }
        for plan in &plans {
            if !providers
                .iter()
                .any(|provider| provider.provider_id == plan.provider_id)
            {
                return Err(GenerationError::Configuration(format!(
                    "plan {} references unknown provider {}",
                    plan.plan_id, plan.provider_id
                )));
            }
            if plan.price.is_nan() || plan.price <= 0.0 {
                return Err(GenerationError::Configuration(format!(
                    "plan {} has non-positive price {}",
                    plan.plan_id, plan.price
                )));
            }
        }
        Ok(Self {
            providers,
            plans,
            users,
        })
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn pick_plan<S: Sampling>(&self, sampler: &mut S) -> Result<&Plan, GenerationError> {
        sampler.pick(&self.plans).ok_or_else(|| empty_pool("plans"))
    }

    pub fn pick_user<S: Sampling>(&self, sampler: &mut S) -> Result<&User, GenerationError> {
        sampler.pick(&self.users).ok_or_else(|| empty_pool("users"))
    }
}

fn empty_pool(name: &str) -> GenerationError {
    GenerationError::Configuration(format!("{name} must not be empty"))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn decade_start(horizon: NaiveDateTime) -> NaiveDateTime {
    let year = horizon.year() - horizon.year().rem_euclid(10);
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(horizon)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn horizon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid horizon")
    }

    fn config() -> PoolConfig {
        PoolConfig::from(&GenerateOptions {
            providers: 3,
            plans_per_provider: 4,
            users: 9,
            ..GenerateOptions::default()
        })
    }

    #[test]
    fn builds_requested_sizes_with_valid_foreign_keys() {
        let pool = ReferencePool::build(&config(), 1, horizon()).expect("build pool");
        assert_eq!(pool.providers().len(), 3);
        assert_eq!(pool.plans().len(), 12);
        assert_eq!(pool.users().len(), 9);

        let ids: Vec<u32> = pool.providers().iter().map(|p| p.provider_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        for plan in pool.plans() {
            assert!(ids.contains(&plan.provider_id));
        }
        let plan_ids: HashSet<_> = pool.plans().iter().map(|p| p.plan_id).collect();
        assert_eq!(plan_ids.len(), 12);
    }

    #[test]
    fn plan_prices_follow_frequency_ranges() {
        let pool = ReferencePool::build(&config(), 2, horizon()).expect("build pool");
        for plan in pool.plans() {
            let (low, high) = plan.billing_frequency.price_range();
            assert!(plan.price >= low && plan.price <= high, "price {}", plan.price);
            assert_eq!(round_cents(plan.price), plan.price);
        }
    }

    #[test]
    fn users_cycle_through_currency_regions() {
        let pool = ReferencePool::build(&config(), 3, horizon()).expect("build pool");
        let countries: Vec<&str> = pool.users().iter().map(|u| u.country.as_str()).collect();
        assert_eq!(&countries[..3], &["United States", "France", "United Kingdom"]);
        assert_eq!(countries[3], "United States");
    }

    #[test]
    fn created_at_falls_within_the_decade() {
        let pool = ReferencePool::build(&config(), 4, horizon()).expect("build pool");
        let start = decade_start(horizon());
        assert_eq!(start.year(), 2020);
        for user in pool.users() {
            assert!(user.created_at >= start && user.created_at <= horizon());
        }
    }

    #[test]
    fn rejects_empty_pools() {
        let mut config = config();
        config.users = 0;
        let result = ReferencePool::build(&config, 1, horizon());
        assert!(matches!(result, Err(GenerationError::Configuration(_))));

        let result = ReferencePool::from_parts(Vec::new(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(GenerationError::Configuration(_))));
    }

    #[test]
    fn same_seed_builds_identical_pools() {
        let a = ReferencePool::build(&config(), 5, horizon()).expect("build pool");
        let b = ReferencePool::build(&config(), 5, horizon()).expect("build pool");
        assert_eq!(a.plans(), b.plans());
        assert_eq!(a.users(), b.users());
        assert_eq!(a.providers(), b.providers());
    }
}
