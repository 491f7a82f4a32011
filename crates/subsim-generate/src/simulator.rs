//! Per-subscription lifecycle simulation.
//!
//! A subscription starts at a random date, then renews every billing period
//! until it either reaches the horizon or a failed renewal turns into a
//! cancellation. Each period draws two independent outcomes: whether the
//! renewal fails, and, if it did, whether the subscriber churns.

use chrono::{Duration, Months, NaiveDateTime};
use tracing::trace;
use uuid::Uuid;

use subsim_core::{
    BillingFrequency, EventType, Plan, SubscriptionEvent, SubscriptionState, User,
    validate_timeline,
};

use crate::errors::GenerationError;
use crate::model::GenerateOptions;
use crate::sampling::Sampling;

/// Earliest start, in months before the horizon.
const START_WINDOW_OPEN_MONTHS: u32 = 24;
/// Latest start, in months before the horizon.
const START_WINDOW_CLOSE_MONTHS: u32 = 2;

/// Probabilities and lag driving lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleRates {
    pub failure_rate: f64,
    pub cancellation_rate: f64,
    pub cancellation_lag: Duration,
}

impl Default for LifecycleRates {
    fn default() -> Self {
        Self {
            failure_rate: 0.10,
            cancellation_rate: 0.50,
            cancellation_lag: Duration::days(7),
        }
    }
}

impl From<&GenerateOptions> for LifecycleRates {
    fn from(options: &GenerateOptions) -> Self {
        Self {
            failure_rate: options.failure_rate,
            cancellation_rate: options.cancellation_rate,
            cancellation_lag: options.cancellation_lag(),
        }
    }
}

/// Two-state lifecycle machine with a single billing timer.
#[derive(Debug, Clone)]
pub struct SubscriptionMachine {
    state: SubscriptionState,
    current_date: NaiveDateTime,
    horizon: NaiveDateTime,
    period: Duration,
}

impl SubscriptionMachine {
    pub fn new(
        start: NaiveDateTime,
        horizon: NaiveDateTime,
        frequency: BillingFrequency,
    ) -> Self {
        Self {
            state: SubscriptionState::Active,
            current_date: start,
            horizon,
            period: frequency.period(),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn current_date(&self) -> NaiveDateTime {
        self.current_date
    }

    /// Move the timer to the next billing boundary.
    ///
    /// Returns the boundary when a renewal is due there, or `None` once the
    /// subscription is cancelled or the boundary falls past the horizon
    /// (or past the end of the calendar).
    pub fn next_renewal(&mut self) -> Option<NaiveDateTime> {
        if self.state != SubscriptionState::Active || self.current_date >= self.horizon {
            return None;
        }
        let next = self.current_date.checked_add_signed(self.period)?;
        self.current_date = next;
        (next <= self.horizon).then_some(next)
    }

    /// Enter the terminal state; returns when the cancellation is recorded,
    /// or `None` if that instant is not representable.
    ///
    /// The returned instant may lie past the horizon.
    pub fn cancel(&mut self, lag: Duration) -> Option<NaiveDateTime> {
        self.state = SubscriptionState::Cancelled;
        self.current_date.checked_add_signed(lag)
    }
}

/// Generates subscription timelines.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    rates: LifecycleRates,
}

impl Simulator {
    pub fn new(rates: LifecycleRates) -> Self {
        Self { rates }
    }

    /// Window subscription start dates are drawn from, or `None` when it
    /// would start before the earliest representable date.
    pub fn start_window(horizon: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let earliest = horizon.checked_sub_months(Months::new(START_WINDOW_OPEN_MONTHS))?;
        let latest = horizon.checked_sub_months(Months::new(START_WINDOW_CLOSE_MONTHS))?;
        Some((earliest, latest))
    }

    /// Simulate one subscription with a random start date.
    pub fn simulate<S: Sampling>(
        &self,
        plan: &Plan,
        user: &User,
        horizon: NaiveDateTime,
        sampler: &mut S,
    ) -> Result<Vec<SubscriptionEvent>, GenerationError> {
        let (earliest, latest) = Self::start_window(horizon).ok_or_else(|| {
            GenerationError::Configuration(format!("horizon {horizon} is out of range"))
        })?;
        let start = sampler.date_between(earliest, latest);
        self.simulate_from(plan, user, start, horizon, sampler)
    }

    /// Simulate one subscription starting at `start`.
    ///
    /// The timeline is checked against the event-log invariants before it is
    /// returned; a violation is reported as `GenerationError::Consistency`.
    pub fn simulate_from<S: Sampling>(
        &self,
        plan: &Plan,
        user: &User,
        start: NaiveDateTime,
        horizon: NaiveDateTime,
        sampler: &mut S,
    ) -> Result<Vec<SubscriptionEvent>, GenerationError> {
        let mut timeline = Timeline {
            subscription_id: sampler.uuid(),
            plan,
            user,
            events: Vec::new(),
        };
        timeline.emit(sampler, EventType::SubscriptionCreated, start);

        let mut machine = SubscriptionMachine::new(start, horizon, plan.billing_frequency);
        while let Some(due) = machine.next_renewal() {
            if !sampler.bernoulli(self.rates.failure_rate) {
                timeline.emit(sampler, EventType::RenewalSuccessful, due);
                continue;
            }
            timeline.emit(sampler, EventType::RenewalFailed, due);
            if sampler.bernoulli(self.rates.cancellation_rate) {
                let cancelled_at = machine.cancel(self.rates.cancellation_lag).ok_or_else(|| {
                    GenerationError::Consistency {
                        subscription_id: timeline.subscription_id,
                        message: format!("cancellation after {due} overflows the calendar"),
                    }
                })?;
                timeline.emit(sampler, EventType::SubscriptionCancelled, cancelled_at);
            }
        }

        trace!(
            subscription_id = %timeline.subscription_id,
            events = timeline.events.len(),
            state = ?machine.state(),
            "subscription simulated"
        );

        validate_timeline(&timeline.events, plan, horizon, self.rates.cancellation_lag)?;
        Ok(timeline.events)
    }
}

struct Timeline<'a> {
    subscription_id: Uuid,
    plan: &'a Plan,
    user: &'a User,
    events: Vec<SubscriptionEvent>,
}

impl Timeline<'_> {
    fn emit<S: Sampling>(&mut self, sampler: &mut S, event_type: EventType, at: NaiveDateTime) {
        let amount = if event_type.is_billable() {
            self.plan.price
        } else {
            0.0
        };
        self.events.push(SubscriptionEvent {
            event_id: sampler.uuid(),
            subscription_id: self.subscription_id,
            plan_id: self.plan.plan_id,
            user_id: self.user.user_id,
            event_type,
            event_timestamp: at,
            amount,
            currency: self.plan.currency,
        });
    }
}
