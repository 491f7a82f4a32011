use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use subsim_core::{EventType, Plan, SubscriptionEvent, validate_timeline};
use subsim_generate::{Dataset, GenerateOptions, GenerationEngine, GenerationError};

fn horizon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 31)
        .and_then(|date| date.and_hms_opt(18, 0, 0))
        .expect("valid horizon")
}

fn dataset(seed: u64) -> Dataset {
    let options = GenerateOptions {
        seed,
        horizon: Some(horizon()),
        providers: 3,
        plans_per_provider: 4,
        users: 40,
        subscriptions: 300,
        // Churn-heavy rates exercise every branch of the lifecycle.
        failure_rate: 0.35,
        cancellation_rate: 0.4,
        ..GenerateOptions::default()
    };
    GenerationEngine::new(options)
        .generate(horizon())
        .expect("generate dataset")
}

fn timelines(dataset: &Dataset) -> Vec<Vec<&SubscriptionEvent>> {
    let mut order = Vec::new();
    let mut groups: HashMap<Uuid, Vec<&SubscriptionEvent>> = HashMap::new();
    for event in &dataset.events {
        if !groups.contains_key(&event.subscription_id) {
            order.push(event.subscription_id);
        }
        groups.entry(event.subscription_id).or_default().push(event);
    }
    order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .map(|mut events| {
            events.sort_by_key(|event| event.event_timestamp);
            events
        })
        .collect()
}

fn plan_for<'a>(dataset: &'a Dataset, plan_id: Uuid) -> &'a Plan {
    dataset
        .plans
        .iter()
        .find(|plan| plan.plan_id == plan_id)
        .expect("event references a known plan")
}

#[test]
fn every_timeline_satisfies_event_log_invariants() {
    let dataset = dataset(11);
    let timelines = timelines(&dataset);
    assert_eq!(timelines.len(), 300);

    for events in &timelines {
        let owned: Vec<SubscriptionEvent> = events.iter().map(|e| (*e).clone()).collect();
        let plan = plan_for(&dataset, owned[0].plan_id);
        validate_timeline(&owned, plan, horizon(), Duration::days(7)).expect("valid timeline");

        let created = owned
            .iter()
            .filter(|e| e.event_type == EventType::SubscriptionCreated)
            .count();
        assert_eq!(created, 1);
        assert_eq!(owned[0].event_type, EventType::SubscriptionCreated);
    }
}

#[test]
fn amounts_match_plan_price_only_for_billable_events() {
    let dataset = dataset(12);
    for event in &dataset.events {
        let plan = plan_for(&dataset, event.plan_id);
        match event.event_type {
            EventType::SubscriptionCreated | EventType::RenewalSuccessful => {
                assert_eq!(event.amount, plan.price)
            }
            EventType::RenewalFailed | EventType::SubscriptionCancelled => {
                assert_eq!(event.amount, 0.0)
            }
        }
        assert_eq!(event.currency, plan.currency);
    }
}

#[test]
fn cancellations_trail_a_failure_by_seven_days() {
    let dataset = dataset(13);
    let mut cancellations = 0;
    for events in timelines(&dataset) {
        for pair in events.windows(2) {
            if pair[1].event_type == EventType::SubscriptionCancelled {
                cancellations += 1;
                assert_eq!(pair[0].event_type, EventType::RenewalFailed);
                assert_eq!(
                    pair[1].event_timestamp - pair[0].event_timestamp,
                    Duration::days(7)
                );
            }
        }
    }
    assert!(cancellations > 0, "churn-heavy rates should cancel something");
}

#[test]
fn renewals_never_pass_the_horizon() {
    let dataset = dataset(14);
    for event in &dataset.events {
        match event.event_type {
            EventType::SubscriptionCancelled => {
                assert!(event.event_timestamp <= horizon() + Duration::days(7))
            }
            _ => assert!(event.event_timestamp <= horizon()),
        }
    }
}

#[test]
fn identical_seed_gives_identical_events() {
    let a = dataset(21);
    let b = dataset(21);
    assert_eq!(a.events, b.events);
    assert_eq!(a.users, b.users);

    let c = dataset(22);
    assert_ne!(a.events, c.events);
}

#[test]
fn summaries_agree_with_events() {
    let dataset = dataset(15);
    assert_eq!(dataset.subscriptions.len(), 300);
    for (summary, events) in dataset.subscriptions.iter().zip(timelines(&dataset)) {
        assert_eq!(summary.subscription_id, events[0].subscription_id);
        let cancelled = events
            .iter()
            .find(|e| e.event_type == EventType::SubscriptionCancelled)
            .map(|e| e.event_timestamp);
        assert_eq!(summary.end_date, cancelled);
        let plan = plan_for(&dataset, summary.plan_id);
        assert_eq!(summary.provider_id, plan.provider_id);
    }
}

#[test]
fn horizons_at_calendar_edges_are_configuration_errors() {
    let engine = GenerationEngine::new(GenerateOptions {
        subscriptions: 10,
        ..GenerateOptions::default()
    });
    for horizon in [NaiveDateTime::MAX, NaiveDateTime::MIN + Duration::days(30)] {
        let err = engine.generate(horizon).expect_err("edge horizon rejected");
        assert!(matches!(err, GenerationError::Configuration(_)), "{err}");
    }
}
