use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::records::{Plan, SubscriptionEvent};
use crate::types::EventType;

/// Validate a single subscription timeline against the event-log invariants.
///
/// This checks:
/// - exactly one `subscription_created`, and it comes first
/// - renewals land on the plan's period grid and never past `horizon`
/// - at most one `subscription_cancelled`, last, exactly `cancellation_lag`
///   after a `renewal_failed`
/// - amounts are the plan price for billable events and zero otherwise
/// - plan, user and currency never change within the timeline
pub fn validate_timeline(
    events: &[SubscriptionEvent],
    plan: &Plan,
    horizon: NaiveDateTime,
    cancellation_lag: Duration,
) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(Error::Consistency {
            subscription_id: Uuid::nil(),
            message: "timeline is empty".to_string(),
        });
    };
    let subscription_id = first.subscription_id;
    let fail = |message: String| Error::Consistency {
        subscription_id,
        message,
    };

    if first.event_type != EventType::SubscriptionCreated {
        return Err(fail(format!(
            "first event is {} instead of subscription_created",
            first.event_type
        )));
    }
    if first.event_timestamp > horizon {
        return Err(fail("subscription created after the horizon".to_string()));
    }

    let period = plan.billing_frequency.period();
    let mut expected_tick = first.event_timestamp;
    let mut previous: Option<&SubscriptionEvent> = None;

    for (index, event) in events.iter().enumerate() {
        if event.subscription_id != subscription_id {
            return Err(fail(format!(
                "event {} belongs to subscription {}",
                event.event_id, event.subscription_id
            )));
        }
        if event.plan_id != plan.plan_id || event.plan_id != first.plan_id {
            return Err(fail(format!("event {} changes plan", event.event_id)));
        }
        if event.user_id != first.user_id {
            return Err(fail(format!("event {} changes user", event.event_id)));
        }
        if event.currency != plan.currency {
            return Err(fail(format!("event {} changes currency", event.event_id)));
        }

        let expected_amount = if event.event_type.is_billable() {
            plan.price
        } else {
            0.0
        };
        if event.amount != expected_amount {
            return Err(fail(format!(
                "{} event {} has amount {} (expected {})",
                event.event_type, event.event_id, event.amount, expected_amount
            )));
        }

        if let Some(prev) = previous {
            if event.event_timestamp < prev.event_timestamp {
                return Err(fail(format!("event {} is out of order", event.event_id)));
            }
        }

        match event.event_type {
            EventType::SubscriptionCreated => {
                if index != 0 {
                    return Err(fail("duplicate subscription_created event".to_string()));
                }
            }
            EventType::RenewalSuccessful | EventType::RenewalFailed => {
                expected_tick = expected_tick.checked_add_signed(period).ok_or_else(|| {
                    fail(format!("renewal {} overflows the calendar", event.event_id))
                })?;
                if event.event_timestamp != expected_tick {
                    return Err(fail(format!(
                        "renewal {} at {} is off the billing schedule (expected {})",
                        event.event_id, event.event_timestamp, expected_tick
                    )));
                }
                if event.event_timestamp > horizon {
                    return Err(fail(format!(
                        "renewal {} is past the horizon",
                        event.event_id
                    )));
                }
            }
            EventType::SubscriptionCancelled => {
                if index + 1 != events.len() {
                    return Err(fail("subscription_cancelled is not the last event".to_string()));
                }
                let Some(prev) = previous.filter(|prev| prev.event_type == EventType::RenewalFailed)
                else {
                    return Err(fail(
                        "subscription_cancelled is not preceded by renewal_failed".to_string(),
                    ));
                };
                if event.event_timestamp - prev.event_timestamp != cancellation_lag {
                    return Err(fail(format!(
                        "cancellation lag is {} seconds (expected {})",
                        (event.event_timestamp - prev.event_timestamp).num_seconds(),
                        cancellation_lag.num_seconds()
                    )));
                }
            }
        }

        previous = Some(event);
    }

    Ok(())
}
