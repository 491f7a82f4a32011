use subsim_core::{EventType, Plan, SubscriptionEvent, SubscriptionStatus, SubscriptionSummary};

/// Roll one subscription timeline up into a summary row.
///
/// Returns `None` for an empty timeline.
pub fn summarize(events: &[SubscriptionEvent], plan: &Plan) -> Option<SubscriptionSummary> {
    let first = events.first()?;
    let last = events.last()?;

    let mut renewals_successful = 0;
    let mut renewals_failed = 0;
    let mut total_cents = 0_i64;
    let mut end_date = None;
    for event in events {
        match event.event_type {
            EventType::RenewalSuccessful => renewals_successful += 1,
            EventType::RenewalFailed => renewals_failed += 1,
            EventType::SubscriptionCancelled => end_date = Some(event.event_timestamp),
            EventType::SubscriptionCreated => {}
        }
        total_cents += (event.amount * 100.0).round() as i64;
    }

    let status = match last.event_type {
        EventType::SubscriptionCancelled => SubscriptionStatus::Cancelled,
        EventType::RenewalFailed => SubscriptionStatus::PastDue,
        _ => SubscriptionStatus::Active,
    };

    Some(SubscriptionSummary {
        subscription_id: first.subscription_id,
        plan_id: first.plan_id,
        user_id: first.user_id,
        provider_id: plan.provider_id,
        start_date: first.event_timestamp,
        end_date,
        status,
        renewals_successful,
        renewals_failed,
        total_billed: total_cents as f64 / 100.0,
        currency: first.currency,
    })
}
