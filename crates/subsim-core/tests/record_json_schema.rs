use schemars::schema_for;
use subsim_core::{Plan, SubscriptionEvent};

fn property_names(schema: &serde_json::Value) -> Vec<String> {
    schema
        .get("properties")
        .and_then(|value| value.as_object())
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn event_json_schema_lists_every_field() {
    let generated = schema_for!(SubscriptionEvent);
    let json = serde_json::to_value(&generated).expect("serialize generated schema");

    let mut names = property_names(&json);
    names.sort();
    assert_eq!(
        names,
        vec![
            "amount",
            "currency",
            "event_id",
            "event_timestamp",
            "event_type",
            "plan_id",
            "subscription_id",
            "user_id",
        ]
    );

    let event_types = json
        .pointer("/definitions/EventType/enum")
        .and_then(|value| value.as_array())
        .expect("event type enum");
    assert_eq!(event_types.len(), 4);
}

#[test]
fn plan_json_schema_constrains_frequency() {
    let generated = schema_for!(Plan);
    let json = serde_json::to_value(&generated).expect("serialize generated schema");
    let frequencies = json
        .pointer("/definitions/BillingFrequency/enum")
        .and_then(|value| value.as_array())
        .expect("billing frequency enum");
    let values: Vec<&str> = frequencies.iter().filter_map(|v| v.as_str()).collect();
    assert_eq!(values, vec!["monthly", "quarterly", "annual"]);
}
