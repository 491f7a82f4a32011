use schemars::schema_for;
use subsim_core::SubscriptionEvent;

fn main() {
    let schema = schema_for!(SubscriptionEvent);
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
