// Inbound wire format: one JSON object per MQTT message, fully replacing
// any previous state (there is none to replace). Every field is optional
// on the wire and none is type-checked: each one stays a raw
// `serde_json::Value` so a wrong-typed value flows through to the
// outbound payload instead of rejecting the whole message. Counts render
// `0` and text fields render a placeholder downstream when absent.
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct VacancyNotification {
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub time: Value,
    #[serde(default)]
    pub count: Value,
    #[serde(default)]
    pub shared: Value,
    #[serde(default)]
    pub studio: Value,
    #[serde(default)]
    pub family: Value,
    #[serde(default)]
    pub addresses: Value,
}

//   TESTS
//
