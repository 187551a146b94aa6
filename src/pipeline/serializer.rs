// src/pipeline/serializer.rs
//! Wire JSON rendering for payloads and batches
//!
//! Batch format:
//!
//! ```text
//! {"events":[{"eventType":..,"payload":{..},"gameId":..,"playerId":..,
//!             "timestamp":..,"platform":..,"environment":..}, ...]}
//! ```
//!
//! The payload is rendered once at enqueue time and embedded raw.

use crate::pipeline::event::{Event, Payload};
use crate::utils::config::Environment;
use crate::utils::errors::Result;
use serde::Serialize;
use serde_json::value::{to_raw_value, RawValue};

/// Per-batch fields shared by every event
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub platform: String,
    pub environment: Environment,
}

#[derive(Serialize)]
struct WireBatch<'a> {
    events: Vec<WireEvent<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent<'a> {
    event_type: &'a str,
    payload: &'a RawValue,
    game_id: &'a str,
    player_id: &'a str,
    timestamp: i64,
    platform: &'a str,
    environment: Environment,
}

/// Render a payload to a JSON object (`{}` when absent)
pub fn serialize_payload(payload: Option<&Payload>) -> Result<Box<RawValue>> {
    match payload {
        Some(p) if !p.is_empty() => Ok(to_raw_value(p)?),
        _ => Ok(RawValue::from_string("{}".to_string())?),
    }
}

/// Render an ordered batch of events
pub fn serialize_batch(events: &[Event], game_id: &str, context: &BatchContext) -> Result<String> {
    let batch = WireBatch {
        events: events
            .iter()
            .map(|event| WireEvent {
                event_type: &event.event_type,
                payload: &event.payload,
                game_id,
                player_id: &event.player_id,
                timestamp: event.timestamp,
                platform: &context.platform,
                environment: context.environment,
            })
            .collect(),
    };

    Ok(serde_json::to_string(&batch)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn context() -> BatchContext {
        BatchContext {
            platform: "rust".to_string(),
            environment: Environment::Development,
        }
    }

    fn event(event_type: &str, payload: &Payload, timestamp: i64) -> Event {
        Event::new(
            event_type,
            serialize_payload(Some(payload)).unwrap(),
            timestamp,
            "player_1700000000_1234",
        )
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(serialize_payload(None).unwrap().get(), "{}");
        assert_eq!(serialize_payload(Some(&Payload::new())).unwrap().get(), "{}");
    }

    #[test]
    fn test_scalar_rendering() {
        let payload = Payload::new()
            .with("none", None::<i64>)
            .with("flag", true)
            .with("count", 42)
            .with("time", 12.5f32)
            .with("name", "boss");

        let raw = serialize_payload(Some(&payload)).unwrap();
        assert_eq!(
            raw.get(),
            r#"{"none":null,"flag":true,"count":42,"time":12.5,"name":"boss"}"#
        );
    }

    #[test]
    fn test_batch_round_trip() {
        let payload = Payload::new().with("level", "2-3").with("time", 30);
        let events = vec![event("level_start", &payload, 1_700_000_000), event("level_complete", &payload, 1_700_000_042)];

        let json = serialize_batch(&events, "game_77", &context()).unwrap();
        let decoded: Value = serde_json::from_str(&json).unwrap();

        let items = decoded["events"].as_array().unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first["eventType"], "level_start");
        assert_eq!(first["payload"]["level"], "2-3");
        assert_eq!(first["payload"]["time"], 30);
        assert_eq!(first["gameId"], "game_77");
        assert_eq!(first["playerId"], "player_1700000000_1234");
        assert_eq!(first["timestamp"], 1_700_000_000i64);
        assert_eq!(first["platform"], "rust");
        assert_eq!(first["environment"], "development");

        assert_eq!(items[1]["eventType"], "level_complete");
        assert_eq!(items[1]["timestamp"], 1_700_000_042i64);
    }

    #[test]
    fn test_field_order_on_the_wire() {
        let events = vec![event("boot", &Payload::new(), 5)];
        let json = serialize_batch(&events, "g", &context()).unwrap();
        assert_eq!(
            json,
            r#"{"events":[{"eventType":"boot","payload":{},"gameId":"g","playerId":"player_1700000000_1234","timestamp":5,"platform":"rust","environment":"development"}]}"#
        );
    }

    #[test]
    fn test_escaping_survives_decoding() {
        let tricky = "say \"hi\"\\path\nnext\r\tend\u{1}";
        let payload = Payload::new().with("msg", tricky).with(tricky, 1);
        let events = vec![event("quote\"type", &payload, 1)];

        let json = serialize_batch(&events, "g\\1", &context()).unwrap();
        assert!(json.contains(r#"say \"hi\"\\path\nnext\r\tend\u0001"#));

        let decoded: Value = serde_json::from_str(&json).unwrap();
        let item = &decoded["events"][0];
        assert_eq!(item["payload"]["msg"].as_str().unwrap(), tricky);
        assert_eq!(item["payload"][tricky], 1);
        assert_eq!(item["eventType"], "quote\"type");
        assert_eq!(item["gameId"], "g\\1");
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(serialize_batch(&[], "g", &context()).unwrap(), r#"{"events":[]}"#);
    }
}
