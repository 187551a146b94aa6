// src/main.rs
//! tokebi-track
//!
//! Sends one event to the configured collector and waits for delivery.
//! Handy for checking an API key and endpoint from a shell:
//!
//! ```text
//! TOKEBI_API_KEY=... tokebi-track level_start level=1-1 attempts=3 hard=true
//! ```

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokebi::observability::init_tracing;
use tokebi::{Payload, PayloadValue, SdkConfig, TokebiClient};
use tracing::info;

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(std::env::var_os("TOKEBI_LOG_JSON").is_some())?;

    let mut args = std::env::args().skip(1);
    let event_type = match args.next() {
        Some(event_type) => event_type,
        None => bail!("usage: tokebi-track <event_type> [key=value ...]"),
    };
    let payload = parse_payload(args)?;

    let config = SdkConfig::load().context("Failed to load configuration")?;
    info!("Collector: {}", config.base_url);

    let client = TokebiClient::start(config)?;
    if !client.is_enabled() {
        bail!("TOKEBI_API_KEY is not set");
    }

    if !client.wait_until_registered(REGISTRATION_TIMEOUT).await {
        bail!("Game registration did not complete within {:?}", REGISTRATION_TIMEOUT);
    }

    client.track(&event_type, Some(payload), false);
    client.flush_now().await;

    let stats = client.stats();
    info!(
        "Done: {} batch(es) sent, {} failed, avg send {} ms",
        stats.delivery.batches_sent,
        stats.delivery.batches_failed,
        stats.delivery.avg_send_time_ms()
    );

    if stats.delivery.batches_failed > 0 {
        bail!("Delivery failed");
    }
    Ok(())
}

fn parse_payload(args: impl Iterator<Item = String>) -> Result<Payload> {
    let mut payload = Payload::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .with_context(|| format!("Expected key=value, got {:?}", arg))?;
        payload.insert(key, parse_value(value));
    }
    Ok(payload)
}

fn parse_value(raw: &str) -> PayloadValue {
    match raw {
        "null" => PayloadValue::Null,
        "true" => PayloadValue::Bool(true),
        "false" => PayloadValue::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(PayloadValue::Int)
            .or_else(|_| raw.parse::<f64>().map(PayloadValue::Float))
            .unwrap_or_else(|_| PayloadValue::Text(raw.to_string())),
    }
}
