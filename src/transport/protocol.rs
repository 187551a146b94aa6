// src/transport/protocol.rs
//! Collector request/response bodies

use crate::utils::errors::{Result, TokebiError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registration endpoint
pub const GAMES_PATH: &str = "/api/games";

/// Batch endpoint
pub const TRACK_PATH: &str = "/api/track";

/// Body of `POST /api/games`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub game_name: &'a str,
    pub platform: &'a str,
}

impl RegisterRequest<'_> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Response of `POST /api/games`
///
/// Only `game_id` is read; it may arrive as a string or a number.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub game_id: Option<Value>,
}

impl RegisterResponse {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| {
            TokebiError::RegistrationFailed(format!("Malformed registration response: {}", e))
        })
    }

    /// Extract a non-empty game id
    pub fn game_id(&self) -> Result<String> {
        let id = match &self.game_id {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(TokebiError::RegistrationFailed(format!(
                    "Unexpected game_id value: {}",
                    other
                )))
            }
            None => String::new(),
        };

        if id.is_empty() {
            return Err(TokebiError::RegistrationFailed(
                "Response carries no game_id".to_string(),
            ));
        }
        Ok(id)
    }
}
