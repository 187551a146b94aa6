// src/session/registration.rs
//! One-time game registration
//!
//! Posts `{"gameName","platform"}` to the collector and stores the returned
//! `game_id` in the session. Skipped while the session is in client role.
//! Retries are opt-in (`registration_max_retries`) with doubling backoff.

use crate::session::state::{GameId, Session};
use crate::transport::protocol::{RegisterRequest, RegisterResponse};
use crate::transport::Transport;
use crate::utils::errors::{Result, TokebiError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry policy for registration
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Outcome of a registration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Game id stored in the session
    Registered(String),

    /// Session is a multiplayer client
    Skipped,
}

/// Registers the game with the collector
pub struct Registrar {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    game_name: String,
    platform: String,
    retry: RetryPolicy,
}

impl Registrar {
    pub fn new(
        session: Arc<Session>,
        transport: Arc<dyn Transport>,
        game_name: impl Into<String>,
        platform: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            session,
            transport,
            game_name: game_name.into(),
            platform: platform.into(),
            retry,
        }
    }

    /// Run registration, retrying per policy
    pub async fn register(&self) -> Result<Registration> {
        let mut backoff = self.retry.initial_backoff.min(MAX_BACKOFF);
        let mut attempt = 0;

        loop {
            match self.register_once().await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    debug!(
                        "Registration attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, self.retry.max_retries, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn register_once(&self) -> Result<Registration> {
        if self.session.is_client() {
            return Ok(Registration::Skipped);
        }

        let body = RegisterRequest {
            game_name: &self.game_name,
            platform: &self.platform,
        }
        .to_json()?;

        let response = self.transport.register_game(body).await?;
        let game_id = RegisterResponse::parse(&response)?.game_id()?;

        if self.session.complete_registration(game_id.clone()) {
            info!("Game registered! ID: {}", game_id);
            return Ok(Registration::Registered(game_id));
        }

        // Role switched or another registration landed while we were waiting
        match self.session.game_id() {
            GameId::NoTrack => Ok(Registration::Skipped),
            GameId::Registered(existing) => Ok(Registration::Registered(existing)),
            GameId::Unregistered => Err(TokebiError::RegistrationFailed(
                "Game id was not stored".to_string(),
            )),
        }
    }

    /// Register in the background, logging failures
    pub fn spawn(self: &Arc<Self>, runtime: &tokio::runtime::Handle) -> tokio::task::JoinHandle<()> {
        let registrar = Arc::clone(self);
        runtime.spawn(async move {
            match registrar.register().await {
                Ok(Registration::Registered(_)) => {}
                Ok(Registration::Skipped) => debug!("Registration skipped (client mode)"),
                Err(e) => warn!("Registration failed: {}", e),
            }
        })
    }
}
