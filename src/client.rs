// src/client.rs
//! Tracking facade
//!
//! `TokebiClient` is the handle application code owns. Every method is
//! infallible from the caller's point of view: failures are logged and the
//! call degrades to a no-op, so instrumentation never affects the host.
//!
//! The client must be started inside a Tokio runtime; registration, the
//! flush timer and batch sends run as tasks on that runtime, while
//! `track` itself never awaits and may be called from any thread.

use crate::observability::EVENTS_QUEUED;
use crate::pipeline::event::{Event, Payload};
use crate::pipeline::event_queue::{EventQueue, QueueStats};
use crate::pipeline::scheduler::{
    DeliveryStats, FlushOutcome, FlushScheduler, FlushState, FlushTrigger, SchedulerConfig,
};
use crate::pipeline::serializer::{serialize_payload, BatchContext};
use crate::session::identity::IdentityStore;
use crate::session::registration::{Registrar, Registration, RetryPolicy};
use crate::session::state::{GameId, RoleChange, Session, TrackGate};
use crate::transport::{HttpTransport, Transport};
use crate::utils::config::SdkConfig;
use crate::utils::errors::{Result, TokebiError};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Combined client statistics
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    pub queue: QueueStats,
    pub delivery: DeliveryStats,
}

/// Analytics client
pub struct TokebiClient {
    config: SdkConfig,
    enabled: bool,
    session: Arc<Session>,
    queue: Arc<EventQueue>,
    scheduler: Arc<FlushScheduler>,
    registrar: Arc<Registrar>,
    runtime: Handle,
    timer: Option<JoinHandle<()>>,
}

impl TokebiClient {
    /// Start a client talking HTTP to `config.base_url`
    pub fn start(config: SdkConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Start a client over a custom transport
    ///
    /// Resolves the player id, then (with an API key) kicks off registration
    /// and the flush timer. Without an API key the client is inert.
    pub fn with_transport(config: SdkConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            TokebiError::ConfigError(format!("TokebiClient needs a Tokio runtime: {}", e))
        })?;

        let build = crate::BuildInfo::current();
        info!("Initializing Tokebi SDK v{} (batched)", build.version);
        debug!("Build: {} ({})", build.git_hash, build.rustc_version);
        info!("Game Name: {}", config.game_name);
        info!("Environment: {}", config.environment.as_str());

        let player_id = IdentityStore::new(config.player_id_path()).get_or_create_player_id();
        info!("Player ID: {}", player_id);

        let session = Arc::new(Session::new(player_id));
        let queue = Arc::new(EventQueue::new(config.max_queue_size, config.eviction_chunk));

        let scheduler = Arc::new(FlushScheduler::new(
            Arc::clone(&queue),
            Arc::clone(&session),
            Arc::clone(&transport),
            SchedulerConfig {
                max_batch_size: config.max_batch_size,
                flush_interval: config.flush_interval(),
                context: BatchContext {
                    platform: config.platform.clone(),
                    environment: config.environment,
                },
            },
            runtime.clone(),
        ));

        let registrar = Arc::new(Registrar::new(
            Arc::clone(&session),
            transport,
            config.game_name.clone(),
            config.platform.clone(),
            RetryPolicy {
                max_retries: config.registration_max_retries,
                initial_backoff: config.registration_backoff(),
            },
        ));

        let enabled = !config.api_key.trim().is_empty();
        let mut client = Self {
            config,
            enabled,
            session,
            queue,
            scheduler,
            registrar,
            runtime,
            timer: None,
        };

        if !enabled {
            error!("API key not set! Tracking is disabled for this session.");
            return Ok(client);
        }

        info!("Mode: Single Player (default)");
        debug!("Call set_role(true) on multiplayer clients to stop tracking");

        client.registrar.spawn(&client.runtime);
        client.timer = Some(client.scheduler.spawn_timer());

        Ok(client)
    }

    /// Queue an event
    ///
    /// No-op while unregistered, or in client role unless `force_track`.
    /// Reaching the batch size starts a flush immediately.
    pub fn track(&self, event_type: &str, payload: Option<Payload>, force_track: bool) {
        if !self.enabled {
            return;
        }

        match self.session.gate(force_track) {
            TrackGate::Accept => {}
            TrackGate::SkipClient => {
                debug!("Skipping (client): {}", event_type);
                return;
            }
            TrackGate::NotReady => return,
        }

        if event_type.is_empty() {
            warn!("Ignoring event with an empty type");
            return;
        }

        let payload = match serialize_payload(payload.as_ref()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Dropping {}: {}", event_type, e);
                return;
            }
        };

        let event = Event::new(
            event_type,
            payload,
            chrono::Utc::now().timestamp(),
            self.session.player_id(),
        );

        let outcome = self.queue.push(event);
        metrics::counter!(EVENTS_QUEUED).increment(1);
        debug!("Queued: {} (Queue: {})", event_type, outcome.len);

        if outcome.len >= self.scheduler.max_batch_size() {
            self.scheduler.trigger(FlushTrigger::Threshold);
        }
    }

    /// `level_start` with the level name
    pub fn track_level_start(&self, level: &str) {
        let payload = Payload::new().with("level", level);
        self.track("level_start", Some(payload), false);
    }

    /// `level_complete` with the level name and time taken (seconds)
    pub fn track_level_complete(&self, level: &str, seconds: f32) {
        let payload = Payload::new().with("level", level).with("time", seconds);
        self.track("level_complete", Some(payload), false);
    }

    /// Track even in multiplayer client role
    pub fn track_client_event(&self, event_type: &str, payload: Option<Payload>) {
        self.track(event_type, payload, true);
    }

    /// Switch multiplayer role
    ///
    /// Client role stops tracking (queued events stay queued). Returning to
    /// host role re-runs registration.
    pub fn set_role(&self, is_client: bool) {
        match self.session.set_role(is_client) {
            RoleChange::BecameClient => info!("Mode: Multiplayer Client - Will NOT track"),
            RoleChange::NeedsRegistration => {
                info!("Mode: Multiplayer Host/Server - Will track");
                if self.enabled {
                    self.registrar.spawn(&self.runtime);
                }
            }
            RoleChange::Unchanged => debug!("Role unchanged (client: {})", is_client),
        }
    }

    /// Run registration now and wait for the result
    pub async fn register(&self) -> Result<Registration> {
        if !self.enabled {
            return Err(TokebiError::ConfigError("API key not set".to_string()));
        }
        self.registrar.register().await
    }

    /// Wait until a game id is registered
    pub async fn wait_until_registered(&self, timeout: Duration) -> bool {
        self.session.wait_until_ready(timeout).await
    }

    /// Start a flush cycle if events are queued (does not wait)
    pub fn flush(&self) {
        self.trigger(FlushTrigger::Manual);
    }

    /// Flush and wait until the queue is drained
    pub async fn flush_now(&self) {
        if self.enabled {
            self.scheduler.flush_now().await;
        }
    }

    /// Host application paused
    pub fn on_pause(&self, paused: bool) {
        if paused {
            self.trigger(FlushTrigger::Lifecycle);
        }
    }

    /// Host application gained or lost focus
    pub fn on_focus_changed(&self, has_focus: bool) {
        if !has_focus {
            self.trigger(FlushTrigger::Lifecycle);
        }
    }

    /// Host component is being torn down
    ///
    /// Stops the timer and fires a last flush without waiting for it.
    pub fn on_destroy(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            self.trigger(FlushTrigger::Lifecycle);
        }
    }

    fn trigger(&self, trigger: FlushTrigger) -> FlushOutcome {
        if !self.enabled {
            return FlushOutcome::Empty;
        }
        self.scheduler.trigger(trigger)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn player_id(&self) -> &str {
        self.session.player_id()
    }

    pub fn game_id(&self) -> GameId {
        self.session.game_id()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn flush_state(&self) -> FlushState {
        self.scheduler.state()
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            queue: self.queue.stats(),
            delivery: self.scheduler.stats(),
        }
    }
}

impl Drop for TokebiClient {
    fn drop(&mut self) {
        self.on_destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingTransport {
        batches: Mutex<Vec<String>>,
        registrations: Mutex<u32>,
    }

    impl Transport for RecordingTransport {
        fn register_game(&self, _body: String) -> BoxFuture<'_, Result<String>> {
            *self.registrations.lock() += 1;
            async { Ok(r#"{"game_id":"game_42"}"#.to_string()) }.boxed()
        }

        fn send_batch(&self, body: String) -> BoxFuture<'_, Result<()>> {
            self.batches.lock().push(body);
            async { Ok(()) }.boxed()
        }
    }

    fn config(dir: &std::path::Path, api_key: &str) -> SdkConfig {
        SdkConfig {
            api_key: api_key.to_string(),
            data_dir: Some(dir.to_path_buf()),
            game_name: "Unit Game".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_runtime() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let result = TokebiClient::with_transport(config(dir.path(), "key"), transport);
        assert!(matches!(result, Err(TokebiError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_disables_client() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let client = TokebiClient::with_transport(config(dir.path(), "  "), transport.clone()).unwrap();

        assert!(!client.is_enabled());
        assert!(!client.player_id().is_empty());
        client.track("boot", None, true);
        client.flush_now().await;

        assert_eq!(client.queue_len(), 0);
        assert_eq!(*transport.registrations.lock(), 0);
        assert!(client.register().await.is_err());
    }

    #[tokio::test]
    async fn test_track_after_registration() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let client = TokebiClient::with_transport(config(dir.path(), "key"), transport.clone()).unwrap();

        assert!(client.wait_until_registered(Duration::from_secs(2)).await);
        assert_eq!(client.game_id(), GameId::Registered("game_42".to_string()));

        client.track_level_complete("1-1", 12.5);
        client.track("", None, false);
        assert_eq!(client.queue_len(), 1);

        client.flush_now().await;
        let batches = transport.batches.lock();
        assert_eq!(batches.len(), 1);
        let decoded: serde_json::Value = serde_json::from_str(&batches[0]).unwrap();
        let event = &decoded["events"][0];
        assert_eq!(event["eventType"], "level_complete");
        assert_eq!(event["payload"]["level"], "1-1");
        assert_eq!(event["payload"]["time"], 12.5);
        assert_eq!(event["gameId"], "game_42");
    }

    #[tokio::test]
    async fn test_player_id_persisted_between_clients() {
        let dir = tempdir().unwrap();
        let first = TokebiClient::with_transport(
            config(dir.path(), "key"),
            Arc::new(RecordingTransport::default()),
        )
        .unwrap();
        let id = first.player_id().to_string();
        drop(first);

        let second = TokebiClient::with_transport(
            config(dir.path(), "key"),
            Arc::new(RecordingTransport::default()),
        )
        .unwrap();
        assert_eq!(second.player_id(), id);
    }
}
