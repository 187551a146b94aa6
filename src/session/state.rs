// src/session/state.rs
//! Session and registration state
//!
//! `GameId` moves Unregistered → Registered on a successful registration,
//! to NoTrack when the session becomes a multiplayer client, and back to
//! Unregistered when the client role is dropped (triggering
//! re-registration). The state lives in a watch channel so callers can
//! wait for registration to land.

use std::time::Duration;
use tokio::sync::watch;

/// Game id sent on the wire for events forced through in client role
pub const NO_TRACK_GAME_ID: &str = "client_no_track";

/// Registration state of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameId {
    /// No game id yet (registration pending or failed)
    Unregistered,

    /// Game id returned by the collector
    Registered(String),

    /// Multiplayer client: do not track
    NoTrack,
}

impl GameId {
    /// Value to stamp on delivered events
    pub fn wire_value(&self) -> Option<&str> {
        match self {
            GameId::Unregistered => None,
            GameId::Registered(id) => Some(id),
            GameId::NoTrack => Some(NO_TRACK_GAME_ID),
        }
    }
}

/// Outcome of a role switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    /// Nothing to do
    Unchanged,

    /// Entered client role
    BecameClient,

    /// Left client role; registration must run again
    NeedsRegistration,
}

/// Gate decision for a track call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackGate {
    Accept,
    /// Client role without force
    SkipClient,
    /// Registration not complete
    NotReady,
}

/// Per-client session state
pub struct Session {
    player_id: String,
    game_id: watch::Sender<GameId>,
}

impl Session {
    pub fn new(player_id: impl Into<String>) -> Self {
        let (game_id, _) = watch::channel(GameId::Unregistered);
        Self {
            player_id: player_id.into(),
            game_id,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn game_id(&self) -> GameId {
        self.game_id.borrow().clone()
    }

    pub fn is_client(&self) -> bool {
        *self.game_id.borrow() == GameId::NoTrack
    }

    /// Decide whether a track call may enqueue
    pub fn gate(&self, force_track: bool) -> TrackGate {
        let game_id = self.game_id.borrow();
        if *game_id == GameId::NoTrack && !force_track {
            return TrackGate::SkipClient;
        }
        if *game_id == GameId::Unregistered || self.player_id.is_empty() {
            return TrackGate::NotReady;
        }
        TrackGate::Accept
    }

    /// Store a registered game id
    ///
    /// Only applies while unregistered, so a late response cannot override
    /// a switch to client role. Returns whether the id was stored.
    pub fn complete_registration(&self, id: impl Into<String>) -> bool {
        let id = id.into();
        if id.is_empty() {
            return false;
        }
        self.game_id.send_if_modified(|current| {
            if *current == GameId::Unregistered {
                *current = GameId::Registered(id);
                true
            } else {
                false
            }
        })
    }

    /// Switch multiplayer role
    pub fn set_role(&self, is_client: bool) -> RoleChange {
        let mut change = RoleChange::Unchanged;
        self.game_id.send_if_modified(|current| {
            let no_track = *current == GameId::NoTrack;
            match (is_client, no_track) {
                (true, false) => {
                    *current = GameId::NoTrack;
                    change = RoleChange::BecameClient;
                    true
                }
                (false, true) => {
                    *current = GameId::Unregistered;
                    change = RoleChange::NeedsRegistration;
                    true
                }
                _ => false,
            }
        });
        change
    }

    /// Wait until registration completes (`Registered`)
    pub async fn wait_until_ready(&self, timeout: Duration) -> bool {
        let mut rx = self.game_id.subscribe();
        let wait = rx.wait_for(|id| matches!(id, GameId::Registered(_)));
        let ready = matches!(tokio::time::timeout(timeout, wait).await, Ok(Ok(_)));
        ready
    }
}
