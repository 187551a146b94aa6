// src/session/mod.rs
//! Player identity and game registration
//!
//! - **Identity**: player id persisted across runs
//! - **State**: game id / multiplayer role gating
//! - **Registration**: one-time `POST /api/games` exchange

pub mod identity;
pub mod registration;
pub mod state;

pub use identity::{generate_player_id, IdentityStore};
pub use registration::{Registrar, Registration, RetryPolicy};
pub use state::{GameId, RoleChange, Session, TrackGate, NO_TRACK_GAME_ID};
