// src/utils/mod.rs
//! Shared configuration and error types

pub mod config;
pub mod errors;

pub use self::config::{Environment, SdkConfig};
pub use self::errors::{Result, TokebiError};
