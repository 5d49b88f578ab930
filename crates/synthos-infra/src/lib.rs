//! Infrastructure layer for SynthOS.
//!
//! Implements the ports defined in `synthos-core`: SQLite tenant storage and
//! the serenity-backed Discord connection. Also loads the TOML configuration.

pub mod config;
pub mod discord;
pub mod sqlite;
