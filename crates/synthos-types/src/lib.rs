//! Shared domain types for SynthOS.
//!
//! This crate contains the platform-neutral types used across the SynthOS
//! workspace: tenant records, inbound platform events, interaction replies,
//! command registration payloads, configuration and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod command;
pub mod config;
pub mod error;
pub mod interaction;
pub mod platform;
pub mod tenant;
