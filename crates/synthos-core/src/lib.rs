//! Business logic and port definitions for SynthOS.
//!
//! This crate defines the "ports" (repository and connection traits) that the
//! infrastructure layer implements, plus everything with real invariants:
//! the command tree, the authorization gate, the message relay, sessions and
//! the tenant orchestrator. It depends only on `synthos-types` -- never on
//! `synthos-infra` or any database/network crate.

pub mod auth;
pub mod command;
pub mod controller;
pub mod orchestrator;
pub mod platform;
pub mod relay;
pub mod repository;
pub mod session;
pub mod tenant;

#[cfg(test)]
pub(crate) mod testing;
