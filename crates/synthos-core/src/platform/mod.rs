//! Chat-platform connection ports.
//!
//! `Connection` is what a running session talks to; `ConnectionFactory`
//! creates connections from a credential. Implementations live in
//! synthos-infra (serenity) and in the test mocks.

pub mod box_connection;
pub mod connection;

pub use box_connection::{BoxConnection, ConnectionDyn, SharedConnection};
pub use connection::{Connection, ConnectionFactory};
