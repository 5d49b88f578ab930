//! Running sessions and their listener tables.

pub mod listener;
#[allow(clippy::module_inception)]
pub mod session;

pub use listener::{Listener, ListenerTable, SessionContext};
pub use session::{Session, SessionLabel, SessionSpec};
