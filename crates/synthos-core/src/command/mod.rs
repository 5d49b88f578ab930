//! Declarative command trees.
//!
//! A tree is declared with [`CommandTree::builder`], validated once by
//! `build()`, registered with the platform as one bulk payload and then used
//! to route command interactions to their handlers.

pub mod builder;
pub mod handler;
pub mod tree;

pub use builder::{CommandNode, CommandTreeBuilder, OptionNode, SubcommandNode};
pub use handler::{Handler, Invocation, SharedHandler};
pub use tree::{CommandTree, DispatchOutcome, DropReason};
