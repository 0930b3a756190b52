//! Tree module orchestrator following the RSB module specification.
//!
//! Downstream crates import the session tree and its observers from here
//! while the implementation details live in the private `core` and `watch`
//! modules.

mod core;
mod watch;

pub use core::{NavigationTree, SessionTree, TreeConfig};
pub use watch::{MetricsReporter, TransitionLogger, TreeObserver, TreeSnapshot};
