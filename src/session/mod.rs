//! Session module orchestrator following the RSB module specification.
//!
//! Downstream crates import session types from here while the implementation
//! details live in the private `core` and `bridge` modules.

mod bridge;
mod core;

pub use bridge::{AuthEvent, SessionBridge};
pub use core::{Role, Session, UserClaims};
