use thiserror::Error;

/// Unified result type for the reception crate.
pub type Result<T> = std::result::Result<T, NavError>;

/// Errors surfaced by navigator composition and tree dispatch.
///
/// The session router absorbs these (its contract is no-throw); everything
/// below it propagates with `?`.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("route `{0}` is not registered in the active flow")]
    UnknownRoute(String),
    #[error("`{0}` is not a root route")]
    UnknownRoot(String),
    #[error("route `{0}` declared twice in `{1}`")]
    DuplicateRoute(String, String),
    #[error("wing `{0}` declared twice")]
    DuplicateWing(String),
    #[error("no wing declared for role `{0}`")]
    MissingWing(String),
    #[error("route `{0}` shadows a root route")]
    ReservedRoute(String),
    #[error("wing `{0}` declares no tabs")]
    EmptyWing(String),
    #[error("screen `{0}` failed: {1}")]
    Screen(String, String),
    #[error("navigation state poisoned")]
    StatePoisoned,
}
