//! Role-aware session routing for the clinic client.
//!
//! The crate splits navigation into a thin, never-failing command surface
//! (the session router) and the stateful tree behind it. Blueprints declare
//! what each role can see; the tree mounts exactly one role's wing at a
//! time; the router survives the tree being torn down and rebuilt around
//! sign-in and sign-out. The modules follow the RSB `MODULE_SPEC` pattern.

pub mod audit;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod router;
pub mod routes;
pub mod session;
pub mod tree;
pub mod width;
pub mod wings;

pub use audit::{
    LoggingAudit, NavigationAudit, NavigationAuditEvent, NavigationAuditEventBuilder,
    NavigationAuditStage, NullNavigationAudit,
};
pub use error::{NavError, Result};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{MetricSnapshot, RouterMetrics, SharedMetrics, shared_metrics};
pub use registry::{
    AuthBlueprint, NavParams, NavRegistry, NullScreen, Screen, ScreenFactory,
    ScreenLifecycleEvent, StackEntry, TabEntry, WingBlueprint, WingTheme, nav_params,
    null_screen_factory, screen_factory,
};
pub use router::{RouterConfig, SessionRouter, SharedRouter};
pub use session::{AuthEvent, Role, Session, SessionBridge, UserClaims};
pub use tree::{
    MetricsReporter, NavigationTree, SessionTree, TransitionLogger, TreeConfig, TreeObserver,
    TreeSnapshot,
};
pub use width::{display_width, sanitize_label, truncate_display};
pub use wings::clinic_registry;
