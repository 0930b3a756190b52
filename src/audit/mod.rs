//! Navigation lifecycle audit utilities (RSB MODULE_SPEC compliant).
//!
//! Instrumentation hooks so callers can observe the major transitions of the
//! session router and tree. Records capture a stage identifier plus structured
//! metadata so downstream code can log, buffer, or visualize the navigation
//! history without contorting the dispatch path.

use std::time::SystemTime;

use serde_json::{Value, json};

use crate::logging::{LogFields, LogLevel, Logger};

/// Distinct checkpoints emitted by the router and the session tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAuditStage {
    /// A navigation tree finished mounting and was handed to the router.
    TreeAttached,
    /// The router released its tree handle.
    TreeDetached,
    /// A router command reached a live tree.
    CommandDispatched,
    /// A router command arrived with no tree and was discarded.
    CommandDropped,
    /// The tree replaced its root flow (sign-in or sign-out).
    RootReplaced,
    /// The active tab changed within a wing.
    TabSelected,
    /// A secondary screen was pushed onto the stack.
    ScreenPushed,
    /// One or more screens were popped off the stack.
    ScreenPopped,
    /// A route was refused because the active flow does not declare it.
    RouteRejected,
}

impl NavigationAuditStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TreeAttached => "tree_attached",
            Self::TreeDetached => "tree_detached",
            Self::CommandDispatched => "command_dispatched",
            Self::CommandDropped => "command_dropped",
            Self::RootReplaced => "root_replaced",
            Self::TabSelected => "tab_selected",
            Self::ScreenPushed => "screen_pushed",
            Self::ScreenPopped => "screen_popped",
            Self::RouteRejected => "route_rejected",
        }
    }
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct NavigationAuditEvent {
    pub timestamp: SystemTime,
    pub stage: NavigationAuditStage,
    pub details: Vec<(String, Value)>,
}

impl NavigationAuditEvent {
    fn new(stage: NavigationAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }
}

/// Builder helper to append fields ergonomically.
pub struct NavigationAuditEventBuilder {
    event: NavigationAuditEvent,
}

impl NavigationAuditEventBuilder {
    pub fn new(stage: NavigationAuditStage) -> Self {
        Self {
            event: NavigationAuditEvent::new(stage),
        }
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> NavigationAuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait NavigationAudit: Send + Sync {
    fn record(&self, event: NavigationAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullNavigationAudit;

impl NavigationAudit for NullNavigationAudit {
    fn record(&self, _event: NavigationAuditEvent) {}
}

/// Audit sink that forwards every record through a [`Logger`].
pub struct LoggingAudit {
    logger: Logger,
    level: LogLevel,
    target: String,
}

impl LoggingAudit {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            target: "reception::audit".to_string(),
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}

impl NavigationAudit for LoggingAudit {
    fn record(&self, event: NavigationAuditEvent) {
        let mut fields = LogFields::new();
        fields.insert("stage".to_string(), json!(event.stage.as_str()));
        for (key, value) in event.details {
            fields.insert(key, value);
        }
        let _ = self
            .logger
            .log_with_fields(self.level, &self.target, "navigation_audit", fields);
    }
}
