//! Role-aware session router.
//!
//! The router is the stable handle the rest of the application talks to. It
//! owns a weak reference to whichever [`NavigationTree`] is currently
//! mounted, plus the session's role. Commands issued while no tree is live
//! are silently discarded; the contract is that router calls never fail and
//! never panic, whatever state the UI is in. Drops are still visible through
//! metrics, audit records, and debug logs.

use std::sync::{Arc, RwLock, Weak};

use serde_json::{Value, json};

use crate::audit::{NavigationAudit, NavigationAuditEventBuilder, NavigationAuditStage};
use crate::logging::{LogFields, LogLevel, Logger, field_map};
use crate::metrics::SharedMetrics;
use crate::registry::NavParams;
use crate::routes;
use crate::session::{Role, Session};
use crate::tree::NavigationTree;

const ROUTER_TARGET: &str = "reception::router";

/// Ambient wiring for a router instance. Everything is optional; a default
/// config yields a silent router.
#[derive(Clone, Default)]
pub struct RouterConfig {
    pub logger: Option<Logger>,
    pub metrics: Option<SharedMetrics>,
    pub audit: Option<Arc<dyn NavigationAudit>>,
}

/// Shared router handle. Cheap to clone and hand to screens, bridges, and
/// background tasks.
pub type SharedRouter = Arc<SessionRouter>;

pub struct SessionRouter {
    tree: RwLock<Option<Weak<dyn NavigationTree>>>,
    session: RwLock<Session>,
    config: RouterConfig,
}

impl SessionRouter {
    pub fn new() -> SharedRouter {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> SharedRouter {
        Arc::new(Self {
            tree: RwLock::new(None),
            session: RwLock::new(Session::unauthenticated()),
            config,
        })
    }

    /// Hands the router a freshly mounted tree. The router never owns the
    /// tree; once the last strong reference elsewhere drops, commands go
    /// back to being discarded.
    pub fn attach<T>(&self, tree: &Arc<T>)
    where
        T: NavigationTree + 'static,
    {
        let weak = Arc::downgrade(tree);
        let handle: Weak<dyn NavigationTree> = weak;
        if let Ok(mut guard) = self.tree.write() {
            *guard = Some(handle);
        }
        self.audit(NavigationAuditStage::TreeAttached, &[]);
        self.log(LogLevel::Info, "tree_attached", |_| {});
    }

    /// Releases the current tree handle, if any.
    pub fn detach(&self) {
        let had_tree = self
            .tree
            .write()
            .map(|mut guard| guard.take().is_some())
            .unwrap_or(false);
        if had_tree {
            self.audit(NavigationAuditStage::TreeDetached, &[]);
            self.log(LogLevel::Info, "tree_detached", |_| {});
        }
    }

    /// Current session view. `ready` is computed live from whether an
    /// attached tree can still be upgraded.
    pub fn session(&self) -> Session {
        let stored = self.session.read().map(|guard| *guard).unwrap_or_default();
        Session {
            ready: self.tree().is_some(),
            ..stored
        }
    }

    /// Routes to a tab or secondary screen in the active flow. A no-op when
    /// no tree is attached; tree-side rejections are absorbed and logged.
    pub fn navigate_to(&self, route: &str, params: NavParams) {
        let Some(tree) = self.tree() else {
            self.drop_command("navigate", route);
            return;
        };

        self.dispatched("navigate", route);
        if let Err(err) = tree.navigate(route, &params) {
            self.log(LogLevel::Warn, "navigate_failed", |fields| {
                fields.insert("route".to_string(), json!(route));
                fields.insert("error".to_string(), json!(err.to_string()));
            });
        }
    }

    /// Tears the session down to the sign-in flow and forgets the role.
    pub fn reset_to_unauthenticated(&self) {
        let Some(tree) = self.tree() else {
            self.drop_command("reset", routes::AUTH_ROOT);
            return;
        };

        self.dispatched("reset", routes::AUTH_ROOT);
        match tree.reset_to(routes::AUTH_ROOT) {
            Ok(()) => self.store_role(None),
            Err(err) => self.log(LogLevel::Error, "reset_failed", |fields| {
                fields.insert("root".to_string(), json!(routes::AUTH_ROOT));
                fields.insert("error".to_string(), json!(err.to_string()));
            }),
        }
    }

    /// Replaces the session with the given role's wing. Role strings come
    /// straight from backend payloads; anything unrecognized falls back to
    /// the parent wing rather than stranding the user.
    pub fn reset_to_role_root(&self, role: &str) {
        let parsed = Role::parse(role);
        if parsed.is_none() {
            self.log(LogLevel::Warn, "unknown_role", |fields| {
                fields.insert("role".to_string(), json!(role));
                fields.insert("fallback".to_string(), json!(Role::Parent.as_str()));
            });
        }
        let resolved = parsed.unwrap_or(Role::Parent);
        let root = routes::root_route(resolved);

        let Some(tree) = self.tree() else {
            self.drop_command("reset", root);
            return;
        };

        self.dispatched("reset", root);
        match tree.reset_to(root) {
            Ok(()) => self.store_role(Some(resolved)),
            Err(err) => self.log(LogLevel::Error, "reset_failed", |fields| {
                fields.insert("root".to_string(), json!(root));
                fields.insert("error".to_string(), json!(err.to_string()));
            }),
        }
    }

    fn tree(&self) -> Option<Arc<dyn NavigationTree>> {
        self.tree
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(Weak::upgrade))
    }

    fn store_role(&self, role: Option<Role>) {
        if let Ok(mut guard) = self.session.write() {
            guard.role = role;
        }
    }

    fn dispatched(&self, command: &str, route: &str) {
        self.bump_metrics(|m| m.record_dispatched());
        self.audit(
            NavigationAuditStage::CommandDispatched,
            &[("command", json!(command)), ("route", json!(route))],
        );
        self.log(LogLevel::Debug, "command_dispatched", |fields| {
            fields.insert("command".to_string(), json!(command));
            fields.insert("route".to_string(), json!(route));
        });
    }

    fn drop_command(&self, command: &str, route: &str) {
        self.bump_metrics(|m| m.record_dropped());
        self.audit(
            NavigationAuditStage::CommandDropped,
            &[("command", json!(command)), ("route", json!(route))],
        );
        self.log(LogLevel::Debug, "command_dropped", |fields| {
            fields.insert("command".to_string(), json!(command));
            fields.insert("route".to_string(), json!(route));
        });
    }

    fn bump_metrics<F>(&self, apply: F)
    where
        F: FnOnce(&mut crate::metrics::RouterMetrics),
    {
        if let Some(metrics) = &self.config.metrics {
            if let Ok(mut guard) = metrics.lock() {
                apply(&mut guard);
            }
        }
    }

    fn audit(&self, stage: NavigationAuditStage, details: &[(&str, Value)]) {
        if let Some(audit) = &self.config.audit {
            let mut builder = NavigationAuditEventBuilder::new(stage);
            for (key, value) in details {
                builder.detail(*key, value.clone());
            }
            audit.record(builder.finish());
        }
    }

    fn log<F>(&self, level: LogLevel, message: &str, fill: F)
    where
        F: FnOnce(&mut LogFields),
    {
        if let Some(logger) = &self.config.logger {
            let mut fields = field_map();
            fill(&mut fields);
            let _ = logger.log_with_fields(level, ROUTER_TARGET, message, fields);
        }
    }
}
