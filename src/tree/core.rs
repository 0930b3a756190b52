use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use crate::audit::{NavigationAudit, NavigationAuditEventBuilder, NavigationAuditStage};
use crate::error::{NavError, Result};
use crate::logging::{LogFields, LogLevel, Logger, field_map};
use crate::metrics::SharedMetrics;
use crate::registry::{
    NavParams, NavRegistry, Screen, ScreenLifecycleEvent, StackEntry, WingTheme,
};
use crate::routes;
use crate::session::Role;

use super::watch::{ObserverSet, TreeObserver, TreeSnapshot};

const TREE_TARGET: &str = "reception::tree";

/// Surface the router dispatches against. Kept narrow so tests can stand in
/// a fake without mounting real screens.
pub trait NavigationTree: Send + Sync {
    fn navigate(&self, route: &str, params: &NavParams) -> Result<()>;
    fn reset_to(&self, root: &str) -> Result<()>;
}

/// Ambient wiring for a tree instance. Everything is optional; a default
/// config yields a silent tree.
#[derive(Clone, Default)]
pub struct TreeConfig {
    pub logger: Option<Logger>,
    pub metrics: Option<SharedMetrics>,
    pub audit: Option<Arc<dyn NavigationAudit>>,
}

struct Frame {
    route: String,
    title: String,
    screen: Box<dyn Screen>,
}

enum RootFlow {
    Auth {
        screen: Box<dyn Screen>,
    },
    Wing {
        role: Role,
        active_tab: String,
        screen: Box<dyn Screen>,
    },
}

impl RootFlow {
    fn screen_mut(&mut self) -> &mut Box<dyn Screen> {
        match self {
            RootFlow::Auth { screen } => screen,
            RootFlow::Wing { screen, .. } => screen,
        }
    }
}

struct TreeState {
    root_route: &'static str,
    flow: RootFlow,
    pushed: Vec<Frame>,
}

enum StackMove {
    Refreshed,
    PoppedBack(usize),
    Pushed,
}

/// Mounted navigation state for one signed-in (or signed-out) session.
///
/// Exactly one root flow is live at a time: the auth flow, or the wing of
/// the authenticated role with one active tab. Secondary screens stack on
/// top of whichever is live. All mutation happens behind one lock; observers
/// are notified after the lock is released.
pub struct SessionTree {
    registry: NavRegistry,
    state: Mutex<TreeState>,
    observers: ObserverSet,
    config: TreeConfig,
}

impl SessionTree {
    pub fn new(registry: NavRegistry) -> Result<Arc<Self>> {
        Self::with_config(registry, TreeConfig::default())
    }

    /// Mounts the auth root and returns the shared tree handle.
    pub fn with_config(registry: NavRegistry, config: TreeConfig) -> Result<Arc<Self>> {
        let mut screen = (registry.auth().root_factory)();
        screen.on_lifecycle(ScreenLifecycleEvent::WillAppear)?;
        screen.on_lifecycle(ScreenLifecycleEvent::DidAppear)?;

        Ok(Arc::new(Self {
            registry,
            state: Mutex::new(TreeState {
                root_route: routes::AUTH_ROOT,
                flow: RootFlow::Auth { screen },
                pushed: Vec::new(),
            }),
            observers: ObserverSet::default(),
            config,
        }))
    }

    pub fn observe<O>(&self, observer: O)
    where
        O: TreeObserver + 'static,
    {
        self.observers.register(Box::new(observer));
    }

    /// Pops the top secondary screen. Returns `false` when the visible
    /// screen is already the flow root, matching back-button semantics.
    pub fn pop(&self) -> Result<bool> {
        let mut guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        let state = &mut *guard;
        let Some(top) = state.pushed.last() else {
            return Ok(false);
        };
        let route = top.route.clone();

        let keep = state.pushed.len() - 1;
        Self::pop_frames_to(state, keep, true)?;

        self.bump_metrics(|m| m.record_pops(1));
        self.audit(
            NavigationAuditStage::ScreenPopped,
            &[
                ("route", json!(route)),
                ("depth", json!(1 + state.pushed.len())),
            ],
        );
        self.log(LogLevel::Debug, "screen_popped", |fields| {
            fields.insert("route".to_string(), json!(route));
        });

        let snapshot = Self::snapshot_of(state);
        drop(guard);
        self.observers.notify(&snapshot);
        Ok(true)
    }

    pub fn snapshot(&self) -> Result<TreeSnapshot> {
        let guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        Ok(Self::snapshot_of(&guard))
    }

    /// Visible stack depth. The mounted root counts as one.
    pub fn depth(&self) -> Result<usize> {
        let guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        Ok(1 + guard.pushed.len())
    }

    pub fn role(&self) -> Result<Option<Role>> {
        let guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        Ok(match &guard.flow {
            RootFlow::Wing { role, .. } => Some(*role),
            RootFlow::Auth { .. } => None,
        })
    }

    pub fn active_tab(&self) -> Result<Option<String>> {
        let guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        Ok(match &guard.flow {
            RootFlow::Wing { active_tab, .. } => Some(active_tab.clone()),
            RootFlow::Auth { .. } => None,
        })
    }

    /// Header title for the visible screen: the top secondary screen's
    /// title, else the active tab's label, else the sign-in title.
    pub fn top_title(&self) -> Result<String> {
        let guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        if let Some(frame) = guard.pushed.last() {
            return Ok(frame.title.clone());
        }
        Ok(match &guard.flow {
            RootFlow::Wing {
                role, active_tab, ..
            } => self
                .registry
                .wing(*role)
                .and_then(|wing| wing.tab_entry(active_tab))
                .map(|tab| tab.label.clone())
                .unwrap_or_else(|| active_tab.clone()),
            RootFlow::Auth { .. } => self.registry.auth().root_title.clone(),
        })
    }

    /// Theme of the active wing. `None` while unauthenticated.
    pub fn theme(&self) -> Result<Option<WingTheme>> {
        let guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        Ok(match &guard.flow {
            RootFlow::Wing { role, .. } => self.registry.wing(*role).map(|wing| wing.theme),
            RootFlow::Auth { .. } => None,
        })
    }

    fn dispatch_navigate(&self, route: &str, params: &NavParams) -> Result<()> {
        let mut guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        let state = &mut *guard;

        let wing_info = match &state.flow {
            RootFlow::Wing {
                role, active_tab, ..
            } => Some((*role, active_tab.clone())),
            RootFlow::Auth { .. } => None,
        };

        if let Some((role, current_tab)) = wing_info {
            let wing = self
                .registry
                .wing(role)
                .ok_or_else(|| NavError::MissingWing(role.as_str().to_string()))?;

            if let Some(entry) = wing.tab_entry(route) {
                if current_tab == route {
                    let popped = Self::pop_frames_to(state, 0, true)?;
                    state.flow.screen_mut().on_params(params)?;
                    if popped > 0 {
                        self.bump_metrics(|m| m.record_pops(popped));
                    }
                    self.log(LogLevel::Debug, "tab_reselected", |fields| {
                        fields.insert("tab".to_string(), json!(route));
                        fields.insert("popped".to_string(), json!(popped));
                    });
                } else {
                    let popped = Self::pop_frames_to(state, 0, false)?;

                    let mut next = (entry.factory)();
                    let old = state.flow.screen_mut();
                    old.on_lifecycle(ScreenLifecycleEvent::WillDisappear)?;
                    next.on_lifecycle(ScreenLifecycleEvent::WillAppear)?;
                    next.on_params(params)?;
                    next.on_lifecycle(ScreenLifecycleEvent::DidAppear)?;
                    old.on_lifecycle(ScreenLifecycleEvent::DidDisappear)?;

                    if let RootFlow::Wing {
                        active_tab, screen, ..
                    } = &mut state.flow
                    {
                        *active_tab = route.to_string();
                        *screen = next;
                    }

                    self.bump_metrics(|m| {
                        m.record_tab_select();
                        m.record_pops(popped);
                    });
                    self.audit(
                        NavigationAuditStage::TabSelected,
                        &[
                            ("from", json!(current_tab)),
                            ("to", json!(route)),
                            ("popped", json!(popped)),
                        ],
                    );
                    self.log(LogLevel::Info, "tab_selected", |fields| {
                        fields.insert("from".to_string(), json!(current_tab));
                        fields.insert("to".to_string(), json!(route));
                        fields.insert("popped".to_string(), json!(popped));
                    });
                }
            } else if let Some(entry) = wing.stack_entry(route) {
                let movement = Self::apply_stack(state, entry, params)?;
                self.settle_stack_move(state, route, movement);
            } else {
                return Err(self.reject_route(state.root_route, route));
            }
        } else {
            let auth = self.registry.auth();
            if let Some(entry) = auth.stack_entry(route) {
                let movement = Self::apply_stack(state, entry, params)?;
                self.settle_stack_move(state, route, movement);
            } else {
                return Err(self.reject_route(state.root_route, route));
            }
        }

        let snapshot = Self::snapshot_of(state);
        drop(guard);
        self.observers.notify(&snapshot);
        Ok(())
    }

    fn dispatch_reset(&self, root: &str) -> Result<()> {
        let canonical = routes::canonicalize_root(root)
            .ok_or_else(|| NavError::UnknownRoot(root.to_string()))?;

        let mut guard = self.state.lock().map_err(|_| NavError::StatePoisoned)?;
        let state = &mut *guard;
        let from = state.root_route;

        let popped = Self::pop_frames_to(state, 0, false)?;

        let mut next_flow = match routes::role_of_root(canonical) {
            Some(role) => {
                let wing = self
                    .registry
                    .wing(role)
                    .ok_or_else(|| NavError::MissingWing(role.as_str().to_string()))?;
                let first = wing
                    .tabs
                    .first()
                    .ok_or_else(|| NavError::EmptyWing(role.as_str().to_string()))?;
                RootFlow::Wing {
                    role,
                    active_tab: first.route.clone(),
                    screen: (first.factory)(),
                }
            }
            None => RootFlow::Auth {
                screen: (self.registry.auth().root_factory)(),
            },
        };

        let old = state.flow.screen_mut();
        old.on_lifecycle(ScreenLifecycleEvent::WillDisappear)?;
        next_flow.screen_mut().on_lifecycle(ScreenLifecycleEvent::WillAppear)?;
        next_flow.screen_mut().on_lifecycle(ScreenLifecycleEvent::DidAppear)?;
        old.on_lifecycle(ScreenLifecycleEvent::DidDisappear)?;

        state.flow = next_flow;
        state.root_route = canonical;

        self.bump_metrics(|m| {
            m.record_reset();
            m.record_pops(popped);
        });
        self.audit(
            NavigationAuditStage::RootReplaced,
            &[
                ("from", json!(from)),
                ("to", json!(canonical)),
                ("popped", json!(popped)),
            ],
        );
        self.log(LogLevel::Info, "root_replaced", |fields| {
            fields.insert("from".to_string(), json!(from));
            fields.insert("to".to_string(), json!(canonical));
        });

        let snapshot = Self::snapshot_of(state);
        drop(guard);
        self.observers.notify(&snapshot);
        Ok(())
    }

    /// Push, pop back to, or refresh a secondary screen.
    fn apply_stack(
        state: &mut TreeState,
        entry: &StackEntry,
        params: &NavParams,
    ) -> Result<StackMove> {
        if let Some(top) = state.pushed.last_mut() {
            if top.route == entry.route {
                top.screen.on_params(params)?;
                return Ok(StackMove::Refreshed);
            }
        }

        if let Some(position) = state
            .pushed
            .iter()
            .position(|frame| frame.route == entry.route)
        {
            let popped = Self::pop_frames_to(state, position + 1, true)?;
            if let Some(top) = state.pushed.last_mut() {
                top.screen.on_params(params)?;
            }
            return Ok(StackMove::PoppedBack(popped));
        }

        let mut screen = (entry.factory)();
        {
            let covered = match state.pushed.last_mut() {
                Some(frame) => &mut frame.screen,
                None => state.flow.screen_mut(),
            };
            covered.on_lifecycle(ScreenLifecycleEvent::WillDisappear)?;
            screen.on_lifecycle(ScreenLifecycleEvent::WillAppear)?;
            screen.on_params(params)?;
            screen.on_lifecycle(ScreenLifecycleEvent::DidAppear)?;
            covered.on_lifecycle(ScreenLifecycleEvent::DidDisappear)?;
        }
        state.pushed.push(Frame {
            route: entry.route.clone(),
            title: entry.title.clone(),
            screen,
        });
        Ok(StackMove::Pushed)
    }

    fn settle_stack_move(&self, state: &TreeState, route: &str, movement: StackMove) {
        match movement {
            StackMove::Pushed => {
                self.bump_metrics(|m| m.record_push());
                self.audit(
                    NavigationAuditStage::ScreenPushed,
                    &[
                        ("route", json!(route)),
                        ("depth", json!(1 + state.pushed.len())),
                    ],
                );
                self.log(LogLevel::Debug, "screen_pushed", |fields| {
                    fields.insert("route".to_string(), json!(route));
                    fields.insert("depth".to_string(), json!(1 + state.pushed.len()));
                });
            }
            StackMove::PoppedBack(popped) => {
                self.bump_metrics(|m| m.record_pops(popped));
                self.audit(
                    NavigationAuditStage::ScreenPopped,
                    &[("route", json!(route)), ("popped", json!(popped))],
                );
                self.log(LogLevel::Debug, "screen_popped", |fields| {
                    fields.insert("route".to_string(), json!(route));
                    fields.insert("popped".to_string(), json!(popped));
                });
            }
            StackMove::Refreshed => {
                self.log(LogLevel::Trace, "params_refreshed", |fields| {
                    fields.insert("route".to_string(), json!(route));
                });
            }
        }
    }

    /// Tears frames down until `keep` remain. With `reveal`, the newly
    /// visible screen receives its appear pair interleaved with the final
    /// frame's teardown.
    fn pop_frames_to(state: &mut TreeState, keep: usize, reveal: bool) -> Result<usize> {
        let mut popped = 0usize;
        while state.pushed.len() > keep {
            let last = state.pushed.len() == keep + 1;
            let Some(mut frame) = state.pushed.pop() else {
                break;
            };
            frame.screen.on_lifecycle(ScreenLifecycleEvent::WillDisappear)?;
            if reveal && last {
                let revealed = match state.pushed.last_mut() {
                    Some(below) => &mut below.screen,
                    None => state.flow.screen_mut(),
                };
                revealed.on_lifecycle(ScreenLifecycleEvent::WillAppear)?;
                revealed.on_lifecycle(ScreenLifecycleEvent::DidAppear)?;
            }
            frame.screen.on_lifecycle(ScreenLifecycleEvent::DidDisappear)?;
            popped += 1;
        }
        Ok(popped)
    }

    fn reject_route(&self, root: &'static str, route: &str) -> NavError {
        self.audit(
            NavigationAuditStage::RouteRejected,
            &[("route", json!(route)), ("root", json!(root))],
        );
        self.log(LogLevel::Warn, "route_rejected", |fields| {
            fields.insert("route".to_string(), json!(route));
            fields.insert("root".to_string(), json!(root));
        });
        NavError::UnknownRoute(route.to_string())
    }

    fn snapshot_of(state: &TreeState) -> TreeSnapshot {
        let mut trail = vec![state.root_route.to_string()];
        let (role, active_tab) = match &state.flow {
            RootFlow::Wing {
                role, active_tab, ..
            } => {
                trail.push(active_tab.clone());
                (Some(*role), Some(active_tab.clone()))
            }
            RootFlow::Auth { .. } => (None, None),
        };
        trail.extend(state.pushed.iter().map(|frame| frame.route.clone()));
        TreeSnapshot {
            routes: trail,
            depth: 1 + state.pushed.len(),
            role,
            active_tab,
        }
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
            let _ = logger.log_with_fields(level, TREE_TARGET, message, fields);
        }
    }
}

impl NavigationTree for SessionTree {
    fn navigate(&self, route: &str, params: &NavParams) -> Result<()> {
        self.dispatch_navigate(route, params)
    }

    fn reset_to(&self, root: &str) -> Result<()> {
        self.dispatch_reset(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NavigationAuditEvent;
    use crate::metrics::shared_metrics;
    use crate::registry::{ScreenFactory, nav_params, screen_factory};
    use crate::wings::{self, clinic_registry};
    use std::sync::Arc;

    struct RecordingScreen {
        route: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingScreen {
        fn note(&self, what: &str) {
            if let Ok(mut guard) = self.log.lock() {
                guard.push(format!("{}:{}", self.route, what));
            }
        }
    }

    impl Screen for RecordingScreen {
        fn on_lifecycle(&mut self, event: ScreenLifecycleEvent) -> Result<()> {
            self.note(&format!("{event:?}"));
            Ok(())
        }

        fn on_params(&mut self, _params: &NavParams) -> Result<()> {
            self.note("params");
            Ok(())
        }
    }

    fn recording_factory(route: &str, log: &Arc<Mutex<Vec<String>>>) -> ScreenFactory {
        let route = route.to_string();
        let log = Arc::clone(log);
        Arc::new(move || {
            Box::new(RecordingScreen {
                route: route.clone(),
                log: Arc::clone(&log),
            })
        })
    }

    fn tree() -> Arc<SessionTree> {
        SessionTree::new(clinic_registry().unwrap()).unwrap()
    }

    fn admin_tree() -> Arc<SessionTree> {
        let tree = tree();
        tree.reset_to(routes::ADMIN_ROOT).unwrap();
        tree
    }

    #[test]
    fn tree_starts_on_the_auth_root() {
        let tree = tree();
        let snapshot = tree.snapshot().unwrap();
        assert_eq!(snapshot.routes, vec!["Auth"]);
        assert_eq!(snapshot.depth, 1);
        assert_eq!(snapshot.role, None);
        assert_eq!(tree.active_tab().unwrap(), None);
        assert_eq!(tree.theme().unwrap(), None);
    }

    #[test]
    fn resets_land_each_role_on_its_first_tab() {
        let tree = tree();
        let expectations = [
            (Role::Admin, routes::ADMIN_ROOT, wings::DASHBOARD),
            (Role::Therapist, routes::THERAPIST_ROOT, wings::DASHBOARD),
            (Role::Parent, routes::PARENT_ROOT, wings::HOME),
        ];

        for (role, root, first_tab) in expectations {
            tree.reset_to(root).unwrap();
            let snapshot = tree.snapshot().unwrap();
            assert_eq!(snapshot.routes, vec![root.to_string(), first_tab.to_string()]);
            assert_eq!(snapshot.role, Some(role));
            assert_eq!(snapshot.active_tab.as_deref(), Some(first_tab));
            assert_eq!(snapshot.depth, 1);
            assert!(tree.theme().unwrap().is_some(), "signed-in wings carry a theme");
        }

        tree.reset_to(routes::AUTH_ROOT).unwrap();
        assert_eq!(tree.role().unwrap(), None);
    }

    #[test]
    fn unknown_roots_are_rejected() {
        let tree = tree();
        let err = tree.reset_to(wings::DASHBOARD).unwrap_err();
        assert!(matches!(err, NavError::UnknownRoot(route) if route == wings::DASHBOARD));
        assert_eq!(tree.snapshot().unwrap().routes, vec!["Auth"]);
    }

    #[test]
    fn secondary_screens_push_and_pop() {
        let tree = admin_tree();
        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        assert_eq!(tree.depth().unwrap(), 2);
        assert_eq!(tree.top_title().unwrap(), "Reports");

        tree.navigate(wings::LEAVE, &nav_params()).unwrap();
        assert_eq!(tree.depth().unwrap(), 3);

        assert!(tree.pop().unwrap());
        assert_eq!(tree.depth().unwrap(), 2);
        assert!(tree.pop().unwrap());
        assert_eq!(tree.depth().unwrap(), 1);
        assert!(!tree.pop().unwrap(), "popping at the root is a no-op");
        assert_eq!(tree.top_title().unwrap(), "Dashboard");
    }

    #[test]
    fn repeat_navigation_refreshes_params_only() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = clinic_registry().unwrap();
        registry
            .bind(wings::REPORTS, recording_factory(wings::REPORTS, &log))
            .unwrap();
        let tree = SessionTree::new(registry).unwrap();
        tree.reset_to(routes::ADMIN_ROOT).unwrap();

        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        assert_eq!(tree.depth().unwrap(), 2);

        let entries = log.lock().unwrap().clone();
        let appears = entries
            .iter()
            .filter(|entry| entry.as_str() == "Reports:WillAppear")
            .count();
        let params = entries
            .iter()
            .filter(|entry| entry.as_str() == "Reports:params")
            .count();
        assert_eq!(appears, 1, "screen mounts once");
        assert_eq!(params, 2, "second navigation refreshes params");
    }

    #[test]
    fn navigating_to_a_buried_route_pops_back_to_it() {
        let tree = admin_tree();
        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        tree.navigate(wings::LEAVE, &nav_params()).unwrap();
        tree.navigate(wings::PROGRAMS, &nav_params()).unwrap();
        assert_eq!(tree.depth().unwrap(), 4);

        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        let snapshot = tree.snapshot().unwrap();
        assert_eq!(snapshot.depth, 2);
        assert_eq!(
            snapshot.routes,
            vec!["AdminApp", "Dashboard", "Reports"]
        );
    }

    #[test]
    fn tab_select_clears_secondary_screens() {
        let tree = admin_tree();
        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        tree.navigate(wings::LEAVE, &nav_params()).unwrap();

        tree.navigate(wings::THERAPISTS, &nav_params()).unwrap();
        let snapshot = tree.snapshot().unwrap();
        assert_eq!(snapshot.depth, 1);
        assert_eq!(snapshot.active_tab.as_deref(), Some(wings::THERAPISTS));
        assert_eq!(tree.active_tab().unwrap().as_deref(), Some(wings::THERAPISTS));
        assert_eq!(snapshot.routes, vec!["AdminApp", "Therapists"]);
    }

    #[test]
    fn reselecting_the_active_tab_pops_to_its_root() {
        let tree = admin_tree();
        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        assert_eq!(tree.depth().unwrap(), 2);

        tree.navigate(wings::DASHBOARD, &nav_params()).unwrap();
        let snapshot = tree.snapshot().unwrap();
        assert_eq!(snapshot.depth, 1);
        assert_eq!(snapshot.active_tab.as_deref(), Some(wings::DASHBOARD));
    }

    #[test]
    fn routes_outside_the_active_flow_are_rejected() {
        let tree = admin_tree();
        let err = tree.navigate(wings::VIDEO, &nav_params()).unwrap_err();
        assert!(matches!(err, NavError::UnknownRoute(route) if route == wings::VIDEO));
        assert_eq!(tree.depth().unwrap(), 1, "rejected routes leave state alone");

        tree.reset_to(routes::AUTH_ROOT).unwrap();
        let err = tree.navigate(wings::REPORTS, &nav_params()).unwrap_err();
        assert!(matches!(err, NavError::UnknownRoute(_)));
        tree.navigate(wings::FORGOT_PASSWORD, &nav_params()).unwrap();
        assert_eq!(tree.depth().unwrap(), 2);
    }

    #[test]
    fn tab_swap_preserves_lifecycle_interleave() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = clinic_registry().unwrap();
        registry
            .bind(wings::DASHBOARD, recording_factory(wings::DASHBOARD, &log))
            .unwrap();
        registry
            .bind(wings::THERAPISTS, recording_factory(wings::THERAPISTS, &log))
            .unwrap();
        let tree = SessionTree::new(registry).unwrap();
        tree.reset_to(routes::ADMIN_ROOT).unwrap();
        log.lock().unwrap().clear();

        tree.navigate(wings::THERAPISTS, &nav_params()).unwrap();
        let entries = log.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec![
                "Dashboard:WillDisappear",
                "Therapists:WillAppear",
                "Therapists:params",
                "Therapists:DidAppear",
                "Dashboard:DidDisappear",
            ]
        );
    }

    #[test]
    fn push_and_pop_notify_covered_screens() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = clinic_registry().unwrap();
        registry
            .bind(wings::DASHBOARD, recording_factory(wings::DASHBOARD, &log))
            .unwrap();
        registry
            .bind(wings::REPORTS, recording_factory(wings::REPORTS, &log))
            .unwrap();
        let tree = SessionTree::new(registry).unwrap();
        tree.reset_to(routes::ADMIN_ROOT).unwrap();
        log.lock().unwrap().clear();

        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        tree.pop().unwrap();

        let entries = log.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec![
                "Dashboard:WillDisappear",
                "Reports:WillAppear",
                "Reports:params",
                "Reports:DidAppear",
                "Dashboard:DidDisappear",
                "Reports:WillDisappear",
                "Dashboard:WillAppear",
                "Dashboard:DidAppear",
                "Reports:DidDisappear",
            ]
        );
    }

    #[test]
    fn sign_out_tears_down_a_deep_session() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = clinic_registry().unwrap();
        for route in [wings::REPORTS, wings::LEAVE, wings::PROGRAMS] {
            registry.bind(route, recording_factory(route, &log)).unwrap();
        }
        let tree = SessionTree::new(registry).unwrap();
        tree.reset_to(routes::ADMIN_ROOT).unwrap();
        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        tree.navigate(wings::LEAVE, &nav_params()).unwrap();
        tree.navigate(wings::PROGRAMS, &nav_params()).unwrap();
        assert_eq!(tree.depth().unwrap(), 4);

        tree.reset_to(routes::AUTH_ROOT).unwrap();
        let snapshot = tree.snapshot().unwrap();
        assert_eq!(snapshot.routes, vec!["Auth"]);
        assert_eq!(snapshot.depth, 1);
        assert_eq!(snapshot.role, None);

        let entries = log.lock().unwrap().clone();
        for route in ["Reports", "Leave", "Programs"] {
            assert!(
                entries.contains(&format!("{route}:DidDisappear")),
                "{route} should be torn down on sign-out"
            );
        }
    }

    struct FailingScreen;

    impl Screen for FailingScreen {
        fn on_lifecycle(&mut self, event: ScreenLifecycleEvent) -> Result<()> {
            if event == ScreenLifecycleEvent::WillAppear {
                return Err(NavError::Screen(
                    "Reports".to_string(),
                    "fixture refused to mount".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[test]
    fn screen_failures_surface_through_navigate() {
        let mut registry = clinic_registry().unwrap();
        registry
            .bind(wings::REPORTS, screen_factory(|| FailingScreen))
            .unwrap();
        let tree = SessionTree::new(registry).unwrap();
        tree.reset_to(routes::ADMIN_ROOT).unwrap();

        let err = tree.navigate(wings::REPORTS, &nav_params()).unwrap_err();
        assert!(matches!(err, NavError::Screen(route, _) if route == "Reports"));
        assert_eq!(tree.depth().unwrap(), 1, "failed mounts leave no frame behind");
    }

    struct DepthRecorder {
        depths: Arc<Mutex<Vec<usize>>>,
    }

    impl TreeObserver for DepthRecorder {
        fn on_transition(&mut self, snapshot: &TreeSnapshot) {
            if let Ok(mut guard) = self.depths.lock() {
                guard.push(snapshot.depth);
            }
        }
    }

    #[test]
    fn observers_see_each_distinct_transition_once() {
        let tree = tree();
        let depths = Arc::new(Mutex::new(Vec::new()));
        tree.observe(DepthRecorder {
            depths: depths.clone(),
        });

        tree.reset_to(routes::PARENT_ROOT).unwrap();
        tree.navigate(wings::VIDEO, &nav_params()).unwrap();
        tree.navigate(wings::VIDEO, &nav_params()).unwrap();
        tree.pop().unwrap();

        assert_eq!(*depths.lock().unwrap(), vec![1, 2, 1]);
    }

    #[test]
    fn metrics_count_navigation_traffic() {
        let metrics = shared_metrics();
        let config = TreeConfig {
            metrics: Some(metrics.clone()),
            ..TreeConfig::default()
        };
        let tree = SessionTree::with_config(clinic_registry().unwrap(), config).unwrap();

        tree.reset_to(routes::THERAPIST_ROOT).unwrap();
        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        tree.navigate(wings::VIDEO, &nav_params()).unwrap();
        assert!(tree.pop().unwrap());
        tree.navigate(wings::ATTENDANCE, &nav_params()).unwrap();

        let snapshot = metrics
            .lock()
            .unwrap()
            .snapshot(std::time::Duration::ZERO);
        assert_eq!(snapshot.resets, 1);
        assert_eq!(snapshot.pushes, 2);
        assert_eq!(snapshot.tab_selects, 1);
        assert_eq!(snapshot.pops, 2, "one explicit pop plus one from the tab select");
    }

    #[derive(Default)]
    struct StageRecorder {
        stages: Arc<Mutex<Vec<NavigationAuditStage>>>,
    }

    impl NavigationAudit for StageRecorder {
        fn record(&self, event: NavigationAuditEvent) {
            if let Ok(mut guard) = self.stages.lock() {
                guard.push(event.stage);
            }
        }
    }

    #[test]
    fn audits_trace_the_stage_sequence() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let config = TreeConfig {
            audit: Some(Arc::new(StageRecorder {
                stages: stages.clone(),
            })),
            ..TreeConfig::default()
        };
        let tree = SessionTree::with_config(clinic_registry().unwrap(), config).unwrap();

        tree.reset_to(routes::PARENT_ROOT).unwrap();
        tree.navigate(wings::REPORTS, &nav_params()).unwrap();
        let _ = tree.navigate("Nowhere", &nav_params());
        tree.pop().unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                NavigationAuditStage::RootReplaced,
                NavigationAuditStage::ScreenPushed,
                NavigationAuditStage::RouteRejected,
                NavigationAuditStage::ScreenPopped,
            ]
        );
    }
}
