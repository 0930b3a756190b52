use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crossterm::style::Color;
use serde_json::{Map, Value};

use crate::error::{NavError, Result};
use crate::routes;
use crate::session::Role;
use crate::width::sanitize_label;

/// Parameters carried alongside a navigation command.
pub type NavParams = Map<String, Value>;

/// Empty parameter map. `NavParams::new()` works too; this reads better at
/// call sites that dispatch with no payload.
pub fn nav_params() -> NavParams {
    NavParams::new()
}

/// Factory type responsible for creating a fresh [`Screen`] instance.
pub type ScreenFactory = Arc<dyn Fn() -> Box<dyn Screen> + Send + Sync>;

/// Wraps a plain closure returning a concrete screen into a [`ScreenFactory`].
pub fn screen_factory<F, S>(make: F) -> ScreenFactory
where
    F: Fn() -> S + Send + Sync + 'static,
    S: Screen + 'static,
{
    Arc::new(move || Box::new(make()))
}

/// Factory producing inert placeholder screens. Blueprint entries start with
/// this so a registry is mountable before real screens are bound.
pub fn null_screen_factory() -> ScreenFactory {
    Arc::new(|| Box::new(NullScreen))
}

/// Lifecycle events emitted around screen activation/deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenLifecycleEvent {
    WillAppear,
    DidAppear,
    WillDisappear,
    DidDisappear,
}

/// Contract implemented by the screens a tree instantiates.
///
/// Hooks run on the tree's dispatch path, so implementations should stay
/// quick and push slow work elsewhere.
pub trait Screen: Send {
    fn on_lifecycle(&mut self, event: ScreenLifecycleEvent) -> Result<()>;

    /// Called after mount, and again when a repeated navigation refreshes the
    /// params of an already-visible screen.
    fn on_params(&mut self, _params: &NavParams) -> Result<()> {
        Ok(())
    }
}

/// Screen that ignores every hook.
#[derive(Debug, Default)]
pub struct NullScreen;

impl Screen for NullScreen {
    fn on_lifecycle(&mut self, _event: ScreenLifecycleEvent) -> Result<()> {
        Ok(())
    }
}

/// One tab inside a wing's tab bar.
pub struct TabEntry {
    pub route: String,
    pub label: String,
    pub icon: String,
    pub factory: ScreenFactory,
}

impl TabEntry {
    pub fn new(route: impl Into<String>, label: &str, icon: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            label: sanitize_label(label),
            icon: icon.into(),
            factory: null_screen_factory(),
        }
    }

    pub fn with_factory(mut self, factory: ScreenFactory) -> Self {
        self.factory = factory;
        self
    }
}

/// One secondary screen reachable from anywhere inside the same flow.
pub struct StackEntry {
    pub route: String,
    pub title: String,
    pub factory: ScreenFactory,
}

impl StackEntry {
    pub fn new(route: impl Into<String>, title: &str) -> Self {
        Self {
            route: route.into(),
            title: sanitize_label(title),
            factory: null_screen_factory(),
        }
    }

    pub fn with_factory(mut self, factory: ScreenFactory) -> Self {
        self.factory = factory;
        self
    }
}

/// Presentation accents shared by every screen of a wing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WingTheme {
    pub accent: Color,
    pub header: bool,
}

impl Default for WingTheme {
    fn default() -> Self {
        Self {
            accent: Color::White,
            header: true,
        }
    }
}

impl WingTheme {
    pub fn new(accent: Color) -> Self {
        Self {
            accent,
            header: true,
        }
    }

    pub fn headerless(mut self) -> Self {
        self.header = false;
        self
    }
}

/// Declarative description of one role's navigator: a tab bar plus the
/// secondary screens stacked above it.
pub struct WingBlueprint {
    pub role: Role,
    pub root_route: &'static str,
    pub theme: WingTheme,
    pub tabs: Vec<TabEntry>,
    pub stack: Vec<StackEntry>,
}

impl WingBlueprint {
    pub fn new(role: Role, theme: WingTheme) -> Self {
        Self {
            role,
            root_route: routes::root_route(role),
            theme,
            tabs: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn tab(mut self, entry: TabEntry) -> Self {
        self.tabs.push(entry);
        self
    }

    pub fn screen(mut self, entry: StackEntry) -> Self {
        self.stack.push(entry);
        self
    }

    pub fn tab_entry(&self, route: &str) -> Option<&TabEntry> {
        self.tabs.iter().find(|tab| tab.route == route)
    }

    pub fn stack_entry(&self, route: &str) -> Option<&StackEntry> {
        self.stack.iter().find(|entry| entry.route == route)
    }

    pub fn declares(&self, route: &str) -> bool {
        self.tab_entry(route).is_some() || self.stack_entry(route).is_some()
    }

    fn declared_routes(&self) -> impl Iterator<Item = &str> {
        self.tabs
            .iter()
            .map(|tab| tab.route.as_str())
            .chain(self.stack.iter().map(|entry| entry.route.as_str()))
    }
}

/// Declarative description of the unauthenticated flow: one sign-in screen
/// plus secondary screens such as password recovery.
pub struct AuthBlueprint {
    pub root_route: &'static str,
    pub root_title: String,
    pub root_factory: ScreenFactory,
    pub stack: Vec<StackEntry>,
}

impl AuthBlueprint {
    pub fn new() -> Self {
        Self {
            root_route: routes::AUTH_ROOT,
            root_title: "Sign In".to_string(),
            root_factory: null_screen_factory(),
            stack: Vec::new(),
        }
    }

    pub fn with_root_title(mut self, title: &str) -> Self {
        self.root_title = sanitize_label(title);
        self
    }

    pub fn with_root_factory(mut self, factory: ScreenFactory) -> Self {
        self.root_factory = factory;
        self
    }

    pub fn screen(mut self, entry: StackEntry) -> Self {
        self.stack.push(entry);
        self
    }

    pub fn stack_entry(&self, route: &str) -> Option<&StackEntry> {
        self.stack.iter().find(|entry| entry.route == route)
    }
}

impl Default for AuthBlueprint {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated set of blueprints covering every role plus the auth flow.
///
/// `compose` refuses registries a tree could not mount cleanly: a wing per
/// role, at least one tab per wing, unique routes within each flow, and no
/// route shadowing a reserved root name.
pub struct NavRegistry {
    wings: HashMap<Role, WingBlueprint>,
    auth: AuthBlueprint,
}

impl NavRegistry {
    pub fn compose(wings: Vec<WingBlueprint>, auth: AuthBlueprint) -> Result<Self> {
        let mut by_role: HashMap<Role, WingBlueprint> = HashMap::new();

        for wing in wings {
            if by_role.contains_key(&wing.role) {
                return Err(NavError::DuplicateWing(wing.role.as_str().to_string()));
            }
            if wing.tabs.is_empty() {
                return Err(NavError::EmptyWing(wing.role.as_str().to_string()));
            }
            Self::check_routes(wing.root_route, wing.declared_routes())?;
            by_role.insert(wing.role, wing);
        }

        for role in Role::ALL {
            if !by_role.contains_key(&role) {
                return Err(NavError::MissingWing(role.as_str().to_string()));
            }
        }

        Self::check_routes(
            auth.root_route,
            auth.stack.iter().map(|entry| entry.route.as_str()),
        )?;

        Ok(Self {
            wings: by_role,
            auth,
        })
    }

    fn check_routes<'a>(owner: &str, declared: impl Iterator<Item = &'a str>) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        for route in declared {
            if routes::is_root(route) {
                return Err(NavError::ReservedRoute(route.to_string()));
            }
            if seen.contains(&route) {
                return Err(NavError::DuplicateRoute(
                    route.to_string(),
                    owner.to_string(),
                ));
            }
            seen.push(route);
        }
        Ok(())
    }

    /// Replaces the factory of every entry named `route`, across all wings
    /// and the auth flow. Binding the auth root route replaces the sign-in
    /// screen. Returns how many entries were updated.
    pub fn bind(&mut self, route: &str, factory: ScreenFactory) -> Result<usize> {
        let mut bound = 0usize;

        if route == self.auth.root_route {
            self.auth.root_factory = Arc::clone(&factory);
            bound += 1;
        }

        for wing in self.wings.values_mut() {
            for tab in wing.tabs.iter_mut().filter(|tab| tab.route == route) {
                tab.factory = Arc::clone(&factory);
                bound += 1;
            }
            for entry in wing.stack.iter_mut().filter(|entry| entry.route == route) {
                entry.factory = Arc::clone(&factory);
                bound += 1;
            }
        }
        for entry in self.auth.stack.iter_mut().filter(|entry| entry.route == route) {
            entry.factory = Arc::clone(&factory);
            bound += 1;
        }

        if bound == 0 {
            return Err(NavError::UnknownRoute(route.to_string()));
        }
        Ok(bound)
    }

    pub fn wing(&self, role: Role) -> Option<&WingBlueprint> {
        self.wings.get(&role)
    }

    pub fn auth(&self) -> &AuthBlueprint {
        &self.auth
    }
}

// Screen factories are opaque closures, so Debug is written by hand over the
// structural parts.
impl fmt::Debug for NavRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut roles: Vec<&'static str> = self.wings.keys().map(Role::as_str).collect();
        roles.sort_unstable();
        f.debug_struct("NavRegistry")
            .field("wings", &roles)
            .field("auth_root", &self.auth.root_route)
            .field("auth_stack", &self.auth.stack.len())
            .finish()
    }
}
