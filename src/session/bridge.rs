use serde_json::json;

use crate::logging::{LogFields, LogLevel, Logger, field_map};
use crate::router::SharedRouter;

use super::core::UserClaims;

const BRIDGE_TARGET: &str = "reception::session";

/// Authentication outcomes the backend surface reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(UserClaims),
    SignedOut,
}

/// Translates auth events into router commands.
///
/// The bridge is deliberately thin: it trusts the router's no-throw contract,
/// so auth handling never has to care whether the UI is ready.
pub struct SessionBridge {
    router: SharedRouter,
    logger: Option<Logger>,
}

impl SessionBridge {
    pub fn new(router: SharedRouter) -> Self {
        Self {
            router,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn handle(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(claims) => {
                self.log("signed_in", |fields| {
                    fields.insert("user".to_string(), json!(claims.id));
                    fields.insert("role".to_string(), json!(claims.role));
                });
                self.router.reset_to_role_root(&claims.role);
            }
            AuthEvent::SignedOut => {
                self.log("signed_out", |_| {});
                self.router.reset_to_unauthenticated();
            }
        }
    }

    fn log<F>(&self, message: &str, fill: F)
    where
        F: FnOnce(&mut LogFields),
    {
        if let Some(logger) = &self.logger {
            let mut fields = field_map();
            fill(&mut fields);
            let _ = logger.log_with_fields(LogLevel::Info, BRIDGE_TARGET, message, fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::SessionRouter;
    use crate::routes;
    use crate::session::Role;
    use crate::tree::SessionTree;
    use crate::wings::clinic_registry;

    fn claims(role: &str) -> UserClaims {
        UserClaims::new("u-1", "Sam", role)
    }

    #[test]
    fn sign_in_routes_to_the_role_wing() {
        let tree = SessionTree::new(clinic_registry().unwrap()).unwrap();
        let router = SessionRouter::new();
        router.attach(&tree);
        let bridge = SessionBridge::new(router.clone());

        bridge.handle(AuthEvent::SignedIn(claims("admin")));

        assert_eq!(tree.role().unwrap(), Some(Role::Admin));
        assert_eq!(router.session().role, Some(Role::Admin));
        let snapshot = tree.snapshot().unwrap();
        assert_eq!(snapshot.routes.first().map(String::as_str), Some(routes::ADMIN_ROOT));
    }

    #[test]
    fn sign_out_returns_to_the_auth_flow() {
        let tree = SessionTree::new(clinic_registry().unwrap()).unwrap();
        let router = SessionRouter::new();
        router.attach(&tree);
        let bridge = SessionBridge::new(router.clone());

        bridge.handle(AuthEvent::SignedIn(claims("therapist")));
        bridge.handle(AuthEvent::SignedOut);

        assert_eq!(tree.role().unwrap(), None);
        assert_eq!(tree.snapshot().unwrap().routes, vec![routes::AUTH_ROOT]);
        assert_eq!(router.session().role, None);
    }

    #[test]
    fn unknown_backend_roles_land_on_the_parent_wing() {
        let tree = SessionTree::new(clinic_registry().unwrap()).unwrap();
        let router = SessionRouter::new();
        router.attach(&tree);
        let bridge = SessionBridge::new(router.clone());

        bridge.handle(AuthEvent::SignedIn(claims("supervisor")));

        assert_eq!(tree.role().unwrap(), Some(Role::Parent));
        assert_eq!(router.session().role, Some(Role::Parent));
    }

    #[test]
    fn events_before_tree_readiness_are_dropped() {
        let router = SessionRouter::new();
        let bridge = SessionBridge::new(router.clone());

        bridge.handle(AuthEvent::SignedIn(claims("admin")));
        bridge.handle(AuthEvent::SignedOut);

        let session = router.session();
        assert!(!session.ready);
        assert_eq!(session.role, None);
    }
}
