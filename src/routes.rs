//! Canonical root route names and role mapping.
//!
//! Each role owns exactly one root route; the unauthenticated flow owns the
//! fourth. Every reset lands on one of these four names, so they are reserved
//! and may not be reused for tabs or stack screens.

use crate::session::Role;

pub const AUTH_ROOT: &str = "Auth";
pub const ADMIN_ROOT: &str = "AdminApp";
pub const THERAPIST_ROOT: &str = "TherapistApp";
pub const PARENT_ROOT: &str = "ParentApp";

/// Root route for an authenticated role.
pub fn root_route(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_ROOT,
        Role::Therapist => THERAPIST_ROOT,
        Role::Parent => PARENT_ROOT,
    }
}

/// Root route for a raw role string. Unrecognized roles land on the parent
/// root, the least privileged authenticated flow.
pub fn root_route_for(role: &str) -> &'static str {
    match Role::parse(role) {
        Some(role) => root_route(role),
        None => PARENT_ROOT,
    }
}

/// Whether `route` names one of the four reserved roots.
pub fn is_root(route: &str) -> bool {
    [AUTH_ROOT, ADMIN_ROOT, THERAPIST_ROOT, PARENT_ROOT].contains(&route)
}

/// Maps a root route name back to its static form, or `None` when the name
/// is not a root.
pub fn canonicalize_root(route: &str) -> Option<&'static str> {
    [AUTH_ROOT, ADMIN_ROOT, THERAPIST_ROOT, PARENT_ROOT]
        .into_iter()
        .find(|root| *root == route)
}

/// Role that owns a root route. `None` for the auth root and non-roots.
pub fn role_of_root(route: &str) -> Option<Role> {
    if route == ADMIN_ROOT {
        Some(Role::Admin)
    } else if route == THERAPIST_ROOT {
        Some(Role::Therapist)
    } else if route == PARENT_ROOT {
        Some(Role::Parent)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_role_maps_to_its_root() {
        assert_eq!(root_route(Role::Admin), "AdminApp");
        assert_eq!(root_route(Role::Therapist), "TherapistApp");
        assert_eq!(root_route(Role::Parent), "ParentApp");
    }

    #[test]
    fn unknown_roles_fall_back_to_parent() {
        assert_eq!(root_route_for("admin"), ADMIN_ROOT);
        assert_eq!(root_route_for("Therapist"), THERAPIST_ROOT);
        assert_eq!(root_route_for("supervisor"), PARENT_ROOT);
        assert_eq!(root_route_for(""), PARENT_ROOT);
    }

    #[test]
    fn roots_are_reserved_and_round_trip() {
        for root in [AUTH_ROOT, ADMIN_ROOT, THERAPIST_ROOT, PARENT_ROOT] {
            assert!(is_root(root));
            assert_eq!(canonicalize_root(root), Some(root));
        }
        assert!(!is_root("Dashboard"));
        assert_eq!(canonicalize_root("Dashboard"), None);
    }

    #[test]
    fn role_of_root_skips_auth() {
        assert_eq!(role_of_root(ADMIN_ROOT), Some(Role::Admin));
        assert_eq!(role_of_root(AUTH_ROOT), None);
        assert_eq!(role_of_root("Reports"), None);
    }
}
