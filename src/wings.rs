//! Stock clinic wings: the tab bars and secondary screens each role sees.
//!
//! `clinic_registry` composes the default deployment. Callers bind real
//! screen factories onto it afterwards; unbound entries mount inert
//! placeholder screens, which is enough for routing tests and dry runs.

use crossterm::style::Color;

use crate::error::Result;
use crate::registry::{AuthBlueprint, NavRegistry, StackEntry, TabEntry, WingBlueprint, WingTheme};
use crate::session::Role;

pub const DASHBOARD: &str = "Dashboard";
pub const ATTENDANCE: &str = "Attendance";
pub const FEEDBACK: &str = "Feedback";
pub const STUDENTS: &str = "Students";
pub const PROFILE: &str = "Profile";
pub const THERAPISTS: &str = "Therapists";
pub const CHILDREN: &str = "Children";
pub const HOME: &str = "Home";
pub const REPORTS: &str = "Reports";
pub const LEAVE: &str = "Leave";
pub const PROGRAMS: &str = "Programs";
pub const VIDEO: &str = "VideoSession";
pub const FORGOT_PASSWORD: &str = "ForgotPassword";

/// Navigator registry for the stock clinic deployment.
pub fn clinic_registry() -> Result<NavRegistry> {
    NavRegistry::compose(
        vec![admin_wing(), therapist_wing(), parent_wing()],
        auth_flow(),
    )
}

fn admin_wing() -> WingBlueprint {
    WingBlueprint::new(Role::Admin, WingTheme::new(Color::Magenta))
        .tab(TabEntry::new(DASHBOARD, "Dashboard", "grid"))
        .tab(TabEntry::new(THERAPISTS, "Therapists", "people"))
        .tab(TabEntry::new(CHILDREN, "Children", "happy"))
        .tab(TabEntry::new(PROFILE, "Profile", "person"))
        .screen(StackEntry::new(REPORTS, "Reports"))
        .screen(StackEntry::new(LEAVE, "Leave Requests"))
        .screen(StackEntry::new(PROGRAMS, "Programs"))
}

fn therapist_wing() -> WingBlueprint {
    WingBlueprint::new(Role::Therapist, WingTheme::new(Color::Cyan))
        .tab(TabEntry::new(DASHBOARD, "Dashboard", "grid"))
        .tab(TabEntry::new(ATTENDANCE, "Attendance", "checkbox"))
        .tab(TabEntry::new(FEEDBACK, "Feedback", "chatbubbles"))
        .tab(TabEntry::new(STUDENTS, "Students", "school"))
        .tab(TabEntry::new(PROFILE, "Profile", "person"))
        .screen(StackEntry::new(REPORTS, "Reports"))
        .screen(StackEntry::new(LEAVE, "Apply Leave"))
        .screen(StackEntry::new(PROGRAMS, "Programs"))
        .screen(StackEntry::new(VIDEO, "Video Session"))
}

fn parent_wing() -> WingBlueprint {
    WingBlueprint::new(Role::Parent, WingTheme::new(Color::Green))
        .tab(TabEntry::new(HOME, "Home", "home"))
        .tab(TabEntry::new(FEEDBACK, "Feedback", "chatbubbles"))
        .tab(TabEntry::new(PROFILE, "Profile", "person"))
        .screen(StackEntry::new(VIDEO, "Video Session"))
        .screen(StackEntry::new(REPORTS, "Progress Reports"))
}

fn auth_flow() -> AuthBlueprint {
    AuthBlueprint::new().screen(StackEntry::new(FORGOT_PASSWORD, "Forgot Password"))
}
