//! Registry module orchestrator following the RSB module specification.
//!
//! Downstream crates import navigator blueprints from here while the
//! implementation details live in the private `core` module.

mod core;

pub use core::{
    AuthBlueprint, NavParams, NavRegistry, NullScreen, Screen, ScreenFactory,
    ScreenLifecycleEvent, StackEntry, TabEntry, WingBlueprint, WingTheme, nav_params,
    null_screen_factory, screen_factory,
};
