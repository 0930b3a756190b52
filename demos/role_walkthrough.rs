//! Walks one simulated day of sessions through the router: sign in as each
//! role, move around the wing, then sign out. Run with
//! `cargo run --example role_walkthrough`.

use std::time::Instant;

use serde_json::json;

use reception::{
    AuthEvent, LogEvent, LogLevel, LogSink, Logger, LoggingResult, NavParams, Result, RouterConfig,
    Screen, ScreenLifecycleEvent, SessionBridge, SessionRouter, SessionTree, TransitionLogger,
    TreeConfig, TreeObserver, TreeSnapshot, UserClaims, clinic_registry, nav_params,
    screen_factory, shared_metrics, wings,
};

/// Sink that prints each JSON log line straight to stdout.
struct PrintSink;

impl LogSink for PrintSink {
    fn log(&self, event: &LogEvent) -> LoggingResult<()> {
        println!("{}", serde_json::to_string(event)?);
        Ok(())
    }
}

/// Observer that prints the breadcrumb trail after every transition.
struct TrailPrinter;

impl TreeObserver for TrailPrinter {
    fn on_transition(&mut self, snapshot: &TreeSnapshot) {
        println!("    trail: {}", snapshot.trail_line(100));
    }
}

/// Screen that announces its lifecycle so the interleave is visible.
struct AnnouncingScreen {
    name: &'static str,
}

impl Screen for AnnouncingScreen {
    fn on_lifecycle(&mut self, event: ScreenLifecycleEvent) -> Result<()> {
        println!("    [{}] {event:?}", self.name);
        Ok(())
    }

    fn on_params(&mut self, params: &NavParams) -> Result<()> {
        if !params.is_empty() {
            println!("    [{}] params {}", self.name, json!(params));
        }
        Ok(())
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let metrics = shared_metrics();
    let logger = Logger::new(PrintSink).with_min_level(LogLevel::Info);

    let mut registry = clinic_registry()?;
    registry.bind(
        wings::REPORTS,
        screen_factory(|| AnnouncingScreen { name: "Reports" }),
    )?;
    registry.bind(
        wings::VIDEO,
        screen_factory(|| AnnouncingScreen { name: "VideoSession" }),
    )?;

    let tree = SessionTree::with_config(
        registry,
        TreeConfig {
            logger: Some(logger.clone()),
            metrics: Some(metrics.clone()),
            audit: None,
        },
    )?;
    tree.observe(TrailPrinter);
    tree.observe(TransitionLogger::new(logger.clone()).with_level(LogLevel::Info));

    let router = SessionRouter::with_config(RouterConfig {
        logger: Some(logger.clone()),
        metrics: Some(metrics.clone()),
        audit: None,
    });
    let bridge = SessionBridge::new(router.clone()).with_logger(logger);

    println!("== before the tree is attached, commands drop silently ==");
    router.navigate_to(wings::REPORTS, nav_params());
    router.attach(&tree);

    println!("\n== therapist signs in ==");
    bridge.handle(AuthEvent::SignedIn(UserClaims::new(
        "u-204",
        "Priya",
        "therapist",
    )));

    println!("\n== moving through the therapist wing ==");
    router.navigate_to(wings::ATTENDANCE, nav_params());
    let mut params = nav_params();
    params.insert("studentId".to_string(), json!("s-11"));
    router.navigate_to(wings::REPORTS, params);
    router.navigate_to(wings::VIDEO, nav_params());
    if tree.pop()? {
        println!("    (back)");
    }

    println!("\n== backend sends a role nobody declared ==");
    bridge.handle(AuthEvent::SignedIn(UserClaims::new(
        "u-900",
        "Alex",
        "supervisor",
    )));

    println!("\n== sign out ==");
    bridge.handle(AuthEvent::SignedOut);

    if let Ok(guard) = metrics.lock() {
        let snapshot = guard.snapshot(started.elapsed());
        println!("\n== traffic ==");
        println!("{}", serde_json::to_string_pretty(&snapshot.as_fields())?);
    }

    Ok(())
}
