//! Transition observers for the session tree.
//!
//! Every structural change produces a [`TreeSnapshot`]; observers registered
//! with the tree receive each distinct snapshot exactly once. Deduplication
//! rides on a content hash so a refresh that leaves the visible stack
//! unchanged stays quiet.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use blake3::Hash;
use serde::Serialize;
use serde_json::json;

use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::SharedMetrics;
use crate::session::Role;
use crate::width::truncate_display;

/// Immutable view of the visible navigation stack after a transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSnapshot {
    /// Route trail from the root container down to the visible screen.
    pub routes: Vec<String>,
    /// Visible stack depth. The mounted root counts as one.
    pub depth: usize,
    pub role: Option<Role>,
    pub active_tab: Option<String>,
}

impl TreeSnapshot {
    /// Breadcrumb trail clipped to `max_width` display columns.
    pub fn trail_line(&self, max_width: usize) -> String {
        truncate_display(&self.routes.join(" › "), max_width)
    }

    pub fn content_hash(&self) -> Hash {
        match serde_json::to_vec(self) {
            Ok(bytes) => blake3::hash(&bytes),
            Err(_) => blake3::hash(self.routes.join("\u{1f}").as_bytes()),
        }
    }
}

/// Contract implemented by transition observers.
pub trait TreeObserver: Send {
    fn on_transition(&mut self, snapshot: &TreeSnapshot);
}

#[derive(Default)]
struct ObserverInner {
    observers: Vec<Box<dyn TreeObserver>>,
    last_hash: Option<Hash>,
}

/// Observer collection with last-snapshot dedupe. Shared by the tree.
#[derive(Default)]
pub(crate) struct ObserverSet {
    inner: Mutex<ObserverInner>,
}

impl ObserverSet {
    pub(crate) fn register(&self, observer: Box<dyn TreeObserver>) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.observers.push(observer);
        }
    }

    /// Fans `snapshot` out to every observer unless it hashes identically to
    /// the previous one.
    pub(crate) fn notify(&self, snapshot: &TreeSnapshot) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        let hash = snapshot.content_hash();
        if guard.last_hash == Some(hash) {
            return;
        }
        guard.last_hash = Some(hash);
        for observer in guard.observers.iter_mut() {
            observer.on_transition(snapshot);
        }
    }
}

/// Logs each transition for observability/debugging.
pub struct TransitionLogger {
    logger: Logger,
    level: LogLevel,
    target: String,
    trail_width: usize,
}

impl TransitionLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            target: "reception::tree.transition".to_string(),
            trail_width: 120,
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

    pub fn with_trail_width(mut self, width: usize) -> Self {
        self.trail_width = width;
        self
    }
}

impl TreeObserver for TransitionLogger {
    fn on_transition(&mut self, snapshot: &TreeSnapshot) {
        let role = snapshot
            .role
            .map(|role| role.as_str().to_string())
            .unwrap_or_else(|| "unauthenticated".to_string());
        let event = event_with_fields(
            self.level,
            &self.target,
            "transition",
            [
                json_kv("trail", json!(snapshot.trail_line(self.trail_width))),
                json_kv("depth", json!(snapshot.depth)),
                json_kv("role", json!(role)),
            ],
        );
        let _ = self.logger.log_event(event);
    }
}

/// Periodically emits router metric snapshots through the provided logger.
///
/// Piggybacks on transitions rather than a timer thread; an interval of zero
/// disables emission entirely.
pub struct MetricsReporter {
    logger: Logger,
    metrics: SharedMetrics,
    target: String,
    interval: Duration,
    last_emit: Option<Instant>,
    started_at: Instant,
}

impl MetricsReporter {
    pub fn new(logger: Logger, metrics: SharedMetrics) -> Self {
        Self {
            logger,
            metrics,
            target: "reception::router.metrics".to_string(),
            interval: Duration::from_secs(5),
            last_emit: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    fn emit_snapshot(&mut self) {
        if self.interval == Duration::from_millis(0) {
            return;
        }

        let now = Instant::now();
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.interval {
                return;
            }
        }

        self.last_emit = Some(now);
        let uptime = now.duration_since(self.started_at);

        if let Ok(guard) = self.metrics.lock() {
            let event = guard.snapshot(uptime).to_log_event(&self.target);
            let _ = self.logger.log_event(event);
        }
    }
}

impl TreeObserver for MetricsReporter {
    fn on_transition(&mut self, _snapshot: &TreeSnapshot) {
        self.emit_snapshot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::metrics::shared_metrics;
    use std::sync::Arc;

    fn snapshot(routes: &[&str], depth: usize) -> TreeSnapshot {
        TreeSnapshot {
            routes: routes.iter().map(|r| r.to_string()).collect(),
            depth,
            role: Some(Role::Admin),
            active_tab: Some("Dashboard".to_string()),
        }
    }

    struct CountingObserver {
        seen: Arc<Mutex<Vec<usize>>>,
    }

    impl TreeObserver for CountingObserver {
        fn on_transition(&mut self, snapshot: &TreeSnapshot) {
            if let Ok(mut guard) = self.seen.lock() {
                guard.push(snapshot.depth);
            }
        }
    }

    #[test]
    fn identical_snapshots_notify_once() {
        let set = ObserverSet::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        set.register(Box::new(CountingObserver { seen: seen.clone() }));

        let first = snapshot(&["AdminApp", "Dashboard"], 1);
        set.notify(&first);
        set.notify(&first);
        set.notify(&snapshot(&["AdminApp", "Dashboard", "Reports"], 2));
        set.notify(&first);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1]);
    }

    #[test]
    fn trail_line_clips_to_width() {
        let snap = snapshot(&["AdminApp", "Dashboard", "Reports"], 2);
        assert_eq!(snap.trail_line(80), "AdminApp › Dashboard › Reports");
        let clipped = snap.trail_line(12);
        assert!(clipped.ends_with('…'));
    }

    #[test]
    fn transition_logger_emits_structured_fields() {
        let sink = MemorySink::new();
        let mut logger = TransitionLogger::new(Logger::new(sink.clone()))
            .with_level(LogLevel::Info)
            .with_target("reception::shell.transition")
            .with_trail_width(12);
        logger.on_transition(&snapshot(&["AdminApp", "Children"], 1));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "transition");
        assert_eq!(events[0].target, "reception::shell.transition");
        assert_eq!(events[0].fields["depth"], json!(1));
        assert_eq!(events[0].fields["role"], json!("admin"));
        let trail = events[0].fields["trail"].as_str().unwrap_or_default();
        assert!(trail.ends_with('…'), "trail should clip to the configured width");
    }

    #[test]
    fn metrics_reporter_respects_interval() {
        let sink = MemorySink::new();
        let metrics = shared_metrics();
        let mut reporter = MetricsReporter::new(Logger::new(sink.clone()), metrics.clone())
            .with_interval(Duration::from_secs(3600))
            .with_target("reception::shell.metrics");

        let snap = snapshot(&["Auth"], 1);
        reporter.on_transition(&snap);
        reporter.on_transition(&snap);
        let events = sink.events();
        assert_eq!(events.len(), 1, "first transition emits, second waits");
        assert_eq!(events[0].target, "reception::shell.metrics");

        let mut disabled = MetricsReporter::new(Logger::new(sink.clone()), metrics)
            .with_interval(Duration::from_millis(0));
        disabled.on_transition(&snap);
        assert_eq!(sink.events().len(), 1, "zero interval disables emission");
    }
}
