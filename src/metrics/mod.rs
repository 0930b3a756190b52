//! Counters for navigation traffic.
//!
//! The router records what it accepted or refused; the tree records what it
//! actually did to the screen stack. Snapshots flatten into log fields so a
//! periodic reporter can emit them through the normal logging path.

use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type SharedMetrics = Arc<Mutex<RouterMetrics>>;

pub fn shared_metrics() -> SharedMetrics {
    Arc::new(Mutex::new(RouterMetrics::new()))
}

#[derive(Debug, Default, Clone)]
pub struct RouterMetrics {
    dispatched: u64,
    dropped: u64,
    resets: u64,
    tab_selects: u64,
    pushes: u64,
    pops: u64,
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A command reached an attached tree.
    pub fn record_dispatched(&mut self) {
        self.dispatched = self.dispatched.saturating_add(1);
    }

    /// A command arrived with no tree to receive it.
    pub fn record_dropped(&mut self) {
        self.dropped = self.dropped.saturating_add(1);
    }

    pub fn record_reset(&mut self) {
        self.resets = self.resets.saturating_add(1);
    }

    pub fn record_tab_select(&mut self) {
        self.tab_selects = self.tab_selects.saturating_add(1);
    }

    pub fn record_push(&mut self) {
        self.pushes = self.pushes.saturating_add(1);
    }

    pub fn record_pops(&mut self, count: usize) {
        if count > 0 {
            self.pops = self.pops.saturating_add(count as u64);
        }
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            dispatched: self.dispatched,
            dropped: self.dropped,
            resets: self.resets,
            tab_selects: self.tab_selects,
            pushes: self.pushes,
            pops: self.pops,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub dispatched: u64,
    pub dropped: u64,
    pub resets: u64,
    pub tab_selects: u64,
    pub pushes: u64,
    pub pops: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(
            LogLevel::Info,
            target.to_string(),
            "router_metrics".to_string(),
            self.as_fields(),
        )
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("dispatched".to_string(), json!(self.dispatched));
        map.insert("dropped".to_string(), json!(self.dropped));
        map.insert("resets".to_string(), json!(self.resets));
        map.insert("tab_selects".to_string(), json!(self.tab_selects));
        map.insert("pushes".to_string(), json!(self.pushes));
        map.insert("pops".to_string(), json!(self.pops));
        map
    }
}
