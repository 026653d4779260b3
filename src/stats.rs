//! Optional, injectable observability sink (§9 "global singleton
//! statistics sink" re-architected as a trait object instead of a
//! process-wide singleton, so tests stay hermetic).
//!
//! Every call site checks `Option::is_some` before doing any work, so a
//! disabled sink costs one pointer compare, never a virtual call.

use std::time::Instant;

/// Receives named timing intervals and string counters. Interval names
/// nest: starting `"insert"` while `"build"` is open produces the joined
/// name `"build/insert"` once `"insert"` stops, mirroring the original
/// `statistics_collector`'s stack-based joining.
pub trait StatsSink: Send + Sync {
    fn record_interval(&self, name: &str, duration_us: u64);
    fn record_counter(&self, key: &str, value: &str);
}

/// The default, zero-cost sink: every method is a no-op the optimizer can
/// remove entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl StatsSink for NoopSink {
    #[inline(always)]
    fn record_interval(&self, _name: &str, _duration_us: u64) {}
    #[inline(always)]
    fn record_counter(&self, _key: &str, _value: &str) {}
}

/// A simple in-memory collector, useful for the CLI's `--stats` flag and
/// for benchmark harnesses that want to print a breakdown afterwards.
#[derive(Debug, Default)]
pub struct RecordingSink {
    intervals: std::sync::Mutex<Vec<(String, u64)>>,
    counters: std::sync::Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intervals(&self) -> Vec<(String, u64)> {
        self.intervals.lock().unwrap().clone()
    }

    pub fn counters(&self) -> Vec<(String, String)> {
        self.counters.lock().unwrap().clone()
    }
}

impl StatsSink for RecordingSink {
    fn record_interval(&self, name: &str, duration_us: u64) {
        self.intervals
            .lock()
            .unwrap()
            .push((name.to_string(), duration_us));
    }

    fn record_counter(&self, key: &str, value: &str) {
        self.counters
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
    }
}

/// A nestable stopwatch scope: dropping it records the elapsed interval
/// against its fully-qualified, `/`-joined name.
pub struct Measure<'a> {
    sink: &'a dyn StatsSink,
    name: String,
    start: Instant,
}

impl<'a> Measure<'a> {
    pub fn start(sink: &'a dyn StatsSink, parent: Option<&str>, name: &str) -> Self {
        let full_name = match parent {
            Some(p) => format!("{p}/{name}"),
            None => name.to_string(),
        };
        Measure {
            sink,
            name: full_name,
            start: Instant::now(),
        }
    }
}

impl Drop for Measure<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_micros() as u64;
        self.sink.record_interval(&self.name, elapsed);
    }
}
