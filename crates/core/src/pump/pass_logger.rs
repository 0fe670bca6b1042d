use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for detection pass events.
///
/// Keeps the pump free of output concerns so the CLI can report timings
/// while tests stay silent.
pub trait PassLogger: Send {
    /// Report that a pass finished rendering with `shapes` annotations.
    fn pass_completed(&mut self, pass_id: u64, shapes: usize);

    /// Record how long a named stage took for one pass.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. ticks dropped while busy).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPassLogger;

impl PassLogger for NullPassLogger {
    fn pass_completed(&mut self, _pass_id: u64, _shapes: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate of one timing stage or metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aggregate {
    pub count: u64,
    pub total: f64,
    pub max: f64,
}

impl Aggregate {
    fn record(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.total += value;
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// CLI-oriented logger that tracks per-stage timing and metrics and
/// reports a summary when the pump stops.
///
/// Only running aggregates are kept, so storage stays constant however long
/// the pump runs. Pass completions are logged every `throttle_passes` passes.
pub struct StdoutPassLogger {
    throttle_passes: u64,
    timings: HashMap<String, Aggregate>,
    metrics: HashMap<String, Aggregate>,
    start_time: Instant,
    passes: u64,
}

impl StdoutPassLogger {
    pub fn new(throttle_passes: u64) -> Self {
        Self {
            throttle_passes: throttle_passes.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            passes: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let passes = self.passes;
        let mut lines = vec![format!(
            "Pump summary ({passes} passes, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let timing = &self.timings[stage];
            let (avg_ms, max_ms, total_ms) = (timing.average(), timing.max, timing.total);
            lines.push(format!(
                "  {stage:16}: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            lines.push(format!("  {name}: avg {:.1}", self.metrics[name].average()));
        }

        if passes > 0 && elapsed_ms > 0.0 {
            let rate = passes as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.1} passes/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<Aggregate> {
        self.timings.get(stage).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<Aggregate> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutPassLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PassLogger for StdoutPassLogger {
    fn pass_completed(&mut self, pass_id: u64, shapes: usize) {
        self.passes += 1;
        if self.passes % self.throttle_passes == 0 {
            log::info!("Pass {pass_id}: {shapes} shapes ({} passes so far)", self.passes);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
