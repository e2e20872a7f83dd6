use std::collections::HashMap;
use std::time::Instant;

const PHASE_ORDER: &[&str] = &["extract", "compare", "group", "match", "aggregate"];

/// Observer for one batch moving through the resolve pipeline.
///
/// Phases are `extract`, `compare`, `group`, `match` and `aggregate`.
pub trait PipelineLogger: Send {
    /// Items done so far within `phase`.
    fn progress(&mut self, phase: &str, current: usize, total: usize);

    fn timing(&mut self, phase: &str, duration_ms: f64);

    /// Counts such as `faces`, `edges`, `groups` or `candidates`.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Called once when the batch is done. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used by tests and embedders with their own reporting.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _phase: &str, _current: usize, _total: usize) {}
    fn timing(&mut self, _phase: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Forwards events to the `log` facade and keeps phase timings and counts
/// for an end-of-batch report.
///
/// Progress goes out at `debug`, one line every `throttle` items.
pub struct LogPipelineLogger {
    throttle: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    messages: Vec<String>,
}

impl LogPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!("Batch summary ({elapsed_ms:.1}ms wall clock)")];

        let mut counts: Vec<(&String, f64)> = self
            .metrics
            .iter()
            .filter_map(|(name, values)| values.last().map(|v| (name, *v)))
            .collect();
        counts.sort_by(|a, b| a.0.cmp(b.0));
        if !counts.is_empty() {
            let joined: Vec<String> = counts
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect();
            lines.push(format!("  {}", joined.join(", ")));
        }

        for phase in PHASE_ORDER {
            if let Some(durations) = self.timings.get(*phase) {
                let total_ms: f64 = durations.iter().sum();
                lines.push(format!("  {phase:<9} {total_ms:>8.2}ms"));
            }
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given phase.
    pub fn timings_for(&self, phase: &str) -> Option<&[f64]> {
        self.timings.get(phase).map(|v| v.as_slice())
    }

    /// Returns the metric data for a given name.
    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, phase: &str, current: usize, total: usize) {
        if total > 0 && (current % self.throttle == 0 || current == total) {
            log::debug!("{phase}: {current}/{total}");
        }
    }

    fn timing(&mut self, phase: &str, duration_ms: f64) {
        self.timings
            .entry(phase.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
