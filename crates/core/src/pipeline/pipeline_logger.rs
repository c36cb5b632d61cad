use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for stream processing events.
///
/// Decouples the stream loop from specific output mechanisms so callers can
/// observe throughput and stage costs without touching the orchestration
/// code. Nothing here may write to stdout, which carries result lines only.
pub trait PipelineLogger: Send {
    /// Report how many frames have been emitted so far. The stream is
    /// open-ended, so there is no total.
    fn progress(&mut self, frames: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-stream summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _frames: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count and sum of one recorded series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStat {
    pub count: u64,
    pub total: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Worker logger that tracks per-stage timing and metrics through the `log`
/// facade, with a summary report at end of stream.
///
/// Progress output is throttled to every `throttle_frames` frames. Memory
/// stays constant however long the stream runs: only aggregates are kept.
pub struct LogPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, RunningStat>,
    metrics: HashMap<String, RunningStat>,
    start_time: Instant,
    total_frames: usize,
    messages: Vec<String>,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.total_frames;
        let mut lines = Vec::new();

        lines.push(format!(
            "Stream summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let stat = self.timings[stage];
            let total_ms = stat.total;
            let avg_ms = stat.mean();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:8}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let avg = self.metrics[name].mean();
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<RunningStat> {
        self.timings.get(stage).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<RunningStat> {
        self.metrics.get(name).copied()
    }

    /// Whether `frames` lands on a progress report boundary.
    fn should_report(&self, frames: usize) -> bool {
        frames > 0 && frames % self.throttle_frames == 0
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, frames: usize) {
        self.total_frames = frames;
        if self.should_report(frames) {
            log::info!("Processed {frames} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        match self.timings.get_mut(stage) {
            Some(stat) => stat.record(duration_ms),
            None => {
                let mut stat = RunningStat::default();
                stat.record(duration_ms);
                self.timings.insert(stage.to_string(), stat);
            }
        }
    }

    fn metric(&mut self, name: &str, value: f64) {
        match self.metrics.get_mut(name) {
            Some(stat) => stat.record(value),
            None => {
                let mut stat = RunningStat::default();
                stat.record(value);
                self.metrics.insert(name.to_string(), stat);
            }
        }
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
