//! Process-wide diagnostics sink.
//!
//! The sink is a global observer the mesh, cache, and importer report into:
//! structured error records plus named timing samples. It has no control-flow
//! effect on callers; operations fail through their own return values and
//! additionally leave a record here.
//!
//! The sink is independent of any mesh and safe to use from any thread.
//! Recording is a no-op while disabled.
//!
//! ```
//! use cage::diagnostics::{self, Mode, Severity};
//!
//! diagnostics::enable(Mode::ErrorsOnly);
//! diagnostics::record(Severity::Error, "INVALID_VERTEX_INDEX", "bad index", "face 42");
//! assert!(diagnostics::has_errors());
//! diagnostics::disable();
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

/// Severity of a recorded problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The operation continued, possibly with degraded data.
    Warning,
    /// The operation aborted and left state untouched.
    Error,
    /// The mesh should be considered unusable.
    Fatal,
}

/// What the sink tracks. Modes are cumulative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Mode {
    /// Nothing; recording is a no-op.
    #[default]
    Disabled,
    /// Error records only.
    ErrorsOnly,
    /// Error records plus timing samples.
    ErrorsAndTiming,
    /// Everything.
    Full,
}

/// One structured diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// How bad it was.
    pub severity: Severity,
    /// Stable machine-readable code, e.g. `NON_MANIFOLD_EDGE`.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Additional context, e.g. `"face 42"`.
    pub context: String,
}

/// Aggregated timing samples for one named operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingStats {
    /// Number of samples.
    pub count: usize,
    /// Sum of all samples in milliseconds.
    pub total_ms: f64,
    /// Smallest sample.
    pub min_ms: f64,
    /// Largest sample.
    pub max_ms: f64,
}

impl TimingStats {
    fn new() -> Self {
        Self {
            count: 0,
            total_ms: 0.0,
            min_ms: f64::INFINITY,
            max_ms: 0.0,
        }
    }

    fn add_sample(&mut self, ms: f64) {
        self.count += 1;
        self.total_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);
    }

    /// Mean sample duration in milliseconds.
    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

#[derive(Default)]
struct Sink {
    mode: Mode,
    records: Vec<Record>,
    timings: HashMap<&'static str, TimingStats>,
}

static SINK: LazyLock<Mutex<Sink>> = LazyLock::new(|| Mutex::new(Sink::default()));

fn sink() -> std::sync::MutexGuard<'static, Sink> {
    // A panic while holding the lock only loses diagnostics, never mesh data.
    SINK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Enable the sink at the given mode.
pub fn enable(mode: Mode) {
    sink().mode = mode;
}

/// Disable the sink. Existing records are kept until [`clear`].
pub fn disable() {
    sink().mode = Mode::Disabled;
}

/// The current mode.
pub fn mode() -> Mode {
    sink().mode
}

/// Whether the sink is recording at all.
pub fn is_enabled() -> bool {
    mode() != Mode::Disabled
}

/// Drop all records and timing samples. The mode is unchanged.
pub fn clear() {
    let mut s = sink();
    s.records.clear();
    s.timings.clear();
}

/// Record a structured diagnostic. No-op while disabled.
///
/// Records are also forwarded to `tracing` at the matching level.
pub fn record(
    severity: Severity,
    code: &'static str,
    message: impl Into<String>,
    context: impl Into<String>,
) {
    let message = message.into();
    let context = context.into();

    let mut s = sink();
    if s.mode == Mode::Disabled {
        return;
    }

    match severity {
        Severity::Warning => tracing::warn!(code, context = %context, "{message}"),
        Severity::Error | Severity::Fatal => {
            tracing::error!(code, context = %context, "{message}")
        }
    }

    s.records.push(Record {
        severity,
        code,
        message,
        context,
    });
}

/// Whether any record of severity `Error` or `Fatal` exists.
pub fn has_errors() -> bool {
    sink().records.iter().any(|r| r.severity >= Severity::Error)
}

/// Whether any `Warning` record exists.
pub fn has_warnings() -> bool {
    sink()
        .records
        .iter()
        .any(|r| r.severity == Severity::Warning)
}

/// Whether any `Fatal` record exists.
pub fn has_fatal_errors() -> bool {
    sink().records.iter().any(|r| r.severity == Severity::Fatal)
}

/// Snapshot of all records, oldest first.
pub fn records() -> Vec<Record> {
    sink().records.clone()
}

/// The most recent record, if any.
pub fn last_error() -> Option<Record> {
    sink().records.last().cloned()
}

/// A human-readable summary of all records.
pub fn error_summary() -> String {
    let s = sink();
    if s.records.is_empty() {
        return "no diagnostics recorded".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} diagnostic record(s):", s.records.len());
    for r in &s.records {
        let sev = match r.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        };
        let _ = write!(out, "  [{sev}] {}: {}", r.code, r.message);
        if r.context.is_empty() {
            let _ = writeln!(out);
        } else {
            let _ = writeln!(out, " ({})", r.context);
        }
    }
    out
}

/// Whether timing samples are currently collected.
pub fn timing_enabled() -> bool {
    sink().mode >= Mode::ErrorsAndTiming
}

/// Push one timing sample. No-op below [`Mode::ErrorsAndTiming`].
pub fn record_timing(name: &'static str, ms: f64) {
    let mut s = sink();
    if s.mode < Mode::ErrorsAndTiming {
        return;
    }
    s.timings.entry(name).or_insert_with(TimingStats::new).add_sample(ms);
}

/// Snapshot of aggregated timings by name.
pub fn timings() -> HashMap<&'static str, TimingStats> {
    sink().timings.clone()
}

/// A human-readable summary of aggregated timings.
pub fn timing_summary() -> String {
    let s = sink();
    if s.timings.is_empty() {
        return "no timing samples recorded".to_string();
    }

    let mut names: Vec<_> = s.timings.keys().copied().collect();
    names.sort_unstable();

    let mut out = String::new();
    for name in names {
        let t = &s.timings[name];
        let _ = writeln!(
            out,
            "{name}: {} call(s), total {:.3} ms, min {:.3} ms, max {:.3} ms, mean {:.3} ms",
            t.count,
            t.total_ms,
            t.min_ms,
            t.max_ms,
            t.mean_ms()
        );
    }
    out
}

/// Scoped timer: takes a timestamp on creation and pushes one sample under
/// `name` when dropped, on every exit path.
pub struct ScopedTimer {
    name: &'static str,
    start: Option<Instant>,
}

impl ScopedTimer {
    /// Start a timer. Cheap when timing is not collected.
    pub fn new(name: &'static str) -> Self {
        let start = timing_enabled().then(Instant::now);
        Self { name, start }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            record_timing(self.name, start.elapsed().as_secs_f64() * 1e3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The sink is process-wide; serialize the tests that mutate it.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn serial() -> std::sync::MutexGuard<'static, ()> {
        TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn disabled_recording_is_noop() {
        let _guard = serial();
        disable();
        clear();

        record(Severity::Error, "NON_MANIFOLD_EDGE", "nope", "");
        assert!(!has_errors());
        assert!(records().is_empty());
        assert!(last_error().is_none());
    }

    // Other test threads may record into the shared sink while these run,
    // so assertions filter on codes no mesh operation emits.

    #[test]
    fn record_and_query_lifecycle() {
        let _guard = serial();
        enable(Mode::ErrorsOnly);
        clear();

        record(Severity::Warning, "TEST_LIFECYCLE_WARNING", "cycle", "face 3");
        record(Severity::Error, "TEST_LIFECYCLE_ERROR", "bad index", "face 4");

        assert!(has_warnings());
        assert!(has_errors());
        assert!(last_error().is_some());

        let all = records();
        let warning = all
            .iter()
            .find(|r| r.code == "TEST_LIFECYCLE_WARNING")
            .unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.context, "face 3");

        let error = all.iter().find(|r| r.code == "TEST_LIFECYCLE_ERROR").unwrap();
        assert_eq!(error.severity, Severity::Error);
        assert_eq!(error.message, "bad index");

        let summary = error_summary();
        assert!(summary.contains("TEST_LIFECYCLE_WARNING"));
        assert!(summary.contains("[ERROR] TEST_LIFECYCLE_ERROR"));

        clear();
        assert!(!records().iter().any(|r| r.code.starts_with("TEST_LIFECYCLE")));
        disable();
    }

    #[test]
    fn fatal_counts_as_error() {
        let _guard = serial();
        enable(Mode::ErrorsOnly);
        clear();

        record(Severity::Fatal, "TEST_FATAL", "broken", "");
        assert!(has_errors());
        assert!(has_fatal_errors());

        clear();
        disable();
    }

    #[test]
    fn timers_aggregate_by_name() {
        let _guard = serial();
        enable(Mode::ErrorsAndTiming);
        clear();

        record_timing("op", 2.0);
        record_timing("op", 4.0);
        record_timing("other", 1.0);

        let timings = timings();
        let op = &timings["op"];
        assert_eq!(op.count, 2);
        assert_eq!(op.total_ms, 6.0);
        assert_eq!(op.min_ms, 2.0);
        assert_eq!(op.max_ms, 4.0);
        assert_eq!(op.mean_ms(), 3.0);
        assert_eq!(timings["other"].count, 1);

        assert!(timing_summary().contains("op: 2 call(s)"));

        clear();
        disable();
    }

    #[test]
    fn scoped_timer_records_on_drop() {
        let _guard = serial();
        enable(Mode::ErrorsAndTiming);
        clear();

        {
            let _t = ScopedTimer::new("scoped");
        }
        assert_eq!(timings()["scoped"].count, 1);

        // Below ErrorsAndTiming nothing is collected.
        enable(Mode::ErrorsOnly);
        {
            let _t = ScopedTimer::new("scoped");
        }
        assert_eq!(timings()["scoped"].count, 1);

        clear();
        disable();
    }
}
