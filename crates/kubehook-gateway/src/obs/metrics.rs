//! In-process metrics registry for the receiver.
//!
//! Counters and histograms with dynamic labels backed by `DashMap`, values held
//! in atomics so concurrent requests never lose an increment. Labels are
//! flattened into sorted key vectors to keep deterministic ordering. Histogram
//! buckets are fixed in microseconds to avoid floating point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value. `add(labels, 0)` registers the series.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value of one series (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Sum over all series.
    pub fn total(&self) -> u64 {
        self.map.iter().map(|r| r.value().load(Ordering::Relaxed)).sum()
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let label_str = render_labels(r.key());
            if label_str.is_empty() {
                let _ = writeln!(out, "{} {}", name, val);
            } else {
                let _ = writeln!(out, "{}{{{}}} {}", name, label_str, val);
            }
        }
    }
}

// Fixed Buckets in Microseconds (µs)
// 100us, 500us, 1ms, 5ms, 10ms, 50ms, 100ms, 500ms, 1s
const BUCKETS_MICROS: [u64; 9] = [100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self.map.entry(label_key(labels)).or_default();
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations for one series.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format (unit: microseconds).
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let hist = r.value();
            let label_str = render_labels(r.key());
            let prefix = if label_str.is_empty() { String::new() } else { format!("{},", label_str) };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, count);
        }
    }
}

/// All receiver metrics. Constructed once and shared via `Arc`; the
/// dispatcher and every processor get a handle at construction time.
pub struct GatewayMetrics {
    pub incoming_requests: CounterVec,
    /// Labels: `kind`.
    pub review_requests: CounterVec,
    pub admission_processed: CounterVec,
    pub admission_allowed: CounterVec,
    pub admission_denied: CounterVec,
    pub authorization_processed: CounterVec,
    pub authorization_allowed: CounterVec,
    pub authorization_denied: CounterVec,
    pub event_lists_processed: CounterVec,
    pub events_processed: CounterVec,
    /// Labels: `code`.
    pub dispatch_errors: CounterVec,
    /// Labels: `path`. In microseconds.
    pub http_duration: HistogramVec,
    /// Labels: `kind`. In microseconds.
    pub dispatch_duration: HistogramVec,
    draining: AtomicBool,
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayMetrics {
    pub fn new() -> Self {
        let m = Self {
            incoming_requests: CounterVec::default(),
            review_requests: CounterVec::default(),
            admission_processed: CounterVec::default(),
            admission_allowed: CounterVec::default(),
            admission_denied: CounterVec::default(),
            authorization_processed: CounterVec::default(),
            authorization_allowed: CounterVec::default(),
            authorization_denied: CounterVec::default(),
            event_lists_processed: CounterVec::default(),
            events_processed: CounterVec::default(),
            dispatch_errors: CounterVec::default(),
            http_duration: HistogramVec::default(),
            dispatch_duration: HistogramVec::default(),
            draining: AtomicBool::new(false),
        };
        // Unlabeled series are exported at zero from the start.
        for c in [
            &m.incoming_requests,
            &m.admission_processed,
            &m.admission_allowed,
            &m.admission_denied,
            &m.authorization_processed,
            &m.authorization_allowed,
            &m.authorization_denied,
            &m.event_lists_processed,
            &m.events_processed,
        ] {
            c.add(&[], 0);
        }
        m
    }

    /// Mark draining state.
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::Relaxed);
    }

    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    /// Render all registered metrics.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.incoming_requests.render(
            "kubehook_incoming_requests_total",
            "The total number of processed incoming requests",
            &mut out,
        );
        self.review_requests.render(
            "kubehook_review_requests_total",
            "The total number of dispatched reviews by kind",
            &mut out,
        );
        self.admission_processed.render(
            "kubehook_admitter_processed_requests_total",
            "The total number of processed admission requests",
            &mut out,
        );
        self.admission_allowed.render(
            "kubehook_admitter_processed_requests_allowed_total",
            "The total number of allowed admission requests",
            &mut out,
        );
        self.admission_denied.render(
            "kubehook_admitter_processed_requests_denied_total",
            "The total number of denied admission requests",
            &mut out,
        );
        self.authorization_processed.render(
            "kubehook_authorizer_processed_requests_total",
            "The total number of processed authorization requests",
            &mut out,
        );
        self.authorization_allowed.render(
            "kubehook_authorizer_processed_requests_allowed_total",
            "The total number of allowed authorization requests",
            &mut out,
        );
        self.authorization_denied.render(
            "kubehook_authorizer_processed_requests_denied_total",
            "The total number of denied authorization requests",
            &mut out,
        );
        self.event_lists_processed.render(
            "kubehook_auditor_processed_eventlists_total",
            "The total number of processed event lists",
            &mut out,
        );
        self.events_processed.render(
            "kubehook_auditor_processed_events_total",
            "The total number of processed audit events",
            &mut out,
        );
        self.dispatch_errors.render(
            "kubehook_dispatch_errors_total",
            "The total number of failed dispatches by error code",
            &mut out,
        );
        self.http_duration.render(
            "kubehook_http_duration_micros",
            "Duration of HTTP requests",
            &mut out,
        );
        self.dispatch_duration.render(
            "kubehook_dispatch_duration_micros",
            "Duration of processor invocations",
            &mut out,
        );

        let _ = writeln!(
            out,
            "# TYPE kubehook_draining gauge\nkubehook_draining {}",
            if self.is_draining() { 1 } else { 0 }
        );
        out
    }
}
