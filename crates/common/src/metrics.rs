use std::sync::{Arc, OnceLock};

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

#[derive(Clone, Debug)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    task_rows_read: CounterVec,
    task_rows_skipped: CounterVec,
    task_nulls_defaulted: CounterVec,
    task_rows_errored: CounterVec,
    tasks_opened: CounterVec,
    tasks_closed: CounterVec,
    task_time_seconds: HistogramVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    pub fn record_task_rows(
        &self,
        query_id: &str,
        task_id: &str,
        rows_read: u64,
        rows_skipped: u64,
        nulls_defaulted: u64,
    ) {
        let labels = [query_id, task_id];
        self.inner
            .task_rows_read
            .with_label_values(&labels)
            .inc_by(rows_read as f64);
        self.inner
            .task_rows_skipped
            .with_label_values(&labels)
            .inc_by(rows_skipped as f64);
        self.inner
            .task_nulls_defaulted
            .with_label_values(&labels)
            .inc_by(nulls_defaulted as f64);
    }

    pub fn inc_task_rows_errored(&self, query_id: &str, task_id: &str) {
        let labels = [query_id, task_id];
        self.inner
            .task_rows_errored
            .with_label_values(&labels)
            .inc();
    }

    pub fn record_task_opened(&self, query_id: &str, task_id: &str) {
        let labels = [query_id, task_id];
        self.inner.tasks_opened.with_label_values(&labels).inc();
    }

    pub fn record_task_closed(&self, query_id: &str, task_id: &str, secs: f64) {
        let labels = [query_id, task_id];
        self.inner.tasks_closed.with_label_values(&labels).inc();
        self.inner
            .task_time_seconds
            .with_label_values(&labels)
            .observe(secs.max(0.0));
    }

    pub fn render_prometheus(&self) -> String {
        let metric_families = self.inner.registry.gather();
        let mut out = Vec::new();
        let enc = TextEncoder::new();
        if enc.encode(&metric_families, &mut out).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&out).to_string()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsInner {
    fn new() -> Self {
        let registry = Registry::new();

        let task_rows_read = counter_vec(
            &registry,
            "rb_task_rows_read_total",
            "Rows materialized per task",
            &["query_id", "task_id"],
        );
        let task_rows_skipped = counter_vec(
            &registry,
            "rb_task_rows_skipped_total",
            "Rows skipped by null suppression per task",
            &["query_id", "task_id"],
        );
        let task_nulls_defaulted = counter_vec(
            &registry,
            "rb_task_nulls_defaulted_total",
            "Null column values replaced by configured defaults per task",
            &["query_id", "task_id"],
        );
        let task_rows_errored = counter_vec(
            &registry,
            "rb_task_rows_errored_total",
            "Rows excused by the error-tolerance policy per task",
            &["query_id", "task_id"],
        );
        let tasks_opened = counter_vec(
            &registry,
            "rb_tasks_opened_total",
            "Task cursors opened",
            &["query_id", "task_id"],
        );
        let tasks_closed = counter_vec(
            &registry,
            "rb_tasks_closed_total",
            "Task cursors closed",
            &["query_id", "task_id"],
        );
        let task_time_seconds = histogram_vec(
            &registry,
            "rb_task_time_seconds",
            "Wall time from task open to close",
            &["query_id", "task_id"],
        );

        Self {
            registry,
            task_rows_read,
            task_rows_skipped,
            task_nulls_defaulted,
            task_rows_errored,
            tasks_opened,
            tasks_closed,
            task_time_seconds,
        }
    }
}

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let c = CounterVec::new(Opts::new(name, help), labels).expect("counter vec");
    registry
        .register(Box::new(c.clone()))
        .expect("register counter");
    c
}

fn histogram_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> HistogramVec {
    let h = HistogramVec::new(HistogramOpts::new(name, help), labels).expect("histogram vec");
    registry
        .register(Box::new(h.clone()))
        .expect("register histogram");
    h
}

static GLOBAL_METRICS: OnceLock<MetricsRegistry> = OnceLock::new();

pub fn global_metrics() -> &'static MetricsRegistry {
    GLOBAL_METRICS.get_or_init(MetricsRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::MetricsRegistry;

    #[test]
    fn renders_prometheus_text() {
        let m = MetricsRegistry::new();
        m.record_task_rows("q1", "t0", 10, 2, 1);
        let text = m.render_prometheus();
        assert!(text.contains("rb_task_rows_read_total"));
        assert!(text.contains("q1"));
    }

    #[test]
    fn renders_all_metric_families() {
        let m = MetricsRegistry::new();
        m.record_task_opened("q1", "t1");
        m.record_task_rows("q1", "t1", 100, 3, 7);
        m.inc_task_rows_errored("q1", "t1");
        m.record_task_closed("q1", "t1", 0.25);
        let text = m.render_prometheus();

        assert!(text.contains("rb_task_rows_read_total"));
        assert!(text.contains("rb_task_rows_skipped_total"));
        assert!(text.contains("rb_task_nulls_defaulted_total"));
        assert!(text.contains("rb_task_rows_errored_total"));
        assert!(text.contains("rb_tasks_opened_total"));
        assert!(text.contains("rb_tasks_closed_total"));
        assert!(text.contains("rb_task_time_seconds"));
    }
}
