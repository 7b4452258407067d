//! Task driver: the seam between the execution service and the caller's
//! partition-compute loop.
//!
//! Responsibilities:
//! - open the task's cursor through an [`ExecutionClient`];
//! - resolve the binding once, before any row is read;
//! - drive the materializer and yield records as an `Iterator`;
//! - release the cursor exactly once on every exit path (exhaustion,
//!   error, early drop).

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use rb_common::metrics::global_metrics;
use rb_common::{BindConfig, QueryId, RbError, Result, TaskId, ToleranceConfig};

use crate::cursor::RowCursor;
use crate::materialize::{Materializer, RowStats};
use crate::record::Record;
use crate::schema::RecordSchema;

/// Opaque handle for one unit of work: a contiguous slice of query results
/// served by the execution service. The payload is interpreted only by the
/// [`ExecutionClient`] that opens it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub query_id: QueryId,
    pub task_id: TaskId,
    pub payload: Vec<u8>,
}

/// Factory for task cursors; the external query-execution service sits
/// behind this trait.
pub trait ExecutionClient {
    type Cursor: RowCursor;

    /// Opens the row source for one task. The returned cursor's `columns()`
    /// describe the source schema the binding is resolved against.
    fn open_task(&self, task: &TaskDescriptor) -> Result<Self::Cursor>;
}

/// Running bad-record accounting against a [`ToleranceConfig`].
///
/// An error is excused while `errors < min_errors` or while the running
/// error rate stays at or below `max_error_rate`. A rate limit of zero or
/// below tolerates no errors at all.
#[derive(Debug)]
struct ErrorTracker {
    config: ToleranceConfig,
    errors: u64,
}

impl ErrorTracker {
    fn new(config: ToleranceConfig) -> Self {
        Self { config, errors: 0 }
    }

    /// Records one errored row; returns whether it is excused.
    /// `clean_rows` counts rows seen so far that did not error.
    fn excuse(&mut self, clean_rows: u64) -> bool {
        self.errors += 1;
        if self.config.max_error_rate <= 0.0 {
            return false;
        }
        if self.errors < self.config.min_errors {
            return true;
        }
        let total = clean_rows + self.errors;
        let rate = self.errors as f64 / total as f64;
        rate <= self.config.max_error_rate
    }
}

/// Per-task record iterator.
///
/// One driver instance is driven sequentially by exactly one logical task;
/// nothing is shared across instances. Dropping the driver mid-iteration
/// (framework cancellation included) still runs the release path.
#[derive(Debug)]
pub struct TaskDriver<C: RowCursor> {
    query_id: QueryId,
    task_id: TaskId,
    cursor: Option<C>,
    materializer: Materializer,
    tracker: Option<ErrorTracker>,
    opened_at: Instant,
    closed: bool,
}

impl<C: RowCursor> TaskDriver<C> {
    /// Opens the task's cursor and resolves the binding.
    ///
    /// Schema errors abort initialization here, before any row is read; the
    /// just-opened cursor is released on that path too.
    pub fn open<E>(
        client: &E,
        task: &TaskDescriptor,
        target: Arc<RecordSchema>,
        config: &BindConfig,
    ) -> Result<Self>
    where
        E: ExecutionClient<Cursor = C>,
    {
        let mut cursor = client.open_task(task)?;
        let columns = cursor.columns().to_vec();
        let column_count = columns.len();
        let materializer = match Materializer::new(target, columns, config) {
            Ok(m) => m,
            Err(err) => {
                if let Err(close_err) = cursor.close() {
                    warn!(
                        query_id = %task.query_id,
                        task_id = %task.task_id,
                        error = %close_err,
                        "cursor close failed after bind error"
                    );
                }
                return Err(err);
            }
        };
        global_metrics().record_task_opened(&task.query_id.to_string(), &task.task_id.to_string());
        info!(
            query_id = %task.query_id,
            task_id = %task.task_id,
            fields = materializer.target().len(),
            columns = column_count,
            "task opened"
        );
        Ok(Self {
            query_id: task.query_id,
            task_id: task.task_id,
            cursor: Some(cursor),
            materializer,
            tracker: None,
            opened_at: Instant::now(),
            closed: false,
        })
    }

    /// Installs a default-value template (see
    /// [`Materializer::set_default_record`]). A rejected template drops the
    /// driver, which releases the cursor.
    pub fn with_default_record(mut self, template: Record) -> Result<Self> {
        self.materializer.set_default_record(template)?;
        Ok(self)
    }

    /// Enables bad-record tolerance: rows failing with a materialize error
    /// are counted and excused until the configured thresholds trip.
    pub fn with_tolerance(mut self, config: ToleranceConfig) -> Self {
        self.tracker = Some(ErrorTracker::new(config));
        self
    }

    pub fn stats(&self) -> RowStats {
        self.materializer.stats()
    }

    fn close_inner(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let stats = self.materializer.stats();
        let query = self.query_id.to_string();
        let task = self.task_id.to_string();
        let metrics = global_metrics();
        metrics.record_task_rows(
            &query,
            &task,
            stats.rows_read,
            stats.rows_skipped,
            stats.nulls_defaulted,
        );
        metrics.record_task_closed(&query, &task, self.opened_at.elapsed().as_secs_f64());
        if let Some(mut cursor) = self.cursor.take() {
            if let Err(err) = cursor.close() {
                warn!(
                    query_id = %self.query_id,
                    task_id = %self.task_id,
                    error = %err,
                    "cursor close failed"
                );
            }
        }
        info!(
            query_id = %self.query_id,
            task_id = %self.task_id,
            rows_read = stats.rows_read,
            rows_skipped = stats.rows_skipped,
            nulls_defaulted = stats.nulls_defaulted,
            "task closed"
        );
    }
}

impl<C: RowCursor> Iterator for TaskDriver<C> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.closed {
                return None;
            }
            let cursor = self.cursor.as_mut()?;
            match self.materializer.next_record(cursor) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {
                    self.close_inner();
                    return None;
                }
                Err(err @ RbError::Materialize(_)) => {
                    let stats = self.materializer.stats();
                    let excused = self
                        .tracker
                        .as_mut()
                        .map(|t| t.excuse(stats.rows_read + stats.rows_skipped))
                        .unwrap_or(false);
                    if excused {
                        global_metrics().inc_task_rows_errored(
                            &self.query_id.to_string(),
                            &self.task_id.to_string(),
                        );
                        warn!(
                            query_id = %self.query_id,
                            task_id = %self.task_id,
                            error = %err,
                            "excusing bad record within tolerance"
                        );
                        continue;
                    }
                    self.close_inner();
                    return Some(Err(err));
                }
                Err(err) => {
                    self.close_inner();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<C: RowCursor> Drop for TaskDriver<C> {
    fn drop(&mut self) {
        self.close_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorTracker;
    use rb_common::ToleranceConfig;

    #[test]
    fn first_error_is_excused_by_default_thresholds() {
        let mut tracker = ErrorTracker::new(ToleranceConfig::default());
        assert!(tracker.excuse(100));
    }

    #[test]
    fn zero_rate_tolerates_nothing() {
        let mut tracker = ErrorTracker::new(ToleranceConfig {
            max_error_rate: 0.0,
            min_errors: 2,
        });
        assert!(!tracker.excuse(1_000_000));
    }

    #[test]
    fn trips_once_rate_and_min_errors_are_exceeded() {
        let mut tracker = ErrorTracker::new(ToleranceConfig {
            max_error_rate: 0.5,
            min_errors: 2,
        });
        // 1 error, still under min_errors: excused regardless of rate.
        assert!(tracker.excuse(0));
        // 2 errors over 8 total rows: rate 0.25 <= 0.5, excused.
        assert!(tracker.excuse(6));
        // 3 errors over 4 total rows: rate 0.75 > 0.5, tolerance trips.
        assert!(!tracker.excuse(1));
    }
}
