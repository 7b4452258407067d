//! In-memory cursor and execution-client fixtures.
//!
//! Used by this crate's tests and useful for callers wiring the driver into
//! their own test harnesses. `MemCursor` counts `close` calls through a
//! shared [`CloseProbe`] so release semantics stay observable after the
//! cursor has been handed to a driver.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rb_common::{RbError, Result};

use crate::cursor::RowCursor;
use crate::driver::{ExecutionClient, TaskDescriptor};
use crate::record::Value;
use crate::schema::ColumnSpec;

/// Shared handle observing how many times a [`MemCursor`] was closed.
#[derive(Debug, Clone, Default)]
pub struct CloseProbe {
    closes: Arc<AtomicUsize>,
}

impl CloseProbe {
    pub fn count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn record_close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Cursor over rows held in memory. Cells are `None` for NULL.
#[derive(Debug)]
pub struct MemCursor {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<Option<Value>>>,
    /// Index of the current row; `None` before the first `advance`.
    current: Option<usize>,
    /// When set, `advance` onto this row index fails with an execution error.
    fail_advance_at: Option<usize>,
    probe: CloseProbe,
}

impl MemCursor {
    pub fn new(columns: Vec<ColumnSpec>, rows: Vec<Vec<Option<Value>>>) -> Self {
        Self {
            columns,
            rows,
            current: None,
            fail_advance_at: None,
            probe: CloseProbe::default(),
        }
    }

    /// Injects a transport-style failure when stepping onto row `index`.
    pub fn with_advance_failure(mut self, index: usize) -> Self {
        self.fail_advance_at = Some(index);
        self
    }

    pub fn close_probe(&self) -> CloseProbe {
        self.probe.clone()
    }

    fn cell(&self, ordinal: usize) -> Result<&Option<Value>> {
        let row = self
            .current
            .and_then(|i| self.rows.get(i))
            .ok_or_else(|| RbError::Execution("cursor is not positioned on a row".to_string()))?;
        row.get(ordinal)
            .ok_or_else(|| RbError::Execution(format!("ordinal {ordinal} out of range")))
    }

    fn typed<T>(&self, ordinal: usize, pick: impl Fn(&Value) -> Option<T>, what: &str) -> Result<T> {
        match self.cell(ordinal)? {
            Some(value) => pick(value).ok_or_else(|| {
                RbError::Execution(format!(
                    "column {ordinal} does not hold a {what} value"
                ))
            }),
            None => Err(RbError::Execution(format!(
                "column {ordinal} is NULL; check is_null first"
            ))),
        }
    }
}

impl RowCursor for MemCursor {
    fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn advance(&mut self) -> Result<bool> {
        let next = self.current.map_or(0, |i| i + 1);
        if self.fail_advance_at == Some(next) {
            return Err(RbError::Execution(format!(
                "injected fetch failure at row {next}"
            )));
        }
        if next >= self.rows.len() {
            return Ok(false);
        }
        self.current = Some(next);
        Ok(true)
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(self.cell(ordinal)?.is_none())
    }

    fn get_bool(&self, ordinal: usize) -> Result<bool> {
        self.typed(ordinal, Value::as_bool, "bool")
    }

    fn get_i8(&self, ordinal: usize) -> Result<i8> {
        self.typed(
            ordinal,
            |v| match v {
                Value::I8(x) => Some(*x),
                _ => None,
            },
            "i8",
        )
    }

    fn get_i16(&self, ordinal: usize) -> Result<i16> {
        self.typed(
            ordinal,
            |v| match v {
                Value::I16(x) => Some(*x),
                _ => None,
            },
            "i16",
        )
    }

    fn get_i32(&self, ordinal: usize) -> Result<i32> {
        self.typed(
            ordinal,
            |v| match v {
                Value::I32(x) => Some(*x),
                _ => None,
            },
            "i32",
        )
    }

    fn get_i64(&self, ordinal: usize) -> Result<i64> {
        self.typed(ordinal, Value::as_i64, "i64")
    }

    fn get_f32(&self, ordinal: usize) -> Result<f32> {
        self.typed(
            ordinal,
            |v| match v {
                Value::F32(x) => Some(*x),
                _ => None,
            },
            "f32",
        )
    }

    fn get_f64(&self, ordinal: usize) -> Result<f64> {
        self.typed(ordinal, Value::as_f64, "f64")
    }

    fn get_str(&self, ordinal: usize) -> Result<String> {
        self.typed(ordinal, |v| v.as_str().map(str::to_string), "string")
    }

    fn close(&mut self) -> Result<()> {
        self.probe.record_close();
        Ok(())
    }
}

/// Execution client serving every task from one in-memory row set.
pub struct MemExecutionClient {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<Option<Value>>>,
    fail_advance_at: Option<usize>,
    probe: CloseProbe,
}

impl MemExecutionClient {
    pub fn new(columns: Vec<ColumnSpec>, rows: Vec<Vec<Option<Value>>>) -> Self {
        Self {
            columns,
            rows,
            fail_advance_at: None,
            probe: CloseProbe::default(),
        }
    }

    /// Injects a transport-style failure when a served cursor steps onto row
    /// `index`.
    pub fn with_advance_failure(mut self, index: usize) -> Self {
        self.fail_advance_at = Some(index);
        self
    }

    /// Probe shared by every cursor this client opens.
    pub fn close_probe(&self) -> CloseProbe {
        self.probe.clone()
    }
}

impl ExecutionClient for MemExecutionClient {
    type Cursor = MemCursor;

    fn open_task(&self, _task: &TaskDescriptor) -> Result<MemCursor> {
        let mut cursor = MemCursor::new(self.columns.clone(), self.rows.clone());
        cursor.probe = self.probe.clone();
        if let Some(at) = self.fail_advance_at {
            cursor = cursor.with_advance_failure(at);
        }
        Ok(cursor)
    }
}
