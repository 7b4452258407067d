//! Row-by-row cursor contract over a task's query results.

use rb_common::Result;

use crate::schema::ColumnSpec;

/// Blocking pull-style access to one task's result rows.
///
/// Call [`RowCursor::advance`] to step onto the next row; all other accessors
/// address the current row and are only valid after `advance` returned
/// `Ok(true)`. Ordinals refer to positions in [`RowCursor::columns`].
///
/// Implementations may prefetch asynchronously behind these calls; callers
/// treat the interface as synchronous. A cursor is driven by exactly one
/// logical task and needs no internal synchronization.
///
/// `close` releases the underlying worker/connection resource. The task
/// driver guarantees it is called exactly once on every exit path;
/// implementations are not required to be idempotent.
pub trait RowCursor {
    /// Source schema for every row this cursor yields.
    fn columns(&self) -> &[ColumnSpec];

    /// Steps to the next row. `Ok(false)` means the stream is exhausted
    /// (terminal; no further calls are valid without reopening the task).
    fn advance(&mut self) -> Result<bool>;

    fn is_null(&self, ordinal: usize) -> Result<bool>;

    fn get_bool(&self, ordinal: usize) -> Result<bool>;
    fn get_i8(&self, ordinal: usize) -> Result<i8>;
    fn get_i16(&self, ordinal: usize) -> Result<i16>;
    fn get_i32(&self, ordinal: usize) -> Result<i32>;
    fn get_i64(&self, ordinal: usize) -> Result<i64>;
    fn get_f32(&self, ordinal: usize) -> Result<f32>;
    fn get_f64(&self, ordinal: usize) -> Result<f64>;
    fn get_str(&self, ordinal: usize) -> Result<String>;

    /// Releases the cursor and its underlying execution resource.
    fn close(&mut self) -> Result<()>;
}
