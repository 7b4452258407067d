//! Row materialization: turning cursor rows into schema-checked records.

use std::sync::Arc;

use tracing::debug;

use rb_common::{BindConfig, MaterializeError, RbError, Result, TypeTag};

use crate::binding::Binding;
use crate::cursor::RowCursor;
use crate::record::{Record, Value};
use crate::schema::{ColumnSpec, RecordSchema};

/// Row counters accumulated by one materializer instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStats {
    /// Rows successfully materialized into records.
    pub rows_read: u64,
    /// Rows dropped whole by null suppression.
    pub rows_skipped: u64,
    /// Null column values replaced by configured defaults.
    pub nulls_defaulted: u64,
}

/// Outcome of materializing one cursor row.
enum RowOutcome {
    Bound(Record),
    Skipped,
}

/// Binds a target record shape to one task's source schema and materializes
/// cursor rows into [`Record`]s.
///
/// Constructed once per task: the binding is resolved eagerly so schema
/// errors abort task initialization before any row is read. A schema change
/// between tasks requires a new materializer.
///
/// Reuse policy: a fresh [`Record`] is allocated per row; returned records
/// never alias each other and may be retained by the caller.
#[derive(Debug)]
pub struct Materializer {
    target: Arc<RecordSchema>,
    columns: Vec<ColumnSpec>,
    binding: Binding,
    defaults: Option<Vec<Value>>,
    ignore_unhandled_null: bool,
    stats: RowStats,
}

impl Materializer {
    /// Resolves the binding for this task's source schema.
    pub fn new(
        target: Arc<RecordSchema>,
        columns: Vec<ColumnSpec>,
        config: &BindConfig,
    ) -> Result<Self> {
        let binding = Binding::resolve(target.fields(), &columns, config.mode)?;
        Ok(Self {
            target,
            columns,
            binding,
            defaults: None,
            ignore_unhandled_null: config.ignore_unhandled_null,
            stats: RowStats::default(),
        })
    }

    /// Installs a default-value template: a record of the target schema whose
    /// values substitute for NULL columns, field by field. Captured once;
    /// later mutation of the caller's template has no effect.
    pub fn set_default_record(&mut self, template: Record) -> Result<()> {
        if **template.schema() != *self.target {
            return Err(RbError::InvalidConfig(
                "default-value template schema differs from the target record schema".to_string(),
            ));
        }
        self.defaults = Some(template.values().to_vec());
        Ok(())
    }

    /// Builder-style variant of [`Materializer::set_default_record`].
    pub fn with_default_record(mut self, template: Record) -> Result<Self> {
        self.set_default_record(template)?;
        Ok(self)
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn target(&self) -> &Arc<RecordSchema> {
        &self.target
    }

    pub fn stats(&self) -> RowStats {
        self.stats
    }

    /// Pulls rows from the cursor until one materializes, is exhausted, or
    /// fails.
    ///
    /// `Ok(None)` signals end of stream (terminal). With
    /// `ignore_unhandled_null` set, rows carrying an undefaulted NULL are
    /// skipped whole and iteration continues with the following row. Without
    /// it, such a row fails with [`MaterializeError::UnhandledNull`] and the
    /// cursor stays positioned on the failing row.
    pub fn next_record<C: RowCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<Option<Record>> {
        loop {
            if !cursor.advance()? {
                return Ok(None);
            }
            match self.materialize_row(cursor)? {
                RowOutcome::Bound(record) => {
                    self.stats.rows_read += 1;
                    return Ok(Some(record));
                }
                RowOutcome::Skipped => {
                    self.stats.rows_skipped += 1;
                    debug!(rows_skipped = self.stats.rows_skipped, "skipped row with unhandled null");
                }
            }
        }
    }

    fn materialize_row<C: RowCursor + ?Sized>(&mut self, cursor: &C) -> Result<RowOutcome> {
        let mut values: Vec<Option<Value>> = vec![None; self.target.len()];
        for (c, f) in self.binding.iter_bound() {
            if cursor.is_null(c)? {
                match &self.defaults {
                    Some(defaults) => {
                        self.stats.nulls_defaulted += 1;
                        values[f] = Some(defaults[f].clone());
                    }
                    None if self.ignore_unhandled_null => return Ok(RowOutcome::Skipped),
                    None => {
                        return Err(MaterializeError::UnhandledNull {
                            field: self.target.field(f).name.clone(),
                            column: c,
                        }
                        .into());
                    }
                }
            } else {
                let value = read_value(cursor, &self.columns[c])?;
                // Binding already proved tag equality; a divergence here is a
                // cursor contract violation, not a user error.
                debug_assert_eq!(value.type_tag(), self.target.field(f).ty);
                values[f] = Some(value);
            }
        }
        let values = values
            .into_iter()
            .map(|v| v.expect("binding covers every target field"))
            .collect();
        Ok(RowOutcome::Bound(Record::from_parts(
            Arc::clone(&self.target),
            values,
        )))
    }
}

/// Reads the current row's value at `column`, selecting the accessor by the
/// source column's declared type tag.
fn read_value<C: RowCursor + ?Sized>(cursor: &C, column: &ColumnSpec) -> Result<Value> {
    let c = column.ordinal;
    Ok(match column.ty {
        TypeTag::Bool => Value::Bool(cursor.get_bool(c)?),
        TypeTag::I8 => Value::I8(cursor.get_i8(c)?),
        TypeTag::I16 => Value::I16(cursor.get_i16(c)?),
        TypeTag::I32 => Value::I32(cursor.get_i32(c)?),
        TypeTag::I64 => Value::I64(cursor.get_i64(c)?),
        TypeTag::F32 => Value::F32(cursor.get_f32(c)?),
        TypeTag::F64 => Value::F64(cursor.get_f64(c)?),
        TypeTag::Str => Value::Str(cursor.get_str(c)?),
    })
}
