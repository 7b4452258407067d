//! Field-to-column binding resolution.
//!
//! A [`Binding`] is computed once per task, before any row is read, and is
//! immutable afterwards. Every target field resolves to exactly one source
//! column; the source may carry extra columns that stay unbound.

use rb_common::{BindMode, SchemaError};

use crate::schema::{ColumnSpec, FieldSpec};

/// Resolved field-to-column mapping, indexed by source-column ordinal.
///
/// `slots()[c]` is the target field index bound to column `c`, or `None` for
/// columns no field references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    slots: Vec<Option<usize>>,
}

impl Binding {
    /// Validates the pair of schemas and resolves the mapping.
    ///
    /// Checks, in order:
    /// 1. `columns.len() >= fields.len()`, else [`SchemaError::TooFewColumns`].
    /// 2. Mode-specific resolution (see [`BindMode`]):
    ///    - `ByOrdinal`: field *i* binds to column *i*; types are compared in
    ///      ordinal order and validation halts at the first mismatching
    ///      field, without consulting later fields.
    ///    - `ByName`: duplicate case-insensitive field names are rejected
    ///      before any column is consulted; then each field, in declared
    ///      order, scans all columns and the last case-insensitive name
    ///      match wins. When source columns share a name, the highest
    ///      ordinal is therefore the one bound.
    pub fn resolve(
        fields: &[FieldSpec],
        columns: &[ColumnSpec],
        mode: BindMode,
    ) -> Result<Binding, SchemaError> {
        if columns.len() < fields.len() {
            return Err(SchemaError::TooFewColumns {
                fields: fields.len(),
                columns: columns.len(),
            });
        }
        match mode {
            BindMode::ByOrdinal => Self::resolve_by_ordinal(fields, columns),
            BindMode::ByName => Self::resolve_by_name(fields, columns),
        }
    }

    fn resolve_by_ordinal(
        fields: &[FieldSpec],
        columns: &[ColumnSpec],
    ) -> Result<Binding, SchemaError> {
        let mut slots = vec![None; columns.len()];
        for (i, field) in fields.iter().enumerate() {
            check_types(field, &columns[i])?;
            slots[i] = Some(i);
        }
        Ok(Binding { slots })
    }

    fn resolve_by_name(
        fields: &[FieldSpec],
        columns: &[ColumnSpec],
    ) -> Result<Binding, SchemaError> {
        for (i, field) in fields.iter().enumerate() {
            for earlier in &fields[..i] {
                if earlier.name.eq_ignore_ascii_case(&field.name) {
                    return Err(SchemaError::DuplicateFieldName {
                        name: field.name.clone(),
                    });
                }
            }
        }

        let mut slots = vec![None; columns.len()];
        for (f, field) in fields.iter().enumerate() {
            let mut matched: Option<usize> = None;
            for column in columns {
                if column.name.eq_ignore_ascii_case(&field.name) {
                    // Last match wins when source columns share a name.
                    matched = Some(column.ordinal);
                }
            }
            let c = matched.ok_or_else(|| SchemaError::FieldNotFound {
                field: field.name.clone(),
            })?;
            check_types(field, &columns[c])?;
            slots[c] = Some(f);
        }
        Ok(Binding { slots })
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    pub fn field_for_column(&self, ordinal: usize) -> Option<usize> {
        self.slots.get(ordinal).copied().flatten()
    }

    /// Bound `(column ordinal, field index)` pairs in column-ordinal order.
    pub fn iter_bound(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(c, f)| f.map(|f| (c, f)))
    }
}

fn check_types(field: &FieldSpec, column: &ColumnSpec) -> Result<(), SchemaError> {
    if field.ty != column.ty {
        return Err(SchemaError::TypeMismatch {
            field: field.name.clone(),
            expected: field.ty,
            actual: column.ty,
        });
    }
    Ok(())
}
