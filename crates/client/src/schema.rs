//! Target record shapes and source schema descriptors.

use serde::{Deserialize, Serialize};

use rb_common::TypeTag;

/// One declared field of the target record shape.
///
/// Derived once at materializer construction from the caller-supplied target
/// shape and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub ty: TypeTag,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One column of the source query-result schema, as reported by the
/// execution service for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: TypeTag,
    /// Position of this column within the source schema.
    pub ordinal: usize,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, ty: TypeTag, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            ordinal,
        }
    }
}

/// Ordered target record shape: the caller's explicit declaration of the
/// fields a materialized [`crate::record::Record`] carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> &FieldSpec {
        &self.fields[index]
    }

    /// Index of the field with exactly this name, if declared.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Assigns ordinals 0..n to a name/type listing. Test and fixture helper.
pub fn columns_from(specs: &[(&str, TypeTag)]) -> Vec<ColumnSpec> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (name, ty))| ColumnSpec::new(*name, *ty, i))
        .collect()
}

/// Builds a [`RecordSchema`] from a name/type listing. Test and fixture helper.
pub fn schema_from(specs: &[(&str, TypeTag)]) -> RecordSchema {
    RecordSchema::new(
        specs
            .iter()
            .map(|(name, ty)| FieldSpec::new(*name, *ty))
            .collect(),
    )
}
