//! Dynamically-shaped but schema-checked output records.
//!
//! Reuse contract: the materializer allocates a **fresh** [`Record`] per row.
//! Callers may retain returned records across iterations without copying.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rb_common::{RbError, Result, TypeTag};

use crate::schema::RecordSchema;

/// A single primitive value, tagged with its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::I8(_) => TypeTag::I8,
            Value::I16(_) => TypeTag::I16,
            Value::I32(_) => TypeTag::I32,
            Value::I64(_) => TypeTag::I64,
            Value::F32(_) => TypeTag::F32,
            Value::F64(_) => TypeTag::F64,
            Value::Str(_) => TypeTag::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// A materialized output record: one value per declared field, in field
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl Record {
    /// Builds a record, checking value count and per-field type tags against
    /// the schema. Used for caller-built records such as default-value
    /// templates and test expectations.
    pub fn new(schema: Arc<RecordSchema>, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(RbError::InvalidConfig(format!(
                "record has {} values but schema declares {} fields",
                values.len(),
                schema.len()
            )));
        }
        for (i, value) in values.iter().enumerate() {
            let declared = schema.field(i).ty;
            if value.type_tag() != declared {
                return Err(RbError::InvalidConfig(format!(
                    "value for field '{}' has type {} but schema declares {}",
                    schema.field(i).name,
                    value.type_tag(),
                    declared
                )));
            }
        }
        Ok(Self { schema, values })
    }

    /// Builds a record whose values are already known to match the schema.
    /// The materializer upholds this through the binding's type checks.
    pub(crate) fn from_parts(schema: Arc<RecordSchema>, values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), schema.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, index: usize) -> &Value {
        &self.values[index]
    }

    /// Value of the field with exactly this name, if declared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    /// Overwrites one field, enforcing the declared type tag.
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let declared = self.schema.field(index).ty;
        if value.type_tag() != declared {
            return Err(RbError::InvalidConfig(format!(
                "cannot set field '{}' of type {} to a {} value",
                self.schema.field(index).name,
                declared,
                value.type_tag()
            )));
        }
        self.values[index] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from;
    use rb_common::TypeTag;

    fn key_name_schema() -> Arc<RecordSchema> {
        Arc::new(schema_from(&[("key", TypeTag::I64), ("name", TypeTag::Str)]))
    }

    #[test]
    fn new_rejects_wrong_arity() {
        let schema = key_name_schema();
        let err = Record::new(schema, vec![Value::I64(1)]).unwrap_err();
        assert!(matches!(err, RbError::InvalidConfig(_)));
    }

    #[test]
    fn new_rejects_wrong_type() {
        let schema = key_name_schema();
        let err = Record::new(schema, vec![Value::I64(1), Value::I64(2)]).unwrap_err();
        assert!(matches!(err, RbError::InvalidConfig(_)));
    }

    #[test]
    fn get_by_name_and_set_typed() {
        let schema = key_name_schema();
        let mut rec = Record::new(
            schema,
            vec![Value::I64(7), Value::Str("EUROPE".to_string())],
        )
        .unwrap();
        assert_eq!(rec.get("key").and_then(Value::as_i64), Some(7));

        rec.set(0, Value::I64(8)).unwrap();
        assert_eq!(rec.value(0).as_i64(), Some(8));

        let err = rec.set(0, Value::Str("x".to_string())).unwrap_err();
        assert!(matches!(err, RbError::InvalidConfig(_)));
    }
}
