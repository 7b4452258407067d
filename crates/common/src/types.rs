//! Primitive type tags shared by target record shapes and source schemas.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primitive type identifier for one field or column.
///
/// The same tag enum describes both sides of a binding: the target record's
/// declared field types and the source schema's column types. Binding
/// resolution requires exact tag equality; there is no runtime coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeTag::Bool => "bool",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Str => "string",
        };
        write!(f, "{s}")
    }
}
