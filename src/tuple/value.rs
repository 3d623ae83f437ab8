use std::cmp::Ordering;
use std::fmt;

use super::error::{TupleError, TupleResult};

/// Maximum declared length of a string field, in bytes.
pub const MAX_STRING_LEN: usize = 128;

/// Comparison operator applied between a tuple field and an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    Like,
    NotEquals,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Equals => "=",
            CmpOp::GreaterThan => ">",
            CmpOp::LessThan => "<",
            CmpOp::LessThanOrEq => "<=",
            CmpOp::GreaterThanOrEq => ">=",
            CmpOp::Like => "LIKE",
            CmpOp::NotEquals => "<>",
        };
        write!(f, "{}", s)
    }
}

/// Represents a column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 32-bit signed integer, 4 bytes big-endian on the wire.
    Int,
    /// Byte string with a declared maximum length; on the wire a 4-byte
    /// big-endian length prefix followed by the declared number of bytes,
    /// zero-padded.
    String(usize),
}

impl Type {
    /// Default declared length used by the catalog loader for `string`.
    pub const DEFAULT_STRING_LEN: usize = MAX_STRING_LEN;

    /// Get the on-the-wire size in bytes for this type
    pub fn len(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::String(max) => 4 + max,
        }
    }

    /// Construct an empty (default) value of this type.
    pub fn empty_field(&self) -> Field {
        match self {
            Type::Int => Field::Int(0),
            Type::String(max) => Field::Str(String::new(), *max),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::String(max) => write!(f, "string({})", max),
        }
    }
}

/// Represents a single typed cell value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Str(String, usize),
}

impl Field {
    /// Build a string field, checking the value against the declared length.
    pub fn str(value: impl Into<String>, max_len: usize) -> TupleResult<Field> {
        let value = value.into();
        if value.len() > max_len {
            return Err(TupleError::StringTooLong(value.len(), max_len));
        }
        Ok(Field::Str(value, max_len))
    }

    /// Get the data type of this field
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::Str(_, max) => Type::String(*max),
        }
    }

    /// Serialize the field to its wire form
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Field::Int(i) => i.to_be_bytes().to_vec(),
            Field::Str(s, max) => {
                let bytes = s.as_bytes();
                let mut result = Vec::with_capacity(4 + max);
                result.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                result.extend_from_slice(bytes);
                result.resize(4 + max, 0);
                result
            }
        }
    }

    /// Deserialize a field of the given type from its wire form.
    /// `bytes` must be exactly `field_type.len()` long.
    pub fn parse(bytes: &[u8], field_type: &Type) -> TupleResult<Field> {
        if bytes.len() != field_type.len() {
            return Err(TupleError::Deserialization(format!(
                "expected {} bytes for {}, got {}",
                field_type.len(),
                field_type,
                bytes.len()
            )));
        }
        match field_type {
            Type::Int => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Field::Int(i32::from_be_bytes(buf)))
            }
            Type::String(max) => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&bytes[..4]);
                let len = u32::from_be_bytes(buf) as usize;
                if len > *max {
                    return Err(TupleError::Deserialization(format!(
                        "declared string length {} exceeds maximum {}",
                        len, max
                    )));
                }
                let s = String::from_utf8(bytes[4..4 + len].to_vec())
                    .map_err(|e| TupleError::Deserialization(format!("invalid UTF-8: {}", e)))?;
                Ok(Field::Str(s, *max))
            }
        }
    }

    /// Compare this field against `operand` under `op`.
    ///
    /// Fields are comparable only when their types match. `LIKE` on integers
    /// degenerates to equality; on strings it is substring containment.
    pub fn compare(&self, op: CmpOp, operand: &Field) -> TupleResult<bool> {
        match (self, operand) {
            (Field::Int(a), Field::Int(b)) => Ok(match op {
                CmpOp::Equals | CmpOp::Like => a == b,
                CmpOp::NotEquals => a != b,
                CmpOp::GreaterThan => a > b,
                CmpOp::GreaterThanOrEq => a >= b,
                CmpOp::LessThan => a < b,
                CmpOp::LessThanOrEq => a <= b,
            }),
            (Field::Str(a, _), Field::Str(b, _)) => Ok(match op {
                CmpOp::Equals => a == b,
                CmpOp::NotEquals => a != b,
                CmpOp::GreaterThan => a > b,
                CmpOp::GreaterThanOrEq => a >= b,
                CmpOp::LessThan => a < b,
                CmpOp::LessThanOrEq => a <= b,
                CmpOp::Like => a.contains(b.as_str()),
            }),
            _ => Err(TupleError::TypeMismatch {
                expected: self.field_type().to_string(),
                actual: operand.field_type().to_string(),
            }),
        }
    }

    /// Total order between two fields of the same type; used for sorting.
    pub fn cmp_same_type(&self, other: &Field) -> TupleResult<Ordering> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => Ok(a.cmp(b)),
            (Field::Str(a, _), Field::Str(b, _)) => Ok(a.cmp(b)),
            _ => Err(TupleError::TypeMismatch {
                expected: self.field_type().to_string(),
                actual: other.field_type().to_string(),
            }),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(i) => write!(f, "{}", i),
            Field::Str(s, _) => write!(f, "{}", s),
        }
    }
}
