use std::fmt;
use std::sync::Arc;

use super::error::{TupleError, TupleResult};
use super::schema::TupleDesc;
use super::value::Field;
use crate::storage::RecordId;

/// A single row: a schema reference, one field per schema column, and the
/// identity of the slot it occupies on disk (if any).
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Create a tuple with empty (default) values for every field.
    pub fn new(desc: Arc<TupleDesc>) -> Self {
        let fields = desc
            .items()
            .iter()
            .map(|item| item.field_type.empty_field())
            .collect();
        Self {
            desc,
            fields,
            record_id: None,
        }
    }

    /// Create a tuple from concrete field values, which must match the
    /// schema's types in order.
    pub fn with_fields(desc: Arc<TupleDesc>, fields: Vec<Field>) -> TupleResult<Self> {
        if fields.len() != desc.num_fields() {
            return Err(TupleError::SchemaMismatch(format!(
                "expected {} fields, got {}",
                desc.num_fields(),
                fields.len()
            )));
        }
        for (item, field) in desc.items().iter().zip(&fields) {
            if field.field_type() != item.field_type {
                return Err(TupleError::TypeMismatch {
                    expected: item.field_type.to_string(),
                    actual: field.field_type().to_string(),
                });
            }
        }
        Ok(Self {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn field(&self, i: usize) -> TupleResult<&Field> {
        self.fields.get(i).ok_or(TupleError::FieldIndex(i))
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Replace field `i`, enforcing the schema's type.
    pub fn set_field(&mut self, i: usize, field: Field) -> TupleResult<()> {
        let expected = self
            .desc
            .field_type(i)
            .ok_or(TupleError::FieldIndex(i))?;
        if field.field_type() != *expected {
            return Err(TupleError::TypeMismatch {
                expected: expected.to_string(),
                actual: field.field_type().to_string(),
            });
        }
        self.fields[i] = field;
        Ok(())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    /// Serialize all fields in schema order to their wire form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.desc.byte_size());
        for field in &self.fields {
            result.extend_from_slice(&field.serialize());
        }
        result
    }

    /// Parse a tuple from `bytes`, which must be exactly `desc.byte_size()`
    /// long.
    pub fn parse(bytes: &[u8], desc: Arc<TupleDesc>) -> TupleResult<Self> {
        if bytes.len() != desc.byte_size() {
            return Err(TupleError::Deserialization(format!(
                "expected {} bytes, got {}",
                desc.byte_size(),
                bytes.len()
            )));
        }
        let mut fields = Vec::with_capacity(desc.num_fields());
        let mut offset = 0;
        for item in desc.items() {
            let len = item.field_type.len();
            fields.push(Field::parse(&bytes[offset..offset + len], &item.field_type)?);
            offset += len;
        }
        Ok(Self {
            desc,
            fields,
            record_id: None,
        })
    }
}

/// Tuples are equal iff their schemas are equal and all fields are equal.
/// The record id is not part of equality.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.fields == other.fields
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}
