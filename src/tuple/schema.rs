use std::fmt;

use super::value::Type;

/// One column of a schema: a type plus an optional name.
#[derive(Debug, Clone)]
pub struct TdItem {
    pub field_type: Type,
    pub name: Option<String>,
}

/// TupleDesc describes the ordered schema of a tuple.
///
/// Equality compares field types in order only; names are ignored.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    items: Vec<TdItem>,
    byte_size: usize,
}

impl TupleDesc {
    /// Create a schema from types and matching optional names.
    /// The two slices must be non-empty and of equal length.
    pub fn new(types: Vec<Type>, names: Vec<Option<String>>) -> Self {
        assert!(!types.is_empty(), "schema must have at least one field");
        assert_eq!(types.len(), names.len());
        let byte_size = types.iter().map(|t| t.len()).sum();
        let items = types
            .into_iter()
            .zip(names)
            .map(|(field_type, name)| TdItem { field_type, name })
            .collect();
        Self { items, byte_size }
    }

    /// Create a schema with anonymous fields.
    pub fn anonymous(types: Vec<Type>) -> Self {
        let names = vec![None; types.len()];
        Self::new(types, names)
    }

    pub fn num_fields(&self) -> usize {
        self.items.len()
    }

    pub fn field_type(&self, i: usize) -> Option<&Type> {
        self.items.get(i).map(|item| &item.field_type)
    }

    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.items.get(i).and_then(|item| item.name.as_deref())
    }

    /// Find the index of the first field with the given name.
    pub fn field_name_to_index(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.name.as_deref() == Some(name))
    }

    /// The fixed size in bytes of tuples with this schema
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn items(&self) -> &[TdItem] {
        &self.items
    }

    /// Concatenate two schemas, first all fields of `a`, then all of `b`.
    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut items = a.items.clone();
        items.extend(b.items.iter().cloned());
        TupleDesc {
            byte_size: a.byte_size + b.byte_size,
            items,
        }
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}({})",
                item.field_type,
                item.name.as_deref().unwrap_or("")
            )?;
        }
        Ok(())
    }
}
