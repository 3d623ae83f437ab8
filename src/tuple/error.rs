use thiserror::Error;

#[derive(Debug, Error)]
pub enum TupleError {
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("No field named {0}")]
    NoSuchField(String),

    #[error("Field index {0} out of range")]
    FieldIndex(usize),

    #[error("String length {0} exceeds declared maximum {1}")]
    StringTooLong(usize, usize),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

pub type TupleResult<T> = Result<T, TupleError>;
