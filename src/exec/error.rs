use thiserror::Error;

use crate::catalog::CatalogError;
use crate::db::DatabaseError;
use crate::storage::StorageError;
use crate::tuple::TupleError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Tuple error: {0}")]
    Tuple(#[from] TupleError),

    #[error("Operator has not been opened")]
    NotOpen,

    #[error("Field index {0} out of range for operator schema")]
    FieldIndex(usize),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Operator takes {expected} children, got {got}")]
    WrongChildCount { expected: usize, got: usize },
}

pub type ExecResult<T> = Result<T, ExecError>;
