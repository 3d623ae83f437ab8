use std::io;
use thiserror::Error;

use super::page::PageId;
use crate::tuple::TupleError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Tuple error: {0}")]
    Tuple(#[from] TupleError),

    #[error("Page full: {0}")]
    PageFull(PageId),

    #[error("Tuple not present on page {0}")]
    TupleNotOnPage(PageId),

    #[error("Tuple has no record id")]
    NoRecordId,

    #[error("Page {0} is beyond the end of the file")]
    PageOutOfBounds(PageId),

    #[error("Invalid page data: {0}")]
    InvalidPageData(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("All buffered pages are dirty; cannot evict under NO STEAL")]
    AllPagesDirty,

    #[error("Wrong table: page {0} does not belong to this file")]
    WrongTable(PageId),

    #[error("Transaction aborted")]
    TransactionAborted,
}

pub type StorageResult<T> = Result<T, StorageError>;
