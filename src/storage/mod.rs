mod buffer;
mod error;
mod heap_file;
mod page;

pub use buffer::{BufferPool, EvictionPolicy, Permissions, DEFAULT_POOL_PAGES};
pub use error::{StorageError, StorageResult};
pub use heap_file::{HeapFile, HeapFileIterator};
pub use page::{HeapPage, PageId, RecordId, SlotId};

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default bytes per page, including header.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Bytes per page for this process.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

/// Override the process-wide page size.
///
/// Must be called before any heap file is opened; pages already decoded with
/// the old size become unreadable. Intended for tests.
pub fn set_page_size(size: usize) {
    PAGE_SIZE.store(size, Ordering::Relaxed);
}
