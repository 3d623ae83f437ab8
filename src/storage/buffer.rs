use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::heap_file::HeapFile;
use super::page::{HeapPage, PageId};
use crate::tx::TransactionId;

/// Default number of pages a buffer pool holds.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Permission a transaction requests on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}

/// Whether dirty pages may be written out before their transaction commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Dirty victims are flushed and evicted.
    Steal,
    /// Dirty pages are never evicted; eviction fails when every resident
    /// page is dirty.
    NoSteal,
}

struct Frame {
    page: HeapPage,
    /// Backing file, kept so the frame can be written out without a catalog
    /// lookup.
    file: Arc<HeapFile>,
}

/// Bounded LRU cache of heap pages.
///
/// The pool is authoritative for any page it holds: the on-disk copy of a
/// dirty page is stale until flushed. An access is any `get_page` hit or
/// miss; accesses move the page to the MRU end, and eviction takes the LRU
/// end.
pub struct BufferPool {
    cache: LruCache<PageId, Frame>,
    capacity: usize,
    policy: EvictionPolicy,
}

impl BufferPool {
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap()),
            capacity: capacity.max(1),
            policy,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, pid: PageId) -> bool {
        self.cache.contains(&pid)
    }

    pub fn dirty_page_count(&self) -> usize {
        self.cache.iter().filter(|(_, f)| f.page.is_dirty()).count()
    }

    /// Hook for a concurrency-control manager: acquire the lock for
    /// (tid, pid, perm) before the page is handed out. This implementation
    /// does no locking; a CC-enabled one may block here or fail with
    /// [`StorageError::TransactionAborted`].
    fn acquire_lock(
        &mut self,
        _tid: TransactionId,
        _pid: PageId,
        _perm: Permissions,
    ) -> StorageResult<()> {
        Ok(())
    }

    /// Return the cached page, reading it from `file` on a miss. A hit or
    /// a miss both count as an access; on a full pool a miss evicts first.
    pub fn get_page(
        &mut self,
        file: &Arc<HeapFile>,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> StorageResult<&mut HeapPage> {
        self.acquire_lock(tid, pid, perm)?;

        if self.cache.peek(&pid).is_none() {
            if self.cache.len() >= self.capacity {
                self.evict_page()?;
            }
            let page = file.read_page(pid)?;
            self.cache.put(
                pid,
                Frame {
                    page,
                    file: file.clone(),
                },
            );
        }

        Ok(&mut self.cache.get_mut(&pid).unwrap().page)
    }

    /// Insert a tuple into `file`'s table; dirtied pages end up cached at
    /// the MRU end.
    pub fn insert_tuple(
        &mut self,
        file: &Arc<HeapFile>,
        tid: TransactionId,
        tuple: crate::tuple::Tuple,
    ) -> StorageResult<Vec<PageId>> {
        HeapFile::insert_tuple(file, self, tid, tuple)
    }

    /// Delete a tuple from the page named by its record id.
    pub fn delete_tuple(
        &mut self,
        file: &Arc<HeapFile>,
        tid: TransactionId,
        tuple: &crate::tuple::Tuple,
    ) -> StorageResult<Vec<PageId>> {
        HeapFile::delete_tuple(file, self, tid, tuple)
    }

    /// Write the page to disk if it is cached and dirty, clearing the dirty
    /// flag. The page stays cached and its LRU position is untouched.
    pub fn flush_page(&mut self, pid: PageId) -> StorageResult<()> {
        if let Some(frame) = self.cache.peek_mut(&pid)
            && let Some(tid) = frame.page.dirtier()
        {
            debug!(page = %pid, "flushing page");
            frame.file.write_page(&frame.page)?;
            frame.page.mark_dirty(false, tid);
        }
        Ok(())
    }

    /// Flush every cached page.
    pub fn flush_all_pages(&mut self) -> StorageResult<()> {
        let pids: Vec<PageId> = self.cache.iter().map(|(pid, _)| *pid).collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Flush exactly the pages dirtied by `tid`.
    pub fn flush_pages(&mut self, tid: TransactionId) -> StorageResult<()> {
        let pids: Vec<PageId> = self
            .cache
            .iter()
            .filter(|(_, f)| f.page.dirtier() == Some(tid))
            .map(|(pid, _)| *pid)
            .collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Drop the page from the cache without writing it. Used by a recovery
    /// manager to discard aborted pages.
    pub fn discard_page(&mut self, pid: PageId) {
        self.cache.pop(&pid);
    }

    /// Evict one page according to the pool's policy.
    pub fn evict_page(&mut self) -> StorageResult<()> {
        match self.policy {
            EvictionPolicy::Steal => {
                if let Some((pid, frame)) = self.cache.pop_lru() {
                    if frame.page.is_dirty() {
                        debug!(page = %pid, "flushing dirty victim");
                        frame.file.write_page(&frame.page)?;
                    }
                    debug!(page = %pid, "evicted page");
                }
                Ok(())
            }
            EvictionPolicy::NoSteal => {
                // iter() runs MRU to LRU, so the last clean frame is the
                // least recently used one
                let victim = self
                    .cache
                    .iter()
                    .filter(|(_, f)| !f.page.is_dirty())
                    .map(|(pid, _)| *pid)
                    .next_back()
                    .ok_or(StorageError::AllPagesDirty)?;
                self.cache.pop(&victim);
                debug!(page = %victim, "evicted clean page");
                Ok(())
            }
        }
    }
}
