use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::stats::TableStats;
use crate::storage::{
    BufferPool, EvictionPolicy, HeapFile, PageId, StorageError, DEFAULT_POOL_PAGES,
};
use crate::tuple::{Tuple, TupleDesc, TupleError};
use crate::tx::TransactionId;


#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Tuple error: {0}")]
    Tuple(#[from] TupleError),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// The engine context: catalog, buffer pool, and statistics registry behind
/// shared handles. Every component receives one of these instead of
/// reaching for process-wide state; tests build a fresh context each.
///
/// Cloning is cheap and yields a handle to the same engine. Lock order is
/// always catalog before pool.
#[derive(Clone)]
pub struct Database {
    catalog: Arc<RwLock<Catalog>>,
    pool: Arc<Mutex<BufferPool>>,
    stats: Arc<RwLock<HashMap<String, TableStats>>>,
}

impl Database {
    /// An engine with the default buffer capacity and STEAL eviction.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_POOL_PAGES, EvictionPolicy::Steal)
    }

    pub fn with_buffer(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(Catalog::new())),
            pool: Arc::new(Mutex::new(BufferPool::new(capacity, policy))),
            stats: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Handle to the shared buffer pool.
    pub fn pool(&self) -> Arc<Mutex<BufferPool>> {
        self.pool.clone()
    }

    // -- catalog surface ----------------------------------------------------

    pub fn add_table(
        &self,
        file: Arc<HeapFile>,
        name: impl Into<String>,
        primary_key: Option<String>,
    ) -> u32 {
        self.catalog.write().unwrap().add_table(file, name, primary_key)
    }

    /// Load a plain-text schema file into the catalog (§ catalog loader).
    pub fn load_schema(&self, path: impl AsRef<Path>) -> DatabaseResult<Vec<u32>> {
        Ok(self.catalog.write().unwrap().load_schema(path)?)
    }

    pub fn table_id(&self, name: &str) -> DatabaseResult<u32> {
        Ok(self.catalog.read().unwrap().table_id(name)?)
    }

    pub fn table_name(&self, id: u32) -> DatabaseResult<String> {
        Ok(self.catalog.read().unwrap().table_name(id)?.to_string())
    }

    pub fn tuple_desc(&self, id: u32) -> DatabaseResult<Arc<TupleDesc>> {
        Ok(self.catalog.read().unwrap().tuple_desc(id)?)
    }

    pub fn table_file(&self, id: u32) -> DatabaseResult<Arc<HeapFile>> {
        Ok(self.catalog.read().unwrap().table_file(id)?.clone())
    }

    pub fn table_ids(&self) -> Vec<u32> {
        self.catalog.read().unwrap().table_ids().collect()
    }

    // -- mutation through the buffer pool -----------------------------------

    /// Insert a tuple into the given table on behalf of `tid`.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: u32,
        tuple: Tuple,
    ) -> DatabaseResult<()> {
        let file = self.table_file(table_id)?;
        let mut pool = self.pool.lock().unwrap();
        pool.insert_tuple(&file, tid, tuple)?;
        Ok(())
    }

    /// Delete a tuple from the table named by its record id.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DatabaseResult<()> {
        let rid = tuple.record_id().ok_or(StorageError::NoRecordId)?;
        let file = self.table_file(rid.pid.table_id)?;
        let mut pool = self.pool.lock().unwrap();
        pool.delete_tuple(&file, tid, tuple)?;
        Ok(())
    }

    // -- pool surface -------------------------------------------------------

    pub fn flush_page(&self, pid: PageId) -> DatabaseResult<()> {
        Ok(self.pool.lock().unwrap().flush_page(pid)?)
    }

    pub fn flush_all_pages(&self) -> DatabaseResult<()> {
        Ok(self.pool.lock().unwrap().flush_all_pages()?)
    }

    pub fn flush_pages(&self, tid: TransactionId) -> DatabaseResult<()> {
        Ok(self.pool.lock().unwrap().flush_pages(tid)?)
    }

    pub fn discard_page(&self, pid: PageId) {
        self.pool.lock().unwrap().discard_page(pid);
    }

    // -- statistics registry ------------------------------------------------

    pub fn set_table_stats(&self, name: impl Into<String>, stats: TableStats) {
        self.stats.write().unwrap().insert(name.into(), stats);
    }

    pub fn table_stats(&self, name: &str) -> Option<TableStats> {
        self.stats.read().unwrap().get(name).cloned()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
