use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::buffer::{BufferPool, Permissions};
use super::error::{StorageError, StorageResult};
use super::page::{HeapPage, PageId};
use super::page_size;
use crate::tuple::{Tuple, TupleDesc};
use crate::tx::TransactionId;

/// Stable 32-bit FNV-1a over the absolute path.
///
/// The std hasher is randomly seeded per process; table ids must survive
/// restarts, so they are derived with a fixed hash instead.
fn stable_table_id(path: &Path) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in path.to_string_lossy().as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// One table's backing store: a dense array of heap pages in a single OS
/// file. Page `i` sits at byte offset `i * page_size()`.
pub struct HeapFile {
    path: PathBuf,
    file: Mutex<File>,
    desc: Arc<TupleDesc>,
    id: u32,
}

impl HeapFile {
    /// Open (creating if absent) the heap file at `path`.
    pub fn open(path: impl AsRef<Path>, desc: Arc<TupleDesc>) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        let path = std::path::absolute(path.as_ref())?;
        let id = stable_table_id(&path);
        Ok(Self {
            path,
            file: Mutex::new(file),
            desc,
            id,
        })
    }

    /// The table id: a deterministic function of the file's absolute path,
    /// stable across process restarts.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Number of pages currently in the file.
    pub fn num_pages(&self) -> StorageResult<usize> {
        let file = self.file.lock().unwrap();
        Ok(file.metadata()?.len() as usize / page_size())
    }

    /// Read and decode one page. Reading past the end of the file is an
    /// error.
    pub fn read_page(&self, pid: PageId) -> StorageResult<HeapPage> {
        if pid.table_id != self.id {
            return Err(StorageError::WrongTable(pid));
        }
        let mut file = self.file.lock().unwrap();
        let offset = (pid.page_no * page_size()) as u64;
        if offset + page_size() as u64 > file.metadata()?.len() {
            return Err(StorageError::PageOutOfBounds(pid));
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; page_size()];
        file.read_exact(&mut data)?;
        HeapPage::new(pid, &data, self.desc.clone())
    }

    /// Write a page image at its offset, extending the file if needed.
    /// The write reaches the OS file before returning.
    pub fn write_page(&self, page: &HeapPage) -> StorageResult<()> {
        self.write_page_data(page.id(), &page.page_data())
    }

    pub(crate) fn write_page_data(&self, pid: PageId, data: &[u8]) -> StorageResult<()> {
        if pid.table_id != self.id {
            return Err(StorageError::WrongTable(pid));
        }
        let mut file = self.file.lock().unwrap();
        let offset = (pid.page_no * page_size()) as u64;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.sync_data()?;
        Ok(())
    }

    /// Insert a tuple into the first page of `file` with a free slot,
    /// appending a fresh page when every existing page is full. All page
    /// access routes through the buffer pool with WRITE permission.
    /// Returns the dirtied page ids.
    pub fn insert_tuple(
        file: &Arc<HeapFile>,
        pool: &mut BufferPool,
        tid: TransactionId,
        tuple: Tuple,
    ) -> StorageResult<Vec<PageId>> {
        if **tuple.desc() != *file.desc {
            return Err(StorageError::SchemaMismatch(format!(
                "tuple schema ({}) does not match table schema ({})",
                tuple.desc(),
                file.desc
            )));
        }

        let mut target = None;
        for page_no in 0..file.num_pages()? {
            let pid = PageId::new(file.id, page_no);
            let page = pool.get_page(file, tid, pid, Permissions::ReadWrite)?;
            if page.num_empty_slots() > 0 {
                target = Some(pid);
                break;
            }
        }

        let pid = match target {
            Some(pid) => pid,
            None => {
                // append an empty page, then pull it back through the pool
                let pid = PageId::new(file.id, file.num_pages()?);
                file.write_page_data(pid, &HeapPage::empty_page_data())?;
                pid
            }
        };

        let page = pool.get_page(file, tid, pid, Permissions::ReadWrite)?;
        page.insert_tuple(tuple)?;
        page.mark_dirty(true, tid);
        Ok(vec![pid])
    }

    /// Delete a tuple from the page named by its record id, through the
    /// buffer pool. Returns the dirtied page ids.
    pub fn delete_tuple(
        file: &Arc<HeapFile>,
        pool: &mut BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> StorageResult<Vec<PageId>> {
        let rid = tuple.record_id().ok_or(StorageError::NoRecordId)?;
        if rid.pid.table_id != file.id {
            return Err(StorageError::WrongTable(rid.pid));
        }
        let page = pool.get_page(file, tid, rid.pid, Permissions::ReadWrite)?;
        page.delete_tuple(tuple)?;
        page.mark_dirty(true, tid);
        Ok(vec![rid.pid])
    }

    /// Create a pull iterator over every tuple of `file` in page order.
    pub fn iter(
        file: &Arc<HeapFile>,
        pool: Arc<Mutex<BufferPool>>,
        tid: TransactionId,
    ) -> HeapFileIterator {
        HeapFileIterator {
            file: file.clone(),
            pool,
            tid,
            next_page_no: 0,
            buffer: VecDeque::new(),
            opened: false,
        }
    }
}

/// Streaming scan over a heap file, one page at a time.
///
/// Pages are fetched through the buffer pool with READ permission; the pool
/// lock is held only while one page's occupied tuples are copied out, never
/// across `next` calls.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<Mutex<BufferPool>>,
    tid: TransactionId,
    next_page_no: usize,
    buffer: VecDeque<Tuple>,
    opened: bool,
}

impl HeapFileIterator {
    pub fn open(&mut self) {
        self.opened = true;
        self.next_page_no = 0;
        self.buffer.clear();
    }

    /// Restart the scan at page 0.
    pub fn rewind(&mut self) {
        self.next_page_no = 0;
        self.buffer.clear();
    }

    pub fn close(&mut self) {
        self.opened = false;
        self.buffer.clear();
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Pull the next tuple, or `None` when the scan is exhausted or the
    /// iterator has not been opened.
    pub fn next(&mut self) -> StorageResult<Option<Tuple>> {
        if !self.opened {
            return Ok(None);
        }
        loop {
            if let Some(tuple) = self.buffer.pop_front() {
                return Ok(Some(tuple));
            }
            if self.next_page_no >= self.file.num_pages()? {
                return Ok(None);
            }
            let pid = PageId::new(self.file.id(), self.next_page_no);
            self.next_page_no += 1;

            let mut pool = self.pool.lock().unwrap();
            let page = pool.get_page(&self.file, self.tid, pid, Permissions::ReadOnly)?;
            self.buffer = page.iter().cloned().collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EvictionPolicy;
    use crate::tuple::{Field, Type};
    use tempfile::TempDir;

    fn int_desc() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::anonymous(vec![Type::Int]))
    }

    fn int_tuple(desc: &Arc<TupleDesc>, v: i32) -> Tuple {
        Tuple::with_fields(desc.clone(), vec![Field::Int(v)]).unwrap()
    }

    fn setup() -> (TempDir, Arc<HeapFile>, BufferPool) {
        let dir = tempfile::tempdir().unwrap();
        let file =
            Arc::new(HeapFile::open(dir.path().join("t.dat"), int_desc()).unwrap());
        let pool = BufferPool::new(50, EvictionPolicy::Steal);
        (dir, file, pool)
    }

    #[test]
    fn test_empty_file_has_no_pages() {
        let (_dir, file, _pool) = setup();
        assert_eq!(file.num_pages().unwrap(), 0);
    }

    #[test]
    fn test_table_id_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        let a = HeapFile::open(&path, int_desc()).unwrap();
        let b = HeapFile::open(&path, int_desc()).unwrap();
        assert_eq!(a.id(), b.id());
        let other = HeapFile::open(dir.path().join("u.dat"), int_desc()).unwrap();
        assert_ne!(a.id(), other.id());
    }

    #[test]
    fn test_write_then_read_page() {
        let (_dir, file, _pool) = setup();
        let desc = int_desc();
        let pid = PageId::new(file.id(), 0);
        let mut page = HeapPage::new(pid, &HeapPage::empty_page_data(), desc.clone()).unwrap();
        page.insert_tuple(int_tuple(&desc, 77)).unwrap();
        file.write_page(&page).unwrap();

        assert_eq!(file.num_pages().unwrap(), 1);
        let back = file.read_page(pid).unwrap();
        assert_eq!(back.iter().count(), 1);
        assert_eq!(back.iter().next().unwrap().field(0).unwrap(), &Field::Int(77));
    }

    #[test]
    fn test_read_past_end_fails() {
        let (_dir, file, _pool) = setup();
        let result = file.read_page(PageId::new(file.id(), 3));
        assert!(matches!(result, Err(StorageError::PageOutOfBounds(_))));
    }

    #[test]
    fn test_insert_appends_pages_when_full() {
        let (_dir, file, mut pool) = setup();
        let desc = int_desc();
        let tid = TransactionId::new();
        let per_page = HeapPage::slots_per_page(&desc);

        for v in 0..(per_page + 1) {
            HeapFile::insert_tuple(&file, &mut pool, tid, int_tuple(&desc, v as i32))
                .unwrap();
        }
        assert_eq!(file.num_pages().unwrap(), 2);
    }

    #[test]
    fn test_insert_schema_mismatch() {
        let (_dir, file, mut pool) = setup();
        let tid = TransactionId::new();
        let other = Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Int]));
        let result = HeapFile::insert_tuple(&file, &mut pool, tid, Tuple::new(other));
        assert!(matches!(result, Err(StorageError::SchemaMismatch(_))));
    }

    #[test]
    fn test_delete_goes_through_pool() {
        let (_dir, file, mut pool) = setup();
        let desc = int_desc();
        let tid = TransactionId::new();

        HeapFile::insert_tuple(&file, &mut pool, tid, int_tuple(&desc, 1)).unwrap();
        HeapFile::insert_tuple(&file, &mut pool, tid, int_tuple(&desc, 2)).unwrap();

        let pid = PageId::new(file.id(), 0);
        let victim = pool
            .get_page(&file, tid, pid, Permissions::ReadOnly)
            .unwrap()
            .iter()
            .next()
            .unwrap()
            .clone();
        HeapFile::delete_tuple(&file, &mut pool, tid, &victim).unwrap();

        let page = pool.get_page(&file, tid, pid, Permissions::ReadOnly).unwrap();
        assert_eq!(page.iter().count(), 1);
        assert!(page.is_dirty());
    }

    #[test]
    fn test_iterator_yields_all_tuples_in_order() {
        let (_dir, file, pool) = setup();
        let desc = int_desc();
        let tid = TransactionId::new();
        let pool = Arc::new(Mutex::new(pool));

        let per_page = HeapPage::slots_per_page(&desc);
        let total = per_page + 10;
        {
            let mut pool = pool.lock().unwrap();
            for v in 0..total {
                HeapFile::insert_tuple(&file, &mut pool, tid, int_tuple(&desc, v as i32))
                    .unwrap();
            }
        }

        let mut it = HeapFile::iter(&file, pool, tid);
        // not opened yet
        assert!(it.next().unwrap().is_none());

        it.open();
        let mut seen = Vec::new();
        while let Some(t) = it.next().unwrap() {
            assert!(t.record_id().is_some());
            if let Field::Int(v) = t.field(0).unwrap() {
                seen.push(*v);
            }
        }
        assert_eq!(seen, (0..total as i32).collect::<Vec<_>>());

        it.rewind();
        assert!(it.next().unwrap().is_some());
        it.close();
        assert!(it.next().unwrap().is_none());
    }
}
