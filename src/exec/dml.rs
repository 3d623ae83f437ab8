use std::sync::Arc;

use super::error::ExecResult;
use super::op::{one_child, OpIterator};
use crate::db::Database;
use crate::tuple::{Field, Tuple, TupleDesc, TupleError, Type};
use crate::tx::TransactionId;

fn count_desc() -> Arc<TupleDesc> {
    Arc::new(TupleDesc::new(
        vec![Type::Int],
        vec![Some("count".to_string())],
    ))
}

fn count_tuple(desc: &Arc<TupleDesc>, count: i32) -> ExecResult<Tuple> {
    Ok(Tuple::with_fields(desc.clone(), vec![Field::Int(count)])?)
}

/// Drains its child and inserts every tuple into a table through the buffer
/// pool; emits a single one-field tuple holding the insert count, then is
/// exhausted until rewound.
pub struct Insert {
    db: Database,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    table_id: u32,
    desc: Arc<TupleDesc>,
    done: bool,
}

impl Insert {
    pub fn new(
        db: &Database,
        tid: TransactionId,
        child: Box<dyn OpIterator>,
        table_id: u32,
    ) -> ExecResult<Self> {
        let table_desc = db.tuple_desc(table_id)?;
        if **child.tuple_desc() != *table_desc {
            return Err(TupleError::SchemaMismatch(format!(
                "child schema ({}) does not match table schema ({})",
                child.tuple_desc(),
                table_desc
            ))
            .into());
        }
        Ok(Self {
            db: db.clone(),
            tid,
            child,
            table_id,
            desc: count_desc(),
            done: false,
        })
    }
}

impl OpIterator for Insert {
    fn open(&mut self) -> ExecResult<()> {
        self.child.open()?;
        self.done = false;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            self.db.insert_tuple(self.tid, self.table_id, tuple)?;
            count += 1;
        }
        Ok(Some(count_tuple(&self.desc, count)?))
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.child.rewind()?;
        self.done = false;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn children(&mut self) -> Vec<&mut dyn OpIterator> {
        vec![self.child.as_mut()]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        self.child = one_child(children)?;
        Ok(())
    }
}

/// Drains its child and deletes every tuple from its table through the
/// buffer pool; emits a single one-field tuple holding the delete count.
pub struct Delete {
    db: Database,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    done: bool,
}

impl Delete {
    pub fn new(db: &Database, tid: TransactionId, child: Box<dyn OpIterator>) -> Self {
        Self {
            db: db.clone(),
            tid,
            child,
            desc: count_desc(),
            done: false,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> ExecResult<()> {
        self.child.open()?;
        self.done = false;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            self.db.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        Ok(Some(count_tuple(&self.desc, count)?))
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.child.rewind()?;
        self.done = false;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn children(&mut self) -> Vec<&mut dyn OpIterator> {
        vec![self.child.as_mut()]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        self.child = one_child(children)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::seq_scan::SeqScan;
    use crate::exec::test_support::ListScan;
    use crate::storage::HeapFile;
    use crate::tuple::Type;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Database, u32, Arc<TupleDesc>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new();
        let desc = Arc::new(TupleDesc::new(
            vec![Type::Int],
            vec![Some("a".to_string())],
        ));
        let file = Arc::new(HeapFile::open(dir.path().join("t.dat"), desc.clone()).unwrap());
        let table_id = db.add_table(file, "t", None);
        (dir, db, table_id, desc)
    }

    fn scan_values(db: &Database, table_id: u32) -> Vec<i32> {
        let mut scan = SeqScan::with_default_alias(db, TransactionId::new(), table_id).unwrap();
        scan.open().unwrap();
        let mut values = Vec::new();
        while let Some(t) = scan.next().unwrap() {
            if let Field::Int(v) = t.field(0).unwrap() {
                values.push(*v);
            }
        }
        scan.close();
        values
    }

    #[test]
    fn test_insert_drains_child_and_reports_count() {
        let (_dir, db, table_id, _desc) = setup();
        let tid = TransactionId::new();
        let child = ListScan::of_ints(&[4, 5, 6]);
        let mut insert = Insert::new(&db, tid, Box::new(child), table_id).unwrap();

        insert.open().unwrap();
        let report = insert.next().unwrap().unwrap();
        assert_eq!(report.field(0).unwrap(), &Field::Int(3));
        // idempotent until rewound
        assert!(insert.next().unwrap().is_none());
        insert.close();

        assert_eq!(scan_values(&db, table_id), vec![4, 5, 6]);
    }

    #[test]
    fn test_insert_rejects_mismatched_child_schema() {
        let (_dir, db, table_id, _desc) = setup();
        let child = ListScan::of_rows(&[&[1, 2]]);
        assert!(Insert::new(&db, TransactionId::new(), Box::new(child), table_id).is_err());
    }

    #[test]
    fn test_delete_removes_scanned_tuples() {
        let (_dir, db, table_id, desc) = setup();
        let tid = TransactionId::new();
        for v in 0..10 {
            let t = Tuple::with_fields(desc.clone(), vec![Field::Int(v)]).unwrap();
            db.insert_tuple(tid, table_id, t).unwrap();
        }

        // delete everything the scan produces
        let scan = SeqScan::with_default_alias(&db, tid, table_id).unwrap();
        let mut delete = Delete::new(&db, tid, Box::new(scan));
        delete.open().unwrap();
        let report = delete.next().unwrap().unwrap();
        assert_eq!(report.field(0).unwrap(), &Field::Int(10));
        assert!(delete.next().unwrap().is_none());
        delete.close();

        assert!(scan_values(&db, table_id).is_empty());
    }
}
