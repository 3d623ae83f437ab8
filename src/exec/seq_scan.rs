use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::op::OpIterator;
use crate::db::Database;
use crate::storage::{HeapFile, HeapFileIterator};
use crate::tuple::{Tuple, TupleDesc};
use crate::tx::TransactionId;

/// Sequential scan over one table, in page-and-slot order.
///
/// The output schema is the table's schema with every field name prefixed
/// `alias.`; the prefix disambiguates columns when the same table is joined
/// with itself.
pub struct SeqScan {
    db: Database,
    tid: TransactionId,
    table_id: u32,
    alias: String,
    desc: Arc<TupleDesc>,
    iter: HeapFileIterator,
}

impl SeqScan {
    pub fn new(
        db: &Database,
        tid: TransactionId,
        table_id: u32,
        alias: impl Into<String>,
    ) -> ExecResult<Self> {
        let alias = alias.into();
        let base = db.tuple_desc(table_id)?;
        let types = base
            .items()
            .iter()
            .map(|item| item.field_type)
            .collect::<Vec<_>>();
        let names = base
            .items()
            .iter()
            .map(|item| Some(format!("{}.{}", alias, item.name.as_deref().unwrap_or(""))))
            .collect::<Vec<_>>();
        let desc = Arc::new(TupleDesc::new(types, names));

        let file = db.table_file(table_id)?;
        let iter = HeapFile::iter(&file, db.pool(), tid);
        Ok(Self {
            db: db.clone(),
            tid,
            table_id,
            alias,
            desc,
            iter,
        })
    }

    /// Scan a table under its catalog name as the alias.
    pub fn with_default_alias(
        db: &Database,
        tid: TransactionId,
        table_id: u32,
    ) -> ExecResult<Self> {
        let alias = db.table_name(table_id)?;
        Self::new(db, tid, table_id, alias)
    }

    pub fn table_name(&self) -> ExecResult<String> {
        Ok(self.db.table_name(self.table_id)?)
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Point the scan at a different table, with a new alias.
    pub fn reset(&mut self, table_id: u32, alias: impl Into<String>) -> ExecResult<()> {
        *self = Self::new(&self.db, self.tid, table_id, alias)?;
        Ok(())
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> ExecResult<()> {
        self.iter.open();
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if !self.iter.is_open() {
            return Err(ExecError::NotOpen);
        }
        Ok(self.iter.next()?)
    }

    fn rewind(&mut self) -> ExecResult<()> {
        if !self.iter.is_open() {
            return Err(ExecError::NotOpen);
        }
        self.iter.rewind();
        Ok(())
    }

    fn close(&mut self) {
        self.iter.close();
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::HeapFile;
    use crate::tuple::{Field, Type};
    use tempfile::TempDir;

    fn setup_table(rows: i32) -> (TempDir, Database, u32) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new();
        let desc = Arc::new(TupleDesc::new(
            vec![Type::Int],
            vec![Some("a".to_string())],
        ));
        let file = Arc::new(HeapFile::open(dir.path().join("t.dat"), desc.clone()).unwrap());
        let table_id = db.add_table(file, "t", None);

        let tid = TransactionId::new();
        for v in 0..rows {
            let tuple = Tuple::with_fields(desc.clone(), vec![Field::Int(v)]).unwrap();
            db.insert_tuple(tid, table_id, tuple).unwrap();
        }
        (dir, db, table_id)
    }

    #[test]
    fn test_alias_prefixes_field_names() {
        let (_dir, db, table_id) = setup_table(0);
        let scan = SeqScan::new(&db, TransactionId::new(), table_id, "x").unwrap();
        assert_eq!(scan.tuple_desc().field_name(0), Some("x.a"));
        assert_eq!(scan.alias(), "x");
        assert_eq!(scan.table_name().unwrap(), "t");
    }

    #[test]
    fn test_next_requires_open() {
        let (_dir, db, table_id) = setup_table(1);
        let mut scan = SeqScan::new(&db, TransactionId::new(), table_id, "t").unwrap();
        assert!(matches!(scan.next(), Err(ExecError::NotOpen)));
    }

    #[test]
    fn test_scan_emits_all_rows_in_order() {
        let (_dir, db, table_id) = setup_table(25);
        let mut scan = SeqScan::new(&db, TransactionId::new(), table_id, "t").unwrap();
        scan.open().unwrap();

        let mut seen = Vec::new();
        while let Some(t) = scan.next().unwrap() {
            if let Field::Int(v) = t.field(0).unwrap() {
                seen.push(*v);
            }
        }
        assert_eq!(seen, (0..25).collect::<Vec<_>>());

        scan.rewind().unwrap();
        assert!(scan.next().unwrap().is_some());
        scan.close();
    }
}
