use tracing::info;

use super::int_histogram::IntHistogram;
use super::string_histogram::StringHistogram;
use crate::db::Database;
use crate::exec::{ExecResult, OpIterator, SeqScan};
use crate::tuple::{CmpOp, Field, TupleError, Type};
use crate::tx::TransactionId;

/// Cost to read one page, with no distinction between sequential reads and
/// seeks.
pub const IO_COST_PER_PAGE: usize = 1000;

/// Number of bins per column histogram.
pub const NUM_HIST_BINS: usize = 100;

#[derive(Debug, Clone)]
enum ColumnHistogram {
    Int(IntHistogram),
    Str(StringHistogram),
}

/// Statistics over one base table: page count, tuple count, and one
/// histogram per column, built by two passes over a sequential scan.
#[derive(Debug, Clone)]
pub struct TableStats {
    histograms: Vec<ColumnHistogram>,
    num_pages: usize,
    tuple_count: usize,
    io_cost_per_page: usize,
}

impl TableStats {
    pub fn new(db: &Database, table_id: u32, io_cost_per_page: usize) -> ExecResult<Self> {
        let desc = db.tuple_desc(table_id)?;
        let num_fields = desc.num_fields();
        let tid = TransactionId::new();
        let mut scan = SeqScan::with_default_alias(db, tid, table_id)?;

        // first pass: tuple count plus min/max of every int column
        let mut mins: Vec<Option<i32>> = vec![None; num_fields];
        let mut maxs: Vec<Option<i32>> = vec![None; num_fields];
        let mut tuple_count = 0;
        scan.open()?;
        while let Some(tuple) = scan.next()? {
            tuple_count += 1;
            for i in 0..num_fields {
                if let Field::Int(v) = tuple.field(i)? {
                    mins[i] = Some(mins[i].map_or(*v, |m| m.min(*v)));
                    maxs[i] = Some(maxs[i].map_or(*v, |m| m.max(*v)));
                }
            }
        }

        let mut histograms: Vec<ColumnHistogram> = (0..num_fields)
            .map(|i| match desc.field_type(i) {
                Some(Type::Int) => ColumnHistogram::Int(IntHistogram::new(
                    NUM_HIST_BINS,
                    mins[i].unwrap_or(0),
                    maxs[i].unwrap_or(0),
                )),
                _ => ColumnHistogram::Str(StringHistogram::new(NUM_HIST_BINS)),
            })
            .collect();

        // second pass: populate the histograms
        scan.rewind()?;
        while let Some(tuple) = scan.next()? {
            for (i, histogram) in histograms.iter_mut().enumerate() {
                match (histogram, tuple.field(i)?) {
                    (ColumnHistogram::Int(h), Field::Int(v)) => h.add_value(*v),
                    (ColumnHistogram::Str(h), Field::Str(s, _)) => h.add_value(s),
                    _ => {}
                }
            }
        }
        scan.close();

        // count pages from the file itself so pages of empty slots are
        // still charged
        let num_pages = db.table_file(table_id)?.num_pages()?;

        Ok(Self {
            histograms,
            num_pages,
            tuple_count,
            io_cost_per_page,
        })
    }

    /// Cost of scanning the whole table from disk.
    pub fn estimate_scan_cost(&self) -> f64 {
        (self.num_pages * self.io_cost_per_page) as f64
    }

    /// Tuples expected from a scan with the given predicate selectivity.
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> usize {
        (self.tuple_count as f64 * selectivity) as usize
    }

    /// Selectivity of `field op constant` on this table.
    pub fn estimate_selectivity(
        &self,
        field: usize,
        op: CmpOp,
        constant: &Field,
    ) -> ExecResult<f64> {
        let histogram = self
            .histograms
            .get(field)
            .ok_or(crate::exec::ExecError::FieldIndex(field))?;
        match (histogram, constant) {
            (ColumnHistogram::Int(h), Field::Int(v)) => Ok(h.estimate_selectivity(op, *v)),
            (ColumnHistogram::Str(h), Field::Str(s, _)) => Ok(h.estimate_selectivity(op, s)),
            _ => Err(TupleError::TypeMismatch {
                expected: "field matching the column type".to_string(),
                actual: constant.field_type().to_string(),
            }
            .into()),
        }
    }

    /// Expected selectivity of `field op ?` when the operand is unknown.
    pub fn avg_selectivity(&self, field: usize, _op: CmpOp) -> ExecResult<f64> {
        let histogram = self
            .histograms
            .get(field)
            .ok_or(crate::exec::ExecError::FieldIndex(field))?;
        Ok(match histogram {
            ColumnHistogram::Int(h) => h.avg_selectivity(),
            ColumnHistogram::Str(h) => h.avg_selectivity(),
        })
    }

    pub fn total_tuples(&self) -> usize {
        self.tuple_count
    }
}

/// Build a [`TableStats`] for every catalog table and register it in the
/// engine's stats registry under the table's name.
pub fn compute_statistics(db: &Database) -> ExecResult<()> {
    info!("computing table stats");
    for table_id in db.table_ids() {
        let stats = TableStats::new(db, table_id, IO_COST_PER_PAGE)?;
        let name = db.table_name(table_id)?;
        info!(table = %name, tuples = stats.total_tuples(), "table stats ready");
        db.set_table_stats(name, stats);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::HeapFile;
    use crate::tuple::{Tuple, TupleDesc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup_table(values: &[i32]) -> (TempDir, Database, u32) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new();
        let desc = Arc::new(TupleDesc::new(
            vec![Type::Int],
            vec![Some("a".to_string())],
        ));
        let file = Arc::new(HeapFile::open(dir.path().join("t.dat"), desc.clone()).unwrap());
        let table_id = db.add_table(file, "t", None);

        let tid = TransactionId::new();
        for v in values {
            let t = Tuple::with_fields(desc.clone(), vec![Field::Int(*v)]).unwrap();
            db.insert_tuple(tid, table_id, t).unwrap();
        }
        (dir, db, table_id)
    }

    #[test]
    fn test_empty_table_stats() {
        let (_dir, db, table_id) = setup_table(&[]);
        let stats = TableStats::new(&db, table_id, IO_COST_PER_PAGE).unwrap();
        assert_eq!(stats.total_tuples(), 0);
        assert_eq!(stats.estimate_scan_cost(), 0.0);
        assert_eq!(stats.estimate_table_cardinality(1.0), 0);
    }

    #[test]
    fn test_uniform_column_selectivity() {
        let values: Vec<i32> = (0..100).collect();
        let (_dir, db, table_id) = setup_table(&values);
        let stats = TableStats::new(&db, table_id, IO_COST_PER_PAGE).unwrap();

        assert_eq!(stats.total_tuples(), 100);
        let sel = stats
            .estimate_selectivity(0, CmpOp::LessThan, &Field::Int(50))
            .unwrap();
        assert!((0.49..=0.51).contains(&sel), "selectivity was {}", sel);
        assert_eq!(stats.estimate_table_cardinality(0.5), 50);
        assert_eq!(stats.estimate_scan_cost(), IO_COST_PER_PAGE as f64);
    }

    #[test]
    fn test_selectivity_type_mismatch() {
        let (_dir, db, table_id) = setup_table(&[1, 2, 3]);
        let stats = TableStats::new(&db, table_id, IO_COST_PER_PAGE).unwrap();
        let s = Field::str("x", 8).unwrap();
        assert!(stats.estimate_selectivity(0, CmpOp::Equals, &s).is_err());
        assert!(stats.estimate_selectivity(5, CmpOp::Equals, &Field::Int(1)).is_err());
    }

    #[test]
    fn test_avg_selectivity_in_bounds() {
        let (_dir, db, table_id) = setup_table(&[1, 1, 2, 5, 9]);
        let stats = TableStats::new(&db, table_id, IO_COST_PER_PAGE).unwrap();
        let avg = stats.avg_selectivity(0, CmpOp::Equals).unwrap();
        assert!((0.0..=1.0).contains(&avg));
    }

    #[test]
    fn test_compute_statistics_fills_registry() {
        let (_dir, db, table_id) = setup_table(&[7, 8, 9]);
        compute_statistics(&db).unwrap();
        let name = db.table_name(table_id).unwrap();
        let stats = db.table_stats(&name).unwrap();
        assert_eq!(stats.total_tuples(), 3);
        assert!(db.table_stats("missing").is_none());
    }
}
