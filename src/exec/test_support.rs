//! In-memory operators for exercising the tree without real storage.

use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::op::OpIterator;
use crate::tuple::{Field, Tuple, TupleDesc, Type};

/// Leaf operator that replays a fixed list of tuples.
pub struct ListScan {
    desc: Arc<TupleDesc>,
    tuples: Vec<Tuple>,
    cursor: usize,
    opened: bool,
}

impl ListScan {
    pub fn new(desc: Arc<TupleDesc>, tuples: Vec<Tuple>) -> Self {
        Self {
            desc,
            tuples,
            cursor: 0,
            opened: false,
        }
    }

    /// One anonymous int column.
    pub fn of_ints(values: &[i32]) -> Self {
        let desc = Arc::new(TupleDesc::anonymous(vec![Type::Int]));
        let tuples = values
            .iter()
            .map(|v| Tuple::with_fields(desc.clone(), vec![Field::Int(*v)]).unwrap())
            .collect();
        Self::new(desc, tuples)
    }

    /// Anonymous int columns, one row per inner slice.
    pub fn of_rows(rows: &[&[i32]]) -> Self {
        let width = rows.first().map(|r| r.len()).unwrap_or(1);
        let desc = Arc::new(TupleDesc::anonymous(vec![Type::Int; width]));
        let tuples = rows
            .iter()
            .map(|row| {
                Tuple::with_fields(desc.clone(), row.iter().map(|v| Field::Int(*v)).collect())
                    .unwrap()
            })
            .collect();
        Self::new(desc, tuples)
    }

    /// Named int columns.
    pub fn of_rows_named(rows: &[&[i32]], names: &[&str]) -> Self {
        let desc = Arc::new(TupleDesc::new(
            vec![Type::Int; names.len()],
            names.iter().map(|n| Some(n.to_string())).collect(),
        ));
        let tuples = rows
            .iter()
            .map(|row| {
                Tuple::with_fields(desc.clone(), row.iter().map(|v| Field::Int(*v)).collect())
                    .unwrap()
            })
            .collect();
        Self::new(desc, tuples)
    }

    /// One string column.
    pub fn of_strings(values: &[&str]) -> Self {
        let desc = Arc::new(TupleDesc::anonymous(vec![Type::String(32)]));
        let tuples = values
            .iter()
            .map(|v| {
                Tuple::with_fields(desc.clone(), vec![Field::str(*v, 32).unwrap()]).unwrap()
            })
            .collect();
        Self::new(desc, tuples)
    }

    pub fn boxed_strings(values: &[&str]) -> Box<dyn OpIterator> {
        Box::new(Self::of_strings(values))
    }
}

impl OpIterator for ListScan {
    fn open(&mut self) -> ExecResult<()> {
        self.opened = true;
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if !self.opened {
            return Err(ExecError::NotOpen);
        }
        let tuple = self.tuples.get(self.cursor).cloned();
        if tuple.is_some() {
            self.cursor += 1;
        }
        Ok(tuple)
    }

    fn rewind(&mut self) -> ExecResult<()> {
        if !self.opened {
            return Err(ExecError::NotOpen);
        }
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
        self.cursor = 0;
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }
}
