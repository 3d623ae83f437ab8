use std::cmp::Ordering;
use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::op::{one_child, OpIterator};
use crate::tuple::{Tuple, TupleDesc};

/// Sorts its child's output by one field.
///
/// The entire input is buffered and sorted on `open`; delivery then
/// streams from the buffer. The sort is stable, so equal keys keep their
/// child order.
pub struct OrderBy {
    child: Box<dyn OpIterator>,
    field: usize,
    ascending: bool,
    desc: Arc<TupleDesc>,
    buffer: Vec<Tuple>,
    cursor: usize,
    opened: bool,
}

impl OrderBy {
    pub fn new(field: usize, ascending: bool, child: Box<dyn OpIterator>) -> ExecResult<Self> {
        let desc = child.tuple_desc().clone();
        if field >= desc.num_fields() {
            return Err(ExecError::FieldIndex(field));
        }
        Ok(Self {
            child,
            field,
            ascending,
            desc,
            buffer: Vec::new(),
            cursor: 0,
            opened: false,
        })
    }

    pub fn sort_field(&self) -> usize {
        self.field
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }
}

impl OpIterator for OrderBy {
    fn open(&mut self) -> ExecResult<()> {
        self.child.open()?;
        self.buffer.clear();
        self.cursor = 0;
        while let Some(tuple) = self.child.next()? {
            // every tuple comes from one child schema, so the sort key
            // comparison below cannot hit a type mismatch
            tuple.field(self.field)?;
            self.buffer.push(tuple);
        }
        let field = self.field;
        let ascending = self.ascending;
        self.buffer.sort_by(|a, b| {
            let ord = match (a.field(field), b.field(field)) {
                (Ok(x), Ok(y)) => x.cmp_same_type(y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            if ascending { ord } else { ord.reverse() }
        });
        self.opened = true;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if !self.opened {
            return Err(ExecError::NotOpen);
        }
        let tuple = self.buffer.get(self.cursor).cloned();
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
        self.child.close();
        self.buffer.clear();
        self.cursor = 0;
        self.opened = false;
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn children(&mut self) -> Vec<&mut dyn OpIterator> {
        vec![self.child.as_mut()]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        self.child = one_child(children)?;
        self.desc = self.child.tuple_desc().clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::test_support::ListScan;
    use crate::tuple::Field;

    fn first_ints(op: &mut dyn OpIterator) -> Vec<i32> {
        let mut values = Vec::new();
        while let Some(t) = op.next().unwrap() {
            if let Field::Int(v) = t.field(0).unwrap() {
                values.push(*v);
            }
        }
        values
    }

    #[test]
    fn test_sort_ascending() {
        let scan = ListScan::of_ints(&[3, 1, 4, 1, 5]);
        let mut order = OrderBy::new(0, true, Box::new(scan)).unwrap();
        order.open().unwrap();
        assert_eq!(first_ints(&mut order), vec![1, 1, 3, 4, 5]);
    }

    #[test]
    fn test_sort_descending_and_rewind() {
        let scan = ListScan::of_ints(&[3, 1, 4]);
        let mut order = OrderBy::new(0, false, Box::new(scan)).unwrap();
        order.open().unwrap();
        assert_eq!(first_ints(&mut order), vec![4, 3, 1]);
        order.rewind().unwrap();
        assert_eq!(first_ints(&mut order), vec![4, 3, 1]);
    }

    #[test]
    fn test_sort_field_out_of_range() {
        let scan = ListScan::of_ints(&[1]);
        assert!(OrderBy::new(3, true, Box::new(scan)).is_err());
    }
}
