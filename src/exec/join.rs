use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::op::OpIterator;
use super::predicate::JoinPredicate;
use crate::tuple::{Tuple, TupleDesc};

/// Nested-loop join.
///
/// For each left tuple the right child is rewound and scanned in full;
/// matching pairs are emitted as concatenated tuples over the merged
/// schema.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    current_left: Option<Tuple>,
}

impl Join {
    pub fn new(
        predicate: JoinPredicate,
        left: Box<dyn OpIterator>,
        right: Box<dyn OpIterator>,
    ) -> Self {
        let desc = Arc::new(TupleDesc::merge(left.tuple_desc(), right.tuple_desc()));
        Self {
            predicate,
            left,
            right,
            desc,
            current_left: None,
        }
    }

    pub fn predicate(&self) -> &JoinPredicate {
        &self.predicate
    }

    fn merge_tuples(&self, left: &Tuple, right: &Tuple) -> ExecResult<Tuple> {
        let mut fields = Vec::with_capacity(self.desc.num_fields());
        fields.extend(left.fields().iter().cloned());
        fields.extend(right.fields().iter().cloned());
        Ok(Tuple::with_fields(self.desc.clone(), fields)?)
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> ExecResult<()> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                match self.left.next()? {
                    Some(t) => {
                        self.current_left = Some(t);
                        self.right.rewind()?;
                    }
                    None => return Ok(None),
                }
            }
            let left = self.current_left.as_ref().ok_or(ExecError::NotOpen)?;
            while let Some(right) = self.right.next()? {
                if self.predicate.filter(left, &right)? {
                    return Ok(Some(self.merge_tuples(left, &right)?));
                }
            }
            self.current_left = None;
        }
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.current_left = None;
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn children(&mut self) -> Vec<&mut dyn OpIterator> {
        vec![self.left.as_mut(), self.right.as_mut()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        if children.len() != 2 {
            return Err(ExecError::WrongChildCount {
                expected: 2,
                got: children.len(),
            });
        }
        self.right = children.pop().unwrap();
        self.left = children.pop().unwrap();
        self.desc = Arc::new(TupleDesc::merge(
            self.left.tuple_desc(),
            self.right.tuple_desc(),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::test_support::ListScan;
    use crate::tuple::{CmpOp, Field};

    fn int_fields(t: &Tuple) -> Vec<i32> {
        t.fields()
            .iter()
            .map(|f| match f {
                Field::Int(v) => *v,
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_equi_join() {
        let left = ListScan::of_rows(&[&[1, 10], &[2, 20], &[3, 30]]);
        let right = ListScan::of_rows(&[&[2, 200], &[3, 300], &[4, 400]]);
        let mut join = Join::new(
            JoinPredicate::new(0, CmpOp::Equals, 0),
            Box::new(left),
            Box::new(right),
        );
        assert_eq!(join.tuple_desc().num_fields(), 4);

        join.open().unwrap();
        let mut rows = Vec::new();
        while let Some(t) = join.next().unwrap() {
            rows.push(int_fields(&t));
        }
        assert_eq!(rows, vec![vec![2, 20, 2, 200], vec![3, 30, 3, 300]]);
        join.close();
    }

    #[test]
    fn test_join_emits_all_pairs_per_left() {
        let left = ListScan::of_rows(&[&[1], &[2]]);
        let right = ListScan::of_rows(&[&[1], &[1], &[2]]);
        let mut join = Join::new(
            JoinPredicate::new(0, CmpOp::Equals, 0),
            Box::new(left),
            Box::new(right),
        );
        join.open().unwrap();
        let mut rows = Vec::new();
        while let Some(t) = join.next().unwrap() {
            rows.push(int_fields(&t));
        }
        assert_eq!(rows, vec![vec![1, 1], vec![1, 1], vec![2, 2]]);
    }

    #[test]
    fn test_join_rewind() {
        let left = ListScan::of_rows(&[&[7]]);
        let right = ListScan::of_rows(&[&[7]]);
        let mut join = Join::new(
            JoinPredicate::new(0, CmpOp::Equals, 0),
            Box::new(left),
            Box::new(right),
        );
        join.open().unwrap();
        assert!(join.next().unwrap().is_some());
        assert!(join.next().unwrap().is_none());
        join.rewind().unwrap();
        assert!(join.next().unwrap().is_some());
    }

    #[test]
    fn test_inequality_join() {
        let left = ListScan::of_rows(&[&[1], &[5]]);
        let right = ListScan::of_rows(&[&[2], &[4]]);
        let mut join = Join::new(
            JoinPredicate::new(0, CmpOp::LessThan, 0),
            Box::new(left),
            Box::new(right),
        );
        join.open().unwrap();
        let mut rows = Vec::new();
        while let Some(t) = join.next().unwrap() {
            rows.push(int_fields(&t));
        }
        assert_eq!(rows, vec![vec![1, 2], vec![1, 4]]);
    }
}
