use std::sync::Arc;

use super::error::ExecResult;
use super::op::{one_child, OpIterator};
use super::predicate::Predicate;
use crate::tuple::{Tuple, TupleDesc};

/// Emits the child tuples that satisfy a predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        let desc = child.tuple_desc().clone();
        Self {
            predicate,
            child,
            desc,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> ExecResult<()> {
        self.child.open()
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        while let Some(tuple) = self.child.next()? {
            if self.predicate.filter(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.child.rewind()
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
        self.desc = self.child.tuple_desc().clone();
        Ok(())
    }
}
