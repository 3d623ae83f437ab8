use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use crate::tuple::{Tuple, TupleDesc};

/// A node of the pull-based (volcano) operator tree.
///
/// Consumers drive production: `open`, then repeated `next` calls until
/// `Ok(None)`, with `rewind` restarting delivery and `close` releasing
/// state. `open` must precede any `next`. Any method may surface a
/// transaction abort, after which the caller closes the tree and
/// propagates.
pub trait OpIterator {
    fn open(&mut self) -> ExecResult<()>;

    /// Pull one tuple, or `Ok(None)` when exhausted.
    fn next(&mut self) -> ExecResult<Option<Tuple>>;

    fn rewind(&mut self) -> ExecResult<()>;

    fn close(&mut self);

    /// Schema of the tuples this operator emits.
    fn tuple_desc(&self) -> &Arc<TupleDesc>;

    /// Child operators, in order. Leaves return an empty vector.
    fn children(&mut self) -> Vec<&mut dyn OpIterator> {
        Vec::new()
    }

    /// Replace the child operators.
    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> ExecResult<()> {
        if children.is_empty() {
            Ok(())
        } else {
            Err(ExecError::WrongChildCount {
                expected: 0,
                got: children.len(),
            })
        }
    }
}

/// Pop exactly one child from a `set_children` argument.
pub(crate) fn one_child(
    mut children: Vec<Box<dyn OpIterator>>,
) -> ExecResult<Box<dyn OpIterator>> {
    if children.len() != 1 {
        return Err(ExecError::WrongChildCount {
            expected: 1,
            got: children.len(),
        });
    }
    Ok(children.pop().unwrap())
}
