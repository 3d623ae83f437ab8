use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::op::{one_child, OpIterator};
use crate::tuple::{Tuple, TupleDesc};

/// Emits a fixed subset of its child's fields, in the given order.
pub struct Project {
    child: Box<dyn OpIterator>,
    fields: Vec<usize>,
    desc: Arc<TupleDesc>,
}

impl Project {
    pub fn new(fields: Vec<usize>, child: Box<dyn OpIterator>) -> ExecResult<Self> {
        let desc = Self::projected_desc(&fields, child.tuple_desc())?;
        Ok(Self {
            child,
            fields,
            desc,
        })
    }

    fn projected_desc(fields: &[usize], child: &TupleDesc) -> ExecResult<Arc<TupleDesc>> {
        let mut types = Vec::with_capacity(fields.len());
        let mut names = Vec::with_capacity(fields.len());
        for &i in fields {
            let ty = child.field_type(i).ok_or(ExecError::FieldIndex(i))?;
            types.push(*ty);
            names.push(child.field_name(i).map(str::to_string));
        }
        Ok(Arc::new(TupleDesc::new(types, names)))
    }
}

impl OpIterator for Project {
    fn open(&mut self) -> ExecResult<()> {
        self.child.open()
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        match self.child.next()? {
            Some(tuple) => {
                let mut fields = Vec::with_capacity(self.fields.len());
                for &i in &self.fields {
                    fields.push(tuple.field(i)?.clone());
                }
                Ok(Some(Tuple::with_fields(self.desc.clone(), fields)?))
            }
            None => Ok(None),
        }
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
        self.desc = Self::projected_desc(&self.fields, self.child.tuple_desc())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::test_support::ListScan;
    use crate::tuple::{Field, Type};

    #[test]
    fn test_project_selects_and_reorders() {
        let scan = ListScan::of_rows_named(&[&[1, 10, 100], &[2, 20, 200]], &["a", "b", "c"]);
        let mut project = Project::new(vec![2, 0], Box::new(scan)).unwrap();
        assert_eq!(project.tuple_desc().field_name(0), Some("c"));
        assert_eq!(project.tuple_desc().field_name(1), Some("a"));
        assert_eq!(project.tuple_desc().field_type(0), Some(&Type::Int));

        project.open().unwrap();
        let t = project.next().unwrap().unwrap();
        assert_eq!(t.fields(), &[Field::Int(100), Field::Int(1)]);
        let t = project.next().unwrap().unwrap();
        assert_eq!(t.fields(), &[Field::Int(200), Field::Int(2)]);
        assert!(project.next().unwrap().is_none());
    }

    #[test]
    fn test_project_rejects_bad_index() {
        let scan = ListScan::of_ints(&[1]);
        assert!(Project::new(vec![0, 4], Box::new(scan)).is_err());
    }
}
