use std::fmt;

use super::error::{ExecError, ExecResult};
use crate::tuple::{CmpOp, Field, Tuple};

/// Compares one field of a tuple against a constant operand.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: usize,
    op: CmpOp,
    operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: CmpOp, operand: Field) -> Self {
        Self { field, op, operand }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// True iff `tuple.field[i] op operand` holds.
    pub fn filter(&self, tuple: &Tuple) -> ExecResult<bool> {
        let field = tuple
            .field(self.field)
            .map_err(|_| ExecError::FieldIndex(self.field))?;
        Ok(field.compare(self.op, &self.operand)?)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}

/// Compares a field of one tuple against a field of another; used by Join.
#[derive(Debug, Clone, Copy)]
pub struct JoinPredicate {
    left_field: usize,
    op: CmpOp,
    right_field: usize,
}

impl JoinPredicate {
    pub fn new(left_field: usize, op: CmpOp, right_field: usize) -> Self {
        Self {
            left_field,
            op,
            right_field,
        }
    }

    pub fn left_field(&self) -> usize {
        self.left_field
    }

    pub fn right_field(&self) -> usize {
        self.right_field
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    /// True iff `left.field[li] op right.field[ri]` holds.
    pub fn filter(&self, left: &Tuple, right: &Tuple) -> ExecResult<bool> {
        let l = left
            .field(self.left_field)
            .map_err(|_| ExecError::FieldIndex(self.left_field))?;
        let r = right
            .field(self.right_field)
            .map_err(|_| ExecError::FieldIndex(self.right_field))?;
        Ok(l.compare(self.op, r)?)
    }
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left{} {} right{}", self.left_field, self.op, self.right_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{TupleDesc, Type};
    use std::sync::Arc;

    fn row(values: &[i32]) -> Tuple {
        let desc = Arc::new(TupleDesc::anonymous(vec![Type::Int; values.len()]));
        Tuple::with_fields(desc, values.iter().map(|v| Field::Int(*v)).collect()).unwrap()
    }

    #[test]
    fn test_predicate_filter() {
        let p = Predicate::new(0, CmpOp::LessThan, Field::Int(4));
        assert!(p.filter(&row(&[3])).unwrap());
        assert!(!p.filter(&row(&[4])).unwrap());
        assert!(!p.filter(&row(&[5])).unwrap());
    }

    #[test]
    fn test_predicate_bad_index() {
        let p = Predicate::new(7, CmpOp::Equals, Field::Int(1));
        assert!(matches!(p.filter(&row(&[1])), Err(ExecError::FieldIndex(7))));
    }

    #[test]
    fn test_join_predicate_filter() {
        let p = JoinPredicate::new(1, CmpOp::Equals, 0);
        assert!(p.filter(&row(&[9, 5]), &row(&[5, 1])).unwrap());
        assert!(!p.filter(&row(&[9, 5]), &row(&[6, 1])).unwrap());
    }

    #[test]
    fn test_display() {
        let p = Predicate::new(2, CmpOp::GreaterThanOrEq, Field::Int(10));
        assert_eq!(p.to_string(), "f2 >= 10");
        assert_eq!(CmpOp::NotEquals.to_string(), "<>");
        assert_eq!(CmpOp::Like.to_string(), "LIKE");
    }
}
