use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::op::{one_child, OpIterator};
use crate::tuple::{Field, Tuple, TupleDesc, Type};

/// Aggregation operator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl fmt::Display for AggOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggOp::Min => "min",
            AggOp::Max => "max",
            AggOp::Sum => "sum",
            AggOp::Avg => "avg",
            AggOp::Count => "count",
        };
        write!(f, "{}", s)
    }
}

/// Running state for one group of integer values.
#[derive(Debug, Clone)]
struct IntGroup {
    min: i32,
    max: i32,
    sum: i64,
    count: i64,
}

impl IntGroup {
    fn new(v: i32) -> Self {
        Self {
            min: v,
            max: v,
            sum: v as i64,
            count: 1,
        }
    }

    fn merge(&mut self, v: i32) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.sum += v as i64;
        self.count += 1;
    }

    fn result(&self, op: AggOp) -> i32 {
        match op {
            AggOp::Min => self.min,
            AggOp::Max => self.max,
            AggOp::Sum => self.sum as i32,
            // integer division, no rounding
            AggOp::Avg => (self.sum / self.count) as i32,
            AggOp::Count => self.count as i32,
        }
    }
}

/// Per-group aggregate state. Integer fields support every op; string
/// fields support only COUNT. The key is the group-by field, or `None` for
/// the single global group.
#[derive(Debug, Clone)]
enum GroupState {
    Int(HashMap<Option<Field>, IntGroup>),
    StrCount(HashMap<Option<Field>, i64>),
}

impl GroupState {
    fn clear(&mut self) {
        match self {
            GroupState::Int(m) => m.clear(),
            GroupState::StrCount(m) => m.clear(),
        }
    }
}

/// Groups its child's output and computes one aggregate value per group.
///
/// All input is consumed on `open`; one tuple per group is then emitted:
/// `(group_key, aggregate)` when grouped, `(aggregate,)` otherwise. Group
/// order is unspecified.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    afield: usize,
    gfield: Option<usize>,
    op: AggOp,
    state: GroupState,
    desc: Arc<TupleDesc>,
    output: Vec<Tuple>,
    cursor: usize,
    opened: bool,
}

impl Aggregate {
    /// Build an aggregate over `child.field[afield]`, grouped by
    /// `child.field[gfield]` when present.
    pub fn new(
        child: Box<dyn OpIterator>,
        afield: usize,
        gfield: Option<usize>,
        op: AggOp,
    ) -> ExecResult<Self> {
        let child_desc = child.tuple_desc();
        let value_type = *child_desc
            .field_type(afield)
            .ok_or(ExecError::FieldIndex(afield))?;

        let state = match value_type {
            Type::Int => GroupState::Int(HashMap::new()),
            Type::String(_) => {
                if op != AggOp::Count {
                    return Err(ExecError::Unsupported(format!(
                        "{} over a string field",
                        op
                    )));
                }
                GroupState::StrCount(HashMap::new())
            }
        };

        let agg_name = Some(format!(
            "{}({})",
            op,
            child_desc.field_name(afield).unwrap_or("")
        ));
        let desc = match gfield {
            Some(g) => {
                let group_type = *child_desc
                    .field_type(g)
                    .ok_or(ExecError::FieldIndex(g))?;
                let group_name = child_desc.field_name(g).map(str::to_string);
                Arc::new(TupleDesc::new(
                    vec![group_type, Type::Int],
                    vec![group_name, agg_name],
                ))
            }
            None => Arc::new(TupleDesc::new(vec![Type::Int], vec![agg_name])),
        };

        Ok(Self {
            child,
            afield,
            gfield,
            op,
            state,
            desc,
            output: Vec::new(),
            cursor: 0,
            opened: false,
        })
    }

    pub fn aggregate_field(&self) -> usize {
        self.afield
    }

    pub fn group_field(&self) -> Option<usize> {
        self.gfield
    }

    pub fn op(&self) -> AggOp {
        self.op
    }

    fn merge(&mut self, tuple: &Tuple) -> ExecResult<()> {
        let key = match self.gfield {
            Some(g) => Some(tuple.field(g)?.clone()),
            None => None,
        };
        let value = tuple.field(self.afield)?;
        match (&mut self.state, value) {
            (GroupState::Int(groups), Field::Int(v)) => {
                groups
                    .entry(key)
                    .and_modify(|g| g.merge(*v))
                    .or_insert_with(|| IntGroup::new(*v));
            }
            (GroupState::StrCount(groups), Field::Str(..)) => {
                *groups.entry(key).or_insert(0) += 1;
            }
            _ => {
                return Err(ExecError::Unsupported(
                    "aggregate value type changed mid-stream".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn build_output(&mut self) -> ExecResult<()> {
        self.output.clear();
        self.cursor = 0;

        let results: Vec<(Option<Field>, i32)> = match &self.state {
            GroupState::Int(groups) => groups
                .iter()
                .map(|(k, g)| (k.clone(), g.result(self.op)))
                .collect(),
            GroupState::StrCount(groups) => {
                groups.iter().map(|(k, c)| (k.clone(), *c as i32)).collect()
            }
        };

        for (key, value) in results {
            let fields = match key {
                Some(group) => vec![group, Field::Int(value)],
                None => vec![Field::Int(value)],
            };
            self.output.push(Tuple::with_fields(self.desc.clone(), fields)?);
        }

        // an ungrouped COUNT of nothing is still 0
        if self.output.is_empty() && self.gfield.is_none() && self.op == AggOp::Count {
            self.output
                .push(Tuple::with_fields(self.desc.clone(), vec![Field::Int(0)])?);
        }
        Ok(())
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> ExecResult<()> {
        self.child.open()?;
        self.state.clear();
        while let Some(tuple) = self.child.next()? {
            self.merge(&tuple)?;
        }
        self.build_output()?;
        self.opened = true;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<Option<Tuple>> {
        if !self.opened {
            return Err(ExecError::NotOpen);
        }
        let tuple = self.output.get(self.cursor).cloned();
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
        self.state.clear();
        self.output.clear();
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::test_support::ListScan;

    fn collect_pairs(agg: &mut Aggregate) -> Vec<(i32, i32)> {
        let mut rows = Vec::new();
        while let Some(t) = agg.next().unwrap() {
            match (t.field(0).unwrap(), t.field(1).unwrap()) {
                (Field::Int(g), Field::Int(v)) => rows.push((*g, *v)),
                _ => unreachable!(),
            }
        }
        rows.sort_unstable();
        rows
    }

    fn single_value(agg: &mut Aggregate) -> i32 {
        let t = agg.next().unwrap().unwrap();
        assert!(agg.next().unwrap().is_none());
        match t.field(0).unwrap() {
            Field::Int(v) => *v,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_grouped_avg_uses_integer_division() {
        let scan = ListScan::of_rows(&[&[1, 10], &[1, 20], &[2, 30], &[2, 40], &[2, 50]]);
        let mut agg = Aggregate::new(Box::new(scan), 1, Some(0), AggOp::Avg).unwrap();
        agg.open().unwrap();
        assert_eq!(collect_pairs(&mut agg), vec![(1, 15), (2, 40)]);
        agg.close();
    }

    #[test]
    fn test_grouped_min_max_sum_count() {
        let rows: &[&[i32]] = &[&[1, 3], &[1, 7], &[2, 5]];
        for (op, expected) in [
            (AggOp::Min, vec![(1, 3), (2, 5)]),
            (AggOp::Max, vec![(1, 7), (2, 5)]),
            (AggOp::Sum, vec![(1, 10), (2, 5)]),
            (AggOp::Count, vec![(1, 2), (2, 1)]),
        ] {
            let scan = ListScan::of_rows(rows);
            let mut agg = Aggregate::new(Box::new(scan), 1, Some(0), op).unwrap();
            agg.open().unwrap();
            assert_eq!(collect_pairs(&mut agg), expected, "op {}", op);
        }
    }

    #[test]
    fn test_ungrouped_aggregate() {
        let scan = ListScan::of_ints(&[4, 8, 6]);
        let mut agg = Aggregate::new(Box::new(scan), 0, None, AggOp::Sum).unwrap();
        assert_eq!(agg.tuple_desc().num_fields(), 1);
        agg.open().unwrap();
        assert_eq!(single_value(&mut agg), 18);
    }

    #[test]
    fn test_ungrouped_count_of_empty_input_is_zero() {
        let scan = ListScan::of_ints(&[]);
        let mut agg = Aggregate::new(Box::new(scan), 0, None, AggOp::Count).unwrap();
        agg.open().unwrap();
        assert_eq!(single_value(&mut agg), 0);

        let scan = ListScan::of_ints(&[]);
        let mut agg = Aggregate::new(Box::new(scan), 0, None, AggOp::Min).unwrap();
        agg.open().unwrap();
        assert!(agg.next().unwrap().is_none());
    }

    #[test]
    fn test_string_field_only_supports_count() {
        let scan = ListScan::of_strings(&["a", "b", "a"]);
        assert!(Aggregate::new(
            ListScan::boxed_strings(&["a"]),
            0,
            None,
            AggOp::Sum
        )
        .is_err());

        let mut agg = Aggregate::new(Box::new(scan), 0, None, AggOp::Count).unwrap();
        agg.open().unwrap();
        assert_eq!(single_value(&mut agg), 3);
    }

    #[test]
    fn test_rewind_replays_output() {
        let scan = ListScan::of_rows(&[&[1, 1], &[1, 2]]);
        let mut agg = Aggregate::new(Box::new(scan), 1, Some(0), AggOp::Count).unwrap();
        agg.open().unwrap();
        assert_eq!(collect_pairs(&mut agg), vec![(1, 2)]);
        agg.rewind().unwrap();
        assert_eq!(collect_pairs(&mut agg), vec![(1, 2)]);
    }

    #[test]
    fn test_output_schema() {
        let scan = ListScan::of_rows_named(&[&[1, 2]], &["g", "v"]);
        let agg = Aggregate::new(Box::new(scan), 1, Some(0), AggOp::Avg).unwrap();
        let desc = agg.tuple_desc();
        assert_eq!(desc.field_name(0), Some("g"));
        assert_eq!(desc.field_name(1), Some("avg(v)"));
        assert_eq!(desc.field_type(0), Some(&Type::Int));
        assert_eq!(desc.field_type(1), Some(&Type::Int));
    }
}
