use super::int_histogram::IntHistogram;
use crate::tuple::CmpOp;

/// Histogram over a string column, implemented by hashing each string to an
/// integer and delegating to an [`IntHistogram`].
///
/// The hash packs the first four bytes big-endian, so it is stable across
/// runs. Only equality-shaped operators produce meaningful estimates;
/// ordering operators degrade to 1.
#[derive(Debug, Clone)]
pub struct StringHistogram {
    inner: IntHistogram,
}

const MIN_HASH: i32 = 0;
const MAX_HASH: i32 = i32::MAX;

fn hash_string(s: &str) -> i32 {
    let mut prefix = [0u8; 4];
    for (i, b) in s.bytes().take(4).enumerate() {
        prefix[i] = b;
    }
    (u32::from_be_bytes(prefix) >> 1) as i32
}

impl StringHistogram {
    pub fn new(buckets: usize) -> Self {
        Self {
            inner: IntHistogram::new(buckets, MIN_HASH, MAX_HASH),
        }
    }

    pub fn total_count(&self) -> u64 {
        self.inner.total_count()
    }

    pub fn add_value(&mut self, s: &str) {
        self.inner.add_value(hash_string(s));
    }

    pub fn estimate_selectivity(&self, op: CmpOp, s: &str) -> f64 {
        match op {
            CmpOp::Equals | CmpOp::Like => {
                self.inner.estimate_selectivity(CmpOp::Equals, hash_string(s))
            }
            CmpOp::NotEquals => self.inner.estimate_selectivity(CmpOp::NotEquals, hash_string(s)),
            _ => 1.0,
        }
    }

    pub fn avg_selectivity(&self) -> f64 {
        self.inner.avg_selectivity()
    }
}
