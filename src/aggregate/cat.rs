use crate::aggregate::Aggregator;
use crate::{Batch, NanStrategy};

/// Concatenates every value seen, in the order it arrived.
///
/// Merging appends the other aggregator's values after this one's, so shards must be
/// merged in partition order to reproduce the unpartitioned stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CatMetric {
    nan_strategy: NanStrategy,
    values: Vec<f64>,
}

impl CatMetric {
    pub fn new(nan_strategy: NanStrategy) -> Self {
        Self {
            nan_strategy,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for CatMetric {
    fn default() -> Self {
        Self::new(NanStrategy::default())
    }
}

impl Aggregator for CatMetric {
    type Output = Vec<f64>;

    fn nan_strategy(&self) -> NanStrategy {
        self.nan_strategy
    }

    fn accumulate(&mut self, batch: &Batch) {
        self.values.extend_from_slice(batch.values());
    }

    fn compute(&self) -> Vec<f64> {
        self.values.clone()
    }

    fn reset(&mut self) {
        self.values.clear();
    }

    fn merge(&mut self, other: &Self) {
        self.values.extend_from_slice(&other.values);
    }
}
