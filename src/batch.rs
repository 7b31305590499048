use crate::MetricError;

/// A batch of values with their paired weights, after the NaN policy has been applied.
///
/// Values appear in the logical (row-major) order of the array they were read from. Batches are
/// only produced by an aggregator's own [NanStrategy](crate::NanStrategy), so every batch that
/// reaches [Aggregator::accumulate](crate::Aggregator::accumulate) has already been cleaned.
///
/// ```compile_fail
/// use tally::Batch;
///
/// let batch = Batch::unweighted(vec![1.0, f64::NAN]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    values: Vec<f64>,
    weights: Vec<f64>,
}

impl Batch {
    pub(crate) fn try_new(values: Vec<f64>, weights: Vec<f64>) -> Result<Self, MetricError> {
        if values.len() != weights.len() {
            return Err(MetricError::dimension_mismatch(
                format!("{} weights", values.len()),
                format!("{} weights", weights.len()),
            ));
        }

        Ok(Self { values, weights })
    }

    /// A batch where every value carries a weight of one.
    pub(crate) fn unweighted(values: Vec<f64>) -> Self {
        let weights = vec![1.0; values.len()];

        Self { values, weights }
    }

    pub(crate) fn has_nan(&self) -> bool {
        self.pairs().any(|(v, w)| v.is_nan() || w.is_nan())
    }

    /// Keep the pairs matching `keep`, preserving their order.
    pub(crate) fn filter(self, keep: impl Fn(f64, f64) -> bool) -> Self {
        self.map_filter(|v, w| keep(v, w).then_some((v, w)))
    }

    /// Rewrite every pair in place of the original.
    pub(crate) fn map(self, f: impl Fn(f64, f64) -> (f64, f64)) -> Self {
        self.map_filter(|v, w| Some(f(v, w)))
    }

    fn map_filter(self, f: impl Fn(f64, f64) -> Option<(f64, f64)>) -> Self {
        let (values, weights) = self
            .values
            .into_iter()
            .zip(self.weights)
            .filter_map(|(v, w)| f(v, w))
            .unzip();

        Self { values, weights }
    }

    fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn weighted_sum(&self) -> f64 {
        self.pairs().map(|(v, w)| v * w).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }
}
