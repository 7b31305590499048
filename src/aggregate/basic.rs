use ndarray::{ArrayView, AsArray, Dimension};

use crate::aggregate::{weighted_batch, Aggregator, WeightedUpdate};
use crate::{Batch, MetricError, NanStrategy};

/// The running total of every value seen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SumMetric {
    nan_strategy: NanStrategy,
    sum: f64,
}

impl SumMetric {
    pub fn new(nan_strategy: NanStrategy) -> Self {
        Self {
            nan_strategy,
            sum: 0.0,
        }
    }
}

impl Default for SumMetric {
    fn default() -> Self {
        Self::new(NanStrategy::default())
    }
}

impl Aggregator for SumMetric {
    type Output = f64;

    fn nan_strategy(&self) -> NanStrategy {
        self.nan_strategy
    }

    fn accumulate(&mut self, batch: &Batch) {
        self.sum += batch.sum();
    }

    fn compute(&self) -> f64 {
        self.sum
    }

    fn reset(&mut self) {
        self.sum = 0.0;
    }

    fn merge(&mut self, other: &Self) {
        self.sum += other.sum;
    }
}

/// A weighted average over the stream.
///
/// Each value contributes in proportion to its weight, so the aggregate is
/// `sum(value * weight) / sum(weight)`. Without any weight the average is `nan`.
///
/// ## Example
/// ```rust
/// use ndarray::{arr0, array, Array};
/// use tally::aggregate::{Aggregator, MeanMetric};
/// use tally::NanStrategy;
///
/// let values = Array::range(0.0, 24.0, 1.0).into_shape_with_order((2, 3, 4)).unwrap();
/// let weights = array![1.0, 2.0].into_shape_with_order((2, 1, 1)).unwrap();
///
/// let mut average = MeanMetric::new(NanStrategy::Warn);
///
/// assert_eq!(average.forward_weighted(&values, &arr0(1.0)).unwrap(), 11.5);
/// assert_eq!(average.forward_weighted(&values, &weights).unwrap(), 13.5);
/// assert!(MeanMetric::default().compute().is_nan());
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeanMetric {
    nan_strategy: NanStrategy,
    weighted_sum: f64,
    total_weight: f64,
}

impl MeanMetric {
    pub fn new(nan_strategy: NanStrategy) -> Self {
        Self {
            nan_strategy,
            weighted_sum: 0.0,
            total_weight: 0.0,
        }
    }

    pub fn weighted_sum(&self) -> f64 {
        self.weighted_sum
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Update the running state with weighted values and return the average of this batch alone.
    pub fn forward_weighted<'a, 'b, V, W, D, E>(&mut self, values: V, weights: W) -> Result<f64, MetricError>
    where
        V: AsArray<'a, f64, D>,
        W: AsArray<'b, f64, E>,
        D: Dimension,
        E: Dimension,
    {
        let mut local = Self::new(self.nan_strategy);

        local.update_weighted(values, weights)?;
        self.merge(&local);

        Ok(local.compute())
    }
}

impl Default for MeanMetric {
    fn default() -> Self {
        Self::new(NanStrategy::default())
    }
}

impl WeightedUpdate for MeanMetric {
    /// Weights broadcast against the shape of the values, e.g. a scalar or a `(n, 1, 1)` column.
    fn update_weighted<'a, 'b, V, W, D, E>(&mut self, values: V, weights: W) -> Result<(), MetricError>
    where
        V: AsArray<'a, f64, D>,
        W: AsArray<'b, f64, E>,
        D: Dimension,
        E: Dimension,
    {
        let values: ArrayView<'a, f64, D> = values.into();
        let weights: ArrayView<'b, f64, E> = weights.into();
        let batch = weighted_batch(self.nan_strategy, values, weights)?;

        self.accumulate(&batch);

        Ok(())
    }
}

impl Aggregator for MeanMetric {
    type Output = f64;

    fn nan_strategy(&self) -> NanStrategy {
        self.nan_strategy
    }

    fn accumulate(&mut self, batch: &Batch) {
        self.weighted_sum += batch.weighted_sum();
        self.total_weight += batch.total_weight();
    }

    fn compute(&self) -> f64 {
        if self.total_weight == 0.0 {
            return f64::NAN;
        }

        self.weighted_sum / self.total_weight
    }

    fn reset(&mut self) {
        self.weighted_sum = 0.0;
        self.total_weight = 0.0;
    }

    fn merge(&mut self, other: &Self) {
        self.weighted_sum += other.weighted_sum;
        self.total_weight += other.total_weight;
    }
}
