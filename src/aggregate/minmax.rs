use crate::aggregate::Aggregator;
use crate::{Batch, NanStrategy};

/// The running minimum over every value seen.
///
/// ## Example
/// ```rust
/// use ndarray::array;
/// use tally::aggregate::{Aggregator, MinMetric};
/// use tally::NanStrategy;
///
/// let mut aggregator = MinMetric::new(NanStrategy::Ignore);
///
/// assert_eq!(aggregator.compute(), f64::INFINITY);
///
/// aggregator.update(&array![[4.0, 8.0], [3.0, f64::NAN]]).unwrap();
/// aggregator.update(&array![6.0, 4.0]).unwrap();
///
/// assert_eq!(aggregator.compute(), 3.0);
///
/// aggregator.reset();
///
/// assert_eq!(aggregator.compute(), f64::INFINITY);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MinMetric {
    nan_strategy: NanStrategy,
    min: f64,
}

impl MinMetric {
    pub fn new(nan_strategy: NanStrategy) -> Self {
        Self {
            nan_strategy,
            min: f64::INFINITY,
        }
    }
}

impl Default for MinMetric {
    fn default() -> Self {
        Self::new(NanStrategy::default())
    }
}

impl Aggregator for MinMetric {
    type Output = f64;

    fn nan_strategy(&self) -> NanStrategy {
        self.nan_strategy
    }

    fn accumulate(&mut self, batch: &Batch) {
        self.min = batch.values().iter().copied().fold(self.min, f64::min);
    }

    fn compute(&self) -> f64 {
        self.min
    }

    fn reset(&mut self) {
        self.min = f64::INFINITY;
    }

    fn merge(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
    }
}

/// The running maximum over every value seen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaxMetric {
    nan_strategy: NanStrategy,
    max: f64,
}

impl MaxMetric {
    pub fn new(nan_strategy: NanStrategy) -> Self {
        Self {
            nan_strategy,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Default for MaxMetric {
    fn default() -> Self {
        Self::new(NanStrategy::default())
    }
}

impl Aggregator for MaxMetric {
    type Output = f64;

    fn nan_strategy(&self) -> NanStrategy {
        self.nan_strategy
    }

    fn accumulate(&mut self, batch: &Batch) {
        self.max = batch.values().iter().copied().fold(self.max, f64::max);
    }

    fn compute(&self) -> f64 {
        self.max
    }

    fn reset(&mut self) {
        self.max = f64::NEG_INFINITY;
    }

    fn merge(&mut self, other: &Self) {
        self.max = self.max.max(other.max);
    }
}
