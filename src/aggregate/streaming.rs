use ndarray::{AsArray, Dimension};
use serde::Deserialize;

use crate::aggregate::{
    Aggregation, Aggregator, CatMetric, MaxMetric, MeanMetric, MinMetric, SumMetric, WeightedUpdate,
};
use crate::{MetricError, MetricValue, NanStrategy};

/// Settings for a [StreamingAggregator], loadable from any serde format.
///
/// ## Example
/// ```rust
/// use tally::aggregate::{Aggregation, AggregatorConfig};
/// use tally::NanStrategy;
///
/// let config: AggregatorConfig = serde_json::from_str(r#"{"kind": "mean", "nan_strategy": 0.0}"#).unwrap();
///
/// assert_eq!(config.kind, Aggregation::Mean);
/// assert_eq!(config.nan_strategy, NanStrategy::Replace(0.0));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregatorConfig {
    pub kind: Aggregation,
    #[serde(default)]
    pub nan_strategy: NanStrategy,
}

/// An aggregator whose kind is chosen at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamingAggregator {
    Min(MinMetric),
    Max(MaxMetric),
    Sum(SumMetric),
    Mean(MeanMetric),
    Cat(CatMetric),
}

impl StreamingAggregator {
    pub fn new(kind: Aggregation, nan_strategy: NanStrategy) -> Self {
        match kind {
            Aggregation::Min => Self::Min(MinMetric::new(nan_strategy)),
            Aggregation::Max => Self::Max(MaxMetric::new(nan_strategy)),
            Aggregation::Sum => Self::Sum(SumMetric::new(nan_strategy)),
            Aggregation::Mean => Self::Mean(MeanMetric::new(nan_strategy)),
            Aggregation::Cat => Self::Cat(CatMetric::new(nan_strategy)),
        }
    }

    pub fn from_config(config: &AggregatorConfig) -> Self {
        Self::new(config.kind, config.nan_strategy)
    }

    pub fn kind(&self) -> Aggregation {
        match self {
            Self::Min(_) => Aggregation::Min,
            Self::Max(_) => Aggregation::Max,
            Self::Sum(_) => Aggregation::Sum,
            Self::Mean(_) => Aggregation::Mean,
            Self::Cat(_) => Aggregation::Cat,
        }
    }

    pub fn nan_strategy(&self) -> NanStrategy {
        match self {
            Self::Min(inner) => inner.nan_strategy(),
            Self::Max(inner) => inner.nan_strategy(),
            Self::Sum(inner) => inner.nan_strategy(),
            Self::Mean(inner) => inner.nan_strategy(),
            Self::Cat(inner) => inner.nan_strategy(),
        }
    }

    pub fn update<'a, V, D>(&mut self, values: V) -> Result<(), MetricError>
    where
        V: AsArray<'a, f64, D>,
        D: Dimension,
    {
        match self {
            Self::Min(inner) => inner.update(values),
            Self::Max(inner) => inner.update(values),
            Self::Sum(inner) => inner.update(values),
            Self::Mean(inner) => inner.update(values),
            Self::Cat(inner) => inner.update(values),
        }
    }

    /// Only the mean uses the weights; every other kind drops them.
    pub fn update_weighted<'a, 'b, V, W, D, E>(&mut self, values: V, weights: W) -> Result<(), MetricError>
    where
        V: AsArray<'a, f64, D>,
        W: AsArray<'b, f64, E>,
        D: Dimension,
        E: Dimension,
    {
        match self {
            Self::Mean(inner) => inner.update_weighted(values, weights),
            _ => self.update(values),
        }
    }

    /// Update the running state and return the aggregate of this batch alone.
    pub fn forward<'a, V, D>(&mut self, values: V) -> Result<MetricValue, MetricError>
    where
        V: AsArray<'a, f64, D>,
        D: Dimension,
    {
        Ok(match self {
            Self::Min(inner) => inner.forward(values)?.into(),
            Self::Max(inner) => inner.forward(values)?.into(),
            Self::Sum(inner) => inner.forward(values)?.into(),
            Self::Mean(inner) => inner.forward(values)?.into(),
            Self::Cat(inner) => inner.forward(values)?.into(),
        })
    }

    /// Weighted [StreamingAggregator::forward]; as with updates, only the mean uses the weights.
    pub fn forward_weighted<'a, 'b, V, W, D, E>(&mut self, values: V, weights: W) -> Result<MetricValue, MetricError>
    where
        V: AsArray<'a, f64, D>,
        W: AsArray<'b, f64, E>,
        D: Dimension,
        E: Dimension,
    {
        match self {
            Self::Mean(inner) => Ok(inner.forward_weighted(values, weights)?.into()),
            _ => self.forward(values),
        }
    }

    pub fn compute(&self) -> MetricValue {
        match self {
            Self::Min(inner) => inner.compute().into(),
            Self::Max(inner) => inner.compute().into(),
            Self::Sum(inner) => inner.compute().into(),
            Self::Mean(inner) => inner.compute().into(),
            Self::Cat(inner) => inner.compute().into(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Min(inner) => inner.reset(),
            Self::Max(inner) => inner.reset(),
            Self::Sum(inner) => inner.reset(),
            Self::Mean(inner) => inner.reset(),
            Self::Cat(inner) => inner.reset(),
        }
    }

    /// Combine with a shard of the same kind; shards of another kind are rejected.
    pub fn merge(&mut self, other: &Self) -> Result<(), MetricError> {
        match (self, other) {
            (Self::Min(left), Self::Min(right)) => left.merge(right),
            (Self::Max(left), Self::Max(right)) => left.merge(right),
            (Self::Sum(left), Self::Sum(right)) => left.merge(right),
            (Self::Mean(left), Self::Mean(right)) => left.merge(right),
            (Self::Cat(left), Self::Cat(right)) => left.merge(right),
            (left, right) => {
                return Err(MetricError::InvalidArgument(format!(
                    "cannot merge a `{}` aggregator into a `{}` aggregator",
                    right.kind(),
                    left.kind()
                )))
            }
        }

        Ok(())
    }
}
