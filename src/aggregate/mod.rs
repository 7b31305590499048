use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayView, AsArray, Dimension};
use serde::Deserialize;
use tracing::debug;

use crate::{Batch, MetricError, NanStrategy};

pub use basic::{MeanMetric, SumMetric};
pub use cat::CatMetric;
pub use minmax::{MaxMetric, MinMetric};
pub use streaming::{AggregatorConfig, StreamingAggregator};

mod basic;
mod cat;
mod minmax;
mod streaming;

/// A stateful aggregation over a stream of numeric batches.
///
/// Batches pass through the aggregator's [NanStrategy] before they reach [Aggregator::accumulate],
/// so a rejected batch never mutates state.
pub trait Aggregator: Clone {
    type Output;

    fn nan_strategy(&self) -> NanStrategy;

    /// Fold a batch cleaned by this aggregator's [NanStrategy] into the running state.
    ///
    /// Only the crate can build a [Batch], so the provided update methods are the sole way in.
    fn accumulate(&mut self, batch: &Batch);

    fn compute(&self) -> Self::Output;

    fn reset(&mut self);

    /// Combine the state of an aggregator that consumed a disjoint partition of the same stream.
    fn merge(&mut self, other: &Self);

    fn update<'a, V, D>(&mut self, values: V) -> Result<(), MetricError>
    where
        V: AsArray<'a, f64, D>,
        D: Dimension,
    {
        let values: ArrayView<'a, f64, D> = values.into();
        let batch = self.nan_strategy().clean_values(values.iter().copied())?;

        self.accumulate(&batch);

        Ok(())
    }

    /// Update the running state and return the aggregate of this batch alone.
    fn forward<'a, V, D>(&mut self, values: V) -> Result<Self::Output, MetricError>
    where
        V: AsArray<'a, f64, D>,
        D: Dimension,
    {
        let mut local = self.clone();

        local.reset();
        local.update(values)?;
        self.merge(&local);

        Ok(local.compute())
    }
}

/// An update signature that takes weights alongside values.
pub trait WeightedUpdate {
    fn update_weighted<'a, 'b, V, W, D, E>(&mut self, values: V, weights: W) -> Result<(), MetricError>
    where
        V: AsArray<'a, f64, D>,
        W: AsArray<'b, f64, E>,
        D: Dimension,
        E: Dimension;
}

/// Gives any [Aggregator] the [WeightedUpdate] signature by dropping the weights.
///
/// ## Example
/// ```rust
/// use ndarray::array;
/// use tally::aggregate::{Aggregator, DiscardWeights, SumMetric, WeightedUpdate};
/// use tally::NanStrategy;
///
/// let mut sum = DiscardWeights::new(SumMetric::new(NanStrategy::Error));
///
/// sum.update_weighted(&array![1.0, 2.0, 3.0], &array![0.0, 0.0, 0.0]).unwrap();
///
/// assert_eq!(sum.compute(), 6.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DiscardWeights<A> {
    inner: A,
}

impl<A> DiscardWeights<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A> WeightedUpdate for DiscardWeights<A>
where
    A: Aggregator,
{
    fn update_weighted<'a, 'b, V, W, D, E>(&mut self, values: V, _weights: W) -> Result<(), MetricError>
    where
        V: AsArray<'a, f64, D>,
        W: AsArray<'b, f64, E>,
        D: Dimension,
        E: Dimension,
    {
        self.inner.update(values)
    }
}

impl<A> Aggregator for DiscardWeights<A>
where
    A: Aggregator,
{
    type Output = A::Output;

    fn nan_strategy(&self) -> NanStrategy {
        self.inner.nan_strategy()
    }

    fn accumulate(&mut self, batch: &Batch) {
        self.inner.accumulate(batch);
    }

    fn compute(&self) -> Self::Output {
        self.inner.compute()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn merge(&mut self, other: &Self) {
        self.inner.merge(&other.inner);
    }
}

/// Merge shards in iteration order, e.g. one aggregator per worker after a join.
///
/// Returns [None] when there are no shards.
pub fn merge_all<A, I>(shards: I) -> Option<A>
where
    A: Aggregator,
    I: IntoIterator<Item = A>,
{
    let mut shards = shards.into_iter();
    let mut merged = shards.next()?;
    let mut count = 1;

    for shard in shards {
        merged.merge(&shard);
        count += 1;
    }

    debug!(shards = count, "merged aggregator shards");

    Some(merged)
}

/// Broadcast `weights` to the shape of `values` and clean the pairs.
pub(crate) fn weighted_batch<'a, 'b, D, E>(
    nan_strategy: NanStrategy,
    values: ArrayView<'a, f64, D>,
    weights: ArrayView<'b, f64, E>,
) -> Result<Batch, MetricError>
where
    D: Dimension,
    E: Dimension,
{
    let broadcast = weights.broadcast(values.raw_dim()).ok_or_else(|| {
        MetricError::dimension_mismatch(
            format!("weights broadcastable to {:?}", values.shape()),
            format!("{:?}", weights.shape()),
        )
    })?;

    nan_strategy.clean(values.iter().copied(), broadcast.iter().copied())
}

/// The reduction an aggregator performs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Min,
    Max,
    Sum,
    Mean,
    Cat,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Cat => "cat",
        };

        f.write_str(name)
    }
}

impl FromStr for Aggregation {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "sum" => Ok(Aggregation::Sum),
            "mean" => Ok(Aggregation::Mean),
            "cat" => Ok(Aggregation::Cat),
            other => Err(MetricError::InvalidArgument(format!(
                "unknown aggregation `{other}`, expected one of min, max, sum, mean, cat"
            ))),
        }
    }
}
