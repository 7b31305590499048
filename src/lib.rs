//! Streaming aggregation metrics with a configurable policy for `nan` inputs.
//!
//! Aggregators ([aggregate::MinMetric], [aggregate::MaxMetric], [aggregate::SumMetric],
//! [aggregate::MeanMetric], [aggregate::CatMetric]) fold batches of any shape into a running
//! value. Each worker of a data-parallel job owns its own aggregator; the shards are combined
//! afterwards with [aggregate::Aggregator::merge] or [aggregate::merge_all].
//!
//! [ClasswiseWrapper] turns the per-class output of a metric into a labeled mapping, and
//! [MetricCollection] merges the outputs of several named metrics into one.

pub use aggregate::{Aggregation, Aggregator, StreamingAggregator};
pub use batch::Batch;
pub use classwise::ClasswiseWrapper;
pub use collection::MetricCollection;
pub use error::MetricError;
pub use metric::{metric_name, ClassCount, Metric, MetricValue};
pub use nan::NanStrategy;

pub mod aggregate;
pub mod classification;
mod batch;
mod classwise;
mod collection;
mod error;
mod metric;
mod nan;
