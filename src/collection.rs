use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::debug;

use crate::metric::{Metric, MetricValue};
use crate::MetricError;

/// Object-safe view of any [Metric] whose output converts into a [MetricValue].
trait ErasedMetric<I: ?Sized> {
    fn erased_update(&mut self, input: &I) -> Result<(), MetricError>;

    fn erased_compute(&self) -> Result<MetricValue, MetricError>;

    fn erased_reset(&mut self);
}

impl<I, M> ErasedMetric<I> for M
where
    I: ?Sized,
    M: Metric<I>,
    M::Output: Into<MetricValue>,
{
    fn erased_update(&mut self, input: &I) -> Result<(), MetricError> {
        self.update(input)
    }

    fn erased_compute(&self) -> Result<MetricValue, MetricError> {
        self.compute().map(Into::into)
    }

    fn erased_reset(&mut self) {
        self.reset();
    }
}

/// Named metrics that share one input, with their outputs merged into a single mapping.
///
/// Mapping outputs are flattened key by key; any other output is keyed by the metric's name.
/// The prefix and postfix are applied to every emitted key.
pub struct MetricCollection<I: ?Sized> {
    metrics: IndexMap<String, Box<dyn ErasedMetric<I>>>,
    prefix: String,
    postfix: String,
}

impl<I: ?Sized> MetricCollection<I> {
    pub fn new() -> Self {
        Self {
            metrics: IndexMap::new(),
            prefix: String::new(),
            postfix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.postfix = postfix.into();
        self
    }

    /// Add a metric under `name`, which must not already be taken.
    pub fn insert<M>(&mut self, name: impl Into<String>, metric: M) -> Result<(), MetricError>
    where
        M: Metric<I> + 'static,
        M::Output: Into<MetricValue>,
    {
        match self.metrics.entry(name.into()) {
            Entry::Occupied(entry) => Err(MetricError::InvalidArgument(format!(
                "a metric named `{}` is already in the collection",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                entry.insert(Box::new(metric));
                Ok(())
            }
        }
    }

    pub fn with_metric<M>(mut self, name: impl Into<String>, metric: M) -> Result<Self, MetricError>
    where
        M: Metric<I> + 'static,
        M::Output: Into<MetricValue>,
    {
        self.insert(name, metric)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    fn key(&self, base: &str) -> String {
        format!("{}{base}{}", self.prefix, self.postfix)
    }
}

impl<I: ?Sized> Default for MetricCollection<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized> Metric<I> for MetricCollection<I> {
    type Output = IndexMap<String, MetricValue>;

    fn update(&mut self, input: &I) -> Result<(), MetricError> {
        for metric in self.metrics.values_mut() {
            metric.erased_update(input)?;
        }

        Ok(())
    }

    fn compute(&self) -> Result<Self::Output, MetricError> {
        let mut output = IndexMap::new();

        for (name, metric) in &self.metrics {
            let entries = match metric.erased_compute()? {
                MetricValue::Mapping(mapping) => mapping
                    .into_iter()
                    .map(|(key, value)| (self.key(&key), MetricValue::Scalar(value)))
                    .collect(),
                value => vec![(self.key(name), value)],
            };

            for (key, value) in entries {
                if output.contains_key(&key) {
                    return Err(MetricError::InvalidArgument(format!(
                        "metric `{name}` emits the key `{key}`, which another metric already produced"
                    )));
                }

                output.insert(key, value);
            }
        }

        debug!(metrics = self.metrics.len(), keys = output.len(), "computed metric collection");

        Ok(output)
    }

    fn reset(&mut self) {
        for metric in self.metrics.values_mut() {
            metric.erased_reset();
        }
    }
}
