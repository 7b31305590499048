use indexmap::IndexMap;

use crate::MetricError;

/// A stateful metric fed with inputs of type `I`.
pub trait Metric<I: ?Sized> {
    type Output;

    fn update(&mut self, input: &I) -> Result<(), MetricError>;

    fn compute(&self) -> Result<Self::Output, MetricError>;

    fn reset(&mut self);

    /// Update the running state and return the value computed on this input alone.
    fn forward(&mut self, input: &I) -> Result<Self::Output, MetricError>
    where
        Self: Clone,
    {
        let mut local = self.clone();

        local.reset();
        local.update(input)?;
        self.update(input)?;

        local.compute()
    }
}

/// A metric producing one value per class.
pub trait ClassCount {
    fn num_classes(&self) -> usize;
}

/// The output of a metric in a shape-agnostic form.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    Sequence(Vec<f64>),
    Mapping(IndexMap<String, f64>),
}

impl MetricValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[f64]> {
        match self {
            MetricValue::Sequence(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, f64>> {
        match self {
            MetricValue::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Scalar(value)
    }
}

impl From<Vec<f64>> for MetricValue {
    fn from(values: Vec<f64>) -> Self {
        MetricValue::Sequence(values)
    }
}

impl From<IndexMap<String, f64>> for MetricValue {
    fn from(mapping: IndexMap<String, f64>) -> Self {
        MetricValue::Mapping(mapping)
    }
}

/// The lowercased name of a metric type, e.g. `multiclassaccuracy` for `MulticlassAccuracy`.
///
/// Module paths and generic arguments are stripped.
pub fn metric_name<M: ?Sized>() -> String {
    let full = std::any::type_name::<M>();
    let base = full.split('<').next().unwrap_or(full);
    let name = base.rsplit("::").next().unwrap_or(base);

    name.to_lowercase()
}
