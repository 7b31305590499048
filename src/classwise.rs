use std::marker::PhantomData;

use indexmap::IndexMap;

use crate::metric::{metric_name, ClassCount, Metric};
use crate::MetricError;

/// Relabels the per-class output of a metric as a mapping from `"<metric>_<label>"` to value.
///
/// Without labels each class is named by its index.
///
/// ## Example
/// ```rust
/// use ndarray::array;
/// use tally::classification::{MulticlassAccuracy, Predictions};
/// use tally::{ClasswiseWrapper, Metric};
///
/// let accuracy = MulticlassAccuracy::new(2).unwrap();
/// let mut metric = ClasswiseWrapper::with_labels(accuracy, ["cat", "dog"]).unwrap();
///
/// metric.update(&Predictions::new(array![[0.9, 0.1], [0.6, 0.4]], array![0, 1]).unwrap()).unwrap();
///
/// let value = metric.compute().unwrap();
///
/// assert_eq!(value["multiclassaccuracy_cat"], 1.0);
/// assert_eq!(value["multiclassaccuracy_dog"], 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ClasswiseWrapper<M, I: ?Sized> {
    metric: M,
    keys: Vec<String>,
    _input: PhantomData<fn(&I)>,
}

impl<M, I> ClasswiseWrapper<M, I>
where
    M: Metric<I, Output = Vec<f64>> + ClassCount,
    I: ?Sized,
{
    pub fn new(metric: M) -> Self {
        let name = metric_name::<M>();
        let keys = (0..metric.num_classes()).map(|class| format!("{name}_{class}")).collect();

        Self {
            metric,
            keys,
            _input: PhantomData,
        }
    }

    /// Name each class with the label at its index; there must be exactly one label per class.
    pub fn with_labels<L, S>(metric: M, labels: L) -> Result<Self, MetricError>
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.len() != metric.num_classes() {
            return Err(MetricError::InvalidArgument(format!(
                "Expected argument `labels` to either be `None` or a list of strings with one label per class, \
                 but got {} labels for {} classes",
                labels.len(),
                metric.num_classes()
            )));
        }

        let name = metric_name::<M>();
        let keys = labels.iter().map(|label| format!("{name}_{label}")).collect();

        Ok(Self {
            metric,
            keys,
            _input: PhantomData,
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn inner(&self) -> &M {
        &self.metric
    }

    pub fn into_inner(self) -> M {
        self.metric
    }

    fn label(&self, values: Vec<f64>) -> Result<IndexMap<String, f64>, MetricError> {
        if values.len() != self.keys.len() {
            return Err(MetricError::dimension_mismatch(
                format!("{} per-class values", self.keys.len()),
                format!("{} per-class values", values.len()),
            ));
        }

        Ok(self.keys.iter().cloned().zip(values).collect())
    }
}

impl<M, I> Metric<I> for ClasswiseWrapper<M, I>
where
    M: Metric<I, Output = Vec<f64>> + ClassCount,
    I: ?Sized,
{
    type Output = IndexMap<String, f64>;

    fn update(&mut self, input: &I) -> Result<(), MetricError> {
        self.metric.update(input)
    }

    fn compute(&self) -> Result<Self::Output, MetricError> {
        self.label(self.metric.compute()?)
    }

    fn reset(&mut self) {
        self.metric.reset();
    }
}
