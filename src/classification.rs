use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::metric::{ClassCount, Metric};
use crate::MetricError;

/// Per-sample class scores paired with the true class of each sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    preds: Array2<f64>,
    target: Array1<usize>,
}

impl Predictions {
    /// `preds` holds one row of scores per sample and one column per class.
    pub fn new(preds: Array2<f64>, target: Array1<usize>) -> Result<Self, MetricError> {
        if preds.nrows() != target.len() {
            return Err(MetricError::dimension_mismatch(
                format!("{} targets", preds.nrows()),
                format!("{} targets", target.len()),
            ));
        }

        Ok(Self { preds, target })
    }

    pub fn preds(&self) -> ArrayView2<'_, f64> {
        self.preds.view()
    }

    pub fn target(&self) -> ArrayView1<'_, usize> {
        self.target.view()
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// The highest scoring class of each sample; ties go to the lowest class index.
    pub fn predicted_classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.preds.rows().into_iter().map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(best, best_score), (class, &score)| {
                    if score > best_score {
                        (class, score)
                    } else {
                        (best, best_score)
                    }
                })
                .0
        })
    }
}

/// True positive, false positive and false negative counts for each class.
#[derive(Debug, Clone, PartialEq)]
pub struct StatScores {
    tp: Vec<u64>,
    fp: Vec<u64>,
    fn_: Vec<u64>,
}

impl StatScores {
    pub fn new(num_classes: usize) -> Result<Self, MetricError> {
        if num_classes == 0 {
            return Err(MetricError::InvalidArgument(
                "Expected argument `num_classes` to be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            tp: vec![0; num_classes],
            fp: vec![0; num_classes],
            fn_: vec![0; num_classes],
        })
    }

    pub fn num_classes(&self) -> usize {
        self.tp.len()
    }

    pub fn update(&mut self, predictions: &Predictions) -> Result<(), MetricError> {
        let num_classes = self.num_classes();

        if predictions.preds.ncols() != num_classes {
            return Err(MetricError::dimension_mismatch(
                format!("{num_classes} score columns"),
                format!("{} score columns", predictions.preds.ncols()),
            ));
        }

        if let Some(class) = predictions.target.iter().find(|&&class| class >= num_classes) {
            return Err(MetricError::InvalidArgument(format!(
                "Detected target class {class} outside of the {num_classes} classes"
            )));
        }

        for (predicted, &actual) in predictions.predicted_classes().zip(predictions.target.iter()) {
            if predicted == actual {
                self.tp[actual] += 1;
            } else {
                self.fp[predicted] += 1;
                self.fn_[actual] += 1;
            }
        }

        Ok(())
    }

    pub fn reset(&mut self) {
        self.tp.fill(0);
        self.fp.fill(0);
        self.fn_.fill(0);
    }

    /// `tp / (tp + fn)` per class.
    pub fn recall(&self) -> Vec<f64> {
        self.tp.iter().zip(&self.fn_).map(|(&tp, &fn_)| ratio(tp, tp + fn_)).collect()
    }

    /// `tp / (tp + fp)` per class.
    pub fn precision(&self) -> Vec<f64> {
        self.tp.iter().zip(&self.fp).map(|(&tp, &fp)| ratio(tp, tp + fp)).collect()
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Fraction of samples of each class that were classified correctly.
#[derive(Debug, Clone, PartialEq)]
pub struct MulticlassAccuracy {
    stats: StatScores,
}

impl MulticlassAccuracy {
    pub fn new(num_classes: usize) -> Result<Self, MetricError> {
        Ok(Self {
            stats: StatScores::new(num_classes)?,
        })
    }
}

impl ClassCount for MulticlassAccuracy {
    fn num_classes(&self) -> usize {
        self.stats.num_classes()
    }
}

impl Metric<Predictions> for MulticlassAccuracy {
    type Output = Vec<f64>;

    fn update(&mut self, input: &Predictions) -> Result<(), MetricError> {
        self.stats.update(input)
    }

    fn compute(&self) -> Result<Vec<f64>, MetricError> {
        Ok(self.stats.recall())
    }

    fn reset(&mut self) {
        self.stats.reset();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MulticlassRecall {
    stats: StatScores,
}

impl MulticlassRecall {
    pub fn new(num_classes: usize) -> Result<Self, MetricError> {
        Ok(Self {
            stats: StatScores::new(num_classes)?,
        })
    }
}

impl ClassCount for MulticlassRecall {
    fn num_classes(&self) -> usize {
        self.stats.num_classes()
    }
}

impl Metric<Predictions> for MulticlassRecall {
    type Output = Vec<f64>;

    fn update(&mut self, input: &Predictions) -> Result<(), MetricError> {
        self.stats.update(input)
    }

    fn compute(&self) -> Result<Vec<f64>, MetricError> {
        Ok(self.stats.recall())
    }

    fn reset(&mut self) {
        self.stats.reset();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MulticlassPrecision {
    stats: StatScores,
}

impl MulticlassPrecision {
    pub fn new(num_classes: usize) -> Result<Self, MetricError> {
        Ok(Self {
            stats: StatScores::new(num_classes)?,
        })
    }
}

impl ClassCount for MulticlassPrecision {
    fn num_classes(&self) -> usize {
        self.stats.num_classes()
    }
}

impl Metric<Predictions> for MulticlassPrecision {
    type Output = Vec<f64>;

    fn update(&mut self, input: &Predictions) -> Result<(), MetricError> {
        self.stats.update(input)
    }

    fn compute(&self) -> Result<Vec<f64>, MetricError> {
        Ok(self.stats.precision())
    }

    fn reset(&mut self) {
        self.stats.reset();
    }
}
