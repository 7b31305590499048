use std::fmt;
use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::Deserialize;
use tracing::warn;

use crate::{Batch, MetricError};

pub(crate) const NAN_ENCOUNTERED: &str = "Encountered `nan` values in tensor";

/// How an aggregator treats `nan` values found in an input batch.
///
/// The strategy is fixed when the aggregator is built and applies to every update.
/// A `nan` in either a value or its paired weight counts as detected.
///
/// ## Example
/// ```rust
/// use tally::NanStrategy;
///
/// assert_eq!("ignore".parse::<NanStrategy>().unwrap(), NanStrategy::Ignore);
/// assert_eq!(NanStrategy::try_from(2.0).unwrap(), NanStrategy::Replace(2.0));
/// assert!("drop".parse::<NanStrategy>().is_err());
/// assert!(NanStrategy::try_from(f64::INFINITY).is_err());
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RawNanStrategy")]
pub enum NanStrategy {
    /// Reject the batch with [MetricError::InvalidState].
    Error,
    /// Log a warning, then drop the `nan` entries.
    #[default]
    Warn,
    /// Silently drop the `nan` entries.
    Ignore,
    /// Substitute every `nan` with the given value.
    Replace(f64),
}

impl NanStrategy {
    /// Apply the strategy to paired values and weights, producing the batch to aggregate.
    ///
    /// Nothing is returned under [NanStrategy::Error] when a `nan` is present, so callers
    /// that only mutate state from the returned batch never partially apply an update.
    /// Values and weights of different lengths are rejected with [MetricError::DimensionMismatch].
    pub(crate) fn clean<V, W>(&self, values: V, weights: W) -> Result<Batch, MetricError>
    where
        V: IntoIterator<Item = f64>,
        W: IntoIterator<Item = f64>,
    {
        let batch = Batch::try_new(values.into_iter().collect(), weights.into_iter().collect())?;

        self.apply(batch)
    }

    /// Apply the strategy to values that all carry a weight of one.
    pub(crate) fn clean_values<V>(&self, values: V) -> Result<Batch, MetricError>
    where
        V: IntoIterator<Item = f64>,
    {
        self.apply(Batch::unweighted(values.into_iter().collect()))
    }

    fn apply(&self, batch: Batch) -> Result<Batch, MetricError> {
        if !batch.has_nan() {
            return Ok(batch);
        }

        match *self {
            NanStrategy::Error => Err(MetricError::InvalidState(NAN_ENCOUNTERED.to_string())),
            NanStrategy::Warn => {
                warn!("{NAN_ENCOUNTERED}. Will be removed.");
                Ok(batch.filter(no_nan))
            }
            NanStrategy::Ignore => Ok(batch.filter(no_nan)),
            NanStrategy::Replace(replacement) => {
                Ok(batch.map(|v, w| (replace_nan(v, replacement), replace_nan(w, replacement))))
            }
        }
    }
}

fn no_nan(value: f64, weight: f64) -> bool {
    !value.is_nan() && !weight.is_nan()
}

fn replace_nan(value: f64, replacement: f64) -> f64 {
    if value.is_nan() {
        replacement
    } else {
        value
    }
}

fn invalid(got: impl fmt::Debug) -> MetricError {
    MetricError::InvalidArgument(format!(
        "Arg `nan_strategy` should either be a float or one of ['error', 'warn', 'ignore'] but got {got:?}"
    ))
}

impl fmt::Display for NanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NanStrategy::Error => f.write_str("error"),
            NanStrategy::Warn => f.write_str("warn"),
            NanStrategy::Ignore => f.write_str("ignore"),
            NanStrategy::Replace(value) => write!(f, "{value}"),
        }
    }
}

impl FromStr for NanStrategy {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(NanStrategy::Error),
            "warn" => Ok(NanStrategy::Warn),
            "ignore" => Ok(NanStrategy::Ignore),
            other => Err(invalid(other)),
        }
    }
}

impl TryFrom<&str> for NanStrategy {
    type Error = MetricError;

    fn try_from(value: &str) -> Result<Self, MetricError> {
        value.parse()
    }
}

impl TryFrom<f64> for NanStrategy {
    type Error = MetricError;

    fn try_from(value: f64) -> Result<Self, MetricError> {
        if value.is_finite() {
            Ok(NanStrategy::Replace(value))
        } else {
            Err(invalid(value))
        }
    }
}

/// Configuration shape accepted for a [NanStrategy]: a policy name, a number, or anything else (rejected).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNanStrategy {
    Name(String),
    Value(f64),
    Other(IgnoredAny),
}

impl TryFrom<RawNanStrategy> for NanStrategy {
    type Error = MetricError;

    fn try_from(raw: RawNanStrategy) -> Result<Self, MetricError> {
        match raw {
            RawNanStrategy::Name(name) => name.parse(),
            RawNanStrategy::Value(value) => value.try_into(),
            RawNanStrategy::Other(_) => Err(invalid("a value that is neither a string nor a number")),
        }
    }
}
