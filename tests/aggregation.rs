use std::thread;

use approx::assert_relative_eq;
use ndarray::{arr0, array, Array, Array1, ArrayD, IxDyn};
use proptest::prelude::*;
use tally::aggregate::{
    merge_all, Aggregator, CatMetric, DiscardWeights, MaxMetric, MeanMetric, MinMetric, SumMetric, WeightedUpdate,
};
use tally::{Aggregation, MetricError, MetricValue, NanStrategy, StreamingAggregator};
use tracing_test::traced_test;

const NUM_BATCHES: usize = 4;
const BATCH_SIZE: usize = 8;

fn flatten(batches: &[ArrayD<f64>]) -> Vec<f64> {
    batches.iter().flat_map(|batch| batch.iter().copied()).collect()
}

fn reference_mean(values: &[f64], weights: &[f64]) -> f64 {
    let weighted: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    let total: f64 = weights.iter().sum();

    weighted / total
}

/// Feed every batch to one aggregator, and the same batches split at `split` to one shard per
/// thread; the merged shards must agree with the single aggregator.
fn run_sharded<A>(make: impl Fn() -> A + Sync, values: &[ArrayD<f64>], weights: &[ArrayD<f64>], split: usize) -> (A, A)
where
    A: Aggregator + WeightedUpdate + Send,
{
    let mut single = make();

    for (v, w) in values.iter().zip(weights) {
        single.update_weighted(v, w).unwrap();
    }

    let shards = thread::scope(|scope| {
        let handles: Vec<_> = [(0, split), (split, values.len())]
            .into_iter()
            .map(|(start, end)| {
                let make = &make;

                scope.spawn(move || {
                    let mut shard = make();

                    for (v, w) in values[start..end].iter().zip(&weights[start..end]) {
                        shard.update_weighted(v, w).unwrap();
                    }

                    shard
                })
            })
            .collect();

        handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
    });

    (single, merge_all(shards).unwrap())
}

/// Per-batch shapes; every one holds `BATCH_SIZE` cells.
const SHAPES: [&[usize]; 3] = [&[2, BATCH_SIZE / 2], &[BATCH_SIZE / 2, 2], &[2, BATCH_SIZE / 4, 2]];

fn batches(mask_weights: bool) -> impl Strategy<Value = (Vec<ArrayD<f64>>, Vec<ArrayD<f64>>, usize)> {
    let cells = NUM_BATCHES * BATCH_SIZE;

    (
        prop::collection::vec(0.0f64..1.0, cells),
        prop::collection::vec(prop::bool::ANY, cells),
        0..=NUM_BATCHES,
        prop::sample::select(SHAPES.to_vec()),
    )
        .prop_map(move |(values, mask, split, shape)| {
            let weights: Vec<f64> = mask
                .into_iter()
                .enumerate()
                // keep at least one unit weight so the mean stays defined
                .map(|(i, keep)| if !mask_weights || keep || i == 0 { 1.0 } else { 0.0 })
                .collect();
            let to_batches = |flat: Vec<f64>| {
                flat.chunks(BATCH_SIZE)
                    .map(|chunk| ArrayD::from_shape_vec(IxDyn(shape), chunk.to_vec()).unwrap())
                    .collect::<Vec<_>>()
            };

            (to_batches(values), to_batches(weights), split)
        })
}

proptest! {
    #[test]
    fn sum_matches_reference((values, weights, split) in batches(false)) {
        let (single, merged) = run_sharded(|| DiscardWeights::new(SumMetric::new(NanStrategy::Error)), &values, &weights, split);
        let expected: f64 = flatten(&values).iter().sum();

        prop_assert!((single.compute() - expected).abs() < 1e-9);
        prop_assert!((merged.compute() - expected).abs() < 1e-9);
    }

    #[test]
    fn min_max_match_reference((values, weights, split) in batches(false)) {
        let flat = flatten(&values);
        let (min, merged_min) = run_sharded(|| DiscardWeights::new(MinMetric::new(NanStrategy::Error)), &values, &weights, split);
        let (max, merged_max) = run_sharded(|| DiscardWeights::new(MaxMetric::new(NanStrategy::Error)), &values, &weights, split);

        prop_assert_eq!(min.compute(), flat.iter().copied().fold(f64::INFINITY, f64::min));
        prop_assert_eq!(merged_min.compute(), min.compute());
        prop_assert_eq!(max.compute(), flat.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        prop_assert_eq!(merged_max.compute(), max.compute());
    }

    #[test]
    fn mean_matches_reference((values, weights, split) in batches(true)) {
        let (single, merged) = run_sharded(|| MeanMetric::new(NanStrategy::Error), &values, &weights, split);
        let expected = reference_mean(&flatten(&values), &flatten(&weights));

        prop_assert!((single.compute() - expected).abs() < 1e-9);
        prop_assert!((merged.compute() - expected).abs() < 1e-9);
    }

    #[test]
    fn cat_preserves_partition_order((values, weights, split) in batches(false)) {
        let (single, merged) = run_sharded(|| DiscardWeights::new(CatMetric::new(NanStrategy::Error)), &values, &weights, split);

        prop_assert_eq!(single.compute(), flatten(&values));
        prop_assert_eq!(merged.compute(), flatten(&values));
    }

    #[test]
    fn sum_is_partition_invariant(values in prop::collection::vec(-1e3f64..1e3, 0..64), cut in any::<prop::sample::Index>()) {
        let split = cut.index(values.len() + 1);
        let (left, right) = values.split_at(split);

        let mut whole = SumMetric::new(NanStrategy::Error);
        let mut first = SumMetric::new(NanStrategy::Error);
        let mut second = SumMetric::new(NanStrategy::Error);

        whole.update(&values[..]).unwrap();
        first.update(left).unwrap();
        second.update(right).unwrap();
        first.merge(&second);

        prop_assert!((first.compute() - whole.compute()).abs() < 1e-6);
    }
}

fn case1() -> Array1<f64> {
    Array1::from_elem(5, f64::NAN)
}

fn case2() -> Array1<f64> {
    array![1.0, 2.0, f64::NAN, 4.0, 5.0]
}

const KINDS: [Aggregation; 5] = [
    Aggregation::Min,
    Aggregation::Max,
    Aggregation::Sum,
    Aggregation::Mean,
    Aggregation::Cat,
];

#[test]
fn nan_error() {
    for kind in KINDS {
        for value in [case1(), case2()] {
            let mut metric = StreamingAggregator::new(kind, NanStrategy::Error);
            let before = metric.compute();
            let err = metric.update(&value).unwrap_err();

            assert_eq!(err.to_string(), "Encountered `nan` values in tensor", "{kind}");

            match (before, metric.compute()) {
                (MetricValue::Scalar(a), MetricValue::Scalar(b)) if a.is_nan() => assert!(b.is_nan()),
                (before, after) => assert_eq!(before, after, "{kind}"),
            }
        }
    }
}

#[test]
#[traced_test]
fn nan_warn() {
    for kind in KINDS {
        let mut metric = StreamingAggregator::new(kind, NanStrategy::Warn);

        metric.update(&case2()).unwrap();
    }

    assert!(logs_contain("Encountered `nan` values in tensor"));
}

#[test]
fn nan_expected() {
    let ignore = NanStrategy::Ignore;
    let replace = NanStrategy::Replace(2.0);
    let scalar = MetricValue::Scalar;
    let table = [
        (Aggregation::Min, ignore, case1(), scalar(f64::INFINITY)),
        (Aggregation::Min, replace, case1(), scalar(2.0)),
        (Aggregation::Min, ignore, case2(), scalar(1.0)),
        (Aggregation::Min, replace, case2(), scalar(1.0)),
        (Aggregation::Max, ignore, case1(), scalar(f64::NEG_INFINITY)),
        (Aggregation::Max, replace, case1(), scalar(2.0)),
        (Aggregation::Max, ignore, case2(), scalar(5.0)),
        (Aggregation::Max, replace, case2(), scalar(5.0)),
        (Aggregation::Sum, ignore, case1(), scalar(0.0)),
        (Aggregation::Sum, replace, case1(), scalar(10.0)),
        (Aggregation::Sum, ignore, case2(), scalar(12.0)),
        (Aggregation::Sum, replace, case2(), scalar(14.0)),
        (Aggregation::Mean, ignore, case1(), scalar(f64::NAN)),
        (Aggregation::Mean, replace, case1(), scalar(2.0)),
        (Aggregation::Mean, ignore, case2(), scalar(3.0)),
        (Aggregation::Mean, replace, case2(), scalar(2.8)),
        (Aggregation::Cat, ignore, case1(), MetricValue::Sequence(vec![])),
        (Aggregation::Cat, replace, case1(), MetricValue::Sequence(vec![2.0; 5])),
        (Aggregation::Cat, ignore, case2(), MetricValue::Sequence(vec![1.0, 2.0, 4.0, 5.0])),
        (Aggregation::Cat, replace, case2(), MetricValue::Sequence(vec![1.0, 2.0, 2.0, 4.0, 5.0])),
        (Aggregation::Cat, ignore, Array1::zeros(5), MetricValue::Sequence(vec![0.0; 5])),
    ];

    for (kind, nan_strategy, value, expected) in table {
        let mut metric = StreamingAggregator::new(kind, nan_strategy);

        metric.update(&value).unwrap();

        match (metric.compute(), expected) {
            (MetricValue::Scalar(out), MetricValue::Scalar(expected)) if expected.is_nan() => {
                assert!(out.is_nan(), "{kind} with {nan_strategy}")
            }
            (MetricValue::Scalar(out), MetricValue::Scalar(expected)) => {
                assert_relative_eq!(out, expected)
            }
            (out, expected) => assert_eq!(out, expected, "{kind} with {nan_strategy}"),
        }
    }
}

#[test]
fn wrong_nan_strategy() {
    let errors = [
        "median".parse::<NanStrategy>().unwrap_err(),
        NanStrategy::try_from(f64::NAN).unwrap_err(),
    ];

    for err in errors {
        assert!(matches!(&err, MetricError::InvalidArgument(message) if message.starts_with("Arg `nan_strategy` should either")));
    }

    let err = serde_json::from_value::<NanStrategy>(serde_json::json!([])).unwrap_err();

    assert!(err.to_string().contains("Arg `nan_strategy` should either"));
}

#[test]
fn mean_broadcasting() {
    let values = Array::range(0.0, 24.0, 1.0).into_shape_with_order((2, 3, 4)).unwrap();
    let cases = [
        (Array::from_elem((), 1.0).into_dyn(), 11.5),
        (Array::ones((2, 1, 1)).into_dyn(), 11.5),
        (array![1.0, 2.0].into_shape_with_order((2, 1, 1)).unwrap().into_dyn(), 13.5),
    ];

    for (weights, expected) in cases {
        let mut average = MeanMetric::default();

        assert_eq!(average.forward_weighted(&values, &weights).unwrap(), expected);
        assert_eq!(average.compute(), expected);
    }
}

#[test]
fn empty_aggregators() {
    assert_eq!(MinMetric::new(NanStrategy::Ignore).compute(), f64::INFINITY);
    assert_eq!(MaxMetric::new(NanStrategy::Ignore).compute(), f64::NEG_INFINITY);
    assert_eq!(SumMetric::new(NanStrategy::Ignore).compute(), 0.0);
    assert!(MeanMetric::new(NanStrategy::Ignore).compute().is_nan());
    assert!(CatMetric::new(NanStrategy::Ignore).compute().is_empty());
}

#[test]
fn compute_is_idempotent() {
    let mut mean = MeanMetric::new(NanStrategy::Error);

    mean.update_weighted(&array![1.0, 2.0, 3.0], &arr0(2.0)).unwrap();

    assert_eq!(mean.compute(), mean.compute());
    assert_eq!(mean.compute(), 2.0);
}
