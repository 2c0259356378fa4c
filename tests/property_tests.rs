//! Property-based tests for splitting and evaluation.

use indicator_forecast::core::{split, TimeSeriesTable};
use indicator_forecast::utils::evaluate;
use indicator_forecast::PipelineError;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

fn make_table(values: &[f64]) -> TimeSeriesTable {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    TimeSeriesTable::builder()
        .timestamps(
            (0..values.len())
                .map(|i| base + Duration::days(i as i64))
                .collect(),
        )
        .field("Interest_Rate", values.to_vec())
        .field("Inflation_Rate", values.iter().map(|v| v * 0.5).collect())
        .build()
        .unwrap()
}

fn values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-100.0..100.0_f64, min_len..max_len)
}

fn paired_strategy(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1..max_len).prop_flat_map(|len| {
        (
            prop::collection::vec(-1000.0..1000.0_f64, len),
            prop::collection::vec(-1000.0..1000.0_f64, len),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn split_partitions_every_row(values in values_strategy(2, 300), ratio in 0.01..0.99_f64) {
        let table = make_table(&values);
        let cut = (values.len() as f64 * ratio).floor() as usize;

        match split(&table, ratio, "Interest_Rate", &["Inflation_Rate"]) {
            Ok(s) => {
                prop_assert_eq!(s.train_len(), cut);
                prop_assert_eq!(s.train_len() + s.test_len(), values.len());
                prop_assert!(s.train_len() > 0 && s.test_len() > 0);
                prop_assert_eq!(s.train_target(), &values[..cut]);
                prop_assert_eq!(s.test_target(), &values[cut..]);
                prop_assert_eq!(s.train_regressors().rows(), s.train_len());
                prop_assert_eq!(s.test_regressors().rows(), s.test_len());
            }
            Err(PipelineError::InsufficientData { train, test, .. }) => {
                prop_assert!(train == 0 || test == 0);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn split_rejects_ratio_outside_unit_interval(
        values in values_strategy(2, 50),
        ratio in prop_oneof![-10.0..=0.0_f64, 1.0..10.0_f64],
    ) {
        let table = make_table(&values);
        prop_assert!(matches!(
            split(&table, ratio, "Interest_Rate", &["Inflation_Rate"]),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn evaluate_identical_is_zero(values in values_strategy(1, 200)) {
        let metrics = evaluate(&values, &values).unwrap();
        prop_assert_eq!(metrics.rmse, 0.0);
        prop_assert_eq!(metrics.mae, 0.0);
    }

    #[test]
    fn evaluate_is_symmetric((a, b) in paired_strategy(200)) {
        let ab = evaluate(&a, &b).unwrap();
        let ba = evaluate(&b, &a).unwrap();
        prop_assert!((ab.rmse - ba.rmse).abs() <= 1e-9 * ab.rmse.max(1.0));
        prop_assert!((ab.mae - ba.mae).abs() <= 1e-9 * ab.mae.max(1.0));
    }

    #[test]
    fn rmse_dominates_mae((a, b) in paired_strategy(200)) {
        let metrics = evaluate(&a, &b).unwrap();
        prop_assert!(metrics.mae >= 0.0);
        prop_assert!(metrics.rmse + 1e-9 >= metrics.mae);
    }

    #[test]
    fn evaluate_rejects_length_mismatch(a in values_strategy(1, 50), extra in 1usize..5) {
        let mut b = a.clone();
        b.extend(std::iter::repeat(0.0).take(extra));
        prop_assert_eq!(
            evaluate(&a, &b).unwrap_err(),
            PipelineError::LengthMismatch { actual: a.len(), predicted: a.len() + extra }
        );
    }
}
