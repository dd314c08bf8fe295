//! Property tests for the aggregation, ranking and trend invariants

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use costlens_core::{
    aggregate, detect_trend, evaluate_threshold, grand_total, rank, AnalysisResult, CostRecord,
    Dimension, NormalizedBatch, TREND_MULTIPLIER,
};
use proptest::prelude::*;

const SERVICES: &[&str] = &["EC2", "S3", "RDS", "Lambda", "CloudWatch"];
const REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-west-1", ""];

fn arb_record() -> impl Strategy<Value = CostRecord> {
    (0i64..7, 0usize..SERVICES.len(), 0usize..REGIONS.len(), 0u32..100_000).prop_map(
        |(offset, service, region, cents)| {
            let period = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(offset);
            let mut record = CostRecord::new(period, f64::from(cents) / 100.0)
                .with_dimension(Dimension::Service, SERVICES[service]);
            if !REGIONS[region].is_empty() {
                record = record.with_dimension(Dimension::Region, REGIONS[region]);
            }
            record
        },
    )
}

/// Like `arb_record`, but a third of the records are credits
fn arb_record_with_credits() -> impl Strategy<Value = CostRecord> {
    (arb_record(), 0u8..3).prop_map(|(mut record, kind)| {
        if kind == 0 {
            record.amount = -record.amount;
        }
        record
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn grouping_totals_match_grand_total(records in prop::collection::vec(arb_record(), 1..60)) {
        let total = grand_total(&records);
        for group_by in [
            vec![Dimension::Service],
            vec![Dimension::Region],
            vec![Dimension::Day],
            vec![Dimension::Service, Dimension::Region],
        ] {
            prop_assert!(close(aggregate(&records, &group_by).total(), total));
        }
    }

    #[test]
    fn ranking_is_deterministic_and_bounded(records in prop::collection::vec(arb_record(), 0..60)) {
        let total = grand_total(&records);
        let by_service = aggregate(&records, &[Dimension::Service]);

        let first = rank(&by_service, total, usize::MAX);
        let second = rank(&by_service, total, usize::MAX);
        prop_assert_eq!(&first, &second);

        for pair in first.windows(2) {
            prop_assert!(pair[0].total >= pair[1].total);
        }
        for entry in &first {
            prop_assert!(entry.percentage >= 0.0 && entry.percentage <= 100.0 + 1e-9);
        }
        if total > 0.0 {
            let sum: f64 = first.iter().map(|e| e.percentage).sum();
            prop_assert!(close(sum, 100.0));
        }
    }

    #[test]
    fn ranking_with_credits_stays_relative_to_grand_total(
        records in prop::collection::vec(arb_record_with_credits(), 0..60)
    ) {
        let total = grand_total(&records);
        let by_service = aggregate(&records, &[Dimension::Service]);

        for entry in rank(&by_service, total, usize::MAX) {
            prop_assert!(entry.total > 0.0);
            if total > 0.0 {
                prop_assert!(close(entry.percentage, entry.total / total * 100.0));
                if entry.percentage > 100.0 + 1e-6 {
                    prop_assert!(entry.total > total);
                }
            } else {
                prop_assert_eq!(entry.percentage, 0.0);
            }
        }
    }

    #[test]
    fn trend_flag_matches_definition(totals in prop::collection::vec(0.0f64..1000.0, 0..14)) {
        match detect_trend(&totals) {
            None => prop_assert!(totals.len() < 2),
            Some(signal) => {
                prop_assert!(totals.len() >= 2);
                prop_assert_eq!(signal.latest, *totals.last().unwrap());
                prop_assert_eq!(signal.exceeded, signal.latest > TREND_MULTIPLIER * signal.average);
            }
        }
    }

    #[test]
    fn threshold_is_strict_comparison(total in 0.0f64..100.0, threshold in 0.0f64..100.0) {
        prop_assert_eq!(evaluate_threshold(total, threshold).exceeded, total > threshold);
    }

    #[test]
    fn analysis_is_idempotent(records in prop::collection::vec(arb_record(), 0..40)) {
        let batch = NormalizedBatch::from_records(records);
        let at = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();

        let first = serde_json::to_string(&AnalysisResult::from_batch(&batch, at)).unwrap();
        let second = serde_json::to_string(&AnalysisResult::from_batch(&batch, at)).unwrap();
        prop_assert_eq!(first, second);
    }
}
