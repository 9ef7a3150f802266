use insights_rs::aggregate::UNKNOWN;
use insights_rs::stats::{
    LABEL_MAX, MISSING, complete_records, count_shares, format_number, group_by_field,
    percentages, summary, truncate_text, value_shares,
};
use insights_rs::{AggregateGroup, Dimension, Metric, Record};

#[test]
fn format_number_magnitudes() {
    assert_eq!(format_number(Some(0.0)), "0");
    assert_eq!(format_number(Some(0.5)), "0.50");
    assert_eq!(format_number(Some(1500.0)), "1.5K");
    assert_eq!(format_number(Some(2_500_000.0)), "2.5M");
    assert_eq!(format_number(Some(42.4)), "42");
    assert_eq!(format_number(Some(-1500.0)), "-1.5K");
    assert_eq!(format_number(None), "N/A");
    assert_eq!(MISSING, "N/A");
}

#[test]
fn percentages_round_to_one_decimal() {
    assert_eq!(percentages(&[1.0, 2.0]), [33.3, 66.7]);
    assert_eq!(percentages(&[0.0, 0.0]), [0.0, 0.0]);
    assert!(percentages(&[]).is_empty());
}

#[test]
fn shares_over_counts_and_values() {
    let groups = vec![
        AggregateGroup { name: "Economic".into(), value: 1.0, count: 3 },
        AggregateGroup { name: "Political".into(), value: 3.0, count: 1 },
    ];
    let by_count = count_shares(&groups);
    assert_eq!(by_count[0].percentage, 75.0);
    assert_eq!(by_count[1].value, 1.0);
    let by_value = value_shares(&groups);
    assert_eq!(by_value[1].percentage, 75.0);
    assert_eq!(by_value[0].name, "Economic");
}

#[test]
fn group_by_field_buckets_absent_as_unknown() {
    let rows = vec![
        Record { sector: Some("Energy".into()), ..Default::default() },
        Record::default(),
        Record { sector: Some("".into()), ..Default::default() },
        Record { sector: Some("Energy".into()), ..Default::default() },
    ];
    let g = group_by_field(&rows, Dimension::Sector);
    assert_eq!(g.len(), 2);
    assert_eq!(g["Energy"].len(), 2);
    assert_eq!(g[UNKNOWN].len(), 2);
}

#[test]
fn summary_median_even_odd() {
    let rec = |v: f64| Record { relevance: v, ..Default::default() };
    let s = summary(&[rec(4.0), rec(1.0), rec(3.0), rec(2.0)], Metric::Relevance);
    assert_eq!(s.count, 4);
    assert_eq!(s.min, Some(1.0));
    assert_eq!(s.max, Some(4.0));
    assert!((s.mean.unwrap() - 2.5).abs() < 1e-9);
    assert!((s.median.unwrap() - 2.5).abs() < 1e-9);

    let s = summary(&[rec(10.0), rec(30.0), rec(20.0)], Metric::Relevance);
    assert_eq!(s.median, Some(20.0));

    let s = summary(&[], Metric::Relevance);
    assert_eq!((s.count, s.mean, s.median), (0, None, None));
}

#[test]
fn truncate_and_clean() {
    let long = "Market Research & Consulting Services";
    let t = truncate_text(long, LABEL_MAX);
    assert_eq!(t, "Market Research & Consult...");
    assert_eq!(truncate_text("", 3), "");

    let rows = vec![
        Record { sector: Some("Energy".into()), topic: Some("oil".into()), ..Default::default() },
        Record { sector: Some("Energy".into()), ..Default::default() },
    ];
    assert_eq!(complete_records(&rows, &[Dimension::Sector, Dimension::Topic]).len(), 1);
    assert_eq!(complete_records(&rows, &[]).len(), 2);
}
