// Live tests (opt-in): cargo test --features online -- --ignored
// Expects the insights service at INSIGHTS_API_URL (default http://localhost:5000/api).
#![cfg(feature = "online")]

use insights_rs::api::{ClientConfig, DEFAULT_BASE_URL};
use insights_rs::filters::{EXACT_MATCH, FilterSet, Normalizer, normalize};
use insights_rs::{Client, Dimension, Metric, aggregate};

fn client() -> Client {
    let base_url = std::env::var("INSIGHTS_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    Client::new(ClientConfig {
        base_url,
        ..Default::default()
    })
    .unwrap()
}

#[test]
#[ignore]
fn local_top_n_agrees_with_service() {
    let cli = client();
    let f = normalize(&FilterSet::new());
    let records = cli.fetch_records(&f).unwrap();
    let local = aggregate::top_n(&records, Dimension::Country, Metric::Intensity, 10, None);
    let remote = cli
        .fetch_top_n(Metric::Intensity, Dimension::Country, 10, &f)
        .unwrap();
    assert_eq!(local.len(), remote.len());
    for (l, r) in local.iter().zip(&remote) {
        assert!((l.value - r.value).abs() < 1e-9);
    }
}

#[test]
#[ignore]
fn topics_accept_exact_match_false() {
    let cli = client();
    let mut f = FilterSet::new();
    f.insert("topic", "oil");
    f.insert(EXACT_MATCH, false);
    let topics = cli
        .fetch_topics(&Normalizer::new().preserve(EXACT_MATCH).normalize(&f))
        .unwrap();
    assert!(topics.len() <= 20);
}

#[test]
#[ignore]
fn filters_and_profiles_load() {
    let cli = client();
    let none = normalize(&FilterSet::new());
    assert!(!cli.fetch_filter_options().unwrap().countries.is_empty());
    cli.fetch_regions(&none).unwrap();
    cli.fetch_sectors(&none).unwrap();
    cli.fetch_pest(&none).unwrap();
}
