use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::error::ProviderError;
use crate::providers::TrendsSource;

/// Serves fixed series per keyword; unknown keywords error. Records the
/// highest number of lookups in flight at once.
struct FakeTrends {
    series: HashMap<String, Vec<f64>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    geos: Mutex<Vec<String>>,
}

impl FakeTrends {
    fn new(entries: Vec<(&str, Vec<f64>)>) -> Arc<Self> {
        Arc::new(Self {
            series: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            geos: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TrendsSource for FakeTrends {
    async fn interest_over_time(
        &self,
        keyword: &str,
        geo: &str,
    ) -> Result<Vec<f64>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.geos.lock().expect("geo log lock").push(geo.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.series
            .get(keyword)
            .cloned()
            .ok_or_else(|| ProviderError::Api {
                provider: "test",
                message: format!("no data for {keyword}"),
            })
    }
}

fn service(source: Option<Arc<dyn TrendsSource>>) -> TrendsService {
    TrendsService::new(
        source,
        Arc::new(BoundedCache::new(64, Duration::from_secs(3600))),
        Duration::from_secs(7),
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[test]
fn summarize_computes_average_momentum_and_tail() {
    let series: Vec<f64> = (1..=15).map(f64::from).collect();

    let summary = summarize("mouse", &series).expect("non-empty series");

    assert_eq!(summary.avg_interest, 8);
    assert_eq!(summary.momentum, 14);
    assert_eq!(summary.samples, (4..=15).collect::<Vec<i32>>());
}

#[test]
fn summarize_clamps_momentum() {
    let summary = summarize("mouse", &[100.0, 0.0]).expect("non-empty series");
    assert_eq!(summary.momentum, -100);
    assert_eq!(summary.avg_interest, 50);
}

#[test]
fn summarize_empty_series_is_none() {
    assert!(summarize("mouse", &[]).is_none());
    assert!(summarize("mouse", &[f64::NAN]).is_none());
}

#[tokio::test]
async fn no_source_returns_nothing() {
    let metrics = service(None).get_metrics(&strings(&["mouse"]), "IN").await;
    assert!(metrics.is_empty());
}

#[tokio::test]
async fn results_are_sorted_and_failures_omitted() {
    let fake = FakeTrends::new(vec![
        ("mouse", vec![40.0, 60.0]),
        ("wireless", vec![70.0, 70.0]),
        ("silent", vec![60.0, 40.0]),
        ("empty", vec![]),
    ]);
    let svc = service(Some(fake));

    let metrics = svc
        .get_metrics(&strings(&["Mouse", "wireless", "silent", "empty", "unknown"]), "IN")
        .await;

    let keywords: Vec<&str> = metrics.iter().map(|m| m.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["wireless", "mouse", "silent"]);
    assert_eq!(metrics[1].momentum, 20);
    assert_eq!(metrics[2].momentum, -20);
}

#[tokio::test]
async fn keywords_are_normalized_deduped_and_capped() {
    let names: Vec<String> = (0..30).map(|i| format!("kw{i}")).collect();
    let fake = FakeTrends::new(names.iter().map(|k| (k.as_str(), vec![50.0])).collect());
    let svc = service(Some(fake.clone()));

    let mut input = strings(&[" KW0 ", "kw0", ""]);
    input.extend((1..30).map(|i| format!("kw{i}")));

    let metrics = svc.get_metrics(&input, "IN").await;

    assert_eq!(metrics.len(), MAX_TREND_KEYWORDS);
    assert_eq!(fake.calls.load(Ordering::SeqCst), MAX_TREND_KEYWORDS);
    assert!(fake.max_in_flight.load(Ordering::SeqCst) <= TREND_BATCH_SIZE);
}

#[tokio::test]
async fn lookups_run_concurrently_within_a_batch() {
    let fake = FakeTrends::new(vec![
        ("a1x", vec![1.0]),
        ("b2x", vec![2.0]),
        ("c3x", vec![3.0]),
        ("d4x", vec![4.0]),
        ("e5x", vec![5.0]),
        ("f6x", vec![6.0]),
    ]);
    let svc = service(Some(fake.clone()));

    let metrics = svc
        .get_metrics(&strings(&["a1x", "b2x", "c3x", "d4x", "e5x", "f6x"]), "IN")
        .await;

    assert_eq!(metrics.len(), 6);
    assert_eq!(fake.max_in_flight.load(Ordering::SeqCst), TREND_BATCH_SIZE);
}

#[tokio::test]
async fn cached_keywords_are_not_refetched_per_geo() {
    let fake = FakeTrends::new(vec![("mouse", vec![10.0, 20.0])]);
    let svc = service(Some(fake.clone()));

    svc.get_metrics(&strings(&["mouse"]), "IN").await;
    svc.get_metrics(&strings(&["MOUSE"]), "IN").await;
    svc.get_metrics(&strings(&["mouse"]), "US").await;

    assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        *fake.geos.lock().expect("geo log lock"),
        vec!["IN".to_string(), "US".to_string()]
    );
}
