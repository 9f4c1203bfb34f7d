//! End-to-end acquisition: profile first, then its charts.

mod common;

use std::time::Duration;

use common::{MockProbe, MockSource, profile_record};
use gitfolio::artifact::{ArtifactLoader, ArtifactStatus, ChartSet};
use gitfolio::profile::{
    AcquisitionPath, AcquisitionState, AcquisitionStatus, ChartKind, ProfileController,
};
use gitfolio::retry::RetryPolicy;
use gitfolio_config::Config;
use tokio::time::Instant;

const API: &str = "http://localhost:8000";

fn charted_record(username: &str) -> gitfolio::profile::ProfileRecord {
    let mut record = profile_record(username);
    record.charts.languages = Some("/img/a.png".to_string());
    record
}

#[tokio::test(start_paused = true)]
async fn test_first_visit_computes_then_loads_chart() {
    let expected = charted_record("torvalds");
    let source = MockSource::new()
        .with_computed(expected.clone())
        .with_compute_latency(Duration::from_secs(4));
    let controller = ProfileController::from_config(source, &Config::default());

    let start = Instant::now();
    let state = controller.acquire("torvalds", false).await;

    match &state {
        AcquisitionState::Ready { record, path } => {
            assert_eq!(**record, expected);
            assert_eq!(*path, AcquisitionPath::Compute);
        }
        other => panic!("expected ready, got {other:?}"),
    }
    assert!(start.elapsed() >= Duration::from_millis(4500));
    assert_eq!(controller.source().cache_calls(), 1);
    assert_eq!(controller.source().compute_calls(), 1);

    let loader = ArtifactLoader::new(
        MockProbe::new().available_after("/img/a.png", 0),
        RetryPolicy::default(),
    );
    let record = state.record().cloned().unwrap();
    let mut charts = ChartSet::spawn_with_stamp(&record, API, &loader, 7);
    let states = charts.wait_all().await;

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].0, ChartKind::Languages);
    assert_eq!(
        states[0].1.status,
        ArtifactStatus::Loaded("http://localhost:8000/img/a.png?t=7".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_second_visit_uses_stored_profile() {
    let source = MockSource::new().with_computed(charted_record("torvalds"));
    let controller = ProfileController::from_config(source, &Config::default());

    controller.acquire("torvalds", false).await;
    let start = Instant::now();
    let state = controller.acquire("torvalds", false).await;

    assert!(matches!(
        state,
        AcquisitionState::Ready {
            path: AcquisitionPath::Cache,
            ..
        }
    ));
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(controller.source().compute_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_reanalyzes_even_when_stored() {
    let source = MockSource::new()
        .with_stored(profile_record("torvalds"))
        .with_computed(charted_record("torvalds"));
    let controller = ProfileController::from_config(source, &Config::default());

    let state = controller.acquire("torvalds", true).await;

    assert_eq!(state.status(), AcquisitionStatus::Ready);
    assert_eq!(
        state.record().and_then(|r| r.charts.get(ChartKind::Languages)),
        Some("/img/a.png")
    );
    assert_eq!(controller.source().cache_calls(), 0);
    assert_eq!(controller.source().compute_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_user_fails_with_service_detail() {
    let controller = ProfileController::from_config(MockSource::new(), &Config::default());

    let state = controller.acquire("no-such-user", false).await;

    assert_eq!(state.status(), AcquisitionStatus::Failed);
    assert_eq!(
        state.error(),
        Some("Analysis failed: GitHub API error: 404 no-such-user")
    );
    assert!(state.record().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_missing_chart_does_not_affect_others_or_profile() {
    let mut record = charted_record("torvalds");
    record.charts.stars = Some("/img/stars.png".to_string());
    record.charts.contributions = Some("/img/contrib.png".to_string());
    let source = MockSource::new().with_computed(record);
    let controller = ProfileController::from_config(source, &Config::default());
    let state = controller.acquire("torvalds", false).await;

    // Stars never appears; contributions needs two retries.
    let loader = ArtifactLoader::new(
        MockProbe::new()
            .available_after("/img/a.png", 0)
            .available_after("/img/contrib.png", 2),
        RetryPolicy::default(),
    );
    let mut charts = ChartSet::spawn(state.record().unwrap(), API, &loader);
    let states = charts.wait_all().await;

    let kinds: Vec<ChartKind> = states.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, ChartKind::all().to_vec());
    assert!(states[0].1.is_loaded());
    assert!(states[1].1.is_unavailable());
    assert!(states[2].1.is_loaded());
    assert_eq!(states[2].1.attempt, 2);
    assert_eq!(loader.probe().calls_for("/img/stars.png"), 6);
    assert_eq!(controller.state().status(), AcquisitionStatus::Ready);
}
