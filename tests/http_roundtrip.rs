use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fraud_scoring_service::driver::{
    stop_signal, DriverSettings, HttpScoringClient, ReferenceSet, ScoringClient, StopReason,
    TransactionDriver, TransportError,
};
use fraud_scoring_service::server::{build_router, AppState};
use fraud_scoring_service::types::features::{FeatureFrame, FEATURE_NAMES};
use fraud_scoring_service::types::scoring::PredictRequest;
use fraud_scoring_service::{Decision, FraudModel, ScoringService, ThresholdPolicy};

/// Probability rises with the scaled amount, so both tiers get exercised
struct AmountModel {
    calls: AtomicUsize,
}

impl FraudModel for AmountModel {
    fn name(&self) -> &str {
        "amount"
    }

    fn predict_probability(&self, frame: &FeatureFrame) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let amount = frame
            .get("scaled_amount")
            .ok_or_else(|| anyhow::anyhow!("scaled_amount column missing"))?;
        Ok((amount / 20.0).clamp(0.0, 1.0))
    }
}

async fn spawn_server(model: Arc<AmountModel>) -> String {
    let service = ScoringService::new(model, ThresholdPolicy::default());
    let app = build_router(AppState { service });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/predict", addr)
}

fn features_with_amount(amount: f64) -> Vec<f64> {
    let mut features = vec![0.0; 28];
    features.extend([12.0, amount, 0.0]);
    features
}

fn reference_csv() -> String {
    let mut csv = FEATURE_NAMES.join(",");
    csv.push_str(",Class\n");
    for (amount, label) in [(6.0, 1), (2.0, 0), (12.0, 1), (0.5, 0)] {
        let mut row = features_with_amount(amount)
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>();
        row.push(label.to_string());
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

#[tokio::test]
async fn test_http_client_scores_over_the_wire() {
    let model = Arc::new(AmountModel {
        calls: AtomicUsize::new(0),
    });
    let endpoint = spawn_server(model.clone()).await;
    let client = HttpScoringClient::new(&endpoint, Duration::from_secs(5)).unwrap();

    // 6.0 -> p = 0.30 against the high-value threshold
    let result = client
        .score(&PredictRequest {
            features: features_with_amount(6.0),
        })
        .await
        .unwrap();
    assert_eq!(result.threshold_used, 0.25);
    assert_eq!(result.decision, Decision::Block);

    // 2.0 -> p = 0.10 against the standard threshold
    let result = client
        .score(&PredictRequest {
            features: features_with_amount(2.0),
        })
        .await
        .unwrap();
    assert_eq!(result.threshold_used, 0.55);
    assert_eq!(result.decision, Decision::Allow);

    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_http_client_surfaces_validation_detail() {
    let model = Arc::new(AmountModel {
        calls: AtomicUsize::new(0),
    });
    let endpoint = spawn_server(model.clone()).await;
    let client = HttpScoringClient::new(&endpoint, Duration::from_secs(5)).unwrap();

    let err = client
        .score(&PredictRequest {
            features: vec![0.0; 30],
        })
        .await
        .unwrap_err();

    match err {
        TransportError::Status { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(
                detail,
                "Model expects 31 features, but received 30. Please check the feature engineering."
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_driver_streams_through_http() {
    let model = Arc::new(AmountModel {
        calls: AtomicUsize::new(0),
    });
    let endpoint = spawn_server(model.clone()).await;
    let client = HttpScoringClient::new(&endpoint, Duration::from_secs(5)).unwrap();
    let dataset = ReferenceSet::from_reader(reference_csv().as_bytes(), "Class").unwrap();

    let settings = DriverSettings {
        count: Some(5),
        delay: Duration::from_millis(5),
        max_consecutive_failures: 3,
    };
    let mut driver = TransactionDriver::new(client, dataset, settings).with_seed(11);
    let (_handle, stop) = stop_signal();

    let outcome = driver.run(stop).await;

    assert_eq!(outcome.stop_reason, StopReason::Completed);
    assert_eq!(outcome.scored, 5);
    assert_eq!(model.calls.load(Ordering::SeqCst), 5);

    // Every fraud in the set has an amount above the cutoff and p >= 0.25
    let monitor = driver.monitor();
    let frauds_drawn = monitor
        .history()
        .filter(|entry| entry.ground_truth_label == 1)
        .count() as u64;
    assert_eq!(monitor.frauds_caught(), frauds_drawn);
}

#[tokio::test]
async fn test_driver_aborts_when_service_is_down() {
    let client =
        HttpScoringClient::new("http://127.0.0.1:9/predict", Duration::from_millis(500)).unwrap();
    let dataset = ReferenceSet::from_reader(reference_csv().as_bytes(), "Class").unwrap();
    let settings = DriverSettings {
        count: Some(10),
        delay: Duration::ZERO,
        max_consecutive_failures: 2,
    };
    let mut driver = TransactionDriver::new(client, dataset, settings);
    let (_handle, stop) = stop_signal();

    let outcome = driver.run(stop).await;

    assert_eq!(outcome.stop_reason, StopReason::Aborted);
    assert_eq!(outcome.attempted, 2);
}
