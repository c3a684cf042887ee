//! End-to-end behaviour of the engine on reference inputs.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use inkflow::{QualityTier, SmoothingConfig, SmoothingEngine, Stroke};
use tokio_util::sync::CancellationToken;

use common::{arc, line, wait_until};

#[tokio::test]
async fn test_two_sample_stroke_is_returned_unchanged() {
    let engine = SmoothingEngine::new(SmoothingConfig::default()).unwrap();
    let stroke = line(1, 2, 5.0);

    let result = engine.smooth_async(stroke.clone(), None, None).await;
    assert_eq!(result, stroke);
    assert_eq!(engine.smooth_sync(&stroke), stroke);
}

#[tokio::test]
async fn test_straight_line_with_zero_tension_stays_on_line() {
    let config = SmoothingConfig {
        curve_tension: 0.0,
        ..Default::default()
    };
    let engine = SmoothingEngine::new(config).unwrap();
    let stroke = line(2, 10, 1.0);

    let result = engine.smooth_async(stroke.clone(), None, None).await;
    assert!(result.len() >= 2);
    for sample in &result.samples {
        assert!(sample.y.abs() < 1e-9, "off the line: {:?}", sample);
        assert!(sample.x >= -1e-9 && sample.x <= 9.0 + 1e-9);
    }
    assert_eq!(result.samples.first(), stroke.samples.first());
    assert_eq!(result.samples.last(), stroke.samples.last());
}

#[tokio::test]
async fn test_dense_stroke_is_resampled_within_budget() {
    let engine = SmoothingEngine::new(SmoothingConfig::for_tier(QualityTier::Quality)).unwrap();
    let stroke = line(3, 500, 0.05);

    let result = engine.smooth_async(stroke.clone(), None, None).await;
    assert!(result.len() as f64 <= 2.5 * 500.0);
    // Resampled at 0.5 over ~25 units: far fewer points than the input.
    assert!(result.len() < stroke.len());
    assert_eq!(result.id, stroke.id);
}

#[tokio::test]
async fn test_cancel_before_slot_returns_original_without_recording() {
    let config = SmoothingConfig::default().with_concurrency_limit(1);
    let engine = SmoothingEngine::new(config).unwrap();
    let limiter = engine.worker_limiter();
    let held = limiter.try_acquire().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let token = CancellationToken::new();
    let stroke = arc(4, 40);

    let job = tokio::spawn(engine.smooth_async(
        stroke.clone(),
        Some(Box::new(move |_: Stroke| {
            c.fetch_add(1, Ordering::SeqCst);
        })),
        Some(token.clone()),
    ));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!job.is_finished());
    token.cancel();

    let result = job.await.unwrap();
    assert_eq!(result, stroke);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.performance_summary().sample_count, 0);
    assert!(wait_until(Duration::from_secs(1), || engine.in_flight() == 0).await);

    drop(held);
    assert_eq!(limiter.in_flight(), 0);
}

#[tokio::test]
async fn test_attributes_pass_through() {
    let engine = SmoothingEngine::new(SmoothingConfig::default()).unwrap();
    let attributes = inkflow::StrokeAttributes {
        color: [10, 20, 30, 255],
        width: 4.5,
        is_highlighter: true,
    };
    let stroke = arc(5, 40).with_attributes(attributes.clone());

    let result = engine.smooth_async(stroke, None, None).await;
    assert_eq!(result.attributes, attributes);
}

#[tokio::test]
async fn test_completed_jobs_are_recorded() {
    let engine = SmoothingEngine::new(SmoothingConfig::default()).unwrap();
    for id in 0..5 {
        engine.smooth_async(arc(id, 40), None, None).await;
    }
    let summary = engine.performance_summary();
    assert_eq!(summary.sample_count, 5);
    assert!(summary.max_ms >= summary.avg_ms);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_far_from_origin_stroke_finishes_and_frees_slot() {
    let engine = SmoothingEngine::new(SmoothingConfig::for_tier(QualityTier::Quality)).unwrap();
    let samples = (0..20)
        .map(|i| inkflow::Sample::new(1e16 + i as f64 * 4.0, 0.0, 0.5))
        .collect();
    let stroke = Stroke::new(inkflow::StrokeId::from_raw(6), samples);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        engine.smooth_async(stroke.clone(), None, None),
    )
    .await
    .expect("smoothing did not finish");

    assert_eq!(result.id, stroke.id);
    assert!(result.len() as f64 <= 2.5 * stroke.len() as f64);
    assert_eq!(engine.worker_limiter().in_flight(), 0);
}
