//! Crash alerting through the ingestion path

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Duration;

use common::{app_with, app_with_broken_store, app_with_config, manual_clock, Flaky, Recorder};
use game_telemetry::alerts::{AlertConfig, AlertOutcome, Notifier};
use game_telemetry::types::{EventType, NewEventInput, Severity};

fn crash(game_id: &str) -> NewEventInput {
    NewEventInput::new(game_id, EventType::Crash).with_severity(Severity::Critical)
}

#[tokio::test]
async fn test_alert_fires_once_when_threshold_is_reached() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let state = app_with(Some(recorder.clone() as Arc<dyn Notifier>), clock.clone());

    for i in 1..=12 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
        let expected = if i < 10 { 0 } else { 1 };
        assert_eq!(recorder.count(), expected, "after crash {}", i);
    }

    let sent = recorder.messages();
    assert_eq!(sent[0].title, "🚨 Crash Alert: g1");
    assert_eq!(sent[0].color, 0xff0000);
    assert_eq!(sent[0].fields[0].value, "10");
}

#[tokio::test]
async fn test_cooldown_suppresses_then_allows_second_alert() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let state = app_with(Some(recorder.clone() as Arc<dyn Notifier>), clock.clone());

    for _ in 0..12 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
    }
    assert_eq!(recorder.count(), 1);

    clock.advance(Duration::minutes(4));
    for _ in 0..5 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
    }
    assert_eq!(recorder.count(), 1);

    clock.advance(Duration::minutes(2));
    state.ingestion.create_event(crash("g1")).await.unwrap();
    assert_eq!(recorder.count(), 2);
}

#[tokio::test]
async fn test_cooldown_is_per_game() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let state = app_with(Some(recorder.clone() as Arc<dyn Notifier>), clock);

    for _ in 0..10 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
        state.ingestion.create_event(crash("g2")).await.unwrap();
    }

    let titles: Vec<String> = recorder.messages().into_iter().map(|m| m.title).collect();
    assert_eq!(titles, vec!["🚨 Crash Alert: g1", "🚨 Crash Alert: g2"]);
}

#[tokio::test]
async fn test_concurrent_crashes_deliver_one_alert() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let state = app_with(Some(recorder.clone() as Arc<dyn Notifier>), clock);

    for _ in 0..9 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
    }
    assert_eq!(recorder.count(), 0);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ingestion = state.ingestion.clone();
        handles.push(tokio::spawn(async move {
            ingestion.create_event(crash("g1")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn test_failed_delivery_does_not_fail_ingestion_and_retries() {
    let clock = manual_clock();
    let flaky = Arc::new(Flaky::new(1));
    let state = app_with(Some(flaky.clone() as Arc<dyn Notifier>), clock);

    for _ in 0..10 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
    }
    assert_eq!(flaky.attempts(), 1);
    assert_eq!(flaky.delivered.count(), 0);
    assert!(state.alerts.cooldown().last_fired("g1").await.is_none());

    // The crash that failed to alert is still stored
    let total = state.metrics.get_summary("g1", 1).await.unwrap().crash_count;
    assert_eq!(total, 10);

    state.ingestion.create_event(crash("g1")).await.unwrap();
    assert_eq!(flaky.attempts(), 2);
    assert_eq!(flaky.delivered.count(), 1);
}

#[tokio::test]
async fn test_non_crash_events_never_evaluate() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let state = app_with(Some(recorder.clone() as Arc<dyn Notifier>), clock);

    for _ in 0..20 {
        state
            .ingestion
            .create_event(NewEventInput::new("g1", EventType::Performance).with_severity(Severity::Critical))
            .await
            .unwrap();
    }

    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn test_batch_alerts_once_per_game() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let state = app_with(Some(recorder.clone() as Arc<dyn Notifier>), clock);

    let batch: Vec<NewEventInput> = (0..15).map(|_| crash("g1")).collect();
    state.ingestion.create_events(batch).await.unwrap();

    assert_eq!(recorder.count(), 1);
    assert_eq!(recorder.messages()[0].fields[0].value, "15");
}

#[tokio::test]
async fn test_custom_alert_ignores_cooldown() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let state = app_with(Some(recorder.clone() as Arc<dyn Notifier>), clock);

    assert!(state.alerts.send_custom_alert("Deploy", "v2 rolled out", Severity::Info).await);
    assert!(state.alerts.send_custom_alert("Deploy", "v2 rolled out", Severity::Info).await);
    assert_eq!(recorder.count(), 2);

    let sent = recorder.messages();
    assert_eq!(sent[0].title, "ℹ️ Deploy");
    assert_eq!(sent[0].color, 0x3498db);
}

#[tokio::test]
async fn test_direct_evaluation_reports_suppression() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let state = app_with(Some(recorder.clone() as Arc<dyn Notifier>), clock);

    for _ in 0..10 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
    }

    assert_eq!(
        state.alerts.evaluate_crash_threshold("g1").await,
        AlertOutcome::Suppressed { crash_count: 10 }
    );
}

#[tokio::test]
async fn test_background_evaluation_delivers_after_ingestion_returns() {
    let clock = manual_clock();
    let recorder = Arc::new(Recorder::default());
    let config = AlertConfig {
        background: true,
        ..AlertConfig::default()
    };
    let state = app_with_config(Some(recorder.clone() as Arc<dyn Notifier>), clock, config);

    for _ in 0..10 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
    }

    for _ in 0..100 {
        if recorder.count() > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn test_threshold_count_failure_does_not_fail_ingestion() {
    let recorder = Arc::new(Recorder::default());
    let (state, store) =
        app_with_broken_store(Some(recorder.clone() as Arc<dyn Notifier>), manual_clock());
    store.fail_counts.store(true, Ordering::SeqCst);

    for _ in 0..12 {
        state.ingestion.create_event(crash("g1")).await.unwrap();
    }
    assert_eq!(recorder.count(), 0);
    assert_eq!(
        state.alerts.evaluate_crash_threshold("g1").await,
        AlertOutcome::EvaluationFailed
    );

    let page = state.ingestion.list_events(&Default::default()).await.unwrap();
    assert_eq!(page.total, 12);

    // Once counting works again the next crash alerts
    store.fail_counts.store(false, Ordering::SeqCst);
    state.ingestion.create_event(crash("g1")).await.unwrap();
    assert_eq!(recorder.count(), 1);
}
