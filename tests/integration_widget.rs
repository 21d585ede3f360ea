//! Widget session integration tests
//!
//! Drives a full widget session (store -> scheduler -> presentation ->
//! sink) on a paused tokio clock, so every timing property is checked
//! against virtual time.

use std::sync::Arc;
use std::time::Duration;

use surveyr::domain::PopupConfiguration;
use surveyr::presentation::Step;
use surveyr::scheduler::{WidgetEvent, WidgetHandle, activate};
use surveyr::session::{ClientStore, MemoryStore, TENANT_KEY};
use surveyr::store::{ConfigStore, MemoryConfigStore, MemoryResponseSink};

const TENANT: &str = "tenant-it";

fn config(wait_time: u64, max_display: u32, display_frequency: u64) -> PopupConfiguration {
    PopupConfiguration {
        rating_title: "Rate our service".to_string(),
        comment_title: "Anything to add?".to_string(),
        placeholder: "Write here".to_string(),
        wait_time,
        max_display,
        display_frequency,
    }
}

/// Spin up a widget session bound to a fresh store and sink.
async fn start_widget() -> (Arc<MemoryConfigStore>, Arc<MemoryResponseSink>, WidgetHandle) {
    let store = Arc::new(MemoryConfigStore::new());
    let sink = Arc::new(MemoryResponseSink::new());
    let durable = MemoryStore::new();
    durable.set(TENANT_KEY, TENANT).unwrap();

    let handle = activate(store.clone(), sink.clone(), &durable, MemoryStore::new())
        .await
        .unwrap()
        .expect("widget should activate with a tenant present");
    (store, sink, handle)
}

/// Let the widget task process whatever is queued.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn drain(handle: &mut WidgetHandle) -> Vec<WidgetEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.try_next_event() {
        events.push(event);
    }
    events
}

fn presented_count(events: &[WidgetEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, WidgetEvent::Presented(_)))
        .count()
}

/// Walk a visible popup through rating + review to submission.
async fn submit_review(handle: &mut WidgetHandle, rating: u8, review: &str) {
    handle.set_rating(rating);
    handle.advance();
    handle.set_review(review);
    handle.advance();
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn test_dormant_without_tenant_identifier() {
    let store = Arc::new(MemoryConfigStore::new());
    let sink = Arc::new(MemoryResponseSink::new());
    let durable = MemoryStore::new();

    let handle = activate(store, sink, &durable, MemoryStore::new())
        .await
        .unwrap();
    assert!(handle.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_popup_shows_after_wait_time() {
    let (store, _sink, mut handle) = start_widget().await;
    store.set(TENANT, config(5, 1, 1)).await.unwrap();
    settle().await;

    // Just before the deadline: nothing.
    tokio::time::sleep(Duration::from_millis(4800)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 0);

    // Just after: exactly one show.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let events = drain(&mut handle);
    assert_eq!(presented_count(&events), 1);
    match &events[0] {
        WidgetEvent::Presented(view) => {
            assert_eq!(view.step, Step::Rating);
            assert_eq!(view.title, "Rate our service");
            assert_eq!(view.rating, 0);
        }
        other => panic!("expected Presented, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_preserves_absolute_target() {
    let (store, _sink, mut handle) = start_widget().await;
    store.set(TENANT, config(10, 1, 1)).await.unwrap();
    settle().await;

    // Re-publish the same wait_time three seconds in.
    tokio::time::sleep(Duration::from_secs(3)).await;
    store.set(TENANT, config(10, 1, 1)).await.unwrap();
    settle().await;

    // Fires at T0+10s, not T0+13s.
    tokio::time::sleep(Duration::from_millis(6800)).await; // ~T0+9.8s
    assert_eq!(presented_count(&drain(&mut handle)), 0);
    tokio::time::sleep(Duration::from_millis(400)).await; // ~T0+10.2s
    assert_eq!(presented_count(&drain(&mut handle)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_only_the_recomputed_deadline_fires() {
    let (store, _sink, mut handle) = start_widget().await;
    store.set(TENANT, config(10, 1, 1)).await.unwrap();
    settle().await;

    // Mid-wait the operator extends the delay to 20s.
    tokio::time::sleep(Duration::from_secs(3)).await;
    store.set(TENANT, config(20, 1, 1)).await.unwrap();
    settle().await;

    // The original 10s deadline was cancelled.
    tokio::time::sleep(Duration::from_millis(8000)).await; // ~T0+11s
    assert_eq!(presented_count(&drain(&mut handle)), 0);

    // Only the 20s deadline fires.
    tokio::time::sleep(Duration::from_millis(9500)).await; // ~T0+20.5s
    assert_eq!(presented_count(&drain(&mut handle)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_past_target_shows_synchronously() {
    let (store, _sink, mut handle) = start_widget().await;
    store.set(TENANT, config(30, 1, 1)).await.unwrap();
    settle().await;

    // Five seconds in, the wait is shortened to 2s; the target is already
    // in the past, so the show happens within the reconfigure itself.
    tokio::time::sleep(Duration::from_secs(5)).await;
    store.set(TENANT, config(2, 1, 1)).await.unwrap();
    settle().await;
    assert_eq!(presented_count(&drain(&mut handle)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submission_appends_record_and_rearms() {
    let (store, sink, mut handle) = start_widget().await;
    store.set(TENANT, config(5, 2, 1)).await.unwrap();
    settle().await;

    tokio::time::sleep(Duration::from_millis(5100)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 1);

    // Submit roughly a second after the show.
    tokio::time::sleep(Duration::from_secs(1)).await;
    submit_review(&mut handle, 8, "works well").await;

    let events = drain(&mut handle);
    assert!(events.iter().any(|e| matches!(e, WidgetEvent::Submitted)));
    assert_eq!(presented_count(&events), 0);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].rating, 8);
    assert_eq!(records[0].review, "works well");
    assert_eq!(records[0].tenant, TENANT);

    // The next deadline is a full display frequency after submission.
    tokio::time::sleep(Duration::from_millis(59_000)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 0);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_display_quota_bounds_shows_per_session() {
    let (store, sink, mut handle) = start_widget().await;
    store.set(TENANT, config(5, 2, 1)).await.unwrap();
    settle().await;

    // First display at t=5s.
    tokio::time::sleep(Duration::from_millis(5100)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 1);

    // Submit at ~t=6s; second display at ~t=66s.
    tokio::time::sleep(Duration::from_secs(1)).await;
    submit_review(&mut handle, 9, "first").await;
    tokio::time::sleep(Duration::from_millis(61_000)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 1);

    // Submit again; the third deadline computes but the quota gate
    // rejects it, so the popup never shows again this session.
    submit_review(&mut handle, 3, "second").await;
    tokio::time::sleep(Duration::from_millis(120_000)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 0);

    assert_eq!(sink.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_removed_configuration_dismisses_at_any_step() {
    let (store, _sink, mut handle) = start_widget().await;
    store.set(TENANT, config(0, 1, 1)).await.unwrap();
    settle().await;
    assert_eq!(presented_count(&drain(&mut handle)), 1);

    // Move to the review step mid-dialog.
    handle.set_rating(6);
    handle.advance();
    settle().await;
    let events = drain(&mut handle);
    assert!(events.iter().any(|e| matches!(
        e,
        WidgetEvent::Updated(view) if view.step == Step::Review
    )));

    store.remove(TENANT).await.unwrap();
    settle().await;
    let events = drain(&mut handle);
    assert!(events.iter().any(|e| matches!(e, WidgetEvent::Dismissed)));
}

#[tokio::test(start_paused = true)]
async fn test_stale_deadline_after_removal_is_a_noop() {
    let (store, _sink, mut handle) = start_widget().await;
    store.set(TENANT, config(5, 1, 1)).await.unwrap();
    settle().await;

    // Record vanishes while the deadline is pending.
    tokio::time::sleep(Duration::from_secs(2)).await;
    store.remove(TENANT).await.unwrap();
    settle().await;

    // The deadline instant passes without a show.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 0);
}

#[tokio::test(start_paused = true)]
async fn test_advance_without_rating_is_rejected() {
    let (store, sink, mut handle) = start_widget().await;
    store.set(TENANT, config(0, 1, 1)).await.unwrap();
    settle().await;
    drain(&mut handle);

    // Advance with rating still 0: no transition, no events.
    handle.advance();
    settle().await;
    assert!(drain(&mut handle).is_empty());

    // With a rating recorded the same control advances.
    handle.set_rating(4);
    handle.advance();
    settle().await;
    let events = drain(&mut handle);
    assert!(events.iter().any(|e| matches!(
        e,
        WidgetEvent::Updated(view) if view.step == Step::Review
    )));
    assert!(sink.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_record_never_shows() {
    let (store, _sink, mut handle) = start_widget().await;

    // display_frequency of 0 is out of range; the widget must treat the
    // record as absent.
    store.set(TENANT, config(0, 1, 0)).await.unwrap();
    settle().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(presented_count(&drain(&mut handle)), 0);
}

#[tokio::test(start_paused = true)]
async fn test_modified_mid_wait_after_first_show_anchors_at_last_show() {
    let (store, _sink, mut handle) = start_widget().await;
    store.set(TENANT, config(0, 3, 2)).await.unwrap();
    settle().await;
    assert_eq!(presented_count(&drain(&mut handle)), 1); // shown at ~t=0

    submit_review(&mut handle, 7, "ok").await; // next deadline ~t=120s
    drain(&mut handle);

    // At t=30 the operator shortens the frequency to 1 minute. The wait
    // is re-anchored at the last show (~t=0), so the popup now fires at
    // ~t=60, not t=90.
    tokio::time::sleep(Duration::from_secs(30)).await;
    store.set(TENANT, config(0, 3, 1)).await.unwrap();
    settle().await;

    tokio::time::sleep(Duration::from_millis(28_000)).await; // ~t=58
    assert_eq!(presented_count(&drain(&mut handle)), 0);
    tokio::time::sleep(Duration::from_millis(4000)).await; // ~t=62
    assert_eq!(presented_count(&drain(&mut handle)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ends_the_session() {
    let (store, _sink, handle) = start_widget().await;
    store.set(TENANT, config(5, 1, 1)).await.unwrap();

    handle.shutdown();
    handle.join().await;
}
