//! End-to-end behavior of stream sessions under virtual time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use suspense_core::{ProducerError, SectionId, SectionStatus};
use suspense_data::{delayed, producer_fn, ready_after, Scripted};
use suspense_executor::{SectionSpec, SectionState, StreamingFetchCoordinator};
use tokio::time::{sleep, Instant};

const UNIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
enum PageData {
    Profile { id: u32, name: String },
    Posts(Vec<String>),
}

fn profile() -> PageData {
    PageData::Profile {
        id: 1,
        name: "User 1".to_string(),
    }
}

fn posts() -> PageData {
    PageData::Posts(vec![
        "My first blog post".to_string(),
        "Tech notes".to_string(),
        "Study notes".to_string(),
    ])
}

fn record_order(session: &suspense_executor::SessionHandle<PageData>) -> Arc<Mutex<Vec<SectionId>>> {
    let order = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&order);
    session.subscribe(move |t| sink.lock().unwrap().push(t.section.clone()));
    order
}

#[tokio::test(start_paused = true)]
async fn test_profile_settles_before_posts() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
        ])
        .unwrap();
    let order = record_order(&session);

    assert_eq!(session.status("profile").unwrap(), SectionStatus::Pending);
    assert_eq!(session.status("posts").unwrap(), SectionStatus::Pending);

    sleep(UNIT + Duration::from_millis(1)).await;
    assert_eq!(coordinator.get_status(&session, "profile").unwrap(), SectionStatus::Ready);
    assert_eq!(coordinator.get_status(&session, "posts").unwrap(), SectionStatus::Pending);

    session.settled().await;
    let order = order.lock().unwrap().clone();
    assert_eq!(order, vec![SectionId::from("profile"), SectionId::from("posts")]);

    match session.state("posts").unwrap() {
        SectionState::Ready(data) => assert_eq!(*data, posts()),
        other => panic!("posts not ready: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_section_settles_exactly_once() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new(
                "posts",
                delayed(UNIT, Scripted::<PageData>::new(vec![Err(ProducerError::new("boom"))])),
            ),
            SectionSpec::new("comments", ready_after(UNIT * 3, posts())),
        ])
        .unwrap();

    session.settled().await;
    sleep(UNIT * 10).await;

    let history = session.history();
    assert_eq!(history.len(), 3);
    for id in ["profile", "posts", "comments"] {
        let count = history.iter().filter(|t| t.section.as_str() == id).count();
        assert_eq!(count, 1, "section {} settled {} times", id, count);
    }
    let sequences: Vec<u64> = history.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_producers_run_concurrently() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let started = Instant::now();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
            SectionSpec::new("comments", ready_after(UNIT * 3, posts())),
        ])
        .unwrap();

    session.settled().await;
    let elapsed = started.elapsed();
    assert!(elapsed >= UNIT * 3);
    assert!(elapsed < UNIT * 4, "sections were serialized: {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_isolated() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new(
                "profile",
                delayed(UNIT, Scripted::<PageData>::new(vec![Err(ProducerError::new("HTTP error! status: 500"))])),
            ),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
        ])
        .unwrap();

    session.settled().await;
    assert_eq!(session.status("profile").unwrap(), SectionStatus::Failed);
    assert_eq!(session.status("posts").unwrap(), SectionStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_failure_yields_ready() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let producer = Arc::new(Scripted::fail_then("HTTP error! status: 500", profile()));
    let session = coordinator
        .start_session(vec![SectionSpec::new("profile", delayed(UNIT, Arc::clone(&producer)))])
        .unwrap();

    session.settled().await;
    let state = session.state("profile").unwrap();
    assert_eq!(state.status(), SectionStatus::Failed);
    assert_eq!(state.error().unwrap().message(), "HTTP error! status: 500");

    coordinator.retry(&session, "profile").unwrap();
    assert_eq!(session.status("profile").unwrap(), SectionStatus::Pending);
    assert!(session.state("profile").unwrap().error().is_none());

    session.settled().await;
    let state = session.state("profile").unwrap();
    assert_eq!(state.status(), SectionStatus::Ready);
    assert!(state.error().is_none());
    assert_eq!(**state.data().unwrap(), profile());
    assert_eq!(producer.invocations(), 2);
    assert_eq!(session.attempts("profile").unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_leaves_other_sections_alone() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT, posts())),
        ])
        .unwrap();
    session.settled().await;

    session.retry("profile").unwrap();
    assert_eq!(session.status("profile").unwrap(), SectionStatus::Pending);
    assert_eq!(session.status("posts").unwrap(), SectionStatus::Ready);
    assert!(!session.is_complete());

    session.settled().await;
    assert_eq!(session.status("profile").unwrap(), SectionStatus::Ready);
    assert_eq!(session.attempts("posts").unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_unknown_section_changes_nothing() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
        ])
        .unwrap();
    sleep(UNIT + Duration::from_millis(1)).await;
    let before = session.statuses();

    let err = coordinator.retry(&session, "comments").unwrap_err();
    assert_eq!(err.id.as_str(), "comments");
    assert!(session.status("comments").is_err());
    assert_eq!(session.statuses(), before);
}

#[tokio::test(start_paused = true)]
async fn test_retry_while_pending_discards_old_result() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let producer = producer_fn(move || {
        let call = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if call == 0 {
                sleep(UNIT * 5).await;
                Ok::<_, ProducerError>("stale".to_string())
            } else {
                sleep(UNIT).await;
                Ok("fresh".to_string())
            }
        }
    });

    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![SectionSpec::new("feed", producer)])
        .unwrap();
    sleep(Duration::from_millis(10)).await;
    session.retry("feed").unwrap();

    session.settled().await;
    sleep(UNIT * 10).await;

    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attempt, 2);
    assert_eq!(**session.state("feed").unwrap().data().unwrap(), "fresh");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_gets_replay() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
        ])
        .unwrap();
    session.settled().await;

    let order = record_order(&session);
    assert_eq!(
        *order.lock().unwrap(),
        vec![SectionId::from("profile"), SectionId::from("posts")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_transition_stream_matches_delivery_order() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("comments", ready_after(UNIT * 3, posts())),
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
        ])
        .unwrap();

    let received: Vec<String> = session
        .transitions()
        .take(3)
        .map(|t| t.section.to_string())
        .collect()
        .await;
    assert_eq!(received, vec!["profile", "posts", "comments"]);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_stops_delivery() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
        ])
        .unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let subscription = coordinator.subscribe(&session, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    sleep(UNIT + Duration::from_millis(1)).await;
    assert!(session.unsubscribe(subscription));
    assert!(!session.unsubscribe(subscription));

    session.settled().await;
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_producer_fails_section() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new(
                "broken",
                producer_fn(|| async {
                    if true {
                        panic!("producer bug");
                    }
                    Ok::<u8, ProducerError>(0)
                }),
            ),
            SectionSpec::new("fine", ready_after(UNIT, 1u8)),
        ])
        .unwrap();

    session.settled().await;
    assert_eq!(session.status("broken").unwrap(), SectionStatus::Failed);
    assert_eq!(session.status("fine").unwrap(), SectionStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_callback_can_query_session() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
        ])
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let inner = session.clone();
    let log = Arc::clone(&seen);
    session.subscribe(move |t| {
        let history = inner.history();
        let status = inner.status(&t.section).unwrap();
        drop(inner.transitions());
        log.lock().unwrap().push((t.section.clone(), history.len(), status));
    });

    session.settled().await;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (SectionId::from("profile"), 1, SectionStatus::Ready),
            (SectionId::from("posts"), 2, SectionStatus::Ready),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_from_callback_replays_in_order() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
            SectionSpec::new("comments", ready_after(UNIT * 3, posts())),
        ])
        .unwrap();

    let late = Arc::new(Mutex::new(Vec::new()));
    let inner = session.clone();
    let sink = Arc::clone(&late);
    session.subscribe(move |t| {
        if t.section.as_str() == "posts" {
            let sink = Arc::clone(&sink);
            inner.subscribe(move |t| sink.lock().unwrap().push(t.section.clone()));
        }
    });

    session.settled().await;
    assert_eq!(
        *late.lock().unwrap(),
        vec![
            SectionId::from("profile"),
            SectionId::from("posts"),
            SectionId::from("comments")
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_panicking_callback_does_not_stop_delivery() {
    let coordinator = StreamingFetchCoordinator::new().unwrap();
    let session = coordinator
        .start_session(vec![
            SectionSpec::new("profile", ready_after(UNIT, profile())),
            SectionSpec::new("posts", ready_after(UNIT * 2, posts())),
        ])
        .unwrap();

    session.subscribe(|t| {
        if t.section.as_str() == "profile" {
            panic!("subscriber bug");
        }
    });
    let order = record_order(&session);

    session.settled().await;
    assert_eq!(
        *order.lock().unwrap(),
        vec![SectionId::from("profile"), SectionId::from("posts")]
    );
}
