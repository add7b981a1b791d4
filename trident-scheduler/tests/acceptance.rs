//! End-to-end scenarios driving the full producer/consumer/batched-writer
//! pipeline through a real `Scheduler`, an in-memory bus pair, and a
//! fake datastore. Timestamps are anchored in the past so every task is
//! immediately "ready" — these scenarios exercise release ordering,
//! window truncation, and pause/resume semantics, not wall-clock timing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use trident_data::{DataError, Datastore};
use trident_events::{Bus, InMemoryBus};
use trident_schedule_store::ScheduleStore;
use trident_scheduler::Scheduler;
use trident_types::{AuthRequest, AuthResponse, Campaign, CampaignStatus, ResultRow};

struct FakeDatastore {
    campaigns: DashMap<Uuid, Campaign>,
    results: Mutex<Vec<ResultRow>>,
}

impl FakeDatastore {
    fn new(campaigns: Vec<Campaign>) -> Arc<Self> {
        let map = DashMap::new();
        for c in campaigns {
            map.insert(c.id, c);
        }
        Arc::new(Self {
            campaigns: map,
            results: Mutex::new(Vec::new()),
        })
    }

    fn results(&self) -> Vec<ResultRow> {
        self.results.lock().unwrap().clone()
    }
}

#[async_trait]
impl Datastore for FakeDatastore {
    async fn insert_campaign(&self, c: &Campaign) -> Result<(), DataError> {
        self.campaigns.insert(c.id, c.clone());
        Ok(())
    }
    async fn campaign(&self, id: Uuid) -> Result<Option<Campaign>, DataError> {
        Ok(self.campaigns.get(&id).map(|e| e.clone()))
    }
    async fn active_campaigns(&self) -> Result<Vec<Campaign>, DataError> {
        Ok(self.campaigns.iter().map(|e| e.clone()).collect())
    }
    async fn set_campaign_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), DataError> {
        if let Some(mut c) = self.campaigns.get_mut(&id) {
            c.status = status;
        }
        Ok(())
    }
    async fn insert_result(&self, row: &ResultRow) -> Result<(), DataError> {
        self.results.lock().unwrap().push(row.clone());
        Ok(())
    }
    async fn insert_results_batch(&self, rows: &[ResultRow]) -> Result<Vec<ResultRow>, DataError> {
        self.results.lock().unwrap().extend_from_slice(rows);
        Ok(Vec::new())
    }
}

fn campaign(users: Vec<&str>, passwords: Vec<&str>, not_before: chrono::DateTime<Utc>, window: Duration, interval: Duration) -> Campaign {
    Campaign {
        id: Uuid::new_v4(),
        created_by: "operator".into(),
        not_before,
        not_after: not_before + chrono::Duration::from_std(window).unwrap(),
        schedule_interval: interval,
        users: users.into_iter().map(String::from).collect(),
        passwords: passwords.into_iter().map(String::from).collect(),
        provider: "okta".into(),
        provider_metadata: HashMap::new(),
        status: CampaignStatus::Active,
    }
}

/// A stand-in dispatcher: echoes every task straight back as a result.
/// `classify` decides valid/locked based on how many times a (user,
/// password) pair has been seen.
fn spawn_echo_dispatcher(
    task_bus: Arc<InMemoryBus<AuthRequest>>,
    result_bus: Arc<InMemoryBus<AuthResponse>>,
    classify: impl Fn(&AuthRequest, usize) -> AuthResponse + Send + 'static,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let seen = Arc::new(DashMap::<(Uuid, String, String), usize>::new());
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                received = task_bus.receive() => {
                    let Ok(delivery) = received else { return };
                    let req = delivery.payload().clone();
                    let key = (req.campaign_id, req.username.clone(), req.password.clone());
                    let attempt = {
                        let mut counter = seen.entry(key).or_insert(0);
                        *counter += 1;
                        *counter
                    };
                    let resp = classify(&req, attempt);
                    let _ = result_bus.publish(resp).await;
                    delivery.ack().await;
                }
            }
        }
    })
}

#[tokio::test]
async fn s1_tiny_campaign_releases_in_password_order() {
    let now = Utc::now() - chrono::Duration::minutes(1);
    let c = campaign(vec!["a"], vec!["p1", "p2"], now, Duration::from_secs(10), Duration::from_secs(1));

    let store = ScheduleStore::new();
    let task_bus = InMemoryBus::<AuthRequest>::new();
    let result_bus = InMemoryBus::<AuthResponse>::new();
    let datastore = FakeDatastore::new(vec![c.clone()]);

    let scheduler = Scheduler::new(store.clone(), task_bus.clone(), result_bus.clone(), datastore.clone());
    scheduler.submit_campaign(&c).await.unwrap();

    let cancel = CancellationToken::new();
    let dispatcher = spawn_echo_dispatcher(
        task_bus.clone(),
        result_bus.clone(),
        |req, _attempt| AuthResponse {
            campaign_id: req.campaign_id,
            username: req.username.clone(),
            password: req.password.clone(),
            timestamp: Utc::now(),
            ip: "203.0.113.7".into(),
            valid: false,
            locked: false,
            mfa: false,
            rate_limited: false,
            metadata: serde_json::Value::Null,
        },
        cancel.clone(),
    );

    let handle = scheduler.handle();
    let run = tokio::spawn(async move { scheduler.run().await });

    tokio::time::timeout(Duration::from_secs(2), async {
        while datastore.results().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("expected both attempts to be persisted");

    let results = datastore.results();
    assert_eq!(results.len(), 2);
    let mut by_password: Vec<_> = results.iter().map(|r| r.password.clone()).collect();
    by_password.sort();
    assert_eq!(by_password, vec!["p1", "p2"]);

    handle.cancel();
    cancel.cancel();
    run.await.unwrap();
    dispatcher.await.unwrap();
}

#[tokio::test]
async fn s2_two_users_one_password_both_persisted() {
    let now = Utc::now() - chrono::Duration::minutes(1);
    let c = campaign(vec!["a", "b"], vec!["p"], now, Duration::from_secs(10), Duration::from_secs(1));

    let store = ScheduleStore::new();
    let task_bus = InMemoryBus::<AuthRequest>::new();
    let result_bus = InMemoryBus::<AuthResponse>::new();
    let datastore = FakeDatastore::new(vec![c.clone()]);

    // Expansion alone (no need to run the full pipeline) proves both
    // waves land on the same scheduled instant.
    let tasks = trident_scheduler::expand_campaign(&c);
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].not_before, tasks[1].not_before);
    let mut users: Vec<_> = tasks.iter().map(|t| t.username.clone()).collect();
    users.sort();
    assert_eq!(users, vec!["a", "b"]);

    let scheduler = Scheduler::new(store, task_bus.clone(), result_bus.clone(), datastore.clone());
    scheduler.submit_campaign(&c).await.unwrap();

    let cancel = CancellationToken::new();
    let dispatcher = spawn_echo_dispatcher(
        task_bus.clone(),
        result_bus.clone(),
        |req, _| AuthResponse {
            campaign_id: req.campaign_id,
            username: req.username.clone(),
            password: req.password.clone(),
            timestamp: Utc::now(),
            ip: "203.0.113.7".into(),
            valid: false,
            locked: false,
            mfa: false,
            rate_limited: false,
            metadata: serde_json::Value::Null,
        },
        cancel.clone(),
    );

    let handle = scheduler.handle();
    let run = tokio::spawn(async move { scheduler.run().await });

    tokio::time::timeout(Duration::from_secs(2), async {
        while datastore.results().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("expected both users' attempts to be persisted");

    handle.cancel();
    cancel.cancel();
    run.await.unwrap();
    dispatcher.await.unwrap();
}

#[tokio::test]
async fn s3_window_truncation_drops_late_passwords() {
    let now = Utc::now();
    // 1.5s window, 1s interval, three passwords: only p1@T and p2@T+1s fit.
    let c = campaign(
        vec!["a"],
        vec!["p1", "p2", "p3"],
        now,
        Duration::from_millis(1500),
        Duration::from_secs(1),
    );

    let tasks = trident_scheduler::expand_campaign(&c);
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().any(|t| t.password == "p1"));
    assert!(tasks.iter().any(|t| t.password == "p2"));
    assert!(tasks.iter().all(|t| t.password != "p3"));
}

#[tokio::test]
async fn s4_locked_out_result_is_batched_not_synchronous() {
    let now = Utc::now() - chrono::Duration::minutes(1);
    let c = campaign(vec!["a"], vec!["p1"], now, Duration::from_secs(10), Duration::from_secs(1));

    let store = ScheduleStore::new();
    let task_bus = InMemoryBus::<AuthRequest>::new();
    let result_bus = InMemoryBus::<AuthResponse>::new();
    let datastore = FakeDatastore::new(vec![c.clone()]);

    let scheduler = Scheduler::new(store, task_bus.clone(), result_bus.clone(), datastore.clone());
    scheduler.submit_campaign(&c).await.unwrap();

    let cancel = CancellationToken::new();
    let dispatcher = spawn_echo_dispatcher(
        task_bus.clone(),
        result_bus.clone(),
        |req, _attempt| AuthResponse {
            campaign_id: req.campaign_id,
            username: req.username.clone(),
            password: req.password.clone(),
            timestamp: Utc::now(),
            ip: "203.0.113.7".into(),
            valid: false,
            locked: true,
            mfa: false,
            rate_limited: false,
            metadata: serde_json::Value::Null,
        },
        cancel.clone(),
    );

    let handle = scheduler.handle();
    let run = tokio::spawn(async move { scheduler.run().await });

    tokio::time::timeout(Duration::from_secs(2), async {
        while datastore.results().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("expected the locked attempt to be persisted");

    let results = datastore.results();
    assert_eq!(results.len(), 1);
    assert!(results[0].locked);
    assert!(!results[0].valid);

    handle.cancel();
    cancel.cancel();
    run.await.unwrap();
    dispatcher.await.unwrap();
}

#[tokio::test]
async fn s5_valid_credential_persists_before_any_batch_flush() {
    let now = Utc::now() - chrono::Duration::minutes(1);
    let c = campaign(vec!["a"], vec!["hunter2"], now, Duration::from_secs(10), Duration::from_secs(1));

    let store = ScheduleStore::new();
    let task_bus = InMemoryBus::<AuthRequest>::new();
    let result_bus = InMemoryBus::<AuthResponse>::new();
    let datastore = FakeDatastore::new(vec![c.clone()]);

    let scheduler = Scheduler::new(store, task_bus.clone(), result_bus.clone(), datastore.clone());
    scheduler.submit_campaign(&c).await.unwrap();

    let cancel = CancellationToken::new();
    let dispatcher = spawn_echo_dispatcher(
        task_bus.clone(),
        result_bus.clone(),
        |req, _attempt| AuthResponse {
            campaign_id: req.campaign_id,
            username: req.username.clone(),
            password: req.password.clone(),
            timestamp: Utc::now(),
            ip: "203.0.113.7".into(),
            valid: true,
            locked: false,
            mfa: false,
            rate_limited: false,
            metadata: serde_json::Value::Null,
        },
        cancel.clone(),
    );

    let handle = scheduler.handle();
    let run = tokio::spawn(async move { scheduler.run().await });

    // Well under the batcher's 3s flush deadline.
    tokio::time::timeout(Duration::from_millis(500), async {
        while datastore.results().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("a valid credential must be visible long before any batch flush");

    assert!(datastore.results()[0].valid);

    handle.cancel();
    cancel.cancel();
    run.await.unwrap();
    dispatcher.await.unwrap();
}

#[tokio::test]
async fn s6_paused_campaign_releases_nothing_until_resumed() {
    let now = Utc::now() - chrono::Duration::minutes(1);
    let paused = campaign(vec!["a"], vec!["p"], now, Duration::from_secs(10), Duration::from_secs(1));
    let unaffected = campaign(vec!["b"], vec!["p"], now, Duration::from_secs(10), Duration::from_secs(1));

    let store = ScheduleStore::new();
    let task_bus = InMemoryBus::<AuthRequest>::new();
    let result_bus = InMemoryBus::<AuthResponse>::new();
    let datastore = FakeDatastore::new(vec![paused.clone(), unaffected.clone()]);

    let scheduler = Scheduler::new(store, task_bus.clone(), result_bus.clone(), datastore.clone());
    scheduler.submit_campaign(&paused).await.unwrap();
    scheduler.submit_campaign(&unaffected).await.unwrap();
    scheduler.pause_campaign(paused.id).await.unwrap();

    let releases = Arc::new(AtomicUsize::new(0));
    let releases_for_task = releases.clone();
    let cancel = CancellationToken::new();
    let dispatcher = spawn_echo_dispatcher(
        task_bus.clone(),
        result_bus.clone(),
        move |req, _| {
            releases_for_task.fetch_add(1, Ordering::SeqCst);
            AuthResponse {
                campaign_id: req.campaign_id,
                username: req.username.clone(),
                password: req.password.clone(),
                timestamp: Utc::now(),
                ip: "203.0.113.7".into(),
                valid: false,
                locked: false,
                mfa: false,
                rate_limited: false,
                metadata: serde_json::Value::Null,
            }
        },
        cancel.clone(),
    );

    let handle = scheduler.handle();
    let run = tokio::spawn(async move { scheduler.run().await });

    // Only the unaffected campaign's single task should ever release.
    tokio::time::timeout(Duration::from_millis(500), async {
        while releases.load(Ordering::SeqCst) < 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("unaffected campaign must still release");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(releases.load(Ordering::SeqCst), 1, "paused campaign must not release");

    handle.cancel();
    cancel.cancel();
    run.await.unwrap();
    dispatcher.await.unwrap();
}
