//! Per-campaign priority queue of scheduled [`Task`]s.
//!
//! Logically a family of min-heaps, one per campaign, keyed by
//! `not_before`. This crate is the in-memory default implementation of
//! the schedule store contract; it holds no cross-process state, so
//! crash durability across an orchestrator restart is provided one layer
//! up (the scheduler re-expands each `Active` campaign's remaining tasks
//! from the campaign definition on startup) rather than by persisting
//! this heap to disk. Within a single process lifetime, a task that is
//! popped but not successfully handed to the task bus must be re-pushed
//! by the caller — `pop_min_blocking` itself never loses a task it
//! successfully returns.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Notify;
use uuid::Uuid;

use trident_types::Task;

/// A task's score is its `not_before`, as nanoseconds since the Unix
/// epoch — a monotone `i64` as required by the schedule store contract.
pub fn score_of(task: &Task) -> i64 {
    task.not_before.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

struct Entry {
    score: i64,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest score (and,
        // among ties, the earliest-inserted task) comes out first.
        other.score.cmp(&self.score).then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct CampaignQueue {
    heap: StdMutex<BinaryHeap<Entry>>,
    notify: Notify,
}

impl CampaignQueue {
    fn push(&self, entry: Entry) {
        self.heap.lock().expect("schedule store lock poisoned").push(entry);
        self.notify.notify_waiters();
    }

    fn peek(&self) -> Option<(i64, Task)> {
        let heap = self.heap.lock().expect("schedule store lock poisoned");
        heap.peek().map(|e| (e.score, e.task.clone()))
    }

    fn try_pop(&self) -> Option<(i64, Task)> {
        let mut heap = self.heap.lock().expect("schedule store lock poisoned");
        heap.pop().map(|e| (e.score, e.task))
    }

    fn len(&self) -> usize {
        self.heap.lock().expect("schedule store lock poisoned").len()
    }
}

/// The outcome of [`ScheduleStore::pop_min_blocking`].
#[derive(Debug)]
pub enum PopOutcome {
    Task(i64, Task),
    Timeout,
}

/// An in-memory, per-campaign priority queue of [`Task`]s.
///
/// Safe to share across tasks via `Arc`/`Clone`; every method takes `&self`.
#[derive(Clone, Default)]
pub struct ScheduleStore {
    campaigns: std::sync::Arc<DashMap<Uuid, std::sync::Arc<CampaignQueue>>>,
    seq: std::sync::Arc<AtomicU64>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, campaign_id: Uuid) -> std::sync::Arc<CampaignQueue> {
        self.campaigns
            .entry(campaign_id)
            .or_insert_with(|| std::sync::Arc::new(CampaignQueue::default()))
            .clone()
    }

    /// Insert `task` with score `task.not_before`.
    pub fn push(&self, campaign_id: Uuid, task: Task) {
        let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
        let score = score_of(&task);
        self.queue(campaign_id).push(Entry { score, seq, task });
    }

    /// Observe the minimum-scored task without removing it. Non-blocking.
    pub fn peek_min(&self, campaign_id: Uuid) -> Option<(i64, Task)> {
        self.campaigns.get(&campaign_id).and_then(|q| q.peek())
    }

    /// Atomically remove and return the minimum-scored task, blocking up
    /// to `timeout` if the campaign's queue is currently empty.
    pub async fn pop_min_blocking(&self, campaign_id: Uuid, timeout: Duration) -> PopOutcome {
        let queue = self.queue(campaign_id);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some((score, task)) = queue.try_pop() {
                return PopOutcome::Task(score, task);
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return PopOutcome::Timeout;
            }
            // A push between the try_pop above and this wait is still
            // observed: notify_waiters() only wakes already-registered
            // waiters, so register (`notified()`) before re-checking.
            let notified = queue.notify.notified();
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep(remaining) => return PopOutcome::Timeout,
            }
        }
    }

    /// Enumerate campaign ids currently believed to have at least one
    /// task, starting at `cursor` and advancing by at most `chunk` ids.
    ///
    /// This is a bounded, lossy scan (campaigns may be added or drained
    /// concurrently) rather than a full-table dump — a producer calling
    /// this repeatedly with the returned cursor eventually visits every
    /// non-empty campaign, but no single call is guaranteed complete.
    pub fn list_campaigns(&self, cursor: usize, chunk: usize) -> (Vec<Uuid>, usize) {
        let all: Vec<Uuid> = self.campaigns.iter().map(|e| *e.key()).collect();
        if all.is_empty() {
            return (Vec::new(), 0);
        }
        let start = cursor % all.len();
        let mut picked = Vec::with_capacity(chunk.min(all.len()));
        let mut i = start;
        loop {
            if picked.len() >= chunk || picked.len() >= all.len() {
                break;
            }
            let cid = all[i % all.len()];
            if self.size(cid) > 0 {
                picked.push(cid);
            }
            i += 1;
            if i - start >= all.len() {
                break;
            }
        }
        (picked, i % all.len())
    }

    /// Number of tasks currently queued for `campaign_id`.
    pub fn size(&self, campaign_id: Uuid) -> usize {
        self.campaigns.get(&campaign_id).map(|q| q.len()).unwrap_or(0)
    }
}
