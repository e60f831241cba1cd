//! Group buffer: debounces album messages into one batch per group key.
//!
//! Every arrival for a key aborts that key's timer and schedules a new one, so
//! a batch fires `delay` after its *last* message. When a timer fires it
//! removes the pending group under the lock and hands it to the
//! [`BatchHandler`] exactly once. [`GroupBuffer::flush`] also waits for
//! batches whose timer already fired and that are still being handled.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use archiver_core::{ChatMessage, GroupKey};

/// Receives a completed batch. Implemented by the batch processor.
#[async_trait]
pub trait BatchHandler: Send + Sync + 'static {
    async fn handle_batch(&self, key: GroupKey, batch: Vec<ChatMessage>) -> Result<()>;
}

/// Messages waiting for their group's timer.
struct PendingGroup {
    messages: Vec<ChatMessage>,
    /// Identifies the timer currently allowed to fire this group.
    generation: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct BufferState {
    groups: HashMap<GroupKey, PendingGroup>,
    next_generation: u64,
}

struct Inner {
    delay: Duration,
    handler: Arc<dyn BatchHandler>,
    state: Mutex<BufferState>,
    /// Batches taken by a timer and not yet handled.
    in_flight: TaskTracker,
}

/// Per-key debounce buffer. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct GroupBuffer {
    inner: Arc<Inner>,
}

impl GroupBuffer {
    pub fn new(delay: Duration, handler: Arc<dyn BatchHandler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay,
                handler,
                state: Mutex::new(BufferState::default()),
                in_flight: TaskTracker::new(),
            }),
        }
    }

    /// Buffer `message` under its group key and restart that key's timer.
    pub async fn add(&self, message: ChatMessage) {
        let key = message.group_key();
        let mut state = self.inner.state.lock().await;

        state.next_generation += 1;
        let generation = state.next_generation;
        let timer = self.schedule(key.clone(), generation);

        match state.groups.entry(key) {
            Entry::Occupied(mut entry) => {
                let group = entry.get_mut();
                group.timer.abort();
                group.messages.push(message);
                group.generation = generation;
                group.timer = timer;
                debug!(
                    group = %entry.key(),
                    buffered = entry.get().messages.len(),
                    "Rescheduled group timer"
                );
            }
            Entry::Vacant(entry) => {
                debug!(group = %entry.key(), "Started new group");
                entry.insert(PendingGroup {
                    messages: vec![message],
                    generation,
                    timer,
                });
            }
        }
    }

    /// Number of groups waiting for their timer.
    pub async fn pending_groups(&self) -> usize {
        self.inner.state.lock().await.groups.len()
    }

    /// Fire every pending group now, without waiting for its timer, then
    /// wait for batches already being handled.
    pub async fn flush(&self) {
        let drained: Vec<(GroupKey, Vec<ChatMessage>)> = {
            let mut state = self.inner.state.lock().await;
            state
                .groups
                .drain()
                .map(|(key, group)| {
                    group.timer.abort();
                    (key, group.messages)
                })
                .collect()
        };

        if !drained.is_empty() {
            info!(groups = drained.len(), "Flushing pending groups");
        }
        for (key, batch) in drained {
            self.inner.process(key, batch).await;
        }

        let in_flight = &self.inner.in_flight;
        if !in_flight.is_empty() {
            info!(batches = in_flight.len(), "Waiting for batches in progress");
        }
        in_flight.close();
        in_flight.wait().await;
        in_flight.reopen();
    }

    fn schedule(&self, key: GroupKey, generation: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            if let Some((batch, _token)) = inner.take(&key, generation).await {
                inner.process(key, batch).await;
            }
        })
    }
}

impl Inner {
    /// Remove and return the group if `generation` still owns it, with an
    /// in-flight token taken under the same lock so `flush` cannot miss it.
    ///
    /// A timer that lost a race with a reschedule finds a newer generation
    /// and leaves the group alone.
    async fn take(&self, key: &GroupKey, generation: u64) -> Option<(Vec<ChatMessage>, TaskTrackerToken)> {
        let mut state = self.state.lock().await;
        match state.groups.get(key) {
            Some(group) if group.generation == generation => state
                .groups
                .remove(key)
                .map(|group| (group.messages, self.in_flight.token())),
            _ => None,
        }
    }

    async fn process(&self, key: GroupKey, batch: Vec<ChatMessage>) {
        debug!(group = %key, messages = batch.len(), "Group timer fired");
        if let Err(e) = self.handler.handle_batch(key.clone(), batch).await {
            error!(group = %key, error = %format!("{e:#}"), "Batch processing failed");
        }
    }
}
