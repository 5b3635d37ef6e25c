//! In-memory partitioned message log.
//!
//! Kafka-shaped: a topic split into partitions, records appended to the
//! partition chosen by a stable hash of the key, and consumer groups that each
//! keep one cursor per partition. Records with the same key land in the same
//! partition and are read back in append order.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::application::ports::{
    ConsumeError, EventPublisherPort, EventSourcePort, LogRecord, PublishError,
};

#[derive(Debug, Clone)]
struct Stored {
    key: String,
    payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct LogState {
    partitions: Vec<Vec<Stored>>,
    // group -> next offset per partition
    cursors: HashMap<String, Vec<u64>>,
    closed: bool,
}

/// In-memory message log; publishes through `EventPublisherPort`.
#[derive(Debug)]
pub struct InMemoryMessageLog {
    topic: String,
    state: Mutex<LogState>,
    notify: Notify,
    available: AtomicBool,
}

impl InMemoryMessageLog {
    /// Create a log for `topic` with `partitions` partitions (at least one).
    #[must_use]
    pub fn new(topic: impl Into<String>, partitions: usize) -> Self {
        let partitions = partitions.max(1);
        Self {
            topic: topic.into(),
            state: Mutex::new(LogState {
                partitions: vec![Vec::new(); partitions],
                ..LogState::default()
            }),
            notify: Notify::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Topic name.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of partitions.
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.state.lock().partitions.len()
    }

    /// Partition a key is routed to.
    #[must_use]
    pub fn partition_for(&self, key: &str) -> usize {
        partition_of(key, self.partition_count())
    }

    /// Total number of records across partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().partitions.iter().map(Vec::len).sum()
    }

    /// True if nothing was published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one partition in append order.
    #[must_use]
    pub fn records(&self, partition: usize) -> Vec<LogRecord> {
        let state = self.state.lock();
        state
            .partitions
            .get(partition)
            .map(|records| {
                records
                    .iter()
                    .zip(0u64..)
                    .map(|(stored, offset)| LogRecord {
                        partition,
                        offset,
                        key: stored.key.clone(),
                        payload: stored.payload.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Subscribe a consumer in `group`. Consumers of the same group share
    /// cursors; a new group starts at the beginning of every partition.
    #[must_use]
    pub fn subscribe(self: &Arc<Self>, group: impl Into<String>) -> LogConsumer {
        let group = group.into();
        {
            let mut state = self.state.lock();
            let partitions = state.partitions.len();
            state
                .cursors
                .entry(group.clone())
                .or_insert_with(|| vec![0; partitions]);
        }
        LogConsumer {
            log: Arc::clone(self),
            group,
            next_partition: Mutex::new(0),
        }
    }

    /// Stop accepting appends. Consumers drain what is left, then see the end.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_waiters();
    }

    /// Simulate an outage (`false`) or recovery (`true`) on both sides.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        if available {
            self.notify.notify_waiters();
        }
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisherPort for InMemoryMessageLog {
    async fn publish(&self, partition_key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if !self.is_available() {
            return Err(PublishError::Unavailable {
                message: format!("topic {} is unavailable", self.topic),
            });
        }

        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(PublishError::Closed);
            }
            let partition = partition_of(partition_key, state.partitions.len());
            state.partitions[partition].push(Stored {
                key: partition_key.to_string(),
                payload,
            });
        }
        self.notify.notify_waiters();
        Ok(())
    }
}

/// Consumer-group member reading an `InMemoryMessageLog`.
#[derive(Debug)]
pub struct LogConsumer {
    log: Arc<InMemoryMessageLog>,
    group: String,
    next_partition: Mutex<usize>,
}

impl LogConsumer {
    /// Consumer group name.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Take the next unread record, visiting partitions round-robin.
    fn poll(&self) -> Option<LogRecord> {
        let mut state = self.log.state.lock();
        let LogState {
            partitions,
            cursors,
            ..
        } = &mut *state;
        let cursors = cursors.get_mut(&self.group)?;
        let count = partitions.len();

        let mut next_partition = self.next_partition.lock();
        for step in 0..count {
            let partition = (*next_partition + step) % count;
            let offset = cursors[partition];
            let Ok(index) = usize::try_from(offset) else {
                continue;
            };
            if let Some(stored) = partitions[partition].get(index) {
                cursors[partition] = offset + 1;
                *next_partition = (partition + 1) % count;
                return Some(LogRecord {
                    partition,
                    offset,
                    key: stored.key.clone(),
                    payload: stored.payload.clone(),
                });
            }
        }
        None
    }
}

#[async_trait]
impl EventSourcePort for LogConsumer {
    async fn recv(&self) -> Result<Option<LogRecord>, ConsumeError> {
        loop {
            // Register for wakeups before checking, so an append between the
            // check and the await is not missed.
            let notified = self.log.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.log.is_available() {
                return Err(ConsumeError::Unavailable {
                    message: format!("topic {} is unavailable", self.log.topic),
                });
            }
            if let Some(record) = self.poll() {
                return Ok(Some(record));
            }
            let closed = self.log.state.lock().closed;
            if closed {
                return Ok(None);
            }

            notified.await;
        }
    }
}

/// FNV-1a over the key bytes; stable across processes and releases.
fn partition_of(key: &str, partitions: usize) -> usize {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    let hash = key
        .bytes()
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME));
    let partitions = u64::try_from(partitions.max(1)).unwrap_or(1);
    usize::try_from(hash % partitions).unwrap_or(0)
}
