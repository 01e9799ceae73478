//! Host binding contract shared by every widget instance.
//!
//! A widget never talks to the authoritative store directly. It holds a
//! [`HostBinding`] (in practice a [`ModelHandle`]) that keeps a local mirror of
//! the keys it cares about, queues writes in memory, flushes them on
//! [`HostBinding::commit`] and receives change notifications from other
//! instances through [`HostBinding::poll_changes`].

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};

pub use serde_json::Value;

const HOST_INSTANCE: u64 = 0;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BindingError {
    #[error("store is unavailable")]
    StoreUnavailable,
    #[error("unknown subscription {0}")]
    UnknownSubscription(u64),
    #[error("change queue disconnected")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A committed change to one key, as seen by a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub key: String,
    pub value: Value,
    pub revision: u64,
}

pub trait HostBinding {
    /// Local view of `key`: the latest queued write, else the last known store value.
    fn read(&self, key: &str) -> Option<Value>;
    /// Queues a write. Nothing leaves the instance until [`HostBinding::commit`].
    fn write(&mut self, key: &str, value: Value);
    fn subscribe(&mut self, key: &str) -> Result<SubscriptionId, BindingError>;
    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), BindingError>;
    fn unsubscribe_all(&mut self) -> Result<(), BindingError>;
    /// Flushes queued writes to the authoritative store and returns how many
    /// keys changed there. Returns 0 when the store defers application.
    fn commit(&mut self) -> Result<usize, BindingError>;
    /// Drains notifications for subscribed keys committed by other instances.
    fn poll_changes(&mut self) -> Result<Vec<Change>, BindingError>;

    fn read_f64(&self, key: &str) -> Option<f64> {
        self.read(key).and_then(|value| value.as_f64())
    }

    fn read_bool(&self, key: &str) -> Option<bool> {
        self.read(key).and_then(|value| value.as_bool())
    }
}

/// How the store applies commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    #[default]
    Immediate,
    /// Commits are queued until [`SharedStore::flush`], like an asynchronous save.
    Deferred,
}

enum Message {
    Remote(Change),
    Ack { key: String, revision: u64 },
}

struct Entry {
    value: Value,
    revision: u64,
}

struct Subscriber {
    instance: u64,
    key: String,
    sender: Sender<Message>,
}

struct PendingCommit {
    instance: u64,
    writes: Vec<(String, Value)>,
}

enum Submitted {
    Applied {
        acks: Vec<(String, u64)>,
        changed: usize,
    },
    Queued,
}

struct StoreState {
    mode: DeliveryMode,
    entries: HashMap<String, Entry>,
    revision: u64,
    subscribers: HashMap<u64, Subscriber>,
    instances: HashMap<u64, Sender<Message>>,
    next_subscription: u64,
    next_instance: u64,
    deferred: VecDeque<PendingCommit>,
    commits: u64,
}

impl StoreState {
    fn new(mode: DeliveryMode) -> Self {
        Self {
            mode,
            entries: HashMap::new(),
            revision: 0,
            subscribers: HashMap::new(),
            instances: HashMap::new(),
            next_subscription: 1,
            next_instance: HOST_INSTANCE + 1,
            deferred: VecDeque::new(),
            commits: 0,
        }
    }

    /// Applies writes in order. Returns the per-key acknowledgement revisions and
    /// the number of keys whose stored value changed.
    fn apply(&mut self, commit: PendingCommit) -> (Vec<(String, u64)>, usize) {
        let mut touched: Vec<String> = Vec::new();
        let mut changed: Vec<String> = Vec::new();
        for (key, value) in commit.writes {
            if !touched.contains(&key) {
                touched.push(key.clone());
            }
            let unchanged = self
                .entries
                .get(&key)
                .map(|entry| entry.value == value)
                .unwrap_or(false);
            if unchanged {
                continue;
            }
            self.revision += 1;
            self.entries.insert(
                key.clone(),
                Entry {
                    value,
                    revision: self.revision,
                },
            );
            if !changed.contains(&key) {
                changed.push(key);
            }
        }
        if !changed.is_empty() {
            self.commits += 1;
        }

        for key in &changed {
            let Some(entry) = self.entries.get(key) else {
                continue;
            };
            let mut notified: Vec<u64> = Vec::new();
            for subscriber in self.subscribers.values() {
                if subscriber.key != *key
                    || subscriber.instance == commit.instance
                    || notified.contains(&subscriber.instance)
                {
                    continue;
                }
                notified.push(subscriber.instance);
                let change = Change {
                    key: key.clone(),
                    value: entry.value.clone(),
                    revision: entry.revision,
                };
                if subscriber.sender.send(Message::Remote(change)).is_err() {
                    log::debug!(
                        "dropping notification for '{key}': instance {} is gone",
                        subscriber.instance
                    );
                }
            }
        }

        let acks = touched
            .into_iter()
            .map(|key| {
                let revision = self.entries.get(&key).map(|e| e.revision).unwrap_or(0);
                (key, revision)
            })
            .collect();
        (acks, changed.len())
    }
}

/// The single authoritative copy of widget state.
///
/// Cloning yields another handle onto the same store.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<StoreState>>,
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStore {
    pub fn new() -> Self {
        Self::with_mode(DeliveryMode::Immediate)
    }

    pub fn with_mode(mode: DeliveryMode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreState::new(mode))),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, BindingError> {
        self.inner.lock().map_err(|_| BindingError::StoreUnavailable)
    }

    /// Host-side write. Applied immediately and announced to every subscriber.
    pub fn set(&self, key: &str, value: Value) -> Result<bool, BindingError> {
        let mut state = self.lock()?;
        let (_, changed) = state.apply(PendingCommit {
            instance: HOST_INSTANCE,
            writes: vec![(key.to_string(), value)],
        });
        Ok(changed > 0)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let state = self.lock().ok()?;
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn connect(&self) -> Result<ModelHandle, BindingError> {
        let (sender, receiver) = mpsc::channel();
        let mut state = self.lock()?;
        let instance = state.next_instance;
        state.next_instance += 1;
        state.instances.insert(instance, sender.clone());
        let mirror = state
            .entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    Mirrored {
                        value: entry.value.clone(),
                        revision: entry.revision,
                    },
                )
            })
            .collect();
        drop(state);
        Ok(ModelHandle {
            instance,
            store: self.clone(),
            mirror,
            pending: Vec::new(),
            in_flight: HashMap::new(),
            subscriptions: Vec::new(),
            sender,
            receiver,
        })
    }

    /// Applies every deferred commit in submission order. Returns how many were applied.
    pub fn flush(&self) -> Result<usize, BindingError> {
        let mut state = self.lock()?;
        let mut applied = 0;
        while let Some(commit) = state.deferred.pop_front() {
            let instance = commit.instance;
            let (acks, _) = state.apply(commit);
            if let Some(sender) = state.instances.get(&instance) {
                for (key, revision) in acks {
                    let _ = sender.send(Message::Ack { key, revision });
                }
            }
            applied += 1;
        }
        Ok(applied)
    }

    /// Number of applied commits that changed at least one key.
    pub fn commit_count(&self) -> u64 {
        self.lock().map(|state| state.commits).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().map(|state| state.subscribers.len()).unwrap_or(0)
    }

    pub fn pending_commits(&self) -> usize {
        self.lock().map(|state| state.deferred.len()).unwrap_or(0)
    }

    pub fn revision(&self) -> u64 {
        self.lock().map(|state| state.revision).unwrap_or(0)
    }

    fn submit(&self, instance: u64, writes: Vec<(String, Value)>) -> Result<Submitted, BindingError> {
        let mut state = self.lock()?;
        let commit = PendingCommit { instance, writes };
        match state.mode {
            DeliveryMode::Immediate => {
                let (acks, changed) = state.apply(commit);
                Ok(Submitted::Applied { acks, changed })
            }
            DeliveryMode::Deferred => {
                state.deferred.push_back(commit);
                Ok(Submitted::Queued)
            }
        }
    }

    fn register(
        &self,
        instance: u64,
        key: &str,
        sender: Sender<Message>,
    ) -> Result<SubscriptionId, BindingError> {
        let mut state = self.lock()?;
        let id = state.next_subscription;
        state.next_subscription += 1;
        state.subscribers.insert(
            id,
            Subscriber {
                instance,
                key: key.to_string(),
                sender,
            },
        );
        Ok(SubscriptionId(id))
    }

    fn deregister(&self, id: SubscriptionId) -> Result<(), BindingError> {
        let mut state = self.lock()?;
        state
            .subscribers
            .remove(&id.0)
            .map(|_| ())
            .ok_or(BindingError::UnknownSubscription(id.0))
    }

    fn disconnect(&self, instance: u64) {
        if let Ok(mut state) = self.lock() {
            state.instances.remove(&instance);
            state.subscribers.retain(|_, sub| sub.instance != instance);
        }
    }
}

struct Mirrored {
    value: Value,
    revision: u64,
}

/// One widget instance's connection to a [`SharedStore`].
pub struct ModelHandle {
    instance: u64,
    store: SharedStore,
    mirror: HashMap<String, Mirrored>,
    pending: Vec<(String, Value)>,
    in_flight: HashMap<String, usize>,
    subscriptions: Vec<SubscriptionId>,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
}

impl ModelHandle {
    pub fn instance_id(&self) -> u64 {
        self.instance
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty()
    }

    fn acknowledge(&mut self, key: &str, revision: u64) {
        if let Some(mirrored) = self.mirror.get_mut(key) {
            mirrored.revision = mirrored.revision.max(revision);
        }
        if let Some(count) = self.in_flight.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(key);
            }
        }
    }
}

impl HostBinding for ModelHandle {
    fn read(&self, key: &str) -> Option<Value> {
        self.pending
            .iter()
            .rev()
            .find(|(pending_key, _)| pending_key == key)
            .map(|(_, value)| value.clone())
            .or_else(|| self.mirror.get(key).map(|m| m.value.clone()))
    }

    fn write(&mut self, key: &str, value: Value) {
        self.pending.push((key.to_string(), value));
    }

    fn subscribe(&mut self, key: &str) -> Result<SubscriptionId, BindingError> {
        let id = self.store.register(self.instance, key, self.sender.clone())?;
        self.subscriptions.push(id);
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), BindingError> {
        let Some(pos) = self.subscriptions.iter().position(|sub| *sub == id) else {
            return Err(BindingError::UnknownSubscription(id.0));
        };
        self.subscriptions.remove(pos);
        self.store.deregister(id)
    }

    fn unsubscribe_all(&mut self) -> Result<(), BindingError> {
        for id in std::mem::take(&mut self.subscriptions) {
            self.store.deregister(id)?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<usize, BindingError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let writes = std::mem::take(&mut self.pending);
        let mut keys: Vec<&str> = Vec::new();
        for (key, value) in &writes {
            let revision = self.mirror.get(key.as_str()).map(|m| m.revision).unwrap_or(0);
            self.mirror.insert(
                key.clone(),
                Mirrored {
                    value: value.clone(),
                    revision,
                },
            );
            if !keys.contains(&key.as_str()) {
                keys.push(key.as_str());
            }
        }
        for key in keys {
            *self.in_flight.entry(key.to_string()).or_insert(0) += 1;
        }

        match self.store.submit(self.instance, writes)? {
            Submitted::Applied { acks, changed } => {
                for (key, revision) in acks {
                    self.acknowledge(&key, revision);
                }
                Ok(changed)
            }
            Submitted::Queued => Ok(0),
        }
    }

    fn poll_changes(&mut self) -> Result<Vec<Change>, BindingError> {
        let mut changes = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(Message::Ack { key, revision }) => self.acknowledge(&key, revision),
                Ok(Message::Remote(change)) => {
                    if self.in_flight.contains_key(&change.key) {
                        log::debug!(
                            "instance {}: ignoring '{}' r{} while a local write is in flight",
                            self.instance,
                            change.key,
                            change.revision
                        );
                        continue;
                    }
                    let known = self
                        .mirror
                        .get(&change.key)
                        .map(|m| m.revision)
                        .unwrap_or(0);
                    if change.revision <= known {
                        log::debug!(
                            "instance {}: dropping stale '{}' r{} (known r{known})",
                            self.instance,
                            change.key,
                            change.revision
                        );
                        continue;
                    }
                    self.mirror.insert(
                        change.key.clone(),
                        Mirrored {
                            value: change.value.clone(),
                            revision: change.revision,
                        },
                    );
                    changes.push(change);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(BindingError::Disconnected),
            }
        }
        Ok(changes)
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        self.subscriptions.clear();
        self.store.disconnect(self.instance);
    }
}
