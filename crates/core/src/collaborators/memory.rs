use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    CollaboratorError, DetailStore, EmailMessageId, EmailSender, MessageId, MessageQueue,
    OutgoingEmail, ReceiptHandle, ReceivedMessage, SearchIndex,
};
use crate::domain::restaurant::{Restaurant, RestaurantId};

const POLL_STEP: Duration = Duration::from_millis(10);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Scripted failures consumed one per call before the double behaves normally.
#[derive(Default)]
struct FailureScript {
    queued: VecDeque<CollaboratorError>,
    persistent: Option<CollaboratorError>,
}

impl FailureScript {
    fn next(&mut self) -> Option<CollaboratorError> {
        self.queued.pop_front().or_else(|| self.persistent.clone())
    }
}

#[derive(Clone, Debug)]
struct QueueEntry {
    message_id: MessageId,
    body: String,
    receipt_handle: Option<ReceiptHandle>,
    invisible_until: Option<Instant>,
    receive_count: u32,
}

#[derive(Default)]
struct QueueState {
    entries: Vec<QueueEntry>,
    deleted: Vec<MessageId>,
    send_failures: FailureScript,
    delete_failures: FailureScript,
}

/// Process-local queue honouring visibility timeouts.
#[derive(Clone)]
pub struct InMemoryMessageQueue {
    state: Arc<Mutex<QueueState>>,
    visibility_timeout: Duration,
}

impl Default for InMemoryMessageQueue {
    fn default() -> Self {
        Self::with_visibility_timeout(Duration::from_secs(30))
    }
}

impl InMemoryMessageQueue {
    pub fn with_visibility_timeout(visibility_timeout: Duration) -> Self {
        Self { state: Arc::default(), visibility_timeout }
    }

    /// Enqueues a raw body without going through `send`, for seeding malformed messages.
    pub fn push_raw(&self, body: impl Into<String>) -> MessageId {
        let message_id = MessageId(Uuid::new_v4().to_string());
        lock(&self.state).entries.push(QueueEntry {
            message_id: message_id.clone(),
            body: body.into(),
            receipt_handle: None,
            invisible_until: None,
            receive_count: 0,
        });
        message_id
    }

    pub fn fail_sends_with(&self, error: CollaboratorError) {
        lock(&self.state).send_failures.persistent = Some(error);
    }

    pub fn fail_next_delete_with(&self, error: CollaboratorError) {
        lock(&self.state).delete_failures.queued.push_back(error);
    }

    /// Messages still owned by the queue, visible or in flight.
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bodies(&self) -> Vec<String> {
        lock(&self.state).entries.iter().map(|entry| entry.body.clone()).collect()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        lock(&self.state).deleted.clone()
    }

    fn try_receive(&self) -> Option<ReceivedMessage> {
        let now = Instant::now();
        let mut state = lock(&self.state);
        let entry = state
            .entries
            .iter_mut()
            .find(|entry| entry.invisible_until.map(|until| until <= now).unwrap_or(true))?;

        let receipt_handle = ReceiptHandle(Uuid::new_v4().to_string());
        entry.receipt_handle = Some(receipt_handle.clone());
        entry.invisible_until = Some(now + self.visibility_timeout);
        entry.receive_count += 1;

        Some(ReceivedMessage {
            message_id: entry.message_id.clone(),
            receipt_handle,
            body: entry.body.clone(),
            receive_count: entry.receive_count,
        })
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn send(&self, body: String) -> Result<MessageId, CollaboratorError> {
        if let Some(error) = lock(&self.state).send_failures.next() {
            return Err(error);
        }
        Ok(self.push_raw(body))
    }

    async fn receive(&self, wait: Duration) -> Result<Option<ReceivedMessage>, CollaboratorError> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(message) = self.try_receive() {
                return Ok(Some(message));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_STEP.min(deadline - now)).await;
        }
    }

    async fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<(), CollaboratorError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.delete_failures.next() {
            return Err(error);
        }

        let position = state
            .entries
            .iter()
            .position(|entry| entry.receipt_handle.as_ref() == Some(receipt_handle))
            .ok_or_else(|| {
                CollaboratorError::NotFound(format!("receipt handle `{}`", receipt_handle.0))
            })?;
        let entry = state.entries.remove(position);
        state.deleted.push(entry.message_id);
        Ok(())
    }
}

#[derive(Default)]
struct SearchState {
    by_cuisine: HashMap<String, Vec<RestaurantId>>,
    failures: FailureScript,
    calls: usize,
}

/// Cuisine index keyed case-insensitively; preserves insertion order as ranking.
#[derive(Clone, Default)]
pub struct InMemorySearchIndex {
    state: Arc<Mutex<SearchState>>,
}

impl InMemorySearchIndex {
    pub fn insert(&self, cuisine: &str, ids: impl IntoIterator<Item = impl Into<String>>) {
        let mut state = lock(&self.state);
        state
            .by_cuisine
            .entry(cuisine.to_ascii_lowercase())
            .or_default()
            .extend(ids.into_iter().map(|id| RestaurantId(id.into())));
    }

    pub fn fail_with(&self, error: CollaboratorError) {
        lock(&self.state).failures.persistent = Some(error);
    }

    pub fn fail_next_with(&self, error: CollaboratorError) {
        lock(&self.state).failures.queued.push_back(error);
    }

    pub fn calls(&self) -> usize {
        lock(&self.state).calls
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn search_by_cuisine(
        &self,
        cuisine: &str,
        size: usize,
    ) -> Result<Vec<RestaurantId>, CollaboratorError> {
        let mut state = lock(&self.state);
        state.calls += 1;
        if let Some(error) = state.failures.next() {
            return Err(error);
        }

        Ok(state
            .by_cuisine
            .get(&cuisine.to_ascii_lowercase())
            .map(|ids| ids.iter().take(size).cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct DetailState {
    records: HashMap<RestaurantId, Restaurant>,
    failures: FailureScript,
}

#[derive(Clone, Default)]
pub struct InMemoryDetailStore {
    state: Arc<Mutex<DetailState>>,
}

impl InMemoryDetailStore {
    pub fn insert(&self, restaurant: Restaurant) {
        lock(&self.state).records.insert(restaurant.id.clone(), restaurant);
    }

    pub fn fail_with(&self, error: CollaboratorError) {
        lock(&self.state).failures.persistent = Some(error);
    }

    pub fn fail_next_with(&self, error: CollaboratorError) {
        lock(&self.state).failures.queued.push_back(error);
    }
}

#[async_trait]
impl DetailStore for InMemoryDetailStore {
    async fn get(&self, id: &RestaurantId) -> Result<Option<Restaurant>, CollaboratorError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.failures.next() {
            return Err(error);
        }
        Ok(state.records.get(id).cloned())
    }
}

#[derive(Default)]
struct EmailState {
    sent: Vec<OutgoingEmail>,
    failures: FailureScript,
}

/// Email sender that records every accepted message instead of delivering it.
#[derive(Clone, Default)]
pub struct RecordingEmailSender {
    state: Arc<Mutex<EmailState>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        lock(&self.state).sent.clone()
    }

    pub fn fail_with(&self, error: CollaboratorError) {
        lock(&self.state).failures.persistent = Some(error);
    }

    pub fn fail_next_with(&self, error: CollaboratorError) {
        lock(&self.state).failures.queued.push_back(error);
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<EmailMessageId, CollaboratorError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.failures.next() {
            return Err(error);
        }
        state.sent.push(email.clone());
        Ok(EmailMessageId(format!("recorded-{}", state.sent.len())))
    }
}
