//! Per-visitor chat sessions
//!
//! A session owns one transcript, the turn lock that serializes its turns,
//! and a broadcast channel for render events. Sessions live in memory only
//! and are dropped after sitting idle for the configured TTL.

use crate::runtime::SseEvent;
use crate::state_machine::TurnState;
use crate::transcript::{Message, Transcript};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

const BROADCAST_CAPACITY: usize = 256;

/// One visitor's conversation
pub struct Session {
    pub id: Uuid,
    /// Held for the whole duration of a turn
    pub turn: tokio::sync::Mutex<TurnState>,
    transcript: Mutex<Transcript>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    last_seen: Mutex<Instant>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            id,
            turn: tokio::sync::Mutex::new(TurnState::Idle),
            transcript: Mutex::new(Transcript::new()),
            broadcast_tx,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn transcript(&self) -> MutexGuard<'_, Transcript> {
        // A poisoned lock still holds a consistent append-only log
        self.transcript
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn append(&self, message: Message) {
        self.transcript().append(message);
    }

    /// Snapshot of the transcript in display order
    pub fn messages(&self) -> Vec<Message> {
        self.transcript().all().to_vec()
    }

    pub fn message_count(&self) -> usize {
        self.transcript().len()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.transcript().last().cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Send to connected clients; having no listeners is fine
    pub fn broadcast(&self, event: SseEvent) {
        let _ = self.broadcast_tx.send(event);
    }

    pub fn is_busy(&self) -> bool {
        self.turn.try_lock().is_err()
    }

    fn touch(&self) {
        *self
            .last_seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last_seen = *self
            .last_seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        now.saturating_duration_since(last_seen)
    }
}

/// Registry of live sessions keyed by id
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a live session and mark it as recently used
    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id)?;
        session.touch();
        Some(session.clone())
    }

    /// Resume the session named by `id`, or start a fresh one.
    ///
    /// Unknown or expired ids get a new session with a new id, never the
    /// stale one, so a client cannot pick its own id.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> Arc<Session> {
        if let Some(id) = id {
            if let Some(session) = self.get(id).await {
                return session;
            }
        }

        let session = Arc::new(Session::new(Uuid::new_v4()));
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        tracing::info!(session_id = %session.id, "Session created");
        session
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle longer than the TTL. Sessions with a turn in
    /// flight are kept regardless.
    pub async fn sweep_expired(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_busy() || session.idle_for(now) <= self.ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "Expired idle sessions");
        }
        removed
    }

    /// Run `sweep_expired` periodically for the life of the process
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep_expired(Instant::now()).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Role, GREETING};

    #[tokio::test]
    async fn test_new_session_has_greeting() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.get_or_create(None).await;
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].content, GREETING);
    }

    #[tokio::test]
    async fn test_resume_existing_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let first = store.get_or_create(None).await;
        first.append(Message::user("hello"));

        let again = store.get_or_create(Some(first.id)).await;
        assert_eq!(again.id, first.id);
        assert_eq!(again.messages().len(), 2);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_gets_fresh_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let requested = Uuid::new_v4();
        let session = store.get_or_create(Some(requested)).await;
        assert_ne!(session.id, requested);
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.get_or_create(None).await;
        let b = store.get_or_create(None).await;
        a.append(Message::user("only in a"));
        assert_eq!(a.messages().len(), 2);
        assert_eq!(b.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_removes_idle_sessions() {
        let ttl = Duration::from_secs(60);
        let store = SessionStore::new(ttl);
        let session = store.get_or_create(None).await;

        assert_eq!(store.sweep_expired(Instant::now()).await, 0);
        let later = Instant::now() + ttl + Duration::from_secs(1);
        assert_eq!(store.sweep_expired(later).await, 1);
        assert!(store.get(session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_keeps_busy_sessions() {
        let ttl = Duration::from_secs(60);
        let store = SessionStore::new(ttl);
        let session = store.get_or_create(None).await;

        let _turn = session.turn.lock().await;
        let later = Instant::now() + ttl + Duration::from_secs(1);
        assert_eq!(store.sweep_expired(later).await, 0);
        assert_eq!(store.count().await, 1);
    }
}
