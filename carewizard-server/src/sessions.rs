//! In-memory wizard sessions. Each session sits behind its own mutex so
//! that a submission can release it during the backend call.
//!
//! Sessions expire after a period without requests. A confirmed patient
//! registration stays around so its booking session can be started, and is
//! linked to that booking session once it exists.

use carewizard_core::Wizard;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<Wizard>>;

/// Default idle lifetime: 30 minutes
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry {
    wizard: SharedSession,
    touched: Instant,
    /// Booking session started from this registration.
    follow_up: Option<Uuid>,
}

impl Entry {
    fn new(wizard: Wizard) -> Self {
        Self {
            wizard: Arc::new(Mutex::new(wizard)),
            touched: Instant::now(),
            follow_up: None,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.touched.elapsed() > ttl
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn insert(&self, wizard: Wizard) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        self.sweep_locked(&mut sessions);
        sessions.insert(id, Entry::new(wizard));
        id
    }

    /// Insert a booking session and link it to the registration it follows.
    /// Returns `None` when the registration session is gone.
    pub async fn insert_follow_up(&self, origin: &Uuid, wizard: Wizard) -> Option<Uuid> {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        self.sweep_locked(&mut sessions);
        let entry = sessions.get_mut(origin)?;
        entry.follow_up = Some(id);
        entry.touched = Instant::now();
        sessions.insert(id, Entry::new(wizard));
        Some(id)
    }

    /// Look up a live session and refresh its idle timer.
    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        if sessions.get(id)?.is_expired(self.ttl) {
            sessions.remove(id);
            return None;
        }
        let entry = sessions.get_mut(id)?;
        entry.touched = Instant::now();
        Some(entry.wizard.clone())
    }

    /// Booking session already started from this registration, if still live.
    pub async fn follow_up(&self, id: &Uuid) -> Option<(Uuid, SharedSession)> {
        let follow_up = self.sessions.read().await.get(id)?.follow_up?;
        let session = self.get(&follow_up).await?;
        Some((follow_up, session))
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop a session after its final submission, together with the
    /// registration it was started from.
    pub async fn discard(&self, id: &Uuid) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        sessions.retain(|_, entry| entry.follow_up != Some(*id));
    }

    /// Remove every expired session. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.sweep_locked(&mut sessions)
    }

    fn sweep_locked(&self, sessions: &mut HashMap<Uuid, Entry>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(self.ttl));
        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = sessions.len(), "Expired wizard sessions dropped");
        }
        dropped
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
