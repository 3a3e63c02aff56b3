//! Session store: at most one active session per technician.
//!
//! The map lock covers only insert, lookup, and removal. Each session sits
//! behind its own lock, which the caller holds for the whole handling of one
//! inbound event, so one owner's events are processed one at a time while
//! different owners proceed in parallel. Sessions in the map are active;
//! removal is the only way a session ends.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::model::{ChatId, Session, SessionState, UserId};

/// Shared handle to one owner's session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Returned when a session is requested while one is already active.
#[derive(Debug)]
pub struct CollisionNotice {
    /// The existing session.
    pub handle: SessionHandle,
    /// What the existing session is waiting on.
    pub pending: SessionState,
}

/// Result of [`SessionStore::begin_session`].
#[derive(Debug)]
pub enum Begin {
    Started(SessionHandle),
    Collision(CollisionNotice),
}

/// Process-wide map from owner to their active session. Not persisted.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for `owner`, unless one is already active.
    ///
    /// Never creates a second session: an active one is reported back
    /// as a [`CollisionNotice`] and left untouched.
    pub fn begin_session(&self, owner: UserId, chat: ChatId) -> Begin {
        let existing = {
            let mut sessions = self.sessions.lock();
            match sessions.get(&owner) {
                Some(handle) => Arc::clone(handle),
                None => {
                    let session = Session::new(owner, chat);
                    info!(%owner, record_id = %session.record_id, "session started");
                    let handle = Arc::new(Mutex::new(session));
                    sessions.insert(owner, Arc::clone(&handle));
                    return Begin::Started(handle);
                }
            }
        };

        // Map lock is released here; never hold both.
        let pending = existing.lock().state;
        Begin::Collision(CollisionNotice {
            handle: existing,
            pending,
        })
    }

    /// The owner's session, if any.
    pub fn get(&self, owner: UserId) -> Option<SessionHandle> {
        self.sessions.lock().get(&owner).cloned()
    }

    /// Removes the owner's session. Called on save and on cancel.
    ///
    /// Does not lock the session; the caller may be holding it.
    pub fn destroy(&self, owner: UserId) -> Option<SessionHandle> {
        let removed = self.sessions.lock().remove(&owner);
        if removed.is_some() {
            info!(%owner, "session destroyed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
