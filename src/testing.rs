//! In-memory collaborators and capture helpers shared by unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;

use parking_lot::Mutex;

use crate::engine;
use crate::model::{
    ChatId, Coordinates, Event, LedgerRow, MessageId, Session, SessionState, StepKey, UserId,
};
use crate::storage::{self, BlobStore, Ledger, StorageError};
use crate::transport::{self, OutboundMessage, Transport, TransportError};

/// A fresh session with a fixed record id.
pub fn session() -> Session {
    Session::with_record_id(UserId(1), ChatId(1), "a1b2c3d4".into())
}

/// The scenario answer for a step, with the splitter used.
pub fn answer(step: StepKey) -> Event {
    answer_with(step, true)
}

fn answer_with(step: StepKey, splitter: bool) -> Event {
    match step {
        StepKey::Ticket => Event::Text("T-100".into()),
        StepKey::Dni => Event::Text("12345678".into()),
        StepKey::Name => Event::Text("Ana".into()),
        StepKey::ClientLocation => Event::Location(Coordinates {
            latitude: -12.05,
            longitude: -77.03,
        }),
        StepKey::BoxType => Event::Choice("CTO".into()),
        StepKey::BoxCode => Event::Text("CTO-09".into()),
        StepKey::BoxLocation => Event::Location(Coordinates {
            latitude: -12.06,
            longitude: -77.04,
        }),
        StepKey::BoxPhoto | StepKey::SplitterPhoto => Event::Photo(b"\xff\xd8jpeg".to_vec()),
        StepKey::SplitterUse => Event::Choice(if splitter { "SI" } else { "NO" }.into()),
        StepKey::Port => Event::Text("4".into()),
    }
}

/// Submits and confirms scenario answers up to and including `through`.
pub fn capture_through(session: &mut Session, blobs: &dyn BlobStore, through: StepKey) {
    capture(session, blobs, through, true);
}

fn capture(session: &mut Session, blobs: &dyn BlobStore, through: StepKey, splitter: bool) {
    while let SessionState::Awaiting(step) = session.state {
        engine::submit(session, answer_with(step, splitter), blobs).unwrap();
        engine::confirm(session, step).unwrap();
        if step == through {
            return;
        }
    }
    panic!("{through} was never reached, ended in {:?}", session.state);
}

/// A session at the summary, built from the scenario answers. Photos
/// upload as `u1` then `u2`.
pub fn run_scenario(splitter: bool) -> Session {
    let mut s = session();
    let blobs = MemoryBlobs::with_uris(&["u1", "u2"]);
    let last = if splitter {
        StepKey::SplitterPhoto
    } else {
        StepKey::SplitterUse
    };
    capture(&mut s, &blobs, last, splitter);
    assert_eq!(s.state, SessionState::Summary);
    s
}

/// Blob store that keeps names and hands out `mem://` URIs, or queued ones.
#[derive(Default)]
pub struct MemoryBlobs {
    names: Mutex<Vec<String>>,
    uris: Mutex<VecDeque<String>>,
    failing: Mutex<bool>,
}

impl MemoryBlobs {
    pub fn with_uris(uris: &[&str]) -> Self {
        let blobs = Self::default();
        blobs
            .uris
            .lock()
            .extend(uris.iter().map(ToString::to_string));
        blobs
    }

    pub fn fail(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn names(&self) -> Vec<String> {
        self.names.lock().clone()
    }
}

impl BlobStore for MemoryBlobs {
    fn upload(&self, _bytes: &[u8], name: &str) -> storage::Result<String> {
        if *self.failing.lock() {
            return Err(StorageError::Io(io::Error::other("blob store offline")));
        }
        self.names.lock().push(name.to_string());
        Ok(self
            .uris
            .lock()
            .pop_front()
            .unwrap_or_else(|| format!("mem://{name}")))
    }
}

/// Ledger that keeps rows in memory.
#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<LedgerRow>>,
    failing: Mutex<bool>,
}

impl MemoryLedger {
    pub fn fail(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn rows(&self) -> Vec<LedgerRow> {
        self.rows.lock().clone()
    }
}

impl Ledger for MemoryLedger {
    fn append_row(&self, row: &LedgerRow) -> storage::Result<()> {
        if *self.failing.lock() {
            return Err(StorageError::Io(io::Error::other("ledger offline")));
        }
        self.rows.lock().push(row.clone());
        Ok(())
    }
}

/// One delivery seen by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Message {
        chat: ChatId,
        id: MessageId,
        message: OutboundMessage,
    },
    Edit {
        chat: ChatId,
        id: MessageId,
        message: OutboundMessage,
    },
    Photo {
        chat: ChatId,
        uri: String,
        caption: String,
    },
}

#[derive(Default)]
struct Recorded {
    next_id: u64,
    log: Vec<Sent>,
    current: HashMap<MessageId, (ChatId, OutboundMessage)>,
    failing: HashSet<ChatId>,
}

/// Transport that records every delivery. Chats can be set to fail.
#[derive(Default)]
pub struct RecordingTransport {
    inner: Mutex<Recorded>,
}

impl RecordingTransport {
    pub fn fail_chat(&self, chat: ChatId) {
        self.inner.lock().failing.insert(chat);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.inner.lock().log.clone()
    }

    /// Texts of new messages sent to `chat`, in order.
    pub fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { chat: c, message, .. } if c == chat => Some(message.text),
                _ => None,
            })
            .collect()
    }

    /// The most recent message or edit sent to `chat`.
    pub fn last_to(&self, chat: ChatId) -> Option<(MessageId, OutboundMessage)> {
        self.sent().into_iter().rev().find_map(|s| match s {
            Sent::Message { chat: c, id, message } | Sent::Edit { chat: c, id, message }
                if c == chat =>
            {
                Some((id, message))
            }
            _ => None,
        })
    }

    /// The newest message in `chat` that currently shows a button with `token`.
    pub fn button(&self, chat: ChatId, token: &str) -> Option<MessageId> {
        self.inner
            .lock()
            .current
            .iter()
            .filter(|(_, (c, m))| *c == chat && m.flat_buttons().any(|b| b.token == token))
            .map(|(id, _)| *id)
            .max_by_key(|id| id.0)
    }

    fn check(recorded: &Recorded, chat: ChatId) -> transport::Result<()> {
        if recorded.failing.contains(&chat) {
            return Err(TransportError::Delivery(format!("chat {chat} unreachable")));
        }
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn send(&self, chat: ChatId, message: &OutboundMessage) -> transport::Result<MessageId> {
        let mut inner = self.inner.lock();
        Self::check(&inner, chat)?;
        inner.next_id += 1;
        let id = MessageId(inner.next_id);
        inner.current.insert(id, (chat, message.clone()));
        inner.log.push(Sent::Message {
            chat,
            id,
            message: message.clone(),
        });
        Ok(id)
    }

    fn edit(&self, chat: ChatId, id: MessageId, message: &OutboundMessage) -> transport::Result<()> {
        let mut inner = self.inner.lock();
        Self::check(&inner, chat)?;
        if inner.current.get(&id).is_some_and(|(_, m)| m == message) {
            return Err(TransportError::NotModified);
        }
        inner.current.insert(id, (chat, message.clone()));
        inner.log.push(Sent::Edit {
            chat,
            id,
            message: message.clone(),
        });
        Ok(())
    }

    fn send_photo(&self, chat: ChatId, uri: &str, caption: &str) -> transport::Result<MessageId> {
        let mut inner = self.inner.lock();
        Self::check(&inner, chat)?;
        inner.next_id += 1;
        inner.log.push(Sent::Photo {
            chat,
            uri: uri.to_string(),
            caption: caption.to_string(),
        });
        Ok(MessageId(inner.next_id))
    }
}
