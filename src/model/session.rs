//! Session types: one in-progress capture per technician.

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use super::{StepKey, Value, step};

/// Stable identity of a chat user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation: a private chat or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque per-session record identifier. Eight hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// A fresh identifier from a v4 UUID.
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the session is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the value of a step.
    Awaiting(StepKey),

    /// A value was captured; waiting for Confirm or Correct.
    Confirming(StepKey),

    /// All steps done; waiting for save, correct, or cancel.
    Summary,

    /// The user asked to correct from the summary and must pick a field.
    PickingCorrection,
}

/// Where a correction was started from. Decides where the flow resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionOrigin {
    /// From a confirm prompt during the linear flow.
    LinearFlow {
        /// The step whose confirm prompt was showing.
        left_off: StepKey,
    },

    /// From the final summary.
    Summary,
}

/// An open correction: the field being re-captured and where to go after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub target: StepKey,
    pub origin: CorrectionOrigin,
}

/// One technician's in-progress capture.
///
/// Owned by the session store. Removed exactly on save or cancel.
#[derive(Debug, Clone)]
pub struct Session {
    pub owner: UserId,
    pub chat: ChatId,
    pub record_id: RecordId,
    pub active: bool,
    pub state: SessionState,
    pub values: BTreeMap<StepKey, Value>,
    pub correction: Option<Correction>,
    /// Field to highlight in the next summary render.
    pub last_corrected: Option<StepKey>,
}

impl Session {
    /// Starts a session on the first catalog step.
    pub fn new(owner: UserId, chat: ChatId) -> Self {
        Self::with_record_id(owner, chat, RecordId::generate())
    }

    pub fn with_record_id(owner: UserId, chat: ChatId, record_id: RecordId) -> Self {
        Self {
            owner,
            chat,
            record_id,
            active: true,
            state: SessionState::Awaiting(step::first_step()),
            values: BTreeMap::new(),
            correction: None,
            last_corrected: None,
        }
    }

    pub fn value(&self, key: StepKey) -> Option<&Value> {
        self.values.get(&key)
    }

    /// Text of a step's value, if captured.
    pub fn text(&self, key: StepKey) -> Option<&str> {
        self.value(key).and_then(Value::as_text)
    }

    /// Whether a splitter was recorded as used.
    pub fn splitter_used(&self) -> bool {
        self.text(StepKey::SplitterUse) == Some(step::SPLITTER_USED)
    }

    /// Whether `key` belongs in the record. The port and splitter photo only
    /// do when a splitter was used.
    pub fn records(&self, key: StepKey) -> bool {
        !matches!(key, StepKey::Port | StepKey::SplitterPhoto) || self.splitter_used()
    }

    /// Marks the session finished. The store entry is removed separately.
    pub fn close(&mut self) {
        self.active = false;
        self.correction = None;
    }

    /// Takes the highlight for a summary render, clearing it.
    pub fn take_highlight(&mut self) -> Option<StepKey> {
        self.last_corrected.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_are_eight_hex_chars() {
        let id = RecordId::generate();
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, RecordId::generate());
    }

    #[test]
    fn new_session_starts_on_the_first_step() {
        let s = Session::new(UserId(7), ChatId(7));
        assert!(s.active);
        assert_eq!(s.state, SessionState::Awaiting(StepKey::Ticket));
        assert!(s.values.is_empty());
        assert!(s.correction.is_none());
    }

    #[test]
    fn highlight_is_taken_once() {
        let mut s = Session::new(UserId(7), ChatId(7));
        s.last_corrected = Some(StepKey::Dni);
        assert_eq!(s.take_highlight(), Some(StepKey::Dni));
        assert_eq!(s.take_highlight(), None);
    }

    #[test]
    fn splitter_fields_are_recorded_only_when_used() {
        let mut s = Session::new(UserId(7), ChatId(7));
        assert!(s.records(StepKey::Ticket));
        assert!(!s.records(StepKey::Port));

        s.values
            .insert(StepKey::SplitterUse, Value::Choice("NO".into()));
        assert!(!s.records(StepKey::SplitterPhoto));

        s.values
            .insert(StepKey::SplitterUse, Value::Choice("SI".into()));
        assert!(s.splitter_used());
        assert!(s.records(StepKey::Port));
        assert!(s.records(StepKey::SplitterPhoto));
    }
}
