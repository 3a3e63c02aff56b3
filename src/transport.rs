//! Chat transport: how messages reach technicians and supervisors.
//!
//! The capture flow only talks to the [`Transport`] trait. The console
//! implementation in [`console`] drives the bot from a terminal.

pub mod console;

use crate::model::{ChatId, MessageId};

pub use console::ConsoleTransport;

/// Errors that can occur while delivering a message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The edit would leave the message exactly as it is.
    #[error("message not modified")]
    NotModified,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

pub type Result<T> = core::result::Result<T, TransportError>;

/// An inline button: its label and the callback token it sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Text plus an optional inline keyboard, one `Vec` per button row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    /// Appends a row of buttons.
    #[must_use]
    pub fn with_row(mut self, row: Vec<Button>) -> Self {
        self.buttons.push(row);
        self
    }

    /// All buttons, row by row.
    pub fn flat_buttons(&self) -> impl Iterator<Item = &Button> {
        self.buttons.iter().flatten()
    }
}

/// Sends, edits, and forwards chat messages.
pub trait Transport: Send + Sync {
    fn send(&self, chat: ChatId, message: &OutboundMessage) -> Result<MessageId>;

    /// Replaces the text and keyboard of a message sent earlier.
    fn edit(&self, chat: ChatId, id: MessageId, message: &OutboundMessage) -> Result<()>;

    /// Sends a photo by URI with a caption.
    fn send_photo(&self, chat: ChatId, uri: &str, caption: &str) -> Result<MessageId>;
}

/// Edits a message, treating an unchanged re-render as success.
pub fn edit(
    transport: &dyn Transport,
    chat: ChatId,
    id: MessageId,
    message: &OutboundMessage,
) -> Result<()> {
    match transport.edit(chat, id, message) {
        Err(TransportError::NotModified) => Ok(()),
        other => other,
    }
}
