//! Inbound traffic: what the transport delivers and what the engine accepts.

use super::{ChatId, Coordinates, UserId};

/// A value-bearing event for the capture engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Text(String),
    Location(Coordinates),
    /// Raw photo bytes, not yet uploaded.
    Photo(Vec<u8>),
    /// A choice option tag.
    Choice(String),
}

impl Event {
    /// Short name used in validation messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Location(_) => "location",
            Self::Photo(_) => "photo",
            Self::Choice(_) => "choice",
        }
    }
}

/// Slash commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    New,
    Cancel,
}

impl Command {
    /// Parses `/start`, `/new` and `/cancel`, ignoring a `@botname` suffix.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" => Some(Self::Start),
            "new" => Some(Self::New),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Identifies a message previously sent by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

/// What arrived from the chat.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Command(Command),
    Text(String),
    Location(Coordinates),
    Photo(Vec<u8>),
    /// A button press: the message carrying the button and its opaque token.
    Callback { message: MessageId, token: String },
}

impl Inbound {
    /// Classifies a text message as a command or free text.
    pub fn from_text(text: &str) -> Self {
        match Command::parse(text) {
            Some(cmd) => Self::Command(cmd),
            None => Self::Text(text.to_string()),
        }
    }
}

/// One inbound update: who sent it, where, and what.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub chat: ChatId,
    pub user: UserId,
    pub inbound: Inbound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/new@field_bot"), Some(Command::New));
        assert_eq!(Command::parse("/cancel now"), Some(Command::Cancel));
        assert_eq!(Command::parse("/help"), None);
        assert_eq!(Command::parse("start"), None);
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Inbound::from_text("T-100"), Inbound::Text("T-100".into()));
        assert_eq!(
            Inbound::from_text("/new"),
            Inbound::Command(Command::New)
        );
    }
}
