//! Button actions and their callback token codec.
//!
//! Tokens are short `kind:arg` strings so they fit in a callback payload:
//!
//! ```text
//! confirm:TICKET        correct:DNI        back:NAME
//! select:BOX_TYPE:NAP   fix:PORT
//! summary:save          summary:correct    summary:cancel
//! session:resume        session:discard
//! ```

use std::fmt;
use std::str::FromStr;

use super::StepKey;

/// What a button asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Accept the value echoed for a step.
    Confirm(StepKey),

    /// Re-capture the value echoed for a step.
    Correct(StepKey),

    /// From a step's confirm prompt, pick an earlier field to correct.
    Back(StepKey),

    /// Pick an option of a choice step.
    Select { step: StepKey, tag: String },

    /// A button on the final summary.
    Summary(SummaryAction),

    /// Pick the field to correct, from the summary or an earlier-field list.
    Fix(StepKey),

    /// Keep going with the session that blocked a new one.
    Resume,

    /// Throw away the session that blocked a new one.
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryAction {
    Save,
    Correct,
    Cancel,
}

impl Action {
    /// Encodes the action as a callback token.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirm(step) => write!(f, "confirm:{step}"),
            Self::Correct(step) => write!(f, "correct:{step}"),
            Self::Back(step) => write!(f, "back:{step}"),
            Self::Select { step, tag } => write!(f, "select:{step}:{tag}"),
            Self::Summary(SummaryAction::Save) => f.write_str("summary:save"),
            Self::Summary(SummaryAction::Correct) => f.write_str("summary:correct"),
            Self::Summary(SummaryAction::Cancel) => f.write_str("summary:cancel"),
            Self::Fix(step) => write!(f, "fix:{step}"),
            Self::Resume => f.write_str("session:resume"),
            Self::Discard => f.write_str("session:discard"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let bad = || format!("unrecognized callback token: {token}");
        let (kind, rest) = token.split_once(':').ok_or_else(bad)?;

        let action = match kind {
            "confirm" => Self::Confirm(rest.parse()?),
            "correct" => Self::Correct(rest.parse()?),
            "back" => Self::Back(rest.parse()?),
            "fix" => Self::Fix(rest.parse()?),
            "select" => {
                let (step, tag) = rest.split_once(':').ok_or_else(bad)?;
                if tag.is_empty() {
                    return Err(bad());
                }
                Self::Select {
                    step: step.parse()?,
                    tag: tag.to_string(),
                }
            }
            "summary" => Self::Summary(match rest {
                "save" => SummaryAction::Save,
                "correct" => SummaryAction::Correct,
                "cancel" => SummaryAction::Cancel,
                _ => return Err(bad()),
            }),
            "session" => match rest {
                "resume" => Self::Resume,
                "discard" => Self::Discard,
                _ => return Err(bad()),
            },
            _ => return Err(bad()),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_token_kind() {
        let cases = [
            ("confirm:TICKET", Action::Confirm(StepKey::Ticket)),
            ("correct:CLIENT_LOCATION", Action::Correct(StepKey::ClientLocation)),
            ("back:NAME", Action::Back(StepKey::Name)),
            (
                "select:BOX_TYPE:NAP",
                Action::Select {
                    step: StepKey::BoxType,
                    tag: "NAP".into(),
                },
            ),
            ("summary:save", Action::Summary(SummaryAction::Save)),
            ("summary:correct", Action::Summary(SummaryAction::Correct)),
            ("summary:cancel", Action::Summary(SummaryAction::Cancel)),
            ("fix:PORT", Action::Fix(StepKey::Port)),
            ("session:resume", Action::Resume),
            ("session:discard", Action::Discard),
        ];
        for (token, expected) in cases {
            let parsed: Action = token.parse().unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(parsed.token(), token);
        }
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in [
            "",
            "confirm",
            "confirm:NOPE",
            "back:",
            "select:BOX_TYPE",
            "select:BOX_TYPE:",
            "summary:maybe",
            "session:",
            "launch:TICKET",
        ] {
            assert!(token.parse::<Action>().is_err(), "{token} parsed");
        }
    }
}
