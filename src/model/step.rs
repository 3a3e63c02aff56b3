//! The step catalog: every capturable field, in traversal order.
//!
//! Each descriptor carries its own transition, so branch and shortcut
//! logic lives in this table rather than in the engine.

use std::fmt;
use std::str::FromStr;

use super::Value;

/// Identifies one catalog step. Also the key a captured value is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepKey {
    Ticket,
    Dni,
    Name,
    ClientLocation,
    BoxType,
    BoxCode,
    BoxLocation,
    BoxPhoto,
    SplitterUse,
    Port,
    SplitterPhoto,
}

impl StepKey {
    /// The wire name used in callback tokens and blob names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ticket => "TICKET",
            Self::Dni => "DNI",
            Self::Name => "NAME",
            Self::ClientLocation => "CLIENT_LOCATION",
            Self::BoxType => "BOX_TYPE",
            Self::BoxCode => "BOX_CODE",
            Self::BoxLocation => "BOX_LOCATION",
            Self::BoxPhoto => "BOX_PHOTO",
            Self::SplitterUse => "SPLITTER_USE",
            Self::Port => "PORT",
            Self::SplitterPhoto => "SPLITTER_PHOTO",
        }
    }

    /// This step's catalog entry.
    pub fn descriptor(self) -> &'static StepDescriptor {
        // CATALOG is declared in `StepKey` order.
        &CATALOG[self as usize]
    }

    /// Position in the linear traversal.
    pub fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATALOG
            .iter()
            .map(|d| d.key)
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown step: {s}"))
    }
}

/// One selectable option of a choice step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Normalized value written to the session and the ledger.
    pub tag: &'static str,
    /// Button text.
    pub label: &'static str,
}

/// What a step expects from the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepKind {
    Text,

    /// A shared location, captured as one latitude/longitude pair.
    Location,

    /// A photo, uploaded before the step is accepted.
    Photo,

    /// One of a fixed set of options, picked with a button.
    Choice { options: &'static [ChoiceOption] },
}

impl StepKind {
    /// Short name used in validation messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Location => "location",
            Self::Photo => "photo",
            Self::Choice { .. } => "choice",
        }
    }
}

/// Where the flow goes once a step is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Step(StepKey),
    Summary,
}

/// Transition table entry for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Always continue to the given step.
    To(StepKey),

    /// Branch on a captured choice: `then` when the tag equals `on`,
    /// `otherwise` for any other tag.
    Branch {
        on: &'static str,
        then: Next,
        otherwise: Next,
    },

    /// Last step of the catalog.
    Finish,
}

/// Immutable definition of one capturable field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDescriptor {
    pub key: StepKey,
    pub kind: StepKind,
    /// Short name shown in confirmations and the summary.
    pub label: &'static str,
    /// Question sent to the user.
    pub prompt: &'static str,
    pub transition: Transition,
}

impl StepDescriptor {
    /// Evaluates the transition for a confirmed value.
    pub fn next(&self, value: &Value) -> Next {
        match self.transition {
            Transition::To(step) => Next::Step(step),
            Transition::Branch {
                on,
                then,
                otherwise,
            } => match value {
                Value::Choice(tag) if tag == on => then,
                _ => otherwise,
            },
            Transition::Finish => Next::Summary,
        }
    }

    /// Looks up a choice option by tag. `None` for non-choice steps.
    pub fn option(&self, tag: &str) -> Option<&'static ChoiceOption> {
        match self.kind {
            StepKind::Choice { options } => options.iter().find(|o| o.tag == tag),
            _ => None,
        }
    }
}

pub const BOX_TYPE_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption {
        tag: "CTO",
        label: "🟦 CTO",
    },
    ChoiceOption {
        tag: "NAP",
        label: "🟩 NAP",
    },
];

pub const SPLITTER_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption {
        tag: "SI",
        label: "✅ Yes",
    },
    ChoiceOption {
        tag: "NO",
        label: "❌ No",
    },
];

/// Tag written when a splitter was used.
pub const SPLITTER_USED: &str = "SI";

/// Tag written (or defaulted) when no splitter was used.
pub const SPLITTER_NOT_USED: &str = "NO";

/// The full catalog, in traversal order.
pub static CATALOG: [StepDescriptor; 11] = [
    StepDescriptor {
        key: StepKey::Ticket,
        kind: StepKind::Text,
        label: "🎫 Ticket",
        prompt: "🎫 Enter the TICKET number:",
        transition: Transition::To(StepKey::Dni),
    },
    StepDescriptor {
        key: StepKey::Dni,
        kind: StepKind::Text,
        label: "🪪 DNI",
        prompt: "🪪 Enter the customer's DNI:",
        transition: Transition::To(StepKey::Name),
    },
    StepDescriptor {
        key: StepKey::Name,
        kind: StepKind::Text,
        label: "👤 Customer name",
        prompt: "👤 Enter the customer's name:",
        transition: Transition::To(StepKey::ClientLocation),
    },
    StepDescriptor {
        key: StepKey::ClientLocation,
        kind: StepKind::Location,
        label: "📍 Customer location",
        prompt: "📍 Send the customer's location:",
        transition: Transition::To(StepKey::BoxType),
    },
    StepDescriptor {
        key: StepKey::BoxType,
        kind: StepKind::Choice {
            options: BOX_TYPE_OPTIONS,
        },
        label: "🟠 Box type",
        prompt: "🟠 Select the type of box you are registering:",
        transition: Transition::To(StepKey::BoxCode),
    },
    StepDescriptor {
        key: StepKey::BoxCode,
        kind: StepKind::Text,
        label: "🏷 CTO/NAP code",
        prompt: "🏷 Enter the CTO/NAP code:",
        transition: Transition::To(StepKey::BoxLocation),
    },
    StepDescriptor {
        key: StepKey::BoxLocation,
        kind: StepKind::Location,
        label: "📍 CTO/NAP location",
        prompt: "📍 Send the CTO/NAP location:",
        transition: Transition::To(StepKey::BoxPhoto),
    },
    StepDescriptor {
        key: StepKey::BoxPhoto,
        kind: StepKind::Photo,
        label: "📸 CTO/NAP photo",
        prompt: "📸 Send a photo of the CTO or NAP:",
        transition: Transition::To(StepKey::SplitterUse),
    },
    StepDescriptor {
        key: StepKey::SplitterUse,
        kind: StepKind::Choice {
            options: SPLITTER_OPTIONS,
        },
        label: "🔌 Splitter use",
        prompt: "🔌 Was a splitter used?",
        transition: Transition::Branch {
            on: SPLITTER_USED,
            then: Next::Step(StepKey::Port),
            otherwise: Next::Summary,
        },
    },
    StepDescriptor {
        key: StepKey::Port,
        kind: StepKind::Text,
        label: "🔢 Port",
        prompt: "🔢 Enter the port the splitter was connected to:",
        transition: Transition::To(StepKey::SplitterPhoto),
    },
    StepDescriptor {
        key: StepKey::SplitterPhoto,
        kind: StepKind::Photo,
        label: "📸 Splitter photo",
        prompt: "📸 Send a photo of the box with the splitter, showing the port:",
        transition: Transition::Finish,
    },
];

/// The step every new session starts on.
pub fn first_step() -> StepKey {
    CATALOG[0].key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_declared_in_key_order() {
        for (i, d) in CATALOG.iter().enumerate() {
            assert_eq!(d.key.position(), i, "{} is out of place", d.key);
            assert_eq!(d.key.descriptor().key, d.key);
        }
    }

    #[test]
    fn linear_transitions_point_to_the_following_step() {
        for pair in CATALOG.windows(2) {
            if let Transition::To(next) = pair[0].transition {
                assert_eq!(next, pair[1].key);
            }
        }
    }

    #[test]
    fn box_type_always_continues() {
        let d = StepKey::BoxType.descriptor();
        for tag in ["CTO", "NAP"] {
            assert_eq!(
                d.next(&Value::Choice(tag.into())),
                Next::Step(StepKey::BoxCode)
            );
        }
    }

    #[test]
    fn splitter_branch() {
        let d = StepKey::SplitterUse.descriptor();
        assert_eq!(
            d.next(&Value::Choice("SI".into())),
            Next::Step(StepKey::Port)
        );
        assert_eq!(d.next(&Value::Choice("NO".into())), Next::Summary);
    }

    #[test]
    fn last_step_finishes() {
        let d = StepKey::SplitterPhoto.descriptor();
        assert_eq!(d.next(&Value::Photo("u".into())), Next::Summary);
    }

    #[test]
    fn step_names_round_trip_through_from_str() {
        for d in &CATALOG {
            assert_eq!(d.key.as_str().parse::<StepKey>().unwrap(), d.key);
        }
        assert!("NOPE".parse::<StepKey>().is_err());
    }

    #[test]
    fn option_lookup() {
        assert_eq!(StepKey::BoxType.descriptor().option("NAP").unwrap().tag, "NAP");
        assert!(StepKey::BoxType.descriptor().option("SI").is_none());
        assert!(StepKey::Ticket.descriptor().option("CTO").is_none());
    }
}
