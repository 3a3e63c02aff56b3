//! Message rendering for the conversation.

use std::fmt::Write as _;

use crate::engine::CaptureError;
use crate::gateway::Receipt;
use crate::model::{
    Action, CATALOG, Cell, Session, SessionState, StepDescriptor, StepKey, StepKind, SummaryAction,
    Value,
};
use crate::transport::{Button, OutboundMessage};

pub fn welcome() -> OutboundMessage {
    OutboundMessage::text(
        "👋 Welcome to fieldbook.\n\
         Use /new to start a registration and /cancel to abandon it.",
    )
}

/// Asks for a step's value. Choice steps carry their option buttons.
pub fn prompt(step: StepKey, correcting: bool) -> OutboundMessage {
    let d = step.descriptor();
    let text = if correcting {
        format!("✏️ Correcting {}\n{}", d.label, d.prompt)
    } else {
        d.prompt.to_string()
    };

    let mut message = OutboundMessage::text(text);
    if let StepKind::Choice { options } = d.kind {
        message = message.with_row(
            options
                .iter()
                .map(|o| {
                    let action = Action::Select {
                        step,
                        tag: o.tag.to_string(),
                    };
                    Button::new(o.label, action.token())
                })
                .collect(),
        );
    }
    message
}

/// Display form of a captured value.
pub fn value_text(session: &Session, step: StepKey) -> String {
    match session.value(step) {
        None => "—".to_string(),
        Some(Value::Text(s)) => s.clone(),
        Some(Value::Location(c)) => c.to_string(),
        Some(Value::Photo(_)) => "📷 received".to_string(),
        Some(Value::Choice(tag)) => step
            .descriptor()
            .option(tag)
            .map_or_else(|| tag.clone(), |o| o.label.to_string()),
    }
}

/// Echoes a captured value with Confirm and Correct buttons.
///
/// Outside a correction, steps after the first also offer to go back to an
/// earlier field and return here afterwards.
pub fn confirm_echo(session: &Session, step: StepKey) -> OutboundMessage {
    let label = step.descriptor().label;
    let message = OutboundMessage::text(format!(
        "{label}: {}\nIs this correct?",
        value_text(session, step)
    ))
    .with_row(vec![
        Button::new("✅ Confirm", Action::Confirm(step).token()),
        Button::new("✏️ Correct", Action::Correct(step).token()),
    ]);

    if session.correction.is_none() && step.position() > 0 {
        message.with_row(vec![Button::new(
            "⏪ Earlier field",
            Action::Back(step).token(),
        )])
    } else {
        message
    }
}

/// Replaces a confirm echo once the value is accepted.
pub fn confirmed(session: &Session, step: StepKey) -> OutboundMessage {
    let label = step.descriptor().label;
    OutboundMessage::text(format!("✔ {label}: {}", value_text(session, step)))
}

/// Replaces a choice keyboard once an option was picked.
pub fn chosen(session: &Session, step: StepKey) -> OutboundMessage {
    let label = step.descriptor().label;
    OutboundMessage::text(format!("{label}: {}", value_text(session, step)))
}

/// Replaces a confirm echo when the user chose to correct.
pub fn correcting(step: StepKey) -> OutboundMessage {
    OutboundMessage::text(format!("✏️ {} will be corrected.", step.descriptor().label))
}

/// The full record with Save, Correct, and Cancel buttons.
///
/// `highlight` adds an "updated" banner for a field just corrected.
pub fn summary(session: &Session, highlight: Option<StepKey>) -> OutboundMessage {
    let mut text = String::new();
    if let Some(step) = highlight {
        let _ = writeln!(text, "✏️ {} updated.\n", step.descriptor().label);
    }
    text.push_str("📋 Registration summary\n");

    for d in CATALOG.iter().filter(|d| session.records(d.key)) {
        let _ = write!(text, "\n{}: {}", d.label, value_text(session, d.key));
    }

    OutboundMessage::text(text).with_row(vec![
        Button::new("💾 Save", Action::Summary(SummaryAction::Save).token()),
        Button::new("✏️ Correct", Action::Summary(SummaryAction::Correct).token()),
        Button::new("🗑 Cancel", Action::Summary(SummaryAction::Cancel).token()),
    ])
}

/// One button per field in the record, two per row.
pub fn picker(session: &Session) -> OutboundMessage {
    field_buttons(
        "✏️ Which field do you want to correct?",
        CATALOG.iter().filter(|d| session.records(d.key)),
    )
}

/// Fields captured before `step`, offered from its confirm prompt.
pub fn earlier_picker(session: &Session, step: StepKey) -> OutboundMessage {
    field_buttons(
        "⏪ Which earlier field do you want to correct?",
        CATALOG
            .iter()
            .filter(|d| d.key.position() < step.position() && session.value(d.key).is_some()),
    )
}

fn field_buttons<'a>(
    text: &str,
    fields: impl Iterator<Item = &'a StepDescriptor>,
) -> OutboundMessage {
    let buttons: Vec<Button> = fields
        .map(|d| Button::new(d.label, Action::Fix(d.key).token()))
        .collect();

    buttons
        .chunks(2)
        .fold(OutboundMessage::text(text), |message, row| {
            message.with_row(row.to_vec())
        })
}

pub fn receipt(receipt: &Receipt) -> OutboundMessage {
    let cell = |column: &str| receipt.row.get(column).map_or_else(String::new, Cell::to_string);
    let pair = |lat: &str, lng: &str| {
        let (lat, lng) = (cell(lat), cell(lng));
        if lat.is_empty() {
            "—".to_string()
        } else {
            format!("({lat}, {lng})")
        }
    };

    let mut text = format!("✅ Record {} saved\n\n", receipt.record_id);
    let _ = writeln!(text, "📅 {} {}", cell("FECHA"), cell("HORA"));
    let _ = writeln!(text, "👤 Customer: {}", cell("NOMBRE"));
    let _ = writeln!(text, "🎫 Ticket: {}", cell("TICKET"));
    let _ = writeln!(text, "🪪 DNI: {}", cell("DNI"));
    let _ = writeln!(text, "📍 Customer location: {}", pair("LAT_CLIENTE", "LNG_CLIENTE"));
    let _ = writeln!(text, "🟠 {}: {}", cell("TIPO_CTO"), cell("CODIGO_CTO"));
    let _ = writeln!(text, "📍 Box location: {}", pair("LAT_CTO", "LNG_CTO"));
    let port = cell("PUERTO");
    let _ = writeln!(
        text,
        "🔌 Splitter: {} | Port: {}",
        cell("SPLITTER"),
        if port.is_empty() { "-" } else { port.as_str() }
    );
    if !receipt.photos.is_empty() {
        let _ = write!(text, "📸 Photos: {}", receipt.photos.len());
    }
    OutboundMessage::text(text.trim_end())
}

/// What a session is waiting on, in words.
pub fn pending(state: SessionState) -> String {
    match state {
        SessionState::Awaiting(step) => step.descriptor().label.to_string(),
        SessionState::Confirming(step) => format!("confirm {}", step.descriptor().label),
        SessionState::Summary => "📋 summary review".to_string(),
        SessionState::PickingCorrection => "choosing a field to correct".to_string(),
    }
}

/// Offered when a session is requested while one is active.
pub fn collision(state: SessionState) -> OutboundMessage {
    OutboundMessage::text(format!(
        "⚠️ You already have a registration in progress.\nWaiting for: {}",
        pending(state)
    ))
    .with_row(vec![
        Button::new("▶️ Resume", Action::Resume.token()),
        Button::new("🗑 Discard", Action::Discard.token()),
    ])
}

/// Reply to input that does not fit the current state.
pub fn out_of_turn(state: SessionState) -> OutboundMessage {
    OutboundMessage::text(format!("⚠️ Not expected right now. Waiting for: {}", pending(state)))
}

pub fn no_session() -> OutboundMessage {
    OutboundMessage::text("ℹ️ No registration in progress. Use /new to start one.")
}

/// Reply to a rejected value. The step's prompt follows separately.
pub fn rejected(error: &CaptureError) -> OutboundMessage {
    let text = match error {
        CaptureError::Validation { expected, .. } => format!("⚠️ Please send a {expected}."),
        CaptureError::UnknownOption { .. } => "⚠️ Please pick one of the buttons.".to_string(),
        CaptureError::Upload { .. } => "❌ The photo could not be stored. Please send it again.".to_string(),
        other => format!("⚠️ {other}"),
    };
    OutboundMessage::text(text)
}

/// Follows the receipt in the technician's chat.
pub fn next_registration() -> OutboundMessage {
    OutboundMessage::text("➕ Use /new to start another registration.")
}

pub fn saving() -> OutboundMessage {
    OutboundMessage::text("💾 Saving registration...")
}

pub fn save_failed() -> OutboundMessage {
    OutboundMessage::text("❌ The registration could not be saved. Press Save to try again.")
}

pub fn cancelled() -> OutboundMessage {
    OutboundMessage::text("🗑 Registration cancelled.")
}

pub fn discarded() -> OutboundMessage {
    OutboundMessage::text("🗑 Previous registration discarded. Use /new to start again.")
}
