//! Capture engine: validates one event against the current step, stores the
//! value, and decides where the flow goes next.
//!
//! Every function takes the session by `&mut` and either applies a whole
//! transition or returns an error with the session untouched.

use tracing::{debug, info, warn};

use crate::correction;
use crate::model::{
    Correction, CorrectionOrigin, Event, Next, Session, SessionState, StepDescriptor, StepKey,
    StepKind, Value,
};
use crate::storage::BlobStore;

/// Why an event or action was not applied.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The event kind does not match the step. Ask again.
    #[error("{step} expects {expected}, got {received}")]
    Validation {
        step: StepKey,
        expected: &'static str,
        received: &'static str,
    },

    /// A choice tag that the step does not offer.
    #[error("{step} has no option {tag:?}")]
    UnknownOption { step: StepKey, tag: String },

    /// The photo could not be stored. Ask again; nothing was written.
    #[error("upload failed for {step}: {reason}")]
    Upload { step: StepKey, reason: String },

    /// The session is not waiting for this kind of input.
    #[error("not expected while {state:?}")]
    OutOfTurn { state: SessionState },

    /// A button for a step that is no longer pending.
    #[error("stale action for {step} while {state:?}")]
    Stale { step: StepKey, state: SessionState },

    /// A correction that cannot start from the current state.
    #[error("cannot correct {field} while {state:?}")]
    InvalidCorrection { field: StepKey, state: SessionState },
}

impl CaptureError {
    /// Validation and upload failures re-prompt the same step.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::UnknownOption { .. } | Self::Upload { .. }
        )
    }
}

/// Where the flow goes after a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Ask for the next step.
    Ask(StepKey),

    /// Show the confirm prompt of the step the user left off at.
    Reconfirm(StepKey),

    /// Show the summary.
    Summary,
}

/// What the caller should show after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ask for a step's value. `correcting` when it is being re-captured.
    Ask { step: StepKey, correcting: bool },

    /// Echo the captured value with Confirm and Correct actions.
    AwaitConfirmation { step: StepKey },

    /// The value was confirmed; continue as `resume` says.
    Confirmed { step: StepKey, resume: Resume },

    /// Show the summary.
    Summary,

    /// Offer the fields that can be corrected.
    PickField,
}

/// Applies a value-bearing event to the step the session is awaiting.
///
/// Photos are uploaded before anything is written; the step is not accepted
/// unless the blob store returns a URI.
pub fn submit(
    session: &mut Session,
    event: Event,
    blobs: &dyn BlobStore,
) -> Result<Outcome, CaptureError> {
    let SessionState::Awaiting(step) = session.state else {
        return Err(CaptureError::OutOfTurn {
            state: session.state,
        });
    };

    let value = accept(session, step.descriptor(), event, blobs)?;
    debug!(record_id = %session.record_id, %step, "value captured");
    session.values.insert(step, value);

    if let Some(Correction {
        target,
        origin: CorrectionOrigin::Summary,
    }) = session.correction
        && target == step
    {
        session.correction = None;
        session.last_corrected = Some(step);
        session.state = SessionState::Summary;
        info!(record_id = %session.record_id, %step, "corrected from summary");
        return Ok(Outcome::Summary);
    }

    session.state = SessionState::Confirming(step);
    Ok(Outcome::AwaitConfirmation { step })
}

/// Validates the event against the step and produces the value to store.
fn accept(
    session: &Session,
    descriptor: &StepDescriptor,
    event: Event,
    blobs: &dyn BlobStore,
) -> Result<Value, CaptureError> {
    let step = descriptor.key;
    match (descriptor.kind, event) {
        (StepKind::Text, Event::Text(text)) => Ok(Value::Text(text)),
        (StepKind::Location, Event::Location(coords)) => Ok(Value::Location(coords)),
        (StepKind::Choice { .. }, Event::Choice(tag)) => match descriptor.option(&tag) {
            Some(option) => Ok(Value::Choice(option.tag.to_string())),
            None => Err(CaptureError::UnknownOption { step, tag }),
        },
        (StepKind::Photo, Event::Photo(bytes)) => {
            let name = format!("{step}_{}.jpg", session.record_id);
            match blobs.upload(&bytes, &name) {
                Ok(uri) => Ok(Value::Photo(uri)),
                Err(e) => {
                    warn!(record_id = %session.record_id, %step, error = %e, "photo upload failed");
                    Err(CaptureError::Upload {
                        step,
                        reason: e.to_string(),
                    })
                }
            }
        }
        (kind, event) => {
            warn!(
                record_id = %session.record_id,
                %step,
                expected = kind.name(),
                received = event.kind_name(),
                "rejected input"
            );
            Err(CaptureError::Validation {
                step,
                expected: kind.name(),
                received: event.kind_name(),
            })
        }
    }
}

/// Confirms the value pending for `step` and moves on.
pub fn confirm(session: &mut Session, step: StepKey) -> Result<Outcome, CaptureError> {
    expect_confirming(session, step)?;

    let resume = resume_route(session, step);
    let closes_correction = session.correction.is_some_and(|c| c.target == step);
    if closes_correction {
        if session.correction.is_some_and(|c| c.origin == CorrectionOrigin::Summary) {
            session.last_corrected = Some(step);
        }
        session.correction = None;
    }

    session.state = match resume {
        Resume::Ask(next) => SessionState::Awaiting(next),
        Resume::Reconfirm(left_off) => SessionState::Confirming(left_off),
        Resume::Summary => SessionState::Summary,
    };
    info!(record_id = %session.record_id, %step, ?resume, "step confirmed");
    Ok(Outcome::Confirmed { step, resume })
}

/// Re-asks the step whose confirm prompt is showing.
///
/// Opens a linear-flow correction for it, unless that step is already the
/// target of an open correction, which is kept as is.
pub fn correct(session: &mut Session, step: StepKey) -> Result<Outcome, CaptureError> {
    expect_confirming(session, step)?;

    if session.correction.is_some_and(|c| c.target == step) {
        session.state = SessionState::Awaiting(step);
        return Ok(Outcome::Ask {
            step,
            correcting: true,
        });
    }

    correction::begin_correction(
        session,
        step,
        CorrectionOrigin::LinearFlow { left_off: step },
    )
}

/// Where the flow resumes once `step` is confirmed.
///
/// A total function over the open correction:
///
/// - no correction for `step`: the catalog transition;
/// - linear-flow correction of the step that was showing: the catalog transition;
/// - linear-flow correction of an earlier step: back to the left-off confirm
///   prompt, as long as the new value still leads there;
/// - summary correction: the summary.
pub fn resume_route(session: &Session, step: StepKey) -> Resume {
    let linear = match session.value(step) {
        Some(value) => match step.descriptor().next(value) {
            Next::Step(next) => Resume::Ask(next),
            Next::Summary => Resume::Summary,
        },
        None => Resume::Ask(step),
    };

    match session.correction {
        Some(Correction { target, origin }) if target == step => match origin {
            CorrectionOrigin::LinearFlow { left_off } if left_off == step => linear,
            CorrectionOrigin::LinearFlow { left_off } => {
                if leads_to(session, step, left_off) {
                    Resume::Reconfirm(left_off)
                } else {
                    linear
                }
            }
            CorrectionOrigin::Summary => Resume::Summary,
        },
        _ => linear,
    }
}

/// Whether the catalog path from `from`, following captured values,
/// reaches `to`.
fn leads_to(session: &Session, from: StepKey, to: StepKey) -> bool {
    let mut current = from;
    loop {
        let Some(value) = session.value(current) else {
            return false;
        };
        match current.descriptor().next(value) {
            Next::Step(next) if next == to => return true,
            Next::Step(next) => current = next,
            Next::Summary => return false,
        }
    }
}

fn expect_confirming(session: &Session, step: StepKey) -> Result<(), CaptureError> {
    match session.state {
        SessionState::Confirming(pending) if pending == step => Ok(()),
        state => Err(CaptureError::Stale { step, state }),
    }
}
