//! Starting corrections: from a confirm prompt or from the summary.

use tracing::info;

use crate::engine::{CaptureError, Outcome};
use crate::model::{Correction, CorrectionOrigin, Session, SessionState, StepKey};

/// Opens a correction of `field` and re-asks it.
///
/// A linear-flow correction starts from the confirm prompt of `left_off`,
/// outside any other correction, and may target that step or any earlier
/// one. A summary correction starts from the summary or the field picker
/// and may target any field in the record. Values already captured are kept
/// until the target is re-captured.
pub fn begin_correction(
    session: &mut Session,
    field: StepKey,
    origin: CorrectionOrigin,
) -> Result<Outcome, CaptureError> {
    let allowed = match (session.state, origin) {
        (SessionState::Confirming(current), CorrectionOrigin::LinearFlow { left_off }) => {
            current == left_off
                && field.position() <= left_off.position()
                && session.correction.is_none()
        }
        (
            SessionState::Summary | SessionState::PickingCorrection,
            CorrectionOrigin::Summary,
        ) => session.records(field),
        _ => false,
    };
    if !allowed {
        return Err(CaptureError::InvalidCorrection {
            field,
            state: session.state,
        });
    }

    session.correction = Some(Correction {
        target: field,
        origin,
    });
    session.state = SessionState::Awaiting(field);
    info!(record_id = %session.record_id, %field, ?origin, "correction started");
    Ok(Outcome::Ask {
        step: field,
        correcting: true,
    })
}

/// Shows the field picker from the summary.
pub fn open_picker(session: &mut Session) -> Result<Outcome, CaptureError> {
    if session.state != SessionState::Summary {
        return Err(CaptureError::OutOfTurn {
            state: session.state,
        });
    }
    session.state = SessionState::PickingCorrection;
    Ok(Outcome::PickField)
}
