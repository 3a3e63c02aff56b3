//! The dispatch table: which handler an input gets in each state.

use crate::model::{Action, SessionState, StepKey, SummaryAction};

/// The shape of an input, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTag {
    Text,
    Location,
    Photo,
    Confirm(StepKey),
    Correct(StepKey),
    Back(StepKey),
    Select(StepKey),
    Summary(SummaryAction),
    Fix(StepKey),
    Resume,
    Discard,
}

impl InputTag {
    pub fn of_action(action: &Action) -> Self {
        match action {
            Action::Confirm(step) => Self::Confirm(*step),
            Action::Correct(step) => Self::Correct(*step),
            Action::Back(step) => Self::Back(*step),
            Action::Select { step, .. } => Self::Select(*step),
            Action::Summary(a) => Self::Summary(*a),
            Action::Fix(step) => Self::Fix(*step),
            Action::Resume => Self::Resume,
            Action::Discard => Self::Discard,
        }
    }
}

/// Handler chosen for an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Hand the value to the capture engine.
    Submit,
    Confirm(StepKey),
    Correct(StepKey),
    /// List the fields before the step whose confirm prompt is showing.
    PickEarlier(StepKey),
    Save,
    OpenPicker,
    Cancel,
    Fix(StepKey),
    Resume,
    Discard,
    /// Not valid now; answer with a hint naming what is pending.
    OutOfTurn,
}

/// Routes an input given the session state. Total: anything without an
/// entry is [`Route::OutOfTurn`].
pub fn route(state: SessionState, input: InputTag) -> Route {
    use InputTag as I;
    use SessionState as S;

    match (state, input) {
        (S::Awaiting(_), I::Text | I::Location | I::Photo) => Route::Submit,
        (S::Awaiting(step), I::Select(s)) if s == step => Route::Submit,
        (S::Confirming(step), I::Confirm(s)) if s == step => Route::Confirm(step),
        (S::Confirming(step), I::Correct(s)) if s == step => Route::Correct(step),
        (S::Confirming(step), I::Back(s)) if s == step => Route::PickEarlier(step),
        (S::Confirming(step), I::Fix(field)) if field.position() < step.position() => {
            Route::Fix(field)
        }
        (S::Summary, I::Summary(SummaryAction::Save)) => Route::Save,
        (S::Summary, I::Summary(SummaryAction::Correct)) => Route::OpenPicker,
        (S::Summary, I::Summary(SummaryAction::Cancel)) => Route::Cancel,
        (S::PickingCorrection, I::Fix(step)) => Route::Fix(step),
        (_, I::Resume) => Route::Resume,
        (_, I::Discard) => Route::Discard,
        _ => Route::OutOfTurn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_go_to_the_engine_only_while_awaiting() {
        let awaiting = SessionState::Awaiting(StepKey::Ticket);
        for tag in [InputTag::Text, InputTag::Location, InputTag::Photo] {
            assert_eq!(route(awaiting, tag), Route::Submit);
            assert_eq!(
                route(SessionState::Confirming(StepKey::Ticket), tag),
                Route::OutOfTurn
            );
            assert_eq!(route(SessionState::Summary, tag), Route::OutOfTurn);
        }
    }

    #[test]
    fn buttons_only_act_on_their_own_step() {
        let confirming = SessionState::Confirming(StepKey::Dni);
        assert_eq!(
            route(confirming, InputTag::Confirm(StepKey::Dni)),
            Route::Confirm(StepKey::Dni)
        );
        assert_eq!(
            route(confirming, InputTag::Confirm(StepKey::Ticket)),
            Route::OutOfTurn
        );
        assert_eq!(
            route(
                SessionState::Awaiting(StepKey::BoxType),
                InputTag::Select(StepKey::SplitterUse)
            ),
            Route::OutOfTurn
        );
    }

    #[test]
    fn summary_buttons() {
        let s = SessionState::Summary;
        assert_eq!(route(s, InputTag::Summary(SummaryAction::Save)), Route::Save);
        assert_eq!(
            route(s, InputTag::Summary(SummaryAction::Correct)),
            Route::OpenPicker
        );
        assert_eq!(route(s, InputTag::Summary(SummaryAction::Cancel)), Route::Cancel);
        assert_eq!(route(s, InputTag::Fix(StepKey::Dni)), Route::OutOfTurn);
        assert_eq!(
            route(
                SessionState::PickingCorrection,
                InputTag::Summary(SummaryAction::Save)
            ),
            Route::OutOfTurn
        );
    }

    #[test]
    fn earlier_fields_can_be_fixed_from_a_confirm_prompt() {
        let confirming = SessionState::Confirming(StepKey::ClientLocation);
        assert_eq!(
            route(confirming, InputTag::Back(StepKey::ClientLocation)),
            Route::PickEarlier(StepKey::ClientLocation)
        );
        assert_eq!(
            route(confirming, InputTag::Back(StepKey::Dni)),
            Route::OutOfTurn
        );
        assert_eq!(
            route(confirming, InputTag::Fix(StepKey::Ticket)),
            Route::Fix(StepKey::Ticket)
        );
        assert_eq!(
            route(confirming, InputTag::Fix(StepKey::ClientLocation)),
            Route::OutOfTurn
        );
        assert_eq!(
            route(confirming, InputTag::Fix(StepKey::BoxType)),
            Route::OutOfTurn
        );
    }

    #[test]
    fn collision_buttons_work_in_any_state() {
        for state in [
            SessionState::Awaiting(StepKey::Port),
            SessionState::Confirming(StepKey::Port),
            SessionState::Summary,
            SessionState::PickingCorrection,
        ] {
            assert_eq!(route(state, InputTag::Resume), Route::Resume);
            assert_eq!(route(state, InputTag::Discard), Route::Discard);
        }
    }
}
