//! The scheduling state machine as a pure function.
//!
//! State is implicit: `pending_flow` plus which selections are present.
//! Timezone actions only ever touch `timezone` and `pending_flow`; date and
//! time selections pass through every timezone round trip untouched.

use cadence_core::{Action, ContextPatch, PendingFlow, SchedulingContext, Timezone};

use crate::errors::RouterError;

/// What the router does after the context patch is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Plan, fetch and populate a widget.
    Render,
    /// Reply with a booking confirmation.
    Schedule,
    /// Reply with a close acknowledgment.
    Close,
}

/// Validated outcome of an action against a context.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Change to merge into the context.
    pub patch: ContextPatch,
    /// Follow-up.
    pub effect: Effect,
}

impl Transition {
    fn render(patch: ContextPatch) -> Self {
        Self {
            patch,
            effect: Effect::Render,
        }
    }
}

/// Validate `action` against `ctx` and compute its transition.
///
/// `is_new` is true only for a session that has not handled any action yet.
/// A rejected action returns an error and implies no context change.
pub fn transition(
    action: &Action,
    ctx: &SchedulingContext,
    is_new: bool,
) -> Result<Transition, RouterError> {
    let reject = |reason: &str| RouterError::InvalidTransition {
        action: action.name(),
        reason: reason.to_string(),
    };

    match action {
        Action::Connect if is_new => Ok(Transition::render(ContextPatch::default())),
        Action::Connect => Err(reject("Session is already connected")),

        Action::SelectDate(sel) | Action::SelectTime(sel) if sel.value.trim().is_empty() => {
            Err(reject("A date or time value is required"))
        }
        Action::SelectDate(sel) => Ok(Transition::render(ContextPatch::default().date(sel.clone()))),
        Action::SelectTime(sel) => Ok(Transition::render(ContextPatch::default().time(sel.clone()))),

        Action::ChangeTimezone => Ok(Transition::render(
            ContextPatch::default().enter_flow(PendingFlow::SelectingTimezone),
        )),

        Action::ConfirmTimezone { .. } | Action::CancelTimezone if !ctx.is_selecting_timezone() => {
            Err(reject("No timezone change is in progress"))
        }
        Action::ConfirmTimezone { abbr } => {
            let tz = Timezone::from_abbr(abbr)
                .ok_or_else(|| reject(&format!("Unsupported timezone: {abbr}")))?;
            Ok(Transition::render(ContextPatch::default().timezone(tz).clear_flow()))
        }
        Action::CancelTimezone => Ok(Transition::render(ContextPatch::default().clear_flow())),

        Action::Submit if !ctx.has_complete_selection() => {
            Err(reject("Please select both a date and a time before scheduling"))
        }
        Action::Submit => Ok(Transition {
            patch: ContextPatch::default(),
            effect: Effect::Schedule,
        }),

        Action::Close => Ok(Transition {
            patch: ContextPatch::default(),
            effect: Effect::Close,
        }),
    }
}
