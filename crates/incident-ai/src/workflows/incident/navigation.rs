use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::assistant::{ApiError, ChatCompletions, IncidentAssistant};
use super::domain::{ModalInfo, ReportData, ValidationErrors};
use super::steps::{AdvanceGuard, WizardStep};
use super::store::FormState;
use super::validation::{first_invalid_before, validate_step};

/// Result of a navigation request. Failures are reported through the state (error map or
/// modal), so every variant leaves the state consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Moved { from: WizardStep, to: WizardStep },
    /// Validation failed; `step` is the step whose errors are now in the error map.
    Blocked { step: WizardStep },
    GenerationFailed { step: WizardStep },
    /// Boundary or in-flight no-op.
    Unchanged { step: WizardStep },
}

impl NavigationOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// First half of a forward move. `NeedsReport` means validation passed on the generating
/// edge and the caller must await a report, then call [`finish_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Done(NavigationOutcome),
    NeedsReport,
}

pub fn can_proceed(state: &FormState, today: NaiveDate) -> bool {
    state.current_step < WizardStep::LAST
        && !state.generating
        && validate_step(&state.incident, state.current_step, today).is_empty()
}

pub fn begin_next(state: &mut FormState, today: NaiveDate) -> Advance {
    let step = state.current_step;
    if state.generating {
        return Advance::Done(NavigationOutcome::Unchanged { step });
    }
    let Some(edge) = step.advance_edge() else {
        return Advance::Done(NavigationOutcome::Unchanged { step });
    };

    let errors = validate_step(&state.incident, step, today);
    if !errors.is_empty() {
        state.set_errors(errors);
        return Advance::Done(NavigationOutcome::Blocked { step });
    }
    state.set_errors(ValidationErrors::new());

    match edge.guard {
        AdvanceGuard::Validate => {
            state.current_step = edge.to;
            Advance::Done(NavigationOutcome::Moved {
                from: edge.from,
                to: edge.to,
            })
        }
        AdvanceGuard::ValidateAndGenerate => {
            state.generating = true;
            Advance::NeedsReport
        }
    }
}

/// Commit or abandon the generating edge once the report call has returned.
pub fn finish_next(
    state: &mut FormState,
    result: Result<ReportData, ApiError>,
) -> NavigationOutcome {
    state.generating = false;
    let from = state.current_step;

    match result {
        Ok(report) => {
            let to = from
                .advance_edge()
                .map(|edge| edge.to)
                .unwrap_or(WizardStep::LAST);
            state.report = Some(report);
            state.draft = None;
            state.set_errors(ValidationErrors::new());
            state.modal = Some(ModalInfo::success(
                "Report Generated",
                "Your incident report is ready to review and export.",
            ));
            state.current_step = to;
            info!(?from, ?to, "report stored, wizard advanced");
            NavigationOutcome::Moved { from, to }
        }
        Err(err) => {
            warn!(error = %err, retryable = err.is_retryable(), "report generation failed");
            state.modal = Some(ModalInfo::error(
                "Report Generation Failed",
                err.message().to_string(),
            ));
            NavigationOutcome::GenerationFailed { step: from }
        }
    }
}

/// Validate the current step and move forward one step, generating the report when leaving
/// the evidence step.
pub async fn next_step<C>(
    state: &mut FormState,
    assistant: &IncidentAssistant<C>,
    today: NaiveDate,
) -> NavigationOutcome
where
    C: ChatCompletions + 'static,
{
    match begin_next(state, today) {
        Advance::Done(outcome) => outcome,
        Advance::NeedsReport => {
            let result = assistant.generate_report(&state.incident).await;
            finish_next(state, result)
        }
    }
}

pub fn prev_step(state: &mut FormState) -> NavigationOutcome {
    let step = state.current_step;
    if state.generating {
        return NavigationOutcome::Unchanged { step };
    }
    match step.previous() {
        Some(previous) => {
            state.current_step = previous;
            NavigationOutcome::Moved {
                from: step,
                to: previous,
            }
        }
        None => NavigationOutcome::Unchanged { step },
    }
}

/// Jump to `target`. Backward jumps are free; forward jumps need every earlier step to
/// validate, and Review additionally needs an existing report.
pub fn go_to_step(
    state: &mut FormState,
    target: WizardStep,
    today: NaiveDate,
) -> NavigationOutcome {
    let step = state.current_step;
    if state.generating || target == step {
        return NavigationOutcome::Unchanged { step };
    }

    if target < step {
        state.current_step = target;
        return NavigationOutcome::Moved {
            from: step,
            to: target,
        };
    }

    if let Some((failing, errors)) = first_invalid_before(&state.incident, target, today) {
        state.set_errors(errors);
        return NavigationOutcome::Blocked { step: failing };
    }

    if target == WizardStep::Review && state.report.is_none() {
        state.modal = Some(ModalInfo::info(
            "Report Not Generated",
            "Continue from the evidence step to generate your report before reviewing it.",
        ));
        return NavigationOutcome::Unchanged { step };
    }

    state.set_errors(ValidationErrors::new());
    state.current_step = target;
    NavigationOutcome::Moved {
        from: step,
        to: target,
    }
}
