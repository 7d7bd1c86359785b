#![warn(missing_docs)]
//! # notewall-ui
//!
//! ## Purpose
//! Collaborator-facing state for the host UI: the onboarding step sequence and
//! a display projection of handoff progress.
//!
//! ## Responsibilities
//! - Model onboarding as one "current step" value moved only by explicit
//!   navigation ([`OnboardingFlow::advance`], [`OnboardingFlow::back`],
//!   [`OnboardingFlow::skip_to`]).
//! - Project [`SessionState`] and [`HandoffOutcome`] into headline text and a
//!   suggested [`Remedy`].
//!
//! ## Data flow
//! Host navigation events mutate [`OnboardingFlow`]; handoff events from the
//! bus are folded into [`HandoffStatusView`], which drives rendered status.
//!
//! ## Ownership and lifetimes
//! Views own their strings so they can be sent across threads to the host.
//!
//! ## Error model
//! No recoverable errors. Navigation past either end of the sequence is a
//! no-op that reports `false`.
//!
//! ## Privacy notes
//! Views never carry note text or file paths.

use notewall_handoff::{
    CompletionSource, HandoffEvent, HandoffFailure, HandoffOutcome, SessionState,
    TriggerRejection,
};
use serde::{Deserialize, Serialize};

/// Flag persisted once onboarding finishes.
pub const SETUP_COMPLETED_FLAG: &str = "setup_completed";

/// One screen of the onboarding sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    /// Introduction.
    Welcome,
    /// Install the automation that applies wallpapers.
    InstallAutomation,
    /// Pick a background color or image.
    ChooseBackground,
    /// Enter the first notes.
    WriteNotes,
    /// First render and handoff.
    ApplyWallpaper,
    /// Finished.
    Done,
}

impl OnboardingStep {
    /// Every step in display order.
    pub const ALL: [OnboardingStep; 6] = [
        OnboardingStep::Welcome,
        OnboardingStep::InstallAutomation,
        OnboardingStep::ChooseBackground,
        OnboardingStep::WriteNotes,
        OnboardingStep::ApplyWallpaper,
        OnboardingStep::Done,
    ];

    /// Zero-based position in [`OnboardingStep::ALL`].
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|step| *step == self)
            .unwrap_or_default()
    }

    /// Following step, if any.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Preceding step, if any.
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|index| Self::ALL[index])
    }
}

/// Current onboarding position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingFlow {
    step: OnboardingStep,
}

impl OnboardingFlow {
    /// Flow at [`OnboardingStep::Welcome`].
    pub fn new() -> Self {
        Self {
            step: OnboardingStep::Welcome,
        }
    }

    /// Flow resumed from a persisted `setup_completed` flag.
    pub fn resume(setup_completed: bool) -> Self {
        if setup_completed {
            Self {
                step: OnboardingStep::Done,
            }
        } else {
            Self::new()
        }
    }

    /// Current step.
    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    /// Returns `true` once the flow reached [`OnboardingStep::Done`].
    pub fn is_complete(&self) -> bool {
        self.step == OnboardingStep::Done
    }

    /// Moves one step forward; `false` at the last step.
    pub fn advance(&mut self) -> bool {
        self.move_to(self.step.next())
    }

    /// Moves one step back; `false` at the first step.
    pub fn back(&mut self) -> bool {
        self.move_to(self.step.previous())
    }

    /// Jumps directly to `step`.
    pub fn skip_to(&mut self, step: OnboardingStep) {
        self.step = step;
    }

    /// Completed fraction in `[0, 1]` for a progress indicator.
    pub fn progress(&self) -> f32 {
        self.step.index() as f32 / (OnboardingStep::ALL.len() - 1) as f32
    }

    fn move_to(&mut self, step: Option<OnboardingStep>) -> bool {
        match step {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }
}

impl Default for OnboardingFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Action the host should offer after a failed or stuck handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remedy {
    /// The automation is missing or misnamed; guide the user to install it.
    InstallAutomation,
    /// Transient failure; offer to run the handoff again.
    TryAgain,
    /// Content could not be rendered; send the user back to their notes.
    ReviewNotes,
}

/// Display projection of one session's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffStatusView {
    /// Last state seen.
    pub state: SessionState,
    /// Short status line.
    pub headline: String,
    /// Whether a spinner should show.
    pub busy: bool,
    /// Suggested action, for failures only.
    pub remedy: Option<Remedy>,
}

impl HandoffStatusView {
    /// View for a session that has not started.
    pub fn idle() -> Self {
        Self::for_state(SessionState::Idle)
    }

    /// View for a non-terminal state, or a terminal one without details.
    pub fn for_state(state: SessionState) -> Self {
        let headline = match state {
            SessionState::Idle => "Ready",
            SessionState::Rendering => "Rendering wallpapers",
            SessionState::Persisted | SessionState::Verifying => "Saving wallpapers",
            SessionState::Triggering => "Opening automation",
            SessionState::AwaitingExternalCompletion => "Applying wallpapers",
            SessionState::Completed => "Wallpapers updated",
            SessionState::Failed => "Could not update wallpapers",
            SessionState::Cancelled => "Update cancelled",
        };
        Self {
            state,
            headline: headline.to_string(),
            busy: !state.is_terminal() && state != SessionState::Idle,
            remedy: None,
        }
    }

    /// View for a terminal outcome.
    pub fn for_outcome(outcome: &HandoffOutcome) -> Self {
        let mut view = Self::for_state(outcome.terminal_state());
        match outcome {
            HandoffOutcome::Completed {
                source: CompletionSource::AssumedAfterForeground,
            } => view.headline = "Wallpapers probably updated".to_string(),
            HandoffOutcome::Completed { .. } | HandoffOutcome::Cancelled => {}
            HandoffOutcome::Failed { failure } => {
                view.headline = failure_headline(failure).to_string();
                view.remedy = Some(remedy_for(failure));
            }
        }
        view
    }

    /// Folds one bus event into the view.
    pub fn apply(&mut self, event: &HandoffEvent) {
        *self = match event {
            HandoffEvent::StateChanged { state, .. } if !state.is_terminal() => {
                Self::for_state(*state)
            }
            // Terminal states wait for `Finished`, which carries the details.
            HandoffEvent::StateChanged { .. } => return,
            HandoffEvent::Finished { outcome, .. } => Self::for_outcome(outcome),
        };
    }
}

impl Default for HandoffStatusView {
    fn default() -> Self {
        Self::idle()
    }
}

/// Suggested action for a failure.
pub fn remedy_for(failure: &HandoffFailure) -> Remedy {
    match failure {
        HandoffFailure::TriggerRejected(
            TriggerRejection::NotInstalled | TriggerRejection::MalformedUri,
        ) => Remedy::InstallAutomation,
        HandoffFailure::Compose(_) => Remedy::ReviewNotes,
        HandoffFailure::Persist(_)
        | HandoffFailure::VerificationTimeout { .. }
        | HandoffFailure::TriggerRejected(TriggerRejection::Declined) => Remedy::TryAgain,
    }
}

fn failure_headline(failure: &HandoffFailure) -> &'static str {
    match failure {
        HandoffFailure::Compose(_) => "Could not render your notes",
        HandoffFailure::Persist(_) => "Could not save wallpapers",
        HandoffFailure::VerificationTimeout { .. } => "Saving wallpapers took too long",
        HandoffFailure::TriggerRejected(TriggerRejection::NotInstalled) => {
            "Wallpaper automation is not installed"
        }
        HandoffFailure::TriggerRejected(TriggerRejection::MalformedUri) => {
            "Wallpaper automation is misconfigured"
        }
        HandoffFailure::TriggerRejected(TriggerRejection::Declined) => {
            "Wallpaper automation did not start"
        }
    }
}
