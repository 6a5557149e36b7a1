use tracing::warn;

use super::domain::{SessionId, Step};
use super::store::{CacheError, DraftCache, DraftStore};
use super::validate::{validate_step, ValidationError};

/// Whole-wizard state: editing some step, or terminally submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Editing(Step),
    Submitted,
}

/// Errors raised while moving through the step sequence.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("the wizard has already been submitted")]
    AlreadySubmitted,
    #[error("already at the final step; submission completes the wizard")]
    AtFinalStep,
}

/// Owns the linear step progression. The navigator knows step identifiers
/// and their order, never step content: validation and slice extraction
/// are delegated per step.
#[derive(Debug)]
pub struct WizardNavigator {
    state: WizardState,
}

impl WizardNavigator {
    pub fn new() -> Self {
        Self {
            state: WizardState::Editing(Step::first()),
        }
    }

    /// Resume at a previously persisted position.
    pub fn at(step: Step) -> Self {
        Self {
            state: WizardState::Editing(step),
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn current(&self) -> Option<Step> {
        match self.state {
            WizardState::Editing(step) => Some(step),
            WizardState::Submitted => None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.state == WizardState::Submitted
    }

    /// Validate the current step, persist its slice, and move forward.
    /// Validation failure leaves the position (and cache) untouched.
    /// Advancing never skips: the only reachable next position is the
    /// immediately following step.
    pub fn advance(
        &mut self,
        store: &DraftStore,
        cache: &dyn DraftCache,
        session: &SessionId,
    ) -> Result<Step, NavigationError> {
        let step = match self.state {
            WizardState::Editing(step) => step,
            WizardState::Submitted => return Err(NavigationError::AlreadySubmitted),
        };

        validate_step(store.draft(), step)?;
        cache.put_slice(session, &store.slice(step))?;

        let next = step.next().ok_or(NavigationError::AtFinalStep)?;
        cache.put_position(session, next)?;
        self.state = WizardState::Editing(next);
        Ok(next)
    }

    /// Step backward. Always succeeds, never re-validates; at the first
    /// step (or after submission) the position is unchanged.
    pub fn back(&mut self, cache: &dyn DraftCache, session: &SessionId) -> Option<Step> {
        let step = self.current()?;
        let previous = step.previous()?;
        self.state = WizardState::Editing(previous);
        if let Err(err) = cache.put_position(session, previous) {
            warn!(%session, %err, "failed to persist wizard position on back");
        }
        Some(previous)
    }

    pub fn mark_submitted(&mut self) {
        self.state = WizardState::Submitted;
    }
}

impl Default for WizardNavigator {
    fn default() -> Self {
        Self::new()
    }
}
