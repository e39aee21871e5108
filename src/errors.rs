use thiserror::Error;

use crate::session::Step;

/// Failures of a single plan generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("missing credentials for {0} provider")] MissingCredentials(String),
    #[error("generation unavailable: {0}")] GenerationUnavailable(String),
    #[error("invalid plan payload: {0}")] InvalidPlanPayload(String),
}

/// A session command that could not be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{command} is not allowed while in {step}")]
    NotAllowed { command: &'static str, step: Step },
    #[error("a plan request is already in flight")] Busy,
    #[error("no region selected")] MissingRegion,
    #[error("session driver has shut down")] DriverClosed,
}
