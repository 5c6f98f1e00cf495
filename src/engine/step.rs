use std::error::Error;
use std::sync::Arc;

/// Error type returned by step functions.
///
/// Steps keep the boxed error so the runtime can hand the original value back
/// to the caller untouched.
pub type StepError = Box<dyn Error + Send + Sync>;

/// A transformation applied to the state record during a run.
///
/// Implemented for every `Fn(S) -> Result<S, StepError>`, so plain functions
/// and closures can be registered directly.
pub trait Step<S>: Send + Sync {
    /// Consume the current state and return the updated one
    fn run(&self, state: S) -> Result<S, StepError>;
}

impl<S, F> Step<S> for F
where
    F: Fn(S) -> Result<S, StepError> + Send + Sync,
{
    fn run(&self, state: S) -> Result<S, StepError> {
        self(state)
    }
}

/// Step that hands the state through unchanged.
///
/// Useful for routing-only steps whose sole job is to own a conditional edge.
pub fn passthrough<S: 'static>() -> Arc<dyn Step<S>> {
    Arc::new(|state: S| -> Result<S, StepError> { Ok(state) })
}
