//! Typed error handling for waypoint-rs
//!
//! `GraphError` covers building and running step graphs, `WorkflowError`
//! covers the declarative YAML layer, and `WaypointError` is the top-level
//! error the application surfaces.

use thiserror::Error;
use uuid::Uuid;

use super::graph::EdgeKind;
use super::step::StepError;

/// Top-level error type for waypoint-rs
#[derive(Debug, Error)]
pub enum WaypointError {
    /// Graph construction or execution errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Declarative workflow errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Configuration errors (invalid env vars, invalid config values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Errors raised while building or running a step graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// A step with this name is already registered
    #[error("Step '{0}' is already registered")]
    DuplicateStep(String),

    /// A referenced step was never registered
    #[error("Step '{0}' is not registered")]
    UnknownStep(String),

    /// `finalize` was called before an entry step was set
    #[error("Graph has no entry point")]
    NoEntryPoint,

    /// A selector produced a label with no mapped destination
    #[error("Step '{step}' routed to label '{label}' which has no destination")]
    UnroutableLabel { step: String, label: String },

    /// A step already owns an outgoing edge of this kind
    #[error("Step '{step}' already has an outgoing {kind} edge")]
    DuplicateEdge { step: String, kind: EdgeKind },

    /// A step cannot be reached from the entry point or any resume point
    #[error("Step '{0}' is not reachable from the entry point")]
    UnreachableStep(String),

    /// A step function failed; the original error is kept as the source
    #[error("Step '{step}' failed: {source}")]
    Step { step: String, source: StepError },

    /// The session reached its terminal state
    #[error("Session {0} has already finished")]
    SessionFinished(Uuid),

    /// The step was not declared as a resume point
    #[error("Step '{0}' is not a resume point")]
    NotResumable(String),
}

/// Errors raised by the declarative workflow layer
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A node refers to a step name missing from the registry
    #[error("Step '{0}' is not in the registry")]
    UnregisteredStep(String),

    /// A `when` expression could not be parsed
    #[error("Invalid condition '{condition}': {reason}")]
    InvalidCondition { condition: String, reason: String },

    /// A `set` template could not be rendered
    #[error("Invalid template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// A state field is missing or has the wrong type
    #[error("Field '{field}' {reason}")]
    InvalidField { field: String, reason: String },

    /// Workflow file not found
    #[error("Workflow file not found: {0}")]
    FileNotFound(String),

    /// The initial state is not a JSON object
    #[error("Initial state must be a JSON object")]
    InvalidInput,
}

impl GraphError {
    /// Name of the step whose function failed, if this is a step failure
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Recover the error the step function returned.
    ///
    /// Returns `Err(self)` for every other variant.
    pub fn into_step_error(self) -> Result<StepError, Self> {
        match self {
            Self::Step { source, .. } => Ok(source),
            other => Err(other),
        }
    }
}

impl WorkflowError {
    /// Create an invalid condition error
    pub fn condition(condition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCondition {
            condition: condition.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid template error
    pub fn template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid field error
    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl WaypointError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for WaypointError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for WaypointError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("division by zero")]
    struct DivideByZero;

    #[test]
    fn test_step_error_keeps_original() {
        let err = GraphError::Step {
            step: "divide".to_string(),
            source: Box::new(DivideByZero),
        };
        assert_eq!(err.failed_step(), Some("divide"));
        assert_eq!(err.to_string(), "Step 'divide' failed: division by zero");

        let original = err.into_step_error().unwrap();
        assert!(original.downcast_ref::<DivideByZero>().is_some());
    }

    #[test]
    fn test_into_step_error_passes_other_variants_back() {
        let err = GraphError::NoEntryPoint.into_step_error().unwrap_err();
        assert!(matches!(err, GraphError::NoEntryPoint));
    }

    #[test]
    fn test_graph_error_converts_to_top_level() {
        let err: WaypointError = GraphError::UnknownStep("ghost".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Graph error: Step 'ghost' is not registered"
        );
    }

    #[test]
    fn test_string_conversions() {
        let err: WaypointError = "plain".into();
        assert!(matches!(err, WaypointError::Other(ref m) if m == "plain"));
    }
}
