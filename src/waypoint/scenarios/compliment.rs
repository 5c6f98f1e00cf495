//! Single-step graph that turns a name into a compliment

use crate::engine::error::GraphError;
use crate::engine::graph::{CompiledGraph, StateGraph};
use crate::engine::step::StepError;

pub const STEP: &str = "personalized_compliment";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplimentState {
    /// The name going in, the compliment coming out
    pub message: String,
}

impl ComplimentState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            message: name.into(),
        }
    }
}

pub fn personalized_compliment(mut state: ComplimentState) -> Result<ComplimentState, StepError> {
    state.message = format!(
        "Hey {}! You are doing a fantastic job! Keep up the great work!",
        state.message
    );
    Ok(state)
}

pub fn graph() -> Result<CompiledGraph<ComplimentState>, GraphError> {
    let mut graph = StateGraph::new("compliment");
    graph
        .add_step(STEP, personalized_compliment)?
        .set_entry(STEP)?
        .add_finish(STEP)?;
    graph.finalize()
}
