//! Resumable sessions over a compiled graph
//!
//! A session runs the graph once from its entry step, keeps the resulting
//! state, and on every submission re-enters the graph at a declared resume
//! point with the caller's input applied to that state.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::error::GraphError;
use super::graph::CompiledGraph;

type FinishedFn<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;

/// A long-lived run that accepts input between graph passes
pub struct Session<S> {
    id: Uuid,
    graph: Arc<CompiledGraph<S>>,
    resume_at: String,
    state: S,
    submissions: usize,
    is_finished: FinishedFn<S>,
}

impl<S: Clone> Session<S> {
    /// Run `graph` from its entry step and keep the state for later input.
    ///
    /// `resume_at` must be declared with
    /// [`add_resume_point`](super::graph::StateGraph::add_resume_point).
    /// `is_finished` tells the session when no more input is accepted.
    pub fn start<F>(
        graph: Arc<CompiledGraph<S>>,
        resume_at: impl Into<String>,
        initial: S,
        is_finished: F,
    ) -> Result<Self, GraphError>
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        let resume_at = resume_at.into();
        if !graph.is_resume_point(&resume_at) {
            return Err(GraphError::NotResumable(resume_at));
        }

        let id = Uuid::new_v4();
        log::info!("Session {} started on graph '{}'", id, graph.name());
        let state = graph.run(initial)?;

        Ok(Self {
            id,
            graph,
            resume_at,
            state,
            submissions: 0,
            is_finished: Box::new(is_finished),
        })
    }

    /// Apply `input` to the current state and re-enter the graph.
    ///
    /// A failing run leaves the previous state in place so the caller can
    /// retry with corrected input.
    pub fn submit<F>(&mut self, input: F) -> Result<&S, GraphError>
    where
        F: FnOnce(&mut S),
    {
        if self.is_finished() {
            return Err(GraphError::SessionFinished(self.id));
        }

        let mut next = self.state.clone();
        input(&mut next);

        self.submissions += 1;
        log::info!(
            "Session {}: submission {} resumes at '{}'",
            self.id,
            self.submissions,
            self.resume_at
        );

        self.state = self.graph.run_from(&self.resume_at, next)?;
        Ok(&self.state)
    }

    /// Identifier used in log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// State after the last completed run
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Consume the session, keeping its state
    pub fn into_state(self) -> S {
        self.state
    }

    /// Number of submissions that started a run
    pub fn submissions(&self) -> usize {
        self.submissions
    }

    /// Whether the session stopped accepting input
    pub fn is_finished(&self) -> bool {
        (self.is_finished)(&self.state)
    }
}

impl<S: fmt::Debug> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("graph", &self.graph.name())
            .field("resume_at", &self.resume_at)
            .field("submissions", &self.submissions)
            .field("state", &self.state)
            .finish()
    }
}
