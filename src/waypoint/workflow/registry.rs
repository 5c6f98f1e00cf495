use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::state::WorkflowState;
use crate::engine::step::{passthrough, Step, StepError};

/// Name of the built-in step that leaves the state unchanged
pub const NOOP: &str = "noop";

/// Named steps a workflow file can refer to with `uses:`
#[derive(Clone)]
pub struct StepRegistry {
    steps: Arc<RwLock<HashMap<String, Arc<dyn Step<WorkflowState>>>>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        let registry = Self {
            steps: Arc::new(RwLock::new(HashMap::new())),
        };
        registry.register(NOOP, passthrough());
        registry
    }

    /// Register a shared step, replacing any step with the same name
    pub fn register(&self, name: impl Into<String>, step: Arc<dyn Step<WorkflowState>>) {
        let name = name.into();
        let mut steps = self.steps.write().unwrap_or_else(PoisonError::into_inner);
        if steps.insert(name.clone(), step).is_some() {
            log::debug!("Step '{}' re-registered", name);
        }
    }

    /// Register a step function
    pub fn register_fn<F>(&self, name: impl Into<String>, step: F)
    where
        F: Fn(WorkflowState) -> Result<WorkflowState, StepError> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(step));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Step<WorkflowState>>> {
        let steps = self.steps.read().unwrap_or_else(PoisonError::into_inner);
        steps.get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let steps = self.steps.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = steps.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}
