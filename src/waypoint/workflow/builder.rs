//! Workflow builder - turns YAML definitions into runnable graphs
//!
//! Every node becomes one step over [`WorkflowState`]: the registered step
//! named by `uses` runs first, then each `set` template is rendered against
//! that result, converted to the field's declared type and written through
//! the field's reducer.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::condition::{self, Expression};
use super::loader::WorkflowLoader;
use super::registry::StepRegistry;
use super::state::{StateSchema, WorkflowState};
use super::template;
use super::types::{BranchDefinition, EdgeDefinition, NodeDefinition, WorkflowDefinition};
use crate::engine::error::{WaypointError, WorkflowError};
use crate::engine::graph::{CompiledGraph, StateGraph};
use crate::engine::session::Session;
use crate::engine::step::{Step, StepError};

/// Label produced by a `branches` edge when no condition holds
pub const NO_MATCHING_BRANCH: &str = "<no matching branch>";

/// A finalized workflow together with the schema of its state
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    pub description: String,
    schema: StateSchema,
    graph: Arc<CompiledGraph<WorkflowState>>,
}

impl Workflow {
    /// The compiled graph
    pub fn graph(&self) -> &CompiledGraph<WorkflowState> {
        &self.graph
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Build the initial state from schema defaults and `input`
    pub fn initial_state(&self, input: Value) -> Result<WorkflowState, WaypointError> {
        Ok(WorkflowState::from_json(&self.schema, input)?)
    }

    /// Run the workflow once from its entry node
    pub fn run(&self, input: Value) -> Result<WorkflowState, WaypointError> {
        let state = self.initial_state(input)?;
        Ok(self.graph.run(state)?)
    }

    /// Start a session that re-enters at `resume_at` on every submission
    /// and stops accepting input once `finished_when` holds.
    pub fn session(
        &self,
        resume_at: &str,
        input: Value,
        finished_when: &str,
    ) -> Result<Session<WorkflowState>, WaypointError> {
        let finished = condition::parse(finished_when)?;
        let state = self.initial_state(input)?;

        Ok(Session::start(
            Arc::clone(&self.graph),
            resume_at,
            state,
            move |state: &WorkflowState| condition::evaluate(&finished, state),
        )?)
    }
}

/// High-level builder for constructing workflows from YAML definitions
pub struct WorkflowBuilder {
    loader: WorkflowLoader,
    registry: StepRegistry,
}

impl WorkflowBuilder {
    pub fn new(registry: StepRegistry) -> Self {
        Self {
            loader: WorkflowLoader::new(),
            registry,
        }
    }

    /// Build a workflow from a YAML file path
    pub fn build_file<P: AsRef<Path>>(&self, path: P) -> Result<Workflow, WaypointError> {
        let def = self.loader.load_workflow(path)?;
        self.build(&def)
    }

    /// Build a workflow from a parsed definition
    pub fn build(&self, def: &WorkflowDefinition) -> Result<Workflow, WaypointError> {
        let mut graph = StateGraph::new(def.name.clone());

        for node in &def.nodes {
            let step = self.node_step(node)?;
            graph.add_shared_step(node.id.clone(), step)?;
        }

        graph.set_entry(def.entry.clone())?;
        for name in def.finish.to_vec() {
            graph.add_finish(name)?;
        }
        for name in def.resume.to_vec() {
            graph.add_resume_point(name)?;
        }

        for edge in &def.edges {
            match edge {
                EdgeDefinition::Direct { from, to } => {
                    graph.add_edge(from.clone(), to.clone())?;
                }
                EdgeDefinition::Selector {
                    from,
                    selector,
                    routes,
                } => {
                    let path = selector.clone();
                    graph.add_conditional_edge(
                        from.clone(),
                        move |state: &WorkflowState| selector_label(state, &path),
                        routes.clone(),
                    )?;
                }
                EdgeDefinition::Branches { from, branches } => {
                    let (guards, routes) = compile_branches(branches)?;
                    graph.add_conditional_edge(
                        from.clone(),
                        move |state: &WorkflowState| first_matching(&guards, state),
                        routes,
                    )?;
                }
            }
        }

        let compiled = graph.finalize()?;
        log::info!(
            "Built workflow '{}' with {} nodes and {} edges",
            def.name,
            def.nodes.len(),
            def.edges.len()
        );

        Ok(Workflow {
            name: def.name.clone(),
            description: def.description.clone(),
            schema: def.state.clone().unwrap_or_default(),
            graph: Arc::new(compiled),
        })
    }

    fn node_step(
        &self,
        node: &NodeDefinition,
    ) -> Result<Arc<dyn Step<WorkflowState>>, WorkflowError> {
        let inner = match &node.uses {
            Some(name) => Some(
                self.registry
                    .get(name)
                    .ok_or_else(|| WorkflowError::UnregisteredStep(name.clone()))?,
            ),
            None => None,
        };
        let set = node.set.clone();

        let step: Arc<dyn Step<WorkflowState>> = Arc::new(
            move |state: WorkflowState| -> Result<WorkflowState, StepError> {
                let mut state = match &inner {
                    Some(step) => step.run(state)?,
                    None => state,
                };
                apply_templates(&set, &mut state)?;
                Ok(state)
            },
        );
        Ok(step)
    }
}

/// Render every template against the same snapshot, then write them all
fn apply_templates(
    set: &BTreeMap<String, String>,
    state: &mut WorkflowState,
) -> Result<(), WorkflowError> {
    let mut rendered = Vec::with_capacity(set.len());
    for (field, text) in set {
        rendered.push((field, template::render(text, state)?));
    }

    for (field, text) in rendered {
        state.set_text(field, text)?;
    }
    Ok(())
}

/// The value at `path` as a route label; unset reads as `null`
fn selector_label(state: &WorkflowState, path: &str) -> String {
    state
        .get_path(path)
        .map(template::display)
        .unwrap_or_else(|| "null".to_string())
}

type Guards = Vec<(Expression, String)>;

fn compile_branches(
    branches: &[BranchDefinition],
) -> Result<(Guards, BTreeMap<String, String>), WorkflowError> {
    let mut guards = Vec::with_capacity(branches.len());
    let mut routes = BTreeMap::new();

    for branch in branches {
        guards.push((condition::parse(&branch.when)?, branch.to.clone()));
        routes.insert(branch.to.clone(), branch.to.clone());
    }
    Ok((guards, routes))
}

fn first_matching(guards: &Guards, state: &WorkflowState) -> String {
    guards
        .iter()
        .find(|(when, _)| condition::evaluate(when, state))
        .map(|(_, to)| to.clone())
        .unwrap_or_else(|| NO_MATCHING_BRANCH.to_string())
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new(StepRegistry::new())
    }
}
