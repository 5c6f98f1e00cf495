//! YAML schema types for workflow definitions
//!
//! This module contains the data structures parsed from workflow YAML
//! files. See `workflows/` at the repository root for complete files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::state::StateSchema;

/// Top-level workflow definition
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Declared state fields (types, reducers and defaults)
    pub state: Option<StateSchema>,
    /// Node the run starts from
    pub entry: String,
    /// Terminal nodes
    #[serde(default)]
    pub finish: StepList,
    /// Nodes a session may re-enter the graph at
    #[serde(default)]
    pub resume: StepList,
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

/// A node in a workflow graph
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeDefinition {
    /// Unique node identifier
    pub id: String,
    /// Registered step to run, before `set` is applied
    pub uses: Option<String>,
    /// Field name → template rendered against the incoming state
    #[serde(default)]
    pub set: BTreeMap<String, String>,
}

/// An outgoing edge. Which form is meant is decided by the keys present.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum EdgeDefinition {
    /// Route on the value stored at a state path
    Selector {
        from: String,
        selector: String,
        routes: BTreeMap<String, String>,
    },
    /// Route to the first branch whose condition holds
    Branches {
        from: String,
        branches: Vec<BranchDefinition>,
    },
    /// Always continue to `to`
    Direct { from: String, to: String },
}

/// One guarded branch of a `branches` edge
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BranchDefinition {
    pub when: String,
    pub to: String,
}

/// Step names given as a single string or a list
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(untagged)]
pub enum StepList {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl StepList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            StepList::None => vec![],
            StepList::Single(s) => vec![s.clone()],
            StepList::Multiple(v) => v.clone(),
        }
    }
}

impl EdgeDefinition {
    /// Node the edge leaves from
    pub fn from(&self) -> &str {
        match self {
            EdgeDefinition::Selector { from, .. }
            | EdgeDefinition::Branches { from, .. }
            | EdgeDefinition::Direct { from, .. } => from,
        }
    }
}
