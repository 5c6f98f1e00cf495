//! Edge types connecting steps

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Destination that stops the run
pub const END: &str = "__end__";

/// Source alias for the entry point: `add_edge(START, step)` sets the entry
pub const START: &str = "__start__";

/// Routing function that inspects the state and returns a branch label
pub type Selector<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Kind of outgoing edge a step owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Unconditional,
    Conditional,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Unconditional => write!(f, "unconditional"),
            EdgeKind::Conditional => write!(f, "conditional"),
        }
    }
}

/// A branching edge: the selector picks a label, the route table maps it to
/// the next step (or [`END`]).
pub struct ConditionalEdge<S> {
    pub selector: Selector<S>,
    pub routes: BTreeMap<String, String>,
}

impl<S> ConditionalEdge<S> {
    /// Destination for `label`, if one is mapped
    pub fn destination(&self, label: &str) -> Option<&str> {
        self.routes.get(label).map(String::as_str)
    }
}

impl<S> Clone for ConditionalEdge<S> {
    fn clone(&self) -> Self {
        Self {
            selector: Arc::clone(&self.selector),
            routes: self.routes.clone(),
        }
    }
}

/// A closed set of branch labels.
///
/// Selectors that return a `Route` get their route table checked for full
/// coverage when the edge is added, instead of failing on the first run
/// that takes the missing branch.
pub trait Route: Copy + Send + Sync + 'static {
    /// Every variant the selector can return
    fn all() -> &'static [Self];

    /// Label stored in the route table
    fn label(&self) -> &'static str;
}
