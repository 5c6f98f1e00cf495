//! Step graphs
//!
//! This module provides the graph builder, which validates steps and edges
//! as they are added, and the compiled graph that walks them at run time.

mod builder;
mod compiled;
mod edge;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, GraphStructure};
pub use edge::{ConditionalEdge, EdgeKind, Route, Selector, END, START};
