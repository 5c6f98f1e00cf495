//! Graph execution kit
//!
//! This module provides the building blocks every scenario is made of:
//! - `Step` - a named transformation of the state record
//! - `StateGraph` / `CompiledGraph` - build, validate and run step graphs
//! - `Session` - re-enter a compiled graph with new input
//! - typed errors for all of the above

pub mod error;
pub mod graph;
pub mod session;
pub mod step;
