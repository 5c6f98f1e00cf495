//! Ready-made graphs built on the engine
//!
//! Each module owns its state type, its step functions and a `graph()`
//! constructor returning the finalized graph.

pub mod arithmetic;
pub mod calculator;
pub mod compliment;
pub mod profile;
pub mod tutor;
