//! `when` conditions for workflow branches
//!
//! Conditions are small boolean expressions over state fields:
//! - `operation == '-'`
//! - `streak >= 3 and difficulty != 'hard'`
//! - `not (skills contains 'SQL' or age < 18)`

mod ast;
mod evaluator;
mod parser;

pub use ast::{CompareOp, Expression, Literal};
pub use evaluator::evaluate;
pub use parser::parse;
