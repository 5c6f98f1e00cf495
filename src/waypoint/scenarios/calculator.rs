//! Single-step graph that sums or multiplies a list of numbers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::error::GraphError;
use crate::engine::graph::{CompiledGraph, StateGraph};
use crate::engine::step::StepError;

pub const STEP: &str = "calculate_result";

/// Operator applied across all numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "*")]
    Multiply,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Add => f.write_str("+"),
            Symbol::Multiply => f.write_str("*"),
        }
    }
}

impl FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Symbol::Add),
            "*" => Ok(Symbol::Multiply),
            other => Err(format!("unsupported symbol '{}', expected '+' or '*'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorState {
    pub name: String,
    pub numbers: Vec<i64>,
    pub symbol: Symbol,
    pub result: Option<String>,
}

impl CalculatorState {
    pub fn new(name: impl Into<String>, numbers: Vec<i64>, symbol: Symbol) -> Self {
        Self {
            name: name.into(),
            numbers,
            symbol,
            result: None,
        }
    }
}

pub fn calculate_result(mut state: CalculatorState) -> Result<CalculatorState, StepError> {
    let (word, value) = match state.symbol {
        Symbol::Add => (
            "sum",
            state
                .numbers
                .iter()
                .try_fold(0i64, |acc, n| acc.checked_add(*n)),
        ),
        Symbol::Multiply => (
            "product",
            state
                .numbers
                .iter()
                .try_fold(1i64, |acc, n| acc.checked_mul(*n)),
        ),
    };
    let value = value.ok_or_else(|| format!("the {} of {:?} overflows", word, state.numbers))?;

    state.result = Some(format!(
        "Hey {}, The {} of {:?} is {}",
        state.name, word, state.numbers, value
    ));
    Ok(state)
}

pub fn graph() -> Result<CompiledGraph<CalculatorState>, GraphError> {
    let mut graph = StateGraph::new("calculator");
    graph
        .add_step(STEP, calculate_result)?
        .set_entry(STEP)?
        .add_finish(STEP)?;
    graph.finalize()
}
