//! Two-stage arithmetic routed by operator symbol
//!
//! The first stage combines `number1` and `number2` into `result`, the
//! second combines `number3` and `number4` into `final_result`. Each stage
//! starts at a routing-only step that branches on its operator.

use serde_json::json;
use std::fmt;
use std::str::FromStr;

use crate::engine::error::GraphError;
use crate::engine::graph::{CompiledGraph, Route, StateGraph, END, START};
use crate::engine::step::{passthrough, StepError};
use crate::waypoint::workflow::{StepRegistry, WorkflowState};

pub const FIRST_ROUTER: &str = "first_router";
pub const ADD: &str = "add_numbers";
pub const SUBTRACT: &str = "subtract_numbers";
pub const SECOND_ROUTER: &str = "second_router";
pub const ADD_SECOND: &str = "add_numbers2";
pub const SUBTRACT_SECOND: &str = "subtract_numbers2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
}

impl Route for Operator {
    fn all() -> &'static [Self] {
        &[Operator::Add, Operator::Subtract]
    }

    fn label(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::all()
            .iter()
            .copied()
            .find(|op| op.label() == s.trim())
            .ok_or_else(|| format!("unsupported operator '{}', expected '+' or '-'", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticState {
    pub number1: i64,
    pub number2: i64,
    pub operation1: Operator,
    pub number3: i64,
    pub number4: i64,
    pub operation2: Operator,
    pub result: Option<String>,
    pub final_result: Option<String>,
}

impl ArithmeticState {
    /// State for the single-stage graph; the second operands are unused
    pub fn single(number1: i64, number2: i64, operation: Operator) -> Self {
        Self {
            number1,
            number2,
            operation1: operation,
            number3: 0,
            number4: 0,
            operation2: Operator::Add,
            result: None,
            final_result: None,
        }
    }
}

/// Sentence describing `a op b`
pub fn describe(a: i64, b: i64, op: Operator) -> Result<String, StepError> {
    match op {
        Operator::Add => {
            let sum = a
                .checked_add(b)
                .ok_or_else(|| format!("the sum of {} and {} overflows", a, b))?;
            Ok(format!("The sum of {} and {} is {}", a, b, sum))
        }
        Operator::Subtract => {
            let difference = a
                .checked_sub(b)
                .ok_or_else(|| format!("the difference of {} and {} overflows", a, b))?;
            Ok(format!("The difference of {} and {} is {}", a, b, difference))
        }
    }
}

fn first_stage(op: Operator) -> impl Fn(ArithmeticState) -> Result<ArithmeticState, StepError> {
    move |mut state: ArithmeticState| -> Result<ArithmeticState, StepError> {
        state.result = Some(describe(state.number1, state.number2, op)?);
        Ok(state)
    }
}

fn second_stage(op: Operator) -> impl Fn(ArithmeticState) -> Result<ArithmeticState, StepError> {
    move |mut state: ArithmeticState| -> Result<ArithmeticState, StepError> {
        state.final_result = Some(describe(state.number3, state.number4, op)?);
        Ok(state)
    }
}

fn add_first_stage(graph: &mut StateGraph<ArithmeticState>) -> Result<(), GraphError> {
    graph
        .add_shared_step(FIRST_ROUTER, passthrough())?
        .add_step(ADD, first_stage(Operator::Add))?
        .add_step(SUBTRACT, first_stage(Operator::Subtract))?
        .add_edge(START, FIRST_ROUTER)?
        .add_routed_edge(
            FIRST_ROUTER,
            |state: &ArithmeticState| state.operation1,
            [(Operator::Add, ADD), (Operator::Subtract, SUBTRACT)],
        )?;
    Ok(())
}

/// Both stages chained: first router → first operation → second router →
/// second operation
pub fn graph() -> Result<CompiledGraph<ArithmeticState>, GraphError> {
    let mut graph = StateGraph::new("arithmetic");
    add_first_stage(&mut graph)?;

    graph
        .add_shared_step(SECOND_ROUTER, passthrough())?
        .add_step(ADD_SECOND, second_stage(Operator::Add))?
        .add_step(SUBTRACT_SECOND, second_stage(Operator::Subtract))?
        .add_edge(ADD, SECOND_ROUTER)?
        .add_edge(SUBTRACT, SECOND_ROUTER)?
        .add_routed_edge(
            SECOND_ROUTER,
            |state: &ArithmeticState| state.operation2,
            [
                (Operator::Add, ADD_SECOND),
                (Operator::Subtract, SUBTRACT_SECOND),
            ],
        )?
        .add_finish(ADD_SECOND)?
        .add_finish(SUBTRACT_SECOND)?;

    graph.finalize()
}

/// Only the first stage; both operations end the run
pub fn single_stage_graph() -> Result<CompiledGraph<ArithmeticState>, GraphError> {
    let mut graph = StateGraph::new("arithmetic_single");
    add_first_stage(&mut graph)?;

    graph
        .add_edge(ADD, END)?
        .add_edge(SUBTRACT, END)?
        .add_finish(ADD)?
        .add_finish(SUBTRACT)?;

    graph.finalize()
}

/// Register the four operation steps for use from workflow files.
///
/// They read integer operands from the open state and write the sentence
/// to `result` (first stage) or `final_result` (second stage).
pub fn register_workflow_steps(registry: &StepRegistry) {
    let stages = [
        (ADD, "number1", "number2", "result", Operator::Add),
        (SUBTRACT, "number1", "number2", "result", Operator::Subtract),
        (ADD_SECOND, "number3", "number4", "final_result", Operator::Add),
        (SUBTRACT_SECOND, "number3", "number4", "final_result", Operator::Subtract),
    ];

    for (name, left, right, output, op) in stages {
        registry.register_fn(
            name,
            move |mut state: WorkflowState| -> Result<WorkflowState, StepError> {
                let sentence = describe(state.require_i64(left)?, state.require_i64(right)?, op)?;
                state.update(output, json!(sentence));
                Ok(state)
            },
        );
    }
}
