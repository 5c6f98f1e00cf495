//! Three steps in a row, each extending the same sentence

use crate::engine::error::GraphError;
use crate::engine::graph::{CompiledGraph, StateGraph};
use crate::engine::step::StepError;

pub const GREET: &str = "greet";
pub const DESCRIBE_AGE: &str = "describe_age";
pub const DESCRIBE_SKILLS: &str = "describe_skills";

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileState {
    pub name: String,
    pub age: u32,
    pub skills: Vec<String>,
    pub result: Option<String>,
}

impl ProfileState {
    pub fn new<I, T>(name: impl Into<String>, age: u32, skills: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            age,
            skills: skills.into_iter().map(Into::into).collect(),
            result: None,
        }
    }

    fn extend_result(&mut self, sentence: String) -> Result<(), StepError> {
        let result = self
            .result
            .as_mut()
            .ok_or("result has not been started by the greeting")?;
        result.push(' ');
        result.push_str(&sentence);
        Ok(())
    }
}

pub fn greet(mut state: ProfileState) -> Result<ProfileState, StepError> {
    state.result = Some(format!(
        "Hey {}, welcome to the world of agents!",
        state.name
    ));
    Ok(state)
}

pub fn describe_age(mut state: ProfileState) -> Result<ProfileState, StepError> {
    let sentence = format!("You are {} years old.", state.age);
    state.extend_result(sentence)?;
    Ok(state)
}

pub fn describe_skills(mut state: ProfileState) -> Result<ProfileState, StepError> {
    let sentence = format!("You have skills in: {:?}.", state.skills);
    state.extend_result(sentence)?;
    Ok(state)
}

pub fn graph() -> Result<CompiledGraph<ProfileState>, GraphError> {
    let mut graph = StateGraph::new("profile");
    graph
        .add_step(GREET, greet)?
        .add_step(DESCRIBE_AGE, describe_age)?
        .add_step(DESCRIBE_SKILLS, describe_skills)?
        .set_entry(GREET)?
        .add_edge(GREET, DESCRIBE_AGE)?
        .add_edge(DESCRIBE_AGE, DESCRIBE_SKILLS)?
        .add_finish(DESCRIBE_SKILLS)?;
    graph.finalize()
}
