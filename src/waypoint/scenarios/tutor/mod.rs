//! Adaptive math quiz
//!
//! ```text
//! greet ─▶ present_problem ■
//!
//! answer_router (resume) ─┬─ hint ────▶ give_hint ■
//!                         ├─ attempt ─▶ check_answer ─┬─ continue ─▶ present_problem ■
//!                         │                           └─ finished ─▶ end_session ■
//!                         └─ missing ─▶ END
//! ```
//!
//! The first run greets and poses a problem. Every answer re-enters the
//! graph at `answer_router`.

mod problems;
mod session;
mod state;
mod steps;

pub use problems::{Operation, Problem, ProblemSource, RandomProblems, PRAISE};
pub use session::TutorSession;
pub use state::{Answer, Difficulty, TutorState};
pub use steps::{AnswerRoute, Progress, TutorSteps};

use std::sync::Arc;

use crate::engine::error::GraphError;
use crate::engine::graph::{CompiledGraph, StateGraph, END};
use crate::engine::step::passthrough;
use crate::waypoint::config::TutorConfig;

pub const GREET: &str = "greet";
pub const PRESENT_PROBLEM: &str = "present_problem";
pub const ANSWER_ROUTER: &str = "answer_router";
pub const GIVE_HINT: &str = "give_hint";
pub const CHECK_ANSWER: &str = "check_answer";
pub const END_SESSION: &str = "end_session";

pub fn graph(
    config: TutorConfig,
    source: Arc<dyn ProblemSource>,
) -> Result<CompiledGraph<TutorState>, GraphError> {
    let tutor = Arc::new(TutorSteps::new(config, source));
    let mut graph = StateGraph::new("tutor");

    let s = Arc::clone(&tutor);
    graph.add_step(GREET, move |state: TutorState| s.greet(state))?;
    let s = Arc::clone(&tutor);
    graph.add_step(PRESENT_PROBLEM, move |state: TutorState| s.present_problem(state))?;
    let s = Arc::clone(&tutor);
    graph.add_step(GIVE_HINT, move |state: TutorState| s.give_hint(state))?;
    let s = Arc::clone(&tutor);
    graph.add_step(CHECK_ANSWER, move |state: TutorState| s.check_answer(state))?;
    let s = Arc::clone(&tutor);
    graph.add_step(END_SESSION, move |state: TutorState| s.end_session(state))?;
    graph.add_shared_step(ANSWER_ROUTER, passthrough())?;

    graph
        .set_entry(GREET)?
        .add_edge(GREET, PRESENT_PROBLEM)?
        .add_resume_point(ANSWER_ROUTER)?
        .add_routed_edge(
            ANSWER_ROUTER,
            steps::route_answer,
            [
                (AnswerRoute::Hint, GIVE_HINT),
                (AnswerRoute::Attempt, CHECK_ANSWER),
                (AnswerRoute::Missing, END),
            ],
        )?
        .add_routed_edge(
            CHECK_ANSWER,
            steps::route_progress,
            [
                (Progress::Continue, PRESENT_PROBLEM),
                (Progress::Finished, END_SESSION),
            ],
        )?
        .add_finish(PRESENT_PROBLEM)?
        .add_finish(GIVE_HINT)?
        .add_finish(END_SESSION)?;

    graph.finalize_strict()
}
