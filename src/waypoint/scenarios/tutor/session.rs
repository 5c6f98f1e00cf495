use std::sync::Arc;
use uuid::Uuid;

use super::problems::ProblemSource;
use super::state::{Answer, TutorState};
use super::{graph, ANSWER_ROUTER};
use crate::engine::error::{GraphError, WaypointError};
use crate::engine::session::Session;
use crate::waypoint::config::TutorConfig;

/// One student's quiz, from greeting to final score
#[derive(Debug)]
pub struct TutorSession {
    inner: Session<TutorState>,
}

impl TutorSession {
    /// Greet the student and present the first problem
    pub fn start(
        student_name: impl Into<String>,
        config: TutorConfig,
        source: Arc<dyn ProblemSource>,
    ) -> Result<Self, WaypointError> {
        config.validate()?;
        let graph = Arc::new(graph(config, source)?);
        let inner = Session::start(
            graph,
            ANSWER_ROUTER,
            TutorState::new(student_name),
            |state: &TutorState| state.is_finished,
        )?;
        Ok(Self { inner })
    }

    /// Feed one answer or hint request into the quiz
    pub fn submit(&mut self, answer: Answer) -> Result<&TutorState, GraphError> {
        self.inner
            .submit(move |state| state.student_answer = Some(answer))
    }

    pub fn state(&self) -> &TutorState {
        self.inner.state()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    pub fn id(&self) -> Uuid {
        self.inner.id()
    }

    /// Messages appended since the history had `seen` entries
    pub fn messages_since(&self, seen: usize) -> &[String] {
        let history = &self.state().conversation_history;
        &history[seen.min(history.len())..]
    }

    pub fn into_state(self) -> TutorState {
        self.inner.into_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::scenarios::tutor::problems::{Operation, Problem};
    use crate::waypoint::scenarios::tutor::state::Difficulty;

    /// Asks `a + b` where `a` counts up from 1
    struct Counting(std::sync::atomic::AtomicI64);

    impl ProblemSource for Counting {
        fn problem(&self, difficulty: Difficulty) -> Problem {
            let a = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Problem::new(difficulty, Operation::Add, vec![a, 1], format!("{} + 1?", a)).unwrap()
        }

        fn praise(&self) -> String {
            "Yes!".to_string()
        }
    }

    fn start() -> TutorSession {
        TutorSession::start(
            "Ada",
            TutorConfig::default(),
            Arc::new(Counting(std::sync::atomic::AtomicI64::new(1))),
        )
        .unwrap()
    }

    #[test]
    fn test_start_greets_and_presents() {
        let session = start();
        let state = session.state();

        assert_eq!(state.conversation_history.len(), 2);
        assert!(state.conversation_history[1].contains("1 + 1?"));
        assert!(!session.is_finished());
    }

    #[test]
    fn test_hint_does_not_advance() {
        let mut session = start();
        let state = session.submit(Answer::Hint).unwrap();

        assert_eq!(state.hints_remaining, 2);
        assert_eq!(state.problems_attempted, 0);
        assert!(state.current_problem.as_ref().unwrap().question.contains("1 + 1?"));
    }

    #[test]
    fn test_answer_presents_next_problem() {
        let mut session = start();
        let seen = session.state().conversation_history.len();
        session.submit(Answer::Value(2.0)).unwrap();

        let new = session.messages_since(seen);
        assert_eq!(new[0], "Your answer: 2.0");
        assert_eq!(new[1], "Yes!");
        assert!(new.last().unwrap().contains("2 + 1?"));
    }

    #[test]
    fn test_submit_after_finish() {
        let mut session = start();
        let mut expected = 2.0;
        while !session.is_finished() {
            session.submit(Answer::Value(expected)).unwrap();
            expected += 1.0;
        }

        assert_eq!(session.state().problems_attempted, 8);
        assert_eq!(session.state().correct_answers, 8);
        assert!(session
            .state()
            .conversation_history
            .last()
            .unwrap()
            .contains("Session Complete"));
        assert!(matches!(
            session.submit(Answer::Value(1.0)),
            Err(GraphError::SessionFinished(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TutorConfig {
            max_problems: 0,
            ..TutorConfig::default()
        };
        let result = TutorSession::start("Ada", config, Arc::new(Counting(Default::default())));
        assert!(matches!(result, Err(WaypointError::Config(_))));
    }
}
