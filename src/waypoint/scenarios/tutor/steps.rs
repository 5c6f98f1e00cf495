//! The quiz steps and the labels that route between them

use std::sync::Arc;

use super::problems::ProblemSource;
use super::state::{Answer, Difficulty, TutorState};
use crate::engine::graph::Route;
use crate::engine::step::StepError;
use crate::waypoint::config::TutorConfig;

/// What to do with the submitted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerRoute {
    Hint,
    Attempt,
    /// Nothing was submitted
    Missing,
}

impl Route for AnswerRoute {
    fn all() -> &'static [Self] {
        &[AnswerRoute::Hint, AnswerRoute::Attempt, AnswerRoute::Missing]
    }

    fn label(&self) -> &'static str {
        match self {
            AnswerRoute::Hint => "hint",
            AnswerRoute::Attempt => "attempt",
            AnswerRoute::Missing => "missing",
        }
    }
}

/// Whether another problem follows a checked answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Finished,
}

impl Route for Progress {
    fn all() -> &'static [Self] {
        &[Progress::Continue, Progress::Finished]
    }

    fn label(&self) -> &'static str {
        match self {
            Progress::Continue => "continue",
            Progress::Finished => "finished",
        }
    }
}

pub fn route_answer(state: &TutorState) -> AnswerRoute {
    match state.student_answer {
        Some(Answer::Hint) => AnswerRoute::Hint,
        Some(Answer::Value(_)) => AnswerRoute::Attempt,
        None => AnswerRoute::Missing,
    }
}

pub fn route_progress(state: &TutorState) -> Progress {
    if state.is_finished {
        Progress::Finished
    } else {
        Progress::Continue
    }
}

/// Quiz step functions sharing one configuration and problem source
pub struct TutorSteps {
    config: TutorConfig,
    source: Arc<dyn ProblemSource>,
}

impl TutorSteps {
    pub fn new(config: TutorConfig, source: Arc<dyn ProblemSource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    /// Welcome the student and reset all counters
    pub fn greet(&self, mut state: TutorState) -> Result<TutorState, StepError> {
        let message = format!(
            "Hello {}! Welcome to the Adaptive Math Tutor! 🎓\n\
             We'll start with easy problems and adjust the difficulty based on your performance.\n\
             You can ask for hints by typing 'hint' instead of an answer (you have {} hints per session).",
            state.student_name, self.config.hints_per_session
        );

        state.conversation_history = vec![message];
        state.set_difficulty(Difficulty::Easy);
        state.highest_difficulty = Difficulty::Easy;
        state.problems_attempted = 0;
        state.correct_answers = 0;
        state.streak = 0;
        state.hints_remaining = self.config.hints_per_session;
        state.student_answer = None;
        state.is_finished = false;
        Ok(state)
    }

    /// Adjust difficulty from the streak, then pose a new problem
    pub fn present_problem(&self, mut state: TutorState) -> Result<TutorState, StepError> {
        if state.streak >= self.config.level_up_streak {
            if let Some(harder) = state.difficulty.harder() {
                state.set_difficulty(harder);
                log::info!("{} levelled up to {}", state.student_name, harder);
                state.say(match harder {
                    Difficulty::Hard => {
                        "\n🌟 Amazing! You've reached hard difficulty!".to_string()
                    }
                    other => format!("\n🎉 Level Up! You've advanced to {} difficulty!", other),
                });
            }
        } else if state.streak <= self.config.level_down_streak {
            if let Some(easier) = state.difficulty.easier() {
                state.set_difficulty(easier);
                log::info!("{} moved down to {}", state.student_name, easier);
                state.say(match easier {
                    Difficulty::Easy => {
                        "\nLet's practice with some easier problems!".to_string()
                    }
                    other => format!(
                        "\nLet's go back to {} difficulty and build up your skills!",
                        other
                    ),
                });
            }
        }

        let problem = self.source.problem(state.difficulty);
        let message = format!(
            "\n{} Problem #{}:\n{}\n(Type 'hint' if you need help)",
            state.difficulty.indicator(),
            state.problems_attempted + 1,
            problem.question
        );
        state.current_problem = Some(problem);
        state.say(message);
        Ok(state)
    }

    /// Hand out the next hint for the current problem, if any are left
    pub fn give_hint(&self, mut state: TutorState) -> Result<TutorState, StepError> {
        state.student_answer = None;

        if state.hints_remaining == 0 {
            state.say("\n❌ Sorry, you're out of hints!");
            return Ok(state);
        }

        let problem = state
            .current_problem
            .as_ref()
            .ok_or("no problem has been presented")?;
        let used = self.config.hints_per_session.saturating_sub(state.hints_remaining) as usize;
        let hint = problem
            .hints
            .get(used)
            .or_else(|| problem.hints.last())
            .cloned()
            .unwrap_or_default();

        state.hints_remaining -= 1;
        state.say(format!("\n💡 Hint: {}", hint));
        state.say(format!("({} hints remaining)", state.hints_remaining));
        Ok(state)
    }

    /// Score the submitted answer and report progress
    pub fn check_answer(&self, mut state: TutorState) -> Result<TutorState, StepError> {
        let answer = match state.student_answer.take() {
            Some(Answer::Value(value)) => value,
            other => return Err(format!("expected a numeric answer, got {:?}", other).into()),
        };
        let expected = state
            .current_problem
            .as_ref()
            .ok_or("no problem has been presented")?
            .correct_answer;

        state.problems_attempted += 1;

        if (answer - expected).abs() < self.config.tolerance {
            state.correct_answers += 1;
            state.streak += 1;
            state.feedback = self.source.praise();
        } else {
            state.streak = (state.streak - 1).max(self.config.streak_floor);
            state.feedback = format!(
                "Not quite. The correct answer is {:.1}. Keep trying! 💪",
                expected
            );
        }

        log::debug!(
            "{} answered {} (expected {}), streak {}",
            state.student_name,
            answer,
            expected,
            state.streak
        );

        state.say(format!("Your answer: {:?}", answer));
        let feedback = state.feedback.clone();
        state.say(feedback);
        let stats = format!(
            "\nStats:\n✓ Accuracy: {:.1}%\n🔥 Current streak: {}\n📚 Current level: {}",
            state.accuracy(),
            state.streak.max(0),
            state.difficulty.title()
        );
        state.say(stats);

        state.is_finished = state.problems_attempted >= self.config.max_problems;
        Ok(state)
    }

    /// Final score and a closing remark
    pub fn end_session(&self, mut state: TutorState) -> Result<TutorState, StepError> {
        let accuracy = state.accuracy();
        let remark = if accuracy >= 90.0 {
            "Outstanding performance! You're ready for even bigger challenges! 🏆"
        } else if accuracy >= 70.0 {
            "Great work! Keep practicing to reach the next level! 🌟"
        } else {
            "Good effort! Remember, every problem you tackle helps you improve! 💪"
        };

        let message = format!(
            "\n🎓 Session Complete! 🎓\nFinal score: {}/{} ({:.1}%)\nHighest level reached: {}\n{}",
            state.correct_answers,
            state.problems_attempted,
            accuracy,
            state.highest_difficulty.title(),
            remark
        );
        log::info!(
            "{} finished with {}/{}",
            state.student_name,
            state.correct_answers,
            state.problems_attempted
        );
        state.say(message);
        Ok(state)
    }
}
