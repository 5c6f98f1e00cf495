use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::problems::Problem;
use crate::engine::error::WaypointError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// 1 for easy up to 3 for hard
    pub fn level(&self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn harder(&self) -> Option<Self> {
        match self {
            Difficulty::Easy => Some(Difficulty::Medium),
            Difficulty::Medium => Some(Difficulty::Hard),
            Difficulty::Hard => None,
        }
    }

    pub fn easier(&self) -> Option<Self> {
        match self {
            Difficulty::Easy => None,
            Difficulty::Medium => Some(Difficulty::Easy),
            Difficulty::Hard => Some(Difficulty::Medium),
        }
    }

    /// Capitalized name used in messages
    pub fn title(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub(crate) fn indicator(&self) -> &'static str {
        match self {
            Difficulty::Easy => "🟢",
            Difficulty::Medium => "🟡",
            Difficulty::Hard => "🔴",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

/// What the student typed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Hint,
    Value(f64),
}

impl FromStr for Answer {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.eq_ignore_ascii_case("hint") {
            return Ok(Answer::Hint);
        }

        match input.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Answer::Value(value)),
            _ => Err(WaypointError::other(format!(
                "'{}' is neither a number nor 'hint'",
                input
            ))),
        }
    }
}

/// Everything the quiz graph reads and writes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorState {
    pub student_name: String,
    pub current_level: u32,
    pub difficulty: Difficulty,
    pub highest_difficulty: Difficulty,
    pub current_problem: Option<Problem>,
    pub student_answer: Option<Answer>,
    pub hints_remaining: u32,
    pub problems_attempted: u32,
    pub correct_answers: u32,
    pub streak: i32,
    pub feedback: String,
    pub conversation_history: Vec<String>,
    pub is_finished: bool,
}

impl TutorState {
    pub fn new(student_name: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            current_level: Difficulty::Easy.level(),
            difficulty: Difficulty::Easy,
            highest_difficulty: Difficulty::Easy,
            current_problem: None,
            student_answer: None,
            hints_remaining: 0,
            problems_attempted: 0,
            correct_answers: 0,
            streak: 0,
            feedback: String::new(),
            conversation_history: Vec::new(),
            is_finished: false,
        }
    }

    /// Percentage of attempted problems answered correctly
    pub fn accuracy(&self) -> f64 {
        if self.problems_attempted == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) / f64::from(self.problems_attempted) * 100.0
    }

    pub(crate) fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.current_level = difficulty.level();
        self.highest_difficulty = self.highest_difficulty.max(difficulty);
    }

    pub(crate) fn say(&mut self, message: impl Into<String>) {
        self.conversation_history.push(message.into());
    }
}
