//! Word problems and where they come from

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use super::state::Difficulty;
use crate::engine::error::WaypointError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    /// `a - b + c`
    #[serde(rename = "complex")]
    Complex,
}

impl Operation {
    /// Number of operands the operation takes
    pub fn arity(&self) -> usize {
        match self {
            Operation::Complex => 3,
            _ => 2,
        }
    }

    fn apply(&self, n: &[i64]) -> f64 {
        let n: Vec<f64> = n.iter().map(|&v| v as f64).collect();
        match self {
            Operation::Add => n[0] + n[1],
            Operation::Subtract => n[0] - n[1],
            Operation::Multiply => n[0] * n[1],
            Operation::Divide => n[0] / n[1],
            Operation::Complex => n[0] - n[1] + n[2],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Complex => "complex",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    pub question: String,
    pub operation: Operation,
    pub numbers: Vec<i64>,
    pub correct_answer: f64,
    pub difficulty: Difficulty,
    pub hints: Vec<String>,
}

impl Problem {
    /// Build a problem whose answer is computed from `numbers`
    pub fn new(
        difficulty: Difficulty,
        operation: Operation,
        numbers: Vec<i64>,
        question: impl Into<String>,
    ) -> Result<Self, WaypointError> {
        if numbers.len() != operation.arity() {
            return Err(WaypointError::other(format!(
                "operation '{}' takes {} numbers, got {}",
                operation,
                operation.arity(),
                numbers.len()
            )));
        }
        if operation == Operation::Divide && numbers[1] == 0 {
            return Err(WaypointError::other("cannot divide by zero"));
        }

        Ok(Self {
            question: question.into(),
            correct_answer: operation.apply(&numbers),
            operation,
            numbers,
            difficulty,
            hints: vec![
                "Try breaking down the problem into smaller parts".to_string(),
                "Write down the important numbers".to_string(),
                format!("The operation(s) you need: {}", operation),
            ],
        })
    }
}

/// Supplies problems and praise to the quiz steps
pub trait ProblemSource: Send + Sync {
    fn problem(&self, difficulty: Difficulty) -> Problem;

    /// Feedback line for a correct answer
    fn praise(&self) -> String;
}

pub const PRAISE: [&str; 4] = [
    "Excellent work! 🌟",
    "Perfect! Keep it up! ✨",
    "You're doing great! 🎯",
    "Outstanding! 🏆",
];

/// Randomly generated word problems
pub struct RandomProblems {
    rng: Mutex<StdRng>,
}

impl RandomProblems {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of problems
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn generate(rng: &mut StdRng, difficulty: Difficulty) -> Result<Problem, WaypointError> {
        match (difficulty, rng.gen_bool(0.5)) {
            (Difficulty::Easy, true) => {
                let (have, given) = (rng.gen_range(1..=10), rng.gen_range(1..=5));
                Problem::new(
                    difficulty,
                    Operation::Add,
                    vec![have, given],
                    format!(
                        "If you have {} apples and your friend gives you {} more, how many apples do you have?",
                        have, given
                    ),
                )
            }
            (Difficulty::Easy, false) => {
                let (have, eaten) = (rng.gen_range(5..=15), rng.gen_range(1..=5));
                Problem::new(
                    difficulty,
                    Operation::Subtract,
                    vec![have, eaten],
                    format!(
                        "You have {} cookies and eat {} of them. How many cookies are left?",
                        have, eaten
                    ),
                )
            }
            (Difficulty::Medium, true) => {
                let (per_day, days) = (rng.gen_range(20..=50), rng.gen_range(3..=7));
                Problem::new(
                    difficulty,
                    Operation::Multiply,
                    vec![per_day, days],
                    format!(
                        "A restaurant sells {} pizzas each day. How many pizzas do they sell in {} days?",
                        per_day, days
                    ),
                )
            }
            (Difficulty::Medium, false) => {
                let (candies, friends) = (rng.gen_range(10..=30), rng.gen_range(2..=5));
                Problem::new(
                    difficulty,
                    Operation::Divide,
                    vec![candies, friends],
                    format!(
                        "If {} friends share {} candies equally, how many candies does each friend get?",
                        friends, candies
                    ),
                )
            }
            (Difficulty::Hard, _) => {
                let (start, lost, won) = (
                    rng.gen_range(10..=30),
                    rng.gen_range(2..=5),
                    rng.gen_range(5..=15),
                );
                Problem::new(
                    difficulty,
                    Operation::Complex,
                    vec![start, lost, won],
                    format!(
                        "You start with {} marbles. You lose {} marbles, then win {} more. How many marbles do you have now?",
                        start, lost, won
                    ),
                )
            }
        }
    }
}

impl ProblemSource for RandomProblems {
    fn problem(&self, difficulty: Difficulty) -> Problem {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            // Generated operands always fit their operation
            match Self::generate(&mut rng, difficulty) {
                Ok(problem) => return problem,
                Err(e) => log::warn!("Discarding generated problem: {}", e),
            }
        }
    }

    fn praise(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        PRAISE.choose(&mut *rng).copied().unwrap_or(PRAISE[0]).to_string()
    }
}

impl Default for RandomProblems {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers() {
        let cases = [
            (Operation::Add, vec![3, 4], 7.0),
            (Operation::Subtract, vec![10, 4], 6.0),
            (Operation::Multiply, vec![25, 4], 100.0),
            (Operation::Divide, vec![10, 4], 2.5),
            (Operation::Complex, vec![20, 3, 7], 24.0),
        ];

        for (operation, numbers, expected) in cases {
            let problem = Problem::new(Difficulty::Easy, operation, numbers, "?").unwrap();
            assert_eq!(problem.correct_answer, expected, "{}", operation);
        }
    }

    #[test]
    fn test_invalid_problems() {
        assert!(Problem::new(Difficulty::Hard, Operation::Complex, vec![1, 2], "?").is_err());
        assert!(Problem::new(Difficulty::Medium, Operation::Divide, vec![1, 0], "?").is_err());
    }

    #[test]
    fn test_hints_name_operation() {
        let problem = Problem::new(Difficulty::Medium, Operation::Multiply, vec![2, 3], "?").unwrap();
        assert_eq!(problem.hints.len(), 3);
        assert_eq!(problem.hints[2], "The operation(s) you need: *");
    }

    #[test]
    fn test_random_problems_match_difficulty() {
        let source = RandomProblems::seeded(7);

        for _ in 0..20 {
            let easy = source.problem(Difficulty::Easy);
            assert!(matches!(easy.operation, Operation::Add | Operation::Subtract));

            let medium = source.problem(Difficulty::Medium);
            assert!(matches!(
                medium.operation,
                Operation::Multiply | Operation::Divide
            ));

            let hard = source.problem(Difficulty::Hard);
            assert_eq!(hard.operation, Operation::Complex);
            assert_eq!(hard.difficulty, Difficulty::Hard);
        }
    }

    #[test]
    fn test_question_uses_answer_numbers() {
        let source = RandomProblems::seeded(42);

        for _ in 0..20 {
            let problem = source.problem(Difficulty::Easy);
            for n in &problem.numbers {
                assert!(problem.question.contains(&n.to_string()));
            }
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = RandomProblems::seeded(1);
        let b = RandomProblems::seeded(1);
        assert_eq!(a.problem(Difficulty::Hard), b.problem(Difficulty::Hard));
        assert_eq!(a.praise(), b.praise());
    }

    #[test]
    fn test_praise_is_known() {
        let praise = RandomProblems::new().praise();
        assert!(PRAISE.contains(&praise.as_str()));
    }
}
