//! Condition expression parser
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr       := and_expr ( " or " and_expr )*
//! and_expr   := unary ( " and " unary )*
//! unary      := "not " unary | "(" expr ")" | "true" | "false" | comparison
//! comparison := path op literal
//! ```

use super::ast::{CompareOp, Expression, Literal};
use crate::engine::error::WorkflowError;

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Expression, WorkflowError> {
    Parser { source: input }.expression(input)
}

struct Parser<'a> {
    /// Full expression, kept for error messages
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn expression(&self, input: &str) -> Result<Expression, WorkflowError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(self.error("empty expression"));
        }

        if let Some(pos) = find_top_level(input, " or ") {
            let left = self.expression(&input[..pos])?;
            let right = self.expression(&input[pos + 4..])?;
            return Ok(Expression::Or(Box::new(left), Box::new(right)));
        }

        if let Some(pos) = find_top_level(input, " and ") {
            let left = self.expression(&input[..pos])?;
            let right = self.expression(&input[pos + 5..])?;
            return Ok(Expression::And(Box::new(left), Box::new(right)));
        }

        self.unary(input)
    }

    fn unary(&self, input: &str) -> Result<Expression, WorkflowError> {
        if let Some(rest) = input.strip_prefix("not ") {
            return Ok(Expression::Not(Box::new(self.expression(rest)?)));
        }

        if input.starts_with('(') && closing_paren(input) == Some(input.len() - 1) {
            return self.expression(&input[1..input.len() - 1]);
        }

        match input {
            "true" => Ok(Expression::True),
            "false" => Ok(Expression::False),
            _ => self.comparison(input),
        }
    }

    fn comparison(&self, input: &str) -> Result<Expression, WorkflowError> {
        // Two-character operators first so ">=" is not read as ">"
        let operators = [
            ("!=", CompareOp::NotEq),
            (">=", CompareOp::Gte),
            ("<=", CompareOp::Lte),
            ("==", CompareOp::Eq),
            (">", CompareOp::Gt),
            ("<", CompareOp::Lt),
            (" contains ", CompareOp::Contains),
        ];

        for (symbol, op) in operators {
            if let Some(pos) = find_top_level(input, symbol) {
                let path = input[..pos].trim();
                if path.is_empty() || path.contains(char::is_whitespace) {
                    return Err(self.error(format!("invalid field path '{}'", path)));
                }
                let right = self.literal(input[pos + symbol.len()..].trim())?;
                return Ok(Expression::Compare {
                    path: path.to_string(),
                    op,
                    right,
                });
            }
        }

        Err(self.error(format!("could not parse '{}'", input)))
    }

    fn literal(&self, input: &str) -> Result<Literal, WorkflowError> {
        match input {
            "null" => return Ok(Literal::Null),
            "true" => return Ok(Literal::Boolean(true)),
            "false" => return Ok(Literal::Boolean(false)),
            _ => {}
        }

        let quoted = input.len() >= 2
            && ((input.starts_with('\'') && input.ends_with('\''))
                || (input.starts_with('"') && input.ends_with('"')));
        if quoted {
            return Ok(Literal::String(input[1..input.len() - 1].to_string()));
        }

        input
            .parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| self.error(format!("could not parse literal '{}'", input)))
    }

    fn error(&self, reason: impl Into<String>) -> WorkflowError {
        WorkflowError::condition(self.source, reason)
    }
}

/// Byte offset of the first `needle` outside quotes and parentheses
fn find_top_level(input: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth -= 1,
                _ if depth == 0 && input[i..].starts_with(needle) => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// Byte offset of the parenthesis closing the one at offset 0
fn closing_paren(input: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
    }
    None
}
