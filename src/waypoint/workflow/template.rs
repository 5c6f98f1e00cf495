//! `{path}` placeholder rendering for node `set` templates

use serde_json::Value;

use super::state::WorkflowState;
use crate::engine::error::WorkflowError;

/// Render `template` against `state`.
///
/// `{path}` is replaced by the value at that dotted path, `{{` and `}}`
/// produce literal braces.
pub fn render(template: &str, state: &WorkflowState) -> Result<String, WorkflowError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut path = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => path.push(c),
                        None => {
                            return Err(WorkflowError::template(template, "unclosed placeholder"))
                        }
                    }
                }

                let path = path.trim();
                if path.is_empty() {
                    return Err(WorkflowError::template(template, "empty placeholder"));
                }

                let value = state.get_path(path).ok_or_else(|| {
                    WorkflowError::template(template, format!("'{}' is not set", path))
                })?;
                out.push_str(&display(value));
            }
            '}' => return Err(WorkflowError::template(template, "unmatched '}'")),
            c => out.push(c),
        }
    }

    Ok(out)
}

/// Human-facing form of a state value
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
