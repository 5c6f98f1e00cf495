//! Open state record for declarative workflows

use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use super::schema::{FieldType, ReducerType, StateSchema};
use crate::engine::error::WorkflowError;

/// Field name → JSON value record with per-field reducers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    fields: HashMap<String, Value>,
    reducers: HashMap<String, ReducerType>,
    types: HashMap<String, FieldType>,
}

impl WorkflowState {
    /// Create a state holding the schema's defaults
    pub fn new(schema: &StateSchema) -> Self {
        let mut fields = HashMap::new();
        let mut reducers = HashMap::new();
        let mut types = HashMap::new();

        for (name, def) in &schema.fields {
            if let Some(default) = &def.default {
                fields.insert(name.clone(), default.clone());
            }
            reducers.insert(name.clone(), def.reducer);
            types.insert(name.clone(), def.field_type);
        }

        Self {
            fields,
            reducers,
            types,
        }
    }

    /// Create an empty state where every field overwrites
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a state from schema defaults plus a JSON object of initial
    /// values. Initial values replace defaults without going through
    /// reducers, and are checked against the declared field types.
    pub fn from_json(schema: &StateSchema, input: Value) -> Result<Self, WorkflowError> {
        let Value::Object(object) = input else {
            return Err(WorkflowError::InvalidInput);
        };

        if let Some((field, expected)) = schema.mismatched_field(|name| object.get(name)) {
            return Err(WorkflowError::field(
                field,
                format!("must be of type {:?}", expected).to_lowercase(),
            ));
        }

        let mut state = Self::new(schema);
        state.fields.extend(object);
        Ok(state)
    }

    /// Update a field using its reducer (overwrite when undeclared)
    pub fn update(&mut self, key: &str, value: Value) {
        let reducer = self.reducers.get(key).copied().unwrap_or_default();

        match reducer {
            ReducerType::Overwrite => {
                self.fields.insert(key.to_string(), value);
            }
            ReducerType::Append => {
                let slot = self
                    .fields
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Array(vec![]));
                if slot.is_null() {
                    *slot = Value::Array(vec![]);
                }
                if let Value::Array(items) = slot {
                    match value {
                        Value::Array(new_items) => items.extend(new_items),
                        other => items.push(other),
                    }
                }
            }
            ReducerType::Max => self.keep_if(key, value, |new, current| new > current),
            ReducerType::Min => self.keep_if(key, value, |new, current| new < current),
            ReducerType::Merge => {
                let slot = self
                    .fields
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let (Value::Object(current), Value::Object(new)) = (slot, value) {
                    current.extend(new);
                }
            }
        }
    }

    /// Like [`update`](Self::update), but fails when the value cannot be
    /// combined by the field's reducer instead of leaving the field as is
    pub fn try_update(&mut self, key: &str, value: Value) -> Result<(), WorkflowError> {
        let reducer = self.reducers.get(key).copied().unwrap_or_default();
        let fits = match reducer {
            ReducerType::Overwrite | ReducerType::Append => true,
            ReducerType::Max | ReducerType::Min => value.is_number(),
            ReducerType::Merge => value.is_object(),
        };
        if !fits {
            let name = format!("{:?}", reducer).to_lowercase();
            return Err(WorkflowError::field(
                key,
                format!("cannot take {} through the {} reducer", value, name),
            ));
        }

        self.update(key, value);
        Ok(())
    }

    /// Write rendered template text into `key`, converted to the field's
    /// declared type. Undeclared fields receive the text as a string.
    pub fn set_text(&mut self, key: &str, text: String) -> Result<(), WorkflowError> {
        let mismatch = |expected: &str| {
            WorkflowError::field(key, format!("must be of type {}, got '{}'", expected, text))
        };

        let value = match self.types.get(key) {
            None | Some(FieldType::String) => Value::String(text.clone()),
            Some(FieldType::Number) => parse_number(&text).ok_or_else(|| mismatch("number"))?,
            Some(FieldType::Boolean) => match text.trim() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(mismatch("boolean")),
            },
            Some(FieldType::Array)
                if self.reducers.get(key) == Some(&ReducerType::Append) =>
            {
                Value::String(text.clone())
            }
            Some(FieldType::Array) => return Err(mismatch("array")),
            Some(FieldType::Object) => return Err(mismatch("object")),
        };

        self.try_update(key, value)
    }

    fn keep_if(&mut self, key: &str, value: Value, better: impl Fn(f64, f64) -> bool) {
        let Some(new) = value.as_f64() else {
            return;
        };
        match self.fields.get(key).and_then(Value::as_f64) {
            Some(current) if !better(new, current) => {}
            _ => {
                self.fields.insert(key.to_string(), value);
            }
        }
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a nested field value using dot notation (e.g., "problem.answer")
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                other => other.get(part)?,
            };
        }
        Some(current)
    }

    /// Read an integer field, failing with a descriptive error
    pub fn require_i64(&self, key: &str) -> Result<i64, WorkflowError> {
        match self.get_path(key) {
            Some(value) => value
                .as_i64()
                .ok_or_else(|| WorkflowError::field(key, "must be an integer")),
            None => Err(WorkflowError::field(key, "is missing")),
        }
    }

    /// Convert state to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Get all field names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

/// Integers stay integers so templates print them without a fraction
fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
