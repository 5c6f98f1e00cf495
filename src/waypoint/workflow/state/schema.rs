//! State schema definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Schema declaring the fields of an open state record
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct StateSchema {
    /// Field definitions
    #[serde(flatten)]
    pub fields: HashMap<String, StateFieldDef>,
}

/// Definition of a single state field
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StateFieldDef {
    /// Type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Reducer for merging values
    #[serde(default)]
    pub reducer: ReducerType,
    /// Default value
    pub default: Option<Value>,
}

/// Supported field types
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

/// Reducer types for merging values into state
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ReducerType {
    /// Replace the value (default)
    #[default]
    Overwrite,
    /// Append to array
    Append,
    /// Keep maximum value
    Max,
    /// Keep minimum value
    Min,
    /// Shallow merge objects
    Merge,
}

impl FieldType {
    /// Whether `value` has this type. `null` is accepted for every type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::Boolean, Value::Bool(_)) => true,
            (FieldType::Array, Value::Array(_)) => true,
            (FieldType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl StateSchema {
    /// Name of the first declared field whose value has the wrong type
    pub fn mismatched_field<'a>(
        &self,
        mut lookup: impl FnMut(&str) -> Option<&'a Value>,
    ) -> Option<(&str, FieldType)> {
        let mut names: Vec<&String> = self.fields.keys().collect();
        names.sort();

        names.into_iter().find_map(|name| {
            let def = &self.fields[name];
            match lookup(name) {
                Some(value) if !def.field_type.accepts(value) => {
                    Some((name.as_str(), def.field_type))
                }
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_schema_deserialize() {
        let yaml = r#"
            difficulty:
              type: string
              default: easy
            streak:
              type: number
              default: 0
            conversation_history:
              type: array
              reducer: append
        "#;
        let schema: StateSchema = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(schema.fields.len(), 3);
        assert_eq!(schema.fields["difficulty"].field_type, FieldType::String);
        assert_eq!(schema.fields["difficulty"].default, Some(json!("easy")));
        assert_eq!(schema.fields["streak"].field_type, FieldType::Number);
        assert_eq!(
            schema.fields["conversation_history"].reducer,
            ReducerType::Append
        );
    }

    #[test]
    fn test_reducer_default() {
        assert_eq!(ReducerType::default(), ReducerType::Overwrite);
    }

    #[test]
    fn test_all_reducers() {
        let yaml = r#"
            f1: { type: string, reducer: overwrite }
            f2: { type: array, reducer: append }
            f3: { type: number, reducer: max }
            f4: { type: number, reducer: min }
            f5: { type: object, reducer: merge }
        "#;
        let schema: StateSchema = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(schema.fields["f1"].reducer, ReducerType::Overwrite);
        assert_eq!(schema.fields["f2"].reducer, ReducerType::Append);
        assert_eq!(schema.fields["f3"].reducer, ReducerType::Max);
        assert_eq!(schema.fields["f4"].reducer, ReducerType::Min);
        assert_eq!(schema.fields["f5"].reducer, ReducerType::Merge);
    }

    #[test]
    fn test_field_type_accepts() {
        assert!(FieldType::String.accepts(&json!("John")));
        assert!(FieldType::Number.accepts(&json!(25)));
        assert!(FieldType::Array.accepts(&json!(["Python", "SQL"])));
        assert!(FieldType::Boolean.accepts(&json!(null)));
        assert!(!FieldType::Number.accepts(&json!("25")));
        assert!(!FieldType::Object.accepts(&json!([1])));
    }

    #[test]
    fn test_mismatched_field() {
        let yaml = r#"
            age: { type: number }
            name: { type: string }
        "#;
        let schema: StateSchema = serde_yaml::from_str(yaml).unwrap();
        let good = json!({"age": 25, "name": "John"});
        let bad = json!({"age": "twenty", "name": "John"});

        assert_eq!(schema.mismatched_field(|k| good.get(k)), None);
        assert_eq!(
            schema.mismatched_field(|k| bad.get(k)),
            Some(("age", FieldType::Number))
        );
    }
}
