//! Declarative payload schemas.
//!
//! A [`Schema`] turns an untyped JSON value into a validated output or a
//! list of per-field problems. Validation collects every violation instead
//! of stopping at the first.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field path; empty for the payload as a whole.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Anything that can validate a merged request payload.
pub trait Schema {
    type Output;

    fn parse(&self, data: &Value) -> Result<Self::Output, Vec<FieldError>>;
}

#[derive(Debug, Clone, PartialEq)]
enum FieldKind {
    String { min_len: Option<usize>, max_len: Option<usize> },
    Integer { min: Option<f64>, max: Option<f64> },
    Number { min: Option<f64>, max: Option<f64> },
    Boolean,
    OneOf(Vec<String>),
}

/// Rule for a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    default: Option<Value>,
}

impl Field {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: true,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::of(FieldKind::String { min_len: None, max_len: None })
    }

    /// Integer; numeric strings (path and query values) are accepted and converted.
    pub fn integer() -> Self {
        Self::of(FieldKind::Integer { min: None, max: None })
    }

    pub fn number() -> Self {
        Self::of(FieldKind::Number { min: None, max: None })
    }

    pub fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    pub fn one_of(values: &[&str]) -> Self {
        Self::of(FieldKind::OneOf(values.iter().map(|v| v.to_string()).collect()))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the field is absent. Implies optional.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        if let FieldKind::String { min_len, .. } = &mut self.kind {
            *min_len = Some(n);
        }
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        if let FieldKind::String { max_len, .. } = &mut self.kind {
            *max_len = Some(n);
        }
        self
    }

    pub fn min(mut self, n: impl Into<f64>) -> Self {
        match &mut self.kind {
            FieldKind::Integer { min, .. } | FieldKind::Number { min, .. } => *min = Some(n.into()),
            _ => {}
        }
        self
    }

    pub fn max(mut self, n: impl Into<f64>) -> Self {
        match &mut self.kind {
            FieldKind::Integer { max, .. } | FieldKind::Number { max, .. } => *max = Some(n.into()),
            _ => {}
        }
        self
    }

    fn check(&self, value: &Value) -> Result<Value, String> {
        match &self.kind {
            FieldKind::String { min_len, max_len } => {
                let s = value.as_str().ok_or("expected string")?;
                let len = s.chars().count();
                if let Some(min) = min_len.filter(|min| len < *min) {
                    return Err(format!("must be at least {min} characters"));
                }
                if let Some(max) = max_len.filter(|max| len > *max) {
                    return Err(format!("must be at most {max} characters"));
                }
                Ok(value.clone())
            }
            FieldKind::Integer { min, max } => {
                let n = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or("expected integer")?;
                check_bounds(n as f64, *min, *max)?;
                Ok(Value::Number(n.into()))
            }
            FieldKind::Number { min, max } => {
                let n = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .ok_or("expected number")?;
                check_bounds(n, *min, *max)?;
                Number::from_f64(n).map(Value::Number).ok_or_else(|| "expected number".to_string())
            }
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                _ => Err("expected boolean".into()),
            },
            FieldKind::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => Ok(value.clone()),
                _ => Err(format!("must be one of: {}", allowed.join(", "))),
            },
        }
    }
}

fn check_bounds(n: f64, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    if let Some(min) = min.filter(|min| n < *min) {
        return Err(format!("must be >= {min}"));
    }
    if let Some(max) = max.filter(|max| n > *max) {
        return Err(format!("must be <= {max}"));
    }
    Ok(())
}

/// Object schema built from per-field rules. Unknown fields are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<(String, Field)>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rule: Field) -> Self {
        self.fields.push((name.into(), rule));
        self
    }
}

impl Schema for ObjectSchema {
    type Output = Map<String, Value>;

    fn parse(&self, data: &Value) -> Result<Self::Output, Vec<FieldError>> {
        let Some(object) = data.as_object() else {
            return Err(vec![FieldError::new("", "expected object")]);
        };

        let mut output = Map::new();
        let mut errors = Vec::new();

        for (name, rule) in &self.fields {
            match object.get(name).filter(|v| !v.is_null()) {
                Some(value) => match rule.check(value) {
                    Ok(normalized) => {
                        output.insert(name.clone(), normalized);
                    }
                    Err(message) => errors.push(FieldError::new(name.clone(), message)),
                },
                None => {
                    if let Some(default) = &rule.default {
                        output.insert(name.clone(), default.clone());
                    } else if rule.required {
                        errors.push(FieldError::new(name.clone(), "is required"));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}

/// [`ObjectSchema`] followed by deserialization into `T`.
pub struct Typed<T> {
    schema: ObjectSchema,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Typed<T> {
    pub fn new(schema: ObjectSchema) -> Self {
        Self {
            schema,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Schema for Typed<T> {
    type Output = T;

    fn parse(&self, data: &Value) -> Result<T, Vec<FieldError>> {
        let object = self.schema.parse(data)?;
        serde_json::from_value(Value::Object(object)).map_err(|e| vec![FieldError::new("", e.to_string())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn workout_schema() -> ObjectSchema {
        ObjectSchema::new()
            .field("name", Field::string().min_len(1).max_len(10))
            .field("minutes", Field::integer().min(1).max(600))
            .field("kind", Field::one_of(&["run", "ride"]).optional())
            .field("public", Field::boolean().default_value(false))
    }

    #[test]
    fn test_valid_object_is_normalized() {
        let out = workout_schema()
            .parse(&json!({ "name": "tempo", "minutes": "45", "extra": 1 }))
            .unwrap();

        assert_eq!(Value::Object(out), json!({ "name": "tempo", "minutes": 45, "public": false }));
    }

    #[test]
    fn test_collects_every_violation() {
        let errors = workout_schema()
            .parse(&json!({ "name": "", "minutes": 0, "kind": "swim", "public": "yes" }))
            .unwrap_err();

        assert_eq!(
            errors,
            vec![
                FieldError::new("name", "must be at least 1 characters"),
                FieldError::new("minutes", "must be >= 1"),
                FieldError::new("kind", "must be one of: run, ride"),
                FieldError::new("public", "expected boolean"),
            ]
        );
    }

    #[test]
    fn test_missing_and_null_are_required_errors() {
        let errors = workout_schema().parse(&json!({ "name": null })).unwrap_err();
        assert_eq!(errors[0], FieldError::new("name", "is required"));
        assert_eq!(errors[1], FieldError::new("minutes", "is required"));
    }

    #[test]
    fn test_non_object_rejected() {
        let errors = workout_schema().parse(&json!([1, 2])).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("", "expected object")]);
    }

    #[test]
    fn test_typed_output() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Workout {
            name: String,
            minutes: i64,
            kind: Option<String>,
            public: bool,
        }

        let schema = Typed::<Workout>::new(workout_schema());
        let workout = schema.parse(&json!({ "name": "long", "minutes": 90, "kind": "ride" })).unwrap();
        assert_eq!(
            workout,
            Workout {
                name: "long".into(),
                minutes: 90,
                kind: Some("ride".into()),
                public: false,
            }
        );
    }
}
