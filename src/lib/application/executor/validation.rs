use jsonschema::JSONSchema;
use jsonschema::error::ValidationErrorKind;
use serde_json::{Map as JsonMap, Number, Value};
use tracing::warn;

/// Argument problems found before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentViolations {
    pub fields: Vec<String>,
    pub messages: Vec<String>,
}

impl ArgumentViolations {
    fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![field.to_string()],
            messages: vec![message.into()],
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "invalid fields [{}]: {}",
            self.fields.join(", "),
            self.messages.join("; ")
        )
    }
}

/// Coerce `arguments` towards `schema`, then validate them against it.
pub fn prepare_arguments(schema: &Value, arguments: Value) -> Result<Value, ArgumentViolations> {
    let arguments = match arguments {
        Value::Null => Value::Object(JsonMap::new()),
        Value::Object(map) => Value::Object(coerce_object(schema, map)),
        _ => {
            return Err(ArgumentViolations::single(
                "(arguments)",
                "arguments must be a JSON object",
            ));
        }
    };
    validate(schema, &arguments)?;
    Ok(arguments)
}

fn coerce_object(schema: &Value, mut map: JsonMap<String, Value>) -> JsonMap<String, Value> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return map;
    };
    for (name, property) in properties {
        let Some(declared) = property.get("type").and_then(Value::as_str) else {
            continue;
        };
        if let Some(value) = map.get_mut(name) {
            if let Some(coerced) = coerce_scalar(declared, value) {
                *value = coerced;
            }
        }
    }
    map
}

/// Lossless scalar conversion; `None` leaves the value unchanged.
fn coerce_scalar(declared: &str, value: &Value) -> Option<Value> {
    match (declared, value) {
        ("string", Value::Number(number)) => Some(Value::String(number.to_string())),
        ("string", Value::Bool(flag)) => Some(Value::String(flag.to_string())),
        ("integer", Value::String(text)) => text.trim().parse::<i64>().ok().map(Value::from),
        ("number", Value::String(text)) => {
            let text = text.trim();
            if let Ok(int) = text.parse::<i64>() {
                return Some(Value::from(int));
            }
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        ("boolean", Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn validate(schema: &Value, arguments: &Value) -> Result<(), ArgumentViolations> {
    let compiled = match JSONSchema::compile(schema) {
        Ok(compiled) => compiled,
        Err(err) => {
            warn!(%err, "Operation declares an invalid input schema, skipping validation");
            return Ok(());
        }
    };

    let mut violations = ArgumentViolations {
        fields: Vec::new(),
        messages: Vec::new(),
    };
    if let Err(errors) = compiled.validate(arguments) {
        for error in errors {
            let field = match &error.kind {
                ValidationErrorKind::Required { property } => property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string()),
                _ => {
                    let path = error.instance_path.to_string();
                    path.trim_start_matches('/')
                        .split('/')
                        .next()
                        .filter(|segment| !segment.is_empty())
                        .unwrap_or("(arguments)")
                        .to_string()
                }
            };
            if !violations.fields.contains(&field) {
                violations.fields.push(field);
            }
            violations.messages.push(error.to_string());
        }
    }

    if violations.fields.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "issue_key": {"type": "string"},
                "limit": {"type": "integer"},
                "ratio": {"type": "number"},
                "verbose": {"type": "boolean"}
            },
            "required": ["issue_key"]
        })
    }

    #[test]
    fn scalars_are_coerced_to_declared_types() {
        let prepared = prepare_arguments(
            &schema(),
            json!({"issue_key": 123, "limit": "5", "ratio": "0.5", "verbose": "TRUE"}),
        )
        .expect("valid after coercion");
        assert_eq!(
            prepared,
            json!({"issue_key": "123", "limit": 5, "ratio": 0.5, "verbose": true})
        );
    }

    #[test]
    fn null_arguments_become_an_empty_object() {
        let open = json!({"type": "object", "properties": {}});
        assert_eq!(prepare_arguments(&open, Value::Null), Ok(json!({})));
    }

    #[test]
    fn violations_name_the_offending_fields() {
        let err = prepare_arguments(&schema(), json!({"limit": "many"})).expect_err("invalid");
        assert!(err.fields.contains(&"issue_key".to_string()));
        assert!(err.fields.contains(&"limit".to_string()));
        assert_eq!(err.fields.len(), 2);
        assert!(err.describe().starts_with("invalid fields ["));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = prepare_arguments(&schema(), json!(["PROJ-1"])).expect_err("invalid");
        assert_eq!(err.fields, vec!["(arguments)".to_string()]);
    }
}
