use std::fmt;

use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single reason a payload does not match its schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub message: String,
}

impl SchemaViolation {
    pub fn new(message: impl Into<String>) -> Self {
        SchemaViolation {
            message: message.into(),
        }
    }
}

/// Shallow override merge: every top-level key of `extension` replaces the
/// key of the same name in `base`. Nested objects are not combined.
pub fn merge_schemas(base: Value, extension: Value) -> Value {
    match (base, extension) {
        (Value::Object(mut base), Value::Object(extension)) => {
            for (key, value) in extension {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (base, _) => base,
    }
}

/// A merged schema document together with its compiled validator.
pub struct CompiledSchema {
    document: Value,
    validator: Validator,
}

impl CompiledSchema {
    /// Merge `extension` onto `base` and compile the result.
    pub fn compile(base: Value, extension: Option<Value>) -> Result<Self, String> {
        let document = match extension {
            Some(extension) => merge_schemas(base, extension),
            None => base,
        };
        let validator = jsonschema::options()
            .with_draft(Draft::Draft7)
            .build(&document)
            .map_err(|e| e.to_string())?;
        Ok(CompiledSchema {
            document,
            validator,
        })
    }

    /// The merged document this validator was compiled from.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Check `payload`, returning every violation on failure.
    pub fn validate(&self, payload: &Value) -> Result<(), Vec<SchemaViolation>> {
        let violations: Vec<SchemaViolation> = self
            .validator
            .iter_errors(payload)
            .map(|error| SchemaViolation::new(error.to_string()))
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}
