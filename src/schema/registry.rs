use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use super::compiled::CompiledSchema;
use crate::config::{SchemaSource, SchemasConfig};

const USER_REGISTER_SCHEMA: &str = include_str!("../../schemas/user_register.schema.json");
const USER_PROFILE_SCHEMA: &str = include_str!("../../schemas/user_profile.schema.json");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("schema file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("bundled {name} schema is not valid JSON: {source}")]
    Bundled {
        name: &'static str,
        source: serde_json::Error,
    },
    #[error("failed to compile {name} schema: {message}")]
    Compile { name: &'static str, message: String },
}

/// The compiled schemas of every schema-validated route.
#[derive(Debug)]
pub struct SchemaRegistry {
    /// Checked on `POST /create`.
    pub user_register: CompiledSchema,
    /// Checked on `POST /me`.
    pub user_profile: CompiledSchema,
}

impl SchemaRegistry {
    /// Load, merge and compile every schema named in `config`.
    pub fn load(config: &SchemasConfig) -> Result<Self, SchemaError> {
        info!("Compiling request schemas...");
        Ok(SchemaRegistry {
            user_register: compile_source("user_register", USER_REGISTER_SCHEMA, &config.user_register)?,
            user_profile: compile_source("user_profile", USER_PROFILE_SCHEMA, &config.user_profile)?,
        })
    }

    /// The bundled schemas, without extensions.
    pub fn bundled() -> Result<Self, SchemaError> {
        Self::load(&SchemasConfig::default())
    }
}

fn compile_source(
    name: &'static str,
    bundled: &str,
    source: &SchemaSource,
) -> Result<CompiledSchema, SchemaError> {
    let base = match &source.base {
        Some(path) => read_json(path)?,
        None => serde_json::from_str(bundled).map_err(|source| SchemaError::Bundled { name, source })?,
    };
    let extension = source.extension.as_deref().map(read_json).transpose()?;
    if let Some(path) = &source.extension {
        info!("Merging {} schema extension from {}", name, path.display());
    }
    CompiledSchema::compile(base, extension).map_err(|message| SchemaError::Compile { name, message })
}

fn read_json(path: &Path) -> Result<Value, SchemaError> {
    let raw = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SchemaError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_temp(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("accountotron-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, contents).expect("temp file should be writable");
        path
    }

    fn registration() -> Value {
        json!({
            "customer": {
                "email": "jane@example.com",
                "firstname": "Jane",
                "lastname": "Doe"
            },
            "password": "correct horse"
        })
    }

    #[test]
    fn test_bundled_schemas_accept_valid_payloads() {
        let registry = SchemaRegistry::bundled().unwrap();

        assert!(registry.user_register.validate(&registration()).is_ok());
        assert!(registry
            .user_profile
            .validate(&json!({ "customer": registration()["customer"] }))
            .is_ok());
    }

    #[test]
    fn test_bundled_register_schema_requires_password() {
        let registry = SchemaRegistry::bundled().unwrap();
        let mut payload = registration();
        payload.as_object_mut().unwrap().remove("password");

        let violations = registry.user_register.validate(&payload).unwrap_err();
        assert!(!violations.is_empty());
    }

    #[test]
    fn test_extension_file_overrides_bundled_base() {
        let extension = write_temp(r#"{ "required": ["customer"] }"#);
        let config = SchemasConfig {
            user_register: SchemaSource {
                base: None,
                extension: Some(extension.clone()),
            },
            ..SchemasConfig::default()
        };

        let registry = SchemaRegistry::load(&config).unwrap();
        let mut payload = registration();
        payload.as_object_mut().unwrap().remove("password");
        assert!(registry.user_register.validate(&payload).is_ok());
        assert_eq!(registry.user_register.document()["required"], json!(["customer"]));

        fs::remove_file(extension).ok();
    }

    #[test]
    fn test_missing_file_is_reported() {
        let config = SchemasConfig {
            user_profile: SchemaSource {
                base: Some(PathBuf::from("/definitely/not/here.json")),
                extension: None,
            },
            ..SchemasConfig::default()
        };

        assert!(matches!(SchemaRegistry::load(&config), Err(SchemaError::Read { .. })));
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let base = write_temp("{ not json");
        let config = SchemasConfig {
            user_profile: SchemaSource {
                base: Some(base.clone()),
                extension: None,
            },
            ..SchemasConfig::default()
        };

        assert!(matches!(SchemaRegistry::load(&config), Err(SchemaError::Parse { .. })));
        fs::remove_file(base).ok();
    }
}
