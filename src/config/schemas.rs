use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where to find the request schemas. Anything left out uses the schema
/// bundled into the binary, with no extension.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, Default)]
pub struct SchemasConfig {
    #[serde(default)]
    pub user_register: SchemaSource,
    #[serde(default)]
    pub user_profile: SchemaSource,
}

/// A base schema plus an optional extension merged on top of it.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, Default)]
pub struct SchemaSource {
    /// JSON file replacing the bundled base schema.
    pub base: Option<PathBuf>,
    /// JSON file whose top-level keys override the base schema's.
    pub extension: Option<PathBuf>,
}
