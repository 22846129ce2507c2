use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Secrets used to sign refresh tokens.
#[derive(Deserialize, Serialize, JsonSchema, Clone)]
pub struct SecretsConfig {
    /// Preferred signing secret.
    #[serde(default)]
    pub auth_hash_secret: Option<String>,
    /// Fallback signing secret, used when `auth_hash_secret` is unset or empty.
    pub obj_hash_secret: String,
}

impl SecretsConfig {
    /// The secret that signs and verifies refresh tokens. Both sides of the
    /// codec must go through here so a token round-trips.
    pub fn signing_secret(&self) -> &str {
        self.auth_hash_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .unwrap_or(&self.obj_hash_secret)
    }
}

impl fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("auth_hash_secret", &self.auth_hash_secret.as_ref().map(|_| "<redacted>"))
            .field("obj_hash_secret", &"<redacted>")
            .finish()
    }
}
