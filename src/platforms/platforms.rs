use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::context::RequestContext;
use super::plain_platform::{PlainDirectory, PlainPlatformAdapter, PlainPlatformConfig};
use super::rest_platform::{RestPlatformAdapter, RestPlatformConfig};
use crate::error::ApiError;

/// Configuration options for each backend platform. The `name` of each entry
/// is the platform id that `platform` in the main config refers to.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "type")]
pub enum PlatformConfig {
    #[serde(rename = "plain")]
    Plain(PlainPlatformConfig),
    #[serde(rename = "rest")]
    Rest(RestPlatformConfig),
}

impl PlatformConfig {
    pub fn name(&self) -> &str {
        match self {
            PlatformConfig::Plain(cfg) => &cfg.name,
            PlatformConfig::Rest(cfg) => &cfg.name,
        }
    }
}

/// The API domain an adapter is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    User,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::User => f.write_str("user"),
        }
    }
}

/// An opaque failure reported by a platform. The dispatcher forwards it to
/// the caller without looking inside.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AdapterRejection(pub Value);

impl fmt::Display for AdapterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(message) => f.write_str(message),
            other => write!(f, "{}", other),
        }
    }
}

impl std::error::Error for AdapterRejection {}

impl From<String> for AdapterRejection {
    fn from(message: String) -> Self {
        AdapterRejection(Value::String(message))
    }
}

impl From<&str> for AdapterRejection {
    fn from(message: &str) -> Self {
        AdapterRejection(Value::String(message.to_string()))
    }
}

/// Argument of the capabilities that act on a signed-in user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorizedRequest {
    pub token: String,
    pub body: Value,
}

/// Argument of `reset_password`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
    pub template: String,
    pub website_id: u32,
}

/// The account capabilities every platform must implement.
#[async_trait::async_trait]
pub trait UserAdapter: Send + Sync {
    /// The platform id this adapter was resolved from (for logs/debug).
    fn platform(&self) -> &str;

    async fn register(&self, body: Value) -> Result<Value, AdapterRejection>;
    async fn login(&self, credentials: Value) -> Result<Value, AdapterRejection>;
    async fn me(&self, token: &str) -> Result<Value, AdapterRejection>;
    async fn order_history(&self, token: &str) -> Result<Value, AdapterRejection>;
    async fn update(&self, request: AuthorizedRequest) -> Result<Value, AdapterRejection>;
    async fn change_password(&self, request: AuthorizedRequest) -> Result<Value, AdapterRejection>;
    async fn reset_password(&self, request: PasswordResetRequest) -> Result<Value, AdapterRejection>;
}

/// Builds a fresh adapter bound to one request.
pub type PlatformFactory = Arc<dyn Fn(RequestContext) -> Box<dyn UserAdapter> + Send + Sync>;

/// Lookup table from platform id to the factory producing its adapters.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    factories: HashMap<String, PlatformFactory>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every configured platform under its name.
    pub fn from_config(configs: &[PlatformConfig]) -> Self {
        info!("Creating platforms...");
        let mut registry = Self::new();
        for config in configs {
            registry.factories.insert(config.name().to_string(), create_platform_factory(config));
        }
        registry
    }

    /// Register (or replace) the implementation behind `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(RequestContext) -> Box<dyn UserAdapter> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            warn!("Platform '{}' registered twice; keeping the latest", name);
        }
    }

    pub fn contains(&self, platform: &str) -> bool {
        self.factories.contains_key(platform)
    }

    /// Registered platform ids, sorted.
    pub fn platform_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Build a new adapter for `platform`, bound to `context`. Adapters are
    /// never cached: two calls always yield two distinct instances.
    pub fn get_adapter(
        &self,
        platform: &str,
        domain: Domain,
        context: RequestContext,
    ) -> Result<Box<dyn UserAdapter>, ApiError> {
        let factory = self.factories.get(platform).ok_or_else(|| {
            ApiError::Configuration(format!(
                "No {} adapter registered for platform '{}'",
                domain, platform
            ))
        })?;
        debug!(
            "Resolved {} adapter for platform '{}' (request {})",
            domain, platform, context.request_id
        );
        Ok(factory(context))
    }
}

/// Create the factory for a configured platform. State that belongs to the
/// backend itself (the plain directory, the HTTP client) is created here once;
/// each adapter gets a handle to it plus its own request context.
pub fn create_platform_factory(config: &PlatformConfig) -> PlatformFactory {
    match config {
        PlatformConfig::Plain(cfg) => {
            let directory = PlainDirectory::from_config(cfg);
            let name = cfg.name.clone();
            Arc::new(move |context: RequestContext| -> Box<dyn UserAdapter> {
                Box::new(PlainPlatformAdapter::new(name.clone(), directory.clone(), context))
            })
        }
        PlatformConfig::Rest(cfg) => {
            let cfg = cfg.clone();
            let client = reqwest::Client::new();
            Arc::new(move |context: RequestContext| -> Box<dyn UserAdapter> {
                Box::new(RestPlatformAdapter::new(&cfg, client.clone(), context))
            })
        }
    }
}
