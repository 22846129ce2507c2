use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::context::RequestContext;
use super::platforms::{AdapterRejection, AuthorizedRequest, PasswordResetRequest, UserAdapter};

/// PlainPlatformConfig describes an in-memory account directory, seeded
/// from the config file.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct PlainPlatformConfig {
    /// Platform id.
    pub name: String,
    #[serde(default)]
    pub users: Vec<PlainUserEntry>,
}

/// A seeded account.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct PlainUserEntry {
    pub email: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    #[serde(default)]
    pub orders: Vec<Value>,
}

#[derive(Debug, Clone)]
struct Account {
    id: u64,
    password: String,
    customer: Map<String, Value>,
    orders: Vec<Value>,
    /// The account's live session token, if logged in.
    session: Option<String>,
}

impl Account {
    fn email(&self) -> Option<&str> {
        self.customer.get("email").and_then(Value::as_str)
    }

    fn profile(&self) -> Value {
        let mut profile = self.customer.clone();
        profile.insert("id".to_string(), json!(self.id));
        Value::Object(profile)
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    accounts: HashMap<u64, Account>,
    /// session token -> account id
    sessions: HashMap<String, u64>,
    next_id: u64,
}

impl DirectoryState {
    fn insert(&mut self, password: String, customer: Map<String, Value>, orders: Vec<Value>) -> &Account {
        self.next_id += 1;
        let id = self.next_id;
        self.accounts.entry(id).or_insert(Account {
            id,
            password,
            customer,
            orders,
            session: None,
        })
    }

    fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|account| account.email().is_some_and(|e| e.eq_ignore_ascii_case(email)))
    }

    fn session_id(&self, token: &str) -> Result<u64, AdapterRejection> {
        self.sessions
            .get(token)
            .copied()
            .filter(|id| self.accounts.contains_key(id))
            .ok_or_else(|| AdapterRejection::from("Invalid or expired session token"))
    }

    fn session_account(&self, token: &str) -> Result<&Account, AdapterRejection> {
        let id = self.session_id(token)?;
        self.accounts
            .get(&id)
            .ok_or_else(|| AdapterRejection::from("Invalid or expired session token"))
    }

    fn session_account_mut(&mut self, token: &str) -> Result<&mut Account, AdapterRejection> {
        let id = self.session_id(token)?;
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| AdapterRejection::from("Invalid or expired session token"))
    }

    /// Opens a new session for the account, closing its previous one.
    fn open_session(&mut self, id: u64) -> Option<String> {
        let account = self.accounts.get_mut(&id)?;
        let token = Uuid::new_v4().to_string();
        if let Some(previous) = account.session.replace(token.clone()) {
            self.sessions.remove(&previous);
        }
        self.sessions.insert(token.clone(), id);
        Some(token)
    }
}

/// The backend storage of a plain platform: accounts and login sessions.
/// Cloning yields another handle to the same directory.
#[derive(Clone, Default)]
pub struct PlainDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl PlainDirectory {
    pub fn from_config(config: &PlainPlatformConfig) -> Self {
        info!(
            "Creating plain platform '{}' with {} seeded account(s)",
            config.name,
            config.users.len()
        );
        let mut state = DirectoryState::default();
        for user in &config.users {
            let mut customer = Map::new();
            customer.insert("email".to_string(), json!(user.email));
            customer.insert("firstname".to_string(), json!(user.firstname));
            customer.insert("lastname".to_string(), json!(user.lastname));
            state.insert(user.password.clone(), customer, user.orders.clone());
        }
        PlainDirectory {
            state: Arc::new(RwLock::new(state)),
        }
    }
}

/// Adapter over a `PlainDirectory`, bound to one request.
pub struct PlainPlatformAdapter {
    platform: String,
    directory: PlainDirectory,
    context: RequestContext,
}

impl PlainPlatformAdapter {
    pub fn new(platform: String, directory: PlainDirectory, context: RequestContext) -> Self {
        Self {
            platform,
            directory,
            context,
        }
    }
}

fn required_str<'a>(value: &'a Value, field: &str) -> Result<&'a str, AdapterRejection> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AdapterRejection::from(format!("Missing field '{}'", field)))
}

#[async_trait]
impl UserAdapter for PlainPlatformAdapter {
    fn platform(&self) -> &str {
        &self.platform
    }

    async fn register(&self, body: Value) -> Result<Value, AdapterRejection> {
        let customer = body
            .get("customer")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| AdapterRejection::from("Missing customer data"))?;
        let email = required_str(&body["customer"], "email")?.to_string();
        let password = required_str(&body, "password")?.to_string();

        let mut state = self.directory.state.write().await;
        if state.find_by_email(&email).is_some() {
            return Err(AdapterRejection::from(
                "A customer with the same email address already exists",
            ));
        }
        let account = state.insert(password, customer, Vec::new());
        debug!(
            "Registered account {} on '{}' (request {})",
            account.id, self.platform, self.context.request_id
        );
        Ok(account.profile())
    }

    async fn login(&self, credentials: Value) -> Result<Value, AdapterRejection> {
        let username = required_str(&credentials, "username")?;
        let password = required_str(&credentials, "password")?;

        let mut state = self.directory.state.write().await;
        let id = match state.find_by_email(username) {
            Some(account) if account.password == password => account.id,
            _ => {
                debug!(
                    "Failed login for '{}' on '{}' (request {})",
                    username, self.platform, self.context.request_id
                );
                return Err(AdapterRejection::from("Invalid login or password"));
            }
        };
        let session = state
            .open_session(id)
            .ok_or_else(|| AdapterRejection::from("Invalid login or password"))?;
        Ok(Value::String(session))
    }

    async fn me(&self, token: &str) -> Result<Value, AdapterRejection> {
        let state = self.directory.state.read().await;
        Ok(state.session_account(token)?.profile())
    }

    async fn order_history(&self, token: &str) -> Result<Value, AdapterRejection> {
        let state = self.directory.state.read().await;
        let account = state.session_account(token)?;
        Ok(json!({
            "items": account.orders,
            "total_count": account.orders.len(),
        }))
    }

    async fn update(&self, request: AuthorizedRequest) -> Result<Value, AdapterRejection> {
        let changes = request
            .body
            .get("customer")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| AdapterRejection::from("Missing customer data"))?;

        let mut state = self.directory.state.write().await;
        let id = state.session_id(&request.token)?;
        if let Some(email) = changes.get("email").and_then(Value::as_str) {
            if state.find_by_email(email).is_some_and(|other| other.id != id) {
                return Err(AdapterRejection::from(
                    "A customer with the same email address already exists",
                ));
            }
        }
        let account = state.session_account_mut(&request.token)?;
        for (key, value) in changes {
            if key != "id" {
                account.customer.insert(key, value);
            }
        }
        Ok(account.profile())
    }

    async fn change_password(&self, request: AuthorizedRequest) -> Result<Value, AdapterRejection> {
        let current = required_str(&request.body, "currentPassword")?;
        let new_password = required_str(&request.body, "newPassword")?;

        let mut state = self.directory.state.write().await;
        let account = state.session_account_mut(&request.token)?;
        if account.password != current {
            return Err(AdapterRejection::from("The password doesn't match this account"));
        }
        account.password = new_password.to_string();
        Ok(Value::Bool(true))
    }

    async fn reset_password(&self, request: PasswordResetRequest) -> Result<Value, AdapterRejection> {
        let state = self.directory.state.read().await;
        if state.find_by_email(&request.email).is_none() {
            return Err(AdapterRejection::from(format!(
                "No account found for e-mail '{}'",
                request.email
            )));
        }
        info!(
            "Password reset requested for '{}' using template '{}' on website {} (request {})",
            request.email, request.template, request.website_id, self.context.request_id
        );
        Ok(Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> PlainPlatformConfig {
        PlainPlatformConfig {
            name: "shop".to_string(),
            users: vec![PlainUserEntry {
                email: "jane@example.com".to_string(),
                password: "password1".to_string(),
                firstname: "Jane".to_string(),
                lastname: "Doe".to_string(),
                orders: vec![json!({ "increment_id": "000000001", "grand_total": 42.5 })],
            }],
        }
    }

    fn adapter(directory: &PlainDirectory) -> PlainPlatformAdapter {
        PlainPlatformAdapter::new("shop".to_string(), directory.clone(), RequestContext::anonymous())
    }

    async fn login(directory: &PlainDirectory, username: &str, password: &str) -> Result<String, AdapterRejection> {
        let session = adapter(directory)
            .login(json!({ "username": username, "password": password }))
            .await?;
        Ok(session.as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let directory = PlainDirectory::from_config(&create_test_config());
        let token = login(&directory, "jane@example.com", "password1").await.unwrap();

        let profile = adapter(&directory).me(&token).await.unwrap();
        assert_eq!(profile["email"], "jane@example.com");
        assert_eq!(profile["firstname"], "Jane");
        assert_eq!(profile["id"], 1);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_rejected() {
        let directory = PlainDirectory::from_config(&create_test_config());

        let result = login(&directory, "jane@example.com", "nope").await;
        assert_eq!(result.unwrap_err(), AdapterRejection::from("Invalid login or password"));
    }

    #[tokio::test]
    async fn test_sessions_are_shared_between_adapter_instances() {
        let directory = PlainDirectory::from_config(&create_test_config());
        let token = login(&directory, "jane@example.com", "password1").await.unwrap();

        let history = adapter(&directory).order_history(&token).await.unwrap();
        assert_eq!(history["total_count"], 1);
        assert_eq!(history["items"][0]["increment_id"], "000000001");
    }

    #[tokio::test]
    async fn test_login_replaces_previous_session() {
        let directory = PlainDirectory::from_config(&create_test_config());
        let first = login(&directory, "jane@example.com", "password1").await.unwrap();
        let second = login(&directory, "jane@example.com", "password1").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(
            adapter(&directory).me(&first).await.unwrap_err(),
            AdapterRejection::from("Invalid or expired session token")
        );
        assert!(adapter(&directory).me(&second).await.is_ok());
        assert_eq!(directory.state.read().await.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_lookups_share_the_directory_with_readers() {
        let directory = PlainDirectory::from_config(&create_test_config());
        let token = login(&directory, "jane@example.com", "password1").await.unwrap();

        let _reader = directory.state.read().await;
        let lookups = async {
            let profile = adapter(&directory).me(&token).await?;
            let history = adapter(&directory).order_history(&token).await?;
            Ok::<_, AdapterRejection>((profile, history))
        };
        let (profile, history) = tokio::time::timeout(std::time::Duration::from_secs(1), lookups)
            .await
            .expect("lookups should not wait for exclusive access")
            .unwrap();

        assert_eq!(profile["email"], "jane@example.com");
        assert_eq!(history["total_count"], 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let directory = PlainDirectory::from_config(&create_test_config());

        assert!(adapter(&directory).me("bogus").await.is_err());
        assert!(adapter(&directory).order_history("bogus").await.is_err());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let directory = PlainDirectory::default();
        let profile = adapter(&directory)
            .register(json!({
                "customer": { "email": "john@example.com", "firstname": "John", "lastname": "Roe" },
                "password": "hunter22"
            }))
            .await
            .unwrap();
        assert_eq!(profile["email"], "john@example.com");

        assert!(login(&directory, "john@example.com", "hunter22").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_is_rejected() {
        let directory = PlainDirectory::from_config(&create_test_config());

        let result = adapter(&directory)
            .register(json!({
                "customer": { "email": "JANE@example.com", "firstname": "J", "lastname": "D" },
                "password": "hunter22"
            }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let directory = PlainDirectory::from_config(&create_test_config());
        let token = login(&directory, "jane@example.com", "password1").await.unwrap();

        let profile = adapter(&directory)
            .update(AuthorizedRequest {
                token: token.clone(),
                body: json!({ "customer": { "email": "jane@example.com", "firstname": "Janet", "lastname": "Doe", "id": 99 } }),
            })
            .await
            .unwrap();

        assert_eq!(profile["firstname"], "Janet");
        assert_eq!(profile["id"], 1);
    }

    #[tokio::test]
    async fn test_change_password() {
        let directory = PlainDirectory::from_config(&create_test_config());
        let token = login(&directory, "jane@example.com", "password1").await.unwrap();

        let wrong = adapter(&directory)
            .change_password(AuthorizedRequest {
                token: token.clone(),
                body: json!({ "currentPassword": "nope", "newPassword": "password2" }),
            })
            .await;
        assert!(wrong.is_err());

        let changed = adapter(&directory)
            .change_password(AuthorizedRequest {
                token,
                body: json!({ "currentPassword": "password1", "newPassword": "password2" }),
            })
            .await
            .unwrap();
        assert_eq!(changed, Value::Bool(true));

        assert!(login(&directory, "jane@example.com", "password1").await.is_err());
        assert!(login(&directory, "jane@example.com", "password2").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password() {
        let directory = PlainDirectory::from_config(&create_test_config());
        let request = |email: &str| PasswordResetRequest {
            email: email.to_string(),
            template: "email_reset".to_string(),
            website_id: 1,
        };

        assert_eq!(
            adapter(&directory).reset_password(request("jane@example.com")).await.unwrap(),
            Value::Bool(true)
        );
        assert!(adapter(&directory).reset_password(request("who@example.com")).await.is_err());
    }
}
