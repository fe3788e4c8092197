//! Session identity: the bearer credential and the signed-in profile.
//!
//! [`Identity`] is the single writer of the session. It hydrates once from
//! a [`SessionStorage`] at construction, replaces the session on login or
//! registration, and clears memory and storage together on logout. The
//! credential is mirrored onto the owned [`ApiClient`] so every later
//! request is authenticated.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use balanceed_core::{
    AuthResponse, BalanceedError, Config, DemoCredentials, DemoSetup, FormInput, LoginRequest,
    RegisterProfile, Result, User,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ApiClient;

/// Storage key of the bearer credential.
pub const TOKEN_KEY: &str = "balanceed_token";
/// Storage key of the serialized user profile.
pub const USER_KEY: &str = "balanceed_user";

// ============================================================================
// Storage
// ============================================================================

/// Key/value persistence for the session.
pub trait SessionStorage: Send + Sync {
    /// Reads a value, `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Writes a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Deletes a value; deleting an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as a file under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Uses `dir`, creating it on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the session files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keeps the session in memory only.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

// ============================================================================
// Identity
// ============================================================================

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer credential.
    pub token: String,
    /// Signed-in user.
    pub user: User,
}

/// Owner of the session and of the authenticated API client.
#[derive(Debug)]
pub struct Identity<S: SessionStorage = FileStorage> {
    api: ApiClient,
    storage: S,
    session: Option<Session>,
    demo: DemoCredentials,
}

impl Identity<FileStorage> {
    /// Builds an identity persisted under `config.session_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api = ApiClient::new(config)?;
        let storage = FileStorage::new(&config.session_dir);
        Ok(Self::new(api, storage, config.demo.clone()))
    }
}

impl<S: SessionStorage> Identity<S> {
    /// Creates an identity and hydrates it from `storage`.
    ///
    /// A missing credential, missing profile or unreadable profile yields no
    /// session, and both keys are removed from storage.
    pub fn new(api: ApiClient, storage: S, demo: DemoCredentials) -> Self {
        let mut identity = Self {
            api,
            storage,
            session: None,
            demo,
        };
        identity.hydrate();
        identity
    }

    fn hydrate(&mut self) {
        let token = self.read(TOKEN_KEY);
        let user = self.read(USER_KEY);

        let session = match (token, user) {
            (Some(token), Some(user)) => match serde_json::from_str::<User>(&user) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable persisted profile");
                    None
                }
            },
            _ => None,
        };

        match session {
            Some(session) => {
                info!(user = %session.user.email, "Restored session");
                self.api.set_token(Some(session.token.clone()));
                self.session = Some(session);
            }
            None => self.remove_persisted(),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                warn!(key, error = %e, "Failed to read persisted session");
                None
            }
        }
    }

    fn remove_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove persisted session");
            }
        }
    }

    /// The current session, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// Returns `true` if a session exists.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// The API client, authenticated when a session exists.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::AuthFailed` with the server's reason, or a
    /// network error. The session is unchanged on failure.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .api
            .post::<_, Value>("/auth/login", &request)
            .await
            .map_err(|e| auth_error(e, "Login failed"))?;
        self.establish(response)
    }

    /// Creates an account and signs in.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::MissingFields` for an incomplete profile,
    /// `AuthFailed` with the server's reason, or a network error.
    pub async fn register(&mut self, profile: &RegisterProfile) -> Result<User> {
        profile.validate()?;
        let response = self
            .api
            .post::<_, Value>("/auth/register", profile)
            .await
            .map_err(|e| auth_error(e, "Registration failed"))?;
        self.establish(response)
    }

    /// Resets and provisions the demo account, then signs in as the demo
    /// student.
    ///
    /// Cleanup failures are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if setup or the demo login fails.
    pub async fn setup_demo(&mut self) -> Result<User> {
        if let Err(e) = self.api.post_empty::<Value>("/demo/cleanup").await {
            debug!(error = %e, "Demo cleanup failed, continuing");
        }

        let setup: DemoSetup = self.api.post_empty("/demo/setup").await?;
        info!(message = %setup.message, "Demo data ready");

        let DemoCredentials { email, password } = self.demo.clone();
        self.login(&email, &password).await
    }

    /// Ends the session in memory and in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage could not be cleared; the in-memory
    /// session is gone either way.
    pub fn logout(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            info!(user = %session.user.email, "Signed out");
        }
        self.api.set_token(None);
        // Attempt both keys even if the first removal fails.
        let token = self.storage.remove(TOKEN_KEY);
        let user = self.storage.remove(USER_KEY);
        token.and(user)
    }

    fn establish(&mut self, response: Value) -> Result<User> {
        let AuthResponse { access_token, user } = serde_json::from_value(response)
            .map_err(|_| BalanceedError::auth_failed("Invalid server response"))?;

        info!(user = %user.email, role = %user.role, "Signed in");

        self.api.set_token(Some(access_token.clone()));
        self.session = Some(Session {
            token: access_token,
            user: user.clone(),
        });
        self.persist();
        Ok(user)
    }

    fn persist(&self) {
        let Some(session) = &self.session else {
            return;
        };
        let stored = serde_json::to_string(&session.user)
            .map_err(BalanceedError::from)
            .and_then(|user| {
                self.storage.set(TOKEN_KEY, &session.token)?;
                self.storage.set(USER_KEY, &user)
            });
        if let Err(e) = stored {
            warn!(error = %e, "Session will not survive a restart");
        }
    }
}

/// Maps a rejected auth request to `AuthFailed`, keeping transport errors.
fn auth_error(error: BalanceedError, fallback: &str) -> BalanceedError {
    match error {
        BalanceedError::Http { message, .. } if !message.is_empty() => {
            BalanceedError::auth_failed(message)
        }
        BalanceedError::Http { .. } => BalanceedError::auth_failed(fallback),
        BalanceedError::InvalidResponse { .. } => {
            BalanceedError::auth_failed("Invalid server response")
        }
        other => other,
    }
}
