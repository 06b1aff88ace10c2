//! Process-wide session state: the bearer token and the signed-in user.
//!
//! The session is restored from storage on startup, written at login and
//! cleared at logout. The HTTP client only sees it through
//! [`CredentialSource`], so tests can hand it any token they like.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::api::types::User;

/// Storage name of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage name of the serialized user profile.
pub const USER_KEY: &str = "user";

/// Read accessor for the credential attached to outgoing requests.
pub trait CredentialSource: Send + Sync {
  fn bearer_token(&self) -> Option<String>;
}

/// Key/value persistence for session items.
pub trait SessionStorage: Send + Sync {
  fn get_item(&self, name: &str) -> Result<Option<String>>;
  fn set_item(&self, name: &str, value: &str) -> Result<()>;
  fn remove_item(&self, name: &str) -> Result<()>;
}

/// Storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
  items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SessionStorage for MemoryStorage {
  fn get_item(&self, name: &str) -> Result<Option<String>> {
    let items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(items.get(name).cloned())
  }

  fn set_item(&self, name: &str, value: &str) -> Result<()> {
    let mut items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    items.insert(name.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, name: &str) -> Result<()> {
    let mut items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    items.remove(name);
    Ok(())
  }
}

/// SQLite-backed session storage, surviving restarts.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session_items (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStorage {
  /// Open the session database at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open (or create) the session database at `path`.
  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open session database at {}: {}", path.display(), e))?;
    conn
      .execute_batch(SESSION_SCHEMA)
      .map_err(|e| eyre!("Failed to run session migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("shopdesk").join("session.db"))
  }
}

impl SessionStorage for SqliteStorage {
  fn get_item(&self, name: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT value FROM session_items WHERE name = ?",
        params![name],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read session item {}: {}", name, e))
  }

  fn set_item(&self, name: &str, value: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO session_items (name, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![name, value],
      )
      .map_err(|e| eyre!("Failed to store session item {}: {}", name, e))?;
    Ok(())
  }

  fn remove_item(&self, name: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM session_items WHERE name = ?", params![name])
      .map_err(|e| eyre!("Failed to remove session item {}: {}", name, e))?;
    Ok(())
  }
}

#[derive(Debug, Clone, Default)]
struct SessionState {
  token: Option<String>,
  user: Option<User>,
}

/// The signed-in session, shared by the HTTP client and the UI.
pub struct Session {
  storage: Box<dyn SessionStorage>,
  state: RwLock<SessionState>,
}

impl Session {
  /// Restore the session from storage.
  ///
  /// A token without a readable profile (or the reverse) is treated as a
  /// broken session and cleared.
  pub fn restore(storage: Box<dyn SessionStorage>) -> Result<Self> {
    let token = storage.get_item(TOKEN_KEY)?;
    let user = match storage.get_item(USER_KEY)? {
      Some(raw) => match serde_json::from_str::<User>(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
          warn!("Discarding unreadable stored profile: {}", e);
          None
        }
      },
      None => None,
    };

    let state = match (token, user) {
      (Some(token), Some(user)) => SessionState {
        token: Some(token),
        user: Some(user),
      },
      (None, None) => SessionState::default(),
      _ => {
        warn!("Stored session is incomplete, clearing it");
        storage.remove_item(TOKEN_KEY)?;
        storage.remove_item(USER_KEY)?;
        SessionState::default()
      }
    };

    Ok(Self {
      storage,
      state: RwLock::new(state),
    })
  }

  /// Set the token before the profile is known.
  ///
  /// Only kept in memory; persisted once [`Session::login`] completes.
  pub fn begin(&self, token: &str) -> Result<()> {
    let mut state = self
      .state
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    state.token = Some(token.to_string());
    state.user = None;
    Ok(())
  }

  /// Store token and profile together.
  pub fn login(&self, token: &str, user: User) -> Result<()> {
    let raw = serde_json::to_string(&user).map_err(|e| eyre!("Failed to serialize profile: {}", e))?;
    self.storage.set_item(TOKEN_KEY, token)?;
    self.storage.set_item(USER_KEY, &raw)?;

    let mut state = self
      .state
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    info!(user = %user.name, role = ?user.role, "Signed in");
    state.token = Some(token.to_string());
    state.user = Some(user);
    Ok(())
  }

  /// Clear token and profile together.
  pub fn logout(&self) -> Result<()> {
    self.storage.remove_item(TOKEN_KEY)?;
    self.storage.remove_item(USER_KEY)?;

    let mut state = self
      .state
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    if let Some(user) = state.user.take() {
      info!(user = %user.name, "Signed out");
    }
    state.token = None;
    Ok(())
  }

  pub fn user(&self) -> Option<User> {
    self.state.read().ok().and_then(|s| s.user.clone())
  }

  pub fn is_signed_in(&self) -> bool {
    self
      .state
      .read()
      .map(|s| s.token.is_some() && s.user.is_some())
      .unwrap_or(false)
  }
}

impl CredentialSource for Session {
  fn bearer_token(&self) -> Option<String> {
    self.state.read().ok().and_then(|s| s.token.clone())
  }
}
