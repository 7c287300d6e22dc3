use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

#[cfg(feature = "web")]
use crate::app::AppState;
#[cfg(feature = "web")]
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
#[cfg(feature = "web")]
use axum_extra::extract::cookie::{Cookie, CookieJar};
#[cfg(feature = "web")]
use std::sync::Arc;

const USERS_FILE: &str = "users.json";
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// What a logged-in user is allowed to do
///
/// Record editing, re-ingestion and feedback review are admin capabilities;
/// everyone else searches and browses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access including record edits and re-ingestion
    Admin,

    /// Search, browse, dashboards and feedback submission only
    Viewer,
}

impl Role {
    /// Whether this role may edit records and trigger re-ingestion
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// A provisioned application user
///
/// Users are provisioned into the credential file, not self-registered;
/// only password hashes are ever stored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Username (unique identifier for the user)
    pub username: String,

    /// Email address
    pub email: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,

    /// Granted role
    pub role: Role,
}

/// Login form data
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Username for login
    pub username: String,

    /// Password in plaintext (only transmitted, never stored)
    pub password: String,
}

/// User session data
#[derive(Debug, Clone)]
pub struct Session {
    /// Username of the authenticated user
    pub user_id: String,

    /// Role granted at login time
    pub role: Role,

    /// Time when the session expires
    pub expires_at: SystemTime,
}

/// Global sessions storage
///
/// Stores all active user sessions in a thread-safe map.
lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

/// Verification seam between the web layer and the credential list
///
/// Handlers check capabilities through this trait; nothing in the web layer
/// compares credentials directly.
pub trait Authenticator {
    /// Verify a username/password pair
    ///
    /// A failed match is a normal negative outcome (`Ok(None)`), never an
    /// error; repeated attempts are always permitted.
    fn verify_login(&self, username: &str, password: &str) -> Result<Option<Role>, String>;
}

/// The externally configured credential/role list
///
/// One JSON file of provisioned users under the database directory. No
/// credential material lives in source.
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    /// Open (and if necessary create) the credential file in a database directory
    ///
    /// # Arguments
    /// * `dir` - Database directory; created if missing
    ///
    /// # Returns
    /// * `Result<UserStore, String>` - The store, or an error message
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, String> {
        let dir = dir.as_ref();
        if !dir.exists() {
            create_dir_all(dir).map_err(|_| "Failed to create database directory".to_string())?;
        }

        let path = dir.join(USERS_FILE);
        if !path.exists() {
            let mut file =
                File::create(&path).map_err(|_| "Failed to create users file".to_string())?;
            file.write_all(b"{}")
                .map_err(|_| "Failed to initialize users file".to_string())?;
        }

        Ok(UserStore { path })
    }

    /// Get all provisioned users
    ///
    /// # Returns
    /// * `Result<HashMap<String, User>, String>` - Map of usernames to users
    ///
    /// # Errors
    /// * Returns an error if the users file cannot be opened, read, or parsed
    pub fn get_users(&self) -> Result<HashMap<String, User>, String> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(_) => return Err("Failed to open users file".to_string()),
        };

        let mut contents = String::new();
        if file.read_to_string(&mut contents).is_err() {
            return Err("Failed to read users file".to_string());
        }

        match serde_json::from_str(&contents) {
            Ok(users) => Ok(users),
            Err(_) => Err("Failed to parse users data".to_string()),
        }
    }

    /// Save the users map to disk
    fn save_users(&self, users: &HashMap<String, User>) -> Result<(), String> {
        let json = match serde_json::to_string_pretty(users) {
            Ok(json) => json,
            Err(_) => return Err("Failed to serialize users data".to_string()),
        };

        let mut file = match File::create(&self.path) {
            Ok(file) => file,
            Err(_) => return Err("Failed to create users file".to_string()),
        };

        if file.write_all(json.as_bytes()).is_err() {
            return Err("Failed to write users data".to_string());
        }

        Ok(())
    }

    /// Provision a new user
    ///
    /// The password is hashed before storage.
    ///
    /// # Arguments
    /// * `username` - Unique username for the new account
    /// * `email` - Email address for the user
    /// * `password` - Plain text password (will be hashed)
    /// * `role` - Role to grant
    ///
    /// # Returns
    /// * `Result<(), String>` - Success or an error message
    ///
    /// # Errors
    /// * Returns an error if the username is already provisioned
    /// * Returns an error if username or password is empty
    pub fn register_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(), String> {
        if username.is_empty() || password.is_empty() {
            return Err("Username and password cannot be empty".to_string());
        }

        let mut users = self.get_users()?;
        if users.contains_key(username) {
            return Err("Username already exists".to_string());
        }

        let password_hash = hash_password(password)?;

        let user = User {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
        };

        users.insert(username.to_string(), user);
        self.save_users(&users)?;

        Ok(())
    }

    /// Whether any user has been provisioned yet
    pub fn is_empty(&self) -> Result<bool, String> {
        Ok(self.get_users()?.is_empty())
    }
}

impl Authenticator for UserStore {
    fn verify_login(&self, username: &str, password: &str) -> Result<Option<Role>, String> {
        let users = self.get_users()?;

        if let Some(user) = users.get(username) {
            if verify_password(password, &user.password_hash)? {
                return Ok(Some(user.role));
            }
        }

        Ok(None)
    }
}

/// Hash a password using Argon2
///
/// # Arguments
/// * `password` - The plaintext password to hash
///
/// # Returns
/// * `Result<String, String>` - The password hash or an error
fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err("Password hashing failed".to_string()),
    }
}

/// Verify a password against a stored hash
///
/// # Arguments
/// * `password` - The plaintext password to verify
/// * `hash` - The stored password hash to check against
///
/// # Returns
/// * `Result<bool, String>` - True if the password matches, false if not
///
/// # Errors
/// * Returns an error if the hash is in an invalid format
fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err("Invalid password hash format".to_string()),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

/// Create a new user session
///
/// # Arguments
/// * `username` - The username to create a session for
/// * `role` - The role granted at login
///
/// # Returns
/// * `String` - A unique session ID
pub fn create_session(username: &str, role: Role) -> String {
    let session_id = Uuid::new_v4().to_string();
    let expires_at = SystemTime::now() + Duration::from_secs(SESSION_DURATION);

    let session = Session {
        user_id: username.to_string(),
        role,
        expires_at,
    };

    let mut sessions = SESSIONS.write().unwrap();
    sessions.insert(session_id.clone(), session);

    session_id
}

/// Validate a session
///
/// Checks if a session is valid and not expired.
///
/// # Arguments
/// * `session_id` - The session ID to validate
///
/// # Returns
/// * `Option<(String, Role)>` - Username and role for the session if valid
pub fn validate_session(session_id: &str) -> Option<(String, Role)> {
    let sessions = SESSIONS.read().unwrap();

    if let Some(session) = sessions.get(session_id) {
        if session.expires_at > SystemTime::now() {
            return Some((session.user_id.clone(), session.role));
        }
    }

    None
}

/// Remove a session
///
/// # Arguments
/// * `session_id` - The session ID to remove
pub fn end_session(session_id: &str) {
    let mut sessions = SESSIONS.write().unwrap();
    sessions.remove(session_id);
}

/// Expire a session immediately without removing it
///
/// Lets the session tests exercise the expiry path without waiting out the
/// session duration. Not part of the application surface.
#[doc(hidden)]
pub fn expire_session(session_id: &str) {
    let mut sessions = SESSIONS.write().unwrap();
    if let Some(session) = sessions.get_mut(session_id) {
        session.expires_at = SystemTime::now() - Duration::from_secs(1);
    }
}

// Web handler functions below (only compiled with "web" feature)

/// Serve the login page HTML
///
/// # Returns
/// * `Html<&'static str>` - The login page HTML
#[cfg(feature = "web")]
pub async fn serve_login_page() -> Html<&'static str> {
    Html(include_str!("./static/login.html"))
}

/// Handle user login requests
///
/// Validates credentials against the provisioned user list and creates a
/// session if valid. A wrong password is a 401; repeated attempts are always
/// permitted.
///
/// # Arguments
/// * `state` - Application state carrying the user store
/// * `jar` - Cookie jar for storing the session cookie
/// * `credentials` - Form data containing the username and password
///
/// # Returns
/// * `Response` - Redirect to the app if successful, or error message if not
#[cfg(feature = "web")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<UserCredentials>,
) -> Response {
    match state
        .users
        .verify_login(&credentials.username, &credentials.password)
    {
        Ok(Some(role)) => {
            let session_id = create_session(&credentials.username, role);
            let cookie = Cookie::new("session", session_id);
            (jar.add(cookie), Redirect::to("/app")).into_response()
        }
        Ok(None) => (StatusCode::UNAUTHORIZED, "Invalid username or password").into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error").into_response(),
    }
}

/// Handle user logout
///
/// Ends the session and clears the session cookie.
///
/// # Arguments
/// * `jar` - Cookie jar containing the session cookie
///
/// # Returns
/// * `(CookieJar, Redirect)` - Modified cookie jar and redirect response
#[cfg(feature = "web")]
pub async fn handle_logout(jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get("session") {
        end_session(cookie.value());
    }

    let cookie = Cookie::new("session", "");
    (jar.add(cookie), Redirect::to("/login"))
}
