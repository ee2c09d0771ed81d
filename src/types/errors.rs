use std::fmt;

// === UrlError ===

/// Errors produced by URL normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    /// The input could not be parsed as an absolute URL.
    InvalidUrl(String),
}

impl fmt::Display for UrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlError::InvalidUrl(input) => write!(f, "Invalid URL: {}", input),
        }
    }
}

impl std::error::Error for UrlError {}

// === StoreError ===

/// Errors returned by a bookmark store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A bookmark with the same normalized URL already exists for the owner.
    Conflict(String),
    /// Bookmark with the given ID was not found (or is not visible to the caller).
    NotFound(String),
    /// The store's access policy rejected the operation.
    PermissionDenied(String),
    /// Database operation failed.
    Database(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict(url) => write!(f, "Bookmark already stored: {}", url),
            StoreError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
            StoreError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            StoreError::Database(msg) => write!(f, "Store database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

// === AuthError ===

/// Errors returned by the authentication capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The OAuth callback presented a state token that was never issued or was already used.
    UnknownSignInState(String),
    /// The auth backend failed.
    Backend(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::UnknownSignInState(state) => {
                write!(f, "Unknown sign-in state: {}", state)
            }
            AuthError::Backend(msg) => write!(f, "Auth backend error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<rusqlite::Error> for AuthError {
    fn from(e: rusqlite::Error) -> Self {
        AuthError::Backend(e.to_string())
    }
}

// === FormError ===

/// Outcome of a failed add-bookmark submission.
///
/// The `Display` output is the message shown inline under the form. Store
/// failure detail is logged, never carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// Bad user input.
    Validation(String),
    /// No signed-in user.
    Auth(String),
    /// The bookmark already exists for this user.
    Conflict(String),
    /// The store failed for any other reason.
    Store,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Validation(msg) | FormError::Auth(msg) | FormError::Conflict(msg) => {
                f.write_str(msg)
            }
            FormError::Store => f.write_str("Something went wrong"),
        }
    }
}

impl std::error::Error for FormError {}

// === ConfigError ===

/// Errors related to loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading the config file.
    Io(String),
    /// The config file is not valid JSON for `AppConfig`.
    Parse(String),
    /// A config value is present but unusable.
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
