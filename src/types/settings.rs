use serde::{Deserialize, Serialize};

use super::session::OAuthProvider;

/// Process-level configuration, loaded from a JSON file by the settings engine.
///
/// Every field has a default so a partial (or absent) file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file backing the local store. `None` resolves to the platform data dir.
    pub database_path: Option<String>,
    /// Route of the sign-in entry point.
    pub sign_in_path: String,
    /// Route of the main list view.
    pub home_path: String,
    /// Origin the OAuth provider redirects back to after sign-in.
    pub redirect_origin: String,
    pub default_provider: OAuthProvider,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            sign_in_path: "/login".to_string(),
            home_path: "/".to_string(),
            redirect_origin: "http://localhost:3000".to_string(),
            default_provider: OAuthProvider::Google,
            log_filter: "info".to_string(),
        }
    }
}
