use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The authenticated user behind a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub provider: OAuthProvider,
}

/// OAuth identity providers accepted for sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    GitHub,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::GitHub => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::GitHub),
            other => Err(format!("unsupported provider: {}", other)),
        }
    }
}

/// First leg of an OAuth sign-in: where to send the user, and the state token
/// that the callback must present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInRedirect {
    pub provider: OAuthProvider,
    pub authorize_url: String,
    pub state: String,
}

/// Where the UI should go next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", content = "path", rename_all = "snake_case")]
pub enum Navigation {
    SignIn(String),
    Home(String),
}

impl Navigation {
    pub fn path(&self) -> &str {
        match self {
            Navigation::SignIn(path) | Navigation::Home(path) => path,
        }
    }
}
