//! App Core for Linkshelf.
//!
//! Wires one client session to its controllers and drives the view-level flow:
//! the session gate in front of the list view, the form's refresh callback, and
//! sign-out.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::managers::bookmark_form::BookmarkForm;
use crate::managers::bookmark_list::BookmarkList;
use crate::managers::session_gate::{self, GateDecision, SessionGate};
use crate::services::local_backend::{LocalBackend, LocalClient};
use crate::types::bookmark::Bookmark;
use crate::types::errors::FormError;
use crate::types::session::Navigation;
use crate::types::settings::AppConfig;

/// Central struct for one client session.
///
/// The controllers receive the client as injected `Arc<dyn …>` capabilities;
/// `App` keeps the concrete handle for the OAuth callback leg.
pub struct App {
    pub config: AppConfig,
    pub client: Arc<LocalClient>,
    pub gate: SessionGate,
    pub list: BookmarkList,
    pub form: BookmarkForm,
}

impl App {
    /// Opens the local backend at `database_path` and creates a client session on it.
    pub fn new(config: AppConfig, database_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let backend = LocalBackend::open(database_path)?;
        info!(path = %database_path.display(), "local backend opened");
        Ok(Self::with_backend(config, &backend))
    }

    /// Creates a new client session on an existing backend.
    pub fn with_backend(config: AppConfig, backend: &Arc<LocalBackend>) -> Self {
        let client = Arc::new(backend.client());
        let gate = SessionGate::new(client.clone(), config.sign_in_path.clone());
        let list = BookmarkList::new(client.clone(), client.clone());
        let form = BookmarkForm::new(client.clone(), client.clone());

        Self {
            config,
            client,
            gate,
            list,
            form,
        }
    }

    /// Opens the main list view. The session is re-checked on every open; a
    /// visible list is remounted so it fetches and subscribes afresh.
    pub async fn open_home(&mut self) -> Navigation {
        match self.gate.check().await {
            GateDecision::Render(_) => {
                if self.list.is_mounted() {
                    self.list.unmount().await;
                }
                self.list.mount().await;
                Navigation::Home(self.config.home_path.clone())
            }
            GateDecision::Redirect(navigation) => {
                self.list.unmount().await;
                navigation
            }
        }
    }

    pub async fn close_home(&mut self) {
        self.list.unmount().await;
    }

    /// Submits the add form with the given fields; the list refreshes on success.
    pub async fn add_bookmark(&mut self, title: &str, url: &str) -> Result<Bookmark, FormError> {
        self.form.set_title(title);
        self.form.set_url(url);
        let list = &self.list;
        self.form.submit(|| list.refresh()).await
    }

    /// Signs out, tears down the list view and lands on the sign-in entry point.
    pub async fn sign_out(&mut self) -> Navigation {
        self.list.unmount().await;
        session_gate::sign_out(self.client.as_ref(), &self.config.sign_in_path).await
    }

    pub async fn shutdown(&mut self) {
        self.list.unmount().await;
    }
}
