//! Add-bookmark form controller.

use std::future::Future;
use std::sync::Arc;

use tracing::error;

use crate::services::backend::{AuthProvider, BookmarkStore};
use crate::services::url_normalizer::normalize;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::{FormError, StoreError};

pub const MSG_REQUIRED: &str = "Title and URL are required";
pub const MSG_INVALID_URL: &str = "Invalid URL";
pub const MSG_NOT_AUTHENTICATED: &str = "User not authenticated";
pub const MSG_DUPLICATE: &str = "Bookmark already exists";

/// Form state plus the submit flow: validate, normalize, resolve the user,
/// insert, then hand control to the caller's refresh callback.
pub struct BookmarkForm {
    store: Arc<dyn BookmarkStore>,
    auth: Arc<dyn AuthProvider>,
    title: String,
    url: String,
    loading: bool,
    error_message: Option<String>,
}

impl BookmarkForm {
    pub fn new(store: Arc<dyn BookmarkStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            store,
            auth,
            title: String::new(),
            url: String::new(),
            loading: false,
            error_message: None,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message shown under the form for the last failed submit.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Submits the current fields.
    ///
    /// Nothing reaches the store unless both fields are non-blank, the URL
    /// normalizes, and a user is signed in. On success the fields are cleared
    /// and `on_added` is awaited before returning the stored bookmark.
    pub async fn submit<F, Fut>(&mut self, on_added: F) -> Result<Bookmark, FormError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        self.error_message = None;

        let result = self.insert_current().await;
        self.loading = false;

        match result {
            Ok(bookmark) => {
                self.title.clear();
                self.url.clear();
                on_added().await;
                Ok(bookmark)
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn insert_current(&mut self) -> Result<Bookmark, FormError> {
        let title = self.title.trim();
        let url = self.url.trim();
        if title.is_empty() || url.is_empty() {
            return Err(FormError::Validation(MSG_REQUIRED.to_string()));
        }

        let url = normalize(url).map_err(|_| FormError::Validation(MSG_INVALID_URL.to_string()))?;
        let title = title.to_string();

        self.loading = true;

        let owner = match self.auth.current_user().await {
            Ok(Some(user)) => user.id,
            Ok(None) => return Err(FormError::Auth(MSG_NOT_AUTHENTICATED.to_string())),
            Err(e) => {
                error!(error = %e, "user lookup failed during submit");
                return Err(FormError::Auth(MSG_NOT_AUTHENTICATED.to_string()));
            }
        };

        let record = NewBookmark { title, url, owner };
        self.store.insert(record).await.map_err(|e| match e {
            StoreError::Conflict(_) => FormError::Conflict(MSG_DUPLICATE.to_string()),
            other => {
                error!(error = %other, "bookmark insert failed");
                FormError::Store
            }
        })
    }
}
