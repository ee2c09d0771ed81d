//! Contract for the hosted backend that owns authentication, persistence and
//! change delivery.
//!
//! Controllers receive these capabilities as injected `Arc<dyn …>` handles, so
//! any implementation (the bundled SQLite one, a hosted service client, or a
//! test double) can sit behind them.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::bookmark::{Bookmark, BookmarkFilter, NewBookmark, SortOrder};
use crate::types::change::ChangeEvent;
use crate::types::errors::{AuthError, StoreError};
use crate::types::session::{OAuthProvider, SignInRedirect, User};

/// Sign-in, sign-out and current-user lookup for one client session.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Starts an OAuth sign-in. The provider redirects back to `redirect_to`.
    async fn sign_in(&self, provider: OAuthProvider, redirect_to: &str) -> Result<SignInRedirect, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    async fn current_user(&self) -> Result<Option<User>, AuthError>;
}

/// CRUD and change subscription over the bookmarks collection.
///
/// Implementations enforce owner scoping: a caller only ever sees or touches
/// rows owned by its signed-in user.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn query(&self, filter: &BookmarkFilter, order: SortOrder) -> Result<Vec<Bookmark>, StoreError>;
    /// Fails with `StoreError::Conflict` if `(owner, url)` is already stored.
    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
    async fn subscribe(&self, filter: &BookmarkFilter) -> Result<Subscription, StoreError>;
}

type CloseHook = Box<dyn FnOnce() + Send>;

/// An open change subscription.
///
/// The release hook runs exactly once: on [`Subscription::close`], or on drop
/// if the subscription was never closed explicitly.
pub struct Subscription {
    id: u64,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    on_close: Option<CloseHook>,
}

impl Subscription {
    pub fn new<F>(id: u64, events: mpsc::UnboundedReceiver<ChangeEvent>, on_close: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            events,
            on_close: Some(Box::new(on_close)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next change. Returns `None` once the feed side is gone.
    pub async fn next_change(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Returns a change that is already queued, without waiting.
    pub fn try_next_change(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }

    /// Adds `hook` to run after the existing release hook.
    pub fn also_on_close<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let previous = self.on_close.take();
        self.on_close = Some(Box::new(move || {
            if let Some(previous) = previous {
                previous();
            }
            hook();
        }));
        self
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(hook) = self.on_close.take() {
            self.events.close();
            hook();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("open", &self.on_close.is_some())
            .finish()
    }
}
