//! Test doubles shared by the controller tests.
//!
//! `InstrumentedStore` wraps a real `LocalClient` and adds failure injection,
//! a gate that holds queries open, and counters for store calls and
//! subscription closes.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use linkshelf::services::backend::{AuthProvider, BookmarkStore, Subscription};
use linkshelf::services::local_backend::{LocalBackend, LocalClient};
use linkshelf::types::bookmark::{Bookmark, BookmarkFilter, NewBookmark, SortOrder};
use linkshelf::types::errors::{AuthError, StoreError};
use linkshelf::types::session::{OAuthProvider, SignInRedirect, User};

pub struct InstrumentedStore {
    pub inner: LocalClient,
    pub fail_queries: AtomicBool,
    pub fail_inserts: AtomicBool,
    pub fail_current_user: AtomicBool,
    /// When set, each query waits for one permit before reaching the store.
    pub query_gate: Option<Arc<Semaphore>>,
    pub queries: AtomicUsize,
    pub inserts: AtomicUsize,
    pub subscribes: AtomicUsize,
    pub closes: Arc<AtomicUsize>,
}

impl InstrumentedStore {
    pub fn new(inner: LocalClient) -> Arc<Self> {
        Arc::new(Self::build(inner, None))
    }

    pub fn gated(inner: LocalClient, gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self::build(inner, Some(gate)))
    }

    fn build(inner: LocalClient, query_gate: Option<Arc<Semaphore>>) -> Self {
        Self {
            inner,
            fail_queries: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            fail_current_user: AtomicBool::new(false),
            query_gate,
            queries: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            subscribes: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for InstrumentedStore {
    async fn sign_in(&self, provider: OAuthProvider, redirect_to: &str) -> Result<SignInRedirect, AuthError> {
        self.inner.sign_in(provider, redirect_to).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.sign_out().await
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        if self.fail_current_user.load(Ordering::SeqCst) {
            return Err(AuthError::Backend("auth service unavailable".to_string()));
        }
        self.inner.current_user().await
    }
}

#[async_trait]
impl BookmarkStore for InstrumentedStore {
    async fn query(&self, filter: &BookmarkFilter, order: SortOrder) -> Result<Vec<Bookmark>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.query_gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;
            permit.forget();
        }
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Database("connection reset".to_string()));
        }
        self.inner.query(filter, order).await
    }

    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database("disk I/O error".to_string()));
        }
        self.inner.insert(record).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }

    async fn subscribe(&self, filter: &BookmarkFilter) -> Result<Subscription, StoreError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let closes = Arc::clone(&self.closes);
        Ok(self.inner.subscribe(filter).await?.also_on_close(move || {
            closes.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

/// Signs `client` in as `email` through the full OAuth round trip.
pub async fn sign_in(client: &LocalClient, email: &str) -> User {
    let redirect = client
        .sign_in(OAuthProvider::Google, "http://localhost:3000")
        .await
        .expect("sign_in should succeed");
    client
        .complete_sign_in(&redirect.state, email)
        .await
        .expect("complete_sign_in should succeed")
}

/// A fresh in-memory backend with one signed-in client.
pub async fn signed_in_client(email: &str) -> (Arc<LocalBackend>, LocalClient, User) {
    let backend = LocalBackend::open_in_memory().expect("Failed to open in-memory backend");
    let client = backend.client();
    let user = sign_in(&client, email).await;
    (backend, client, user)
}
