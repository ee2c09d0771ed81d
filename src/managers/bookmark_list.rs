//! Bookmark list view controller.
//!
//! Owns the on-screen copy of the user's bookmarks. The copy is a cache of the
//! last successful fetch and is always replaced wholesale: after mount, after
//! a delete, after an insert (through the form's callback), and after every
//! change notification from the store. Notifications are never applied as
//! deltas.
//!
//! State is published through a `tokio::sync::watch` channel so a view can
//! re-render whenever a [`ListSnapshot`] changes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::services::backend::{AuthProvider, BookmarkStore, Subscription};
use crate::types::bookmark::{Bookmark, BookmarkFilter, SortOrder};
use crate::types::errors::StoreError;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this bookmark?";

/// What the list view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListSnapshot {
    pub bookmarks: Vec<Bookmark>,
    pub loading: bool,
    /// Bookmark awaiting delete confirmation.
    pub pending_delete: Option<String>,
    /// Bumped on every state change.
    pub revision: u64,
}

/// First step of a delete: the prompt the view shows before the user confirms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteConfirmation {
    pub id: String,
    pub title: Option<String>,
    pub prompt: String,
}

/// State shared between the controller and its change-feed listener task.
struct ListShared {
    store: Arc<dyn BookmarkStore>,
    /// Incremented on every mount; a refresh only applies within the mount it started in.
    epoch: AtomicU64,
    mounted: AtomicBool,
    snapshot: watch::Sender<ListSnapshot>,
}

impl ListShared {
    fn is_live(&self, epoch: u64) -> bool {
        self.mounted.load(Ordering::SeqCst) && self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn update(&self, f: impl FnOnce(&mut ListSnapshot)) {
        self.snapshot.send_modify(|snapshot| {
            f(snapshot);
            snapshot.revision += 1;
        });
    }

    /// Re-fetches the full list. A failed fetch keeps the previous list.
    async fn refresh(&self) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        if !self.is_live(epoch) {
            debug!("refresh skipped, list is not mounted");
            return;
        }

        self.update(|s| s.loading = true);
        let result = self
            .store
            .query(&BookmarkFilter::default(), SortOrder::NewestFirst)
            .await;

        if !self.is_live(epoch) {
            debug!("discarding refresh result from a torn-down mount");
            return;
        }

        match result {
            Ok(bookmarks) => {
                debug!(count = bookmarks.len(), "bookmarks refreshed");
                self.update(|s| {
                    s.bookmarks = bookmarks;
                    s.loading = false;
                });
            }
            Err(e) => {
                error!(error = %e, "failed to fetch bookmarks");
                self.update(|s| s.loading = false);
            }
        }
    }
}

/// Background task turning change notifications into refreshes.
struct FeedListener {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl FeedListener {
    fn spawn(shared: Arc<ListShared>, mut subscription: Subscription) -> Self {
        let (stop, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    change = subscription.next_change() => {
                        let Some(change) = change else { break };
                        debug!(kind = ?change.kind, id = %change.bookmark_id, "change notification");
                        tokio::select! {
                            biased;
                            _ = &mut stop_rx => break,
                            _ = shared.refresh() => {}
                        }
                    }
                }
            }
            subscription.close();
        });

        Self { stop, task }
    }

    /// Stops the listener and waits until its subscription is closed.
    async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            if e.is_panic() {
                error!(error = %e, "change listener panicked");
            }
        }
    }
}

/// Controller for the main list view.
pub struct BookmarkList {
    shared: Arc<ListShared>,
    auth: Arc<dyn AuthProvider>,
    feed: Option<FeedListener>,
}

impl BookmarkList {
    pub fn new(store: Arc<dyn BookmarkStore>, auth: Arc<dyn AuthProvider>) -> Self {
        let (snapshot, _) = watch::channel(ListSnapshot::default());
        Self {
            shared: Arc::new(ListShared {
                store,
                epoch: AtomicU64::new(0),
                mounted: AtomicBool::new(false),
                snapshot,
            }),
            auth,
            feed: None,
        }
    }

    /// Receiver that observes every snapshot change.
    pub fn watch(&self) -> watch::Receiver<ListSnapshot> {
        self.shared.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.shared.snapshot.borrow().bookmarks.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.snapshot.borrow().loading
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::SeqCst)
    }

    /// Whether a change subscription is currently open.
    pub fn is_subscribed(&self) -> bool {
        self.feed.is_some()
    }

    /// Initial fetch, then a change subscription scoped to the signed-in user.
    ///
    /// Without a user the list stays as fetched and no subscription is opened.
    /// Mounting an already-mounted list does nothing.
    pub async fn mount(&mut self) {
        if self.is_mounted() {
            warn!("bookmark list is already mounted");
            return;
        }
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.mounted.store(true, Ordering::SeqCst);

        self.shared.refresh().await;

        let user = match self.auth.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("no signed-in user, not subscribing to changes");
                return;
            }
            Err(e) => {
                warn!(error = %e, "user lookup failed, not subscribing to changes");
                return;
            }
        };

        match self
            .shared
            .store
            .subscribe(&BookmarkFilter::owned_by(&user.id))
            .await
        {
            Ok(subscription) => {
                debug!(subscription = subscription.id(), user = %user.id, "watching bookmark changes");
                self.feed = Some(FeedListener::spawn(Arc::clone(&self.shared), subscription));
            }
            Err(e) => error!(error = %e, "failed to subscribe to bookmark changes"),
        }
    }

    /// Closes the change subscription (if one was opened) and stops any
    /// in-flight refresh from touching state.
    pub async fn unmount(&mut self) {
        self.shared.mounted.store(false, Ordering::SeqCst);
        if let Some(feed) = self.feed.take() {
            feed.stop().await;
        }
    }

    pub async fn refresh(&self) {
        self.shared.refresh().await;
    }

    /// Deletes `id` in the store, then refreshes. The row disappears only once
    /// the refresh lands. Failures are logged and leave the list unchanged.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        match self.shared.store.delete(id).await {
            Ok(()) => {
                self.shared.refresh().await;
                Ok(())
            }
            Err(e) => {
                error!(id, error = %e, "failed to delete bookmark");
                Err(e)
            }
        }
    }

    /// Marks `id` as awaiting confirmation and returns the prompt to show.
    pub fn request_delete(&self, id: &str) -> DeleteConfirmation {
        let title = self
            .shared
            .snapshot
            .borrow()
            .bookmarks
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.title.clone());

        self.shared
            .update(|s| s.pending_delete = Some(id.to_string()));

        DeleteConfirmation {
            id: id.to_string(),
            title,
            prompt: DELETE_PROMPT.to_string(),
        }
    }

    /// Confirms the pending delete. Returns `Ok(false)` without deleting when
    /// `id` is not the bookmark awaiting confirmation.
    pub async fn confirm_delete(&self, id: &str) -> Result<bool, StoreError> {
        let pending = self.shared.snapshot.borrow().pending_delete.clone();
        if pending.as_deref() != Some(id) {
            return Ok(false);
        }
        self.shared.update(|s| s.pending_delete = None);
        self.delete(id).await.map(|_| true)
    }

    pub fn cancel_delete(&self) {
        if self.shared.snapshot.borrow().pending_delete.is_some() {
            self.shared.update(|s| s.pending_delete = None);
        }
    }
}

impl Drop for BookmarkList {
    fn drop(&mut self) {
        self.shared.mounted.store(false, Ordering::SeqCst);
        // Dropping the stop sender ends the listener, which then closes its subscription.
        drop(self.feed.take());
    }
}
