//! Unit tests for the bookmark list view controller: mount/unmount lifecycle,
//! change-driven refresh, failure handling, and the two-step delete.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use linkshelf::managers::bookmark_form::BookmarkForm;
use linkshelf::managers::bookmark_list::{BookmarkList, DELETE_PROMPT};
use linkshelf::services::backend::BookmarkStore;
use linkshelf::services::local_backend::{LocalBackend, LocalClient};
use linkshelf::types::bookmark::NewBookmark;
use linkshelf::types::errors::StoreError;
use linkshelf::types::session::User;
use tokio::sync::Semaphore;

use support::{sign_in, signed_in_client, InstrumentedStore};

/// Polls `condition` until it holds, failing the test after two seconds.
async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Lets spawned tasks run for a moment.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

async fn add(client: &LocalClient, user: &User, title: &str, url: &str) -> String {
    client
        .insert(NewBookmark {
            title: title.to_string(),
            url: url.to_string(),
            owner: user.id.clone(),
        })
        .await
        .unwrap()
        .id
}

fn list_for(store: &Arc<InstrumentedStore>) -> BookmarkList {
    BookmarkList::new(store.clone(), store.clone())
}

/// A signed-in list plus a second client session of the same user.
async fn setup() -> (Arc<LocalBackend>, Arc<InstrumentedStore>, LocalClient, User) {
    let (backend, client, user) = signed_in_client("ada@example.com").await;
    let other = backend.client();
    sign_in(&other, "ada@example.com").await;
    (backend, InstrumentedStore::new(client), other, user)
}

// ─── Mount / unmount ───

#[tokio::test]
async fn test_mount_fetches_newest_first_and_subscribes() {
    let (_backend, store, other, user) = setup().await;
    add(&other, &user, "Old", "https://old.example/").await;
    add(&other, &user, "New", "https://new.example/").await;

    let mut list = list_for(&store);
    list.mount().await;

    let titles: Vec<String> = list.bookmarks().into_iter().map(|b| b.title).collect();
    assert_eq!(titles, ["New", "Old"]);
    assert!(!list.is_loading());
    assert!(list.is_subscribed());
    assert_eq!(store.subscribes.load(Ordering::SeqCst), 1);

    list.unmount().await;
}

#[tokio::test]
async fn test_mount_without_user_does_not_subscribe() {
    let backend = LocalBackend::open_in_memory().unwrap();
    let store = InstrumentedStore::new(backend.client());

    let mut list = list_for(&store);
    list.mount().await;

    assert!(list.bookmarks().is_empty());
    assert!(!list.is_subscribed());
    assert_eq!(store.subscribes.load(Ordering::SeqCst), 0);

    list.unmount().await;
    assert_eq!(store.close_count(), 0);
}

#[tokio::test]
async fn test_mount_twice_opens_one_subscription() {
    let (_backend, store, _other, _user) = setup().await;
    let mut list = list_for(&store);

    list.mount().await;
    list.mount().await;

    assert_eq!(store.subscribes.load(Ordering::SeqCst), 1);
    list.unmount().await;
    assert_eq!(store.close_count(), 1);
}

#[tokio::test]
async fn test_unmount_closes_subscription_exactly_once() {
    let (_backend, store, _other, _user) = setup().await;
    let mut list = list_for(&store);
    list.mount().await;

    list.unmount().await;
    list.unmount().await;

    assert_eq!(store.close_count(), 1);
    assert!(!list.is_subscribed());
}

#[tokio::test]
async fn test_no_state_updates_after_unmount() {
    let (_backend, store, other, user) = setup().await;
    let mut list = list_for(&store);
    list.mount().await;
    list.unmount().await;
    let before = list.snapshot();

    add(&other, &user, "Late", "https://late.example/").await;
    settle().await;
    list.refresh().await;

    assert_eq!(list.snapshot(), before);
}

#[tokio::test]
async fn test_unmount_cancels_in_flight_refresh() {
    let (backend, client, user) = signed_in_client("ada@example.com").await;
    let other = backend.client();
    sign_in(&other, "ada@example.com").await;
    let gate = Arc::new(Semaphore::new(1));
    let store = InstrumentedStore::gated(client, gate.clone());

    let mut list = list_for(&store);
    list.mount().await;
    assert_eq!(store.queries.load(Ordering::SeqCst), 1);

    // The change notification starts a refresh that blocks at the gate.
    add(&other, &user, "Pending", "https://pending.example/").await;
    wait_until(|| store.queries.load(Ordering::SeqCst) == 2).await;

    list.unmount().await;
    let after_unmount = list.snapshot();
    assert_eq!(store.close_count(), 1);

    gate.add_permits(10);
    settle().await;

    assert_eq!(list.snapshot(), after_unmount);
    assert!(list.bookmarks().is_empty());
}

#[tokio::test]
async fn test_remount_subscribes_again() {
    let (_backend, store, _other, _user) = setup().await;
    let mut list = list_for(&store);

    list.mount().await;
    list.unmount().await;
    list.mount().await;
    assert!(list.is_subscribed());
    list.unmount().await;

    assert_eq!(store.subscribes.load(Ordering::SeqCst), 2);
    assert_eq!(store.close_count(), 2);
}

#[tokio::test]
async fn test_dropping_mounted_list_releases_subscription() {
    let (_backend, store, _other, _user) = setup().await;
    let mut list = list_for(&store);
    list.mount().await;

    drop(list);

    wait_until(|| store.close_count() == 1).await;
}

// ─── Refresh ───

#[tokio::test]
async fn test_change_from_another_session_triggers_refresh() {
    let (_backend, store, other, user) = setup().await;
    let mut list = list_for(&store);
    list.mount().await;
    assert!(list.bookmarks().is_empty());

    add(&other, &user, "Shared", "https://shared.example/").await;
    wait_until(|| list.bookmarks().len() == 1).await;
    assert_eq!(list.bookmarks()[0].title, "Shared");

    list.unmount().await;
}

#[tokio::test]
async fn test_watchers_see_snapshot_changes() {
    let (_backend, store, other, user) = setup().await;
    let mut list = list_for(&store);
    let mut rx = list.watch();
    list.mount().await;

    add(&other, &user, "Watched", "https://watched.example/").await;

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            rx.changed().await.unwrap();
            let snapshot = rx.borrow_and_update().clone();
            if !snapshot.loading && snapshot.bookmarks.len() == 1 {
                break;
            }
        }
    })
    .await
    .expect("snapshot with the new bookmark");

    list.unmount().await;
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_list() {
    let (_backend, store, other, user) = setup().await;
    add(&other, &user, "Kept", "https://kept.example/").await;
    let mut list = list_for(&store);
    list.mount().await;
    assert_eq!(list.bookmarks().len(), 1);

    store.fail_queries.store(true, Ordering::SeqCst);
    list.refresh().await;

    assert_eq!(list.bookmarks().len(), 1);
    assert_eq!(list.bookmarks()[0].title, "Kept");
    assert!(!list.is_loading());

    list.unmount().await;
}

#[tokio::test]
async fn test_insert_through_form_shows_new_bookmark_first() {
    let (_backend, store, other, user) = setup().await;
    add(&other, &user, "Older", "https://older.example/").await;
    let mut list = list_for(&store);
    list.mount().await;

    let mut form = BookmarkForm::new(store.clone(), store.clone());
    form.set_title("Newer");
    form.set_url("https://newer.example");
    form.submit(|| list.refresh()).await.unwrap();

    let titles: Vec<String> = list.bookmarks().into_iter().map(|b| b.title).collect();
    assert_eq!(titles, ["Newer", "Older"]);

    list.unmount().await;
}

// ─── Delete ───

#[tokio::test]
async fn test_delete_removes_bookmark_after_refresh() {
    let (_backend, store, other, user) = setup().await;
    let keep = add(&other, &user, "Keep", "https://keep.example/").await;
    let gone = add(&other, &user, "Gone", "https://gone.example/").await;
    let mut list = list_for(&store);
    list.mount().await;

    list.delete(&gone).await.unwrap();

    let ids: Vec<String> = list.bookmarks().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, [keep]);

    list.unmount().await;
}

#[tokio::test]
async fn test_delete_missing_id_is_store_error_and_list_unchanged() {
    let (_backend, store, other, user) = setup().await;
    add(&other, &user, "Keep", "https://keep.example/").await;
    let mut list = list_for(&store);
    list.mount().await;
    let before = list.snapshot();

    let result = list.delete("no-such-id").await;

    assert_eq!(result, Err(StoreError::NotFound("no-such-id".to_string())));
    assert_eq!(list.snapshot(), before);

    list.unmount().await;
}

#[tokio::test]
async fn test_two_step_delete() {
    let (_backend, store, other, user) = setup().await;
    let id = add(&other, &user, "Doomed", "https://doomed.example/").await;
    let mut list = list_for(&store);
    list.mount().await;

    let confirmation = list.request_delete(&id);
    assert_eq!(confirmation.id, id);
    assert_eq!(confirmation.title.as_deref(), Some("Doomed"));
    assert_eq!(confirmation.prompt, DELETE_PROMPT);
    assert_eq!(list.snapshot().pending_delete.as_deref(), Some(id.as_str()));

    // Confirming a different id does nothing.
    assert_eq!(list.confirm_delete("other-id").await, Ok(false));
    assert_eq!(list.bookmarks().len(), 1);

    assert_eq!(list.confirm_delete(&id).await, Ok(true));
    assert!(list.bookmarks().is_empty());
    assert!(list.snapshot().pending_delete.is_none());

    list.unmount().await;
}

#[tokio::test]
async fn test_cancelled_delete_keeps_bookmark() {
    let (_backend, store, other, user) = setup().await;
    let id = add(&other, &user, "Saved", "https://saved.example/").await;
    let mut list = list_for(&store);
    list.mount().await;

    list.request_delete(&id);
    list.cancel_delete();

    assert!(list.snapshot().pending_delete.is_none());
    assert_eq!(list.confirm_delete(&id).await, Ok(false));
    assert_eq!(list.bookmarks().len(), 1);

    list.unmount().await;
}
