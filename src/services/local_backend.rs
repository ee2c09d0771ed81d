//! Local backend for Linkshelf.
//!
//! Implements `AuthProvider` and `BookmarkStore` on top of SQLite via `rusqlite`,
//! with an in-process change feed. One `LocalBackend` is shared by any number of
//! `LocalClient`s; each client carries its own signed-in session, and a change
//! made through one client is delivered to subscribers of every other client.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::database::Database;
use crate::services::backend::{AuthProvider, BookmarkStore, Subscription};
use crate::services::change_feed::ChangeFeed;
use crate::types::bookmark::{Bookmark, BookmarkFilter, NewBookmark, SortOrder};
use crate::types::change::{ChangeEvent, ChangeKind};
use crate::types::errors::{AuthError, StoreError};
use crate::types::session::{OAuthProvider, SignInRedirect, User};

/// Authorization endpoint handed out in sign-in redirects.
pub const AUTHORIZE_URL: &str = "https://auth.linkshelf.local/authorize";

/// Shared state behind every local client: the database, the change feed and
/// the OAuth state tokens awaiting their callback.
pub struct LocalBackend {
    db: Mutex<Database>,
    feed: ChangeFeed,
    pending_sign_ins: Mutex<HashMap<String, OAuthProvider>>,
}

impl LocalBackend {
    /// Opens (or creates) the backend database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>, rusqlite::Error> {
        Ok(Self::with_database(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Arc<Self>, rusqlite::Error> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    fn with_database(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db: Mutex::new(db),
            feed: ChangeFeed::new(),
            pending_sign_ins: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a new client session with nobody signed in.
    pub fn client(self: &Arc<Self>) -> LocalClient {
        LocalClient {
            backend: Arc::clone(self),
            session: Mutex::new(None),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn with_conn<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E> {
        let db = self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(db.connection())
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            owner: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn upsert_user(&self, provider: OAuthProvider, email: &str) -> Result<User, AuthError> {
        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM users WHERE provider = ?1 AND email = ?2",
                    params![provider.as_str(), email],
                    |row| row.get(0),
                )
                .optional()?;

            let id = match existing {
                Some(id) => id,
                None => {
                    let id = Uuid::new_v4().to_string();
                    conn.execute(
                        "INSERT INTO users (id, provider, email, created_at) VALUES (?1, ?2, ?3, ?4)",
                        params![id, provider.as_str(), email, Self::now_millis()],
                    )?;
                    id
                }
            };

            Ok(User {
                id,
                email: email.to_string(),
                provider,
            })
        })
    }
}

/// One client session against a [`LocalBackend`].
pub struct LocalClient {
    backend: Arc<LocalBackend>,
    session: Mutex<Option<User>>,
}

impl LocalClient {
    /// OAuth callback leg: exchanges a state token from [`AuthProvider::sign_in`]
    /// for a session as the user identified by `email`.
    ///
    /// State tokens are single-use.
    pub async fn complete_sign_in(&self, state: &str, email: &str) -> Result<User, AuthError> {
        let provider = self
            .backend
            .pending_sign_ins
            .lock()
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .remove(state)
            .ok_or_else(|| AuthError::UnknownSignInState(state.to_string()))?;

        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AuthError::Backend("identity provider returned no email".to_string()));
        }

        let user = self.backend.upsert_user(provider, &email)?;
        *self
            .session
            .lock()
            .map_err(|e| AuthError::Backend(e.to_string()))? = Some(user.clone());
        info!(user = %user.id, provider = %provider, "signed in");
        Ok(user)
    }

    fn session_user(&self) -> Option<User> {
        self.session.lock().ok().and_then(|s| s.clone())
    }

    fn require_user(&self) -> Result<User, StoreError> {
        self.session_user()
            .ok_or_else(|| StoreError::PermissionDenied("no signed-in user".to_string()))
    }
}

#[async_trait]
impl AuthProvider for LocalClient {
    async fn sign_in(&self, provider: OAuthProvider, redirect_to: &str) -> Result<SignInRedirect, AuthError> {
        let state = Uuid::new_v4().to_string();

        let mut authorize_url =
            Url::parse(AUTHORIZE_URL).map_err(|e| AuthError::Backend(e.to_string()))?;
        authorize_url
            .query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("state", &state);

        self.backend
            .pending_sign_ins
            .lock()
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .insert(state.clone(), provider);

        Ok(SignInRedirect {
            provider,
            authorize_url: authorize_url.to_string(),
            state,
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self
            .session
            .lock()
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .take();
        if let Some(user) = previous {
            info!(user = %user.id, "signed out");
        }
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.session_user())
    }
}

#[async_trait]
impl BookmarkStore for LocalClient {
    /// Lists the session user's bookmarks. Without a session nothing is visible.
    async fn query(&self, filter: &BookmarkFilter, order: SortOrder) -> Result<Vec<Bookmark>, StoreError> {
        let Some(user) = self.session_user() else {
            return Ok(Vec::new());
        };
        if !filter.matches_owner(&user.id) {
            return Ok(Vec::new());
        }

        let sql = match order {
            SortOrder::NewestFirst => {
                "SELECT id, title, url, user_id, created_at FROM bookmarks \
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
            }
            SortOrder::OldestFirst => {
                "SELECT id, title, url, user_id, created_at FROM bookmarks \
                 WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
            }
        };

        self.backend.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![user.id], LocalBackend::row_to_bookmark)?;
            let mut results = Vec::new();
            for row in rows {
                results.push(row?);
            }
            Ok(results)
        })
    }

    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, StoreError> {
        let user = self.require_user()?;
        if record.owner != user.id {
            return Err(StoreError::PermissionDenied(format!(
                "cannot insert bookmarks owned by {}",
                record.owner
            )));
        }

        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            title: record.title,
            url: record.url,
            owner: record.owner,
            created_at: LocalBackend::now_millis(),
        };

        self.backend.with_conn(|conn| {
            conn.execute(
                "INSERT INTO bookmarks (id, user_id, title, url, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![bookmark.id, bookmark.owner, bookmark.title, bookmark.url, bookmark.created_at],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    StoreError::Conflict(bookmark.url.clone())
                }
                other => StoreError::from(other),
            })
        })?;

        debug!(id = %bookmark.id, owner = %bookmark.owner, "bookmark inserted");
        self.backend.feed.publish(&ChangeEvent {
            kind: ChangeKind::Insert,
            bookmark_id: bookmark.id.clone(),
            owner: bookmark.owner.clone(),
        });
        Ok(bookmark)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let user = self.require_user()?;

        let affected = self.backend.with_conn(|conn| {
            conn.execute(
                "DELETE FROM bookmarks WHERE id = ?1 AND user_id = ?2",
                params![id, user.id],
            )
            .map_err(StoreError::from)
        })?;

        if affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        debug!(id, owner = %user.id, "bookmark deleted");
        self.backend.feed.publish(&ChangeEvent {
            kind: ChangeKind::Delete,
            bookmark_id: id.to_string(),
            owner: user.id,
        });
        Ok(())
    }

    async fn subscribe(&self, filter: &BookmarkFilter) -> Result<Subscription, StoreError> {
        let user = self.require_user()?;
        if !filter.matches_owner(&user.id) {
            return Err(StoreError::PermissionDenied(
                "cannot watch bookmarks of another user".to_string(),
            ));
        }
        Ok(self.backend.feed.subscribe(BookmarkFilter::owned_by(&user.id)))
    }
}
