//! RPC method handler for the Linkshelf JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches a method call to the `App` controllers and turns
//! every failure into an error string; nothing here panics on bad input.

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::app::App;
use crate::managers::session_gate;
use crate::types::session::{Navigation, OAuthProvider};

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

fn navigation_json(navigation: &Navigation) -> Value {
    json!({"navigate": navigation.path(), "view": navigation})
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with a user-presentable message.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    debug!(method, "rpc call");
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Auth ───
        "auth.sign_in" => {
            let a = app.lock().await;
            let provider = match params.get("provider").and_then(|v| v.as_str()) {
                Some(name) => name.parse::<OAuthProvider>()?,
                None => a.config.default_provider,
            };
            let redirect = session_gate::start_sign_in(a.client.as_ref(), provider, &a.config.redirect_origin)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({
                "provider": redirect.provider,
                "authorize_url": redirect.authorize_url,
                "state": redirect.state,
            }))
        }
        "auth.callback" => {
            let state = str_param(params, "state")?;
            let email = str_param(params, "email")?;
            let a = app.lock().await;
            let user = a
                .client
                .complete_sign_in(state, email)
                .await
                .map_err(|e| e.to_string())?;
            let home = Navigation::Home(a.config.home_path.clone());
            Ok(json!({"user": user, "navigate": home.path()}))
        }
        "auth.sign_out" => {
            let mut a = app.lock().await;
            let navigation = a.sign_out().await;
            Ok(navigation_json(&navigation))
        }
        "auth.user" => {
            use crate::services::backend::AuthProvider;
            let a = app.lock().await;
            let user = a.client.current_user().await.map_err(|e| e.to_string())?;
            Ok(json!({"user": user}))
        }

        // ─── Views ───
        "view.home.open" => {
            let mut a = app.lock().await;
            let navigation = a.open_home().await;
            let mut response = navigation_json(&navigation);
            if matches!(navigation, Navigation::Home(_)) {
                response["snapshot"] = json!(a.list.snapshot());
            }
            Ok(response)
        }
        "view.home.close" => {
            let mut a = app.lock().await;
            a.close_home().await;
            Ok(json!({"ok": true}))
        }

        // ─── Bookmarks ───
        "bookmark.list" => {
            let a = app.lock().await;
            Ok(json!(a.list.snapshot()))
        }
        "bookmark.add" => {
            let title = str_param(params, "title")?;
            let url = str_param(params, "url")?;
            let mut a = app.lock().await;
            let bookmark = a.add_bookmark(title, url).await.map_err(|e| e.to_string())?;
            Ok(json!(bookmark))
        }
        "bookmark.delete.request" => {
            let id = str_param(params, "id")?;
            let a = app.lock().await;
            Ok(json!(a.list.request_delete(id)))
        }
        "bookmark.delete.confirm" => {
            let id = str_param(params, "id")?;
            let a = app.lock().await;
            // Failures are logged by the list; the view simply keeps its rows.
            let deleted = a.list.confirm_delete(id).await.unwrap_or(false);
            Ok(json!({"deleted": deleted}))
        }
        "bookmark.delete.cancel" => {
            let a = app.lock().await;
            a.list.cancel_delete();
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
