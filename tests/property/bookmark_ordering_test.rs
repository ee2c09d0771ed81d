//! Property-based tests for bookmark ordering.
//!
//! Whatever the mix of titles and URLs, a user's bookmarks come back newest
//! first by default and in insertion order when asked for oldest first.

use linkshelf::services::backend::{AuthProvider, BookmarkStore};
use linkshelf::services::local_backend::LocalBackend;
use linkshelf::services::url_normalizer::normalize;
use linkshelf::types::bookmark::{BookmarkFilter, NewBookmark, SortOrder};
use linkshelf::types::session::OAuthProvider;
use proptest::prelude::*;

fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,20}"
}

/// Distinct hosts, so every insert lands as a new bookmark.
fn arb_bookmarks() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::hash_set("[a-z][a-z0-9]{2,10}", 1..8).prop_flat_map(|hosts| {
        let hosts: Vec<String> = hosts.into_iter().collect();
        let len = hosts.len();
        proptest::collection::vec(arb_title(), len).prop_map(move |titles| {
            titles
                .into_iter()
                .zip(hosts.iter())
                .map(|(title, host)| (title, format!("https://{}.example/", host)))
                .collect()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_query_returns_newest_first(entries in arb_bookmarks()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        let (inserted, newest, oldest) = runtime.block_on(async {
            let backend = LocalBackend::open_in_memory().expect("Failed to open backend");
            let client = backend.client();
            let redirect = client
                .sign_in(OAuthProvider::GitHub, "http://localhost:3000")
                .await
                .expect("sign_in failed");
            let user = client
                .complete_sign_in(&redirect.state, "prop@example.com")
                .await
                .expect("complete_sign_in failed");

            let mut inserted = Vec::new();
            for (title, url) in &entries {
                let bookmark = client
                    .insert(NewBookmark {
                        title: title.clone(),
                        url: normalize(url).expect("generated URL is valid"),
                        owner: user.id.clone(),
                    })
                    .await
                    .expect("insert failed");
                inserted.push(bookmark.id);
            }

            let ids = |bookmarks: Vec<linkshelf::types::bookmark::Bookmark>| {
                bookmarks.into_iter().map(|b| b.id).collect::<Vec<_>>()
            };
            let newest = client
                .query(&BookmarkFilter::default(), SortOrder::NewestFirst)
                .await
                .expect("query failed");
            let oldest = client
                .query(&BookmarkFilter::owned_by(&user.id), SortOrder::OldestFirst)
                .await
                .expect("query failed");
            (inserted, ids(newest), ids(oldest))
        });

        let mut reversed = inserted.clone();
        reversed.reverse();
        prop_assert_eq!(newest, reversed);
        prop_assert_eq!(oldest, inserted);
    }
}
