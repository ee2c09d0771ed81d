// Linkshelf view controllers
// Controllers hold per-view state and orchestrate calls to the injected backend:
// the session gate, the add-bookmark form, and the bookmark list.

pub mod bookmark_form;
pub mod bookmark_list;
pub mod session_gate;
