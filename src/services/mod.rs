// Linkshelf services
// Stateless or shared components: URL normalization, configuration, and the
// backend contract with its local SQLite implementation.

pub mod backend;
pub mod change_feed;
pub mod local_backend;
pub mod settings_engine;
pub mod url_normalizer;
