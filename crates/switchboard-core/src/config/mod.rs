//! Process-wide configuration.
//!
//! [`schema`] defines the typed settings tree; [`loader`] reads it from an
//! optional JSON file plus environment variables. The loaded [`schema::Settings`]
//! is constructed once at startup and passed by reference into the factory —
//! adapters never read ambient process state themselves.

pub mod loader;
pub mod schema;

pub use loader::load_settings;
pub use schema::Settings;
