//! Theme configuration for EuropaCSS projects
//!
//! Provides discovery and loading of `europa.config.js` and the typed
//! [`ThemeConfig`] model that completions and hovers read from.

pub mod collections;
pub mod loader;
pub mod schema;
pub mod script;

pub use collections::{CollectionExpr, Comparison};
pub use loader::{find_config_for_document, load_config, parse_config, ConfigError};
pub use schema::*;
