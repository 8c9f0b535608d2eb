//! Language Server Protocol implementation for EuropaCSS
//!
//! Provides completions, hovers and color swatches for EuropaCSS at-rules in
//! PostCSS stylesheets:
//! - At-rules: `@color`, `@space`, `@font`, `@fontsize`, `@responsive`, `@column`, ...
//! - Theme values: colors, breakpoints and collections, font families and sizes, spacing
//! - Color resolution for editor decorations through `europacss/*` notifications

mod completions;
mod context;
mod hover;
pub mod notifications;
mod server;
pub mod text;
mod types;

// Re-export public items
pub use completions::{completions_for, resolve_completion_item, to_completion_item};
pub use context::{classify, COLOR_TARGETS};
pub use hover::{get_hover, word_at, word_span};
pub use server::{run_server, EuropaLanguageServer};
pub use types::{Category, ColorData, CompletionContext, CompletionRecord, Documentation};
