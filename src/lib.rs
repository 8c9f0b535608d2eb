//! EuropaCSS IntelliSense - language server for EuropaCSS themes
//!
//! This library provides functionality to:
//! - Load `europa.config.js` theme configs into a typed model
//! - Offer completions and hovers for `@color`, `@font`, `@space`, `@responsive` and friends
//! - Resolve theme colors for editor swatches through the color bridge

pub mod bridge;
pub mod cli;
pub mod color;
pub mod config;
pub mod logging;
pub mod lsp;
pub mod named_colors;
