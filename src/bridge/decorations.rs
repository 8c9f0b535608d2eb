//! Finding color mentions in stylesheet text.

use crate::lsp::text::offset_to_position;
use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::sync::OnceLock;
use tower_lsp::lsp_types;
use tracing::error;

const COLOR_USAGE: &str = r"@color\s+(fg|bg|fill|stroke|border|border-[a-z-]+)\s+([a-zA-Z0-9._-]+)";
const HEX_LITERAL: &str = r"#([0-9a-fA-F]{3,8})\b";

fn compiled(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(source) {
        Ok(re) => Some(re),
        Err(e) => {
            error!(pattern = source, error = %e, "invalid color pattern");
            None
        }
    })
    .as_ref()
}

fn color_usage() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, COLOR_USAGE)
}

fn hex_literal() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, HEX_LITERAL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    /// The value slot of `@color <target> <name>`
    Theme,
    /// A `#rgb`-style literal anywhere in the text
    Hex,
}

/// A color reference and its byte span in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMention<'a> {
    pub kind: MentionKind,
    pub name: &'a str,
    pub span: Range<usize>,
}

/// Every color mention in `text`: `@color` values first, then hex literals.
///
/// `@color fg #fff` yields only the hex mention because theme names never
/// start with `#`.
pub fn scan(text: &str) -> Vec<ColorMention<'_>> {
    let mut mentions = Vec::new();

    if let Some(re) = color_usage() {
        for caps in re.captures_iter(text) {
            if let Some(name) = caps.get(2) {
                mentions.push(ColorMention {
                    kind: MentionKind::Theme,
                    name: name.as_str(),
                    span: name.range(),
                });
            }
        }
    }

    if let Some(re) = hex_literal() {
        for m in re.find_iter(text) {
            mentions.push(ColorMention { kind: MentionKind::Hex, name: m.as_str(), span: m.range() });
        }
    }

    mentions
}

/// A swatch to draw over a mention
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoration {
    pub range: lsp_types::Range,
    /// Value handed to the editor as the swatch background
    pub color: String,
}

impl Decoration {
    pub fn new(text: &str, mention: &ColorMention<'_>, color: impl Into<String>) -> Self {
        Self {
            range: lsp_types::Range::new(
                offset_to_position(text, mention.span.start),
                offset_to_position(text, mention.span.end),
            ),
            color: color.into(),
        }
    }
}
