//! Hover information for theme tokens.

use super::completions::{css_font_name, size_table};
use super::text::utf16_to_byte;
use crate::config::{CollectionExpr, FontFamily, FontSize, ThemeConfig};
use crate::named_colors::get_hex_color;
use std::ops::Range;

const PREVIEW_TEXT: &str = "The quick brown fox jumps over the lazy dog.";

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, ';' | '{' | '}' | '(' | ')')
}

/// Byte range of the word under a UTF-16 column.
///
/// Words are delimited by whitespace and `;{}()`, so `$tablet`, `body.foreground`
/// and `>=mobile` each count as one word.
pub fn word_span(line: &str, character: u32) -> Option<Range<usize>> {
    let cursor = utf16_to_byte(line, character);

    let start = line[..cursor]
        .char_indices()
        .rev()
        .find(|&(_, c)| is_boundary(c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let end = line[cursor..].find(is_boundary).map_or(line.len(), |i| cursor + i);

    (start < end).then_some(start..end)
}

/// The word under a UTF-16 column
pub fn word_at(line: &str, character: u32) -> Option<&str> {
    word_span(line, character).map(|span| &line[span])
}

/// Get hover markdown for a token.
///
/// Categories are tried in order: breakpoint collection, breakpoint, font family
/// and font size (on `@font`/`@fontsize` lines), then color (on `@color` lines).
pub fn get_hover(token: &str, line: &str, theme: &ThemeConfig) -> Option<String> {
    if token.starts_with('$') {
        if let Some(expr) = theme.breakpoint_collections.get(token) {
            return Some(collection_hover(token, expr.as_str(), theme));
        }
    }

    if let Some(value) = theme.breakpoint(token) {
        return Some(breakpoint_hover(token, value));
    }

    // `@fontsize` contains `@font`
    let font_line = line.contains("@font");

    if font_line {
        if let Some(family) = theme.typography.families.get(token) {
            return Some(font_family_hover(token, family));
        }
        if let Some(size) = theme.typography.sizes.get(token) {
            return Some(font_size_hover(token, size));
        }
    }

    if line.contains("@color") {
        let colors = theme.colors()?;
        if let Some(value) = colors.lookup(token) {
            return Some(color_hover(token, value));
        }
    }

    None
}

fn collection_hover(name: &str, expr: &str, theme: &ThemeConfig) -> String {
    format!(
        "### Breakpoint Collection: {}\n\n**Value:** `{}`\n\n**Definition:**\n\n{}",
        name,
        expr,
        CollectionExpr::parse(expr).describe(&theme.breakpoints)
    )
}

fn breakpoint_hover(name: &str, value: &str) -> String {
    format!(
        "### Breakpoint: {}\n\n**Value:** `{}`\n\n**Media Query Equivalent:**\n\n```css\n@media (min-width: {}) {{\n  /* styles */\n}}\n```\n\n",
        name, value, value
    )
}

fn font_family_hover(name: &str, family: &FontFamily) -> String {
    let mut content = format!(
        "### Font Family: {}\n\n```css\nfont-family: {};\n```\n\n#### Preview:\n",
        name,
        family.css_value()
    );
    for font in family.fonts() {
        let font = css_font_name(font);
        content.push_str(&format!(
            "<div style=\"font-family: {0}; margin-bottom: 10px;\">{0}: {1}</div>",
            font, PREVIEW_TEXT
        ));
    }
    content
}

fn font_size_hover(name: &str, size: &FontSize) -> String {
    let mut content = format!("### Font Size: {}\n\n", name);
    match size {
        FontSize::Fixed(value) => {
            content.push_str(&format!("```css\nfont-size: {};\n```\n\n#### Preview:\n", value));
            content.push_str(&format!("<div style=\"font-size: {0};\">Text at {0}</div>", value));
        }
        FontSize::Responsive(per_breakpoint) => {
            content.push_str("Responsive font sizes across breakpoints:\n\n");
            content.push_str(&size_table(per_breakpoint.iter()));
            content.push_str("\n\n#### Preview:\n");
            for (breakpoint, value) in per_breakpoint {
                content.push_str(&format!(
                    "<div style=\"font-size: {}; margin-bottom: 8px;\">{}: Text at {}</div>",
                    value.preview_size().unwrap_or_default(),
                    breakpoint,
                    value
                ));
            }
        }
    }
    content
}

fn color_hover(name: &str, value: &str) -> String {
    let mut content = format!("### Color: {}\n\n**Value:** `{}`\n", name, value);
    let hex = get_hex_color(value);
    if hex != value {
        content.push_str(&format!("\n**Hex:** `{}`\n", hex));
    }
    content
}
