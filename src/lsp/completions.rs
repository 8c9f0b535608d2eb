//! Completion providers for EuropaCSS at-rules.
//!
//! Each provider turns one slice of the theme into an ordered list of
//! [`CompletionRecord`]s. Declaration order is display order: records carry a
//! sequential `sort_rank` that becomes the LSP `sortText`.

use super::context::COLOR_TARGETS;
use super::types::{Category, ColorData, CompletionContext, CompletionRecord, Documentation};
use crate::config::{FontSize, SpacingValue, ThemeConfig};
use crate::named_colors::get_hex_color;
use serde_json::{json, Map, Value};
use tower_lsp::lsp_types::{
    Command, CompletionItem, CompletionItemKind, Documentation as LspDocumentation, MarkupContent,
    MarkupKind,
};

const PREVIEW_TEXT: &str = "The quick brown fox jumps over the lazy dog.";

/// Assign `sort_rank` in emission order
fn ranked(mut records: Vec<CompletionRecord>) -> Vec<CompletionRecord> {
    for (rank, record) in records.iter_mut().enumerate() {
        record.sort_rank = rank;
    }
    records
}

/// Helper to create an at-rule record
fn make_at_rule(label: &str, detail: &str, usage: &str) -> CompletionRecord {
    CompletionRecord::new(label, Category::AtRule, detail)
        .with_documentation(Documentation::Plain(usage.to_string()))
}

/// Get the fixed at-rule catalog
pub fn get_at_rule_completions() -> Vec<CompletionRecord> {
    ranked(vec![
        make_at_rule("@color", "EuropaCSS color at-rule", "@color fg|bg|fill|stroke|border [color]"),
        make_at_rule("@space", "EuropaCSS spacing at-rule", "@space [property] [size] [breakpoint]"),
        make_at_rule("@font", "EuropaCSS font at-rule", "@font [family] [size] [breakpoint]"),
        make_at_rule("@fontsize", "EuropaCSS font size at-rule", "@fontsize [size] [breakpoint]"),
        make_at_rule(
            "@responsive",
            "EuropaCSS responsive at-rule",
            "@responsive [breakpoint] { ... }",
        ),
        make_at_rule("@grid", "EuropaCSS grid at-rule", "@grid"),
        make_at_rule("@column", "EuropaCSS column at-rule", "@column [span]"),
        make_at_rule("@display", "EuropaCSS display at-rule", "@display [value]"),
        make_at_rule("@abs100", "EuropaCSS absolute positioning at-rule", "@abs100"),
        make_at_rule("@if", "EuropaCSS conditional at-rule", "@if [condition]"),
        make_at_rule("@iterate", "EuropaCSS iteration at-rule", "@iterate [values]"),
        make_at_rule("@unpack", "EuropaCSS unpacking at-rule", "@unpack [properties]"),
    ])
}

/// Get completions for the first `@color` parameter
pub fn get_color_target_completions() -> Vec<CompletionRecord> {
    let records = COLOR_TARGETS
        .iter()
        .map(|&target| {
            let detail = match target {
                "fg" => "Foreground (text) color",
                "bg" => "Background color",
                "fill" => "SVG fill color",
                "stroke" => "SVG stroke color",
                "border" => "Border color",
                "border-top" => "Top border color",
                "border-bottom" => "Bottom border color",
                "border-left" => "Left border color",
                _ => "Right border color",
            };
            CompletionRecord::new(target, Category::ColorTarget, detail)
        })
        .collect();
    ranked(records)
}

fn make_color(label: String, value: &str) -> CompletionRecord {
    let hex = get_hex_color(value);
    CompletionRecord::new(label, Category::Color, format!("Color: {}", value))
        .with_documentation(Documentation::Plain(hex.clone()))
        .with_color(ColorData { color_value: hex, original_color: value.to_string() })
}

/// Get theme color completions: flat colors first, then `group.name` members
pub fn get_color_completions(theme: &ThemeConfig) -> Vec<CompletionRecord> {
    let Some(colors) = theme.colors() else {
        return Vec::new();
    };

    let flat = colors.flat().map(|(name, value)| make_color(name.to_string(), value));
    let nested = colors.nested().map(|(name, value)| make_color(name, value));
    ranked(flat.chain(nested).collect())
}

/// Get breakpoint completions: collections, breakpoints, then comparison operators
pub fn get_breakpoint_completions(theme: &ThemeConfig) -> Vec<CompletionRecord> {
    let mut records = Vec::new();

    for (name, expr) in &theme.breakpoint_collections {
        records.push(
            CompletionRecord::new(name.as_str(), Category::BreakpointCollection, expr.as_str())
                .with_documentation(Documentation::Plain(format!("Includes: {}", expr))),
        );
    }

    for (name, value) in &theme.breakpoints {
        records.push(CompletionRecord::new(
            name.as_str(),
            Category::Breakpoint,
            format!("Breakpoint: {}", value),
        ));
    }

    records.push(CompletionRecord::new(
        ">=",
        Category::Operator,
        "Greater than or equal to breakpoint",
    ));
    records.push(CompletionRecord::new("<=", Category::Operator, "Less than or equal to breakpoint"));
    records.push(CompletionRecord::new(">", Category::Operator, "Greater than breakpoint"));
    records.push(CompletionRecord::new("<", Category::Operator, "Less than breakpoint"));

    ranked(records)
}

/// Quote a font name containing spaces unless it is already quoted
pub fn css_font_name(font: &str) -> String {
    if font.contains(' ') && !font.contains('"') && !font.contains('\'') {
        format!("\"{}\"", font)
    } else {
        font.to_string()
    }
}

/// Get font family completions with a rendered preview of the fallback stack
pub fn get_font_family_completions(theme: &ThemeConfig) -> Vec<CompletionRecord> {
    let records = theme
        .typography
        .families
        .iter()
        .map(|(name, family)| {
            let css = family.css_value();
            let previews: Vec<String> = family
                .fonts()
                .into_iter()
                .map(|font| {
                    format!(
                        "<span style=\"font-family: {};\">{}</span>",
                        css_font_name(font),
                        PREVIEW_TEXT
                    )
                })
                .collect();
            let docs = format!(
                "### {}\n\n```css\nfont-family: {};\n```\n\n#### Preview:\n{}",
                name,
                css,
                previews.join("\n\n")
            );

            CompletionRecord::new(name.as_str(), Category::FontFamily, format!("Font family: {}", css))
                .with_documentation(Documentation::Markdown(docs))
        })
        .collect();
    ranked(records)
}

/// Get font size completions; responsive sizes render a breakpoint table
pub fn get_font_size_completions(theme: &ThemeConfig) -> Vec<CompletionRecord> {
    let records = theme
        .typography
        .sizes
        .iter()
        .map(|(name, size)| {
            let mut docs = format!("### Font Size: {}\n\n", name);
            let detail = match size {
                FontSize::Fixed(value) => {
                    docs.push_str(&format!("```css\nfont-size: {};\n```\n\n", value));
                    docs.push_str("#### Preview:\n");
                    docs.push_str(&format!(
                        "<span style=\"font-size: {0}\">Example text at {0}</span>",
                        value
                    ));
                    format!("Font size: {}", value)
                }
                FontSize::Responsive(per_breakpoint) => {
                    docs.push_str("Responsive font sizes across breakpoints:\n\n");
                    docs.push_str(&size_table(per_breakpoint.iter()));
                    docs.push_str("\n\n#### Preview:\n");
                    if let Some((_, first)) = per_breakpoint.first() {
                        let preview = first.preview_size().unwrap_or_default();
                        docs.push_str(&format!(
                            "<span style=\"font-size: {}\">Example text at {}</span>",
                            preview, first
                        ));
                    }
                    let summary: Vec<String> = per_breakpoint
                        .iter()
                        .map(|(breakpoint, value)| format!("{}: {}", breakpoint, value))
                        .collect();
                    format!("Responsive font size: {}", summary.join(", "))
                }
            };

            CompletionRecord::new(name.as_str(), Category::FontSize, detail)
                .with_documentation(Documentation::Markdown(docs))
        })
        .collect();
    ranked(records)
}

/// Markdown `| Breakpoint | Size |` table, one row per entry in order
pub fn size_table<'a, V: std::fmt::Display + 'a>(
    rows: impl Iterator<Item = (&'a String, &'a V)>,
) -> String {
    let mut table = String::from("| Breakpoint | Size |\n| --- | --- |\n");
    for (breakpoint, value) in rows {
        table.push_str(&format!("| {} | {} |\n", breakpoint, value));
    }
    table
}

/// Get spacing completions; every key gets a record whatever its value shape
pub fn get_spacing_completions(theme: &ThemeConfig) -> Vec<CompletionRecord> {
    let records = theme
        .spacing
        .iter()
        .map(|(name, value)| {
            let shown = match value {
                SpacingValue::Length(length) => length.to_string(),
                SpacingValue::Nested(_) => "[Object]".to_string(),
            };
            CompletionRecord::new(name.as_str(), Category::Spacing, format!("Spacing: {}", shown))
        })
        .collect();
    ranked(records)
}

/// Dispatch a classified context to its provider
pub fn completions_for(context: CompletionContext, theme: &ThemeConfig) -> Vec<CompletionRecord> {
    match context {
        CompletionContext::AtRuleName => get_at_rule_completions(),
        CompletionContext::ColorTarget => get_color_target_completions(),
        CompletionContext::ColorValue => get_color_completions(theme),
        CompletionContext::FontFamily => get_font_family_completions(theme),
        CompletionContext::FontSize => get_font_size_completions(theme),
        CompletionContext::Breakpoint => get_breakpoint_completions(theme),
        CompletionContext::SpacingValue => get_spacing_completions(theme),
        CompletionContext::None => Vec::new(),
    }
}

fn item_kind(category: Category) -> CompletionItemKind {
    match category {
        Category::AtRule => CompletionItemKind::SNIPPET,
        Category::Color => CompletionItemKind::COLOR,
        Category::Operator => CompletionItemKind::OPERATOR,
        _ => CompletionItemKind::VALUE,
    }
}

fn swatch_data(color_value: &str, original_color: &str) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("color".to_string(), json!(color_value));
    data.insert("type".to_string(), json!("color"));
    data.insert("colorValue".to_string(), json!(color_value));
    data.insert("originalColor".to_string(), json!(original_color));
    data
}

/// Convert a record into an LSP completion item
pub fn to_completion_item(record: CompletionRecord) -> CompletionItem {
    let documentation = record.documentation.map(|docs| match docs {
        Documentation::Plain(text) => LspDocumentation::String(text),
        Documentation::Markdown(value) => {
            LspDocumentation::MarkupContent(MarkupContent { kind: MarkupKind::Markdown, value })
        }
    });

    // Open the parameter list right after an at-rule is inserted
    let command = (record.category == Category::AtRule).then(|| Command {
        title: "Suggest".to_string(),
        command: "editor.action.triggerSuggest".to_string(),
        arguments: None,
    });

    let data = record
        .color
        .map(|color| Value::Object(swatch_data(&color.color_value, &color.original_color)));

    CompletionItem {
        insert_text: (record.category == Category::AtRule).then(|| record.label.clone()),
        label: record.label,
        kind: Some(item_kind(record.category)),
        detail: Some(record.detail),
        documentation,
        sort_text: Some(format!("{:05}", record.sort_rank)),
        command,
        data,
        ..Default::default()
    }
}

/// Enrich a color completion item with its normalised swatch value.
///
/// Items that are not colors are returned unchanged.
pub fn resolve_completion_item(mut item: CompletionItem) -> CompletionItem {
    if item.kind != Some(CompletionItemKind::COLOR) {
        return item;
    }

    let data = match &item.data {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    let data_str = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);

    let mut color_value = data_str("colorValue").or_else(|| data_str("color"));
    let mut original = data_str("originalColor");

    if color_value.is_none() {
        let from_detail = item
            .detail
            .as_deref()
            .and_then(|detail| detail.strip_prefix("Color: "))
            .map(str::to_string);
        if let Some(value) = from_detail {
            original = Some(value.clone());
            color_value = Some(value);
        }
    }

    let Some(color_value) = color_value else {
        return item;
    };
    let original = original.unwrap_or_else(|| color_value.clone());

    item.documentation = Some(LspDocumentation::String(color_value.clone()));

    let mut merged = data;
    merged.extend(swatch_data(&color_value, &original));
    item.data = Some(Value::Object(merged));

    if original != color_value && original != "transparent" && color_value != "transparent" {
        item.detail = Some(format!("Color: {} ({})", original, color_value));
    }

    item
}
