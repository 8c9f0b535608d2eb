//! LSP types and data structures.

use serde::Serialize;

/// The at-rule slot the cursor occupies on the current line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionContext {
    /// After `@`, or on a blank line
    AtRuleName,
    /// `@color |`
    ColorTarget,
    /// `@color fg |`
    ColorValue,
    /// `@font |`
    FontFamily,
    /// `@font main |` or `@fontsize |`
    FontSize,
    /// Any slot that takes a breakpoint or collection
    Breakpoint,
    /// `@space margin |`
    SpacingValue,
    /// Nothing to offer
    None,
}

/// Semantic category of a completion record; maps onto an LSP item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    AtRule,
    ColorTarget,
    Color,
    BreakpointCollection,
    Breakpoint,
    Operator,
    FontFamily,
    FontSize,
    Spacing,
}

/// Completion documentation, either plain text or markdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Documentation {
    Plain(String),
    Markdown(String),
}

/// Swatch data carried by color completions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorData {
    /// Value normalised to hex when it is a CSS named color
    pub color_value: String,
    /// Value as written in the config
    pub original_color: String,
}

/// One completion suggestion, independent of the editor protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub label: String,
    pub category: Category,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Documentation>,
    /// Zero-based emission index; hosts sort on it instead of the label
    pub sort_rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorData>,
}

impl CompletionRecord {
    pub fn new(label: impl Into<String>, category: Category, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            category,
            detail: detail.into(),
            documentation: None,
            sort_rank: 0,
            color: None,
        }
    }

    pub fn with_documentation(mut self, documentation: Documentation) -> Self {
        self.documentation = Some(documentation);
        self
    }

    pub fn with_color(mut self, color: ColorData) -> Self {
        self.color = Some(color);
        self
    }
}
