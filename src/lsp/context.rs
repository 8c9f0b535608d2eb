//! Completion context classification.
//!
//! Works on the text of the current line up to the cursor. Rules are tried in
//! order and the first match wins; later rules extend earlier ones, so the
//! order is part of the behavior. Multi-line at-rule invocations are not
//! recognised.

use super::types::CompletionContext;
use regex::Regex;
use std::sync::OnceLock;
use tracing::error;

/// Targets accepted by `@color`
pub const COLOR_TARGETS: [&str; 9] = [
    "fg",
    "bg",
    "fill",
    "stroke",
    "border",
    "border-top",
    "border-bottom",
    "border-left",
    "border-right",
];

struct Rule {
    /// Only consulted when the trimmed line starts with `@`
    at_rule_line: bool,
    pattern: Regex,
    context: CompletionContext,
}

const RULE_SOURCES: &[(bool, &str, CompletionContext)] = &[
    (false, r"@color\s$", CompletionContext::ColorTarget),
    (
        false,
        r"@color\s+(fg|bg|fill|stroke|border|border-top|border-bottom|border-left|border-right)\s$",
        CompletionContext::ColorValue,
    ),
    (true, r"@font\s$", CompletionContext::FontFamily),
    (true, r"@font\s+[A-Za-z0-9_]+\s$", CompletionContext::FontSize),
    (true, r"@fontsize\s$", CompletionContext::FontSize),
    (true, r"@responsive\s$", CompletionContext::Breakpoint),
    (true, r"@column\s+\S+\s$", CompletionContext::Breakpoint),
    (true, r"@space\s+[A-Za-z0-9_-]+\s$", CompletionContext::SpacingValue),
    (true, r"@space\s+[A-Za-z0-9_-]+\s+[A-Za-z0-9_.-]+\s$", CompletionContext::Breakpoint),
    (true, r"@font\s+[A-Za-z0-9_]+\s+[A-Za-z0-9_]+\s$", CompletionContext::Breakpoint),
    (true, r"@fontsize\s+[A-Za-z0-9_]+\s$", CompletionContext::Breakpoint),
    (true, r"@responsive\s+.+\s$", CompletionContext::Breakpoint),
];

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        RULE_SOURCES
            .iter()
            .filter_map(|&(at_rule_line, source, context)| match Regex::new(source) {
                Ok(pattern) => Some(Rule { at_rule_line, pattern, context }),
                Err(e) => {
                    error!(pattern = source, error = %e, "invalid completion rule");
                    None
                }
            })
            .collect()
    })
}

/// Classify the slot the cursor occupies.
///
/// `line_prefix` is the current line from column 0 up to the cursor.
pub fn classify(line_prefix: &str) -> CompletionContext {
    if line_prefix.ends_with('@') {
        return CompletionContext::AtRuleName;
    }

    let at_rule_line = line_prefix.trim().starts_with('@');
    let matched = rules()
        .iter()
        .filter(|rule| at_rule_line || !rule.at_rule_line)
        .find(|rule| rule.pattern.is_match(line_prefix));
    if let Some(rule) = matched {
        return rule.context;
    }

    if line_prefix.trim().is_empty() {
        return CompletionContext::AtRuleName;
    }

    CompletionContext::None
}
