//! Breakpoint collection expressions.
//!
//! A collection (`$tablet: 'ipad_portrait/ipad_landscape'`) names a set of
//! breakpoints in one of four compact forms:
//! - range `a/b`, inclusive, in breakpoint declaration order
//! - list `a,b,c`
//! - comparison `>=a`, `<=a`, `>a`, `<a`
//! - a bare breakpoint name

use indexmap::IndexMap;

use super::schema::CssValue;

/// Comparison operator of a collection expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::Less => "<",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Comparison::GreaterOrEqual => "greater than or equal to",
            Comparison::LessOrEqual => "less than or equal to",
            Comparison::Greater => "greater than",
            Comparison::Less => "less than",
        }
    }

    fn matches(self, index: usize, reference: usize) -> bool {
        match self {
            Comparison::GreaterOrEqual => index >= reference,
            Comparison::LessOrEqual => index <= reference,
            Comparison::Greater => index > reference,
            Comparison::Less => index < reference,
        }
    }
}

/// A parsed breakpoint collection expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionExpr<'a> {
    Range { from: &'a str, to: &'a str },
    List(Vec<&'a str>),
    Compare { op: Comparison, breakpoint: &'a str },
    Alias(&'a str),
}

impl<'a> CollectionExpr<'a> {
    pub fn parse(expr: &'a str) -> Self {
        let expr = expr.trim();

        if let Some((from, to)) = expr.split_once('/') {
            return CollectionExpr::Range { from: from.trim(), to: to.trim() };
        }

        if expr.contains(',') {
            return CollectionExpr::List(expr.split(',').map(str::trim).collect());
        }

        // Two-character operators must be tried before their one-character prefixes
        let operators = [
            Comparison::GreaterOrEqual,
            Comparison::LessOrEqual,
            Comparison::Greater,
            Comparison::Less,
        ];
        for op in operators {
            if let Some(breakpoint) = expr.strip_prefix(op.as_str()) {
                return CollectionExpr::Compare { op, breakpoint: breakpoint.trim() };
            }
        }

        CollectionExpr::Alias(expr)
    }

    /// Breakpoint names the expression selects, in declaration order where
    /// the form implies one.
    pub fn expand<'b>(&self, breakpoints: &'b IndexMap<String, CssValue>) -> Vec<&'b str>
    where
        'a: 'b,
    {
        match self {
            CollectionExpr::Range { from, to } => expand_range(breakpoints, from, to),
            CollectionExpr::List(members) => members.clone(),
            CollectionExpr::Compare { op, breakpoint } => match breakpoints.get_index_of(*breakpoint)
            {
                Some(reference) => breakpoints
                    .keys()
                    .enumerate()
                    .filter(|(index, _)| op.matches(*index, reference))
                    .map(|(_, name)| name.as_str())
                    .collect(),
                None => Vec::new(),
            },
            CollectionExpr::Alias(name) => {
                if breakpoints.contains_key(*name) {
                    vec![*name]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Markdown explanation used in hovers
    pub fn describe(&self, breakpoints: &IndexMap<String, CssValue>) -> String {
        match self {
            CollectionExpr::Range { from, to } => {
                let mut out = format!("Includes all breakpoints from `{}` to `{}`.", from, to);
                out.push_str("\n\n**Included breakpoints:**\n\n");
                for name in expand_range(breakpoints, from, to) {
                    out.push_str(&breakpoint_line(breakpoints, name));
                }
                out
            }
            CollectionExpr::List(members) => {
                let mut out = String::from("Includes the following breakpoints:\n\n");
                for name in members {
                    out.push_str(&breakpoint_line(breakpoints, name));
                }
                out
            }
            CollectionExpr::Compare { op, breakpoint } => {
                let mut out = format!("All breakpoints {} `{}`.", op.describe(), breakpoint);
                if let Some(value) = breakpoints.get(*breakpoint) {
                    out.push_str(&format!(
                        "\n\nReference value: `{}` = `{}`",
                        breakpoint, value
                    ));
                    let matched = self.expand(breakpoints);
                    if !matched.is_empty() {
                        let names: Vec<String> =
                            matched.iter().map(|name| format!("`{}`", name)).collect();
                        out.push_str(&format!("\n\n**Matches:** {}", names.join(", ")));
                    }
                }
                out
            }
            CollectionExpr::Alias(name) => match breakpoints.get(*name) {
                Some(value) => format!("Alias for breakpoint `{}` (`{}`).", name, value),
                None => format!("Alias for `{}` (unknown breakpoint).", name),
            },
        }
    }
}

/// Breakpoints from `from` through `to`, both inclusive, in declaration order.
///
/// An unknown `from` selects nothing; an unknown `to` runs to the last breakpoint.
pub fn expand_range<'a>(
    breakpoints: &'a IndexMap<String, CssValue>,
    from: &str,
    to: &str,
) -> Vec<&'a str> {
    let mut selected = Vec::new();
    let mut in_range = false;

    for name in breakpoints.keys() {
        if name == from {
            in_range = true;
        }
        if in_range {
            selected.push(name.as_str());
        }
        if name == to {
            in_range = false;
        }
    }

    selected
}

fn breakpoint_line(breakpoints: &IndexMap<String, CssValue>, name: &str) -> String {
    match breakpoints.get(name) {
        Some(value) => format!("- `{}`: `{}`\n", name, value),
        None => format!("- `{}`: (unknown value)\n", name),
    }
}
