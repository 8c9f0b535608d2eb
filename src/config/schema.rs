//! Configuration schema types for `europa.config.js`
//!
//! Only the `theme` sections that drive completions and hovers are modelled.
//! Every map is an [`IndexMap`] so that declaration order survives into
//! completion ordering and breakpoint range expansion.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Failure while resolving a lazily defined theme section
#[derive(Debug, Clone, Error)]
pub enum ThemeError {
    /// The `colors: () => (...)` function could not be evaluated
    #[error("color table function failed: {0}")]
    ColorFunction(String),
}

/// The exported configuration object. Keys other than `theme` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawConfig")]
pub struct EuropaConfig {
    pub theme: ThemeConfig,
}

/// Theme section of the configuration.
///
/// Each section is converted on its own: a section with the wrong shape is
/// logged and left at its default, and the others still load.
#[derive(Debug, Clone, Default)]
pub struct ThemeConfig {
    /// Color names, color groups, or a function producing them
    pub colors: Option<ColorSource>,
    /// Breakpoint name to CSS length, in axis order
    pub breakpoints: IndexMap<String, CssValue>,
    /// `$name` to collection expression (`a/b`, `a,b`, `>=a`, `a`)
    pub breakpoint_collections: IndexMap<String, CssValue>,
    pub typography: Typography,
    pub spacing: IndexMap<String, SpacingValue>,
}

/// Config object with `theme` still untyped
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConfig {
    #[serde(default)]
    theme: Option<Value>,
}

impl RawConfig {
    /// Type every theme section, using `colors` in place of the `colors` key
    /// when the table is produced by a function.
    pub(crate) fn into_config(self, colors: Option<ColorSource>) -> EuropaConfig {
        let raw: RawTheme = section("theme", self.theme);
        let typography: RawTypography = section("typography", raw.typography);
        let theme = ThemeConfig {
            colors: colors.or_else(|| section("colors", raw.colors)),
            breakpoints: section("breakpoints", raw.breakpoints),
            breakpoint_collections: section("breakpointCollections", raw.breakpoint_collections),
            typography: Typography {
                families: section("typography.families", typography.families),
                sizes: section("typography.sizes", typography.sizes),
            },
            spacing: section("spacing", raw.spacing),
        };
        EuropaConfig { theme }
    }
}

impl From<RawConfig> for EuropaConfig {
    fn from(raw: RawConfig) -> Self {
        raw.into_config(None)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawTheme {
    colors: Option<Value>,
    breakpoints: Option<Value>,
    breakpoint_collections: Option<Value>,
    typography: Option<Value>,
    spacing: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTypography {
    families: Option<Value>,
    sizes: Option<Value>,
}

/// Convert one untyped section, falling back to the default on a shape error
fn section<T: DeserializeOwned + Default>(name: &str, value: Option<Value>) -> T {
    match value {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(section = name, error = %e, "ignoring malformed theme section");
            T::default()
        }),
    }
}

impl ThemeConfig {
    /// Resolve the color table, invoking it if it was declared as a function.
    ///
    /// Returns `None` when no colors are configured or the function failed.
    pub fn colors(&self) -> Option<Cow<'_, ColorTable>> {
        self.colors.as_ref().and_then(ColorSource::resolve)
    }

    /// Value of a breakpoint by name
    pub fn breakpoint(&self, name: &str) -> Option<&str> {
        self.breakpoints.get(name).map(CssValue::as_str)
    }
}

/// A scalar config value rendered as CSS text.
///
/// Accepts strings and numbers (`iphone: 0`, `lineHeight: 1.5`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "Scalar")]
pub struct CssValue(pub String);

impl CssValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CssValue {
    fn from(s: &str) -> Self {
        CssValue(s.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for CssValue {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => CssValue(s),
            Scalar::Integer(n) => CssValue(n.to_string()),
            Scalar::Float(n) => CssValue(n.to_string()),
            Scalar::Bool(b) => CssValue(b.to_string()),
        }
    }
}

// ============================================================================
// Colors
// ============================================================================

/// One entry of the color table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColorEntry {
    /// `black: '#000000'`
    Value(String),
    /// `body: { foreground: '#000', background: '#FFFEFB' }`
    Group(IndexMap<String, GroupMember>),
}

/// A member of a color group
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GroupMember {
    Value(String),
    /// Deeper nesting (`link.regular.text`) is not addressable as a color
    Nested(serde_json::Value),
}

/// Resolved color table in declaration order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ColorTable(pub IndexMap<String, ColorEntry>);

impl ColorTable {
    /// Top-level `name -> value` pairs, skipping groups
    pub fn flat(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().filter_map(|(name, entry)| match entry {
            ColorEntry::Value(value) => Some((name.as_str(), value.as_str())),
            ColorEntry::Group(_) => None,
        })
    }

    /// `group.name -> value` pairs for string-valued group members
    pub fn nested(&self) -> impl Iterator<Item = (String, &str)> {
        self.0.iter().flat_map(|(group, entry)| {
            let members = match entry {
                ColorEntry::Group(members) => Some(members),
                ColorEntry::Value(_) => None,
            };
            members.into_iter().flatten().filter_map(move |(name, member)| match member {
                GroupMember::Value(value) => Some((format!("{}.{}", group, name), value.as_str())),
                GroupMember::Nested(_) => None,
            })
        })
    }

    /// Every addressable color in table order, groups expanded in place
    pub fn entries(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        for (name, entry) in &self.0 {
            match entry {
                ColorEntry::Value(value) => out.push((name.clone(), value.as_str())),
                ColorEntry::Group(members) => {
                    for (member, value) in members {
                        if let GroupMember::Value(value) = value {
                            out.push((format!("{}.{}", name, member), value.as_str()));
                        }
                    }
                }
            }
        }
        out
    }

    /// Look up a color by `name` or `group.name`.
    ///
    /// Groups and deeper-nested objects are not colors.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        if let Some(ColorEntry::Value(value)) = self.0.get(name) {
            return Some(value.as_str());
        }

        let parts: Vec<&str> = name.split('.').collect();
        let [group, member] = parts.as_slice() else {
            return None;
        };
        match self.0.get(*group) {
            Some(ColorEntry::Group(members)) => match members.get(*member) {
                Some(GroupMember::Value(value)) => Some(value.as_str()),
                _ => None,
            },
            _ => None,
        }
    }
}

type ColorThunk = dyn Fn() -> Result<ColorTable, ThemeError> + Send + Sync;

/// Where the color table comes from.
///
/// A lazy source is invoked on every access; a failed invocation is remembered
/// so the function is not retried until the config is reloaded.
#[derive(Clone)]
pub enum ColorSource {
    Table(ColorTable),
    Lazy { thunk: Arc<ColorThunk>, failed: Arc<AtomicBool> },
}

impl ColorSource {
    pub fn lazy<F>(thunk: F) -> Self
    where
        F: Fn() -> Result<ColorTable, ThemeError> + Send + Sync + 'static,
    {
        ColorSource::Lazy { thunk: Arc::new(thunk), failed: Arc::new(AtomicBool::new(false)) }
    }

    pub fn resolve(&self) -> Option<Cow<'_, ColorTable>> {
        match self {
            ColorSource::Table(table) => Some(Cow::Borrowed(table)),
            ColorSource::Lazy { thunk, failed } => {
                if failed.load(Ordering::Relaxed) {
                    return None;
                }
                match thunk() {
                    Ok(table) => Some(Cow::Owned(table)),
                    Err(e) => {
                        warn!(error = %e, "treating theme colors as empty");
                        failed.store(true, Ordering::Relaxed);
                        None
                    }
                }
            }
        }
    }
}

impl fmt::Debug for ColorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSource::Table(table) => f.debug_tuple("Table").field(table).finish(),
            ColorSource::Lazy { failed, .. } => {
                f.debug_struct("Lazy").field("failed", &failed.load(Ordering::Relaxed)).finish()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ColorSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ColorTable::deserialize(deserializer).map(ColorSource::Table)
    }
}

// ============================================================================
// Typography
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Typography {
    pub families: IndexMap<String, FontFamily>,
    pub sizes: IndexMap<String, FontSize>,
}

/// A font family alias: one font or a fallback stack, preferred first
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FontFamily {
    Single(String),
    Stack(Vec<String>),
}

impl FontFamily {
    pub fn fonts(&self) -> Vec<&str> {
        match self {
            FontFamily::Single(font) => vec![font.as_str()],
            FontFamily::Stack(fonts) => fonts.iter().map(String::as_str).collect(),
        }
    }

    /// The `font-family` declaration value
    pub fn css_value(&self) -> String {
        self.fonts().join(", ")
    }
}

/// A font size alias
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FontSize {
    /// `'16px/140%'`
    Fixed(CssValue),
    /// Breakpoint name (or `*`) to size
    Responsive(IndexMap<String, SizeValue>),
}

/// The size used at one breakpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Shorthand(CssValue),
    /// `{ 'font-size': '32px', 'line-height': '120%' }`
    Properties(IndexMap<String, CssValue>),
}

impl SizeValue {
    /// The `font-size` part, for previews: `16px/140%` gives `16px`
    pub fn preview_size(&self) -> Option<&str> {
        match self {
            SizeValue::Shorthand(value) => value.as_str().split('/').next(),
            SizeValue::Properties(props) => props.get("font-size").map(CssValue::as_str),
        }
    }
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeValue::Shorthand(value) => write!(f, "{}", value),
            SizeValue::Properties(props) => {
                let rendered: Vec<String> =
                    props.iter().map(|(prop, value)| format!("{}: {}", prop, value)).collect();
                f.write_str(&rendered.join("; "))
            }
        }
    }
}

// ============================================================================
// Spacing
// ============================================================================

/// A spacing alias. Nested values are kept opaque.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SpacingValue {
    Length(CssValue),
    Nested(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> ColorTable {
        json5::from_str(src).unwrap()
    }

    #[test]
    fn test_color_table_preserves_order() {
        let colors = table("{ white: '#fff', black: '#000', dark: '#2b2b2b' }");
        let names: Vec<&str> = colors.flat().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["white", "black", "dark"]);
    }

    #[test]
    fn test_color_table_nested_labels() {
        let colors = table(
            "{ black: '#000', body: { foreground: '#000', background: '#FFFEFB' }, gray: { '900': '#858585' } }",
        );
        let nested: Vec<String> = colors.nested().map(|(name, _)| name).collect();
        assert_eq!(nested, vec!["body.foreground", "body.background", "gray.900"]);
    }

    #[test]
    fn test_lookup_flat_and_nested() {
        let colors = table("{ beige: '#0000FF', body: { foreground: '#000' } }");
        assert_eq!(colors.lookup("beige"), Some("#0000FF"));
        assert_eq!(colors.lookup("body.foreground"), Some("#000"));
        assert_eq!(colors.lookup("body"), None);
        assert_eq!(colors.lookup("body.missing"), None);
        assert_eq!(colors.lookup("a.b.c"), None);
    }

    #[test]
    fn test_object_leaf_is_not_a_color() {
        let colors = table(
            "{ link: { regular: { text: '#000000', border: '#000000' }, text: '#111111' } }",
        );
        assert_eq!(colors.lookup("link.regular"), None);
        assert_eq!(colors.lookup("link.text"), Some("#111111"));
    }

    #[test]
    fn test_entries_interleave_groups() {
        let colors = table("{ a: '#1', g: { x: '#2' }, b: '#3' }");
        let names: Vec<String> = colors.entries().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "g.x", "b"]);
    }

    #[test]
    fn test_lazy_source_invoked_per_access() {
        use std::sync::atomic::AtomicUsize;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = ColorSource::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(table("{ red: '#f00' }"))
        });

        assert!(source.resolve().is_some());
        assert!(source.resolve().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lazy_source_failure_is_remembered() {
        use std::sync::atomic::AtomicUsize;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = ColorSource::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ThemeError::ColorFunction("boom".to_string()))
        });

        assert!(source.resolve().is_none());
        assert!(source.resolve().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_css_value_accepts_numbers() {
        let breakpoints: IndexMap<String, CssValue> =
            json5::from_str("{ iphone: 0, mobile: '480px', ratio: 1.5 }").unwrap();
        assert_eq!(breakpoints["iphone"].as_str(), "0");
        assert_eq!(breakpoints["mobile"].as_str(), "480px");
        assert_eq!(breakpoints["ratio"].as_str(), "1.5");
    }

    #[test]
    fn test_font_family_forms() {
        let families: IndexMap<String, FontFamily> =
            json5::from_str("{ main: ['Deckard', 'Arial', 'sans-serif'], code: 'Menlo' }").unwrap();
        assert_eq!(families["main"].css_value(), "Deckard, Arial, sans-serif");
        assert_eq!(families["code"].fonts(), vec!["Menlo"]);
    }

    #[test]
    fn test_font_size_forms() {
        let sizes: IndexMap<String, FontSize> = json5::from_str(
            "{ small: '14px', h1: { iphone: { 'font-size': '32px', 'line-height': '120%' }, '*': '3.889vw/120%' } }",
        )
        .unwrap();

        assert_eq!(sizes["small"], FontSize::Fixed(CssValue::from("14px")));
        let FontSize::Responsive(h1) = &sizes["h1"] else {
            panic!("h1 should be responsive");
        };
        assert_eq!(h1["iphone"].to_string(), "font-size: 32px; line-height: 120%");
        assert_eq!(h1["*"].to_string(), "3.889vw/120%");
        assert_eq!(h1["iphone"].preview_size(), Some("32px"));
        assert_eq!(h1["*"].preview_size(), Some("3.889vw"));
    }

    #[test]
    fn test_spacing_nested_is_opaque() {
        let spacing: IndexMap<String, SpacingValue> =
            json5::from_str("{ gap: '20px', block: { iphone: '40px', '*': '5.714vw' } }").unwrap();
        assert_eq!(spacing["gap"], SpacingValue::Length(CssValue::from("20px")));
        assert!(matches!(spacing["block"], SpacingValue::Nested(_)));
    }
}
