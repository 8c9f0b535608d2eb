//! Config script normalisation
//!
//! `europa.config.js` is a CommonJS module, but in practice it is an object
//! literal with the occasional zero-argument arrow function. This module
//! rewrites that subset into JSON5 text so it can be deserialised with serde:
//!
//! - `module.exports = …` / `export default …` prefixes are dropped
//! - `() => (…)` and `() => […]` are inlined, i.e. invoked
//! - bare numeric keys (`900: '#858585'`) are quoted
//! - comments, single quotes and trailing commas pass through (JSON5 has them)
//!
//! Property thunks are recorded in [`NormalizedScript::lazy`] so callers can
//! keep them lazy (the theme color table is re-evaluated on every access).

use thiserror::Error;

/// Errors produced while normalising a config script
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("config does not assign module.exports or use export default")]
    MissingExport,
    #[error("unterminated {0} starting at offset {1}")]
    Unterminated(&'static str, usize),
    #[error("template literals are not supported (offset {0})")]
    TemplateLiteral(usize),
    #[error("function bodies with statements are not supported (offset {0})")]
    BlockBody(usize),
    #[error("unsupported arrow function body at offset {0}")]
    UnsupportedArrow(usize),
}

/// A property whose value was written as a zero-argument arrow function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyProperty {
    /// Dotted path of the property, e.g. `theme.colors`
    pub key: String,
    /// Normalised JSON5 text of the function's return value
    pub body: String,
}

/// Result of [`normalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedScript {
    /// JSON5 text of the exported value with every function inlined
    pub source: String,
    pub lazy: Vec<LazyProperty>,
}

impl NormalizedScript {
    pub fn lazy_property(&self, key: &str) -> Option<&LazyProperty> {
        self.lazy.iter().find(|prop| prop.key == key)
    }
}

/// Normalise a config script into JSON5.
///
/// ```
/// use europa_lsp::config::script::normalize;
///
/// let script = normalize("module.exports = { theme: { colors: () => ({ red: '#f00' }) } }").unwrap();
/// assert_eq!(script.lazy[0].key, "theme.colors");
/// assert_eq!(script.lazy[0].body.trim(), "{ red: '#f00' }");
/// ```
pub fn normalize(script: &str) -> Result<NormalizedScript, ScriptError> {
    let expression = exported_expression(script)?;
    Scanner::new(expression).run()
}

fn exported_expression(script: &str) -> Result<&str, ScriptError> {
    let mut rest = &script[skip_trivia(script.as_bytes(), 0)..];

    for directive in ["'use strict'", "\"use strict\""] {
        if let Some(after) = rest.strip_prefix(directive) {
            let after = after.trim_start().trim_start_matches(';');
            rest = &after[skip_trivia(after.as_bytes(), 0)..];
        }
    }

    if let Some(after) = rest.strip_prefix("module.exports") {
        return after.trim_start().strip_prefix('=').ok_or(ScriptError::MissingExport);
    }
    if let Some(after) = rest.strip_prefix("export default") {
        return Ok(after);
    }
    Err(ScriptError::MissingExport)
}

/// Index of the first byte at or after `pos` that is not whitespace or a comment
fn skip_trivia(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        match bytes.get(pos..pos + 2) {
            Some(b"//") => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
            }
            Some(b"/*") => match find(bytes, pos + 2, b"*/") {
                Some(end) => pos = end + 2,
                None => return bytes.len(),
            },
            _ => match bytes.get(pos) {
                Some(b) if b.is_ascii_whitespace() => pos += 1,
                _ => return pos,
            },
        }
    }
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn is_key_start(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Object,
    Array,
    /// `() => ( … )`
    ArrowBody,
}

impl FrameKind {
    fn name(self) -> &'static str {
        match self {
            FrameKind::Object => "object",
            FrameKind::Array => "array",
            FrameKind::ArrowBody => "function body",
        }
    }
}

struct Frame {
    kind: FrameKind,
    /// Property this frame is the value of
    key: Option<String>,
    /// Output offset where a property thunk's body starts
    lazy_start: Option<usize>,
    start: usize,
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    out: String,
    frames: Vec<Frame>,
    expect_key: bool,
    pending_key: Option<String>,
    lazy: Vec<LazyProperty>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            out: String::with_capacity(src.len()),
            frames: Vec::new(),
            expect_key: false,
            pending_key: None,
            lazy: Vec::new(),
        }
    }

    fn run(mut self) -> Result<NormalizedScript, ScriptError> {
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'\'' | b'"' => self.copy_string(b)?,
                b'`' => return Err(ScriptError::TemplateLiteral(self.pos)),
                b'/' if matches!(self.bytes.get(self.pos + 1), Some(b'/') | Some(b'*')) => {
                    self.copy_comment()?
                }
                b'{' => {
                    self.open(FrameKind::Object, '{');
                    self.expect_key = true;
                }
                b'[' => self.open(FrameKind::Array, '['),
                b'}' | b']' => self.close(b),
                b'(' => match self.arrow_body_at(self.pos) {
                    Some(body) => self.enter_arrow(body)?,
                    None => self.copy_char(),
                },
                b')' if self.top_kind() == Some(FrameKind::ArrowBody) => {
                    self.pos += 1;
                    self.finish_frame();
                }
                b',' => {
                    self.copy_char();
                    self.pending_key = None;
                    self.expect_key = self.top_kind() == Some(FrameKind::Object);
                }
                b';' if self.frames.is_empty() => self.pos += 1,
                _ if self.expect_key && is_key_start(b) => self.copy_key(),
                _ => self.copy_char(),
            }
        }

        if let Some(frame) = self.frames.last() {
            return Err(ScriptError::Unterminated(frame.kind.name(), frame.start));
        }

        Ok(NormalizedScript { source: self.out, lazy: self.lazy })
    }

    fn top_kind(&self) -> Option<FrameKind> {
        self.frames.last().map(|frame| frame.kind)
    }

    fn copy_char(&mut self) {
        if let Some(c) = self.src[self.pos..].chars().next() {
            self.out.push(c);
            self.pos += c.len_utf8();
        }
    }

    fn copy_string(&mut self, quote: u8) -> Result<(), ScriptError> {
        let start = self.pos;
        let mut end = start + 1;
        loop {
            match self.bytes.get(end) {
                None | Some(b'\n') => return Err(ScriptError::Unterminated("string", start)),
                Some(b'\\') => end += 2,
                Some(&b) if b == quote => break,
                Some(_) => end += 1,
            }
        }

        self.out.push_str(&self.src[start..=end]);
        self.pos = end + 1;

        if self.expect_key {
            self.pending_key = Some(self.src[start + 1..end].to_string());
            self.expect_key = false;
        }
        Ok(())
    }

    fn copy_comment(&mut self) -> Result<(), ScriptError> {
        let start = self.pos;
        let end = if self.bytes.get(start + 1) == Some(&b'/') {
            find(self.bytes, start, b"\n").unwrap_or(self.bytes.len())
        } else {
            find(self.bytes, start + 2, b"*/")
                .map(|end| end + 2)
                .ok_or(ScriptError::Unterminated("comment", start))?
        };
        self.out.push_str(&self.src[start..end]);
        self.pos = end;
        Ok(())
    }

    /// Identifier or numeric property name; numeric names are quoted for JSON5
    fn copy_key(&mut self) {
        let start = self.pos;
        let mut end = start;
        while end < self.bytes.len() && is_key_start(self.bytes[end]) {
            end += 1;
        }

        let key = &self.src[start..end];
        if key.as_bytes()[0].is_ascii_digit() {
            self.out.push('"');
            self.out.push_str(key);
            self.out.push('"');
        } else {
            self.out.push_str(key);
        }

        self.pending_key = Some(key.to_string());
        self.expect_key = false;
        self.pos = end;
    }

    fn open(&mut self, kind: FrameKind, delimiter: char) {
        self.frames.push(Frame {
            kind,
            key: self.pending_key.take(),
            lazy_start: None,
            start: self.pos,
        });
        self.out.push(delimiter);
        self.pos += 1;
    }

    fn close(&mut self, delimiter: u8) {
        let expected = if delimiter == b'}' { FrameKind::Object } else { FrameKind::Array };
        self.copy_char();
        self.expect_key = false;
        // A mismatched delimiter is left for the JSON5 parser to report
        if self.top_kind() == Some(expected) {
            self.finish_frame();
        }
    }

    fn finish_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if let (Some(key), Some(start)) = (frame.key, frame.lazy_start) {
            let key = self.path_to(&key);
            self.lazy.push(LazyProperty { key, body: self.out[start..].to_string() });
        }
        self.expect_key = false;
    }

    fn path_to(&self, key: &str) -> String {
        let mut parts: Vec<&str> =
            self.frames.iter().filter_map(|frame| frame.key.as_deref()).collect();
        parts.push(key);
        parts.join(".")
    }

    /// If `pos` starts `() =>`, the offset of the arrow's body
    fn arrow_body_at(&self, pos: usize) -> Option<usize> {
        let close = skip_trivia(self.bytes, pos + 1);
        if self.bytes.get(close) != Some(&b')') {
            return None;
        }
        let arrow = skip_trivia(self.bytes, close + 1);
        if self.bytes.get(arrow..arrow + 2) != Some(b"=>".as_slice()) {
            return None;
        }
        Some(skip_trivia(self.bytes, arrow + 2))
    }

    fn enter_arrow(&mut self, body: usize) -> Result<(), ScriptError> {
        let kind = match self.bytes.get(body) {
            Some(b'(') => FrameKind::ArrowBody,
            Some(b'[') => FrameKind::Array,
            Some(b'{') => return Err(ScriptError::BlockBody(body)),
            _ => return Err(ScriptError::UnsupportedArrow(body)),
        };

        let key = self.pending_key.take();
        let lazy_start = key.as_ref().map(|_| self.out.len());
        self.frames.push(Frame { kind, key, lazy_start, start: body });
        if kind == FrameKind::Array {
            self.out.push('[');
        }
        self.pos = body + 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn to_json(source: &str) -> Value {
        json5::from_str(source).unwrap()
    }

    #[test]
    fn test_plain_module_exports() {
        let script = normalize("module.exports = {\n  theme: { breakpoints: { mobile: '480px', }, },\n};\n")
            .unwrap();
        let value = to_json(&script.source);
        assert_eq!(value["theme"]["breakpoints"]["mobile"], "480px");
        assert!(script.lazy.is_empty());
    }

    #[test]
    fn test_export_default() {
        let script = normalize("export default { setMaxForVw: true }").unwrap();
        assert_eq!(to_json(&script.source)["setMaxForVw"], true);
    }

    #[test]
    fn test_leading_comments_and_directive() {
        let script =
            normalize("// europa\n/** @type {object} */\n'use strict';\nmodule.exports = { a: 1 }").unwrap();
        assert_eq!(to_json(&script.source)["a"], 1);
    }

    #[test]
    fn test_numeric_keys_are_quoted() {
        let script = normalize("module.exports = { gray: { 900: '#858585' } }").unwrap();
        assert!(script.source.contains("\"900\": '#858585'"));
        assert_eq!(to_json(&script.source)["gray"]["900"], "#858585");
    }

    #[test]
    fn test_top_level_function_is_invoked() {
        let script = normalize("module.exports = () => ({ theme: { spacing: { xs: '15px' } } })").unwrap();
        assert_eq!(to_json(&script.source)["theme"]["spacing"]["xs"], "15px");
        assert!(script.lazy.is_empty());
    }

    #[test]
    fn test_property_function_is_inlined_and_recorded() {
        let script = normalize(
            "module.exports = {\n  theme: {\n    colors: () => ({\n      black: '#000',\n      gray: { 900: '#858585' },\n    }),\n  },\n}",
        )
        .unwrap();

        let value = to_json(&script.source);
        assert_eq!(value["theme"]["colors"]["black"], "#000");

        let colors = script.lazy_property("theme.colors").unwrap();
        let body = to_json(&colors.body);
        assert_eq!(body["gray"]["900"], "#858585");
    }

    #[test]
    fn test_array_bodied_function() {
        let script = normalize("module.exports = { fonts: () => ['Menlo', 'monospace'] }").unwrap();
        assert_eq!(to_json(&script.source)["fonts"][1], "monospace");
        assert_eq!(script.lazy_property("fonts").unwrap().body, "['Menlo', 'monospace']");
    }

    #[test]
    fn test_comments_are_not_scanned() {
        let script = normalize(
            "module.exports = {\n  /* colors: () => ({ 900: 1 }) */\n  // key: () => {\n  a: 'x', // trailing ) ]\n}",
        )
        .unwrap();
        assert!(script.lazy.is_empty());
        assert_eq!(to_json(&script.source)["a"], "x");
    }

    #[test]
    fn test_strings_with_structural_characters() {
        let script = normalize("module.exports = { 'font-size': '11px/115%', q: \"it's ({\" }").unwrap();
        let value = to_json(&script.source);
        assert_eq!(value["font-size"], "11px/115%");
        assert_eq!(value["q"], "it's ({");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(normalize("const x = {}"), Err(ScriptError::MissingExport));
        assert!(matches!(
            normalize("module.exports = { a: `x` }"),
            Err(ScriptError::TemplateLiteral(_))
        ));
        assert!(matches!(
            normalize("module.exports = { colors: () => { return {} } }"),
            Err(ScriptError::BlockBody(_))
        ));
        assert!(matches!(
            normalize("module.exports = { a: { b: 1 }"),
            Err(ScriptError::Unterminated("object", _))
        ));
    }
}
