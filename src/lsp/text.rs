//! Document text helpers.
//!
//! LSP positions count UTF-16 code units; Rust strings index bytes.

use tower_lsp::lsp_types::Position;

/// Text of a zero-based line without its line terminator; empty past the end
pub fn line_at(text: &str, line: u32) -> &str {
    text.split('\n')
        .nth(line as usize)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or("")
}

/// Byte index of a UTF-16 column, clamped to the line length
pub fn utf16_to_byte(line: &str, character: u32) -> usize {
    let mut units = 0u32;
    for (index, c) in line.char_indices() {
        if units >= character {
            return index;
        }
        units += c.len_utf16() as u32;
    }
    line.len()
}

/// UTF-16 column of a byte index
pub fn byte_to_utf16(line: &str, byte: usize) -> u32 {
    line[..byte.min(line.len())].chars().map(|c| c.len_utf16() as u32).sum()
}

/// The current line from column 0 up to the cursor
pub fn line_prefix(text: &str, position: Position) -> &str {
    let line = line_at(text, position.line);
    &line[..utf16_to_byte(line, position.character)]
}

/// Position of a byte offset in `text`
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() as u32;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    Position::new(line, byte_to_utf16(&text[line_start..], offset - line_start))
}
