//! Panic-mode recovery: after a diagnostic, consume tokens until a
//! plausible re-entry point so one malformed construct doesn't poison
//! the rest of the file (spec §4.1, §9).

use super::Cursor;
use crate::lexer_api::TokenKind;

const ITEM_KEYWORDS: &[&str] = &[
  "import", "using", "static", "procedure", "record", "enum", "modal", "class", "type",
];

fn is_stmt_terminator(cur: &Cursor) -> bool {
  matches!(cur.peek().kind, TokenKind::Newline) || cur.is_text(";")
}

fn is_closing_delim(cur: &Cursor) -> bool {
  cur.is_text("}") || cur.is_text(")") || cur.is_text("]")
}

/// Consume tokens until a statement terminator or closing delimiter,
/// leaving the cursor just before it so the caller can decide whether
/// to consume the terminator itself.
pub(crate) fn sync_stmt(mut cur: Cursor) -> Cursor {
  let mut depth = 0i32;
  while !cur.at_eof() {
    if depth == 0 && (is_stmt_terminator(&cur) || is_closing_delim(&cur)) { break }
    if cur.is_text("{") || cur.is_text("(") || cur.is_text("[") { depth += 1 }
    if cur.is_text("}") || cur.is_text(")") || cur.is_text("]") { depth -= 1 }
    cur.bump();
  }
  cur
}

/// Consume tokens until a top-level item keyword or closing brace.
pub(crate) fn sync_item(mut cur: Cursor) -> Cursor {
  let mut depth = 0i32;
  while !cur.at_eof() {
    if depth == 0 && ITEM_KEYWORDS.iter().any(|kw| cur.is_text(kw)) { break }
    if depth == 0 && cur.is_text("}") { break }
    if cur.is_text("{") || cur.is_text("(") || cur.is_text("[") { depth += 1 }
    if cur.is_text("}") || cur.is_text(")") || cur.is_text("]") { depth -= 1 }
    cur.bump();
  }
  cur
}

/// Consume tokens until something that can start or end a type
/// (closing delimiter, comma, `=`, or a statement terminator).
pub(crate) fn sync_type(mut cur: Cursor) -> Cursor {
  let mut depth = 0i32;
  while !cur.at_eof() {
    if depth == 0 && (is_closing_delim(&cur) || cur.is_text(",") || cur.is_text("=") || is_stmt_terminator(&cur)) {
      break
    }
    if cur.is_text("<") || cur.is_text("(") || cur.is_text("[") { depth += 1 }
    if cur.is_text(">") || cur.is_text(")") || cur.is_text("]") { depth -= 1 }
    cur.bump();
  }
  cur
}
