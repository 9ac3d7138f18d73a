//! Recursive-descent parser (spec §4.1).
//!
//! Parsers are immutable-by-convention: a successful subparse takes a
//! [`Cursor`] by value and returns `(Cursor, T)`; nothing is mutated in
//! place except through the cursor's own `advance`. Speculative parses
//! (the generic-vs-compare ambiguity, tuple-vs-paren lookahead) clone
//! the cursor — cheap, since it is a position into a shared token slice
//! — rather than the token buffer itself (spec §9).

mod docs;
mod expr;
mod item;
mod pattern;
mod sync;
mod types;

use std::rc::Rc;

use crate::ast::File;
use crate::diagnostics::{codes, DiagSink, Diagnostic};
use crate::lexer_api::{LexedFile, Token, TokenKind};
use crate::span::Span;
use crate::symbol::{intern, Symbol};

/// Parser state. `tokens` is shared (never cloned, only re-sliced via
/// `pos`); a clone of the cursor is O(1).
#[derive(Clone)]
pub struct Cursor {
  tokens: Rc<[Token]>,
  pos: usize,
  eof: Span,
  /// Threaded down so `if cond { }` doesn't mistake `{` for a record
  /// literal (spec §4.1 precedence notes).
  pub(crate) allow_brace: bool,
  /// Set after consuming the first half of a split `>>` token; the next
  /// `eat_gt` consumes the second half without advancing past a real
  /// token (spec §4.1's generic-args `>>` splitting).
  shr_split: bool,
}

pub struct Parser {
  cursor: Cursor,
  pub diags: DiagSink,
  docs: Vec<crate::lexer_api::DocComment>,
  unsafe_spans: Vec<Span>,
}

impl Parser {
  pub fn new(lexed: LexedFile) -> Self {
    // Newlines are significant statement terminators but ignored inside
    // balanced delimiters (spec §6); the parser consumes them explicitly
    // at statement boundaries, so non-terminator positions just skip them
    // via `Cursor::bump_ignoring_newlines`.
    let tokens: Rc<[Token]> = lexed.tokens.into();
    Self {
      cursor: Cursor { tokens, pos: 0, eof: lexed.eof, allow_brace: true, shr_split: false },
      diags: DiagSink::new(),
      docs: lexed.docs,
      unsafe_spans: lexed.unsafe_spans,
    }
  }

  /// Parses a whole file to completion (spec §8 invariant 1: parser
  /// totality — always produces a `File`, with `ErrorItem`s standing in
  /// for malformed top-level constructs).
  pub fn parse_file(mut self) -> (File, DiagSink) {
    let mut items = Vec::new();
    let mut cur = self.cursor.clone();
    while !cur.at_eof() {
      let before = cur.pos;
      let (next, item) = item::parse_item(cur, &mut self.diags);
      cur = next;
      items.push(item);
      if cur.pos == before {
        // Never-advance guard: forces totality even if every sub-parser
        // in the recovery chain somehow fails to consume a token.
        cur.bump();
      }
    }
    let (items, module_docs) = docs::attach(items, &self.docs);
    (File { items, module_docs }, self.diags)
  }
}

impl Cursor {
  pub(crate) fn peek(&self) -> &Token {
    self.tokens.get(self.pos).unwrap_or_else(|| self.eof_token())
  }

  pub(crate) fn peek_n(&self, n: usize) -> &Token {
    self.tokens.get(self.pos + n).unwrap_or_else(|| self.eof_token())
  }

  fn eof_token(&self) -> &'static Token {
    use std::sync::OnceLock;
    static EOF: OnceLock<Token> = OnceLock::new();
    // The span differs per-file but callers only use eof as a sentinel
    // kind check; line info for real EOF diagnostics comes from `self.eof`.
    EOF.get_or_init(|| Token { kind: TokenKind::Eof, span: Span::dummy(self.eof.file), text: intern(""), line: 0 })
  }

  pub(crate) fn at_eof(&self) -> bool { matches!(self.peek().kind, TokenKind::Eof) || self.pos >= self.tokens.len() }

  pub(crate) fn span(&self) -> Span {
    if self.pos >= self.tokens.len() { self.eof } else { self.tokens[self.pos].span }
  }

  /// Advances past the current token, returning it.
  pub(crate) fn bump(&mut self) -> Token {
    let t = self.tokens.get(self.pos).cloned()
      .unwrap_or(Token { kind: TokenKind::Eof, span: self.eof, text: intern(""), line: 0 });
    if self.pos < self.tokens.len() { self.pos += 1 }
    t
  }

  pub(crate) fn skip_newlines(&mut self) {
    while matches!(self.peek().kind, TokenKind::Newline) { self.pos += 1 }
  }

  pub(crate) fn is_text(&self, s: &str) -> bool {
    crate::symbol::resolve(self.peek().text) == s
  }

  pub(crate) fn eat_text(&mut self, s: &str) -> bool {
    if self.is_text(s) { self.bump(); true } else { false }
  }

  pub(crate) fn expect_text(&mut self, s: &str, diags: &mut DiagSink, code: &'static str) -> bool {
    if self.eat_text(s) { true } else {
      diags.emit(Diagnostic::error(code, self.span(), format!("expected `{s}`")));
      false
    }
  }

  /// True iff the current token begins on a strictly later source line
  /// than `after_line` — used by the trailing-comma rule (spec §4.1).
  pub(crate) fn begins_later_line_than(&self, after_line: u32) -> bool {
    self.peek().line > after_line
  }

  pub(crate) fn symbol_text(&self) -> Symbol { self.peek().text }

  /// Raw token index, used only by callers that need a cheap progress
  /// check (e.g. the never-advance guards in block/file parsing).
  pub(crate) fn token_pos(&self) -> usize { self.pos }

  /// Consumes one `>` of closing-angle-bracket text. A `>>` token is
  /// treated as two `>`s: the first call flips `shr_split` without
  /// moving `pos` (the `>>` token is still "current"); the second call
  /// clears it and advances past the real token. This is how nested
  /// generics like `Pair<Pair<i32,i32>,i32>` close their inner list
  /// with one `>` out of a lexed `>>` (spec §4.1).
  pub(crate) fn eat_gt(&mut self) -> bool {
    if self.shr_split {
      self.shr_split = false;
      if self.pos < self.tokens.len() { self.pos += 1 }
      return true;
    }
    if self.is_text(">") { self.bump(); return true }
    if self.is_text(">>") { self.shr_split = true; return true }
    false
  }
}

pub(crate) fn err_span(diags: &mut DiagSink, span: Span, msg: impl Into<String>) {
  diags.emit(Diagnostic::error(codes::SYNTAX_ERROR, span, msg));
}
