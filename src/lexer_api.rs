//! Types describing the boundary with the lexer (external collaborator,
//! spec §6). This crate never constructs these from raw text; it only
//! consumes them.

use crate::span::Span;
use crate::symbol::Symbol;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
  Identifier,
  Keyword,
  Operator,
  Punctuator,
  IntLiteral,
  FloatLiteral,
  StringLiteral,
  CharLiteral,
  BoolLiteral,
  NullLiteral,
  Newline,
  Unknown,
  Eof,
}

#[derive(Clone, Debug)]
pub struct Token {
  pub kind: TokenKind,
  pub span: Span,
  /// The interned raw text (identifiers/keywords/operators only; literal
  /// values are decoded lazily by the parser from the source slice).
  pub text: Symbol,
  /// 1-based source line the token starts on, supplied by the lexer.
  /// Newlines are elided inside balanced delimiters but the trailing-
  /// comma rule (spec §4.1) still needs to know whether a comma and the
  /// delimiter that follows it are on different source lines.
  pub line: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DocKind { Line, Module }

#[derive(Clone, Debug)]
pub struct DocComment {
  pub kind: DocKind,
  pub text: String,
  pub span: Span,
}

/// Everything the parser needs from the lexer for one source file.
pub struct LexedFile {
  pub tokens: Vec<Token>,
  pub docs: Vec<DocComment>,
  /// Byte ranges the lexer identified as `unsafe { ... }` bodies.
  pub unsafe_spans: Vec<Span>,
  pub eof: Span,
}
