//! Pattern parsing (spec §3.2, §4.1): wildcard, bindings, literals,
//! tuples, records, enum/modal variants, and ranges.

use smallvec::SmallVec;

use super::{types, Cursor};
use crate::ast::{EnumPatternPayload, Literal, Pattern, PatternKind};
use crate::diagnostics::{codes, DiagSink};
use crate::span::Span;
use crate::symbol::resolve;

pub(super) fn parse_pattern(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Pattern) {
  let (cur, lo) = parse_pattern_atom(cur, diags);
  if cur.is_text("..") || cur.is_text("..=") {
    if let PatternKind::Literal(lit_lo) = *lo.kind.clone() {
      let mut cur = cur;
      let inclusive = cur.eat_text("..=");
      if !inclusive { cur.bump(); }
      let (next, hi) = parse_pattern_atom(cur, diags);
      if let PatternKind::Literal(lit_hi) = *hi.kind {
        let span = Span::between(lo.span, hi.span);
        return (next, mk(span, PatternKind::Range { lo: lit_lo, hi: lit_hi, inclusive }));
      }
      return (next, mk(Span::between(lo.span, hi.span), PatternKind::Wildcard));
    }
  }
  (cur, lo)
}

fn parse_pattern_atom(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, Pattern) {
  use crate::lexer_api::TokenKind;
  let start = cur.span();

  if cur.eat_text("_") {
    return (cur, mk(start, PatternKind::Wildcard));
  }
  if cur.eat_text("(") {
    let mut elems = Vec::new();
    while !cur.is_text(")") && !cur.at_eof() {
      let (next, p) = parse_pattern(cur, diags);
      cur = next;
      elems.push(p);
      if !cur.eat_text(",") { break }
    }
    let close = cur.span();
    cur.expect_text(")", diags, codes::SYNTAX_ERROR);
    return (cur, mk(Span::between(start, close), PatternKind::Tuple(elems)));
  }

  let tok = cur.peek().clone();
  match tok.kind {
    TokenKind::IntLiteral => {
      let v: i128 = resolve(tok.text).replace('_', "").parse().unwrap_or(0);
      cur.bump();
      return (cur, mk(start, PatternKind::Literal(Literal::Int(v))));
    }
    TokenKind::FloatLiteral => {
      let v: f64 = resolve(tok.text).parse().unwrap_or(0.0);
      cur.bump();
      return (cur, mk(start, PatternKind::Literal(Literal::Float(v))));
    }
    TokenKind::StringLiteral => {
      cur.bump();
      return (cur, mk(start, PatternKind::Literal(Literal::Str(tok.text))));
    }
    TokenKind::CharLiteral => {
      let c = resolve(tok.text).chars().next().unwrap_or('\0');
      cur.bump();
      return (cur, mk(start, PatternKind::Literal(Literal::Char(c))));
    }
    TokenKind::BoolLiteral => {
      let b = resolve(tok.text) == "true";
      cur.bump();
      return (cur, mk(start, PatternKind::Literal(Literal::Bool(b))));
    }
    TokenKind::NullLiteral => {
      cur.bump();
      return (cur, mk(start, PatternKind::Literal(Literal::Null)));
    }
    _ => {}
  }

  if tok.kind == TokenKind::Identifier && !next_starts_path_pattern(&cur) {
    cur.bump();
    let mutable = false;
    if cur.eat_text(":") {
      let (next, ty) = types::parse_type(cur, diags);
      let span = Span::between(start, ty.span);
      return (next, mk(span, PatternKind::TypedBinding { name: tok.text, ty }));
    }
    return (cur, mk(start, PatternKind::Identifier { name: tok.text, mutable }));
  }

  parse_path_pattern(cur, diags, start)
}

/// After a single path segment, `::`, `@`, or `{` all mean this is an
/// enum/modal/record pattern, not a bare binding.
fn next_starts_path_pattern(cur: &Cursor) -> bool {
  let next = resolve(cur.peek_n(1).text);
  next == "::" || next == "@" || next == "{"
}

fn parse_path_pattern(cur: Cursor, diags: &mut DiagSink, start: Span) -> (Cursor, Pattern) {
  let (mut cur, path) = types::parse_path(cur, diags);
  if cur.eat_text("::") {
    let variant = cur.symbol_text();
    cur.bump();
    if cur.eat_text("(") {
      let mut elems = Vec::new();
      while !cur.is_text(")") && !cur.at_eof() {
        let (next, p) = parse_pattern(cur, diags);
        cur = next;
        elems.push(p);
        if !cur.eat_text(",") { break }
      }
      let close = cur.span();
      cur.expect_text(")", diags, codes::SYNTAX_ERROR);
      let span = Span::between(start, close);
      return (cur, mk(span, PatternKind::Enum { path, variant, payload: EnumPatternPayload::Tuple(elems) }));
    }
    if cur.eat_text("{") {
      let (next, fields, rest) = parse_field_patterns(cur, diags);
      cur = next;
      let close = cur.span();
      cur.expect_text("}", diags, codes::SYNTAX_ERROR);
      let span = Span::between(start, close);
      let _ = rest;
      return (cur, mk(span, PatternKind::Enum { path, variant, payload: EnumPatternPayload::Record(fields) }));
    }
    let span = Span::between(start, cur.span());
    return (cur, mk(span, PatternKind::Enum { path, variant, payload: EnumPatternPayload::None }));
  }
  if cur.eat_text("@") {
    let state = cur.symbol_text();
    cur.bump();
    let payload = if cur.eat_text("{") {
      let (next, fields, _rest) = parse_field_patterns(cur, diags);
      cur = next;
      cur.expect_text("}", diags, codes::SYNTAX_ERROR);
      Some(fields)
    } else { None };
    let span = Span::between(start, cur.span());
    return (cur, mk(span, PatternKind::Modal { path, state, payload }));
  }
  if cur.eat_text("{") {
    let (next, fields, rest) = parse_field_patterns(cur, diags);
    cur = next;
    let close = cur.span();
    cur.expect_text("}", diags, codes::SYNTAX_ERROR);
    let span = Span::between(start, close);
    return (cur, mk(span, PatternKind::Record { path, fields, rest }));
  }
  let span = path.span;
  (cur, mk(span, PatternKind::Record { path, fields: Vec::new(), rest: true }))
}

fn parse_field_patterns(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, Vec<(crate::symbol::Symbol, Pattern)>, bool) {
  let mut fields = SmallVec::<[(crate::symbol::Symbol, Pattern); 4]>::new();
  let mut rest = false;
  while !cur.is_text("}") && !cur.at_eof() {
    if cur.eat_text("..") { rest = true; break }
    let name = cur.symbol_text();
    cur.bump();
    let pat = if cur.eat_text(":") {
      let (next, p) = parse_pattern(cur, diags);
      cur = next;
      p
    } else {
      let span = cur.span();
      mk(span, PatternKind::Identifier { name, mutable: false })
    };
    fields.push((name, pat));
    if !cur.eat_text(",") { break }
  }
  (cur, fields.into_vec(), rest)
}

fn mk(span: Span, kind: PatternKind) -> Pattern { Pattern { span, kind: Box::new(kind) } }
