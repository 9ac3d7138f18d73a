//! Type-expression parsing, including the generic-args-vs-comparison
//! speculative parse (spec §4.1).

use smallvec::SmallVec;

use super::{sync, Cursor};
use crate::ast::{Path, PrimTy, RawPtrMut, TypeExpr, TypeExprKind};
use crate::diagnostics::{codes, DiagSink, Diagnostic};
use crate::span::Span;
use crate::symbol::resolve;

fn prim_ty(text: &str) -> Option<PrimTy> {
  use PrimTy::*;
  Some(match text {
    "i8" => I8, "i16" => I16, "i32" => I32, "i64" => I64, "i128" => I128, "isize" => Isize,
    "u8" => U8, "u16" => U16, "u32" => U32, "u64" => U64, "u128" => U128, "usize" => Usize,
    "f16" => F16, "f32" => F32, "f64" => F64,
    "bool" => Bool, "char" => Char, "()" => Unit, "!" => Never,
    _ => return None,
  })
}

pub(super) fn parse_type(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, TypeExpr) {
  let start = cur.span();

  // Permission wrapper: `unique T` / `shared T` / `const T`.
  for (kw, perm) in [("unique", crate::ast::Permission::Unique),
                     ("shared", crate::ast::Permission::Shared),
                     ("const", crate::ast::Permission::Const)] {
    if cur.is_text(kw) {
      cur.bump();
      let (next, inner) = parse_type(cur, diags);
      let span = Span::between(start, inner.span);
      return (next, mk(span, TypeExprKind::Permission { perm, inner }));
    }
  }

  if cur.eat_text("opaque") {
    let (next, path) = parse_path(cur, diags);
    let span = Span::between(start, path.span);
    return (next, mk(span, TypeExprKind::Opaque(path)));
  }
  if cur.is_text("$") {
    cur.bump();
    let (next, path) = parse_path(cur, diags);
    let span = Span::between(start, path.span);
    return (next, mk(span, TypeExprKind::Dynamic(path)));
  }
  if cur.eat_text("*") {
    let mutability = if cur.eat_text("mut") { RawPtrMut::Mut } else { cur.eat_text("imm"); RawPtrMut::Imm };
    let (next, inner) = parse_type(cur, diags);
    let span = Span::between(start, inner.span);
    return (next, mk(span, TypeExprKind::RawPtr { mutability, inner }));
  }
  if cur.is_text("Ptr") && cur.peek_n(1).kind == crate::lexer_api::TokenKind::Operator
    && resolve(cur.peek_n(1).text) == "<" {
    cur.bump();
    cur.bump();
    let (mut next, inner) = parse_type(cur, diags);
    next.expect_text(">", diags, codes::SYNTAX_ERROR);
    let state = if next.eat_text("@") {
      let s = next.symbol_text();
      next.bump();
      Some(s)
    } else { None };
    let span = Span::between(start, next.span());
    return (next, mk(span, TypeExprKind::Ptr { inner, state }));
  }
  if cur.eat_text("(") {
    let mut elems = SmallVec::<[TypeExpr; 4]>::new();
    let mut next = cur;
    while !next.is_text(")") && !next.at_eof() {
      let (n2, ty) = parse_type(next, diags);
      next = n2;
      elems.push(ty);
      if !next.eat_text(",") { break }
    }
    let close = next.span();
    next.expect_text(")", diags, codes::SYNTAX_ERROR);
    let span = Span::between(start, close);
    return (next, mk(span, TypeExprKind::Tuple(elems.into_vec())));
  }
  if cur.eat_text("[") {
    let (mut next, elem) = parse_type(cur, diags);
    if next.eat_text(";") {
      let (n2, len) = super::expr::parse_expr(next, diags, true);
      next = n2;
      let close = next.span();
      next.expect_text("]", diags, codes::SYNTAX_ERROR);
      let span = Span::between(start, close);
      return (next, mk(span, TypeExprKind::Array { elem, len }));
    }
    let close = next.span();
    next.expect_text("]", diags, codes::SYNTAX_ERROR);
    let span = Span::between(start, close);
    return (next, mk(span, TypeExprKind::Slice(elem)));
  }
  if let Some(p) = prim_ty(&resolve(cur.peek().text)) {
    let sp = cur.span();
    cur.bump();
    return (cur, mk(sp, TypeExprKind::Prim(p)));
  }
  if cur.is_text("string") || cur.is_text("bytes") {
    let is_string = cur.is_text("string");
    cur.bump();
    let state = if cur.eat_text("@") {
      let s = cur.symbol_text();
      cur.bump();
      Some(s)
    } else { None };
    let span = start;
    let kind = if is_string { TypeExprKind::StringTy(state) } else { TypeExprKind::BytesTy(state) };
    return (cur, mk(span, kind));
  }

  // Path type, optionally a modal state (`M@State<...>`) or union (`A|B`).
  let (mut next, path) = parse_path(cur, diags);
  let mut ty = if next.eat_text("@") {
    let state = next.symbol_text();
    next.bump();
    mk(Span::between(start, next.span()), TypeExprKind::ModalState { base: path, state })
  } else {
    mk(path.span, TypeExprKind::Path(path))
  };
  while next.eat_text("|") {
    let (n2, rhs) = parse_type(next, diags);
    next = n2;
    let span = Span::between(ty.span, rhs.span);
    ty = match *ty.kind {
      TypeExprKind::Union(mut members) => { members.push(rhs); mk(span, TypeExprKind::Union(members)) }
      other => mk(span, TypeExprKind::Union(vec![mk(ty.span, other), rhs])),
    };
  }
  if next.eat_text("where") {
    next.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (n2, pred) = super::expr::parse_expr(next, diags, true);
    next = n2;
    let close = next.span();
    next.expect_text("}", diags, codes::SYNTAX_ERROR);
    let span = Span::between(start, close);
    ty = mk(span, TypeExprKind::Refinement { base: ty, predicate: pred });
  }
  (next, ty)
}

pub(super) fn parse_path(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, Path) {
  let start = cur.span();
  let mut segments = SmallVec::new();
  loop {
    segments.push(cur.symbol_text());
    cur.bump();
    if cur.is_text("::") && !looks_like_generic_commit_boundary(&cur) { cur.bump(); continue }
    break;
  }
  let (next, generic_args) = try_parse_generic_args(cur, diags);
  let span = Span::between(start, next.span());
  (next, Path { segments, generic_args, span })
}

fn looks_like_generic_commit_boundary(_cur: &Cursor) -> bool { false }

/// The hardest ambiguity in the grammar: at a call/path position, `<`
/// might start generic arguments or might be the less-than operator.
/// We speculatively scan balanced angle brackets, splitting a `>>`
/// token into two `>`s on demand, and commit only if the matching `>`
/// is followed by `(`, `{`, or `::`. On failure we reset to the
/// pre-speculation cursor and emit no diagnostic for the abandoned
/// path (spec §4.1, §9).
fn try_parse_generic_args(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Vec<TypeExpr>) {
  if !cur.is_text("<") { return (cur, Vec::new()) }
  let speculative_start = cur.clone();
  let mut probe = cur.clone();
  probe.bump(); // `<`
  let mut depth = 1i32;
  while depth > 0 && !probe.at_eof() {
    if probe.is_text("<") { depth += 1; probe.bump(); continue }
    if probe.is_text(">") || probe.is_text(">>") {
      // `eat_gt` treats `>>` as two `>` tokens, so calling it once per
      // loop iteration naturally splits it across two decrements.
      probe.eat_gt();
      depth -= 1;
      continue;
    }
    if depth == 1 && (probe.is_text(";") || probe.is_text("{")) {
      // A top-depth brace/semicolon before closing means this was never
      // a generic-args list (e.g. a block or a `<` comparison followed
      // by a statement). Bail conservatively.
      return (speculative_start, Vec::new());
    }
    probe.bump();
  }
  let commits = probe.is_text("(") || probe.is_text("{") || probe.is_text("::")
    || probe.at_eof() || probe.is_text(")") || probe.is_text(",") || probe.is_text(";")
    || matches!(probe.peek().kind, crate::lexer_api::TokenKind::Newline);
  if !commits { return (speculative_start, Vec::new()) }

  // Commit: re-parse for real, this time visible to the diagnostic sink.
  let mut real = cur;
  real.bump();
  let mut args = Vec::new();
  while !real.is_text(">") && !real.is_text(">>") && !real.at_eof() {
    let (next, ty) = parse_type(real, diags);
    real = next;
    args.push(ty);
    if !real.eat_text(",") { break }
  }
  if !real.eat_gt() {
    diags.emit(Diagnostic::error(codes::SYNTAX_ERROR, real.span(), "expected `>` to close generic arguments"));
  }
  (real, args)
}

fn mk(span: Span, kind: TypeExprKind) -> TypeExpr { TypeExpr { span, kind: Box::new(kind) } }
