//! Top-level item parsing and statement parsing (spec §3.2, §4.1).
//! Item parsing is panic-mode recoverable: a malformed item becomes an
//! `ErrorItem` after syncing to the next item keyword, so one bad
//! top-level construct never poisons the rest of the file.

use smallvec::SmallVec;

use super::{expr, pattern, sync, types, Cursor};
use crate::ast::*;
use crate::diagnostics::{codes, DiagSink, Diagnostic};
use crate::span::Span;

pub(super) fn parse_item(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, Item) {
  cur.skip_newlines();
  let start = cur.span();
  let vis = parse_visibility(&mut cur);
  let attrs = parse_attributes(&mut cur, diags);

  // `import`/`using` share the same tail grammar.
  if cur.is_text("import") || cur.is_text("using") {
    let is_import = cur.is_text("import");
    cur.bump();
    let (next, path) = types::parse_path(cur, diags);
    let mut next = next;
    let alias = if next.eat_text("as") {
      let s = next.symbol_text();
      next.bump();
      Some(s)
    } else { None };
    let span = Span::between(start, next.span());
    let kind = if is_import { ItemKind::Import { path, alias } } else { ItemKind::Using { path, alias } };
    return (next, Item { span, vis, attrs, doc: Vec::new(), kind });
  }

  if cur.eat_text("static") {
    let mutable = cur.eat_text("mut");
    let name = cur.symbol_text();
    cur.bump();
    let ty = if cur.eat_text(":") {
      let (next, ty) = types::parse_type(cur, diags);
      cur = next;
      Some(ty)
    } else { None };
    cur.expect_text("=", diags, codes::SYNTAX_ERROR);
    let (next, init) = expr::parse_expr(cur, diags, true);
    let span = Span::between(start, init.span);
    return (next, Item { span, vis, attrs, doc: Vec::new(), kind: ItemKind::Static { name, mutable, ty, init } });
  }

  if cur.eat_text("procedure") {
    let (next, proc_) = parse_procedure(cur, diags);
    let span = Span::between(start, next.span());
    return (next, Item { span, vis, attrs, doc: Vec::new(), kind: ItemKind::Procedure(proc_) });
  }

  if cur.eat_text("record") {
    let name = cur.symbol_text();
    cur.bump();
    let generics = parse_generics(&mut cur, diags);
    cur.expect_text("{", diags, codes::SYNTAX_ERROR);
    let fields = parse_field_decls(&mut cur, diags);
    let close = cur.span();
    cur.expect_text("}", diags, codes::SYNTAX_ERROR);
    let span = Span::between(start, close);
    return (cur, Item { span, vis, attrs, doc: Vec::new(), kind: ItemKind::Record(RecordDecl { name, generics, fields }) });
  }

  if cur.eat_text("enum") {
    let name = cur.symbol_text();
    cur.bump();
    let generics = parse_generics(&mut cur, diags);
    cur.expect_text("{", diags, codes::SYNTAX_ERROR);
    let variants = parse_variant_decls(&mut cur, diags);
    let close = cur.span();
    cur.expect_text("}", diags, codes::SYNTAX_ERROR);
    let span = Span::between(start, close);
    return (cur, Item { span, vis, attrs, doc: Vec::new(), kind: ItemKind::Enum(EnumDecl { name, generics, variants }) });
  }

  if cur.eat_text("modal") {
    let name = cur.symbol_text();
    cur.bump();
    let generics = parse_generics(&mut cur, diags);
    cur.expect_text("{", diags, codes::SYNTAX_ERROR);
    let mut states = Vec::new();
    cur.skip_newlines();
    while !cur.is_text("}") && !cur.at_eof() {
      let vstart = cur.span();
      let sname = cur.symbol_text();
      cur.bump();
      let payload = parse_variant_payload(&mut cur, diags);
      let mut transitions = Vec::new();
      if cur.eat_text("{") {
        cur.skip_newlines();
        while !cur.is_text("}") && !cur.at_eof() {
          cur.expect_text("procedure", diags, codes::SYNTAX_ERROR);
          let (next, p) = parse_procedure(cur, diags);
          cur = next;
          transitions.push(p);
          cur.skip_newlines();
        }
        cur.expect_text("}", diags, codes::SYNTAX_ERROR);
      }
      let vspan = Span::between(vstart, cur.span());
      states.push(ModalStateDecl { name: sname, payload, transitions, span: vspan });
      if !cur.eat_text(",") { cur.skip_newlines() }
      cur.skip_newlines();
    }
    let close = cur.span();
    cur.expect_text("}", diags, codes::SYNTAX_ERROR);
    let span = Span::between(start, close);
    return (cur, Item { span, vis, attrs, doc: Vec::new(), kind: ItemKind::Modal(ModalDecl { name, generics, states }) });
  }

  if cur.eat_text("class") {
    let name = cur.symbol_text();
    cur.bump();
    let generics = parse_generics(&mut cur, diags);
    cur.expect_text("{", diags, codes::SYNTAX_ERROR);
    let mut methods = Vec::new();
    cur.skip_newlines();
    while !cur.is_text("}") && !cur.at_eof() {
      cur.expect_text("procedure", diags, codes::SYNTAX_ERROR);
      let (next, p) = parse_procedure(cur, diags);
      cur = next;
      methods.push(p);
      cur.skip_newlines();
    }
    let close = cur.span();
    cur.expect_text("}", diags, codes::SYNTAX_ERROR);
    let span = Span::between(start, close);
    return (cur, Item { span, vis, attrs, doc: Vec::new(), kind: ItemKind::Class(ClassDecl { name, generics, methods }) });
  }

  if cur.eat_text("type") {
    let name = cur.symbol_text();
    cur.bump();
    let generics = parse_generics(&mut cur, diags);
    cur.expect_text("=", diags, codes::SYNTAX_ERROR);
    let (next, target) = types::parse_type(cur, diags);
    let span = Span::between(start, target.span);
    return (next, Item { span, vis, attrs, doc: Vec::new(), kind: ItemKind::TypeAlias { name, generics, target } });
  }

  diags.emit(Diagnostic::error(codes::SYNTAX_ERROR, cur.span(), "expected an item"));
  let synced = sync::sync_item(cur);
  let span = Span::between(start, synced.span());
  (synced, Item { span, vis, attrs, doc: Vec::new(), kind: ItemKind::ErrorItem })
}

fn parse_visibility(cur: &mut Cursor) -> Visibility {
  if cur.eat_text("public") { Visibility::Public }
  else if cur.eat_text("protected") { Visibility::Protected }
  else if cur.eat_text("internal") { Visibility::Internal }
  else { Visibility::Private }
}

/// `[[inline]]`, `[[extern("C")]]`, `[[allow(code)]]`: the only surface
/// attribute syntax (spec §4.1's attribute grammar note).
fn parse_attributes(cur: &mut Cursor, diags: &mut DiagSink) -> AttributeSet {
  let mut attrs = AttributeSet::default();
  while cur.is_text("[") && crate::symbol::resolve(cur.peek_n(1).text) == "[" {
    cur.bump();
    cur.bump();
    loop {
      let name = crate::symbol::resolve(cur.symbol_text());
      cur.bump();
      match name.as_str() {
        "inline" => attrs.markers |= Markers::INLINE,
        "intrinsic" => attrs.markers |= Markers::INTRINSIC,
        "extern" => {
          attrs.markers |= Markers::EXTERN;
          if cur.eat_text("(") {
            attrs.extern_abi = Some(cur.symbol_text());
            cur.bump();
            cur.expect_text(")", diags, codes::SYNTAX_ERROR);
          }
        }
        "allow" => {
          if cur.eat_text("(") {
            attrs.allow.push(cur.symbol_text());
            cur.bump();
            cur.expect_text(")", diags, codes::SYNTAX_ERROR);
          }
        }
        _ => {}
      }
      if !cur.eat_text(",") { break }
    }
    cur.expect_text("]", diags, codes::SYNTAX_ERROR);
    cur.expect_text("]", diags, codes::SYNTAX_ERROR);
    cur.skip_newlines();
  }
  attrs
}

fn parse_generics(cur: &mut Cursor, diags: &mut DiagSink) -> Vec<GenericParam> {
  let mut params = Vec::new();
  if !cur.eat_text("<") { return params }
  while !cur.is_text(">") && !cur.is_text(">>") && !cur.at_eof() {
    let start = cur.span();
    let name = cur.symbol_text();
    cur.bump();
    let mut bounds = SmallVec::new();
    if cur.eat_text(":") {
      loop {
        let (next, path) = types::parse_path(cur.clone(), diags);
        *cur = next;
        bounds.push(path);
        if !cur.eat_text("+") { break }
      }
    }
    let span = Span::between(start, cur.span());
    params.push(GenericParam { name, bounds, span });
    if !cur.eat_text(",") { break }
  }
  cur.eat_gt();
  params
}

fn parse_where_clause(cur: &mut Cursor, diags: &mut DiagSink) -> Option<WhereClause> {
  if !cur.eat_text("where") { return None }
  let mut predicates = Vec::new();
  loop {
    let name = cur.symbol_text();
    cur.bump();
    cur.expect_text(":", diags, codes::SYNTAX_ERROR);
    let (next, path) = types::parse_path(cur.clone(), diags);
    *cur = next;
    predicates.push((name, path));
    if !cur.eat_text(",") { break }
  }
  Some(WhereClause { predicates })
}

fn parse_procedure(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, Procedure) {
  let name = cur.symbol_text();
  cur.bump();
  let generics = parse_generics(&mut cur, diags);
  cur.expect_text("(", diags, codes::SYNTAX_ERROR);
  let mut params = Vec::new();
  while !cur.is_text(")") && !cur.at_eof() {
    params.push(parse_param(&mut cur, diags));
    if !cur.eat_text(",") { break }
  }
  cur.expect_text(")", diags, codes::SYNTAX_ERROR);
  let ret = if cur.eat_text("->") {
    let (next, ty) = types::parse_type(cur, diags);
    cur = next;
    Some(ty)
  } else { None };
  let where_clause = parse_where_clause(&mut cur, diags);
  let mut contract = None;
  loop {
    if cur.eat_text("requires") {
      let (next, e) = expr::parse_expr(cur, diags, false);
      cur = next;
      contract.get_or_insert(Contract { pre: None, post: None }).pre = Some(e);
      continue;
    }
    if cur.eat_text("ensures") {
      let (next, e) = expr::parse_expr(cur, diags, false);
      cur = next;
      contract.get_or_insert(Contract { pre: None, post: None }).post = Some(e);
      continue;
    }
    break;
  }
  let body = if cur.is_text("{") {
    let brace_span = cur.span();
    cur.bump();
    let (next, block) = expr::parse_block_after_brace(cur, diags, brace_span);
    cur = next;
    Some(Expr { span: block.span, kind: Box::new(ExprKind::Block(block)) })
  } else { None };
  (cur, Procedure { name, generics, where_clause, params, ret, contract, body })
}

fn parse_param(cur: &mut Cursor, diags: &mut DiagSink) -> Param {
  let start = cur.span();
  let receiver = if cur.is_text("&") && crate::symbol::resolve(cur.peek_n(1).text) == "self" {
    cur.bump(); cur.bump();
    Some(ReceiverShorthand::Const)
  } else if cur.is_text("!") && crate::symbol::resolve(cur.peek_n(1).text) == "self" {
    cur.bump(); cur.bump();
    Some(ReceiverShorthand::Unique)
  } else if cur.is_text("%") && crate::symbol::resolve(cur.peek_n(1).text) == "self" {
    cur.bump(); cur.bump();
    Some(ReceiverShorthand::Shared)
  } else { None };
  if let Some(receiver) = receiver {
    let span = Span::between(start, cur.span());
    let mut segments = SmallVec::new();
    segments.push(crate::symbol::intern("Self"));
    let ty = TypeExpr { span, kind: Box::new(TypeExprKind::Path(Path {
      segments, generic_args: Vec::new(), span,
    })) };
    return Param { name: crate::symbol::intern("self"), ty, by_move: false, receiver: Some(receiver), span };
  }
  let by_move = cur.eat_text("move");
  let name = cur.symbol_text();
  cur.bump();
  cur.expect_text(":", diags, codes::SYNTAX_ERROR);
  let (next, ty) = types::parse_type(cur.clone(), diags);
  *cur = next;
  let span = Span::between(start, ty.span);
  Param { name, ty, by_move, receiver: None, span }
}

fn parse_field_decls(cur: &mut Cursor, diags: &mut DiagSink) -> Vec<FieldDecl> {
  let mut fields = Vec::new();
  cur.skip_newlines();
  while !cur.is_text("}") && !cur.at_eof() {
    let start = cur.span();
    let name = cur.symbol_text();
    cur.bump();
    cur.expect_text(":", diags, codes::SYNTAX_ERROR);
    let (next, ty) = types::parse_type(cur.clone(), diags);
    *cur = next;
    let span = Span::between(start, ty.span);
    fields.push(FieldDecl { name, ty, span });
    let comma_line = cur.peek().line;
    if !cur.eat_text(",") { cur.skip_newlines(); continue }
    if cur.is_text("}") && !cur.begins_later_line_than(comma_line) {
      diags.emit(Diagnostic::error(codes::BAD_TRAILING_COMMA, cur.span(),
        "trailing comma must be followed by a closing delimiter on a later line"));
    }
    cur.skip_newlines();
  }
  fields
}

fn parse_variant_payload(cur: &mut Cursor, diags: &mut DiagSink) -> VariantPayload {
  if cur.eat_text("(") {
    let mut tys = Vec::new();
    while !cur.is_text(")") && !cur.at_eof() {
      let (next, ty) = types::parse_type(cur.clone(), diags);
      *cur = next;
      tys.push(ty);
      if !cur.eat_text(",") { break }
    }
    cur.expect_text(")", diags, codes::SYNTAX_ERROR);
    return VariantPayload::Tuple(tys);
  }
  if cur.is_text("{") {
    cur.bump();
    let fields = parse_field_decls(cur, diags);
    cur.expect_text("}", diags, codes::SYNTAX_ERROR);
    return VariantPayload::Record(fields);
  }
  VariantPayload::Unit
}

fn parse_variant_decls(cur: &mut Cursor, diags: &mut DiagSink) -> Vec<VariantDecl> {
  let mut variants = Vec::new();
  cur.skip_newlines();
  while !cur.is_text("}") && !cur.at_eof() {
    let start = cur.span();
    let name = cur.symbol_text();
    cur.bump();
    let payload = parse_variant_payload(cur, diags);
    let span = Span::between(start, cur.span());
    variants.push(VariantDecl { name, payload, span });
    if !cur.eat_text(",") { cur.skip_newlines(); continue }
    cur.skip_newlines();
  }
  variants
}

// ------------------------------------------------------------ statements

pub(super) enum StmtOrTail {
  Stmt(Stmt),
  /// A trailing expression with no terminator: the block's value.
  Tail(Expr),
}

pub(super) fn parse_stmt(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, StmtOrTail) {
  cur.skip_newlines();
  let start = cur.span();

  if cur.eat_text("shadow") {
    let mutable = cur.eat_text("var");
    if !mutable { cur.expect_text("let", diags, codes::SYNTAX_ERROR); }
    return parse_let_tail(cur, diags, start, mutable, true);
  }
  if cur.is_text("let") || cur.is_text("var") {
    let mutable = cur.is_text("var");
    cur.bump();
    return parse_let_tail(cur, diags, start, mutable, false);
  }
  if cur.eat_text("return") {
    let value = if expr::starts_expr(&cur) {
      let (next, e) = expr::parse_expr(cur, diags, true);
      cur = next;
      Some(e)
    } else { None };
    let span = Span::between(start, cur.span());
    return (cur, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::Return(value) }));
  }
  if cur.eat_text("result") {
    let (next, e) = expr::parse_expr(cur, diags, true);
    let span = Span::between(start, e.span);
    return (next, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::Result(e) }));
  }
  if cur.eat_text("break") {
    let value = if expr::starts_expr(&cur) {
      let (next, e) = expr::parse_expr(cur, diags, true);
      cur = next;
      Some(e)
    } else { None };
    let span = Span::between(start, cur.span());
    return (cur, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::Break { label: None, value } }));
  }
  if cur.eat_text("continue") {
    let span = Span::between(start, cur.span());
    return (cur, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::Continue { label: None } }));
  }
  if cur.eat_text("defer") {
    let (next, e) = expr::parse_expr(cur, diags, true);
    let span = Span::between(start, e.span);
    return (next, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::Defer(e) }));
  }
  if cur.eat_text("region") {
    let (next, init) = expr::parse_expr(cur, diags, false);
    let mut next = next;
    let alias = if next.eat_text("as") {
      let s = next.symbol_text();
      next.bump();
      Some(s)
    } else { None };
    next.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (next, body) = expr::parse_block_after_brace(next, diags, start);
    let span = Span::between(start, body.span);
    return (next, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::Region { init, alias, body } }));
  }
  if cur.eat_text("frame") {
    let alias = cur.symbol_text();
    cur.bump();
    cur.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (next, body) = expr::parse_block_after_brace(cur, diags, start);
    let span = Span::between(start, body.span);
    return (next, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::Frame { alias, body } }));
  }

  if !expr::starts_expr(&cur) {
    diags.emit(Diagnostic::error(codes::SYNTAX_ERROR, cur.span(), "expected a statement"));
    let synced = sync::sync_stmt(cur);
    let span = Span::between(start, synced.span());
    return (synced, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::ErrorStmt }));
  }

  let (mut cur, place) = expr::parse_expr(cur, diags, true);
  if cur.eat_text("=") {
    let (next, value) = expr::parse_expr(cur, diags, true);
    let span = Span::between(start, value.span);
    return (next, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::Assign { place, value } }));
  }
  for (tok, op) in [("+=", CompoundOp::Add), ("-=", CompoundOp::Sub), ("*=", CompoundOp::Mul),
                    ("/=", CompoundOp::Div), ("%=", CompoundOp::Rem)] {
    if cur.eat_text(tok) {
      let (next, value) = expr::parse_expr(cur, diags, true);
      let span = Span::between(start, value.span);
      return (next, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::CompoundAssign { op, place, value } }));
    }
  }
  if cur.is_text("}") {
    return (cur, StmtOrTail::Tail(place));
  }
  let span = place.span;
  (cur, StmtOrTail::Stmt(Stmt { span, kind: StmtKind::ExprStmt(place) }))
}

fn parse_let_tail(cur: Cursor, diags: &mut DiagSink, start: Span, mutable: bool, shadow: bool) -> (Cursor, StmtOrTail) {
  let (mut cur, pat) = pattern::parse_pattern(cur, diags);
  let ty = if cur.eat_text(":") {
    let (next, ty) = types::parse_type(cur, diags);
    cur = next;
    Some(ty)
  } else { None };
  cur.expect_text("=", diags, codes::SYNTAX_ERROR);
  let (next, init) = expr::parse_expr(cur, diags, true);
  let span = Span::between(start, init.span);
  let kind = if shadow {
    StmtKind::ShadowLet { pat, ty, init, mutable }
  } else {
    StmtKind::Let { pat, ty, init, mutable }
  };
  (next, StmtOrTail::Stmt(Stmt { span, kind }))
}
