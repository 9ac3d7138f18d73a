//! Expression parsing: a hand-rolled Pratt-style precedence cascade
//! (spec §4.1): range > logical-or > logical-and > comparison > bit-or
//! > bit-xor > bit-and > shift > additive > multiplicative > power
//! (right-assoc) > `as` cast > unary > postfix > primary.

use super::{types, Cursor};
use crate::ast::*;
use crate::diagnostics::{codes, DiagSink, Diagnostic};
use crate::span::Span;
use crate::symbol::resolve;

/// `allow_brace = false` inside `if`/`match`/loop conditions so a `{`
/// is read as a block, not the start of a record literal.
pub(super) fn parse_expr(cur: Cursor, diags: &mut DiagSink, allow_brace: bool) -> (Cursor, Expr) {
  let mut cur = cur;
  cur.allow_brace = allow_brace;
  parse_range(cur, diags)
}

fn parse_range(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Expr) {
  let start = cur.span();
  if cur.is_text("..") || cur.is_text("..=") {
    let mut cur = cur;
    let inclusive = cur.eat_text("..=");
    if !inclusive { cur.bump(); }
    if starts_expr(&cur) {
      let (next, to) = parse_or(cur, diags);
      let span = Span::between(start, to.span);
      let form = if inclusive { RangeForm::ToInclusive } else { RangeForm::To };
      return (next, mk(span, ExprKind::Range { form, from: None, to: Some(to) }));
    }
    return (cur, mk(start, ExprKind::Range { form: RangeForm::Full, from: None, to: None }));
  }
  let (mut cur, lhs) = parse_or(cur, diags);
  if cur.is_text("..") || cur.is_text("..=") {
    let inclusive = cur.eat_text("..=");
    if !inclusive { cur.bump(); }
    if starts_expr(&cur) {
      let (next, rhs) = parse_or(cur, diags);
      let span = Span::between(lhs.span, rhs.span);
      let form = if inclusive { RangeForm::Inclusive } else { RangeForm::Exclusive };
      return (next, mk(span, ExprKind::Range { form, from: Some(lhs), to: Some(rhs) }));
    }
    let span = lhs.span;
    return (cur, mk(span, ExprKind::Range { form: RangeForm::From, from: Some(lhs), to: None }));
  }
  (cur, lhs)
}

pub(super) fn starts_expr(cur: &Cursor) -> bool {
  !(cur.is_text(")") || cur.is_text("]") || cur.is_text("}") || cur.is_text(",") || cur.is_text(";")
    || matches!(cur.peek().kind, crate::lexer_api::TokenKind::Newline) || cur.at_eof())
}

macro_rules! left_assoc_level {
  ($name:ident, $next:ident, [$($tok:literal => $op:expr),+ $(,)?]) => {
    fn $name(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Expr) {
      let (mut cur, mut lhs) = $next(cur, diags);
      loop {
        let op = $(if cur.is_text($tok) { Some($op) } else)+ { None };
        let Some(op) = op else { break };
        cur.bump();
        let (next, rhs) = $next(cur, diags);
        cur = next;
        let span = Span::between(lhs.span, rhs.span);
        lhs = mk(span, ExprKind::Binary { op, lhs, rhs });
      }
      (cur, lhs)
    }
  };
}

left_assoc_level!(parse_or, parse_and, ["or" => BinOp::Or]);
left_assoc_level!(parse_and, parse_cmp, ["and" => BinOp::And]);
left_assoc_level!(parse_bitor, parse_bitxor, ["|" => BinOp::BitOr]);
left_assoc_level!(parse_bitxor, parse_bitand, ["^" => BinOp::BitXor]);
left_assoc_level!(parse_bitand, parse_shift, ["&" => BinOp::BitAnd]);
left_assoc_level!(parse_shift, parse_add, ["<<" => BinOp::Shl, ">>" => BinOp::Shr]);
left_assoc_level!(parse_add, parse_mul, ["+" => BinOp::Add, "-" => BinOp::Sub]);
left_assoc_level!(parse_mul, parse_power, ["*" => BinOp::Mul, "/" => BinOp::Div, "%" => BinOp::Rem]);

fn parse_cmp(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Expr) {
  let (mut cur, lhs) = parse_bitor(cur, diags);
  let op = if cur.is_text("==") { Some(BinOp::Eq) }
    else if cur.is_text("!=") { Some(BinOp::Ne) }
    else if cur.is_text("<=") { Some(BinOp::Le) }
    else if cur.is_text(">=") { Some(BinOp::Ge) }
    else if cur.is_text("<") { Some(BinOp::Lt) }
    else if cur.is_text(">") { Some(BinOp::Gt) }
    else { None };
  // Comparison does not chain (`a < b < c` is a checker error, not a
  // parse error); parse at most one comparison operator per level.
  let Some(op) = op else { return (cur, lhs) };
  cur.bump();
  let (next, rhs) = parse_bitor(cur, diags);
  let span = Span::between(lhs.span, rhs.span);
  (next, mk(span, ExprKind::Binary { op, lhs, rhs }))
}

/// Right-associative: `2 ** 3 ** 2 == 2 ** (3 ** 2)`.
fn parse_power(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Expr) {
  let (mut cur, lhs) = parse_cast(cur, diags);
  if cur.eat_text("**") {
    let (next, rhs) = parse_power(cur, diags);
    let span = Span::between(lhs.span, rhs.span);
    return (next, mk(span, ExprKind::Binary { op: BinOp::Pow, lhs, rhs }));
  }
  (cur, lhs)
}

fn parse_cast(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Expr) {
  let (mut cur, mut lhs) = parse_unary(cur, diags);
  while cur.eat_text("as") {
    let (next, ty) = types::parse_type(cur, diags);
    cur = next;
    let span = Span::between(lhs.span, ty.span);
    lhs = mk(span, ExprKind::Cast { expr: lhs, ty });
  }
  (cur, lhs)
}

fn parse_unary(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, Expr) {
  let start = cur.span();
  if cur.eat_text("-") {
    let (next, e) = parse_unary(cur, diags);
    return (next, mk(Span::between(start, e.span), ExprKind::Unary { op: UnOp::Neg, expr: e }));
  }
  if cur.eat_text("not") {
    let (next, e) = parse_unary(cur, diags);
    return (next, mk(Span::between(start, e.span), ExprKind::Unary { op: UnOp::Not, expr: e }));
  }
  if cur.eat_text("~") {
    let (next, e) = parse_unary(cur, diags);
    return (next, mk(Span::between(start, e.span), ExprKind::Unary { op: UnOp::BitNot, expr: e }));
  }
  if cur.eat_text("*") {
    let (next, e) = parse_unary(cur, diags);
    return (next, mk(Span::between(start, e.span), ExprKind::Deref(e)));
  }
  if cur.eat_text("&") {
    let perm = if cur.eat_text("!") { Permission::Unique }
      else if cur.eat_text("%") { Permission::Shared }
      else { Permission::Const };
    let (next, e) = parse_unary(cur, diags);
    return (next, mk(Span::between(start, e.span), ExprKind::AddrOf { expr: e, perm }));
  }
  if cur.eat_text("move") {
    let (next, e) = parse_unary(cur, diags);
    return (next, mk(Span::between(start, e.span), ExprKind::Move(e)));
  }
  if cur.eat_text("^") {
    let (next, e) = parse_unary(cur, diags);
    return (next, mk(Span::between(start, e.span), ExprKind::Alloc(e)));
  }
  parse_postfix(cur, diags)
}

fn parse_postfix(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Expr) {
  let (mut cur, mut e) = parse_primary(cur, diags);
  loop {
    if cur.eat_text(".") {
      if cur.peek().kind == crate::lexer_api::TokenKind::IntLiteral {
        let idx: u32 = resolve(cur.symbol_text()).parse().unwrap_or(0);
        let sp = cur.span();
        cur.bump();
        e = mk(Span::between(e.span, sp), ExprKind::TupleAccess { base: e, index: idx });
        continue;
      }
      let name = cur.symbol_text();
      let name_sp = cur.span();
      cur.bump();
      if cur.is_text("(") || cur.is_text("<") {
        let (next, generic_args) = maybe_generic_args(cur, diags);
        let (next, args) = parse_arg_list(next, diags);
        let close = next.span();
        e = mk(Span::between(e.span, close), ExprKind::MethodCall { receiver: e, method: name, generic_args, args });
        cur = next;
        continue;
      }
      e = mk(Span::between(e.span, name_sp), ExprKind::Field { base: e, name });
      continue;
    }
    if cur.eat_text("?") {
      let sp = e.span;
      e = mk(sp, ExprKind::Propagate(e));
      continue;
    }
    if cur.is_text("[") {
      cur.bump();
      let (next, idx) = parse_expr(cur, diags, true);
      let mut next = next;
      let close = next.span();
      next.expect_text("]", diags, codes::SYNTAX_ERROR);
      e = mk(Span::between(e.span, close), ExprKind::Index { base: e, index: idx });
      cur = next;
      continue;
    }
    if cur.is_text("(") {
      let (next, args) = parse_arg_list(cur, diags);
      let close = next.span();
      e = mk(Span::between(e.span, close), ExprKind::Call { callee: e, args });
      cur = next;
      continue;
    }
    break;
  }
  (cur, e)
}

fn maybe_generic_args(cur: Cursor, diags: &mut DiagSink) -> (Cursor, Vec<TypeExpr>) {
  if !cur.is_text("<") { return (cur, Vec::new()) }
  // Method generic args are always followed by a paren argument list, so
  // (unlike a path's generic args) there's no comparison ambiguity here;
  // a direct parse suffices.
  let mut cur = cur;
  cur.bump();
  let mut args = Vec::new();
  while !cur.is_text(">") && !cur.is_text(">>") && !cur.at_eof() {
    let (next, ty) = types::parse_type(cur, diags);
    cur = next;
    args.push(ty);
    if !cur.eat_text(",") { break }
  }
  cur.eat_gt();
  (cur, args)
}

fn parse_arg_list(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, Vec<Expr>) {
  cur.expect_text("(", diags, codes::SYNTAX_ERROR);
  let mut args = Vec::new();
  while !cur.is_text(")") && !cur.at_eof() {
    let (next, arg) = parse_expr(cur, diags, true);
    cur = next;
    args.push(arg);
    let comma_line = cur.peek().line;
    if !cur.eat_text(",") { break }
    if cur.is_text(")") && !cur.begins_later_line_than(comma_line) {
      diags.emit(Diagnostic::error(codes::BAD_TRAILING_COMMA, cur.span(),
        "trailing comma must be followed by a closing delimiter on a later line"));
    }
  }
  cur.expect_text(")", diags, codes::SYNTAX_ERROR);
  (cur, args)
}

fn parse_primary(mut cur: Cursor, diags: &mut DiagSink) -> (Cursor, Expr) {
  use crate::lexer_api::TokenKind;
  let start = cur.span();
  let tok = cur.peek().clone();
  match tok.kind {
    TokenKind::IntLiteral => {
      let v: i128 = resolve(tok.text).replace('_', "").parse().unwrap_or(0);
      cur.bump();
      (cur, mk(start, ExprKind::Literal(Literal::Int(v))))
    }
    TokenKind::FloatLiteral => {
      let v: f64 = resolve(tok.text).parse().unwrap_or(0.0);
      cur.bump();
      (cur, mk(start, ExprKind::Literal(Literal::Float(v))))
    }
    TokenKind::StringLiteral => { cur.bump(); (cur, mk(start, ExprKind::Literal(Literal::Str(tok.text)))) }
    TokenKind::CharLiteral => {
      let c = resolve(tok.text).chars().next().unwrap_or('\0');
      cur.bump();
      (cur, mk(start, ExprKind::Literal(Literal::Char(c))))
    }
    TokenKind::BoolLiteral => {
      let b = resolve(tok.text) == "true";
      cur.bump();
      (cur, mk(start, ExprKind::Literal(Literal::Bool(b))))
    }
    TokenKind::NullLiteral => { cur.bump(); (cur, mk(start, ExprKind::Literal(Literal::Null))) }
    _ => parse_keyword_or_path_primary(cur, diags, start),
  }
}

fn parse_keyword_or_path_primary(mut cur: Cursor, diags: &mut DiagSink, start: Span) -> (Cursor, Expr) {
  if cur.eat_text("(") { return parse_paren_or_tuple(cur, diags, start) }
  if cur.eat_text("[") { return parse_array_like(cur, diags, start) }
  if cur.eat_text("{") {
    let (next, block) = parse_block_after_brace(cur, diags, start);
    return (next, mk(block.span, ExprKind::Block(block)));
  }
  if cur.eat_text("unsafe") {
    cur.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (next, block) = parse_block_after_brace(cur, diags, start);
    return (next, mk(Span::between(start, block.span), ExprKind::UnsafeBlock(block)));
  }
  if cur.eat_text("if") { return parse_if(cur, diags, start) }
  if cur.eat_text("match") { return parse_match(cur, diags, start) }
  if cur.eat_text("loop") {
    cur.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (next, body) = parse_block_after_brace(cur, diags, start);
    let span = Span::between(start, body.span);
    return (next, mk(span, ExprKind::Loop { form: LoopForm::Infinite, body, label: None }));
  }
  if cur.eat_text("while") {
    let (next, cond) = parse_expr(cur, diags, false);
    let mut next = next;
    next.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (next, body) = parse_block_after_brace(next, diags, start);
    let span = Span::between(start, body.span);
    return (next, mk(span, ExprKind::Loop { form: LoopForm::While(cond), body, label: None }));
  }
  if cur.eat_text("for") {
    let (next, pat) = super::pattern::parse_pattern(cur, diags);
    let mut next = next;
    next.expect_text("in", diags, codes::SYNTAX_ERROR);
    let (next, iter) = parse_expr(next, diags, false);
    let mut next = next;
    next.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (next, body) = parse_block_after_brace(next, diags, start);
    let span = Span::between(start, body.span);
    return (next, mk(span, ExprKind::Loop { form: LoopForm::For { pat, iter }, body, label: None }));
  }
  if cur.eat_text("sizeof") {
    cur.expect_text("(", diags, codes::SYNTAX_ERROR);
    let (next, ty) = types::parse_type(cur, diags);
    let mut next = next;
    let close = next.span();
    next.expect_text(")", diags, codes::SYNTAX_ERROR);
    return (next, mk(Span::between(start, close), ExprKind::Sizeof(ty)));
  }
  if cur.eat_text("alignof") {
    cur.expect_text("(", diags, codes::SYNTAX_ERROR);
    let (next, ty) = types::parse_type(cur, diags);
    let mut next = next;
    let close = next.span();
    next.expect_text(")", diags, codes::SYNTAX_ERROR);
    return (next, mk(Span::between(start, close), ExprKind::Alignof(ty)));
  }
  if cur.eat_text("transmute") {
    cur.expect_text("(", diags, codes::SYNTAX_ERROR);
    let (next, e) = parse_expr(cur, diags, true);
    let mut next = next;
    next.expect_text(",", diags, codes::SYNTAX_ERROR);
    let (next, ty) = types::parse_type(next, diags);
    let mut next = next;
    let close = next.span();
    next.expect_text(")", diags, codes::SYNTAX_ERROR);
    return (next, mk(Span::between(start, close), ExprKind::Transmute { expr: e, ty }));
  }
  if cur.eat_text("yield") {
    if cur.eat_text("release") {
      let (next, e) = parse_expr(cur, diags, true);
      return (next, mk(Span::between(start, e.span), ExprKind::YieldRelease(e)));
    }
    if cur.eat_text("from") {
      let (next, e) = parse_expr(cur, diags, true);
      return (next, mk(Span::between(start, e.span), ExprKind::YieldFrom(e)));
    }
    let (next, e) = parse_expr(cur, diags, true);
    return (next, mk(Span::between(start, e.span), ExprKind::Yield(e)));
  }
  if cur.eat_text("sync") {
    cur.expect_text("(", diags, codes::SYNTAX_ERROR);
    let (next, e) = parse_expr(cur, diags, true);
    let mut next = next;
    let close = next.span();
    next.expect_text(")", diags, codes::SYNTAX_ERROR);
    return (next, mk(Span::between(start, close), ExprKind::Sync(e)));
  }
  if cur.eat_text("wait") {
    cur.expect_text("(", diags, codes::SYNTAX_ERROR);
    let (next, e) = parse_expr(cur, diags, true);
    let mut next = next;
    let close = next.span();
    next.expect_text(")", diags, codes::SYNTAX_ERROR);
    return (next, mk(Span::between(start, close), ExprKind::Wait(e)));
  }
  if cur.eat_text("race") {
    cur.expect_text("{", diags, codes::SYNTAX_ERROR);
    let mut arms = Vec::new();
    while !cur.is_text("}") && !cur.at_eof() {
      let (next, e) = parse_expr(cur, diags, true);
      cur = next;
      arms.push(e);
      if !cur.eat_text(",") { break }
    }
    let close = cur.span();
    cur.expect_text("}", diags, codes::SYNTAX_ERROR);
    return (cur, mk(Span::between(start, close), ExprKind::Race(arms)));
  }
  if cur.eat_text("all") {
    cur.expect_text("(", diags, codes::SYNTAX_ERROR);
    let mut arms = Vec::new();
    while !cur.is_text(")") && !cur.at_eof() {
      let (next, e) = parse_expr(cur, diags, true);
      cur = next;
      arms.push(e);
      if !cur.eat_text(",") { break }
    }
    let close = cur.span();
    cur.expect_text(")", diags, codes::SYNTAX_ERROR);
    return (cur, mk(Span::between(start, close), ExprKind::All(arms)));
  }
  if cur.eat_text("parallel") {
    let (next, domain) = parse_postfix(cur, diags);
    let mut next = next;
    next.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (next, body) = parse_block_after_brace(next, diags, start);
    let span = Span::between(start, body.span);
    return (next, mk(span, ExprKind::Parallel { domain, body }));
  }
  if cur.eat_text("spawn") {
    let by_move = cur.eat_text("move");
    let (next, body) = parse_expr(cur, diags, true);
    let span = Span::between(start, body.span);
    return (next, mk(span, ExprKind::Spawn { by_move, body }));
  }
  if cur.eat_text("dispatch") {
    let var = cur.symbol_text();
    cur.bump();
    cur.expect_text("in", diags, codes::SYNTAX_ERROR);
    let (next, range) = parse_expr(cur, diags, false);
    let mut next = next;
    let options = parse_dispatch_options(&mut next, diags);
    next.expect_text("{", diags, codes::SYNTAX_ERROR);
    let (next, body) = parse_block_after_brace(next, diags, start);
    let span = Span::between(start, body.span);
    return (next, mk(span, ExprKind::Dispatch { var, range, options, body }));
  }
  parse_path_or_literal_primary(cur, diags, start)
}

fn parse_if(cur: Cursor, diags: &mut DiagSink, start: Span) -> (Cursor, Expr) {
  let outer_allow_brace = cur.allow_brace;
  let (next, cond) = parse_expr(cur, diags, false);
  let mut next = next;
  next.expect_text("{", diags, codes::SYNTAX_ERROR);
  let (next, then_block) = parse_block_after_brace(next, diags, start);
  let mut next = next;
  next.allow_brace = outer_allow_brace;
  let then_branch = mk(then_block.span, ExprKind::Block(then_block));
  let else_branch = if next.eat_text("else") {
    if next.is_text("if") {
      next.bump();
      let if_span = next.span();
      let (n, e) = parse_if(next, diags, if_span);
      next = n;
      Some(e)
    } else {
      next.expect_text("{", diags, codes::SYNTAX_ERROR);
      let (n, b) = parse_block_after_brace(next, diags, start);
      next = n;
      Some(mk(b.span, ExprKind::Block(b)))
    }
  } else { None };
  let span = Span::between(start, next.span());
  (next, mk(span, ExprKind::If { cond, then_branch, else_branch }))
}

fn parse_match(mut cur: Cursor, diags: &mut DiagSink, start: Span) -> (Cursor, Expr) {
  let (next, scrutinee) = parse_expr(cur, diags, false);
  cur = next;
  cur.expect_text("{", diags, codes::SYNTAX_ERROR);
  cur.skip_newlines();
  let mut arms = Vec::new();
  while !cur.is_text("}") && !cur.at_eof() {
    let (next, pattern) = super::pattern::parse_pattern(cur, diags);
    cur = next;
    let guard = if cur.eat_text("if") {
      let (n, g) = parse_expr(cur, diags, false);
      cur = n;
      Some(g)
    } else { None };
    cur.expect_text("=>", diags, codes::SYNTAX_ERROR);
    let (next, body) = parse_expr(cur, diags, true);
    cur = next;
    arms.push(MatchArm { pattern, guard, body });
    if !cur.eat_text(",") { cur.skip_newlines() }
    cur.skip_newlines();
  }
  let close = cur.span();
  cur.expect_text("}", diags, codes::SYNTAX_ERROR);
  (cur, mk(Span::between(start, close), ExprKind::Match { scrutinee, arms }))
}

fn parse_dispatch_options(cur: &mut Cursor, diags: &mut DiagSink) -> DispatchOptions {
  let mut opts = DispatchOptions::default();
  if !cur.eat_text("[") { return opts }
  loop {
    if cur.eat_text("reduce") {
      cur.expect_text(":", diags, codes::SYNTAX_ERROR);
      opts.reduce = Some(cur.symbol_text());
      cur.bump();
    } else if cur.eat_text("ordered") {
      opts.ordered = true;
    } else if cur.eat_text("chunk") {
      cur.expect_text(":", diags, codes::SYNTAX_ERROR);
      let (next, e) = parse_expr(cur.clone(), diags, true);
      *cur = next;
      opts.chunk = Some(e);
    } else {
      break;
    }
    if !cur.eat_text(",") { break }
  }
  cur.expect_text("]", diags, codes::SYNTAX_ERROR);
  opts
}

fn parse_record_literal(mut cur: Cursor, diags: &mut DiagSink, start: Span, path: Path) -> (Cursor, Expr) {
  cur.bump(); // `{`
  let mut fields = Vec::new();
  while !cur.is_text("}") && !cur.at_eof() {
    let fsp = cur.span();
    let name = cur.symbol_text();
    cur.bump();
    cur.expect_text(":", diags, codes::SYNTAX_ERROR);
    let (next, value) = parse_expr(cur, diags, true);
    cur = next;
    fields.push(RecordField { name, value, span: fsp });
    let comma_line = cur.peek().line;
    if !cur.eat_text(",") { break }
    if cur.is_text("}") && !cur.begins_later_line_than(comma_line) {
      diags.emit(Diagnostic::error(codes::BAD_TRAILING_COMMA, cur.span(),
        "trailing comma must be followed by a closing delimiter on a later line"));
    }
  }
  let close = cur.span();
  cur.expect_text("}", diags, codes::SYNTAX_ERROR);
  (cur, mk(Span::between(start, close), ExprKind::RecordLiteral { path, fields }))
}

fn parse_path_or_literal_primary(cur: Cursor, diags: &mut DiagSink, start: Span) -> (Cursor, Expr) {
  // Path (possibly a record/enum/modal literal when braces are allowed).
  let (mut next, path) = types::parse_path(cur, diags);
  if next.allow_brace && next.is_text("{") {
    return parse_record_literal(next, diags, start, path);
  }
  if next.eat_text("::") {
    let variant = next.symbol_text();
    next.bump();
    if next.is_text("(") {
      let (n2, args) = parse_arg_list(next, diags);
      let span = Span::between(start, n2.span());
      return (n2, mk(span, ExprKind::EnumLiteral { path, variant, payload: Some(args) }));
    }
    let span = Span::between(start, next.span());
    return (next, mk(span, ExprKind::EnumLiteral { path, variant, payload: None }));
  }
  if next.is_text("(") {
    let (n2, args) = parse_arg_list(next, diags);
    let span = Span::between(start, n2.span());
    return (n2, mk(span, ExprKind::QualifiedApply { path, args }));
  }
  let span = path.span;
  (next, mk(span, ExprKind::Path(path)))
}

/// Resolves the paren-vs-tuple ambiguity (spec §4.1): `(e)` is a
/// parenthesized expression, `(e,)` a one-element tuple, `(e, e, ...)`
/// an n-element tuple. A one-token lookahead at paren-depth 1 decides.
fn parse_paren_or_tuple(cur: Cursor, diags: &mut DiagSink, start: Span) -> (Cursor, Expr) {
  let mut cur = cur;
  if cur.eat_text(")") {
    let span = Span::between(start, cur.span());
    return (cur, mk(span, ExprKind::TupleLiteral(Vec::new())));
  }
  let (mut next, first) = parse_expr(cur, diags, true);
  if next.eat_text(",") {
    let mut elems = vec![first];
    while !next.is_text(")") && !next.at_eof() {
      let (n2, e) = parse_expr(next, diags, true);
      next = n2;
      elems.push(e);
      if !next.eat_text(",") { break }
    }
    let close = next.span();
    next.expect_text(")", diags, codes::SYNTAX_ERROR);
    return (next, mk(Span::between(start, close), ExprKind::TupleLiteral(elems)));
  }
  let close = next.span();
  next.expect_text(")", diags, codes::SYNTAX_ERROR);
  // A parenthesized expression keeps its own span covering the parens,
  // not just the inner expression (spec §8 invariant 2: composite spans
  // strictly cover their children).
  let span = Span::between(start, close);
  let kind = (*first.kind).clone();
  (next, mk(span, kind))
}

fn parse_array_like(cur: Cursor, diags: &mut DiagSink, start: Span) -> (Cursor, Expr) {
  let mut cur = cur;
  if cur.eat_text("]") {
    let span = Span::between(start, cur.span());
    return (cur, mk(span, ExprKind::ArrayLiteral(Vec::new())));
  }
  let (mut next, first) = parse_expr(cur, diags, true);
  if next.eat_text(";") {
    let (n2, count) = parse_expr(next, diags, true);
    next = n2;
    let close = next.span();
    next.expect_text("]", diags, codes::SYNTAX_ERROR);
    return (next, mk(Span::between(start, close), ExprKind::ArrayRepeat { value: first, count }));
  }
  let mut elems = vec![first];
  while next.eat_text(",") {
    if next.is_text("]") { break }
    let (n2, e) = parse_expr(next, diags, true);
    next = n2;
    elems.push(e);
  }
  let close = next.span();
  next.expect_text("]", diags, codes::SYNTAX_ERROR);
  (next, mk(Span::between(start, close), ExprKind::ArrayLiteral(elems)))
}

pub(super) fn parse_block_after_brace(cur: Cursor, diags: &mut DiagSink, start: Span) -> (Cursor, Block) {
  let mut cur = cur;
  let mut stmts = Vec::new();
  let mut tail = None;
  cur.skip_newlines();
  while !cur.is_text("}") && !cur.at_eof() {
    let before = cur.token_pos();
    let (next, stmt_or_tail) = super::item::parse_stmt(cur, diags);
    cur = next;
    match stmt_or_tail {
      super::item::StmtOrTail::Stmt(s) => stmts.push(s),
      super::item::StmtOrTail::Tail(e) => { tail = Some(e); break }
    }
    cur.skip_newlines();
    if cur.token_pos() == before { cur.bump(); }
  }
  let close = cur.span();
  cur.expect_text("}", diags, codes::SYNTAX_ERROR);
  (cur, Block { stmts, tail, span: Span::between(start, close) })
}

fn mk(span: Span, kind: ExprKind) -> Expr { Expr { span, kind: std::boxed::Box::new(kind) } }
