//! Structured concurrency lowering shapes (spec §4.6). `parallel`,
//! `spawn`, and `dispatch` each decompose into the same small set of
//! IR node families (`ir::nodes`); this module is where the surface
//! expression's options (reduction operator, ordering, chunk size) get
//! validated before `ir::lower` builds the actual nodes, mirroring how
//! `check::contract` validates a contract's shape before anything
//! downstream consumes it.

use crate::ast::{DispatchOptions, Expr};
use crate::check::expr::synth_expr;
use crate::check::TypeChecker;
use crate::diagnostics::{codes, Diagnostic};
use crate::span::Span;
use crate::types::intern::TyKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReduceOp { Sum, Product, Min, Max, And, Or }

fn parse_reduce(name: crate::symbol::Symbol) -> Option<ReduceOp> {
  match crate::symbol::resolve(name).as_str() {
    "sum" => Some(ReduceOp::Sum),
    "product" => Some(ReduceOp::Product),
    "min" => Some(ReduceOp::Min),
    "max" => Some(ReduceOp::Max),
    "and" => Some(ReduceOp::And),
    "or" => Some(ReduceOp::Or),
    _ => None,
  }
}

pub struct DispatchPlan {
  pub reduce: Option<ReduceOp>,
  pub ordered: bool,
}

/// Validates a `dispatch` expression's options against its range type:
/// the chunk size (if given) must be an integer, and an unrecognized
/// reduce-operator name is a hard error rather than silently ignored.
pub fn check_dispatch(checker: &mut TypeChecker, range: &Expr, options: &DispatchOptions, span: Span) -> DispatchPlan {
  let range_ty = synth_expr(checker, range);
  if !matches!(checker.types.kind(range_ty), TyKind::Slice(_) | TyKind::Array { .. }) {
    if let crate::ast::ExprKind::Range { .. } = &*range.kind {
      // a bare numeric range is always dispatchable
    } else {
      checker.diags.emit(Diagnostic::error(codes::OPERATOR_TYPE_MISMATCH, range.span, "`dispatch` requires a range or indexable collection"));
    }
  }

  let reduce = options.reduce.and_then(|name| {
    let parsed = parse_reduce(name);
    if parsed.is_none() {
      checker.diags.emit(Diagnostic::error(
        codes::UNRESOLVED_REFERENCE,
        span,
        format!("`{}` is not a known reduce operator", crate::symbol::resolve(name)),
      ));
    }
    parsed
  });

  if let Some(chunk) = &options.chunk {
    let chunk_ty = synth_expr(checker, chunk);
    let is_integer = matches!(
      checker.types.kind(chunk_ty),
      TyKind::Prim(crate::ast::PrimTy::Usize | crate::ast::PrimTy::U32 | crate::ast::PrimTy::U64 | crate::ast::PrimTy::I32 | crate::ast::PrimTy::I64)
    );
    if !is_integer {
      checker.diags.emit(Diagnostic::error(codes::OPERATOR_TYPE_MISMATCH, chunk.span, "`chunk` must be an integer"));
    }
  }

  DispatchPlan { reduce, ordered: options.ordered }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::idx::Idx;
  use crate::ast::{ExprKind, Literal, RangeForm};
  use crate::diagnostics::DiagSink;
  use crate::resolve::sigma::Sigma;
  use crate::resolve::ValueTable;
  use crate::span::FileId;

  fn sp() -> Span { Span::dummy(FileId::from_usize(0)) }

  #[test]
  fn unknown_reduce_operator_is_flagged() {
    let sigma = Sigma::new();
    let values = ValueTable::new();
    let mut diags = DiagSink::new();
    let mut checker = TypeChecker::new(&sigma, &values, &mut diags);
    let from = Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::Literal(Literal::Int(0))) };
    let to = Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::Literal(Literal::Int(10))) };
    let range = Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::Range { form: RangeForm::Exclusive, from: Some(from), to: Some(to) }) };
    let options = DispatchOptions { reduce: Some(crate::symbol::intern("bogus")), ordered: false, chunk: None };
    check_dispatch(&mut checker, &range, &options, sp());
    assert!(diags.diagnostics().iter().any(|d| d.code == codes::UNRESOLVED_REFERENCE));
  }
}
