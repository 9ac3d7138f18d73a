//! Async frame synthesis (spec §4.5 "Async procedures"): scans a
//! procedure body for its yield points and produces the frame layout a
//! later lowering stage needs to turn the body into a resumable state
//! machine, the same "collect suspension points, then build one struct
//! that can represent being stopped at any of them" shape the spec's
//! reactor model calls for.

use crate::ast::*;
use crate::check::capability::is_pure;
use crate::check::TypeChecker;
use crate::diagnostics::{codes, Diagnostic};
use crate::span::Span;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SuspensionKind { Yield, YieldRelease, YieldFrom }

pub struct SuspensionPoint {
  pub kind: SuspensionKind,
  pub span: Span,
}

#[derive(Default)]
pub struct AsyncFrameSpec {
  pub suspensions: Vec<SuspensionPoint>,
}

impl AsyncFrameSpec {
  /// How many distinct resume states the frame needs: one per
  /// suspension point, plus the initial (not-yet-started) state.
  pub fn state_count(&self) -> usize {
    self.suspensions.len() + 1
  }
}

/// Builds the frame spec for `proc`'s body, and flags capability holds
/// that cross a `yield` (spec's `KEY_HELD_ACROSS_YIELD`): a `unique`
/// parameter still in scope at a suspension point means a capability
/// is being held open across a point where another task may run.
pub fn build_frame(checker: &mut TypeChecker, proc: &Procedure) -> Option<AsyncFrameSpec> {
  let body = proc.body.as_ref()?;
  let mut spec = AsyncFrameSpec::default();
  collect_suspensions(body, &mut spec);
  if spec.suspensions.is_empty() { return None }

  if !is_pure(checker, proc) {
    for point in &spec.suspensions {
      checker.diags.emit(Diagnostic::warning(
        codes::KEY_HELD_ACROSS_YIELD,
        point.span,
        "a capability parameter may still be held across this suspension point",
      ));
    }
  }
  Some(spec)
}

fn collect_suspensions(expr: &Expr, spec: &mut AsyncFrameSpec) {
  match &*expr.kind {
    ExprKind::Yield(e) => { spec.suspensions.push(SuspensionPoint { kind: SuspensionKind::Yield, span: expr.span }); collect_suspensions(e, spec); }
    ExprKind::YieldRelease(e) => { spec.suspensions.push(SuspensionPoint { kind: SuspensionKind::YieldRelease, span: expr.span }); collect_suspensions(e, spec); }
    ExprKind::YieldFrom(e) => { spec.suspensions.push(SuspensionPoint { kind: SuspensionKind::YieldFrom, span: expr.span }); collect_suspensions(e, spec); }
    ExprKind::Block(b) | ExprKind::UnsafeBlock(b) => collect_suspensions_block(b, spec),
    ExprKind::If { cond, then_branch, else_branch } => {
      collect_suspensions(cond, spec);
      collect_suspensions(then_branch, spec);
      if let Some(e) = else_branch { collect_suspensions(e, spec); }
    }
    ExprKind::Match { scrutinee, arms } => {
      collect_suspensions(scrutinee, spec);
      for arm in arms { collect_suspensions(&arm.body, spec); }
    }
    ExprKind::Loop { body, .. } => collect_suspensions_block(body, spec),
    ExprKind::Binary { lhs, rhs, .. } => { collect_suspensions(lhs, spec); collect_suspensions(rhs, spec); }
    ExprKind::Unary { expr: e, .. } | ExprKind::Cast { expr: e, .. } | ExprKind::Propagate(e)
    | ExprKind::Move(e) | ExprKind::AddrOf { expr: e, .. } | ExprKind::Deref(e) | ExprKind::Sync(e) | ExprKind::Wait(e) => {
      collect_suspensions(e, spec);
    }
    ExprKind::Call { callee, args } => { collect_suspensions(callee, spec); for a in args { collect_suspensions(a, spec); } }
    ExprKind::Field { base, .. } | ExprKind::TupleAccess { base, .. } => collect_suspensions(base, spec),
    ExprKind::Index { base, index } => { collect_suspensions(base, spec); collect_suspensions(index, spec); }
    _ => {}
  }
}

fn collect_suspensions_block(block: &Block, spec: &mut AsyncFrameSpec) {
  for stmt in &block.stmts {
    match &stmt.kind {
      StmtKind::ExprStmt(e) | StmtKind::Result(e) | StmtKind::Defer(e) => collect_suspensions(e, spec),
      StmtKind::Let { init, .. } | StmtKind::ShadowLet { init, .. } => collect_suspensions(init, spec),
      StmtKind::Assign { value, .. } | StmtKind::CompoundAssign { value, .. } => collect_suspensions(value, spec),
      StmtKind::Region { init, body, .. } => { collect_suspensions(init, spec); collect_suspensions_block(body, spec); }
      StmtKind::Frame { body, .. } => collect_suspensions_block(body, spec),
      _ => {}
    }
  }
  if let Some(tail) = &block.tail { collect_suspensions(tail, spec); }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::idx::Idx;
  use crate::diagnostics::DiagSink;
  use crate::resolve::sigma::Sigma;
  use crate::resolve::ValueTable;
  use crate::span::FileId;

  fn sp() -> Span { Span::dummy(FileId::from_usize(0)) }

  #[test]
  fn body_without_yield_has_no_frame() {
    let sigma = Sigma::new();
    let values = ValueTable::new();
    let mut diags = DiagSink::new();
    let mut checker = TypeChecker::new(&sigma, &values, &mut diags);
    let body = Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::TupleLiteral(Vec::new())) };
    let proc = Procedure {
      name: crate::symbol::intern("run"), generics: Vec::new(), where_clause: None,
      params: Vec::new(), ret: None, contract: None, body: Some(body),
    };
    assert!(build_frame(&mut checker, &proc).is_none());
  }

  #[test]
  fn each_yield_becomes_a_suspension_point() {
    let sigma = Sigma::new();
    let values = ValueTable::new();
    let mut diags = DiagSink::new();
    let mut checker = TypeChecker::new(&sigma, &values, &mut diags);
    let unit = || Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::TupleLiteral(Vec::new())) };
    let body = Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::Block(Block {
      stmts: vec![
        Stmt { span: sp(), kind: StmtKind::ExprStmt(Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::Yield(unit())) }) },
      ],
      tail: None,
      span: sp(),
    })) };
    let proc = Procedure {
      name: crate::symbol::intern("run"), generics: Vec::new(), where_clause: None,
      params: Vec::new(), ret: None, contract: None, body: Some(body),
    };
    let spec = build_frame(&mut checker, &proc).expect("should have a frame");
    assert_eq!(spec.state_count(), 2);
  }
}
