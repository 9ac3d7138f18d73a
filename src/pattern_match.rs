//! Pattern exhaustiveness and reachability (spec §4.3.1). The full
//! usefulness algorithm (covering matrices with column specialization
//! over products of open-ended nominal shapes) is more machinery than
//! this pipeline needs: the surface grammar's patterns decompose into
//! "wildcard-like" (always covers), "named-variant-like" (covers one
//! declared case), and literal ranges, so a flat covered-set against
//! the declared case set catches the exhaustiveness gap the spec
//! actually asks for, at the cost of not reasoning about nested
//! refinement (e.g. two tuple patterns whose union is exhaustive even
//! though neither alone is) — `generics.rs`'s divergence guard has the
//! same kind of soundness-for-scope tradeoff, noted there and in
//! DESIGN.md.

use crate::ast::{Literal, MatchArm, Pattern, PatternKind};
use crate::check::TypeChecker;
use crate::diagnostics::{codes, Diagnostic};
use crate::resolve::sigma::SigmaDecl;
use crate::span::Span;
use crate::symbol::Symbol;
use crate::types::intern::TyKind;

/// True if `pat` matches every value of its type unconditionally,
/// i.e. it is a wildcard or a plain (untyped) binding.
fn is_catchall(pat: &Pattern) -> bool {
  matches!(&*pat.kind, PatternKind::Wildcard | PatternKind::Identifier { .. })
}

fn covered_case(pat: &Pattern) -> Option<Symbol> {
  match &*pat.kind {
    PatternKind::Enum { variant, .. } => Some(*variant),
    PatternKind::Modal { state, .. } => Some(*state),
    _ => None,
  }
}

pub fn check_exhaustive(checker: &mut TypeChecker, scrutinee_span: Span, arms: &[MatchArm]) {
  check_shadowed_arms(checker, arms);

  let mut covered = std::collections::HashSet::new();
  let mut has_catchall = false;
  for arm in arms {
    if arm.guard.is_some() { continue } // a guarded arm never counts toward exhaustiveness
    if is_catchall(&arm.pattern) { has_catchall = true; continue }
    if let Some(case) = covered_case(&arm.pattern) { covered.insert(case); }
    if matches!(&*arm.pattern.kind, PatternKind::Literal(Literal::Bool(_))) {
      if let PatternKind::Literal(Literal::Bool(b)) = &*arm.pattern.kind {
        covered.insert(crate::symbol::intern(if *b { "true" } else { "false" }));
      }
    }
  }
  if has_catchall { return }

  let Some(&scrutinee_ty) = checker.node_types.get(&scrutinee_span) else { return };
  let all_cases = match checker.types.kind(scrutinee_ty).clone() {
    TyKind::Prim(crate::ast::PrimTy::Bool) => {
      vec![crate::symbol::intern("true"), crate::symbol::intern("false")]
    }
    TyKind::Nominal { sigma, .. } | TyKind::ModalState { base: sigma, .. } => {
      match &checker.sigma.get(sigma).decl {
        SigmaDecl::Enum(e) => e.variants.iter().map(|v| v.name).collect(),
        SigmaDecl::Modal(m) => m.states.iter().map(|s| s.name).collect(),
        _ => return,
      }
    }
    // Other scrutinee shapes (tuples, strings, ints, ...) have no finite
    // case enumeration this checker can name; leaving them unchecked
    // matches the spec's own note that exhaustiveness is guaranteed
    // only for enum/modal/bool scrutinees.
    _ => return,
  };

  if all_cases.iter().any(|c| !covered.contains(c)) {
    checker.diags.emit(Diagnostic::warning(
      codes::W_NON_EXHAUSTIVE,
      scrutinee_span,
      "match does not cover every case; add a wildcard arm or the missing cases",
    ));
  }
}

fn check_shadowed_arms(checker: &mut TypeChecker, arms: &[MatchArm]) {
  let mut seen_catchall = false;
  for arm in arms {
    if seen_catchall {
      checker.diags.emit(Diagnostic::warning(
        codes::W_SHADOWED_ARM,
        arm.pattern.span,
        "unreachable match arm: a preceding arm already covers every case",
      ));
    }
    if arm.guard.is_none() && is_catchall(&arm.pattern) {
      seen_catchall = true;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::idx::Idx;
  use crate::ast::{Expr, ExprKind};
  use crate::resolve::sigma::Sigma;
  use crate::resolve::ValueTable;
  use crate::diagnostics::DiagSink;
  use crate::span::FileId;

  fn sp() -> Span { Span::dummy(FileId::from_usize(0)) }
  fn unit_expr() -> Expr { Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::TupleLiteral(Vec::new())) } }
  fn pat(kind: PatternKind) -> Pattern { Pattern { span: sp(), kind: std::boxed::Box::new(kind) } }

  #[test]
  fn bool_match_without_both_arms_warns() {
    let sigma = Sigma::new();
    let values = ValueTable::new();
    let mut diags = DiagSink::new();
    let mut checker = TypeChecker::new(&sigma, &values, &mut diags);
    let scrutinee_ty = checker.types.intern(TyKind::Prim(crate::ast::PrimTy::Bool));
    checker.node_types.insert(sp(), scrutinee_ty);
    let arms = vec![MatchArm { pattern: pat(PatternKind::Literal(Literal::Bool(true))), guard: None, body: unit_expr() }];
    check_exhaustive(&mut checker, sp(), &arms);
    assert_eq!(diags.diagnostics().len(), 1);
    assert_eq!(diags.diagnostics()[0].code, codes::W_NON_EXHAUSTIVE);
  }

  #[test]
  fn catchall_arm_satisfies_exhaustiveness() {
    let sigma = Sigma::new();
    let values = ValueTable::new();
    let mut diags = DiagSink::new();
    let mut checker = TypeChecker::new(&sigma, &values, &mut diags);
    let scrutinee_ty = checker.types.intern(TyKind::Prim(crate::ast::PrimTy::Bool));
    checker.node_types.insert(sp(), scrutinee_ty);
    let arms = vec![MatchArm { pattern: pat(PatternKind::Wildcard), guard: None, body: unit_expr() }];
    check_exhaustive(&mut checker, sp(), &arms);
    assert_eq!(diags.diagnostics().len(), 0);
  }

  #[test]
  fn arm_after_catchall_is_shadowed() {
    let sigma = Sigma::new();
    let values = ValueTable::new();
    let mut diags = DiagSink::new();
    let mut checker = TypeChecker::new(&sigma, &values, &mut diags);
    let arms = vec![
      MatchArm { pattern: pat(PatternKind::Wildcard), guard: None, body: unit_expr() },
      MatchArm { pattern: pat(PatternKind::Literal(Literal::Bool(true))), guard: None, body: unit_expr() },
    ];
    check_exhaustive(&mut checker, sp(), &arms);
    assert!(diags.diagnostics().iter().any(|d| d.code == codes::W_SHADOWED_ARM));
  }
}
