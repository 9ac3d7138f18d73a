//! Contract checking (spec §4.3 "Contracts"): `pre` is typed under the
//! parameter environment the procedure body already sees, `post` adds
//! a `result : R` binding on top of it. Both must synthesize `bool`;
//! provability of the clause itself (not just its typing) goes through
//! `refinement::provable`, which is deliberately conservative.

use crate::ast::{Contract, PrimTy};
use crate::diagnostics::{codes, Diagnostic};
use crate::symbol;
use crate::types::intern::{TyId, TyKind};

use super::expr::synth_expr;
use super::refinement::provable;
use super::TypeChecker;

pub fn check_contract(checker: &mut TypeChecker, contract: &Contract, ret: TyId) {
  let bool_ty = checker.types.intern(TyKind::Prim(PrimTy::Bool));

  if let Some(pre) = &contract.pre {
    let ty = synth_expr(checker, pre);
    if ty != bool_ty {
      checker.diags.emit(Diagnostic::error(codes::OPERATOR_TYPE_MISMATCH, pre.span, "`pre` clause must be `bool`"));
    }
  }

  if let Some(post) = &contract.post {
    let result_sym = symbol::intern("result");
    let previous = checker.locals.insert(result_sym, ret);
    let ty = synth_expr(checker, post);
    match previous {
      Some(prev) => { checker.locals.insert(result_sym, prev); }
      None => { checker.locals.remove(&result_sym); }
    }
    if ty != bool_ty {
      checker.diags.emit(Diagnostic::error(codes::OPERATOR_TYPE_MISMATCH, post.span, "`post` clause must be `bool`"));
      return;
    }
    if !provable(post) {
      checker.diags.emit(Diagnostic::error(
        codes::CONTRACT_UNPROVABLE,
        post.span,
        "cannot statically prove this `post` clause holds",
      ));
    }
  }
}
