//! Place typing (spec §4.3 "Places and permissions"): an lvalue-capable
//! expression synthesizes both a type and the permission under which it
//! is currently accessible, since `unique x.field` and `const x.field`
//! read the same storage through different contracts.

use crate::ast::{Expr, ExprKind, Permission};
use crate::diagnostics::{codes, Diagnostic};
use crate::resolve::sigma::SigmaDecl;
use crate::types::intern::{TyId, TyKind};

use super::expr::synth_expr;
use super::TypeChecker;

/// `(type, permission)` for a place expression. Non-place expressions
/// (anything that isn't itself storage, e.g. a literal or a call) are
/// treated as `const` rvalues: they can be read but not written back
/// through, which is exactly `Permission::Const`'s contract.
pub fn check_place(checker: &mut TypeChecker, expr: &Expr) -> (TyId, Permission) {
  let (ty, perm) = check_place_inner(checker, expr);
  checker.node_types.insert(expr.span, ty);
  (ty, perm)
}

fn check_place_inner(checker: &mut TypeChecker, expr: &Expr) -> (TyId, Permission) {
  match &*expr.kind {
    ExprKind::Identifier(name) => {
      if let Some(&ty) = checker.locals.get(name) {
        return unwrap_permission(checker, ty);
      }
      if let Some(value_id) = checker.values.lookup(&[*name]) {
        if let crate::resolve::scope::ValueKind::Static { ty: Some(ty), .. } = &checker.values.get(value_id).kind {
          let ty = ty.clone();
          let ty = checker.lower_type(&ty);
          return unwrap_permission(checker, ty);
        }
      }
      checker.diags.emit(Diagnostic::error(codes::UNRESOLVED_REFERENCE, expr.span, "unknown identifier"));
      (checker.types.intern(TyKind::Error), Permission::Const)
    }
    ExprKind::Path(path) => {
      if let Some(value_id) = checker.values.lookup(&path.segments) {
        if let crate::resolve::scope::ValueKind::Static { ty: Some(ty), .. } = &checker.values.get(value_id).kind {
          let ty = ty.clone();
          let ty = checker.lower_type(&ty);
          return unwrap_permission(checker, ty);
        }
      }
      (checker.types.intern(TyKind::Error), Permission::Const)
    }
    ExprKind::Field { base, name } => {
      let (base_ty, perm) = check_place(checker, base);
      let field_ty = field_type(checker, base_ty, *name).unwrap_or_else(|| {
        checker.diags.emit(Diagnostic::error(codes::OPERATOR_TYPE_MISMATCH, expr.span, "no such field"));
        checker.types.intern(TyKind::Error)
      });
      (field_ty, perm)
    }
    ExprKind::TupleAccess { base, index } => {
      let (base_ty, perm) = check_place(checker, base);
      let elem = match checker.types.kind(base_ty).clone() {
        TyKind::Tuple(elems) => elems.get(*index as usize).copied(),
        _ => None,
      };
      (elem.unwrap_or_else(|| checker.types.intern(TyKind::Error)), perm)
    }
    ExprKind::Index { base, index } => {
      let (base_ty, perm) = check_place(checker, base);
      synth_expr(checker, index);
      let elem = match checker.types.kind(base_ty).clone() {
        TyKind::Slice(e) | TyKind::Array { elem: e, .. } => Some(e),
        _ => None,
      };
      (elem.unwrap_or_else(|| checker.types.intern(TyKind::Error)), perm)
    }
    ExprKind::Deref(inner) => {
      let inner_ty = synth_expr(checker, inner);
      match checker.types.kind(inner_ty).clone() {
        TyKind::Ptr { inner, .. } | TyKind::RawPtr { inner, .. } => unwrap_permission(checker, inner),
        _ => {
          checker.diags.emit(Diagnostic::error(codes::OPERATOR_TYPE_MISMATCH, expr.span, "cannot dereference a non-pointer type"));
          (checker.types.intern(TyKind::Error), Permission::Const)
        }
      }
    }
    // Anything else is an rvalue: synthesize its type and treat it as
    // `const`-accessible storage, matching how the spec allows `&const`
    // of a temporary but not `&unique`/`&shared` of one.
    _ => (synth_expr(checker, expr), Permission::Const),
  }
}

fn unwrap_permission(checker: &mut TypeChecker, ty: TyId) -> (TyId, Permission) {
  match checker.types.kind(ty).clone() {
    TyKind::Permission { perm, inner } => (inner, perm),
    _ => (ty, Permission::Const),
  }
}

fn field_type(checker: &mut TypeChecker, base_ty: TyId, name: crate::symbol::Symbol) -> Option<TyId> {
  let sigma_id = match checker.types.kind(base_ty).clone() {
    TyKind::Nominal { sigma, .. } => sigma,
    TyKind::ModalState { base, .. } => base,
    _ => return None,
  };
  let entry = checker.sigma.get(sigma_id);
  match &entry.decl {
    SigmaDecl::Record(r) => {
      let field = r.fields.iter().find(|f| f.name == name)?.ty.clone();
      Some(checker.lower_type(&field))
    }
    _ => None,
  }
}
