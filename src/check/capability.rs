//! Capability and purity classification (spec §4.3 "Capabilities and
//! purity"): a procedure is pure iff none of its parameters carry a
//! capability, and `extern` procedures may not accept one at all.

use crate::ast::{Procedure, TypeExprKind};
use crate::diagnostics::{codes, Diagnostic};

use super::TypeChecker;

const CAPABILITY_NAMES: &[&str] = &["FileSystem", "HeapAllocator", "ExecutionDomain", "Reactor"];

fn is_capability_type(_checker: &TypeChecker, ty: &crate::ast::TypeExpr) -> bool {
  match &*ty.kind {
    TypeExprKind::Permission { perm: crate::ast::Permission::Unique, .. } => true,
    TypeExprKind::Opaque(path) | TypeExprKind::Dynamic(path) | TypeExprKind::Path(path) => {
      path.segments.last().is_some_and(|&seg| {
        let name = crate::symbol::resolve(seg);
        CAPABILITY_NAMES.contains(&name.as_str())
      })
    }
    _ => false,
  }
}

/// Whether `proc` takes no capability-typed parameters. A pure
/// procedure's contract can be checked without worrying about
/// observable side effects between `pre` and `post` (spec §4.3).
pub fn is_pure(checker: &TypeChecker, proc: &Procedure) -> bool {
  proc.params.iter().all(|p| !is_capability_type(checker, &p.ty))
}

pub fn check_purity(checker: &mut TypeChecker, proc: &Procedure, is_extern: bool) {
  if !is_extern { return }
  for param in &proc.params {
    if is_capability_type(checker, &param.ty) {
      checker.diags.emit(Diagnostic::error(
        codes::CAPABILITY_IN_EXTERN,
        param.span,
        format!("`extern` procedure `{}` cannot take a capability parameter", crate::symbol::resolve(proc.name)),
      ));
    }
  }
}
