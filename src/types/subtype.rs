//! Subtyping (spec §4.3): the reflexive-transitive closure of the nine
//! rules enumerated there, checked structurally over interned `TyId`s.

use crate::ast::Permission;
use crate::resolve::sigma::Sigma;

use super::intern::{TyId, TyKind, TypeTable};

/// `a <: b`. Each rule is tried in the order spec §4.3 lists them;
/// the function is not memoized since a subtype check is a leaf
/// operation called a bounded number of times per call site, unlike
/// `TypeTable::intern` which is called on every type mention.
pub fn is_subtype(types: &TypeTable, sigma: &Sigma, a: TyId, b: TyId) -> bool {
  if a == b { return true }
  match (types.kind(a), types.kind(b)) {
    (TyKind::Never, _) => true,
    (TyKind::Permission { perm: pa, inner: ia }, TyKind::Permission { perm: pb, inner: ib }) => {
      pa.le(*pb) && is_subtype(types, sigma, *ia, *ib)
    }
    (TyKind::Permission { inner, .. }, _) => is_subtype(types, sigma, *inner, b),
    (_, TyKind::Permission { perm, inner }) => {
      // An unwrapped (implicitly `const`) value satisfies a permission
      // wrapper only if that wrapper is `const` itself (rule 3).
      *perm == Permission::Const && is_subtype(types, sigma, a, *inner)
    }
    (TyKind::Tuple(xs), TyKind::Tuple(ys)) => {
      xs.len() == ys.len() && xs.iter().zip(ys).all(|(&x, &y)| is_subtype(types, sigma, x, y))
    }
    (TyKind::Array { elem: ea, len: la }, TyKind::Array { elem: eb, len: lb }) => {
      la == lb && is_subtype(types, sigma, *ea, *eb)
    }
    (TyKind::Slice(ea), TyKind::Slice(eb)) => is_subtype(types, sigma, *ea, *eb),
    (TyKind::Func { params: pa, ret: ra }, TyKind::Func { params: pb, ret: rb }) => {
      pa.len() == pb.len()
        // parameters are contravariant
        && pa.iter().zip(pb).all(|(&x, &y)| is_subtype(types, sigma, y, x))
        && is_subtype(types, sigma, *ra, *rb)
    }
    (TyKind::Union(ls), _) => ls.iter().all(|&l| is_subtype(types, sigma, l, b)),
    // `T ≤ ⋃ Rⱼ` iff `T` is equivalent (not merely a subtype) to some
    // `Rⱼ`; since `TypeTable::intern` hash-conses structurally equal
    // types to the same id, equivalence here is just id equality.
    (_, TyKind::Union(rs)) => rs.iter().any(|&r| a == r),
    (TyKind::Refinement { base, .. }, _) => is_subtype(types, sigma, *base, b),
    (TyKind::ModalState { base: ba, args: aa, .. }, TyKind::Nominal { sigma: bs, args: ab }) => {
      ba == bs && aa == ab
    }
    (TyKind::Ptr { inner: ia, state: Some(_) }, TyKind::Ptr { inner: ib, state: None }) => ia == ib,
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::PrimTy;

  #[test]
  fn never_is_subtype_of_everything() {
    let mut types = TypeTable::new();
    let sigma = Sigma::new();
    let never = types.intern(TyKind::Never);
    let i32_ty = types.intern(TyKind::Prim(PrimTy::I32));
    assert!(is_subtype(&types, &sigma, never, i32_ty));
  }

  #[test]
  fn unique_satisfies_const_parameter() {
    let mut types = TypeTable::new();
    let sigma = Sigma::new();
    let i32_ty = types.intern(TyKind::Prim(PrimTy::I32));
    let unique = types.intern(TyKind::Permission { perm: Permission::Unique, inner: i32_ty });
    let const_ty = types.intern(TyKind::Permission { perm: Permission::Const, inner: i32_ty });
    assert!(is_subtype(&types, &sigma, unique, const_ty));
    assert!(!is_subtype(&types, &sigma, const_ty, unique));
  }

  #[test]
  fn function_params_are_contravariant() {
    let mut types = TypeTable::new();
    let sigma = Sigma::new();
    let i32_ty = types.intern(TyKind::Prim(PrimTy::I32));
    let never = types.intern(TyKind::Never);
    let narrow = types.intern(TyKind::Func { params: vec![i32_ty], ret: i32_ty });
    let wide = types.intern(TyKind::Func { params: vec![never], ret: i32_ty });
    // A function accepting `!` accepts strictly less than one accepting `i32`,
    // so it is a subtype of the `i32`-accepting function, not the reverse.
    assert!(is_subtype(&types, &sigma, wide, narrow));
  }
}
