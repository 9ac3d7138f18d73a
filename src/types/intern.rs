//! Type interning. Every structural type is hash-consed into a
//! [`TypeTable`] and referenced afterward by the cheap, `Copy` [`TyId`]
//! handle, mirroring how `symbol::Interner` hash-conses strings.
//!
//! Refinement types carry a predicate expression that doesn't derive
//! `Hash`/`Eq`, so they are never deduplicated against each other: each
//! `intern_refinement` call allocates a fresh id and records its
//! predicate in a side table, the same accumulate-don't-mutate approach
//! `resolve::Resolver::path_resolutions` uses for path resolutions.

use hashbrown::HashMap;

use crate::ast::{Expr, Permission, PrimTy, RawPtrMut};
use crate::idx::{mk_idx, IdxVec};
use crate::resolve::sigma::SigmaId;
use crate::symbol::Symbol;

mk_idx! {
  /// A stable handle to an interned, structural type.
  pub struct TyId;
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TyKind {
  Prim(PrimTy),
  StringTy(Option<Symbol>),
  BytesTy(Option<Symbol>),
  Ptr { inner: TyId, state: Option<Symbol> },
  RawPtr { mutability: RawPtrMut, inner: TyId },
  Tuple(Vec<TyId>),
  Array { elem: TyId, len: u64 },
  Slice(TyId),
  /// Normalized: sorted by `TyId` and deduplicated, so `A|A` and `B|A`
  /// intern identically to `A|B` (spec §3.3).
  Union(Vec<TyId>),
  Func { params: Vec<TyId>, ret: TyId },
  /// A `record`/`enum`/`class` instantiated with type arguments, or an
  /// alias target already resolved through `Sigma`.
  Nominal { sigma: SigmaId, args: Vec<TyId> },
  ModalState { base: SigmaId, state: Symbol, args: Vec<TyId> },
  Permission { perm: Permission, inner: TyId },
  /// Distinguished from other refinements only by `tag`; the predicate
  /// itself lives in `TypeTable::refinement_predicates`.
  Refinement { base: TyId, tag: u32 },
  Opaque(SigmaId),
  Dynamic(SigmaId),
  Never,
  /// Recovery placeholder for a type that failed to resolve.
  Error,
}

#[derive(Default)]
pub struct TypeTable {
  kinds: IdxVec<TyId, TyKind>,
  interned: HashMap<TyKind, TyId>,
  refinement_predicates: HashMap<TyId, Expr>,
  next_refinement_tag: u32,
}

impl TypeTable {
  pub fn new() -> Self { Self::default() }

  pub fn intern(&mut self, kind: TyKind) -> TyId {
    if let Some(&id) = self.interned.get(&kind) { return id }
    let id = self.kinds.push(kind.clone());
    self.interned.insert(kind, id);
    id
  }

  pub fn intern_refinement(&mut self, base: TyId, predicate: Expr) -> TyId {
    let tag = self.next_refinement_tag;
    self.next_refinement_tag += 1;
    let id = self.kinds.push(TyKind::Refinement { base, tag });
    self.refinement_predicates.insert(id, predicate);
    id
  }

  pub fn refinement_predicate(&self, id: TyId) -> Option<&Expr> {
    self.refinement_predicates.get(&id)
  }

  pub fn kind(&self, id: TyId) -> &TyKind { &self.kinds[id] }

  /// All interned types in allocation order, for passes that need to
  /// scan every type this file produced rather than look one up by id
  /// (e.g. `generics::monomorphize`'s initial worklist).
  pub fn iter(&self) -> impl Iterator<Item = (TyId, &TyKind)> { self.kinds.enum_iter() }

  /// Builds the normalized union of `members` (spec §3.3), flattening
  /// nested unions and collapsing to the sole member when only one
  /// distinct type remains.
  pub fn union_of(&mut self, members: Vec<TyId>) -> TyId {
    let mut flat = Vec::new();
    for m in members {
      match self.kind(m).clone() {
        TyKind::Union(inner) => flat.extend(inner),
        _ => flat.push(m),
      }
    }
    flat.sort_by_key(|id| id.0);
    flat.dedup();
    match flat.len() {
      1 => flat[0],
      _ => self.intern(TyKind::Union(flat)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::idx::Idx;

  #[test]
  fn structural_intern_is_deduped() {
    let mut table = TypeTable::new();
    let a = table.intern(TyKind::Prim(PrimTy::I32));
    let b = table.intern(TyKind::Prim(PrimTy::I32));
    assert_eq!(a, b);
  }

  #[test]
  fn union_normalizes_order_and_duplicates() {
    let mut table = TypeTable::new();
    let i32_ty = table.intern(TyKind::Prim(PrimTy::I32));
    let bool_ty = table.intern(TyKind::Prim(PrimTy::Bool));
    let u1 = table.union_of(vec![i32_ty, bool_ty, i32_ty]);
    let u2 = table.union_of(vec![bool_ty, i32_ty]);
    assert_eq!(u1, u2);
  }

  #[test]
  fn refinements_never_collapse_to_each_other() {
    use crate::span::{FileId, Span};
    let mut table = TypeTable::new();
    let i32_ty = table.intern(TyKind::Prim(PrimTy::I32));
    let sp = Span::dummy(FileId::from_usize(0));
    let lit = |v| Expr { span: sp, kind: std::boxed::Box::new(crate::ast::ExprKind::Literal(crate::ast::Literal::Bool(v))) };
    let r1 = table.intern_refinement(i32_ty, lit(true));
    let r2 = table.intern_refinement(i32_ty, lit(true));
    assert_ne!(r1, r2);
  }
}
