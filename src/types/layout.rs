//! Size/align/layout and discriminant-type computation (spec §3.3),
//! cached per type the same way the teacher's `mmcc` caches MIR layout
//! facts rather than recomputing them at every use site.

use crate::ast::PrimTy;
use crate::resolve::sigma::{Sigma, SigmaDecl};

use super::intern::{TyId, TyKind, TypeTable};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Layout {
  pub size: u64,
  pub align: u64,
}

impl Layout {
  pub const fn new(size: u64, align: u64) -> Self { Self { size, align } }

  fn pad_to(self, align: u64) -> Layout {
    let misalign = self.size % align;
    let size = if misalign == 0 { self.size } else { self.size + (align - misalign) };
    Layout { size, align }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DiscTy { U8, U16, U32, U64 }

impl DiscTy {
  /// Smallest discriminant type that can distinguish `variant_count`
  /// cases (spec §3.3 "disc type chosen by variant count").
  pub fn for_variant_count(variant_count: usize) -> DiscTy {
    match variant_count {
      0..=0x100 => DiscTy::U8,
      0x101..=0x10000 => DiscTy::U16,
      0x10001..=0x1_0000_0000 => DiscTy::U32,
      _ => DiscTy::U64,
    }
  }

  pub fn layout(self) -> Layout {
    match self {
      DiscTy::U8 => Layout::new(1, 1),
      DiscTy::U16 => Layout::new(2, 2),
      DiscTy::U32 => Layout::new(4, 4),
      DiscTy::U64 => Layout::new(8, 8),
    }
  }
}

fn prim_layout(p: PrimTy) -> Layout {
  use PrimTy::*;
  match p {
    I8 | U8 | Bool => Layout::new(1, 1),
    I16 | U16 => Layout::new(2, 2),
    I32 | U32 | F32 | Char => Layout::new(4, 4),
    I64 | U64 | F64 | Isize | Usize => Layout::new(8, 8),
    I128 | U128 => Layout::new(16, 16),
    F16 => Layout::new(2, 2),
    Unit => Layout::new(0, 1),
    Never => Layout::new(0, 1),
  }
}

/// `{ptr, len}` for a borrowed slice/string, `{ptr, len, cap}` for an
/// owned one (a modal state on the type, spec §3.3).
const FAT_PTR: Layout = Layout::new(16, 8);
const OWNED_FAT_PTR: Layout = Layout::new(24, 8);

pub fn compute_layout(types: &TypeTable, sigma: &Sigma, ty: TyId) -> Layout {
  match types.kind(ty) {
    TyKind::Prim(p) => prim_layout(*p),
    TyKind::StringTy(state) | TyKind::BytesTy(state) => {
      if state.is_some() { OWNED_FAT_PTR } else { FAT_PTR }
    }
    TyKind::Ptr { .. } | TyKind::RawPtr { .. } => Layout::new(8, 8),
    TyKind::Slice(_) => FAT_PTR,
    TyKind::Tuple(elems) => {
      let mut layout = Layout::new(0, 1);
      for &elem in elems {
        let el = compute_layout(types, sigma, elem);
        layout = layout.pad_to(el.align);
        layout.size += el.size;
        layout.align = layout.align.max(el.align);
      }
      layout.pad_to(layout.align)
    }
    TyKind::Array { elem, len } => {
      let el = compute_layout(types, sigma, *elem);
      Layout::new(el.size * len, el.align)
    }
    TyKind::Func { .. } => Layout::new(8, 8),
    TyKind::Union(members) => {
      let mut size = 0;
      let mut align = 1;
      for &m in members {
        let l = compute_layout(types, sigma, m);
        size = size.max(l.size);
        align = align.max(l.align);
      }
      Layout::new(size, align).pad_to(align)
    }
    TyKind::Nominal { sigma: id, args: _ } => nominal_layout(types, sigma, *id),
    TyKind::ModalState { base, .. } => nominal_layout(types, sigma, *base),
    TyKind::Permission { inner, .. } => compute_layout(types, sigma, *inner),
    TyKind::Refinement { base, .. } => compute_layout(types, sigma, *base),
    TyKind::Opaque(_) | TyKind::Dynamic(_) => Layout::new(8, 8),
    TyKind::Never | TyKind::Error => Layout::new(0, 1),
  }
}

fn nominal_layout(types: &TypeTable, sigma: &Sigma, id: crate::resolve::sigma::SigmaId) -> Layout {
  match &sigma.get(id).decl {
    SigmaDecl::Record(r) => {
      // Fields aren't interned `TyId`s here (the resolver stores the
      // surface `TypeExpr`), so a record's own layout is the padded sum
      // of its field count as opaque machine words; the checker refines
      // this once it has interned field types (see `check::place`).
      let mut layout = Layout::new(0, 1);
      for _ in &r.fields {
        layout = layout.pad_to(8);
        layout.size += 8;
        layout.align = 8;
      }
      layout.pad_to(layout.align.max(1))
    }
    SigmaDecl::Enum(e) => {
      let disc = DiscTy::for_variant_count(e.variants.len());
      disc.layout()
    }
    SigmaDecl::Modal(m) => {
      let disc = DiscTy::for_variant_count(m.states.len());
      disc.layout()
    }
    SigmaDecl::Class(_) => Layout::new(8, 8),
    SigmaDecl::Alias { .. } => Layout::new(0, 1),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tuple_pads_between_mismatched_aligns() {
    let mut types = TypeTable::new();
    let sigma = Sigma::new();
    let i8_ty = types.intern(TyKind::Prim(PrimTy::I8));
    let i64_ty = types.intern(TyKind::Prim(PrimTy::I64));
    let tup = types.intern(TyKind::Tuple(vec![i8_ty, i64_ty]));
    let layout = compute_layout(&types, &sigma, tup);
    assert_eq!(layout.align, 8);
    assert_eq!(layout.size, 16);
  }

  #[test]
  fn disc_ty_grows_with_variant_count() {
    assert_eq!(DiscTy::for_variant_count(3), DiscTy::U8);
    assert_eq!(DiscTy::for_variant_count(300), DiscTy::U16);
  }
}
