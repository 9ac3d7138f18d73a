//! The type-declaration table, Sigma (spec §4.2): every `record`,
//! `enum`, `modal`, `class`, and `type` alias visible to the checker,
//! keyed by its fully-qualified path. Mirrors the `HashMap<Symbol,
//! Entity>` names table the teacher's `types::entity` builds for
//! procedures and primops, but indexed by path rather than bare symbol
//! since this crate's modules nest.

use hashbrown::HashMap;

use crate::ast::{ClassDecl, EnumDecl, GenericParam, ModalDecl, RecordDecl, TypeExpr, Visibility};
use crate::idx::{mk_idx, IdxVec};
use crate::span::Span;
use crate::symbol::Symbol;

mk_idx! {
  /// A stable handle into [`Sigma`]. Never reused across a compilation.
  pub struct SigmaId;
}

#[derive(Clone, Debug)]
pub enum SigmaDecl {
  Record(RecordDecl),
  Enum(EnumDecl),
  Modal(ModalDecl),
  Class(ClassDecl),
  Alias { generics: Vec<GenericParam>, target: TypeExpr },
}

impl SigmaDecl {
  pub fn generics(&self) -> &[GenericParam] {
    match self {
      SigmaDecl::Record(r) => &r.generics,
      SigmaDecl::Enum(e) => &e.generics,
      SigmaDecl::Modal(m) => &m.generics,
      SigmaDecl::Class(c) => &c.generics,
      SigmaDecl::Alias { generics, .. } => generics,
    }
  }
}

#[derive(Clone, Debug)]
pub struct SigmaEntry {
  pub path: Vec<Symbol>,
  pub vis: Visibility,
  pub span: Span,
  pub decl: SigmaDecl,
}

/// Every type-level declaration reachable from the file(s) under
/// analysis, addressed both by handle and by fully-qualified path.
#[derive(Default)]
pub struct Sigma {
  entries: IdxVec<SigmaId, SigmaEntry>,
  by_path: HashMap<Vec<Symbol>, SigmaId>,
}

impl Sigma {
  pub fn new() -> Self { Self::default() }

  /// Registers a declaration under `path`. Returns the existing id
  /// instead of inserting if `path` is already taken, so the caller
  /// can turn a duplicate registration into a diagnostic.
  pub fn insert(&mut self, path: Vec<Symbol>, vis: Visibility, span: Span, decl: SigmaDecl) -> Result<SigmaId, SigmaId> {
    if let Some(&existing) = self.by_path.get(&path) { return Err(existing) }
    let id = self.entries.push(SigmaEntry { path: path.clone(), vis, span, decl });
    self.by_path.insert(path, id);
    Ok(id)
  }

  pub fn lookup(&self, path: &[Symbol]) -> Option<SigmaId> {
    self.by_path.get(path).copied()
  }

  pub fn get(&self, id: SigmaId) -> &SigmaEntry { &self.entries[id] }

  pub fn iter(&self) -> impl Iterator<Item = (SigmaId, &SigmaEntry)> { self.entries.enum_iter() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::span::FileId;
  use crate::idx::Idx;

  fn sp() -> Span { Span::dummy(FileId::from_usize(0)) }

  #[test]
  fn duplicate_path_is_rejected() {
    let mut sigma = Sigma::new();
    let name = crate::symbol::intern("Point");
    let decl = SigmaDecl::Record(RecordDecl { name, generics: Vec::new(), fields: Vec::new() });
    let first = sigma.insert(vec![name], Visibility::Public, sp(), decl.clone()).unwrap();
    let second = sigma.insert(vec![name], Visibility::Public, sp(), decl);
    assert_eq!(second, Err(first));
  }

  #[test]
  fn lookup_roundtrips_through_path() {
    let mut sigma = Sigma::new();
    let name = crate::symbol::intern("Color");
    let decl = SigmaDecl::Enum(EnumDecl { name, generics: Vec::new(), variants: Vec::new() });
    let id = sigma.insert(vec![name], Visibility::Private, sp(), decl).unwrap();
    assert_eq!(sigma.lookup(&[name]), Some(id));
  }
}
