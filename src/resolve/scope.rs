//! Value-level name resolution: the module-wide [`ValueTable`] of
//! statics, procedures, and modal constructors, and the lexical
//! [`Scope`] stack used while walking a procedure body.

use hashbrown::HashMap;

use super::sigma::SigmaId;
use crate::ast::{TypeExpr, Visibility};
use crate::idx::{mk_idx, IdxVec};
use crate::span::Span;
use crate::symbol::Symbol;

mk_idx! {
  /// A stable handle into [`ValueTable`].
  pub struct ValueId;
}

#[derive(Clone, Debug)]
pub enum ValueKind {
  Static { mutable: bool, ty: Option<TypeExpr> },
  Procedure(Symbol),
  /// A modal state's implicit constructor, e.g. `Door::Open(...)`.
  ModalConstructor { modal: SigmaId, state: Symbol },
}

#[derive(Clone, Debug)]
pub struct ValueEntry {
  pub path: Vec<Symbol>,
  pub vis: Visibility,
  pub span: Span,
  pub kind: ValueKind,
}

/// Module-level bindings: statics, top-level procedures, and modal
/// constructors synthesized from `ModalDecl` states. Parallels
/// [`super::sigma::Sigma`] but for the value namespace.
#[derive(Default)]
pub struct ValueTable {
  entries: IdxVec<ValueId, ValueEntry>,
  by_path: HashMap<Vec<Symbol>, ValueId>,
}

impl ValueTable {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, path: Vec<Symbol>, vis: Visibility, span: Span, kind: ValueKind) -> Result<ValueId, ValueId> {
    if let Some(&existing) = self.by_path.get(&path) { return Err(existing) }
    let id = self.entries.push(ValueEntry { path: path.clone(), vis, span, kind });
    self.by_path.insert(path, id);
    Ok(id)
  }

  pub fn lookup(&self, path: &[Symbol]) -> Option<ValueId> {
    self.by_path.get(path).copied()
  }

  pub fn get(&self, id: ValueId) -> &ValueEntry { &self.entries[id] }
}

/// A resolution recorded for some source span: either a local binding
/// or a module/type-level value. Stored in a side table keyed by
/// `Span` (spec §3.1's spans are `Hash`/`Eq`) rather than mutating the
/// AST node in place, matching how [`crate::diagnostics::DiagSink`]
/// accumulates rather than rewrites.
#[derive(Clone, Copy, Debug)]
pub enum Resolution {
  Local(LocalId),
  Value(ValueId),
  Sigma(SigmaId),
}

mk_idx! {
  /// A binding introduced by `let`, a `for` pattern, a `match` arm
  /// pattern, or a procedure parameter.
  pub struct LocalId;
}

#[derive(Clone, Debug)]
pub struct LocalEntry {
  pub name: Symbol,
  pub span: Span,
  pub mutable: bool,
}

/// A stack of lexical frames, one per block/arm/parameter-list,
/// resolved innermost-first. Locals are never removed individually;
/// a frame is dropped wholesale on `pop`.
#[derive(Default)]
pub struct Scope {
  locals: IdxVec<LocalId, LocalEntry>,
  frames: Vec<HashMap<Symbol, LocalId>>,
}

impl Scope {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self) { self.frames.push(HashMap::new()) }

  pub fn pop(&mut self) { self.frames.pop(); }

  /// Introduces `name` in the innermost frame, shadowing any outer
  /// binding of the same name. Returns the binding this one shadows,
  /// if any, so a caller can decide whether shadowing was declared
  /// intentionally (spec's `shadow let`/`shadow var`).
  pub fn declare(&mut self, name: Symbol, span: Span, mutable: bool) -> (LocalId, Option<LocalId>) {
    let id = self.locals.push(LocalEntry { name, span, mutable });
    let frame = self.frames.last_mut().expect("declare outside any scope frame");
    let shadowed = frame.insert(name, id);
    (id, shadowed)
  }

  pub fn lookup(&self, name: Symbol) -> Option<LocalId> {
    self.frames.iter().rev().find_map(|frame| frame.get(&name).copied())
  }

  pub fn local(&self, id: LocalId) -> &LocalEntry { &self.locals[id] }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::idx::Idx;
  use crate::span::FileId;

  fn sp() -> Span { Span::dummy(FileId::from_usize(0)) }

  #[test]
  fn inner_frame_shadows_outer() {
    let mut scope = Scope::new();
    let x = crate::symbol::intern("x");
    scope.push();
    let (outer, _) = scope.declare(x, sp(), false);
    scope.push();
    let (inner, shadowed) = scope.declare(x, sp(), true);
    assert_eq!(scope.lookup(x), Some(inner));
    assert_eq!(shadowed, None);
    scope.pop();
    assert_eq!(scope.lookup(x), Some(outer));
  }

  #[test]
  fn pop_removes_whole_frame() {
    let mut scope = Scope::new();
    let y = crate::symbol::intern("y");
    scope.push();
    scope.push();
    scope.declare(y, sp(), false);
    scope.pop();
    assert_eq!(scope.lookup(y), None);
  }
}
