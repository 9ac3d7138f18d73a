//! Global string interner.
//!
//! Identifiers, path segments, and modal state names all flow through
//! here so that later passes compare them by a cheap `Copy` handle
//! instead of by string. Mirrors the `Symbol`/`Interner` split the
//! teacher's `entity.rs` imports from its utility crate, reimplemented
//! locally since interning is a data-model requirement of this crate
//! (spec §3.3), not an ambient concern delegated outward.

use std::cell::RefCell;
use hashbrown::HashMap;

use crate::idx::{mk_idx, Idx};

mk_idx! {
  /// An interned string handle. Cheap to copy, compare, and hash.
  pub struct Symbol;
}

#[derive(Default)]
pub struct Interner {
  strings: Vec<Box<str>>,
  map: HashMap<Box<str>, Symbol>,
}

impl Interner {
  pub fn intern(&mut self, s: &str) -> Symbol {
    if let Some(&sym) = self.map.get(s) { return sym }
    let boxed: Box<str> = s.into();
    let sym = Symbol::from_usize(self.strings.len());
    self.strings.push(boxed.clone());
    self.map.insert(boxed, sym);
    sym
  }

  pub fn resolve(&self, sym: Symbol) -> &str { &self.strings[sym.into_usize()] }
}

thread_local! {
  static INTERNER: RefCell<Interner> = RefCell::new(Interner::default());
}

/// Intern a string in the process-wide (thread-local) interner.
pub fn intern(s: &str) -> Symbol {
  INTERNER.with(|i| i.borrow_mut().intern(s))
}

/// Look up the text behind a symbol. Panics if `sym` was not produced
/// by [`intern`] on this thread.
pub fn resolve(sym: Symbol) -> String {
  INTERNER.with(|i| i.borrow().resolve(sym).to_owned())
}

/// Build a dense lookup table from symbol value to `T`, for keyword-like
/// enums that want O(1) `Symbol -> Self` lookup without a hash probe.
/// Entries past the largest interned symbol at call time are `None`.
pub fn init_dense_symbol_map<T: Copy>(pairs: &[(Symbol, T)]) -> Box<[Option<T>]> {
  let max = pairs.iter().map(|(s, _)| s.into_usize()).max().map_or(0, |n| n + 1);
  let mut table = vec![None; max].into_boxed_slice();
  for &(s, v) in pairs { table[s.into_usize()] = Some(v) }
  table
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn interning_is_stable() {
    let a = intern("foo");
    let b = intern("foo");
    let c = intern("bar");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(resolve(a), "foo");
  }
}
