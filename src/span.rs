//! Source files and spans (spec §3.1).

use std::rc::Rc;

use crate::idx::{mk_idx, Idx};

mk_idx! {
  /// Index of a [`SourceFile`] in a [`SourceMap`].
  pub struct FileId;
}

/// A decoded source file: its text, plus a line-start index so
/// byte offsets can be turned into line/column pairs cheaply.
#[derive(Debug)]
pub struct SourceFile {
  pub name: Rc<str>,
  pub text: Rc<str>,
  /// Byte offset of the start of each line; `line_starts[0] == 0`.
  line_starts: Vec<u32>,
}

impl SourceFile {
  pub fn new(name: impl Into<Rc<str>>, text: impl Into<Rc<str>>) -> Self {
    let text = text.into();
    let mut line_starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
      if b == b'\n' { line_starts.push(u32::try_from(i + 1).expect("file too large")) }
    }
    Self { name: name.into(), text, line_starts }
  }

  /// 1-based (line, column) for a byte offset, both counted in bytes
  /// (the lexer is responsible for UTF-8 column accounting upstream).
  pub fn line_col(&self, offset: u32) -> (u32, u32) {
    let line = match self.line_starts.binary_search(&offset) {
      Ok(i) => i,
      Err(i) => i - 1,
    };
    let col = offset - self.line_starts[line];
    (u32::try_from(line + 1).unwrap(), col + 1)
  }

  pub fn len(&self) -> u32 { u32::try_from(self.text.len()).expect("file too large") }
  pub fn is_empty(&self) -> bool { self.text.is_empty() }
}

#[derive(Default)]
pub struct SourceMap {
  files: Vec<Rc<SourceFile>>,
}

impl SourceMap {
  pub fn add(&mut self, file: SourceFile) -> FileId {
    let id = FileId::from_usize(self.files.len());
    self.files.push(Rc::new(file));
    id
  }

  pub fn get(&self, id: FileId) -> &Rc<SourceFile> { &self.files[id.into_usize()] }
}

/// A byte range within one source file. Every AST and IR node carries
/// exactly one of these.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
  pub file: FileId,
  pub lo: u32,
  pub hi: u32,
}

impl std::fmt::Debug for Span {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}[{}..{}]", self.file, self.lo, self.hi)
  }
}

impl Span {
  pub fn new(file: FileId, lo: u32, hi: u32) -> Self {
    debug_assert!(lo <= hi);
    Self { file, lo, hi }
  }

  pub fn dummy(file: FileId) -> Self { Self { file, lo: 0, hi: 0 } }

  /// Composes two spans from the same file into one covering both, per
  /// spec §3.1's `SpanBetween` operation. Nodes built this way strictly
  /// cover their children (§8 invariant 2).
  pub fn between(a: Span, b: Span) -> Span {
    debug_assert_eq!(a.file, b.file);
    Span { file: a.file, lo: a.lo.min(b.lo), hi: a.hi.max(b.hi) }
  }

  pub fn contains(&self, other: Span) -> bool {
    self.file == other.file && self.lo <= other.lo && other.hi <= self.hi
  }

  pub fn len(&self) -> u32 { self.hi - self.lo }
  pub fn is_empty(&self) -> bool { self.hi == self.lo }
}

/// Pairs a value with the span it was parsed from. Used pervasively so
/// later passes don't need a parallel span table.
#[derive(Clone, Debug)]
pub struct Spanned<T> {
  pub span: Span,
  pub node: T,
}

impl<T> Spanned<T> {
  pub fn new(span: Span, node: T) -> Self { Self { span, node } }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
    Spanned { span: self.span, node: f(self.node) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn between_covers_both() {
    let f = FileId::from_usize(0);
    let a = Span::new(f, 3, 5);
    let b = Span::new(f, 10, 12);
    let u = Span::between(a, b);
    assert!(u.contains(a) && u.contains(b));
  }

  #[test]
  fn line_col_basic() {
    let sf = SourceFile::new("t.cv0", "ab\ncd\nef");
    assert_eq!(sf.line_col(0), (1, 1));
    assert_eq!(sf.line_col(3), (2, 1));
    assert_eq!(sf.line_col(7), (3, 2));
  }
}
