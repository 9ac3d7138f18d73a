//! Structured diagnostics (spec §4.7 / §7).
//!
//! Diagnostics are data, not `Result` errors: every pass keeps running
//! after reporting one (§7's propagation policy), so a `DiagSink` is an
//! accumulator threaded through a pass rather than a bail-out channel.

use crate::span::Span;

#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum Severity {
  Warning,
  Error,
  /// A bug in the compiler itself, not a user-facing code. Always fatal.
  Internal,
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
  pub code: &'static str,
  pub severity: Severity,
  pub primary: Span,
  pub message: String,
  pub notes: Vec<(Span, String)>,
}

impl Diagnostic {
  pub fn new(code: &'static str, severity: Severity, primary: Span, message: impl Into<String>) -> Self {
    Self { code, severity, primary, message: message.into(), notes: Vec::new() }
  }

  pub fn error(code: &'static str, primary: Span, message: impl Into<String>) -> Self {
    Self::new(code, Severity::Error, primary, message)
  }

  pub fn warning(code: &'static str, primary: Span, message: impl Into<String>) -> Self {
    Self::new(code, Severity::Warning, primary, message)
  }

  pub fn with_note(mut self, span: Span, note: impl Into<String>) -> Self {
    self.notes.push((span, note.into()));
    self
  }
}

/// Per-file accumulator. One `[[allow(code)]]` attribute on a containing
/// item silences diagnostics with that code for its subtree; the
/// resolver/checker register suppressed spans as they walk attributes,
/// and `emit` filters against them so downstream code never has to ask.
#[derive(Default)]
pub struct DiagSink {
  diags: Vec<Diagnostic>,
  /// `(code, span)` pairs whose enclosing span suppresses that code.
  suppressed: Vec<(&'static str, Span)>,
}

impl DiagSink {
  pub fn new() -> Self { Self::default() }

  pub fn allow(&mut self, code: &'static str, subtree: Span) {
    self.suppressed.push((code, subtree));
  }

  fn is_suppressed(&self, code: &str, at: Span) -> bool {
    self.suppressed.iter().any(|&(c, span)| c == code && span.contains(at))
  }

  pub fn emit(&mut self, diag: Diagnostic) {
    if diag.severity != Severity::Internal && self.is_suppressed(diag.code, diag.primary) { return }
    log::trace!(target: "diagnostics", "{:?} {}: {}", diag.severity, diag.code, diag.message);
    self.diags.push(diag);
  }

  pub fn has_errors(&self) -> bool {
    self.diags.iter().any(|d| d.severity >= Severity::Error)
  }

  /// Diagnostics in discovery (emission) order, per §7's user-visible
  /// ordering guarantee.
  pub fn diagnostics(&self) -> &[Diagnostic] { &self.diags }

  pub fn extend(&mut self, other: DiagSink) {
    for d in other.diags {
      if !self.is_suppressed(d.code, d.primary) { self.diags.push(d) }
    }
  }

  /// Combine two diagnostic sinks produced by a forking subparse while
  /// preserving emission order, per spec §9's `MergeDiag`.
  pub fn merge(mut base: DiagSink, other: DiagSink) -> DiagSink {
    base.extend(other);
    base
  }
}

pub mod codes {
  pub const MISSING_TERMINATOR: &str = "E-SRC-0510";
  pub const SYNTAX_ERROR: &str = "E-SRC-0520";
  pub const BAD_TRAILING_COMMA: &str = "E-SRC-0521";
  pub const UNSUPPORTED_SURFACE: &str = "E-UNS-0100";
  pub const RETURN_AT_MODULE_SCOPE: &str = "E-SEM-3165";
  pub const UNRESOLVED_REFERENCE: &str = "E-SEM-3100";
  pub const DUPLICATE_DECLARATION: &str = "E-SEM-3101";
  pub const VISIBILITY_VIOLATION: &str = "E-SEM-3102";
  pub const CONTRACT_UNPROVABLE: &str = "E-TYP-1953";
  pub const CAPABILITY_IN_EXTERN: &str = "E-CAP-0001";
  pub const KEY_HELD_ACROSS_YIELD: &str = "E-CON-0213";
  pub const GENERIC_DIVERGENCE: &str = "E-SEM-3200";
  pub const UNSATISFIED_BOUND: &str = "E-SEM-3201";
  pub const USE_AFTER_MOVE: &str = "E-SEM-3300";
  pub const EXPIRED_DEREF: &str = "E-SEM-3301";
  pub const OPERATOR_TYPE_MISMATCH: &str = "E-TYP-1900";
  pub const W_NON_EXHAUSTIVE: &str = "W-MATCH-0001";
  pub const W_SHADOWED_ARM: &str = "W-MATCH-0002";
  pub const W_IMPLICIT_WIDEN: &str = "W-MODAL-0001";
  pub const W_STALE_BINDING: &str = "W-REGION-0001";
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::span::FileId;
  use crate::idx::Idx;

  fn sp(lo: u32, hi: u32) -> Span { Span::new(FileId::from_usize(0), lo, hi) }

  #[test]
  fn suppression_scopes_to_containing_span() {
    let mut sink = DiagSink::new();
    sink.allow(codes::W_NON_EXHAUSTIVE, sp(0, 100));
    sink.emit(Diagnostic::warning(codes::W_NON_EXHAUSTIVE, sp(10, 20), "not exhaustive"));
    sink.emit(Diagnostic::warning(codes::W_NON_EXHAUSTIVE, sp(200, 210), "also not exhaustive"));
    assert_eq!(sink.diagnostics().len(), 1);
    assert_eq!(sink.diagnostics()[0].primary, sp(200, 210));
  }

  #[test]
  fn errors_flagged_for_nonzero_exit() {
    let mut sink = DiagSink::new();
    assert!(!sink.has_errors());
    sink.emit(Diagnostic::error(codes::SYNTAX_ERROR, sp(0, 1), "boom"));
    assert!(sink.has_errors());
  }
}
