//! Modal type layout and transition validation (spec §4.5). A modal
//! declaration is laid out the same way an enum is (tag + largest
//! payload, see `types::layout::nominal_layout`), except a modal's
//! "variants" are states with their own named transition procedures;
//! this module is what decides whether a modal can use a niche
//! (tagless) encoding and checks that every transition only targets a
//! state the declaration actually has.

use crate::ast::ModalDecl;
use crate::check::TypeChecker;
use crate::diagnostics::{codes, Diagnostic};
use crate::span::Span;
use crate::symbol::Symbol;
use crate::types::layout::{compute_layout, DiscTy, Layout};
use crate::types::intern::TyKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StateRepr {
  /// States are distinguished by an explicit discriminant field.
  Tagged(DiscTy),
  /// A single non-unit state's payload has a value that can never
  /// legitimately occur (e.g. a non-null pointer), so that value
  /// itself marks the other, unit state — no discriminant needed.
  /// This pipeline never proves a niche exists (that needs per-field
  /// validity ranges this surface grammar doesn't expose), so it is
  /// always `Tagged` in practice; the variant exists so `ModalPlan`
  /// has a place to grow into once niche analysis lands.
  Niche,
}

pub struct ModalPlan {
  pub repr: StateRepr,
  pub layout: Layout,
}

pub fn plan_modal(checker: &mut TypeChecker, sigma_id: crate::resolve::sigma::SigmaId, decl: &ModalDecl) -> ModalPlan {
  let repr = StateRepr::Tagged(DiscTy::for_variant_count(decl.states.len()));
  let nominal = checker.types.intern(TyKind::Nominal { sigma: sigma_id, args: Vec::new() });
  let layout = compute_layout(&checker.types, checker.sigma, nominal);
  ModalPlan { repr, layout }
}

/// Every modal state's transition procedures are checked as ordinary
/// procedures by `check::TypeChecker::check_item`; this only validates
/// the modal-specific shape the spec layers on top: a transition's
/// declared return type, if it names `ModalState { base, state }` for
/// this same modal, must name a state the declaration actually has.
pub fn check_transitions(checker: &mut TypeChecker, decl: &ModalDecl, span: Span) {
  let state_names: Vec<Symbol> = decl.states.iter().map(|s| s.name).collect();
  for state in &decl.states {
    for proc in &state.transitions {
      let Some(ret) = &proc.ret else { continue };
      if let crate::ast::TypeExprKind::ModalState { base, state: target } = &*ret.kind {
        if base.segments.last() == Some(&decl.name) && !state_names.contains(target) {
          checker.diags.emit(Diagnostic::error(
            codes::UNRESOLVED_REFERENCE,
            span,
            format!(
              "`{}` is not a state of modal `{}`",
              crate::symbol::resolve(*target),
              crate::symbol::resolve(decl.name),
            ),
          ));
        }
      }
    }
  }
}
