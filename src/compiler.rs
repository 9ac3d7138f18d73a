//! Pipeline driver (spec §8): wires lexing's output through parsing,
//! name resolution, type checking, and IR lowering behind one entry
//! point, the way a real build tool threads passes through a single
//! driver struct rather than leaving callers to sequence them by hand.
//! Configuration follows the crate's existing `serde`/`toml` stack
//! (see `Cargo.toml`); diagnostics keep flowing through `DiagSink`
//! exactly as every other pass already does, and `log` records the
//! pipeline's own progress the same way `diagnostics::DiagSink::emit`
//! already traces each diagnostic it accumulates.

use hashbrown::HashSet;
use serde::Deserialize;

use crate::ast::{File, ItemKind, Procedure};
use crate::async_engine::{self, AsyncFrameSpec};
use crate::check::TypeChecker;
use crate::diagnostics::{Diagnostic, Severity};
use crate::generics::{self, InstantiationCache, InstantiationDemand};
use crate::ir::{IrId, IrPool, Lowerer, PoisonTable};
use crate::lexer_api::LexedFile;
use crate::modal;
use crate::parser::Parser;
use crate::region::RegionChecker;
use crate::resolve::Resolver;
use crate::span::Span;
use crate::symbol::Symbol;
use crate::types::intern::TyKind;

/// Knobs a caller can set from a `cursive0.toml`-shaped config file.
/// Every field defaults to "run the pass"; a caller building just a
/// resolver-level tool (an IDE outline, say) can turn the later passes
/// off without forking the driver.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
  pub check_regions: bool,
  pub check_async: bool,
  pub monomorphize: bool,
}

impl Default for PipelineOptions {
  fn default() -> Self {
    Self { check_regions: true, check_async: true, monomorphize: true }
  }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
  #[error("invalid pipeline configuration: {0}")]
  Toml(#[from] toml::de::Error),
}

impl PipelineOptions {
  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(text)?)
  }
}

/// One procedure's lowered body, keyed by its fully-qualified path the
/// same way `check::TypeChecker::proc_sigs` keys signatures.
pub struct LoweredProcedure {
  pub path: Vec<Symbol>,
  pub ir: IrPool,
  pub entry: Option<IrId>,
  pub async_frame: Option<AsyncFrameSpec>,
}

#[derive(Default)]
pub struct CompileOutput {
  pub diagnostics: Vec<Diagnostic>,
  pub procedures: Vec<LoweredProcedure>,
  pub modal_plans: Vec<(Vec<Symbol>, modal::ModalPlan)>,
  pub poison: PoisonTable,
}

impl CompileOutput {
  pub fn has_errors(&self) -> bool {
    self.diagnostics.iter().any(|d| d.severity >= Severity::Error)
  }

  /// A top-level summary error for callers that just want a single
  /// pass/fail signal with a human-readable cause, the same role
  /// `anyhow`/`miette`'s "wrap a batch of causes into one report" idiom
  /// plays in a CLI's `main`.
  pub fn into_report(self) -> Result<Vec<LoweredProcedure>, miette::Report> {
    if self.has_errors() {
      let count = self.diagnostics.iter().filter(|d| d.severity >= Severity::Error).count();
      Err(miette::miette!("compilation failed with {count} error diagnostic(s)"))
    } else {
      Ok(self.procedures)
    }
  }
}

pub struct Compiler {
  pub options: PipelineOptions,
}

impl Compiler {
  pub fn new(options: PipelineOptions) -> Self { Self { options } }

  /// Runs the full pipeline over one already-lexed file. The lexer
  /// itself is an external collaborator (spec §6); this crate only
  /// ever consumes a [`LexedFile`], never produces one.
  pub fn compile_file(&self, module: Symbol, lexed: LexedFile) -> CompileOutput {
    log::info!(target: "compiler", "parsing module `{}`", crate::symbol::resolve(module));
    let eof = lexed.eof;
    let (file, mut diags) = Parser::new(lexed).parse_file();

    let mut resolver = Resolver::new(&mut diags);
    resolver.run(&file);
    let Resolver { sigma, values, .. } = resolver;

    let mut poison = PoisonTable::new();
    let procedures;
    let modal_plans;
    {
      let mut checker = TypeChecker::new(&sigma, &values, &mut diags);
      checker.check_file(&file);

      if self.options.check_regions {
        self.check_regions(&mut checker, &file);
      }
      if self.options.monomorphize {
        self.run_monomorphization(&mut checker, eof);
      }
      modal_plans = self.check_modals(&mut checker, &file);

      if checker.diags.has_errors() {
        poison.mark_poisoned(module);
        log::warn!(target: "compiler", "module `{}` poisoned: {} diagnostic(s)", crate::symbol::resolve(module), checker.diags.diagnostics().len());
      }

      procedures = self.lower_procedures(&mut checker, &file, module);
    }

    CompileOutput { diagnostics: diags.diagnostics().to_vec(), procedures, modal_plans, poison }
  }

  fn check_regions(&self, checker: &mut TypeChecker, file: &File) {
    for (_, proc) in collect_procedures(file) {
      if let Some(body) = &proc.body {
        RegionChecker::new().check_body(checker, body);
      }
    }
  }

  fn check_modals(&self, checker: &mut TypeChecker, file: &File) -> Vec<(Vec<Symbol>, modal::ModalPlan)> {
    let mut plans = Vec::new();
    for item in &file.items {
      if let ItemKind::Modal(decl) = &item.kind {
        if let Some(sigma_id) = checker.sigma.lookup(&[decl.name]) {
          plans.push((vec![decl.name], modal::plan_modal(checker, sigma_id, decl)));
        }
        modal::check_transitions(checker, decl, item.span);
      }
    }
    plans
  }

  /// Scans every type this file interned for a concrete generic
  /// instantiation (a `Nominal` with a non-empty argument list) and
  /// monomorphizes the set, deduplicated, in one worklist pass.
  fn run_monomorphization(&self, checker: &mut TypeChecker, span: Span) {
    let mut seen = HashSet::new();
    let mut initial = Vec::new();
    for (_, kind) in checker.types.iter() {
      if let TyKind::Nominal { sigma, args } = kind {
        if !args.is_empty() {
          let demand = InstantiationDemand { target: *sigma, args: args.clone() };
          if seen.insert(demand.clone()) {
            initial.push(demand);
          }
        }
      }
    }
    if initial.is_empty() { return }
    let mut cache = InstantiationCache::new();
    generics::monomorphize(checker, &mut cache, initial, span);
  }

  fn lower_procedures(&self, checker: &mut TypeChecker, file: &File, module: Symbol) -> Vec<LoweredProcedure> {
    collect_procedures(file)
      .into_iter()
      .filter(|(_, proc)| proc.body.is_some())
      .map(|(path, proc)| {
        let async_frame = if self.options.check_async {
          async_engine::build_frame(checker, proc)
        } else {
          None
        };
        let mut lowerer = Lowerer::new(checker, Some(module));
        let entry = lowerer.lower_procedure(proc);
        log::debug!(target: "compiler", "lowered `{}` ({} ir node(s))", path_name(&path), lowerer.pool.len());
        LoweredProcedure { path, ir: lowerer.pool, entry, async_frame }
      })
      .collect()
  }
}

fn path_name(path: &[Symbol]) -> String {
  path.iter().map(|&s| crate::symbol::resolve(s)).collect::<Vec<_>>().join("::")
}

/// Every procedure reachable from top-level items, modal transitions,
/// and class methods, paired with its fully-qualified path — the same
/// traversal `check::TypeChecker::collect_signatures` performs, kept
/// separate here since the checker doesn't hand back a flattened list.
fn collect_procedures(file: &File) -> Vec<(Vec<Symbol>, &Procedure)> {
  let mut out = Vec::new();
  for item in &file.items {
    match &item.kind {
      ItemKind::Procedure(proc) => out.push((vec![proc.name], proc)),
      ItemKind::Modal(decl) => {
        for state in &decl.states {
          for proc in &state.transitions {
            out.push((vec![decl.name, state.name, proc.name], proc));
          }
        }
      }
      ItemKind::Class(decl) => {
        for method in &decl.methods {
          out.push((vec![decl.name, method.name], method));
        }
      }
      _ => {}
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_options_run_every_pass() {
    let opts = PipelineOptions::default();
    assert!(opts.check_regions && opts.check_async && opts.monomorphize);
  }

  #[test]
  fn toml_overrides_individual_flags() {
    let opts = PipelineOptions::from_toml_str("check_async = false\n").unwrap();
    assert!(!opts.check_async);
    assert!(opts.check_regions);
  }

  #[test]
  fn malformed_toml_is_reported() {
    let err = PipelineOptions::from_toml_str("check_async = \"not a bool\"\n");
    assert!(err.is_err());
  }
}
