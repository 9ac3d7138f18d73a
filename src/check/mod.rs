//! Bidirectional type checking (spec §4.3). `TypeChecker` is the
//! per-file analysis context, parallel to how `resolve::Resolver` is
//! the per-file resolution context: it owns a `TypeTable` plus a span-
//! keyed side table of synthesized types, and is handed the `Sigma`/
//! `ValueTable` a prior `Resolver` pass already built.

pub mod capability;
pub mod contract;
pub mod expr;
pub mod operators;
pub mod place;
pub mod refinement;

use hashbrown::HashMap;

use crate::ast::*;
use crate::diagnostics::{codes, DiagSink, Diagnostic};
use crate::resolve::sigma::Sigma;
use crate::resolve::ValueTable;
use crate::span::Span;
use crate::symbol::Symbol;
use crate::types::intern::{TyId, TyKind, TypeTable};

pub struct ProcSig {
  pub params: Vec<TyId>,
  pub ret: TyId,
}

pub struct TypeChecker<'a> {
  pub sigma: &'a Sigma,
  pub values: &'a ValueTable,
  pub types: TypeTable,
  pub diags: &'a mut DiagSink,
  /// Type synthesized for a given expression's span; an accumulate-only
  /// side table like `resolve::Resolver::path_resolutions`.
  pub node_types: HashMap<Span, TyId>,
  /// Procedure signatures keyed by fully-qualified path, built once per
  /// file so `Call` can check against the real parameter/return types.
  pub proc_sigs: HashMap<Vec<Symbol>, ProcSig>,
  /// The `result` binding's type while checking a contract's `post`
  /// clause; `None` outside contract checking.
  pub result_ty: Option<TyId>,
  /// Local bindings currently in scope. A flat map rather than a frame
  /// stack like `resolve::Scope`: this checker runs after resolution
  /// has already rejected unresolved/out-of-scope names, so it only
  /// needs *a* type per name, not shadowing-correct lookup.
  pub locals: HashMap<Symbol, TyId>,
}

impl<'a> TypeChecker<'a> {
  pub fn new(sigma: &'a Sigma, values: &'a ValueTable, diags: &'a mut DiagSink) -> Self {
    Self {
      sigma,
      values,
      types: TypeTable::new(),
      diags,
      node_types: HashMap::new(),
      proc_sigs: HashMap::new(),
      result_ty: None,
      locals: HashMap::new(),
    }
  }

  pub fn check_file(&mut self, file: &File) {
    self.collect_signatures(file, &[]);
    for item in &file.items {
      self.check_item(item, &[]);
    }
  }

  fn collect_signatures(&mut self, file: &File, prefix: &[Symbol]) {
    for item in &file.items {
      match &item.kind {
        ItemKind::Procedure(proc) => {
          let mut path = prefix.to_vec();
          path.push(proc.name);
          let sig = self.lower_signature(proc);
          self.proc_sigs.insert(path, sig);
        }
        ItemKind::Modal(decl) => {
          for state in &decl.states {
            for proc in &state.transitions {
              let mut path = prefix.to_vec();
              path.extend([decl.name, state.name, proc.name]);
              let sig = self.lower_signature(proc);
              self.proc_sigs.insert(path, sig);
            }
          }
        }
        ItemKind::Class(decl) => {
          for method in &decl.methods {
            let mut path = prefix.to_vec();
            path.extend([decl.name, method.name]);
            let sig = self.lower_signature(method);
            self.proc_sigs.insert(path, sig);
          }
        }
        _ => {}
      }
    }
  }

  fn lower_signature(&mut self, proc: &Procedure) -> ProcSig {
    let params = proc.params.iter().map(|p| self.lower_type(&p.ty)).collect();
    let ret = proc.ret.as_ref().map(|t| self.lower_type(t)).unwrap_or_else(|| self.types.intern(TyKind::Prim(PrimTy::Unit)));
    ProcSig { params, ret }
  }

  fn check_item(&mut self, item: &Item, prefix: &[Symbol]) {
    match &item.kind {
      ItemKind::Static { init, ty, .. } => {
        let expected = ty.as_ref().map(|t| self.lower_type(t));
        let got = expr::synth_expr(self, init);
        if let Some(expected) = expected {
          if !crate::types::is_subtype(&self.types, self.sigma, got, expected) {
            self.diags.emit(Diagnostic::error(codes::OPERATOR_TYPE_MISMATCH, init.span, "static initializer does not match its declared type"));
          }
        }
      }
      ItemKind::Procedure(proc) => {
        let is_extern = item.attrs.markers.contains(Markers::EXTERN) || item.attrs.extern_abi.is_some();
        self.check_procedure(proc, is_extern, prefix);
      }
      ItemKind::Modal(decl) => {
        for state in &decl.states {
          for proc in &state.transitions {
            let mut path = prefix.to_vec();
            path.extend([decl.name, state.name]);
            self.check_procedure(proc, false, &path);
          }
        }
      }
      ItemKind::Class(decl) => {
        for method in &decl.methods {
          let mut path = prefix.to_vec();
          path.push(decl.name);
          self.check_procedure(method, false, &path);
        }
      }
      _ => {}
    }
  }

  fn check_procedure(&mut self, proc: &Procedure, is_extern: bool, prefix: &[Symbol]) {
    let mut path = prefix.to_vec();
    path.push(proc.name);
    let sig = self.proc_sigs.get(&path).map(|s| (s.params.clone(), s.ret));
    let (params, ret) = match sig {
      Some(s) => s,
      None => self.lowered_sig(proc),
    };
    for (param, ty) in proc.params.iter().zip(&params) {
      self.locals.insert(param.name, *ty);
    }
    capability::check_purity(self, proc, is_extern);
    if let Some(contract) = &proc.contract {
      contract::check_contract(self, contract, ret);
    }
    if let Some(body) = &proc.body {
      let got = expr::synth_expr(self, body);
      if !crate::types::is_subtype(&self.types, self.sigma, got, ret) {
        self.diags.emit(Diagnostic::error(
          codes::OPERATOR_TYPE_MISMATCH,
          body.span,
          format!("procedure `{}` does not return its declared type", crate::symbol::resolve(proc.name)),
        ));
      }
    }
  }

  fn lowered_sig(&mut self, proc: &Procedure) -> (Vec<TyId>, TyId) {
    let sig = self.lower_signature(proc);
    (sig.params, sig.ret)
  }

  /// Resolves a surface `TypeExpr` to an interned `TyId`, looking types
  /// up in `Sigma` by path directly (this pass doesn't depend on the
  /// resolver's span side table so it can also run over synthetic
  /// generic-instantiation clones, see `crate::generics`).
  pub fn lower_type(&mut self, ty: &TypeExpr) -> TyId {
    match &*ty.kind {
      TypeExprKind::Prim(p) => self.types.intern(TyKind::Prim(*p)),
      TypeExprKind::StringTy(s) => self.types.intern(TyKind::StringTy(*s)),
      TypeExprKind::BytesTy(s) => self.types.intern(TyKind::BytesTy(*s)),
      TypeExprKind::Ptr { inner, state } => {
        let inner = self.lower_type(inner);
        self.types.intern(TyKind::Ptr { inner, state: *state })
      }
      TypeExprKind::RawPtr { mutability, inner } => {
        let inner = self.lower_type(inner);
        self.types.intern(TyKind::RawPtr { mutability: *mutability, inner })
      }
      TypeExprKind::Tuple(elems) => {
        let elems = elems.iter().map(|t| self.lower_type(t)).collect();
        self.types.intern(TyKind::Tuple(elems))
      }
      TypeExprKind::Array { elem, len } => {
        let elem = self.lower_type(elem);
        let len = const_len(len);
        self.types.intern(TyKind::Array { elem, len })
      }
      TypeExprKind::Slice(elem) => {
        let elem = self.lower_type(elem);
        self.types.intern(TyKind::Slice(elem))
      }
      TypeExprKind::Union(members) => {
        let members = members.iter().map(|t| self.lower_type(t)).collect();
        self.types.union_of(members)
      }
      TypeExprKind::Func { params, ret } => {
        let params = params.iter().map(|t| self.lower_type(t)).collect();
        let ret = self.lower_type(ret);
        self.types.intern(TyKind::Func { params, ret })
      }
      TypeExprKind::Path(path) => self.lower_path_type(path),
      TypeExprKind::ModalState { base, state } => {
        match self.sigma.lookup(&base.segments) {
          Some(sigma_id) => {
            let args = base.generic_args.iter().map(|t| self.lower_type(t)).collect();
            self.types.intern(TyKind::ModalState { base: sigma_id, state: *state, args })
          }
          None => self.types.intern(TyKind::Error),
        }
      }
      TypeExprKind::Permission { perm, inner } => {
        let inner = self.lower_type(inner);
        self.types.intern(TyKind::Permission { perm: *perm, inner })
      }
      TypeExprKind::Refinement { base, predicate } => {
        let base = self.lower_type(base);
        self.types.intern_refinement(base, predicate.clone())
      }
      TypeExprKind::Opaque(path) => match self.sigma.lookup(&path.segments) {
        Some(id) => self.types.intern(TyKind::Opaque(id)),
        None => self.types.intern(TyKind::Error),
      },
      TypeExprKind::Dynamic(path) => match self.sigma.lookup(&path.segments) {
        Some(id) => self.types.intern(TyKind::Dynamic(id)),
        None => self.types.intern(TyKind::Error),
      },
    }
  }

  fn lower_path_type(&mut self, path: &Path) -> TyId {
    match self.sigma.lookup(&path.segments) {
      Some(sigma_id) => {
        let args = path.generic_args.iter().map(|t| self.lower_type(t)).collect();
        self.types.intern(TyKind::Nominal { sigma: sigma_id, args })
      }
      None => {
        self.diags.emit(Diagnostic::error(codes::UNRESOLVED_REFERENCE, path.span, "unknown type"));
        self.types.intern(TyKind::Error)
      }
    }
  }
}

/// Array lengths are a const expression in the surface grammar; only a
/// literal integer length is supported without full constant folding.
fn const_len(len: &Expr) -> u64 {
  match &*len.kind {
    ExprKind::Literal(Literal::Int(v)) => u64::try_from(*v).unwrap_or(0),
    _ => 0,
  }
}
