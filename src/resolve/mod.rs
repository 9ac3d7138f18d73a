//! Name resolution (spec §4.2): binds every identifier and path in a
//! parsed file to a declaration, two passes over the AST mirroring the
//! teacher's `types::entity::make_names` pre-pass followed by a body
//! walk, except here the pre-pass is generalized from "primops and
//! imports" to the full surface-language item set.
//!
//! Pass 1 ([`Resolver::register_items`]) walks top-level items and
//! populates [`Sigma`] (types) and [`ValueTable`] (statics, procedures,
//! modal constructors), recording `using ... as` aliases along the way.
//! Pass 2 ([`Resolver::resolve_file`]) walks procedure bodies, static
//! initializers, and contracts with a lexical [`Scope`], resolving each
//! `Identifier`/`Path` reference against locals, then module values,
//! then types, and recording the outcome in `path_resolutions` rather
//! than mutating the AST (spec §3.1's spans are stable `Hash` keys, so
//! this mirrors how [`crate::diagnostics::DiagSink`] accumulates
//! findings instead of rewriting its input).

pub mod scope;
pub mod sigma;

use hashbrown::HashMap;

use crate::ast::*;
use crate::diagnostics::{codes, DiagSink, Diagnostic};
use crate::span::Span;
use crate::symbol::{resolve as resolve_sym, Symbol};

pub use scope::{LocalId, Resolution, Scope, ValueId, ValueKind, ValueTable};
pub use sigma::{Sigma, SigmaDecl, SigmaId};

pub struct Resolver<'d> {
  pub sigma: Sigma,
  pub values: ValueTable,
  diags: &'d mut DiagSink,
  /// `using foo::bar as baz` binds `baz` to the path `foo::bar` for the
  /// rest of name resolution (spec's SUPPLEMENT to §4.2).
  aliases: HashMap<Symbol, Vec<Symbol>>,
  pub path_resolutions: HashMap<Span, Resolution>,
}

impl<'d> Resolver<'d> {
  pub fn new(diags: &'d mut DiagSink) -> Self {
    Self {
      sigma: Sigma::new(),
      values: ValueTable::new(),
      diags,
      aliases: HashMap::new(),
      path_resolutions: HashMap::new(),
    }
  }

  /// Runs both passes over `file` and returns the populated tables via
  /// `self` (callers keep the `Resolver` around for the type checker).
  pub fn run(&mut self, file: &File) {
    self.register_items(&file.items);
    for item in &file.items {
      self.resolve_item_body(item);
    }
  }

  // ------------------------------------------------------------ pass 1

  fn register_items(&mut self, items: &[Item]) {
    for item in items {
      match &item.kind {
        ItemKind::Import { path, alias } | ItemKind::Using { path, alias } => {
          if let Some(alias) = alias {
            self.aliases.insert(*alias, path.segments.to_vec());
          }
        }
        ItemKind::Static { name, mutable, ty, .. } => {
          self.declare_value(vec![*name], item.vis, item.span, ValueKind::Static { mutable: *mutable, ty: ty.clone() });
        }
        ItemKind::Procedure(proc) => {
          self.declare_value(vec![proc.name], item.vis, item.span, ValueKind::Procedure(proc.name));
        }
        ItemKind::Record(decl) => {
          self.declare_type(vec![decl.name], item.vis, item.span, SigmaDecl::Record(decl.clone()));
        }
        ItemKind::Enum(decl) => {
          self.declare_type(vec![decl.name], item.vis, item.span, SigmaDecl::Enum(decl.clone()));
        }
        ItemKind::Modal(decl) => {
          let modal_id = self.declare_type(vec![decl.name], item.vis, item.span, SigmaDecl::Modal(decl.clone()));
          if let Some(modal_id) = modal_id {
            for state in &decl.states {
              self.declare_value(
                vec![decl.name, state.name],
                item.vis,
                state.span,
                ValueKind::ModalConstructor { modal: modal_id, state: state.name },
              );
              for proc in &state.transitions {
                self.declare_value(vec![decl.name, state.name, proc.name], item.vis, item.span, ValueKind::Procedure(proc.name));
              }
            }
          }
        }
        ItemKind::Class(decl) => {
          let class_id = self.declare_type(vec![decl.name], item.vis, item.span, SigmaDecl::Class(decl.clone()));
          if class_id.is_some() {
            for method in &decl.methods {
              self.declare_value(vec![decl.name, method.name], item.vis, item.span, ValueKind::Procedure(method.name));
            }
          }
        }
        ItemKind::TypeAlias { name, generics, target } => {
          self.declare_type(vec![*name], item.vis, item.span, SigmaDecl::Alias { generics: generics.clone(), target: target.clone() });
        }
        ItemKind::ErrorItem => {}
      }
    }
  }

  fn declare_type(&mut self, path: Vec<Symbol>, vis: Visibility, span: Span, decl: SigmaDecl) -> Option<SigmaId> {
    match self.sigma.insert(path.clone(), vis, span, decl) {
      Ok(id) => Some(id),
      Err(existing) => {
        self.duplicate(&path, span, self.sigma.get(existing).span);
        None
      }
    }
  }

  fn declare_value(&mut self, path: Vec<Symbol>, vis: Visibility, span: Span, kind: ValueKind) -> Option<ValueId> {
    match self.values.insert(path.clone(), vis, span, kind) {
      Ok(id) => Some(id),
      Err(existing) => {
        self.duplicate(&path, span, self.values.get(existing).span);
        None
      }
    }
  }

  fn duplicate(&mut self, path: &[Symbol], span: Span, first: Span) {
    let name = path.iter().map(|&s| resolve_sym(s)).collect::<Vec<_>>().join("::");
    self.diags.emit(
      Diagnostic::error(codes::DUPLICATE_DECLARATION, span, format!("`{name}` is already declared"))
        .with_note(first, "first declared here"),
    );
  }

  // ------------------------------------------------------------ pass 2

  fn resolve_item_body(&mut self, item: &Item) {
    match &item.kind {
      ItemKind::Static { init, .. } => {
        let mut scope = Scope::new();
        scope.push();
        self.resolve_expr(init, &mut scope);
        scope.pop();
      }
      ItemKind::Procedure(proc) => self.resolve_procedure(proc),
      ItemKind::Modal(decl) => {
        for state in &decl.states {
          for proc in &state.transitions {
            self.resolve_procedure(proc);
          }
        }
      }
      ItemKind::Class(decl) => {
        for method in &decl.methods {
          self.resolve_procedure(method);
        }
      }
      _ => {}
    }
  }

  fn resolve_procedure(&mut self, proc: &Procedure) {
    let mut scope = Scope::new();
    scope.push();
    for param in &proc.params {
      scope.declare(param.name, param.span, false);
      self.resolve_type(&param.ty, &mut scope);
    }
    if let Some(ret) = &proc.ret {
      self.resolve_type(ret, &mut scope);
    }
    if let Some(contract) = &proc.contract {
      if let Some(pre) = &contract.pre { self.resolve_expr(pre, &mut scope) }
      if let Some(post) = &contract.post { self.resolve_expr(post, &mut scope) }
    }
    if let Some(body) = &proc.body {
      self.resolve_expr(body, &mut scope);
    }
    scope.pop();
  }

  fn resolve_block(&mut self, block: &Block, scope: &mut Scope) {
    scope.push();
    for stmt in &block.stmts {
      self.resolve_stmt(stmt, scope);
    }
    if let Some(tail) = &block.tail {
      self.resolve_expr(tail, scope);
    }
    scope.pop();
  }

  fn resolve_stmt(&mut self, stmt: &Stmt, scope: &mut Scope) {
    match &stmt.kind {
      StmtKind::Let { pat, ty, init, mutable } | StmtKind::ShadowLet { pat, ty, init, mutable } => {
        self.resolve_expr(init, scope);
        if let Some(ty) = ty { self.resolve_type(ty, scope) }
        self.bind_pattern(pat, scope, *mutable);
      }
      StmtKind::Assign { place, value } => {
        self.resolve_expr(place, scope);
        self.resolve_expr(value, scope);
      }
      StmtKind::CompoundAssign { place, value, .. } => {
        self.resolve_expr(place, scope);
        self.resolve_expr(value, scope);
      }
      StmtKind::ExprStmt(e) | StmtKind::Result(e) | StmtKind::Defer(e) => self.resolve_expr(e, scope),
      StmtKind::Return(e) | StmtKind::Break { value: e, .. } => {
        if let Some(e) = e { self.resolve_expr(e, scope) }
      }
      StmtKind::Continue { .. } => {}
      StmtKind::Region { init, body, .. } => {
        self.resolve_expr(init, scope);
        self.resolve_block(body, scope);
      }
      StmtKind::Frame { body, .. } => self.resolve_block(body, scope),
      StmtKind::ErrorStmt => {}
    }
  }

  fn bind_pattern(&mut self, pat: &Pattern, scope: &mut Scope, mutable: bool) {
    match &*pat.kind {
      PatternKind::Wildcard | PatternKind::Literal(_) | PatternKind::Range { .. } => {}
      PatternKind::Identifier { name, mutable: m } => { scope.declare(*name, pat.span, *m || mutable); }
      PatternKind::TypedBinding { name, ty } => {
        self.resolve_type(ty, scope);
        scope.declare(*name, pat.span, mutable);
      }
      PatternKind::Tuple(elems) => {
        for e in elems { self.bind_pattern(e, scope, mutable) }
      }
      PatternKind::Record { path, fields, .. } => {
        self.resolve_type_path(path, scope);
        for (_, p) in fields { self.bind_pattern(p, scope, mutable) }
      }
      PatternKind::Enum { path, payload, .. } => {
        self.resolve_type_path(path, scope);
        match payload {
          EnumPatternPayload::None => {}
          EnumPatternPayload::Tuple(elems) => { for e in elems { self.bind_pattern(e, scope, mutable) } }
          EnumPatternPayload::Record(fields) => { for (_, p) in fields { self.bind_pattern(p, scope, mutable) } }
        }
      }
      PatternKind::Modal { path, payload, .. } => {
        self.resolve_type_path(path, scope);
        if let Some(fields) = payload {
          for (_, p) in fields { self.bind_pattern(p, scope, mutable) }
        }
      }
    }
  }

  fn resolve_expr(&mut self, expr: &Expr, scope: &mut Scope) {
    match &*expr.kind {
      ExprKind::Literal(_) | ExprKind::ErrorExpr => {}
      ExprKind::Identifier(name) => self.resolve_identifier(*name, expr.span, scope),
      ExprKind::Path(path) => self.resolve_value_path(path, expr.span, scope),
      ExprKind::Field { base, .. } | ExprKind::TupleAccess { base, .. } => self.resolve_expr(base, scope),
      ExprKind::Index { base, index } => { self.resolve_expr(base, scope); self.resolve_expr(index, scope); }
      ExprKind::Call { callee, args } => { self.resolve_expr(callee, scope); for a in args { self.resolve_expr(a, scope) } }
      ExprKind::MethodCall { receiver, generic_args, args, .. } => {
        self.resolve_expr(receiver, scope);
        for g in generic_args { self.resolve_type(g, scope) }
        for a in args { self.resolve_expr(a, scope) }
      }
      ExprKind::QualifiedApply { path, args } => {
        self.resolve_type_path(path, scope);
        for a in args { self.resolve_expr(a, scope) }
      }
      ExprKind::Cast { expr: e, ty } => { self.resolve_expr(e, scope); self.resolve_type(ty, scope); }
      ExprKind::If { cond, then_branch, else_branch } => {
        self.resolve_expr(cond, scope);
        self.resolve_expr(then_branch, scope);
        if let Some(e) = else_branch { self.resolve_expr(e, scope) }
      }
      ExprKind::Match { scrutinee, arms } => {
        self.resolve_expr(scrutinee, scope);
        for arm in arms {
          scope.push();
          self.bind_pattern(&arm.pattern, scope, false);
          if let Some(g) = &arm.guard { self.resolve_expr(g, scope) }
          self.resolve_expr(&arm.body, scope);
          scope.pop();
        }
      }
      ExprKind::Range { from, to, .. } => {
        if let Some(e) = from { self.resolve_expr(e, scope) }
        if let Some(e) = to { self.resolve_expr(e, scope) }
      }
      ExprKind::Deref(e) | ExprKind::Move(e) | ExprKind::Alloc(e) | ExprKind::Propagate(e)
      | ExprKind::Wait(e) | ExprKind::Yield(e) | ExprKind::YieldRelease(e) | ExprKind::YieldFrom(e) | ExprKind::Sync(e) => {
        self.resolve_expr(e, scope);
      }
      ExprKind::AddrOf { expr: e, .. } => self.resolve_expr(e, scope),
      ExprKind::Transmute { expr: e, ty } => { self.resolve_expr(e, scope); self.resolve_type(ty, scope); }
      ExprKind::RecordLiteral { path, fields } => {
        self.resolve_type_path(path, scope);
        for f in fields { self.resolve_expr(&f.value, scope) }
      }
      ExprKind::EnumLiteral { path, payload, .. } => {
        self.resolve_type_path(path, scope);
        if let Some(args) = payload { for a in args { self.resolve_expr(a, scope) } }
      }
      ExprKind::TupleLiteral(elems) | ExprKind::ArrayLiteral(elems) | ExprKind::Race(elems) | ExprKind::All(elems) => {
        for e in elems { self.resolve_expr(e, scope) }
      }
      ExprKind::ArrayRepeat { value, count } => { self.resolve_expr(value, scope); self.resolve_expr(count, scope); }
      ExprKind::Sizeof(ty) | ExprKind::Alignof(ty) => self.resolve_type(ty, scope),
      ExprKind::Block(b) | ExprKind::UnsafeBlock(b) => self.resolve_block(b, scope),
      ExprKind::Loop { form, body, .. } => {
        scope.push();
        match form {
          LoopForm::Infinite => {}
          LoopForm::While(cond) => self.resolve_expr(cond, scope),
          LoopForm::For { pat, iter } => {
            self.resolve_expr(iter, scope);
            self.bind_pattern(pat, scope, false);
          }
        }
        self.resolve_block(body, scope);
        scope.pop();
      }
      ExprKind::Parallel { domain, body } => { self.resolve_expr(domain, scope); self.resolve_block(body, scope); }
      ExprKind::Spawn { body, .. } => self.resolve_expr(body, scope),
      ExprKind::Dispatch { range, options, body, .. } => {
        self.resolve_expr(range, scope);
        if let Some(chunk) = &options.chunk { self.resolve_expr(chunk, scope) }
        scope.push();
        self.resolve_block(body, scope);
        scope.pop();
      }
      ExprKind::Unary { expr: e, .. } => self.resolve_expr(e, scope),
      ExprKind::Binary { lhs, rhs, .. } => { self.resolve_expr(lhs, scope); self.resolve_expr(rhs, scope); }
      _ => {}
    }
  }

  fn resolve_type(&mut self, ty: &TypeExpr, scope: &mut Scope) {
    match &*ty.kind {
      TypeExprKind::Prim(_) | TypeExprKind::StringTy(_) | TypeExprKind::BytesTy(_) => {}
      TypeExprKind::Ptr { inner, .. } | TypeExprKind::RawPtr { inner, .. } | TypeExprKind::Slice(inner) => self.resolve_type(inner, scope),
      TypeExprKind::Tuple(elems) | TypeExprKind::Union(elems) => { for t in elems { self.resolve_type(t, scope) } }
      TypeExprKind::Array { elem, len } => { self.resolve_type(elem, scope); self.resolve_expr(len, scope); }
      TypeExprKind::Func { params, ret } => { for p in params { self.resolve_type(p, scope) } self.resolve_type(ret, scope); }
      TypeExprKind::Path(path) | TypeExprKind::Opaque(path) | TypeExprKind::Dynamic(path) => self.resolve_type_path(path, scope),
      TypeExprKind::ModalState { base, .. } => self.resolve_type_path(base, scope),
      TypeExprKind::Permission { inner, .. } => self.resolve_type(inner, scope),
      TypeExprKind::Refinement { base, predicate } => { self.resolve_type(base, scope); self.resolve_expr(predicate, scope); }
    }
  }

  // ----------------------------------------------------------- lookups

  fn aliased(&self, segments: &[Symbol]) -> Vec<Symbol> {
    if let [head, rest @ ..] = segments {
      if let Some(target) = self.aliases.get(head) {
        let mut full = target.clone();
        full.extend_from_slice(rest);
        return full;
      }
    }
    segments.to_vec()
  }

  fn resolve_identifier(&mut self, name: Symbol, span: Span, scope: &Scope) {
    if let Some(local) = scope.lookup(name) {
      self.path_resolutions.insert(span, Resolution::Local(local));
      return;
    }
    if let Some(value) = self.values.lookup(&[name]) {
      self.path_resolutions.insert(span, Resolution::Value(value));
      return;
    }
    if let Some(sigma) = self.sigma.lookup(&[name]) {
      self.path_resolutions.insert(span, Resolution::Sigma(sigma));
      return;
    }
    self.unresolved(name, span);
  }

  fn resolve_value_path(&mut self, path: &Path, span: Span, scope: &mut Scope) {
    let segments = self.aliased(&path.segments);
    for g in &path.generic_args {
      self.resolve_type(g, scope);
    }
    if segments.len() == 1 {
      self.resolve_identifier(segments[0], span, scope);
      return;
    }
    if let Some(value) = self.values.lookup(&segments) {
      self.path_resolutions.insert(span, Resolution::Value(value));
      return;
    }
    if let Some(sigma) = self.sigma.lookup(&segments) {
      self.path_resolutions.insert(span, Resolution::Sigma(sigma));
      return;
    }
    self.unresolved_path(&segments, span);
  }

  fn resolve_type_path(&mut self, path: &Path, scope: &mut Scope) {
    let segments = self.aliased(&path.segments);
    for g in &path.generic_args {
      self.resolve_type(g, scope);
    }
    if let Some(sigma) = self.sigma.lookup(&segments) {
      self.path_resolutions.insert(path.span, Resolution::Sigma(sigma));
      return;
    }
    // A path naming a modal state's constructor (`Door::Open`) resolves
    // through the value table instead; record patterns on a bare type
    // name that turns out to be a value are a checker-time error, not
    // a resolver one.
    if let Some(value) = self.values.lookup(&segments) {
      self.path_resolutions.insert(path.span, Resolution::Value(value));
      return;
    }
    self.unresolved_path(&segments, path.span);
  }

  fn unresolved(&mut self, name: Symbol, span: Span) {
    self.diags.emit(Diagnostic::error(codes::UNRESOLVED_REFERENCE, span, format!("cannot find `{}` in this scope", resolve_sym(name))));
  }

  fn unresolved_path(&mut self, segments: &[Symbol], span: Span) {
    let name = segments.iter().map(|&s| resolve_sym(s)).collect::<Vec<_>>().join("::");
    self.diags.emit(Diagnostic::error(codes::UNRESOLVED_REFERENCE, span, format!("cannot find `{name}` in this scope")));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::idx::Idx;
  use crate::span::FileId;
  use crate::symbol::intern;

  fn sp() -> Span { Span::dummy(FileId::from_usize(0)) }

  fn ident(name: &str) -> Expr {
    Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::Identifier(intern(name))) }
  }

  fn static_item(name: &str, init: Expr) -> Item {
    Item {
      span: sp(),
      vis: Visibility::Private,
      attrs: AttributeSet::default(),
      doc: Vec::new(),
      kind: ItemKind::Static { name: intern(name), mutable: false, ty: None, init },
    }
  }

  #[test]
  fn static_referencing_undeclared_name_is_flagged() {
    let mut diags = DiagSink::new();
    let file = File { items: vec![static_item("x", ident("y"))], module_docs: Vec::new() };
    let mut resolver = Resolver::new(&mut diags);
    resolver.run(&file);
    assert!(diags.has_errors());
    assert_eq!(diags.diagnostics()[0].code, codes::UNRESOLVED_REFERENCE);
  }

  #[test]
  fn later_static_sees_earlier_one() {
    let mut diags = DiagSink::new();
    let lit = Expr { span: sp(), kind: std::boxed::Box::new(ExprKind::Literal(Literal::Int(1))) };
    let file = File {
      items: vec![static_item("x", lit), static_item("y", ident("x"))],
      module_docs: Vec::new(),
    };
    let mut resolver = Resolver::new(&mut diags);
    resolver.run(&file);
    assert!(!diags.has_errors());
  }

  #[test]
  fn duplicate_record_declaration_is_flagged() {
    let mut diags = DiagSink::new();
    let name = intern("Point");
    let decl = RecordDecl { name, generics: Vec::new(), fields: Vec::new() };
    let item = |decl: RecordDecl| Item {
      span: sp(),
      vis: Visibility::Public,
      attrs: AttributeSet::default(),
      doc: Vec::new(),
      kind: ItemKind::Record(decl),
    };
    let file = File { items: vec![item(decl.clone()), item(decl)], module_docs: Vec::new() };
    let mut resolver = Resolver::new(&mut diags);
    resolver.run(&file);
    assert_eq!(diags.diagnostics().iter().filter(|d| d.code == codes::DUPLICATE_DECLARATION).count(), 1);
  }
}
