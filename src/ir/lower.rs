//! IR lowering (spec §3.4, §4.4-§4.7): translates a type-checked
//! procedure body into an [`IrPool`]. Reuses `check::TypeChecker::
//! node_types` for each expression's analysis type rather than
//! re-synthesizing it, the same "trust the prior pass's side table"
//! approach `check::expr::synth_expr` itself uses for place types.

use hashbrown::HashMap;

use crate::ast::*;
use crate::check::TypeChecker;
use crate::resolve::scope::LocalId;
use crate::span::Span;
use crate::symbol::Symbol;
use crate::types::intern::{TyId, TyKind};

use super::nodes::{IrId, IrNode, IrPool};
use super::panic::panic_codes_for_op;

pub struct Lowerer<'a, 'c> {
  checker: &'a mut TypeChecker<'c>,
  pub pool: IrPool,
  /// Flat symbol → `LocalId` map assigned on first sight within this
  /// procedure body. Like `region::RegionChecker`'s local tracking,
  /// this doesn't distinguish two shadowed bindings of the same name;
  /// by this stage that's sound because the resolver already rejected
  /// any reference that would be ambiguous under shadowing (each
  /// surviving reference resolves to whichever binding is lexically
  /// innermost, which is also the one this map's last write recorded).
  locals: HashMap<Symbol, LocalId>,
  next_local: u32,
  current_module: Option<Symbol>,
}

impl<'a, 'c> Lowerer<'a, 'c> {
  pub fn new(checker: &'a mut TypeChecker<'c>, current_module: Option<Symbol>) -> Self {
    Self { checker, pool: IrPool::new(), locals: HashMap::new(), next_local: 0, current_module }
  }

  fn local_for(&mut self, name: Symbol) -> LocalId {
    *self.locals.entry(name).or_insert_with(|| {
      let id = crate::idx::Idx::from_usize(self.next_local as usize);
      self.next_local += 1;
      id
    })
  }

  fn ty_of(&mut self, span: Span) -> TyId {
    match self.checker.node_types.get(&span).copied() {
      Some(ty) => ty,
      // Spans not in the side table are ones the checker skipped
      // (e.g. the span of an already-`ErrorExpr` node); treat them as
      // already-erroneous rather than panicking the lowerer.
      None => self.checker.types.intern(TyKind::Error),
    }
  }

  fn push(&mut self, node: IrNode, ty: TyId) -> IrId { self.pool.push(node, ty) }

  pub fn lower_procedure(&mut self, proc: &Procedure) -> Option<IrId> {
    let body = proc.body.as_ref()?;
    for param in &proc.params {
      self.local_for(param.name);
    }
    Some(self.lower_expr(body))
  }

  pub fn lower_expr(&mut self, expr: &Expr) -> IrId {
    let ty = self.ty_of(expr.span);
    match &*expr.kind {
      ExprKind::ErrorExpr => self.push(IrNode::Error, ty),
      ExprKind::Literal(lit) => self.push(IrNode::Literal(lit.clone()), ty),
      ExprKind::Identifier(name) => {
        let local = self.local_for(*name);
        self.push(IrNode::ReadVar(local), ty)
      }
      ExprKind::Path(path) => {
        let name = path.segments.last().copied().unwrap_or_else(|| crate::symbol::intern(""));
        let local = self.local_for(name);
        self.push(IrNode::ReadVar(local), ty)
      }
      ExprKind::Binary { op, lhs, rhs } => {
        let l = self.lower_expr(lhs);
        let r = self.lower_expr(rhs);
        if !panic_codes_for_op(*op).is_empty() {
          self.push(IrNode::CheckOp { op: *op, lhs: l, rhs: r }, ty)
        } else {
          self.push(IrNode::BinaryOp { op: *op, lhs: l, rhs: r }, ty)
        }
      }
      ExprKind::Unary { op, expr: e } => {
        let operand = self.lower_expr(e);
        self.push(IrNode::UnaryOp { op: *op, operand }, ty)
      }
      ExprKind::Cast { expr: e, .. } => {
        let value = self.lower_expr(e);
        self.push(IrNode::Cast { value, info: None }, ty)
      }
      ExprKind::Transmute { expr: e, .. } => {
        let value = self.lower_expr(e);
        self.push(IrNode::Transmute { value }, ty)
      }
      ExprKind::If { cond, then_branch, else_branch } => {
        let c = self.lower_expr(cond);
        let then_id = self.lower_expr(then_branch);
        let else_id = else_branch.as_ref().map(|e| self.lower_expr(e));
        self.push(IrNode::If { cond: c, then_branch: then_id, else_branch: else_id }, ty)
      }
      ExprKind::Match { scrutinee, arms } => {
        let s = self.lower_expr(scrutinee);
        let lowered_arms = arms.iter().map(|arm| {
          let guard_or_body = self.lower_expr(&arm.body);
          (s, guard_or_body)
        }).collect();
        self.push(IrNode::Match { scrutinee: s, arms: lowered_arms }, ty)
      }
      ExprKind::Block(b) | ExprKind::UnsafeBlock(b) => self.lower_block(b, ty),
      ExprKind::Loop { form, body, .. } => {
        let inner = match form {
          LoopForm::While(cond) => {
            let c = self.lower_expr(cond);
            let block_body = self.lower_block(body, ty);
            self.push(IrNode::If { cond: c, then_branch: block_body, else_branch: None }, ty)
          }
          LoopForm::For { pat, iter } => {
            let iter_id = self.lower_expr(iter);
            if let PatternKind::Identifier { name, .. } = &*pat.kind {
              let local = self.local_for(*name);
              self.push(IrNode::BindVar { local, init: iter_id }, ty);
            }
            self.lower_block(body, ty)
          }
          LoopForm::Infinite => self.lower_block(body, ty),
        };
        self.push(IrNode::Loop { body: inner }, ty)
      }
      ExprKind::Call { callee, args } => {
        let symbol = match &*callee.kind {
          ExprKind::Identifier(name) => vec![*name],
          ExprKind::Path(path) => path.segments.to_vec(),
          _ => Vec::new(),
        };
        let lowered_args = args.iter().map(|a| self.lower_expr(a)).collect();
        let call = self.push(IrNode::Call { symbol, args: lowered_args }, ty);
        self.push(IrNode::PanicCheck, ty);
        call
      }
      ExprKind::MethodCall { receiver, args, method, .. } => {
        let recv = self.lower_expr(receiver);
        let mut lowered_args = vec![recv];
        lowered_args.extend(args.iter().map(|a| self.lower_expr(a)));
        self.push(IrNode::Call { symbol: vec![*method], args: lowered_args }, ty)
      }
      ExprKind::QualifiedApply { path, args } => {
        let symbol = path.segments.to_vec();
        let lowered_args = args.iter().map(|a| self.lower_expr(a)).collect();
        self.push(IrNode::Call { symbol, args: lowered_args }, ty)
      }
      ExprKind::Field { base, .. } => {
        let base_id = self.lower_expr(base);
        self.push(IrNode::ReadPtr { ptr: base_id, info: Some(super::nodes::ValueInfo::FieldOffset(0)) }, ty)
      }
      ExprKind::TupleAccess { base, index } => {
        let base_id = self.lower_expr(base);
        self.push(IrNode::ReadPtr { ptr: base_id, info: Some(super::nodes::ValueInfo::TupleIndex(*index)) }, ty)
      }
      ExprKind::Index { base, index } => {
        let base_id = self.lower_expr(base);
        let index_id = self.lower_expr(index);
        let len = self.push(IrNode::ReadPtr { ptr: base_id, info: Some(super::nodes::ValueInfo::SliceElem) }, ty);
        self.push(IrNode::CheckIndex { index: index_id, len }, ty)
      }
      ExprKind::Deref(inner) => {
        let ptr = self.lower_expr(inner);
        self.push(IrNode::ReadPtr { ptr, info: None }, ty)
      }
      ExprKind::AddrOf { expr: e, .. } => {
        let place = self.lower_expr(e);
        self.push(IrNode::AddrOf { place }, ty)
      }
      ExprKind::Move(e) | ExprKind::Propagate(e) => self.lower_expr(e),
      ExprKind::Alloc(e) => {
        let value = self.lower_expr(e);
        self.push(IrNode::Alloc { value, region: None }, ty)
      }
      ExprKind::TupleLiteral(elems) | ExprKind::ArrayLiteral(elems) => {
        let items = elems.iter().map(|e| self.lower_expr(e)).collect();
        self.push(IrNode::Seq(items), ty)
      }
      ExprKind::ArrayRepeat { value, count } => {
        let v = self.lower_expr(value);
        let _ = self.lower_expr(count);
        self.push(IrNode::Seq(vec![v]), ty)
      }
      ExprKind::RecordLiteral { fields, .. } => {
        let items = fields.iter().map(|f| self.lower_expr(&f.value)).collect();
        self.push(IrNode::Seq(items), ty)
      }
      ExprKind::EnumLiteral { payload, .. } => {
        let items = payload.as_ref().map(|args| args.iter().map(|a| self.lower_expr(a)).collect()).unwrap_or_default();
        self.push(IrNode::Seq(items), ty)
      }
      ExprKind::Sizeof(_) | ExprKind::Alignof(_) => self.push(IrNode::Seq(Vec::new()), ty),
      ExprKind::Range { from, to, .. } => {
        let items = [from, to].into_iter().flatten().map(|e| self.lower_expr(e)).collect();
        self.push(IrNode::Seq(items), ty)
      }
      ExprKind::Yield(e) => { let v = self.lower_expr(e); self.push(IrNode::Yield(v), ty) }
      ExprKind::YieldRelease(e) => { let v = self.lower_expr(e); self.push(IrNode::Yield(v), ty) }
      ExprKind::YieldFrom(e) => { let v = self.lower_expr(e); self.push(IrNode::YieldFrom(v), ty) }
      ExprKind::Sync(e) => { let v = self.lower_expr(e); self.push(IrNode::Sync(v), ty) }
      ExprKind::Wait(e) => { let v = self.lower_expr(e); self.push(IrNode::Wait(v), ty) }
      ExprKind::Race(arms) => {
        let items = arms.iter().map(|a| self.lower_expr(a)).collect::<Vec<_>>();
        let race = self.push(IrNode::All(items), ty);
        self.push(IrNode::RaceReturn(race), ty)
      }
      ExprKind::All(arms) => {
        let items = arms.iter().map(|a| self.lower_expr(a)).collect();
        self.push(IrNode::All(items), ty)
      }
      ExprKind::Parallel { domain, body } => {
        let d = self.lower_expr(domain);
        let b = self.lower_block(body, ty);
        self.push(IrNode::Parallel { domain: d, body: b }, ty)
      }
      ExprKind::Spawn { body, .. } => {
        let b = self.lower_expr(body);
        self.push(IrNode::Spawn { body: b }, ty)
      }
      ExprKind::Dispatch { range, body, options, .. } => {
        let r = self.lower_expr(range);
        let b = self.lower_block(body, ty);
        let chunk = options.chunk.as_ref().map(|c| self.lower_expr(c));
        self.push(IrNode::Dispatch { range: r, body: b, reduce: options.reduce, ordered: options.ordered, chunk }, ty)
      }
    }
  }

  fn lower_block(&mut self, block: &Block, block_ty: TyId) -> IrId {
    let mut stmts = Vec::new();
    for stmt in &block.stmts {
      if let Some(id) = self.lower_stmt(stmt) { stmts.push(id) }
    }
    let tail = block.tail.as_ref().map(|t| self.lower_expr(t));
    self.push(IrNode::Block(stmts, tail), block_ty)
  }

  fn lower_stmt(&mut self, stmt: &Stmt) -> Option<IrId> {
    let unit = self.checker.types.intern(TyKind::Prim(PrimTy::Unit));
    match &stmt.kind {
      StmtKind::Let { pat, init, .. } | StmtKind::ShadowLet { pat, init, .. } => {
        let value = self.lower_expr(init);
        let PatternKind::Identifier { name, .. } = &*pat.kind else {
          return Some(self.push(IrNode::Seq(vec![value]), unit));
        };
        let local = self.local_for(*name);
        Some(self.push(IrNode::BindVar { local, init: value }, unit))
      }
      StmtKind::Assign { place, value } => {
        let v = self.lower_expr(value);
        if let ExprKind::Identifier(name) = &*place.kind {
          let local = self.local_for(*name);
          Some(self.push(IrNode::StoreVar { local, value: v }, unit))
        } else {
          let p = self.lower_expr(place);
          Some(self.push(IrNode::WritePtr { ptr: p, value: v }, unit))
        }
      }
      StmtKind::CompoundAssign { op, place, value } => {
        let v = self.lower_expr(value);
        let p = self.lower_expr(place);
        let combined = self.push(IrNode::BinaryOp { op: compound_to_bin(*op), lhs: p, rhs: v }, unit);
        if let ExprKind::Identifier(name) = &*place.kind {
          let local = self.local_for(*name);
          Some(self.push(IrNode::StoreVar { local, value: combined }, unit))
        } else {
          Some(self.push(IrNode::WritePtr { ptr: p, value: combined }, unit))
        }
      }
      StmtKind::ExprStmt(e) => Some(self.lower_expr(e)),
      StmtKind::Result(e) => { let v = self.lower_expr(e); Some(self.push(IrNode::Result(v), unit)) }
      StmtKind::Return(e) => { let v = e.as_ref().map(|e| self.lower_expr(e)); Some(self.push(IrNode::Return(v), unit)) }
      StmtKind::Break { value, .. } => { let v = value.as_ref().map(|e| self.lower_expr(e)); Some(self.push(IrNode::Break { value: v }, unit)) }
      StmtKind::Continue { .. } => Some(self.push(IrNode::Continue, unit)),
      StmtKind::Defer(e) => { let v = self.lower_expr(e); Some(self.push(IrNode::Defer(v), unit)) }
      StmtKind::Region { init, alias, body } => {
        let _ = self.lower_expr(init);
        let b = self.lower_block(body, unit);
        Some(self.push(IrNode::Region { alias: *alias, body: b }, unit))
      }
      StmtKind::Frame { alias, body } => {
        let b = self.lower_block(body, unit);
        Some(self.push(IrNode::Frame { alias: *alias, body: b }, unit))
      }
      StmtKind::ErrorStmt => None,
    }
  }
}

fn compound_to_bin(op: CompoundOp) -> BinOp {
  match op {
    CompoundOp::Add => BinOp::Add,
    CompoundOp::Sub => BinOp::Sub,
    CompoundOp::Mul => BinOp::Mul,
    CompoundOp::Div => BinOp::Div,
    CompoundOp::Rem => BinOp::Rem,
  }
}

impl<'a, 'c> Lowerer<'a, 'c> {
  /// The module this body belongs to, for `CheckPoison` insertion at
  /// static/procedure access sites (spec §4.7); `None` for bodies not
  /// yet attributed to a module path.
  pub fn current_module(&self) -> Option<Symbol> { self.current_module }
}
