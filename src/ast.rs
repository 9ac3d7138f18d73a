//! Surface AST (spec §3.2). Every construct is a tagged variant; there
//! is no inheritance hierarchy, matching the "giant tagged variant"
//! pattern the teacher's IR uses for `TyKind`/`ExprKind` rather than a
//! visitor-dispatched class tree (spec §9).

use smallvec::SmallVec;

use crate::span::Span;
use crate::symbol::Symbol;

pub type Box<T> = std::boxed::Box<T>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Visibility { Private, Internal, Protected, Public }

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Permission { Unique, Shared, Const }

impl Permission {
  /// `unique <: shared <: const`, spec §3.5.
  pub fn le(self, other: Self) -> bool {
    use Permission::*;
    matches!((self, other), (Unique, Unique) | (Unique, Shared) | (Unique, Const)
      | (Shared, Shared) | (Shared, Const) | (Const, Const))
  }
}

bitflags::bitflags! {
  /// Marker attributes that don't carry a payload.
  #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
  pub struct Markers: u8 {
    const INLINE    = 1 << 0;
    const EXTERN    = 1 << 1;
    const INTRINSIC = 1 << 2;
  }
}

/// Attributes attached to an item: marker flags, `[[allow(code)]]`
/// suppressions, and an optional `extern(abi)` payload.
#[derive(Clone, Debug, Default)]
pub struct AttributeSet {
  pub markers: Markers,
  pub allow: SmallVec<[Symbol; 2]>,
  pub extern_abi: Option<Symbol>,
}

#[derive(Clone, Debug)]
pub struct GenericParam {
  pub name: Symbol,
  pub bounds: SmallVec<[Path; 2]>,
  pub span: Span,
}

#[derive(Clone, Debug)]
pub struct WhereClause {
  pub predicates: Vec<(Symbol, Path)>,
}

#[derive(Clone, Debug)]
pub struct Path {
  pub segments: SmallVec<[Symbol; 4]>,
  pub generic_args: Vec<TypeExpr>,
  pub span: Span,
}

// ---------------------------------------------------------------- items

#[derive(Clone, Debug)]
pub struct File {
  pub items: Vec<Item>,
  /// Module-level doc comments, collected independent of item attachment.
  pub module_docs: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Item {
  pub span: Span,
  pub vis: Visibility,
  pub attrs: AttributeSet,
  pub doc: Vec<String>,
  pub kind: ItemKind,
}

#[derive(Clone, Debug)]
pub enum ItemKind {
  Import { path: Path, alias: Option<Symbol> },
  Using { path: Path, alias: Option<Symbol> },
  Static { name: Symbol, mutable: bool, ty: Option<TypeExpr>, init: Expr },
  Procedure(Procedure),
  Record(RecordDecl),
  Enum(EnumDecl),
  Modal(ModalDecl),
  Class(ClassDecl),
  TypeAlias { name: Symbol, generics: Vec<GenericParam>, target: TypeExpr },
  /// Parser recovery sentinel; never type-checked (spec §3.2 invariants).
  ErrorItem,
}

#[derive(Clone, Debug)]
pub struct Procedure {
  pub name: Symbol,
  pub generics: Vec<GenericParam>,
  pub where_clause: Option<WhereClause>,
  pub params: Vec<Param>,
  pub ret: Option<TypeExpr>,
  pub contract: Option<Contract>,
  pub body: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct Contract {
  pub pre: Option<Expr>,
  pub post: Option<Expr>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReceiverShorthand { Const, Unique, Shared }

#[derive(Clone, Debug)]
pub struct Param {
  pub name: Symbol,
  pub ty: TypeExpr,
  /// `move` parameters consume their argument (spec §4.3 "Permissions in calls").
  pub by_move: bool,
  pub receiver: Option<ReceiverShorthand>,
  pub span: Span,
}

#[derive(Clone, Debug)]
pub struct RecordDecl {
  pub name: Symbol,
  pub generics: Vec<GenericParam>,
  pub fields: Vec<FieldDecl>,
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
  pub name: Symbol,
  pub ty: TypeExpr,
  pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
  pub name: Symbol,
  pub generics: Vec<GenericParam>,
  pub variants: Vec<VariantDecl>,
}

#[derive(Clone, Debug)]
pub struct VariantDecl {
  pub name: Symbol,
  pub payload: VariantPayload,
  pub span: Span,
}

#[derive(Clone, Debug)]
pub enum VariantPayload {
  Unit,
  Tuple(Vec<TypeExpr>),
  Record(Vec<FieldDecl>),
}

/// A modal declaration: a record-like type whose states are its variants
/// (spec §4.5). Each state may additionally declare transition methods.
#[derive(Clone, Debug)]
pub struct ModalDecl {
  pub name: Symbol,
  pub generics: Vec<GenericParam>,
  pub states: Vec<ModalStateDecl>,
}

#[derive(Clone, Debug)]
pub struct ModalStateDecl {
  pub name: Symbol,
  pub payload: VariantPayload,
  pub transitions: Vec<Procedure>,
  pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
  pub name: Symbol,
  pub generics: Vec<GenericParam>,
  pub methods: Vec<Procedure>,
}

// ---------------------------------------------------------------- types

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrimTy {
  I8, I16, I32, I64, I128, Isize,
  U8, U16, U32, U64, U128, Usize,
  F16, F32, F64,
  Bool, Char, Unit, Never,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RawPtrMut { Imm, Mut }

#[derive(Clone, Debug)]
pub struct TypeExpr {
  pub span: Span,
  pub kind: Box<TypeExprKind>,
}

#[derive(Clone, Debug)]
pub enum TypeExprKind {
  Prim(PrimTy),
  StringTy(Option<Symbol>),
  BytesTy(Option<Symbol>),
  Ptr { inner: TypeExpr, state: Option<Symbol> },
  RawPtr { mutability: RawPtrMut, inner: TypeExpr },
  Tuple(Vec<TypeExpr>),
  Array { elem: TypeExpr, len: Expr },
  Slice(TypeExpr),
  /// Unordered, idempotent union; normalized during type interning, not here.
  Union(Vec<TypeExpr>),
  Func { params: Vec<TypeExpr>, ret: TypeExpr },
  Path(Path),
  ModalState { base: Path, state: Symbol },
  Permission { perm: Permission, inner: TypeExpr },
  Refinement { base: TypeExpr, predicate: Expr },
  Opaque(Path),
  Dynamic(Path),
}

// ---------------------------------------------------------------- exprs

#[derive(Clone, Copy, Debug)]
pub enum RangeForm { Full, From, To, ToInclusive, Exclusive, Inclusive }

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnOp { Neg, Not, BitNot }

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
  Add, Sub, Mul, Div, Rem, Pow,
  BitAnd, BitOr, BitXor, Shl, Shr,
  Eq, Ne, Lt, Le, Gt, Ge,
  And, Or,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompoundOp { Add, Sub, Mul, Div, Rem }

#[derive(Clone, Debug)]
pub enum Literal {
  Int(i128),
  Float(f64),
  Str(Symbol),
  Char(char),
  Bool(bool),
  Null,
}

#[derive(Clone, Debug)]
pub struct Expr {
  pub span: Span,
  pub kind: Box<ExprKind>,
}

#[derive(Clone, Debug)]
pub struct RecordField {
  pub name: Symbol,
  pub value: Expr,
  pub span: Span,
}

#[derive(Clone, Debug)]
pub enum LoopForm {
  /// `loop { }` — unconditional.
  Infinite,
  /// `while cond { }`.
  While(Expr),
  /// `for pat in iter { }`.
  For { pat: Pattern, iter: Expr },
}

#[derive(Clone, Debug)]
pub struct MatchArm {
  pub pattern: Pattern,
  pub guard: Option<Expr>,
  pub body: Expr,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
  Literal(Literal),
  Identifier(Symbol),
  Path(Path),
  Field { base: Expr, name: Symbol },
  TupleAccess { base: Expr, index: u32 },
  Index { base: Expr, index: Expr },
  Call { callee: Expr, args: Vec<Expr> },
  MethodCall { receiver: Expr, method: Symbol, generic_args: Vec<TypeExpr>, args: Vec<Expr> },
  QualifiedApply { path: Path, args: Vec<Expr> },
  Cast { expr: Expr, ty: TypeExpr },
  If { cond: Expr, then_branch: Expr, else_branch: Option<Expr> },
  Match { scrutinee: Expr, arms: Vec<MatchArm> },
  Range { form: RangeForm, from: Option<Expr>, to: Option<Expr> },
  Deref(Expr),
  AddrOf { expr: Expr, perm: Permission },
  Move(Expr),
  Alloc(Expr),
  Transmute { expr: Expr, ty: TypeExpr },
  Propagate(Expr),
  RecordLiteral { path: Path, fields: Vec<RecordField> },
  EnumLiteral { path: Path, variant: Symbol, payload: Option<Vec<Expr>> },
  TupleLiteral(Vec<Expr>),
  ArrayLiteral(Vec<Expr>),
  ArrayRepeat { value: Expr, count: Expr },
  Sizeof(TypeExpr),
  Alignof(TypeExpr),
  Block(Block),
  UnsafeBlock(Block),
  Loop { form: LoopForm, body: Block, label: Option<Symbol> },
  Yield(Expr),
  YieldRelease(Expr),
  YieldFrom(Expr),
  Sync(Expr),
  Race(Vec<Expr>),
  All(Vec<Expr>),
  Parallel { domain: Expr, body: Block },
  Spawn { by_move: bool, body: Expr },
  Wait(Expr),
  Dispatch { var: Symbol, range: Expr, options: DispatchOptions, body: Block },
  Unary { op: UnOp, expr: Expr },
  Binary { op: BinOp, lhs: Expr, rhs: Expr },
  /// Parser recovery sentinel; absorbed and replaced by `!` before checking.
  ErrorExpr,
}

#[derive(Clone, Debug, Default)]
pub struct DispatchOptions {
  pub reduce: Option<Symbol>,
  pub ordered: bool,
  pub chunk: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct Block {
  pub stmts: Vec<Stmt>,
  pub tail: Option<Expr>,
  pub span: Span,
}

// ----------------------------------------------------------------- stmts

#[derive(Clone, Debug)]
pub struct Stmt {
  pub span: Span,
  pub kind: StmtKind,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
  Let { pat: Pattern, ty: Option<TypeExpr>, init: Expr, mutable: bool },
  /// `let`/`var` that intentionally shadows an outer binding of the same name.
  ShadowLet { pat: Pattern, ty: Option<TypeExpr>, init: Expr, mutable: bool },
  Assign { place: Expr, value: Expr },
  CompoundAssign { op: CompoundOp, place: Expr, value: Expr },
  ExprStmt(Expr),
  Return(Option<Expr>),
  Result(Expr),
  Break { label: Option<Symbol>, value: Option<Expr> },
  Continue { label: Option<Symbol> },
  Defer(Expr),
  /// `region expr as R { ... }` (alias optional: an unaliased region is
  /// still the active allocator for the block but can't be named).
  Region { init: Expr, alias: Option<Symbol>, body: Block },
  /// `frame R { ... }`, a scope reusing the named region's allocator.
  Frame { alias: Symbol, body: Block },
  ErrorStmt,
}

// -------------------------------------------------------------- patterns

#[derive(Clone, Debug)]
pub struct Pattern {
  pub span: Span,
  pub kind: Box<PatternKind>,
}

#[derive(Clone, Debug)]
pub enum PatternKind {
  Wildcard,
  Identifier { name: Symbol, mutable: bool },
  TypedBinding { name: Symbol, ty: TypeExpr },
  Literal(Literal),
  Tuple(Vec<Pattern>),
  Record { path: Path, fields: Vec<(Symbol, Pattern)>, rest: bool },
  Enum { path: Path, variant: Symbol, payload: EnumPatternPayload },
  Modal { path: Path, state: Symbol, payload: Option<Vec<(Symbol, Pattern)>> },
  Range { lo: Literal, hi: Literal, inclusive: bool },
}

#[derive(Clone, Debug)]
pub enum EnumPatternPayload {
  None,
  Tuple(Vec<Pattern>),
  Record(Vec<(Symbol, Pattern)>),
}
