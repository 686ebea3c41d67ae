//! Typed AST produced by the parser.
//!
//! Per the design note in SPEC_FULL.md §9, node kinds are tagged-variant
//! enums matched with `match` rather than a class hierarchy dispatched
//! through a visitor trait — `Expr`/`Stmt`/`ExternalDecl` each carry their
//! own kind enum. Child nodes are owned (`Box`/`Vec`): the parser builds
//! each node exactly once, bottom-up, and nothing is mutated or shared
//! after construction, so a plain owned tree gives the same "lives for
//! the translation unit, freed as a unit" lifecycle spec.md's AST
//! lifecycle note calls for without arena-lifetime plumbing. Types and
//! scopes, which genuinely need shared identity and post-hoc mutation,
//! use `Rc`/`RefCell` instead (see `ty.rs`, `scope.rs`).

use crate::constant::ConstValue;
use crate::loc::SourceLocation;
use crate::ty::{Linkage, QualType, StorageClass};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Bit-field placement info attached to a struct/union member `Object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub begin: u16,
    pub width: u16,
}

/// A named, storage-bearing identifier: a struct/union member, a
/// function parameter, or a declared object. Specializes `Identifier`
/// per spec.md §3.4.
#[derive(Debug)]
pub struct ObjectData {
    pub name: String,
    pub ty: RefCell<QualType>,
    pub loc: SourceLocation,
    pub storage: Cell<StorageClass>,
    pub linkage: Cell<Linkage>,
    pub align: Cell<u32>,
    /// Byte offset within the enclosing struct/union, or stack/global
    /// slot offset for ordinary objects where meaningful.
    pub offset: Cell<i64>,
    pub bit_field: Cell<Option<BitField>>,
    /// Sequential index among a struct's members, for backend GEP.
    pub index: Cell<u32>,
    pub anonymous: bool,
    /// Set once an initializer has been elaborated for this object.
    pub init: RefCell<Option<InitPlan>>,
}

pub type ObjectRef = Rc<ObjectData>;

impl ObjectData {
    pub fn new(name: impl Into<String>, ty: QualType, loc: SourceLocation) -> ObjectRef {
        Rc::new(ObjectData {
            name: name.into(),
            ty: RefCell::new(ty),
            loc,
            storage: Cell::new(StorageClass::None),
            linkage: Cell::new(Linkage::None),
            align: Cell::new(0),
            offset: Cell::new(0),
            bit_field: Cell::new(None),
            index: Cell::new(0),
            anonymous: false,
            init: RefCell::new(None),
        })
    }

    pub fn qual_type(&self) -> QualType {
        self.ty.borrow().clone()
    }
}

/// An enumerator constant: an `Identifier` specialization carrying its
/// folded `int` value.
#[derive(Debug)]
pub struct EnumeratorData {
    pub name: String,
    pub value: i64,
    pub loc: SourceLocation,
}

pub type EnumeratorRef = Rc<EnumeratorData>;

/// The final plan attached to a declared object: either a fully-folded
/// backend constant (static storage) or a flat list of runtime stores
/// (automatic storage), or a request to value-initialize (zero) an
/// automatic object with no initializer.
#[derive(Debug, Clone)]
pub enum InitPlan {
    Constant(ConstValue),
    Runtime(Vec<InitEntry>),
    ZeroInit,
}

/// One leaf of an elaborated initializer: the target sub-object's type,
/// its byte offset from the base of the declared object, and (if the
/// sub-object is a bit-field) its bit offset/width within the storage
/// word at that byte offset.
#[derive(Debug, Clone)]
pub struct InitEntry {
    pub ty: QualType,
    pub offset: i64,
    pub bit_field: Option<BitField>,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Address,
    Deref,
    Plus,
    Minus,
    BitNot,
    LogNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogAnd,
    LogOr,
    Assign,
    MulAssign,
    DivAssign,
    ModAssign,
    AddAssign,
    SubAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    Comma,
}

/// Expression node kinds, per spec.md §3.4.
#[derive(Debug, Clone)]
pub enum ExprKind {
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    TypeCast { operand: Box<Expr> },
    BinaryOp { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    ConditionOp { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
    FuncCall { callee: Box<Expr>, args: Vec<Expr>, va_arg_type: Option<QualType> },
    Constant(ConstValue),
    StringLiteral { bytes: Vec<u8> },
    Identifier { name: String },
    Enumerator(EnumeratorRef),
    Object(ObjectRef),
    /// `base.member`, with `->` already rewritten to a leading `*base`.
    Member { base: Box<Expr>, member: ObjectRef },
    /// GNU statement expression `({ ... })`; its type is the type of the
    /// last expression-statement in the block, or void.
    StmtExpr { block: Box<Stmt> },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: QualType,
    pub loc: SourceLocation,
    /// True for expressions the language calls "lvalues": object
    /// identifiers, `*p`, array subscript and member-access results.
    pub lvalue: bool,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: QualType, loc: SourceLocation, lvalue: bool) -> Box<Expr> {
        Box::new(Expr { kind, ty, loc, lvalue })
    }
}

#[derive(Debug, Clone)]
pub struct CaseRange {
    pub lo: Box<Expr>,
    /// GNU extension: `case LO ... HI:`
    pub hi: Option<Box<Expr>>,
}

/// Statement node kinds, per spec.md §3.4.
#[derive(Debug, Clone)]
pub enum StmtKind {
    Label { name: String, stmt: Box<Stmt> },
    Case { value: i64, range_hi: Option<i64>, stmt: Box<Stmt> },
    Default { stmt: Box<Stmt> },
    Compound { items: Vec<Stmt> },
    Expr(Option<Box<Expr>>),
    If { cond: Box<Expr>, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
    Switch { cond: Box<Expr>, body: Box<Stmt> },
    While { cond: Box<Expr>, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, cond: Box<Expr> },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        body: Box<Stmt>,
    },
    Goto { label: String },
    Continue,
    Break,
    Return(Option<Box<Expr>>),
    /// A declaration appearing inside a block (C99 mixed declarations).
    Decl(Box<ExternalDecl>),
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: SourceLocation,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: SourceLocation) -> Box<Stmt> {
        Box::new(Stmt { kind, loc })
    }
}

/// A top-level or block-scope declaration: one identifier plus either an
/// elaborated initializer or nothing.
#[derive(Debug, Clone)]
pub struct DeclarationNode {
    pub object: ObjectRef,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct FuncDefNode {
    pub object: ObjectRef,
    pub params: Vec<ObjectRef>,
    pub body: Box<Stmt>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum ExternalDecl {
    Declaration(DeclarationNode),
    FuncDef(FuncDefNode),
    StaticAssert { loc: SourceLocation },
}

#[derive(Debug, Default)]
pub struct TranslationUnit {
    pub decls: Vec<ExternalDecl>,
}
