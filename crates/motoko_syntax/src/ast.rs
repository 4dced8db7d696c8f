//! Abstract Syntax Tree definitions for Motoko.
//!
//! Declarations are a tagged enum ([`Dec`]); expressions carry a per-parse [`ExpId`] so later stages can attach
//! semantic information (types, contextual dot resolutions) without mutating the tree.
//!
//! ## Notes
//! - Recovered parses contain placeholder variants (`Dec::Error`, `ExpKind::Error`, `PatKind::Error`,
//!   `TypKind::Error`). Downstream stages treat them as the error type and stay silent about them.
//! - Expression ids are dense (`0..Program::exp_count`) and deterministic: the same text always parses to the
//!   same ids.

use std::sync::Arc;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// Dense per-parse expression identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpId(pub u32);

impl ExpId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A program (compilation unit) is a sequence of declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Doc comment documenting the whole program (one preceding a leading `import`).
    pub doc: Option<String>,
    pub decs: Vec<DecField>,
    pub span: Span,
    /// Number of expression ids handed out while parsing.
    pub exp_count: u32,
}

impl Program {
    /// Iterate the program's import declarations in source order.
    pub fn imports(&self) -> impl Iterator<Item = (&ImportDec, Span)> {
        self.decs.iter().filter_map(|field| match &field.dec.node {
            Dec::Import(import) => Some((import, field.dec.span)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Private,
    Public,
    System,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "Private",
            Visibility::Public => "Public",
            Visibility::System => "System",
        }
    }
}

/// Persistence modifier on an actor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StableMod {
    Stable,
    Transient,
    Flexible,
}

/// A declaration together with its field attributes (doc, visibility, stability).
///
/// Blocks and programs use the same shape; visibility only matters inside object, module, class and actor bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct DecField {
    pub doc: Option<String>,
    pub vis: Visibility,
    pub stability: Option<StableMod>,
    pub dec: Spanned<Dec>,
}

impl DecField {
    pub fn is_public(&self) -> bool {
        self.vis == Visibility::Public
    }
}

/// Declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum Dec {
    Exp(Exp),
    Let(LetDec),
    Var(VarDec),
    Type(TypeDec),
    Func(FuncDec),
    Module(ModuleDec),
    Class(ClassDec),
    Object(ObjectDec),
    Import(ImportDec),
    /// Recovery placeholder for a declaration that failed to parse.
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetDec {
    pub pat: Pat,
    pub exp: Exp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDec {
    pub name: Spanned<Ident>,
    pub ty: Option<Typ>,
    pub exp: Exp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDec {
    pub name: Spanned<Ident>,
    pub params: Vec<TypeBind>,
    pub ty: Typ,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDec {
    pub name: Spanned<Ident>,
    pub func: FuncLit,
}

/// Shared shape of named function declarations and anonymous function expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub sort: FuncSort,
    pub type_params: Vec<TypeBind>,
    pub params: Vec<Param>,
    pub ret: Option<Typ>,
    pub body: Box<Exp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FuncSort {
    #[default]
    Local,
    Shared,
    Query,
}

impl FuncSort {
    pub fn as_str(self) -> &'static str {
        match self {
            FuncSort::Local => "Local",
            FuncSort::Shared => "Shared",
            FuncSort::Query => "Query",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name; `_` for a wildcard parameter.
    pub name: Spanned<Ident>,
    pub ty: Typ,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeBind {
    pub name: Spanned<Ident>,
    pub bound: Option<Typ>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDec {
    pub name: Option<Spanned<Ident>>,
    pub fields: Vec<DecField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjSort {
    Object,
    Module,
    Actor,
}

impl ObjSort {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjSort::Object => "Object",
            ObjSort::Module => "Module",
            ObjSort::Actor => "Actor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDec {
    pub sort: ObjSort,
    pub persistent: bool,
    pub name: Spanned<Ident>,
    pub type_params: Vec<TypeBind>,
    pub params: Vec<Param>,
    pub ret: Option<Typ>,
    pub fields: Vec<DecField>,
}

/// `object`, `actor` and `persistent actor` declarations (named or anonymous).
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDec {
    pub sort: ObjSort,
    pub persistent: bool,
    pub name: Option<Spanned<Ident>>,
    pub fields: Vec<DecField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDec {
    pub name: Spanned<Ident>,
    pub path: Spanned<String>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Exp {
    pub id: ExpId,
    pub kind: ExpKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpKind {
    Lit(Lit),
    Var(Ident),
    Unary(UnOp, Box<Exp>),
    Binary(Box<Exp>, BinOp, Box<Exp>),
    Compare(Box<Exp>, RelOp, Box<Exp>),
    And(Box<Exp>, Box<Exp>),
    Or(Box<Exp>, Box<Exp>),
    Assign(Box<Exp>, Box<Exp>),
    OpAssign(Box<Exp>, BinOp, Box<Exp>),
    Tuple(Vec<Exp>),
    Record(Vec<ExpField>),
    Array { mutable: bool, elems: Vec<Exp> },
    Opt(Box<Exp>),
    Dot(Box<Exp>, Spanned<Ident>),
    Proj(Box<Exp>, usize),
    Index(Box<Exp>, Box<Exp>),
    /// `func<inst>(arg)`; the argument is a single expression (a tuple for multi-argument calls).
    Call {
        func: Box<Exp>,
        inst: Option<Vec<Typ>>,
        arg: Box<Exp>,
    },
    Block(Vec<DecField>),
    If(Box<Exp>, Box<Exp>, Option<Box<Exp>>),
    While(Box<Exp>, Box<Exp>),
    Loop(Box<Exp>),
    For(Pat, Box<Exp>, Box<Exp>),
    Switch(Box<Exp>, Vec<Case>),
    Return(Option<Box<Exp>>),
    Ignore(Box<Exp>),
    Assert(Box<Exp>),
    Async(Box<Exp>),
    Await(Box<Exp>),
    Show(Box<Exp>),
    Func(FuncLit),
    Annot(Box<Exp>, Typ),
    /// Recovery placeholder for a missing or malformed expression.
    Error,
}

impl Exp {
    /// Expressions a call or juxtaposition may apply to.
    pub fn is_callee_shaped(&self) -> bool {
        matches!(
            self.kind,
            ExpKind::Var(_)
                | ExpKind::Dot(..)
                | ExpKind::Call { .. }
                | ExpKind::Proj(..)
                | ExpKind::Index(..)
                | ExpKind::Func(_)
        )
    }

    /// Arguments of a call argument expression: a tuple spreads, anything else is a single argument.
    pub fn call_args(&self) -> Vec<&Exp> {
        match &self.kind {
            ExpKind::Tuple(elems) => elems.iter().collect(),
            _ => vec![self],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Cat,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "AddOp",
            BinOp::Sub => "SubOp",
            BinOp::Mul => "MulOp",
            BinOp::Div => "DivOp",
            BinOp::Mod => "ModOp",
            BinOp::Pow => "PowOp",
            BinOp::Cat => "CatOp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RelOp::Eq => "EqOp",
            RelOp::Neq => "NeqOp",
            RelOp::Lt => "LtOp",
            RelOp::Le => "LeOp",
            RelOp::Gt => "GtOp",
            RelOp::Ge => "GeOp",
        }
    }
}

/// Literals. Numeric literals keep their (underscore-free) source digits; text literals are stored once and shared.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Nat(String),
    Float(String),
    Text(Arc<str>),
    Char(char),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpField {
    pub mutable: bool,
    pub name: Spanned<Ident>,
    pub exp: Exp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub pat: Pat,
    pub exp: Exp,
}

// ============================================================================
// Patterns
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Pat {
    pub kind: PatKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatKind {
    Wild,
    Var(Ident),
    Lit(Lit),
    Tuple(Vec<Pat>),
    Opt(Box<Pat>),
    Annot(Box<Pat>, Typ),
    Error,
}

impl Pat {
    /// Names bound by this pattern, in source order.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            PatKind::Var(name) => out.push(name),
            PatKind::Tuple(pats) => pats.iter().for_each(|p| p.collect_names(out)),
            PatKind::Opt(p) | PatKind::Annot(p, _) => p.collect_names(out),
            PatKind::Wild | PatKind::Lit(_) | PatKind::Error => {}
        }
    }
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Typ {
    pub kind: TypKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypKind {
    /// `Name`, `M.Name`, `Name<Args>`.
    Path { path: Vec<Spanned<Ident>>, args: Vec<Typ> },
    Opt(Box<Typ>),
    Array { mutable: bool, elem: Box<Typ> },
    Tuple(Vec<TypItem>),
    Record(Vec<TypField>),
    Obj(ObjSort, Vec<TypField>),
    Func {
        sort: FuncSort,
        type_params: Vec<TypeBind>,
        params: Vec<TypItem>,
        ret: Box<Typ>,
    },
    Async(Box<Typ>),
    Error,
}

/// Tuple / parameter list item, optionally named (`(self : Text, n : Nat)`).
#[derive(Debug, Clone, PartialEq)]
pub struct TypItem {
    pub name: Option<Ident>,
    pub ty: Typ,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypField {
    pub mutable: bool,
    pub name: Spanned<Ident>,
    pub ty: Typ,
}
