//! Program tree.
//!
//! The tree is produced by an external front end and owned top-down: every
//! node belongs to exactly one parent, with no sharing and no cycles. The
//! optimizer passes rebuild it, the checkers only read it, and the code
//! generator reads it while building its own tables.
use std::fmt;

use smol_str::SmolStr;

#[cfg(feature = "serde")]
use serde::{de, Deserialize, Deserializer, Serialize};

/// Identifier of a variable, routine, record, field or type.
pub type Name = SmolStr;

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

impl Program {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Stmt {
    Var(VarDecl),
    Assign(Assign),
    If(If),
    While(While),
    For(For),
    Routine(RoutineDecl),
    Return(Option<Expr>),
    Print(Expr),
    Record(RecordDecl),
    Array(ArrayDecl),
    Call(Call),
}

/// `var name [: type] [is init];`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VarDecl {
    pub name: Name,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ty: Option<TypeRef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub init: Option<Expr>,
}

/// `target := value;`
///
/// The target is either a plain identifier or an [`LValue`] chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assign {
    pub target: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct If {
    pub cond: Expr,
    pub then_block: Vec<Stmt>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub elsif: Vec<ElsIf>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub else_block: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElsIf {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct While {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

/// `for var in start .. end loop body end;`
///
/// Both bounds are inclusive and the counter is always an integer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct For {
    pub var: Name,
    pub start: Expr,
    pub end: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutineDecl {
    pub name: Name,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<Param>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ret: Option<TypeRef>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Param {
    pub name: Name,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordDecl {
    pub name: Name,
    pub fields: Vec<VarDecl>,
}

/// `type name is array [size] of elem;`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArrayDecl {
    pub name: Name,
    pub size: u32,
    pub elem: Name,
}

/// Routine invocation, either as a statement or inside an expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Call {
    pub name: Name,
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TypeRef {
    Named(Name),
    Array { elem: Name, size: u32 },
}

impl TypeRef {
    pub fn named(name: impl Into<Name>) -> Self {
        Self::Named(name.into())
    }

    pub fn array(elem: impl Into<Name>, size: u32) -> Self {
        Self::Array {
            elem: elem.into(),
            size,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Array { elem, size } => write!(f, "array [{size}] {elem}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Expr {
    Binary(Binary),
    Unary(Unary),
    Literal(Literal),
    Ident(Name),
    #[cfg_attr(feature = "serde", serde(rename = "lvalue"))]
    LValue(LValue),
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Binary {
    pub lhs: Box<Expr>,
    pub op: BinOp,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unary {
    pub op: UnOp,
    pub operand: Box<Expr>,
}

/// Literal value.
///
/// Comparisons folded by the optimizer produce `Int(0 | 1)` or
/// `Float(0.0 | 1.0)` rather than `Bool`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Literal {
    Int(i32),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Serialized literal before integers are range checked.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLiteral {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Integers outside the 32-bit range are rejected rather than read
/// as reals.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let out_of_range = |val: &dyn fmt::Display| -> D::Error {
            de::Error::custom(format!("integer literal {val} is out of range"))
        };

        match RawLiteral::deserialize(deserializer)? {
            RawLiteral::Int(val) => i32::try_from(val).map(Self::Int).map_err(|_| out_of_range(&val)),
            RawLiteral::UInt(val) => Err(out_of_range(&val)),
            RawLiteral::Float(val) => Ok(Self::Float(val)),
            RawLiteral::Bool(val) => Ok(Self::Bool(val)),
            RawLiteral::Str(val) => Ok(Self::Str(val)),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int(val) => write!(f, "{val}"),
            Self::Float(val) => write!(f, "{val:?}"),
            Self::Bool(val) => write!(f, "{val}"),
            Self::Str(val) => write!(f, "{val:?}"),
        }
    }
}

/// Selector chained off a base expression.
///
/// `base.field` and `base[index]` are mutually exclusive; longer chains
/// such as `a.b[0]` nest one [`LValue`] inside another.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LValue {
    pub base: Box<Expr>,
    pub selector: Selector,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Selector {
    Field(Name),
    Index(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

impl BinOp {
    /// Operators that compare their operands and drive branches.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Less | Self::LessEq | Self::Greater | Self::GreaterEq
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl fmt::Display for BinOp {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use BinOp as B;
        match self {
            B::Add       => write!(f, "+"),
            B::Sub       => write!(f, "-"),
            B::Mul       => write!(f, "*"),
            B::Div       => write!(f, "/"),
            B::Mod       => write!(f, "%"),
            B::Eq        => write!(f, "="),
            B::NotEq     => write!(f, "!="),
            B::Less      => write!(f, "<"),
            B::LessEq    => write!(f, "<="),
            B::Greater   => write!(f, ">"),
            B::GreaterEq => write!(f, ">="),
            B::And       => write!(f, "and"),
            B::Or        => write!(f, "or"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnOp {
    Neg,
    Not,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Neg => write!(f, "-"),
            Self::Not => write!(f, "not"),
        }
    }
}

// Shorthand constructors, mostly for building trees by hand.
impl Expr {
    pub fn int(val: i32) -> Self {
        Self::Literal(Literal::Int(val))
    }

    pub fn float(val: f64) -> Self {
        Self::Literal(Literal::Float(val))
    }

    pub fn boolean(val: bool) -> Self {
        Self::Literal(Literal::Bool(val))
    }

    pub fn string(val: impl Into<String>) -> Self {
        Self::Literal(Literal::Str(val.into()))
    }

    pub fn ident(name: impl Into<Name>) -> Self {
        Self::Ident(name.into())
    }

    pub fn binary(lhs: Expr, op: BinOp, rhs: Expr) -> Self {
        Self::Binary(Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        })
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        Self::Unary(Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn call(name: impl Into<Name>, args: Vec<Expr>) -> Self {
        Self::Call(Call {
            name: name.into(),
            args,
        })
    }

    pub fn field(base: Expr, field: impl Into<Name>) -> Self {
        Self::LValue(LValue {
            base: Box::new(base),
            selector: Selector::Field(field.into()),
        })
    }

    pub fn index(base: Expr, index: Expr) -> Self {
        Self::LValue(LValue {
            base: Box::new(base),
            selector: Selector::Index(Box::new(index)),
        })
    }

    /// Returns the literal if the expression is one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Returns `true` if evaluating the expression can't invoke a routine.
    pub fn is_call_free(&self) -> bool {
        match self {
            Self::Binary(bin) => bin.lhs.is_call_free() && bin.rhs.is_call_free(),
            Self::Unary(un) => un.operand.is_call_free(),
            Self::Literal(_) | Self::Ident(_) => true,
            Self::LValue(lv) => {
                lv.base.is_call_free()
                    && match &lv.selector {
                        Selector::Field(_) => true,
                        Selector::Index(index) => index.is_call_free(),
                    }
            }
            Self::Call(_) => false,
        }
    }
}

impl Stmt {
    pub fn var(name: impl Into<Name>, ty: Option<TypeRef>, init: Option<Expr>) -> Self {
        Self::Var(VarDecl {
            name: name.into(),
            ty,
            init,
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign(Assign { target, value })
    }

    pub fn call(name: impl Into<Name>, args: Vec<Expr>) -> Self {
        Self::Call(Call {
            name: name.into(),
            args,
        })
    }

    pub fn routine(
        name: impl Into<Name>,
        params: Vec<Param>,
        ret: Option<TypeRef>,
        body: Vec<Stmt>,
    ) -> Self {
        Self::Routine(RoutineDecl {
            name: name.into(),
            params,
            ret,
            body,
        })
    }

    pub fn if_else(cond: Expr, then_block: Vec<Stmt>, else_block: Vec<Stmt>) -> Self {
        Self::If(If {
            cond,
            then_block,
            elsif: vec![],
            else_block,
        })
    }

    pub fn while_loop(cond: Expr, body: Vec<Stmt>) -> Self {
        Self::While(While { cond, body })
    }

    pub fn for_loop(var: impl Into<Name>, start: Expr, end: Expr, body: Vec<Stmt>) -> Self {
        Self::For(For {
            var: var.into(),
            start,
            end,
            body,
        })
    }
}

impl Param {
    pub fn new(name: impl Into<Name>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}
