//! Constant expression folding.
use crate::ast::{
    Assign, BinOp, Binary, Call, ElsIf, Expr, For, If, Literal, LValue, Program, RecordDecl, RoutineDecl, Selector,
    Stmt, UnOp, Unary, VarDecl, While,
};

/// Constant expression folder.
///
/// Walks the tree bottom-up and replaces operations on literals with the
/// literal result. Only operands of the same primitive kind are combined;
/// anything else, including division by a literal zero, is left as is.
///
/// Branch conditions are never folded, since the code generator lowers
/// them from their relational shape.
#[derive(Default)]
pub struct ConstFolder;

impl ConstFolder {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    pub fn simplify_program(&self, program: Program) -> Program {
        Program::new(self.simplify_block(program.stmts))
    }

    fn simplify_block(&self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        stmts.into_iter().map(|stmt| self.simplify_stmt(stmt)).collect()
    }

    pub fn simplify_stmt(&self, stmt: Stmt) -> Stmt {
        match stmt {
            Stmt::Var(decl) => Stmt::Var(self.simplify_var(decl)),
            Stmt::Assign(Assign { target, value }) => Stmt::Assign(Assign {
                target,
                value: self.simplify(value),
            }),
            Stmt::If(If {
                cond,
                then_block,
                elsif,
                else_block,
            }) => Stmt::If(If {
                cond,
                then_block: self.simplify_block(then_block),
                elsif: elsif
                    .into_iter()
                    .map(|ElsIf { cond, body }| ElsIf {
                        cond,
                        body: self.simplify_block(body),
                    })
                    .collect(),
                else_block: self.simplify_block(else_block),
            }),
            Stmt::While(While { cond, body }) => Stmt::While(While {
                cond,
                body: self.simplify_block(body),
            }),
            Stmt::For(For { var, start, end, body }) => Stmt::For(For {
                var,
                start: self.simplify(start),
                end: self.simplify(end),
                body: self.simplify_block(body),
            }),
            Stmt::Routine(RoutineDecl { name, params, ret, body }) => Stmt::Routine(RoutineDecl {
                name,
                params,
                ret,
                body: self.simplify_block(body),
            }),
            Stmt::Return(expr) => Stmt::Return(expr.map(|expr| self.simplify(expr))),
            Stmt::Print(expr) => Stmt::Print(self.simplify(expr)),
            Stmt::Record(RecordDecl { name, fields }) => Stmt::Record(RecordDecl {
                name,
                fields: fields.into_iter().map(|field| self.simplify_var(field)).collect(),
            }),
            Stmt::Array(decl) => Stmt::Array(decl),
            Stmt::Call(call) => Stmt::Call(self.simplify_call(call)),
        }
    }

    fn simplify_var(&self, decl: VarDecl) -> VarDecl {
        VarDecl {
            init: decl.init.map(|expr| self.simplify(expr)),
            ..decl
        }
    }

    fn simplify_call(&self, call: Call) -> Call {
        Call {
            name: call.name,
            args: call.args.into_iter().map(|arg| self.simplify(arg)).collect(),
        }
    }

    /// Entry point for a single expression.
    pub fn simplify(&self, expr: Expr) -> Expr {
        match expr {
            Expr::Binary(Binary { lhs, op, rhs }) => {
                let lhs = self.simplify(*lhs);
                let rhs = self.simplify(*rhs);

                if let (Some(a), Some(b)) = (lhs.as_literal(), rhs.as_literal()) {
                    if let Some(value) = fold_binary(a, op, b) {
                        return Expr::Literal(value);
                    }
                }

                Expr::Binary(Binary {
                    lhs: Box::new(lhs),
                    op,
                    rhs: Box::new(rhs),
                })
            }
            Expr::Unary(Unary { op, operand }) => {
                let operand = self.simplify(*operand);

                if let Some(value) = operand.as_literal().and_then(|lit| fold_unary(op, lit)) {
                    return Expr::Literal(value);
                }

                Expr::Unary(Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            Expr::LValue(LValue { base, selector }) => Expr::LValue(LValue {
                base,
                selector: match selector {
                    Selector::Index(index) => Selector::Index(Box::new(self.simplify(*index))),
                    field => field,
                },
            }),
            Expr::Call(call) => Expr::Call(self.simplify_call(call)),
            Expr::Literal(_) | Expr::Ident(_) => expr,
        }
    }
}

fn fold_binary(lhs: &Literal, op: BinOp, rhs: &Literal) -> Option<Literal> {
    use Literal as L;

    match (lhs, rhs) {
        (L::Int(a), L::Int(b)) => fold_int(*a, op, *b),
        (L::Float(a), L::Float(b)) => fold_float(*a, op, *b),
        (L::Bool(a), L::Bool(b)) => fold_bool(*a, op, *b),
        _ => None,
    }
}

#[rustfmt::skip]
fn fold_int(a: i32, op: BinOp, b: i32) -> Option<Literal> {
    use BinOp as B;

    let truth = |cond: bool| Some(Literal::Int(cond as i32));

    match op {
        B::Add       => Some(Literal::Int(a.wrapping_add(b))),
        B::Sub       => Some(Literal::Int(a.wrapping_sub(b))),
        B::Mul       => Some(Literal::Int(a.wrapping_mul(b))),
        B::Div       => (b != 0).then(|| Literal::Int(a.wrapping_div(b))),
        B::Mod       => (b != 0).then(|| Literal::Int(a.wrapping_rem(b))),
        B::Less      => truth(a < b),
        B::LessEq    => truth(a <= b),
        B::Greater   => truth(a > b),
        B::GreaterEq => truth(a >= b),
        B::Eq        => truth(a == b),
        B::NotEq     => truth(a != b),
        B::And | B::Or => None,
    }
}

#[rustfmt::skip]
fn fold_float(a: f64, op: BinOp, b: f64) -> Option<Literal> {
    use BinOp as B;

    let truth = |cond: bool| Some(Literal::Float(if cond { 1.0 } else { 0.0 }));

    match op {
        B::Add       => Some(Literal::Float(a + b)),
        B::Sub       => Some(Literal::Float(a - b)),
        B::Mul       => Some(Literal::Float(a * b)),
        B::Div       => (b != 0.0).then(|| Literal::Float(a / b)),
        B::Mod       => (b != 0.0).then(|| Literal::Float(a % b)),
        B::Less      => truth(a < b),
        B::LessEq    => truth(a <= b),
        B::Greater   => truth(a > b),
        B::GreaterEq => truth(a >= b),
        B::Eq        => truth(a == b),
        B::NotEq     => truth(a != b),
        B::And | B::Or => None,
    }
}

fn fold_bool(a: bool, op: BinOp, b: bool) -> Option<Literal> {
    match op {
        BinOp::And => Some(Literal::Bool(a && b)),
        BinOp::Or => Some(Literal::Bool(a || b)),
        _ => None,
    }
}

fn fold_unary(op: UnOp, operand: &Literal) -> Option<Literal> {
    match (op, operand) {
        (UnOp::Not, Literal::Bool(val)) => Some(Literal::Bool(!val)),
        (UnOp::Neg, Literal::Int(val)) => Some(Literal::Int(val.wrapping_neg())),
        (UnOp::Neg, Literal::Float(val)) => Some(Literal::Float(-val)),
        _ => None,
    }
}
