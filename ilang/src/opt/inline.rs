//! Inlining of single statement routines.
use std::collections::HashMap;

use log::debug;

use crate::ast::{
    Binary, Call, ElsIf, Expr, For, If, LValue, Literal, Name, Program, RoutineDecl, Selector, Stmt, TypeRef,
    Unary, UnOp, While,
};

/// Trivial inliner.
///
/// Two call site shapes are rewritten:
///
/// - `print f(args)` where `f` is `return e;` becomes `print e`.
/// - `f(args);` where `f` is `print e;` becomes `print e`.
///
/// Parameters in `e` are replaced by the call's arguments. Calls in any
/// other position are left alone, as are sites where an argument would
/// have been converted on its way into the parameter.
#[derive(Debug, Default)]
pub struct Inliner {
    routines: HashMap<Name, RoutineDecl>,
}

impl Inliner {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every routine declared in the statements, including
    /// routines nested in blocks.
    pub fn collect(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            match stmt {
                Stmt::Routine(decl) => {
                    self.routines.insert(decl.name.clone(), decl.clone());
                    self.collect(&decl.body);
                }
                Stmt::If(stmt) => {
                    self.collect(&stmt.then_block);
                    for branch in &stmt.elsif {
                        self.collect(&branch.body);
                    }
                    self.collect(&stmt.else_block);
                }
                Stmt::While(While { body, .. }) | Stmt::For(For { body, .. }) => self.collect(body),
                _ => {}
            }
        }
    }

    pub fn inline_program(&self, program: Program) -> Program {
        Program::new(self.block(program.stmts))
    }

    fn block(&self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        stmts.into_iter().map(|stmt| self.inline(stmt)).collect()
    }

    pub fn inline(&self, stmt: Stmt) -> Stmt {
        match stmt {
            Stmt::Print(Expr::Call(call)) => match self.returned_expr(&call) {
                Some(expr) => Stmt::Print(expr),
                None => Stmt::Print(Expr::Call(call)),
            },
            Stmt::Call(call) => match self.printed_expr(&call) {
                Some(expr) => Stmt::Print(expr),
                None => Stmt::Call(call),
            },
            Stmt::If(If {
                cond,
                then_block,
                elsif,
                else_block,
            }) => Stmt::If(If {
                cond,
                then_block: self.block(then_block),
                elsif: elsif
                    .into_iter()
                    .map(|ElsIf { cond, body }| ElsIf {
                        cond,
                        body: self.block(body),
                    })
                    .collect(),
                else_block: self.block(else_block),
            }),
            Stmt::While(While { cond, body }) => Stmt::While(While {
                cond,
                body: self.block(body),
            }),
            Stmt::For(For { var, start, end, body }) => Stmt::For(For {
                var,
                start,
                end,
                body: self.block(body),
            }),
            Stmt::Routine(decl) => Stmt::Routine(RoutineDecl {
                body: self.block(decl.body),
                ..decl
            }),
            other => other,
        }
    }

    /// Substituted expression of a callee whose body is `return e;`.
    fn returned_expr(&self, call: &Call) -> Option<Expr> {
        let callee = self.inlinable(call)?;
        match callee.body.as_slice() {
            [Stmt::Return(Some(expr))] => Some(self.substitute(callee, call, expr)),
            _ => None,
        }
    }

    /// Substituted expression of a callee whose body is `print e;`.
    fn printed_expr(&self, call: &Call) -> Option<Expr> {
        let callee = self.inlinable(call)?;
        match callee.body.as_slice() {
            [Stmt::Print(expr)] => Some(self.substitute(callee, call, expr)),
            _ => None,
        }
    }

    /// Callee of a call site that can be replaced without duplicating
    /// or dropping a call in the arguments.
    fn inlinable(&self, call: &Call) -> Option<&RoutineDecl> {
        let callee = self.routines.get(&call.name)?;
        let args_ok = callee.params.len() == call.args.len()
            && call.args.iter().all(Expr::is_call_free)
            && callee
                .params
                .iter()
                .zip(&call.args)
                .all(|(param, arg)| passes_unchanged(arg, &param.ty));
        args_ok.then_some(callee)
    }

    fn substitute(&self, callee: &RoutineDecl, call: &Call, expr: &Expr) -> Expr {
        debug!("inlined call to '{}'", call.name);

        let bindings: HashMap<&str, &Expr> = callee
            .params
            .iter()
            .map(|param| param.name.as_str())
            .zip(call.args.iter())
            .collect();
        replace_params(expr, &bindings)
    }
}

/// Returns `true` if binding the argument to a parameter of the given
/// type leaves its value as is.
///
/// Literals must match the parameter type exactly. Real parameters widen
/// integer arguments, so anything bound to one must be visibly real.
fn passes_unchanged(arg: &Expr, ty: &TypeRef) -> bool {
    let param = match ty {
        TypeRef::Named(name) => name.as_str(),
        TypeRef::Array { .. } => return arg.as_literal().is_none(),
    };

    #[rustfmt::skip]
    let fits = match (arg.as_literal(), param) {
        (Some(Literal::Int(_)),   "integer") => true,
        (Some(Literal::Float(_)), "real")    => true,
        (Some(Literal::Bool(_)),  "boolean") => true,
        (Some(Literal::Str(_)),   "string")  => true,
        (Some(_), _)                         => false,
        (None, "real")                       => is_real(arg),
        (None, _)                            => true,
    };
    fits
}

/// Returns `true` if the expression yields a real whatever its
/// identifiers are bound to.
fn is_real(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Literal::Float(_)) => true,
        Expr::Unary(Unary { op: UnOp::Neg, operand }) => is_real(operand),
        Expr::Binary(Binary { lhs, op, rhs }) if op.is_arithmetic() => is_real(lhs) || is_real(rhs),
        _ => false,
    }
}

fn replace_params(expr: &Expr, bindings: &HashMap<&str, &Expr>) -> Expr {
    match expr {
        Expr::Ident(name) => match bindings.get(name.as_str()) {
            Some(arg) => (*arg).clone(),
            None => expr.clone(),
        },
        Expr::Binary(Binary { lhs, op, rhs }) => Expr::Binary(Binary {
            lhs: Box::new(replace_params(lhs, bindings)),
            op: *op,
            rhs: Box::new(replace_params(rhs, bindings)),
        }),
        Expr::Unary(Unary { op, operand }) => Expr::Unary(Unary {
            op: *op,
            operand: Box::new(replace_params(operand, bindings)),
        }),
        Expr::LValue(LValue { base, selector }) => Expr::LValue(LValue {
            base: Box::new(replace_params(base, bindings)),
            selector: match selector {
                Selector::Field(field) => Selector::Field(field.clone()),
                Selector::Index(index) => Selector::Index(Box::new(replace_params(index, bindings))),
            },
        }),
        Expr::Call(Call { name, args }) => Expr::Call(Call {
            name: name.clone(),
            args: args.iter().map(|arg| replace_params(arg, bindings)).collect(),
        }),
        Expr::Literal(_) => expr.clone(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{BinOp, Param, TypeRef};

    fn inliner(program: &Program) -> Inliner {
        let mut inliner = Inliner::new();
        inliner.collect(&program.stmts);
        inliner
    }

    fn add_routine() -> Stmt {
        Stmt::routine(
            "add",
            vec![
                Param::new("a", TypeRef::named("integer")),
                Param::new("b", TypeRef::named("integer")),
            ],
            Some(TypeRef::named("integer")),
            vec![Stmt::Return(Some(Expr::binary(Expr::ident("a"), BinOp::Add, Expr::ident("b"))))],
        )
    }

    fn greet_routine() -> Stmt {
        Stmt::routine(
            "greet",
            vec![Param::new("who", TypeRef::named("string"))],
            None,
            vec![Stmt::Print(Expr::ident("who"))],
        )
    }

    #[test]
    fn test_inline_returned_expression() {
        let program = Program::new(vec![
            add_routine(),
            Stmt::Print(Expr::call("add", vec![Expr::ident("x"), Expr::int(2)])),
        ]);
        let inlined = inliner(&program).inline_program(program);
        assert_eq!(
            inlined.stmts[1],
            Stmt::Print(Expr::binary(Expr::ident("x"), BinOp::Add, Expr::int(2)))
        );
    }

    #[test]
    fn test_inline_printing_routine() {
        let program = Program::new(vec![greet_routine(), Stmt::call("greet", vec![Expr::string("bob")])]);
        let inlined = inliner(&program).inline_program(program);
        assert_eq!(inlined.stmts[1], Stmt::Print(Expr::string("bob")));
    }

    #[test]
    fn test_mismatched_shapes_untouched() {
        let program = Program::new(vec![
            add_routine(),
            greet_routine(),
            Stmt::call("add", vec![Expr::int(1), Expr::int(2)]),
            Stmt::Print(Expr::call("greet", vec![Expr::string("x")])),
        ]);
        let inlined = inliner(&program).inline_program(program.clone());
        assert_eq!(inlined, program);
    }

    #[test]
    fn test_calls_outside_print_untouched() {
        let program = Program::new(vec![
            add_routine(),
            Stmt::var("y", None, Some(Expr::call("add", vec![Expr::int(1), Expr::int(2)]))),
        ]);
        let inlined = inliner(&program).inline_program(program.clone());
        assert_eq!(inlined, program);
    }

    #[test]
    fn test_arguments_with_calls_untouched() {
        let program = Program::new(vec![
            add_routine(),
            Stmt::Print(Expr::call(
                "add",
                vec![Expr::call("add", vec![Expr::int(1), Expr::int(2)]), Expr::int(3)],
            )),
        ]);
        let inlined = inliner(&program).inline_program(program.clone());
        assert_eq!(inlined, program);
    }

    #[test]
    fn test_multi_statement_routine_untouched() {
        let program = Program::new(vec![
            Stmt::routine(
                "two",
                vec![],
                None,
                vec![Stmt::Print(Expr::int(1)), Stmt::Print(Expr::int(2))],
            ),
            Stmt::call("two", vec![]),
        ]);
        let inlined = inliner(&program).inline_program(program.clone());
        assert_eq!(inlined, program);
    }

    #[test]
    fn test_widened_arguments_untouched() {
        let id = Stmt::routine(
            "id",
            vec![Param::new("v", TypeRef::named("real"))],
            Some(TypeRef::named("real")),
            vec![Stmt::Return(Some(Expr::ident("v")))],
        );
        let program = Program::new(vec![
            id,
            Stmt::Print(Expr::call("id", vec![Expr::int(3)])),
            Stmt::Print(Expr::call("id", vec![Expr::ident("n")])),
            Stmt::Print(Expr::call("id", vec![Expr::float(3.0)])),
            Stmt::Print(Expr::call(
                "id",
                vec![Expr::binary(Expr::ident("n"), BinOp::Mul, Expr::float(0.5))],
            )),
        ]);
        let inlined = inliner(&program).inline_program(program.clone());

        assert_eq!(inlined.stmts[1], program.stmts[1]);
        assert_eq!(inlined.stmts[2], program.stmts[2]);
        assert_eq!(inlined.stmts[3], Stmt::Print(Expr::float(3.0)));
        assert_eq!(
            inlined.stmts[4],
            Stmt::Print(Expr::binary(Expr::ident("n"), BinOp::Mul, Expr::float(0.5)))
        );
    }

    #[test]
    fn test_literal_of_other_type_untouched() {
        let program = Program::new(vec![greet_routine(), Stmt::call("greet", vec![Expr::int(1)])]);
        let inlined = inliner(&program).inline_program(program.clone());
        assert_eq!(inlined, program);
    }

    #[test]
    fn test_inline_inside_nested_block() {
        let cond = Expr::binary(Expr::ident("x"), BinOp::Less, Expr::int(3));
        let program = Program::new(vec![
            greet_routine(),
            Stmt::while_loop(cond.clone(), vec![Stmt::call("greet", vec![Expr::string("hi")])]),
        ]);
        let inlined = inliner(&program).inline_program(program);
        assert_eq!(
            inlined.stmts[1],
            Stmt::while_loop(cond, vec![Stmt::Print(Expr::string("hi"))])
        );
    }
}
