use std::collections::HashSet;

use crate::{
    ast::{Expr, Name, Program, Selector, Stmt},
    error::{IlangError, IlangResult},
};

/// Verifies every identifier and call names something declared earlier
/// in an enclosing, still open scope.
#[derive(Debug)]
pub struct DeclChecker {
    /// Variable scopes, innermost last.
    scopes: Vec<HashSet<Name>>,
    routines: HashSet<Name>,
}

impl DeclChecker {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashSet::new()],
            routines: HashSet::new(),
        }
    }

    pub fn check(&mut self, program: &Program) -> IlangResult<()> {
        self.block(&program.stmts)
    }

    fn declare(&mut self, name: &Name) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.clone());
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.contains(name))
    }

    /// Checks statements in a fresh scope seeded with `names`.
    fn scoped(&mut self, names: Vec<Name>, stmts: &[Stmt]) -> IlangResult<()> {
        self.scopes.push(names.into_iter().collect());
        let result = self.block(stmts);
        self.scopes.pop();
        result
    }

    fn block(&mut self, stmts: &[Stmt]) -> IlangResult<()> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> IlangResult<()> {
        match stmt {
            Stmt::Var(decl) => {
                if let Some(init) = &decl.init {
                    self.expr(init)?;
                }
                self.declare(&decl.name);
                Ok(())
            }
            Stmt::Assign(assign) => {
                self.expr(&assign.target)?;
                self.expr(&assign.value)
            }
            Stmt::If(stmt) => {
                self.expr(&stmt.cond)?;
                self.scoped(vec![], &stmt.then_block)?;
                for branch in &stmt.elsif {
                    self.expr(&branch.cond)?;
                    self.scoped(vec![], &branch.body)?;
                }
                self.scoped(vec![], &stmt.else_block)
            }
            Stmt::While(stmt) => {
                self.expr(&stmt.cond)?;
                self.scoped(vec![], &stmt.body)
            }
            Stmt::For(stmt) => {
                self.expr(&stmt.start)?;
                self.expr(&stmt.end)?;
                self.scoped(vec![stmt.var.clone()], &stmt.body)
            }
            Stmt::Routine(decl) => {
                self.routines.insert(decl.name.clone());
                let params = decl.params.iter().map(|param| param.name.clone()).collect();
                self.scoped(params, &decl.body)
            }
            Stmt::Return(expr) => match expr {
                Some(expr) => self.expr(expr),
                None => Ok(()),
            },
            Stmt::Print(expr) => self.expr(expr),
            Stmt::Record(_) => Ok(()),
            Stmt::Array(decl) => {
                self.declare(&decl.name);
                Ok(())
            }
            Stmt::Call(call) => self.call(&call.name, &call.args),
        }
    }

    fn call(&mut self, name: &Name, args: &[Expr]) -> IlangResult<()> {
        if !self.routines.contains(name) {
            return Err(IlangError::UndeclaredRoutine(name.clone()));
        }
        args.iter().try_for_each(|arg| self.expr(arg))
    }

    fn expr(&mut self, expr: &Expr) -> IlangResult<()> {
        match expr {
            Expr::Binary(bin) => {
                self.expr(&bin.lhs)?;
                self.expr(&bin.rhs)
            }
            Expr::Unary(un) => self.expr(&un.operand),
            Expr::Literal(_) => Ok(()),
            Expr::Ident(name) => {
                if self.is_declared(name) {
                    Ok(())
                } else {
                    Err(IlangError::UndeclaredVariable(name.clone()))
                }
            }
            Expr::LValue(lv) => {
                self.expr(&lv.base)?;
                match &lv.selector {
                    Selector::Field(_) => Ok(()),
                    Selector::Index(index) => self.expr(index),
                }
            }
            Expr::Call(call) => self.call(&call.name, &call.args),
        }
    }
}

impl Default for DeclChecker {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{BinOp, Param, TypeRef};

    fn check(stmts: Vec<Stmt>) -> IlangResult<()> {
        DeclChecker::new().check(&Program::new(stmts))
    }

    fn cond() -> Expr {
        Expr::binary(Expr::int(1), BinOp::Less, Expr::int(2))
    }

    #[test]
    fn test_use_after_block_closed() {
        // if 1 < 2 then var y is 1; end; print y;
        let stmts = vec![
            Stmt::if_else(cond(), vec![Stmt::var("y", None, Some(Expr::int(1)))], vec![]),
            Stmt::Print(Expr::ident("y")),
        ];
        let err = check(stmts).unwrap_err();
        assert!(matches!(&err, IlangError::UndeclaredVariable(name) if name == "y"));
        assert!(err.to_string().contains("used before declaration"));
    }

    #[test]
    fn test_outer_names_visible_inside_blocks() {
        let stmts = vec![
            Stmt::var("x", None, Some(Expr::int(1))),
            Stmt::while_loop(cond(), vec![Stmt::assign(Expr::ident("x"), Expr::int(2))]),
        ];
        assert!(check(stmts).is_ok());
    }

    #[test]
    fn test_initializer_checked_before_declaring() {
        let stmts = vec![Stmt::var("x", None, Some(Expr::ident("x")))];
        assert!(matches!(check(stmts), Err(IlangError::UndeclaredVariable(_))));
    }

    #[test]
    fn test_assignment_target_checked() {
        let stmts = vec![Stmt::assign(Expr::ident("z"), Expr::int(1))];
        assert!(matches!(check(stmts), Err(IlangError::UndeclaredVariable(_))));

        let stmts = vec![Stmt::assign(Expr::index(Expr::ident("xs"), Expr::int(0)), Expr::int(1))];
        assert!(matches!(check(stmts), Err(IlangError::UndeclaredVariable(_))));
    }

    #[test]
    fn test_call_before_declaration() {
        let stmts = vec![
            Stmt::call("f", vec![]),
            Stmt::routine("f", vec![], None, vec![]),
        ];
        let err = check(stmts).unwrap_err();
        assert!(matches!(&err, IlangError::UndeclaredRoutine(name) if name == "f"));
        assert!(err.to_string().contains("called before declaration"));
    }

    #[test]
    fn test_routine_params_and_recursion() {
        let stmts = vec![
            Stmt::routine(
                "f",
                vec![Param::new("n", TypeRef::named("integer"))],
                Some(TypeRef::named("integer")),
                vec![Stmt::Return(Some(Expr::call("f", vec![Expr::ident("n")])))],
            ),
            Stmt::Print(Expr::ident("n")),
        ];
        // The parameter goes out of scope with the body.
        assert!(matches!(check(stmts), Err(IlangError::UndeclaredVariable(_))));
    }

    #[test]
    fn test_for_counter_scoped_to_loop() {
        let stmts = vec![Stmt::for_loop(
            "i",
            Expr::int(0),
            Expr::int(3),
            vec![Stmt::Print(Expr::ident("i"))],
        )];
        assert!(check(stmts).is_ok());

        let stmts = vec![Stmt::for_loop("i", Expr::int(0), Expr::ident("i"), vec![])];
        assert!(matches!(check(stmts), Err(IlangError::UndeclaredVariable(_))));
    }

    #[test]
    fn test_elsif_branches_are_siblings() {
        let stmts = vec![Stmt::If(crate::ast::If {
            cond: cond(),
            then_block: vec![Stmt::var("a", None, Some(Expr::int(1)))],
            elsif: vec![crate::ast::ElsIf {
                cond: cond(),
                body: vec![Stmt::Print(Expr::ident("a"))],
            }],
            else_block: vec![],
        })];
        assert!(matches!(check(stmts), Err(IlangError::UndeclaredVariable(_))));
    }

    #[test]
    fn test_array_declares_name() {
        let stmts = vec![
            Stmt::Array(crate::ast::ArrayDecl {
                name: "xs".into(),
                size: 3,
                elem: "integer".into(),
            }),
            Stmt::Print(Expr::index(Expr::ident("xs"), Expr::int(0))),
        ];
        assert!(check(stmts).is_ok());
    }
}
