//! Removal of unused top level declarations.
use std::collections::HashSet;

use log::debug;

use crate::ast::{Expr, Name, Program, Selector, Stmt};

/// Names referenced anywhere in the program.
///
/// Call names are routines, not variables, and are not recorded.
#[derive(Debug, Default)]
pub struct UsageCensus {
    used: HashSet<Name>,
}

impl UsageCensus {
    pub fn of(program: &Program) -> Self {
        let mut census = Self::default();
        census.block(&program.stmts);
        census
    }

    #[inline]
    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var(decl) => {
                if let Some(init) = &decl.init {
                    self.expr(init);
                }
            }
            Stmt::Assign(assign) => {
                self.expr(&assign.target);
                self.expr(&assign.value);
            }
            Stmt::If(stmt) => {
                self.expr(&stmt.cond);
                self.block(&stmt.then_block);
                for branch in &stmt.elsif {
                    self.expr(&branch.cond);
                    self.block(&branch.body);
                }
                self.block(&stmt.else_block);
            }
            Stmt::While(stmt) => {
                self.expr(&stmt.cond);
                self.block(&stmt.body);
            }
            Stmt::For(stmt) => {
                self.expr(&stmt.start);
                self.expr(&stmt.end);
                self.block(&stmt.body);
            }
            Stmt::Routine(decl) => self.block(&decl.body),
            Stmt::Return(expr) => {
                if let Some(expr) = expr {
                    self.expr(expr);
                }
            }
            Stmt::Print(expr) => self.expr(expr),
            Stmt::Record(decl) => {
                for field in &decl.fields {
                    if let Some(init) = &field.init {
                        self.expr(init);
                    }
                }
            }
            Stmt::Array(_) => {}
            Stmt::Call(call) => call.args.iter().for_each(|arg| self.expr(arg)),
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Binary(bin) => {
                self.expr(&bin.lhs);
                self.expr(&bin.rhs);
            }
            Expr::Unary(un) => self.expr(&un.operand),
            Expr::Literal(_) => {}
            Expr::Ident(name) => {
                self.used.insert(name.clone());
            }
            Expr::LValue(lv) => {
                self.expr(&lv.base);
                if let Selector::Index(index) = &lv.selector {
                    self.expr(index);
                }
            }
            Expr::Call(call) => call.args.iter().for_each(|arg| self.expr(arg)),
        }
    }
}

/// Drops top level variable declarations whose name is never used.
///
/// Declarations nested in routines or blocks are kept even when unused.
pub fn prune(program: Program) -> Program {
    let census = UsageCensus::of(&program);

    let stmts = program
        .stmts
        .into_iter()
        .filter(|stmt| match stmt {
            Stmt::Var(decl) if !census.is_used(&decl.name) => {
                debug!("pruned unused declaration '{}'", decl.name);
                false
            }
            _ => true,
        })
        .collect();

    Program::new(stmts)
}
