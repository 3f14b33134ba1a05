use log::trace;

use crate::{
    ast::{Name, Program, Stmt},
    error::{IlangError, IlangResult},
};

/// Verifies that `return` only appears inside a routine body.
#[derive(Debug, Default)]
pub struct KeywordChecker {
    /// Innermost enclosing routine.
    routine: Option<Name>,
    /// Loop nesting depth, tracked but not yet checked against.
    loop_depth: usize,
}

impl KeywordChecker {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, program: &Program) -> IlangResult<()> {
        self.block(&program.stmts)
    }

    fn block(&mut self, stmts: &[Stmt]) -> IlangResult<()> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> IlangResult<()> {
        match stmt {
            Stmt::Routine(decl) => {
                let outer = self.routine.replace(decl.name.clone());
                let result = self.block(&decl.body);
                self.routine = outer;
                result
            }
            Stmt::Return(_) => match self.routine {
                Some(_) => Ok(()),
                None => Err(IlangError::ReturnOutsideRoutine),
            },
            Stmt::If(stmt) => {
                self.block(&stmt.then_block)?;
                for branch in &stmt.elsif {
                    self.block(&branch.body)?;
                }
                self.block(&stmt.else_block)
            }
            Stmt::While(stmt) => self.looped(&stmt.body),
            Stmt::For(stmt) => self.looped(&stmt.body),
            _ => Ok(()),
        }
    }

    fn looped(&mut self, body: &[Stmt]) -> IlangResult<()> {
        self.loop_depth += 1;
        trace!("loop depth {}", self.loop_depth);
        let result = self.block(body);
        self.loop_depth -= 1;
        result
    }
}
