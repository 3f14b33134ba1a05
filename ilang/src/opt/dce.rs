//! Dead code elimination after returns.
use log::debug;

use crate::ast::{ElsIf, For, If, Program, RoutineDecl, Stmt, While};

/// Applies [`eliminate`] to the body of every routine in the program,
/// including routines declared inside other blocks.
pub fn eliminate_program(program: Program) -> Program {
    Program::new(program.stmts.into_iter().map(visit_routines).collect())
}

fn visit_routines(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Routine(decl) => Stmt::Routine(RoutineDecl {
            body: eliminate(decl.body),
            ..decl
        }),
        Stmt::If(If {
            cond,
            then_block,
            elsif,
            else_block,
        }) => Stmt::If(If {
            cond,
            then_block: then_block.into_iter().map(visit_routines).collect(),
            elsif: elsif
                .into_iter()
                .map(|ElsIf { cond, body }| ElsIf {
                    cond,
                    body: body.into_iter().map(visit_routines).collect(),
                })
                .collect(),
            else_block: else_block.into_iter().map(visit_routines).collect(),
        }),
        Stmt::While(While { cond, body }) => Stmt::While(While {
            cond,
            body: body.into_iter().map(visit_routines).collect(),
        }),
        Stmt::For(For { var, start, end, body }) => Stmt::For(For {
            var,
            start,
            end,
            body: body.into_iter().map(visit_routines).collect(),
        }),
        other => other,
    }
}

/// Drops every statement that follows a return, or follows an `if`
/// whose every branch returns.
pub fn eliminate(stmts: Vec<Stmt>) -> Vec<Stmt> {
    let total = stmts.len();
    let mut out = Vec::with_capacity(total);

    for stmt in stmts {
        let stmt = eliminate_nested(stmt);
        let returns = match &stmt {
            Stmt::Return(_) => true,
            Stmt::If(stmt) => if_returns(stmt),
            _ => false,
        };
        out.push(stmt);

        if returns {
            break;
        }
    }

    if out.len() < total {
        debug!("removed {} unreachable statement(s)", total - out.len());
    }

    out
}

fn eliminate_nested(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::If(If {
            cond,
            then_block,
            elsif,
            else_block,
        }) => Stmt::If(If {
            cond,
            then_block: eliminate(then_block),
            elsif: elsif
                .into_iter()
                .map(|ElsIf { cond, body }| ElsIf {
                    cond,
                    body: eliminate(body),
                })
                .collect(),
            else_block: eliminate(else_block),
        }),
        Stmt::While(While { cond, body }) => Stmt::While(While {
            cond,
            body: eliminate(body),
        }),
        Stmt::For(For { var, start, end, body }) => Stmt::For(For {
            var,
            start,
            end,
            body: eliminate(body),
        }),
        Stmt::Routine(decl) => Stmt::Routine(RoutineDecl {
            body: eliminate(decl.body),
            ..decl
        }),
        other => other,
    }
}

/// An `if` returns when the then block, every `elsif` block and the
/// else block all contain a return. A missing else never returns.
fn if_returns(stmt: &If) -> bool {
    contains_return(&stmt.then_block)
        && stmt.elsif.iter().all(|branch| contains_return(&branch.body))
        && contains_return(&stmt.else_block)
}

/// Returns `true` if a return appears in the block, looking through
/// nested `if` and loop bodies but not nested routines.
pub fn contains_return(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Return(_) => true,
        Stmt::If(stmt) => {
            contains_return(&stmt.then_block)
                || stmt.elsif.iter().any(|branch| contains_return(&branch.body))
                || contains_return(&stmt.else_block)
        }
        Stmt::While(While { body, .. }) | Stmt::For(For { body, .. }) => contains_return(body),
        _ => false,
    })
}
