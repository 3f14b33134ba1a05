//! Tree level optimization passes.
mod dce;
mod fold;
mod inline;
mod prune;

pub use self::{
    dce::{contains_return, eliminate, eliminate_program},
    fold::ConstFolder,
    inline::Inliner,
    prune::{prune, UsageCensus},
};

use log::trace;

use crate::ast::Program;

/// Runs constant folding, pruning, inlining and dead code elimination,
/// in that order.
pub fn optimize(program: Program) -> Program {
    trace!("constant folding");
    let program = ConstFolder::new().simplify_program(program);

    trace!("pruning unused declarations");
    let program = prune(program);

    trace!("inlining trivial routines");
    let mut inliner = Inliner::new();
    inliner.collect(&program.stmts);
    let program = inliner.inline_program(program);

    trace!("eliminating dead code");
    eliminate_program(program)
}
