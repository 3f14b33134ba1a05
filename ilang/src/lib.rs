pub mod ast;
pub mod check;
pub mod compile;
mod error;
pub mod opt;
pub mod output;

pub use self::error::{ErrorKind, IlangError, IlangResult};

use log::debug;

use ast::Program;
use compile::{CodeGen, GenConf, Unit};

/// Runs the optimizer passes over the tree.
#[inline]
pub fn optimize(program: Program) -> Program {
    opt::optimize(program)
}

/// Verifies `return` placement and declaration order.
#[inline]
pub fn check(program: &Program) -> IlangResult<()> {
    check::check(program)
}

/// Full pipeline from a parsed tree to assembly units.
pub fn compile(program: Program, conf: GenConf) -> IlangResult<Vec<Unit>> {
    // Optimization
    let program = optimize(program);
    debug!("optimized program has {} top level statement(s)", program.stmts.len());

    // Semantic analysis
    check(&program)?;

    // Code generation
    CodeGen::new(conf).generate(&program)
}

pub mod prelude {
    pub use super::{
        ast::{BinOp, Expr, Param, Program, Stmt, TypeRef, UnOp},
        compile::{CodeGen, GenConf, Unit},
        error::{ErrorKind, IlangError, IlangResult},
        output::write_units,
    };
}
