//! Semantic verification.
mod decl;
mod keyword;

pub use self::{decl::DeclChecker, keyword::KeywordChecker};

use log::trace;

use crate::{ast::Program, error::IlangResult};

/// Runs the keyword context check, then the declaration check. The first
/// violation aborts.
pub fn check(program: &Program) -> IlangResult<()> {
    trace!("checking keyword context");
    KeywordChecker::new().check(program)?;

    trace!("checking declarations");
    DeclChecker::new().check(program)
}
