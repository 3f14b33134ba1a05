//! Code generation into stack machine assembly units.
mod codegen;
mod descriptor;
mod ir;
mod symbol;
mod unit;

pub use self::{
    codegen::CodeGen,
    descriptor::{Descriptor, Kind, MethodDescriptor},
    ir::{Instr, Label},
    symbol::{RecordTable, Slot, Symbol, SymbolTable},
    unit::{Field, Method, Unit},
};

use crate::ast::Name;

/// Generator configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenConf {
    /// Name of the primary unit, which holds the entry point and
    /// every routine.
    pub main_class: Name,
}

impl Default for GenConf {
    fn default() -> Self {
        Self {
            main_class: Name::from("Main"),
        }
    }
}
