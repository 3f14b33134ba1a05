//! Emitted compilation units.
use std::fmt;

use super::{
    descriptor::{Descriptor, MethodDescriptor},
    ir::{max_stack, Instr},
    symbol::Slot,
};
use crate::ast::Name;

pub const OBJECT_CLASS: &str = "java/lang/Object";

/// One emitted class-like container, rendered as assembly text
/// through its `Display` impl.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub name: Name,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Name,
    pub desc: Descriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: Name,
    pub desc: MethodDescriptor,
    pub is_static: bool,
    pub max_stack: u16,
    pub max_locals: Slot,
    pub code: Vec<Instr>,
}

impl Unit {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
            methods: vec![],
        }
    }

    /// Name of the file the unit is written to.
    pub fn file_name(&self) -> String {
        format!("{}.j", self.name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }
}

impl Method {
    /// Builds a method block, sizing the operand stack from the code.
    pub fn new(name: impl Into<Name>, desc: MethodDescriptor, is_static: bool, max_locals: Slot, code: Vec<Instr>) -> Self {
        Self {
            name: name.into(),
            desc,
            is_static,
            max_stack: max_stack(&code),
            max_locals,
            code,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, ".class public {}", self.name)?;
        writeln!(f, ".super {OBJECT_CLASS}")?;

        if !self.fields.is_empty() {
            writeln!(f)?;
        }
        for field in &self.fields {
            writeln!(f, ".field public {} {}", field.name, field.desc)?;
        }

        for method in &self.methods {
            writeln!(f)?;
            write!(f, "{method}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let access = if self.is_static { "public static" } else { "public" };
        writeln!(f, ".method {access} {}{}", self.name, self.desc)?;
        writeln!(f, ".limit stack {}", self.max_stack)?;
        writeln!(f, ".limit locals {}", self.max_locals)?;

        for instr in &self.code {
            match instr {
                Instr::Label(_) => writeln!(f, "{instr}")?,
                _ => writeln!(f, "    {instr}")?,
            }
        }

        writeln!(f, ".end method")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compile::{descriptor::Kind, ir::Label};

    #[test]
    fn test_render_unit() {
        let mut unit = Unit::new("Point");
        unit.fields.push(Field {
            name: "x".into(),
            desc: Descriptor::Int,
        });
        unit.methods.push(Method::new(
            "<init>",
            MethodDescriptor::void(),
            false,
            1,
            vec![
                Instr::Load(Kind::Ref, 0),
                Instr::Label(Label(0)),
                Instr::Return(None),
            ],
        ));

        let text = unit.to_string();
        let expected = "\
.class public Point
.super java/lang/Object

.field public x I

.method public <init>()V
.limit stack 1
.limit locals 1
    aload_0
L0:
    return
.end method
";
        assert_eq!(text, expected);
        assert_eq!(unit.file_name(), "Point.j");
    }
}
