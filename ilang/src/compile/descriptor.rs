//! Value and call descriptors.
use std::fmt;

use itertools::Itertools;

use crate::ast::Name;

/// Storage shape of a single value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Descriptor {
    Int,
    Bool,
    Double,
    Str,
    /// Instance of a declared record type.
    Object(Name),
    Array(Box<Descriptor>),
}

/// Instruction family a value is handled with.
///
/// Booleans share the integer family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Int,
    Double,
    Ref,
}

impl Descriptor {
    /// Descriptor for one of the built-in type names, if it is one.
    #[rustfmt::skip]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(Self::Int),
            "real"    => Some(Self::Double),
            "boolean" => Some(Self::Bool),
            "string"  => Some(Self::Str),
            _         => None,
        }
    }

    /// Element descriptor for an array declaration.
    ///
    /// Arrays only hold integers, reals or strings.
    pub fn array_elem(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(Self::Int),
            "real" => Some(Self::Double),
            "string" => Some(Self::Str),
            _ => None,
        }
    }

    #[inline]
    pub fn array(elem: Descriptor) -> Self {
        Self::Array(Box::new(elem))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Int | Self::Bool => Kind::Int,
            Self::Double => Kind::Double,
            Self::Str | Self::Object(_) | Self::Array(_) => Kind::Ref,
        }
    }

    /// Number of slots, and operand stack entries, the value occupies.
    #[inline]
    pub fn width(&self) -> u16 {
        self.kind().width()
    }

    #[inline]
    pub fn is_wide(&self) -> bool {
        self.kind() == Kind::Double
    }

    /// Descriptor of the `println` overload that accepts this value.
    pub fn print_arg(&self) -> Descriptor {
        match self {
            Self::Object(_) | Self::Array(_) => Self::Object("java/lang/Object".into()),
            other => other.clone(),
        }
    }
}

impl Kind {
    #[inline]
    pub fn width(self) -> u16 {
        match self {
            Kind::Double => 2,
            _ => 1,
        }
    }

    /// Opcode prefix of the family.
    #[inline]
    pub fn prefix(self) -> char {
        match self {
            Kind::Int => 'i',
            Kind::Double => 'd',
            Kind::Ref => 'a',
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int => write!(f, "I"),
            Self::Bool => write!(f, "Z"),
            Self::Double => write!(f, "D"),
            Self::Str => write!(f, "Ljava/lang/String;"),
            Self::Object(name) => write!(f, "L{name};"),
            Self::Array(elem) => write!(f, "[{elem}"),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::Int => write!(f, "integer"),
            Kind::Double => write!(f, "real"),
            Kind::Ref => write!(f, "reference"),
        }
    }
}

/// Call shape of a routine: parameter descriptors and a return
/// descriptor, or void.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodDescriptor {
    pub params: Vec<Descriptor>,
    pub ret: Option<Descriptor>,
}

impl MethodDescriptor {
    pub fn new(params: Vec<Descriptor>, ret: Option<Descriptor>) -> Self {
        Self { params, ret }
    }

    /// Descriptor taking no arguments and returning void.
    #[inline]
    pub fn void() -> Self {
        Self::default()
    }

    /// Operand stack entries consumed by the arguments.
    pub fn arg_width(&self) -> i32 {
        self.params.iter().map(|param| param.width() as i32).sum()
    }

    /// Operand stack entries pushed by the result.
    pub fn ret_width(&self) -> i32 {
        self.ret.as_ref().map(|ret| ret.width() as i32).unwrap_or(0)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.params.iter().join(""))?;
        match &self.ret {
            Some(ret) => write!(f, "{ret}"),
            None => write!(f, "V"),
        }
    }
}
