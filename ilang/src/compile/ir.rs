use std::fmt;

use super::{
    descriptor::{Descriptor, Kind, MethodDescriptor},
    symbol::Slot,
};
use crate::ast::Name;

/// Branch target, unique for the whole compilation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Test applied by a single operand conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Static,
    Virtual,
    Special,
    NonVirtual,
}

/// Stack machine instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Label(Label),
    Load(Kind, Slot),
    Store(Kind, Slot),
    LdcInt(i32),
    LdcDouble(f64),
    LdcStr(String),
    /// Small integer constant, `-1..=5`.
    IConst(i8),
    DConst0,
    AConstNull,
    Arith(ArithOp, Kind),
    Neg(Kind),
    Logic(LogicOp),
    /// Widen the integer on top of the stack.
    I2D,
    /// Compare two doubles, pushing `-1`, `0` or `1`.
    DCmpG,
    If(Cond, Label),
    IfICmpGt(Label),
    Goto(Label),
    IInc(Slot, i16),
    Pop,
    Pop2,
    Dup,
    New(Name),
    Invoke {
        kind: InvokeKind,
        owner: Name,
        name: Name,
        desc: MethodDescriptor,
    },
    GetStatic {
        owner: Name,
        name: Name,
        desc: Descriptor,
    },
    GetField {
        owner: Name,
        name: Name,
        desc: Descriptor,
    },
    PutField {
        owner: Name,
        name: Name,
        desc: Descriptor,
    },
    /// Allocate a primitive array; the length is on the stack.
    NewArray(Kind),
    /// Allocate a reference array of the given class.
    ANewArray(Name),
    /// Load an element, given its kind.
    ArrayLoad(Kind),
    ArrayStore(Kind),
    Return(Option<Kind>),
}

impl Instr {
    /// Net change in operand stack entries after executing the
    /// instruction. Doubles count as two entries.
    #[rustfmt::skip]
    pub fn stack_effect(&self) -> i32 {
        use Instr as I;

        match self {
            I::Label(_)                          => 0,
            I::Load(kind, _)                     => kind.width() as i32,
            I::Store(kind, _)                    => -(kind.width() as i32),
            I::LdcInt(_) | I::LdcStr(_)          => 1,
            I::LdcDouble(_) | I::DConst0         => 2,
            I::IConst(_) | I::AConstNull         => 1,
            I::Arith(_, kind)                    => -(kind.width() as i32),
            I::Neg(_)                            => 0,
            I::Logic(_)                          => -1,
            I::I2D                               => 1,
            I::DCmpG                             => -3,
            I::If(_, _)                          => -1,
            I::IfICmpGt(_)                       => -2,
            I::Goto(_) | I::IInc(_, _)           => 0,
            I::Pop                               => -1,
            I::Pop2                              => -2,
            I::Dup                               => 1,
            I::New(_)                            => 1,
            I::Invoke { kind, desc, .. } => {
                let receiver = if *kind == InvokeKind::Static { 0 } else { 1 };
                desc.ret_width() - desc.arg_width() - receiver
            }
            I::GetStatic { desc, .. }            => desc.width() as i32,
            I::GetField { desc, .. }             => desc.width() as i32 - 1,
            I::PutField { desc, .. }             => -(desc.width() as i32) - 1,
            I::NewArray(_) | I::ANewArray(_)     => 0,
            I::ArrayLoad(kind)                   => kind.width() as i32 - 2,
            I::ArrayStore(kind)                  => -(kind.width() as i32) - 2,
            I::Return(Some(kind))                => -(kind.width() as i32),
            I::Return(None)                      => 0,
        }
    }
}

/// Maximum operand stack depth reached by a straight walk over the code.
///
/// Every statement leaves the stack empty, so the depth at a branch
/// target always matches the depth at the jump.
pub fn max_stack(code: &[Instr]) -> u16 {
    let mut depth = 0i32;
    let mut max = 0i32;

    for instr in code {
        depth += instr.stack_effect();
        max = max.max(depth);
    }

    max.clamp(0, u16::MAX as i32) as u16
}

/// Outputs instruction as assembly.
impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instr as I;

        match self {
            I::Label(label) => write!(f, "{label}:"),
            I::Load(kind, slot) => write_slot_op(f, kind.prefix(), "load", *slot),
            I::Store(kind, slot) => write_slot_op(f, kind.prefix(), "store", *slot),
            I::LdcInt(val) => write!(f, "ldc {val}"),
            I::LdcDouble(val) => write!(f, "ldc2_w {val:?}"),
            I::LdcStr(val) => write!(f, "ldc \"{}\"", escape(val)),
            I::IConst(-1) => write!(f, "iconst_m1"),
            I::IConst(val) => write!(f, "iconst_{val}"),
            I::DConst0 => write!(f, "dconst_0"),
            I::AConstNull => write!(f, "aconst_null"),
            I::Arith(op, kind) => {
                let name = match op {
                    ArithOp::Add => "add",
                    ArithOp::Sub => "sub",
                    ArithOp::Mul => "mul",
                    ArithOp::Div => "div",
                    ArithOp::Rem => "rem",
                };
                write!(f, "{}{name}", kind.prefix())
            }
            I::Neg(kind) => write!(f, "{}neg", kind.prefix()),
            I::Logic(LogicOp::And) => write!(f, "iand"),
            I::Logic(LogicOp::Or) => write!(f, "ior"),
            I::Logic(LogicOp::Xor) => write!(f, "ixor"),
            I::I2D => write!(f, "i2d"),
            I::DCmpG => write!(f, "dcmpg"),
            I::If(cond, label) => {
                let name = match cond {
                    Cond::Eq => "ifeq",
                    Cond::Ne => "ifne",
                    Cond::Lt => "iflt",
                    Cond::Ge => "ifge",
                    Cond::Gt => "ifgt",
                    Cond::Le => "ifle",
                };
                write!(f, "{name} {label}")
            }
            I::IfICmpGt(label) => write!(f, "if_icmpgt {label}"),
            I::Goto(label) => write!(f, "goto {label}"),
            I::IInc(slot, by) => write!(f, "iinc {slot} {by}"),
            I::Pop => write!(f, "pop"),
            I::Pop2 => write!(f, "pop2"),
            I::Dup => write!(f, "dup"),
            I::New(class) => write!(f, "new {class}"),
            I::Invoke { kind, owner, name, desc } => {
                let op = match kind {
                    InvokeKind::Static => "invokestatic",
                    InvokeKind::Virtual => "invokevirtual",
                    InvokeKind::Special => "invokespecial",
                    InvokeKind::NonVirtual => "invokenonvirtual",
                };
                write!(f, "{op} {owner}/{name}{desc}")
            }
            I::GetStatic { owner, name, desc } => write!(f, "getstatic {owner}/{name} {desc}"),
            I::GetField { owner, name, desc } => write!(f, "getfield {owner}/{name} {desc}"),
            I::PutField { owner, name, desc } => write!(f, "putfield {owner}/{name} {desc}"),
            I::NewArray(Kind::Double) => write!(f, "newarray double"),
            I::NewArray(_) => write!(f, "newarray int"),
            I::ANewArray(class) => write!(f, "anewarray {class}"),
            I::ArrayLoad(kind) => write!(f, "{}aload", kind.prefix()),
            I::ArrayStore(kind) => write!(f, "{}astore", kind.prefix()),
            I::Return(Some(kind)) => write!(f, "{}return", kind.prefix()),
            I::Return(None) => write!(f, "return"),
        }
    }
}

fn write_slot_op(f: &mut fmt::Formatter, prefix: char, op: &str, slot: Slot) -> fmt::Result {
    if slot <= 3 {
        write!(f, "{prefix}{op}_{slot}")
    } else {
        write!(f, "{prefix}{op} {slot}")
    }
}

fn escape(val: &str) -> String {
    let mut out = String::with_capacity(val.len());
    for c in val.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}
