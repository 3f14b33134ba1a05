//! Result and errors.
use std::fmt::{self, Display, Formatter};

use smol_str::SmolStr;

pub type IlangResult<T> = std::result::Result<T, IlangError>;

#[derive(Debug)]
pub enum IlangError {
    /// `return` used outside of a routine body.
    ReturnOutsideRoutine,
    /// Identifier used without a declaration in an enclosing, open scope.
    UndeclaredVariable(SmolStr),
    /// Routine called before its declaration.
    UndeclaredRoutine(SmolStr),
    /// Node, operator or type name without a lowering rule.
    Unsupported(String),
    /// Call site generated before the callee's descriptor was registered.
    UnregisteredRoutine(SmolStr),
    /// Variable missing from the current slot frame.
    UnknownVariable(SmolStr),
    UnknownRecord(SmolStr),
    UnknownField { record: SmolStr, field: SmolStr },
    /// Method frame ran out of addressable slots.
    SlotOverflow,
    /// `if` or `while` condition that is not a relational operation.
    MalformedCondition(String),
    Io(std::io::Error),
}

/// Broad classification of an [`IlangError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Semantic-context violation raised by the checkers.
    Context,
    /// Construct the optimizer or generator has no rule for.
    Unsupported,
    /// Branch condition with the wrong shape.
    Condition,
    /// Failure writing the emitted units.
    Io,
}

impl IlangError {
    #[inline]
    pub fn unsupported(message: impl ToString) -> Self {
        Self::Unsupported(message.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        use IlangError as E;
        match self {
            E::ReturnOutsideRoutine | E::UndeclaredVariable(_) | E::UndeclaredRoutine(_) => ErrorKind::Context,
            E::Unsupported(_)
            | E::UnregisteredRoutine(_)
            | E::UnknownVariable(_)
            | E::UnknownRecord(_)
            | E::UnknownField { .. }
            | E::SlotOverflow => ErrorKind::Unsupported,
            E::MalformedCondition(_) => ErrorKind::Condition,
            E::Io(_) => ErrorKind::Io,
        }
    }
}

impl Display for IlangError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReturnOutsideRoutine => write!(f, "return statement used outside of a routine"),
            Self::UndeclaredVariable(name) => write!(f, "variable '{name}' used before declaration"),
            Self::UndeclaredRoutine(name) => write!(f, "routine '{name}' called before declaration"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            Self::UnregisteredRoutine(name) => {
                write!(f, "routine '{name}' is called before its code was generated")
            }
            Self::UnknownVariable(name) => write!(f, "variable '{name}' is not in the current frame"),
            Self::UnknownRecord(name) => write!(f, "unknown record type '{name}'"),
            Self::UnknownField { record, field } => {
                write!(f, "record '{record}' has no field '{field}'")
            }
            Self::SlotOverflow => write!(f, "number of local slots exceeds {}", u16::MAX),
            Self::MalformedCondition(msg) => write!(f, "malformed condition: {msg}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for IlangError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IlangError {
    fn from(err: std::io::Error) -> Self {
        IlangError::Io(err)
    }
}
