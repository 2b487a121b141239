use thiserror::Error;

use crate::address::Address;

/// Errors raised while turning text into a term.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    EmptyExpression,

    #[error("lambda requires a non-empty parameter list")]
    MissingParameters,

    #[error("invalid lambda parameter `{0}`")]
    InvalidParameter(String),

    #[error("{0} unclosed parentheses")]
    UnclosedParens(usize),

    #[error("unexpected closing parenthesis at byte {0}")]
    UnexpectedCloseParen(usize),

    #[error("line {line}: expected a definition of the form `name = expr`")]
    MalformedDefinition { line: usize },

    #[error("in definition of `{name}`: {source}")]
    Definition {
        name: String,
        #[source]
        source: Box<ParseError>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address `{address}` does not match the term shape at depth {depth}")]
    InvalidAddress { address: Address, depth: usize },

    #[error("unknown address step `{0}`")]
    UnknownStep(String),
}

/// Why a location cannot be reduced. Never fatal: callers use it to explain
/// a disabled interaction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NotReducible {
    #[error("`{0}` is neither defined in the environment nor a numeral")]
    UnboundEnvironmentReference(String),

    #[error("`{0}` is bound by an enclosing lambda")]
    BoundVariable(String),

    #[error("application whose function side is not a lambda")]
    NotAnAbstractionApplication,

    #[error("a lambda is not reducible by itself")]
    Abstraction,

    #[error("numeral {0} is above the numeral limit")]
    NumeralTooLarge(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("no term loaded")]
    NoTerm,

    #[error("there is no redex number {index} ({count} available)")]
    NoSuchRedex { index: usize, count: usize },
}
