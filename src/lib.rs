//! A click-to-reduce stepper for the untyped lambda calculus.
//!
//! Terms are written as S-expressions (`(lambda (x y) x)`), with `λx.` or
//! `\x.` as a shorthand for one-parameter lambdas. Instead of normalizing a
//! term in one go, the caller picks which redex to reduce next:
//!
//! ```
//! use lambda_step::{enumerate_redexes, format, parse, step_at, Environment, Style};
//!
//! let env = Environment::prelude().unwrap();
//! let term = parse("K a (I b)").unwrap();
//! let redexes = enumerate_redexes(&term, &env);
//! assert_eq!(redexes.len(), 2);
//!
//! // reduce the `I` on the right first
//! let next = step_at(&term, &redexes[1], &env).unwrap().unwrap();
//! assert_eq!(format(&next, Style::Compact), "K a ((λx.x) b)");
//! ```
//!
//! Free variables are reducible too: a name defined in the environment is
//! replaced by its definition, and a numeral by its Church encoding.

pub mod address;
pub mod builder;
pub mod env;
pub mod error;
pub mod format;
pub mod history;
pub mod reduce;
pub mod session;
pub mod sexpr;
pub mod term;

pub use address::{get, replace_at, Address, Step};
pub use builder::{build, parse, parse_strict};
pub use env::{load_environment, Environment};
pub use error::{AddressError, NotReducible, ParseError, SessionError};
pub use format::{format, Style};
pub use history::History;
pub use reduce::{
    classify, enumerate_redexes, normalize, reductions, select_redex, step_at, Policy, Redex,
};
pub use session::Session;
pub use term::Term;
