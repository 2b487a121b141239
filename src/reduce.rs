//! Single-step reduction at a caller-chosen address.
//!
//! The reducer has no traversal strategy of its own: `step_at()` reduces
//! exactly the subterm it is pointed at. Strategies are choices of address,
//! made by `select_redex()` from the candidates `enumerate_redexes()` finds.

use std::collections::HashSet;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, trace};

use crate::address::{binders_along, get, replace_at, Address, Step};
use crate::env::Environment;
use crate::error::{AddressError, NotReducible};
use crate::term::{fresh_name, Term};

/// What reducing a location does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redex {
    /// An abstraction applied to an argument.
    Beta,
    /// A free variable with a definition in the environment.
    Definition(String),
    /// A free variable spelled as a natural number.
    Numeral(u64),
}

impl Display for Redex {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Redex::Beta => write!(f, "beta"),
            Redex::Definition(name) => write!(f, "definition of {}", name),
            Redex::Numeral(n) => write!(f, "numeral {}", n),
        }
    }
}

// `None` unless `name` is all digits; `Some(None)` when it overflows a u64.
fn numeral_literal(name: &str) -> Option<Option<u64>> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(name.parse().ok())
}

// `binders` are the parameters of the lambdas enclosing `term`.
fn classify_node(term: &Term, binders: &[&str], env: &Environment) -> Result<Redex, NotReducible> {
    match term {
        Term::Var { name, .. } => {
            if binders.contains(&name.as_str()) {
                Err(NotReducible::BoundVariable(name.clone()))
            } else if env.contains(name) {
                Ok(Redex::Definition(name.clone()))
            } else {
                let within_limit = |n: u64| env.numeral_limit().map_or(true, |limit| n <= limit);
                match numeral_literal(name) {
                    Some(Some(n)) if within_limit(n) => Ok(Redex::Numeral(n)),
                    Some(_) => Err(NotReducible::NumeralTooLarge(name.clone())),
                    None => Err(NotReducible::UnboundEnvironmentReference(name.clone())),
                }
            }
        },
        Term::App { func, .. } => match **func {
            Term::Abs { .. } => Ok(Redex::Beta),
            _ => Err(NotReducible::NotAnAbstractionApplication),
        },
        Term::Abs { .. } => Err(NotReducible::Abstraction),
    }
}

/// Says what `step_at()` would do at `address`, or why it would do nothing.
pub fn classify(
    term: &Term,
    address: &Address,
    env: &Environment,
) -> Result<Result<Redex, NotReducible>, AddressError> {
    let sub = get(term, address)?;
    let binders = binders_along(term, address)?;
    Ok(classify_node(sub, &binders, env))
}

/// Performs one reduction at `address`.
///
/// Returns `Ok(None)` when the subterm there is not a redex; the caller
/// should treat that location as inert. The input term is left untouched.
///
/// ```
/// # use lambda_step::{parse, step_at, Address, Environment};
/// let term = parse("((lambda (x) (lambda (y) (x y))) y)").unwrap();
/// let reduced = step_at(&term, &Address::root(), &Environment::new()).unwrap().unwrap();
/// assert_eq!(reduced.to_string(), "λy'.(y y')");
/// ```
pub fn step_at(term: &Term, address: &Address, env: &Environment) -> Result<Option<Term>, AddressError> {
    let sub = get(term, address)?;
    let binders = binders_along(term, address)?;
    let redex = match classify_node(sub, &binders, env) {
        Ok(redex) => redex,
        Err(reason) => {
            trace!(%address, %reason, "not reducible");
            return Ok(None);
        },
    };
    debug!(%address, %redex, "reducing");

    let mut result = match (&redex, sub) {
        (Redex::Beta, Term::App { func, arg }) => match &**func {
            Term::Abs { param, body } => replace_at(term, address, substitute(body, param, arg))?,
            _ => return Ok(None),
        },
        (Redex::Definition(name), _) => {
            let definition = match env.get(name) {
                Some(definition) => definition.clone(),
                None => return Ok(None),
            };
            let protected = protect_binders(term, address.steps(), &definition.free_vars());
            replace_at(&protected, address, definition)?
        },
        (Redex::Numeral(n), _) => replace_at(term, address, Term::church(*n))?,
        _ => return Ok(None),
    };
    result.reindex();
    Ok(Some(result))
}

/// Capture-avoiding substitution of `arg` for the free occurrences of `var`
/// in `body`. Each occurrence gets its own copy of `arg`.
pub fn substitute(body: &Term, var: &str, arg: &Term) -> Term {
    subst(body, var, arg, &arg.free_vars())
}

fn subst(term: &Term, var: &str, arg: &Term, arg_free: &HashSet<String>) -> Term {
    match term {
        Term::Var { name, .. } => {
            if name == var {
                arg.clone()
            } else {
                term.clone()
            }
        },
        Term::App { func, arg: right } => {
            Term::app(subst(func, var, arg, arg_free), subst(right, var, arg, arg_free))
        },
        Term::Abs { param, body } => {
            if param == var {
                // `var` is shadowed; nothing to replace below.
                term.clone()
            } else if arg_free.contains(param) && body.has_free_var(var) {
                let mut names_in_use = body.names();
                names_in_use.extend(arg_free.iter().cloned());
                names_in_use.insert(var.to_string());
                let new_param = fresh_name(param, &names_in_use);
                debug!(from = %param, to = %new_param, "alpha-converting to avoid capture");
                let renamed = body.rename_free(param, &new_param);
                Term::abs(&new_param, subst(&renamed, var, arg, arg_free))
            } else {
                Term::abs(param, subst(body, var, arg, arg_free))
            }
        },
    }
}

// Renames the lambdas on the path `steps` whose parameter is in `free`, so a
// term with those free names can be spliced in at the end of the path
// without being captured. Renaming keeps the tree's shape, so `steps` stays
// valid for the result.
fn protect_binders(term: &Term, steps: &[Step], free: &HashSet<String>) -> Term {
    match (steps.split_first(), term) {
        (Some((Step::Body, rest)), Term::Abs { param, body }) => {
            if free.contains(param) {
                let mut names_in_use = body.names();
                names_in_use.extend(free.iter().cloned());
                let new_param = fresh_name(param, &names_in_use);
                debug!(from = %param, to = %new_param, "alpha-converting enclosing lambda");
                let renamed = body.rename_free(param, &new_param);
                Term::abs(&new_param, protect_binders(&renamed, rest, free))
            } else {
                Term::abs(param, protect_binders(body, rest, free))
            }
        },
        (Some((Step::Func, rest)), Term::App { func, arg }) => {
            Term::app(protect_binders(func, rest, free), (**arg).clone())
        },
        (Some((Step::Arg, rest)), Term::App { func, arg }) => {
            Term::app((**func).clone(), protect_binders(arg, rest, free))
        },
        _ => term.clone(),
    }
}

/// Every address `step_at()` would reduce, in pre-order (the first one is
/// the leftmost-outermost redex).
pub fn enumerate_redexes(term: &Term, env: &Environment) -> Vec<Address> {
    let mut redexes = Vec::new();
    collect_redexes(term, env, &mut Vec::new(), &mut Address::root(), &mut redexes);
    redexes
}

fn collect_redexes<'a>(
    term: &'a Term,
    env: &Environment,
    binders: &mut Vec<&'a str>,
    address: &mut Address,
    redexes: &mut Vec<Address>,
) {
    if classify_node(term, &binders[..], env).is_ok() {
        redexes.push(address.clone());
    }
    match term {
        Term::Var { .. } => {},
        Term::Abs { param, body } => {
            binders.push(param);
            address.push(Step::Body);
            collect_redexes(body, env, binders, address, redexes);
            address.pop();
            binders.pop();
        },
        Term::App { func, arg } => {
            address.push(Step::Func);
            collect_redexes(func, env, binders, address, redexes);
            address.pop();
            address.push(Step::Arg);
            collect_redexes(arg, env, binders, address, redexes);
            address.pop();
        },
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Depth {
    /// Redexes not inside another redex.
    Outermost,
    /// Redexes containing no other redex.
    Innermost,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    Leftmost,
    Rightmost,
}

/// A tie-break rule for picking one redex among many.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Policy {
    pub depth: Depth,
    pub side: Side,
}

impl Policy {
    pub const NORMAL_ORDER: Policy = Policy { depth: Depth::Outermost, side: Side::Leftmost };
    pub const APPLICATIVE_ORDER: Policy = Policy { depth: Depth::Innermost, side: Side::Leftmost };

    pub const ALL: [Policy; 4] = [
        Policy::NORMAL_ORDER,
        Policy::APPLICATIVE_ORDER,
        Policy { depth: Depth::Outermost, side: Side::Rightmost },
        Policy { depth: Depth::Innermost, side: Side::Rightmost },
    ];

    pub const fn name(&self) -> &'static str {
        match (self.depth, self.side) {
            (Depth::Outermost, Side::Leftmost) => "lo",
            (Depth::Innermost, Side::Leftmost) => "li",
            (Depth::Outermost, Side::Rightmost) => "ro",
            (Depth::Innermost, Side::Rightmost) => "ri",
        }
    }
}

impl Default for Policy {
    fn default() -> Policy {
        Policy::NORMAL_ORDER
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown policy `{0}` (expected lo, li, ro or ri)")]
pub struct UnknownPolicy(String);

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Policy, UnknownPolicy> {
        Policy::ALL
            .iter()
            .copied()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| UnknownPolicy(s.to_string()))
    }
}

/// Picks one of `candidates` according to `policy`. Only ranks addresses;
/// whether they are redexes is the caller's business.
pub fn select_redex(candidates: &[Address], policy: Policy) -> Option<Address> {
    let eligible = candidates.iter().filter(|a| match policy.depth {
        Depth::Outermost => !candidates.iter().any(|b| b.is_ancestor_of(a)),
        Depth::Innermost => !candidates.iter().any(|b| a.is_ancestor_of(b)),
    });
    let chosen = match policy.side {
        Side::Leftmost => eligible.min(),
        Side::Rightmost => eligible.max(),
    };
    chosen.cloned()
}

/// The successive terms obtained by always reducing the redex `policy`
/// picks. Ends at a term with no redex; may never end.
pub struct Reductions<'e> {
    current: Option<Term>,
    env: &'e Environment,
    policy: Policy,
}

pub fn reductions(term: Term, env: &Environment, policy: Policy) -> Reductions<'_> {
    Reductions {
        current: Some(term),
        env,
        policy,
    }
}

impl Iterator for Reductions<'_> {
    type Item = Term;

    fn next(&mut self) -> Option<Term> {
        let term = self.current.take()?;
        let address = select_redex(&enumerate_redexes(&term, self.env), self.policy)?;
        let next = match step_at(&term, &address, self.env) {
            Ok(next) => next,
            Err(e) => {
                debug!(%e, "stale redex address");
                None
            },
        };
        self.current = next.clone();
        next
    }
}

/// Outcome of `normalize()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Every term after the initial one, in order.
    pub steps: Vec<Term>,
    /// False when `max_steps` ran out first.
    pub normal_form: bool,
}

impl Normalized {
    pub fn last<'a>(&'a self, initial: &'a Term) -> &'a Term {
        self.steps.last().unwrap_or(initial)
    }
}

/// Reduces `term` by `policy` until no redex remains or `max_steps` steps
/// were taken.
pub fn normalize(term: &Term, env: &Environment, policy: Policy, max_steps: usize) -> Normalized {
    let steps: Vec<Term> = reductions(term.clone(), env, policy).take(max_steps).collect();
    let last = steps.last().unwrap_or(term);
    let normal_form = enumerate_redexes(last, env).is_empty();
    Normalized { steps, normal_form }
}
