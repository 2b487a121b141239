use std::fmt;
use std::fmt::{Display, Formatter};
use std::iter::FromIterator;
use std::str::FromStr;

use crate::error::AddressError;
use crate::term::Term;

/// One move from a node to one of its children.
///
/// The declaration order makes the derived `Ord` on addresses a pre-order:
/// an ancestor sorts before its descendants, the function side before the
/// argument side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Func,
    Body,
    Arg,
}

impl Step {
    pub const fn name(&self) -> &'static str {
        match self {
            Step::Func => "func-side",
            Step::Body => "body",
            Step::Arg => "arg-side",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Step {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Step, AddressError> {
        match s {
            "body" => Ok(Step::Body),
            "func-side" => Ok(Step::Func),
            "arg-side" => Ok(Step::Arg),
            _ => Err(AddressError::UnknownStep(s.to_string())),
        }
    }
}

/// A path from the root of a term to one of its subterms. Only meaningful for
/// the term it was computed from.
///
/// ```
/// # use lambda_step::{Address, Step};
/// let address: Address = "func-side/body".parse().unwrap();
/// assert_eq!(address.steps(), &[Step::Func, Step::Body]);
/// assert_eq!(address.to_string(), "func-side/body");
/// assert_eq!(Address::root().to_string(), "root");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(Vec<Step>);

impl Address {
    pub fn root() -> Address {
        Address(Vec::new())
    }

    pub fn child(&self, step: Step) -> Address {
        let mut steps = self.0.clone();
        steps.push(step);
        Address(steps)
    }

    pub fn push(&mut self, step: Step) {
        self.0.push(step);
    }

    pub fn pop(&mut self) -> Option<Step> {
        self.0.pop()
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` is a proper prefix of `other`.
    pub fn is_ancestor_of(&self, other: &Address) -> bool {
        self.len() < other.len() && other.0.starts_with(&self.0)
    }
}

impl From<Vec<Step>> for Address {
    fn from(steps: Vec<Step>) -> Address {
        Address(steps)
    }
}

impl FromIterator<Step> for Address {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Address {
        Address(iter.into_iter().collect())
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "root");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Address, AddressError> {
        let s = s.trim();
        if s.is_empty() || s == "root" {
            return Ok(Address::root());
        }
        s.split('/').map(|step| step.trim().parse::<Step>()).collect()
    }
}

fn child<'a>(term: &'a Term, step: Step) -> Option<&'a Term> {
    match (step, term) {
        (Step::Body, Term::Abs { body, .. }) => Some(body),
        (Step::Func, Term::App { func, .. }) => Some(func),
        (Step::Arg, Term::App { arg, .. }) => Some(arg),
        _ => None,
    }
}

/// The subterm of `term` at `address`.
pub fn get<'a>(term: &'a Term, address: &Address) -> Result<&'a Term, AddressError> {
    let mut node = term;
    for (depth, step) in address.steps().iter().enumerate() {
        node = child(node, *step).ok_or_else(|| AddressError::InvalidAddress {
            address: address.clone(),
            depth,
        })?;
    }
    Ok(node)
}

/// Parameters of the lambdas crossed on the way from the root to `address`,
/// outermost first.
pub fn binders_along<'a>(term: &'a Term, address: &Address) -> Result<Vec<&'a str>, AddressError> {
    let mut node = term;
    let mut binders = Vec::new();
    for (depth, step) in address.steps().iter().enumerate() {
        if let Term::Abs { param, .. } = node {
            binders.push(param.as_str());
        }
        node = child(node, *step).ok_or_else(|| AddressError::InvalidAddress {
            address: address.clone(),
            depth,
        })?;
    }
    Ok(binders)
}

/// A copy of `term` where the subterm at `address` is `new`. The empty
/// address replaces the whole term.
pub fn replace_at(term: &Term, address: &Address, new: Term) -> Result<Term, AddressError> {
    if address.is_empty() {
        return Ok(new);
    }
    splice(term, address, 0, new)
}

fn splice(term: &Term, address: &Address, depth: usize, new: Term) -> Result<Term, AddressError> {
    let step = match address.steps().get(depth) {
        None => return Ok(new),
        Some(step) => *step,
    };
    let invalid = || AddressError::InvalidAddress { address: address.clone(), depth };
    match (step, term) {
        (Step::Body, Term::Abs { param, body }) => {
            Ok(Term::abs(param, splice(body, address, depth + 1, new)?))
        },
        (Step::Func, Term::App { func, arg }) => {
            Ok(Term::app(splice(func, address, depth + 1, new)?, (**arg).clone()))
        },
        (Step::Arg, Term::App { func, arg }) => {
            Ok(Term::app((**func).clone(), splice(arg, address, depth + 1, new)?))
        },
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::builder::parse;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[rstest]
    #[case("root", "((λx.(x y)) z)")]
    #[case("func-side", "λx.(x y)")]
    #[case("func-side/body", "(x y)")]
    #[case("func-side/body/arg-side", "y")]
    #[case("arg-side", "z")]
    fn get_follows_the_path(#[case] address: &str, #[case] expected: &str) {
        let term = parse("(lambda (x) x y) z").unwrap();
        assert_eq!(get(&term, &addr(address)).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("body", 0)]
    #[case("func-side/func-side", 1)]
    #[case("func-side/body/arg-side/body", 3)]
    fn get_rejects_mismatched_steps(#[case] address: &str, #[case] depth: usize) {
        let term = parse("(lambda (x) x y) z").unwrap();
        assert_eq!(
            get(&term, &addr(address)),
            Err(AddressError::InvalidAddress { address: addr(address), depth })
        );
    }

    #[test]
    fn replace_at_root_swaps_the_term() {
        let term = parse("x").unwrap();
        let new = parse("y z").unwrap();
        assert_eq!(replace_at(&term, &Address::root(), new.clone()), Ok(new));
    }

    #[test]
    fn replace_at_leaves_the_original_alone() {
        let term = parse("(lambda (x) x y) z").unwrap();
        let before = term.clone();
        let replaced = replace_at(&term, &addr("func-side/body/arg-side"), Term::free_var("w")).unwrap();
        assert_eq!(replaced.to_string(), "((λx.(x w)) z)");
        assert_eq!(term, before);
    }

    #[test]
    fn replace_at_rejects_mismatched_steps() {
        let term = parse("x y").unwrap();
        assert_eq!(
            replace_at(&term, &addr("arg-side/body"), Term::free_var("w")),
            Err(AddressError::InvalidAddress { address: addr("arg-side/body"), depth: 1 })
        );
    }

    #[test]
    fn binders_along_collects_params() {
        let term = parse("(lambda (x y) (lambda (z) z) x)").unwrap();
        assert_eq!(binders_along(&term, &addr("body/body/func-side/body")), Ok(vec!["x", "y", "z"]));
        assert_eq!(binders_along(&term, &addr("body/body")), Ok(vec!["x", "y"]));
    }

    #[test]
    fn address_text_form() {
        assert_eq!(addr(""), Address::root());
        assert_eq!(addr("func-side / arg-side"), Address::from(vec![Step::Func, Step::Arg]));
        assert_eq!("func".parse::<Step>(), Err(AddressError::UnknownStep("func".to_string())));
        assert_eq!(
            "arg-side/arg".parse::<Address>(),
            Err(AddressError::UnknownStep("arg".to_string()))
        );
        assert_eq!(
            "body/left".parse::<Address>(),
            Err(AddressError::UnknownStep("left".to_string()))
        );
    }

    #[test]
    fn addresses_sort_in_pre_order() {
        let mut addresses = vec![addr("arg-side"), addr("func-side/arg-side"), addr("root"), addr("func-side")];
        addresses.sort();
        assert_eq!(
            addresses,
            vec![addr("root"), addr("func-side"), addr("func-side/arg-side"), addr("arg-side")]
        );
        assert!(addr("func-side").is_ancestor_of(&addr("func-side/body")));
        assert!(!addr("func-side").is_ancestor_of(&addr("func-side")));
    }
}
