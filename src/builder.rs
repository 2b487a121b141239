use tracing::trace;

use crate::error::ParseError;
use crate::sexpr::{expand_shorthand, read, read_strict, Sexpr};
use crate::term::{scope_index, Term};

/// Head atom of an abstraction.
pub const LAMBDA: &str = "lambda";

/// Parses `line` into a term. The top-level forms make up one application,
/// so left associativity is assumed:
///
/// ```
/// # use lambda_step::parse;
/// assert_eq!(parse("a b c d"), parse("(((a b) c) d)"));
/// ```
///
/// Unnecessary parentheses are ignored:
///
/// ```
/// # use lambda_step::parse;
/// assert_eq!(parse("((((a))))"), parse("a"));
/// ```
///
/// Numerals stay plain variables until they are reduced.
pub fn parse(line: &str) -> Result<Term, ParseError> {
    let expanded = expand_shorthand(line);
    trace!(%expanded, "parsing");
    build(&read(&expanded), &[])
}

/// Like `parse()`, but unbalanced parentheses are reported instead of
/// repaired.
pub fn parse_strict(line: &str) -> Result<Term, ParseError> {
    let expanded = expand_shorthand(line);
    build(&read_strict(&expanded)?, &[])
}

/// Converts an S-expression into a term. `scope` lists the parameters of the
/// enclosing lambdas, innermost first, and decides the De Bruijn indices of
/// the variables.
pub fn build(sexpr: &Sexpr, scope: &[String]) -> Result<Term, ParseError> {
    // innermost last from here on, so entering a lambda is a push.
    let mut lambda_vars: Vec<String> = scope.iter().rev().cloned().collect();
    build_in(sexpr, &mut lambda_vars)
}

fn build_in(sexpr: &Sexpr, lambda_vars: &mut Vec<String>) -> Result<Term, ParseError> {
    match sexpr {
        Sexpr::Atom(name) => {
            let index = scope_index(lambda_vars.iter().map(String::as_str), name);
            Ok(Term::Var { name: name.clone(), index })
        },
        Sexpr::List(items) => build_seq(items, lambda_vars),
    }
}

fn build_seq(items: &[Sexpr], lambda_vars: &mut Vec<String>) -> Result<Term, ParseError> {
    match items {
        [] => Err(ParseError::EmptyExpression),
        [head, rest @ ..] if head.as_atom() == Some(LAMBDA) => build_lambda(rest, lambda_vars),
        [single] => build_in(single, lambda_vars),
        _ => {
            let mut queue = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                if item.as_atom() == Some(LAMBDA) {
                    // the lambda body stretches as far as possible.
                    queue.push(build_lambda(&items[i + 1..], lambda_vars)?);
                    break;
                }
                queue.push(build_in(item, lambda_vars)?);
            }
            finalize_application(queue).ok_or(ParseError::EmptyExpression)
        },
    }
}

// `rest` is everything after the `lambda` head: the parameter list, then the
// body. `lambda (x y) b` is treated as `lambda (x) (lambda (y) b)`.
fn build_lambda(rest: &[Sexpr], lambda_vars: &mut Vec<String>) -> Result<Term, ParseError> {
    let (params, body) = match rest.split_first() {
        Some((Sexpr::List(params), body)) if !params.is_empty() => (params, body),
        _ => return Err(ParseError::MissingParameters),
    };
    let names = params
        .iter()
        .map(|p| p.as_atom().ok_or_else(|| ParseError::InvalidParameter(p.to_string())))
        .collect::<Result<Vec<&str>, _>>()?;

    let depth = lambda_vars.len();
    lambda_vars.extend(names.iter().map(|name| name.to_string()));
    let body = build_seq(body, lambda_vars);
    lambda_vars.truncate(depth);

    let mut term = body?;
    for name in names.iter().rev() {
        term = Term::abs(name, term);
    }
    Ok(term)
}

fn finalize_application(mut queue: Vec<Term>) -> Option<Term> {
    let mut q_drain = queue.drain(..);

    let mut result = q_drain.next()?;
    for term in q_drain {
        // left associative
        result = Term::app(result, term);
    }
    Some(result)
}
