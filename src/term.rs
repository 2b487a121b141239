use std::collections::HashSet;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::format::{format, Style};

/// An untyped lambda term.
///
/// `index` is the De Bruijn index of a variable: 0 when the variable is free
/// in the whole term, otherwise the number of lambdas between the variable
/// and its binder, counting the binder itself. Names are what reduction goes
/// by; indices are recomputed after every reduction with `reindex()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var { name: String, index: usize },
    Abs { param: String, body: Box<Term> },
    App { func: Box<Term>, arg: Box<Term> },
}

impl Term {
    pub fn free_var(name: &str) -> Term {
        Term::Var {
            name: name.to_string(),
            index: 0,
        }
    }

    pub fn bound_var(name: &str, index: usize) -> Term {
        Term::Var {
            name: name.to_string(),
            index,
        }
    }

    pub fn abs(param: &str, body: Term) -> Term {
        Term::Abs {
            param: param.to_string(),
            body: Box::new(body),
        }
    }

    pub fn app(func: Term, arg: Term) -> Term {
        Term::App {
            func: Box::new(func),
            arg: Box::new(arg),
        }
    }

    /// The Church encoding of `n`: `λf.λx.` followed by `n` applications of
    /// `f`.
    ///
    /// ```
    /// # use lambda_step::Term;
    /// assert_eq!(Term::church(2).to_string(), "λf.λx.(f (f x))");
    /// ```
    pub fn church(n: u64) -> Term {
        let mut body = Term::bound_var("x", 1);
        for _ in 0..n {
            body = Term::app(Term::bound_var("f", 2), body);
        }
        Term::abs("f", Term::abs("x", body))
    }

    /// Names of the variables that occur free, judged by binding structure
    /// rather than by the stored indices.
    pub fn free_vars(&self) -> HashSet<String> {
        let mut free = HashSet::new();
        self.collect_free_vars(&mut Vec::new(), &mut free);
        free
    }

    fn collect_free_vars<'a>(&'a self, bound: &mut Vec<&'a str>, free: &mut HashSet<String>) {
        match self {
            Term::Var { name, .. } => {
                if !bound.contains(&name.as_str()) {
                    free.insert(name.clone());
                }
            },
            Term::Abs { param, body } => {
                bound.push(param);
                body.collect_free_vars(bound, free);
                bound.pop();
            },
            Term::App { func, arg } => {
                func.collect_free_vars(bound, free);
                arg.collect_free_vars(bound, free);
            },
        }
    }

    pub fn has_free_var(&self, var: &str) -> bool {
        match self {
            Term::Var { name, .. } => name == var,
            Term::Abs { param, body } => param != var && body.has_free_var(var),
            Term::App { func, arg } => func.has_free_var(var) || arg.has_free_var(var),
        }
    }

    /// Every name appearing in the term, as a variable or as a parameter.
    pub fn names(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut HashSet<String>) {
        match self {
            Term::Var { name, .. } => {
                names.insert(name.clone());
            },
            Term::Abs { param, body } => {
                names.insert(param.clone());
                body.collect_names(names);
            },
            Term::App { func, arg } => {
                func.collect_names(names);
                arg.collect_names(names);
            },
        }
    }

    /// Equality up to consistent renaming of bound variables.
    ///
    /// ```
    /// # use lambda_step::parse;
    /// let a = parse("λx.λy.(x y)").unwrap();
    /// let b = parse("λp.λq.(p q)").unwrap();
    /// assert!(a.alpha_eq(&b));
    /// ```
    pub fn alpha_eq(&self, other: &Term) -> bool {
        alpha_eq_in(self, other, &mut Vec::new(), &mut Vec::new())
    }

    /// Recomputes every variable's De Bruijn index from the names in scope.
    pub fn reindex(&mut self) {
        self.reindex_in(&mut Vec::new());
    }

    fn reindex_in(&mut self, scope: &mut Vec<String>) {
        match self {
            Term::Var { name, index } => {
                *index = scope_index(scope.iter().map(String::as_str), name.as_str());
            },
            Term::Abs { param, body } => {
                scope.push(param.clone());
                body.reindex_in(scope);
                scope.pop();
            },
            Term::App { func, arg } => {
                func.reindex_in(scope);
                arg.reindex_in(scope);
            },
        }
    }

    /// Replaces the free occurrences of `from` by `to`. The caller picks a
    /// `to` that no binder inside the term can capture.
    pub(crate) fn rename_free(&self, from: &str, to: &str) -> Term {
        match self {
            Term::Var { name, index } => {
                if name == from {
                    Term::Var { name: to.to_string(), index: *index }
                } else {
                    self.clone()
                }
            },
            Term::Abs { param, body } => {
                if param == from {
                    self.clone()
                } else {
                    Term::abs(param, body.rename_free(from, to))
                }
            },
            Term::App { func, arg } => {
                Term::app(func.rename_free(from, to), arg.rename_free(from, to))
            },
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Term::Var { .. } => 1,
            Term::Abs { body, .. } => 1 + body.size(),
            Term::App { func, arg } => 1 + func.size() + arg.size(),
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", format(self, Style::Named))
    }
}

// 1-based distance from the innermost end of `scope` to `name`, 0 if absent.
// `scope` runs outermost to innermost.
pub(crate) fn scope_index<'a, I>(scope: I, name: &str) -> usize
    where I: DoubleEndedIterator<Item = &'a str>
{
    scope.rev().position(|param| param == name).map_or(0, |i| i + 1)
}

fn alpha_eq_in<'a, 'b>(
    a: &'a Term,
    b: &'b Term,
    scope_a: &mut Vec<&'a str>,
    scope_b: &mut Vec<&'b str>,
) -> bool {
    match (a, b) {
        (Term::Var { name: x, .. }, Term::Var { name: y, .. }) => {
            let i = scope_index(scope_a.iter().copied(), x);
            let j = scope_index(scope_b.iter().copied(), y);
            i == j && (i != 0 || x == y)
        },
        (Term::Abs { param: p, body: s }, Term::Abs { param: q, body: t }) => {
            scope_a.push(p);
            scope_b.push(q);
            let eq = alpha_eq_in(s, t, scope_a, scope_b);
            scope_a.pop();
            scope_b.pop();
            eq
        },
        (Term::App { func: f, arg: x }, Term::App { func: g, arg: y }) => {
            alpha_eq_in(f, g, scope_a, scope_b) && alpha_eq_in(x, y, scope_a, scope_b)
        },
        _ => false,
    }
}

/// Primes `name` until it no longer clashes with `names_in_use`.
pub(crate) fn fresh_name(name: &str, names_in_use: &HashSet<String>) -> String {
    let mut new_name = name.to_string();
    while names_in_use.contains(&new_name) {
        new_name.push('\'');
    }
    new_name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn church_zero_and_three() {
        assert_eq!(
            Term::church(0),
            Term::abs("f", Term::abs("x", Term::bound_var("x", 1)))
        );
        let f = || Term::bound_var("f", 2);
        assert_eq!(
            Term::church(3),
            Term::abs("f", Term::abs("x", Term::app(
                f(),
                Term::app(f(), Term::app(f(), Term::bound_var("x", 1))),
            )))
        );
    }

    #[test]
    fn free_vars_follow_binding_structure() {
        // λx.(x y) (λy.y z), with a stale index on purpose
        let term = Term::app(
            Term::abs("x", Term::app(Term::bound_var("x", 1), Term::free_var("y"))),
            Term::abs("y", Term::app(Term::bound_var("y", 0), Term::free_var("z"))),
        );
        assert_eq!(term.free_vars(), names(&["y", "z"]));
        assert!(term.has_free_var("y"));
        assert!(!term.has_free_var("x"));
        assert_eq!(term.names(), names(&["x", "y", "z"]));
    }

    #[test]
    fn alpha_eq_ignores_bound_names() {
        let a = Term::abs("x", Term::abs("y", Term::bound_var("x", 2)));
        let b = Term::abs("p", Term::abs("q", Term::bound_var("p", 2)));
        let c = Term::abs("p", Term::abs("q", Term::bound_var("q", 1)));
        assert!(a.alpha_eq(&b));
        assert!(!a.alpha_eq(&c));
    }

    #[test]
    fn alpha_eq_keeps_free_names() {
        let a = Term::abs("x", Term::free_var("y"));
        let b = Term::abs("x", Term::free_var("z"));
        assert!(!a.alpha_eq(&b));
        // free `x` against bound `x`
        let c = Term::app(Term::abs("x", Term::bound_var("x", 1)), Term::free_var("x"));
        let d = Term::app(Term::abs("x", Term::bound_var("x", 1)), Term::free_var("y"));
        assert!(!c.alpha_eq(&d));
    }

    #[test]
    fn reindex_recomputes_from_names() {
        let mut term = Term::abs("x", Term::app(
            Term::free_var("x"),
            Term::abs("x", Term::app(Term::free_var("x"), Term::bound_var("y", 7))),
        ));
        term.reindex();
        assert_eq!(
            term,
            Term::abs("x", Term::app(
                Term::bound_var("x", 1),
                Term::abs("x", Term::app(Term::bound_var("x", 1), Term::free_var("y"))),
            ))
        );
    }

    #[test]
    fn rename_free_stops_at_shadowing() {
        let term = Term::app(
            Term::free_var("y"),
            Term::abs("y", Term::bound_var("y", 1)),
        );
        assert_eq!(
            term.rename_free("y", "y'"),
            Term::app(Term::free_var("y'"), Term::abs("y", Term::bound_var("y", 1)))
        );
    }

    #[test]
    fn fresh_name_primes_until_unused() {
        assert_eq!(fresh_name("y", &names(&["x"])), "y");
        assert_eq!(fresh_name("y", &names(&["y", "y'"])), "y''");
    }

    #[test]
    fn size_counts_nodes() {
        assert_eq!(Term::church(2).size(), 7);
    }
}
