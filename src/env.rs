use indexmap::IndexMap;
use tracing::debug;

use crate::builder::parse;
use crate::error::ParseError;
use crate::sexpr::Sexpr;
use crate::term::Term;

/// Standard combinators, booleans, pairs and Church arithmetic.
pub const PRELUDE: &str = "\
# combinators
I = λx.x
K = λx.λy.x
S = λx.λy.λz.((x z) (y z))
B = λf.λg.λx.(f (g x))
C = λf.λx.λy.((f y) x)
Y = λf.((λx.(f (x x))) λx.(f (x x)))

# booleans
TRUE = λt.λf.t
FALSE = λt.λf.f
AND = λp.λq.((p q) p)
OR = λp.λq.((p p) q)
NOT = λp.((p FALSE) TRUE)
IF = λp.λa.λb.((p a) b)

# pairs
PAIR = λx.λy.λf.((f x) y)
FST = λp.(p TRUE)
SND = λp.(p FALSE)

# numerals
SUCC = λn.λf.λx.(f ((n f) x))
PRED = λn.λf.λx.(((n λg.λh.(h (g f))) λu.x) λu.u)
PLUS = λm.λn.λf.λx.((m f) ((n f) x))
MULT = λm.λn.λf.(m (n f))
POW = λb.λe.(e b)
ISZERO = λn.((n λx.FALSE) TRUE)
";

/// Named definitions consulted when a free variable is reduced.
///
/// Definitions are kept as parsed, with their own free names unresolved; a
/// name is only looked up when the reducer reaches it. Forward references
/// and redefinitions are therefore fine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    defs: IndexMap<String, Term>,
    // largest numeral expanded; no limit when unset.
    numeral_limit: Option<u64>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    /// The environment described by `PRELUDE`.
    pub fn prelude() -> Result<Environment, ParseError> {
        Environment::from_source(PRELUDE)
    }

    /// Parses a definitions file (see `parse_definitions()`).
    pub fn from_source(source: &str) -> Result<Environment, ParseError> {
        load_environment(parse_definitions(source)?)
    }

    pub fn numeral_limit(&self) -> Option<u64> {
        self.numeral_limit
    }

    /// Stops numerals above `limit` from being expanded. Church numerals
    /// are as deep as they are large, so very large ones can exhaust the
    /// stack of the recursive term walks.
    pub fn set_numeral_limit(&mut self, limit: Option<u64>) {
        self.numeral_limit = limit;
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Adds or replaces a definition, returning the previous one. A
    /// replaced definition keeps its position.
    pub fn insert(&mut self, name: &str, term: Term) -> Option<Term> {
        let old = self.defs.insert(name.to_string(), term);
        if old.is_some() {
            debug!(name, "redefined");
        }
        old
    }

    /// Parses `text` and binds it to `name`. The environment is untouched if
    /// `text` does not parse.
    pub fn define(&mut self, name: &str, text: &str) -> Result<Option<Term>, ParseError> {
        let term = parse(text).map_err(|e| ParseError::Definition {
            name: name.to_string(),
            source: Box::new(e),
        })?;
        Ok(self.insert(name, term))
    }

    pub fn remove(&mut self, name: &str) -> Option<Term> {
        self.defs.shift_remove(name)
    }

    /// Adds every definition of `other`, replacing clashing names. The
    /// numeral limit stays as it is.
    pub fn extend(&mut self, other: Environment) {
        for (name, term) in other.defs {
            self.insert(&name, term);
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    pub fn names_with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.names().filter(|name| name.starts_with(prefix)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.defs.iter().map(|(name, term)| (name.as_str(), term))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Builds an environment from `(name, text)` pairs, in order. Stops at the
/// first definition that does not parse.
///
/// ```
/// # use lambda_step::load_environment;
/// let env = load_environment(vec![("I", "(lambda (x) x)"), ("II", "I I")]).unwrap();
/// assert_eq!(env.len(), 2);
/// assert_eq!(env.get("II").unwrap().to_string(), "(I I)");
/// ```
pub fn load_environment<I, N, T>(definitions: I) -> Result<Environment, ParseError>
    where I: IntoIterator<Item = (N, T)>,
          N: AsRef<str>,
          T: AsRef<str>,
{
    let mut env = Environment::new();
    for (name, text) in definitions {
        env.define(name.as_ref(), text.as_ref())?;
    }
    debug!(definitions = env.len(), "environment loaded");
    Ok(env)
}

/// Splits a definitions file into `(name, text)` pairs. Each non-blank line
/// is `name = expr` or `name := expr`; `#` starts a comment that runs to the
/// end of the line.
pub fn parse_definitions(source: &str) -> Result<Vec<(String, String)>, ParseError> {
    let mut definitions = Vec::new();
    for (i, line) in source.lines().enumerate() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        if line.trim().is_empty() {
            continue;
        }
        let (name, text) = split_definition(line)
            .ok_or(ParseError::MalformedDefinition { line: i + 1 })?;
        definitions.push((name.to_string(), text.trim().to_string()));
    }
    Ok(definitions)
}

/// Splits `name = expr` (or `name := expr`) into its trimmed name and the
/// expression text. `None` unless the left side is a single atom.
///
/// ```
/// # use lambda_step::env::split_definition;
/// assert_eq!(split_definition("I := λx.x"), Some(("I", " λx.x")));
/// assert_eq!(split_definition("(f x) = y"), None);
/// assert_eq!(split_definition("f x"), None);
/// ```
pub fn split_definition(line: &str) -> Option<(&str, &str)> {
    let (pos, len) = match line.find(":=") {
        Some(pos) => (pos, 2),
        None => (line.find('=')?, 1),
    };
    let name = line[..pos].trim();
    if !is_single_atom(name) {
        return None;
    }
    Some((name, &line[pos + len..]))
}

fn is_single_atom(name: &str) -> bool {
    match crate::sexpr::read(name) {
        Sexpr::List(items) => matches!(items.as_slice(), [Sexpr::Atom(atom)] if atom == name),
        Sexpr::Atom(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_keep_order_and_free_names() {
        let env = load_environment(vec![
            ("TWICE", "(lambda (f x) (f (f x)))"),
            ("II", "TWICE I"),
            ("I", "(lambda (x) x)"),
        ]).unwrap();
        assert_eq!(env.names().collect::<Vec<_>>(), vec!["TWICE", "II", "I"]);
        // `I` is resolved lazily, not linked at load time.
        assert_eq!(env.get("II"), Some(&Term::app(Term::free_var("TWICE"), Term::free_var("I"))));
    }

    #[test]
    fn failed_definition_names_the_culprit() {
        let err = load_environment(vec![("I", "(lambda (x) x)"), ("BAD", "(lambda () x)")]);
        assert_eq!(
            err,
            Err(ParseError::Definition {
                name: "BAD".to_string(),
                source: Box::new(ParseError::MissingParameters),
            })
        );
    }

    #[test]
    fn redefinition_replaces_in_place() {
        let mut env = load_environment(vec![("A", "a"), ("B", "b")]).unwrap();
        let old = env.define("A", "c").unwrap();
        assert_eq!(old, Some(Term::free_var("a")));
        assert_eq!(env.get("A"), Some(&Term::free_var("c")));
        assert_eq!(env.names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn failed_define_leaves_env_untouched() {
        let mut env = load_environment(vec![("A", "a")]).unwrap();
        let before = env.clone();
        assert!(env.define("A", "()").is_err());
        assert_eq!(env, before);
    }

    #[test]
    fn names_with_prefix_for_completion() {
        let env = Environment::prelude().unwrap();
        let mut names = env.names_with_prefix("S");
        names.sort();
        assert_eq!(names, vec!["S", "SND", "SUCC"]);
    }

    #[test]
    fn parse_definitions_skips_comments_and_blanks() {
        let source = "\
# identity
I = (lambda (x) x)   # trailing comment

K := λx.λy.x
";
        assert_eq!(
            parse_definitions(source),
            Ok(vec![
                ("I".to_string(), "(lambda (x) x)".to_string()),
                ("K".to_string(), "λx.λy.x".to_string()),
            ])
        );
    }

    #[test]
    fn parse_definitions_reports_the_line() {
        assert_eq!(
            parse_definitions("I = x\nnot a definition\n"),
            Err(ParseError::MalformedDefinition { line: 2 })
        );
        assert_eq!(
            parse_definitions("\n(f x) = y"),
            Err(ParseError::MalformedDefinition { line: 2 })
        );
    }

    #[test]
    fn prelude_parses() {
        let env = Environment::prelude().unwrap();
        assert_eq!(env.len(), 21);
        assert!(env.get("SUCC").unwrap().alpha_eq(
            &parse("(lambda (n f x) (f (n f x)))").unwrap()
        ));
    }
}
