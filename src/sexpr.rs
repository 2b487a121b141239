use std::borrow::Cow;
use std::fmt;
use std::fmt::{Display, Formatter};

use tracing::trace;

use crate::error::ParseError;

/// A parenthesized tree of atoms, as produced by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sexpr {
    Atom(String),
    List(Vec<Sexpr>),
}

impl Sexpr {
    pub fn atom(name: &str) -> Sexpr {
        Sexpr::Atom(name.to_string())
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexpr::Atom(name) => Some(name),
            Sexpr::List(_) => None,
        }
    }
}

impl Display for Sexpr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Sexpr::Atom(name) => write!(f, "{}", name),
            Sexpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            },
        }
    }
}

/// Tokens understood by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    OpenParen,
    CloseParen,
    Atom(&'a str),
}

/// An iterator over the tokens of a string, paired with the byte offset
/// where each token starts.
///
/// ```
/// # use lambda_step::sexpr::{Token, TokenIter};
/// let tokens: Vec<_> = TokenIter::new("(f x)").map(|(_, t)| t).collect();
/// assert_eq!(tokens, vec![
///     Token::OpenParen, Token::Atom("f"), Token::Atom("x"), Token::CloseParen,
/// ]);
/// ```
///
#[derive(Clone)]
pub struct TokenIter<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = (usize, Token<'a>);

    fn next(&mut self) -> Option<(usize, Token<'a>)> {
        self.consume_whitespace();

        let start = self.pos;
        let rest_of_string = self.rest_of_string();
        let first_char = rest_of_string.chars().next()?;
        match first_char {
            '(' => {
                self.pos += 1;
                Some((start, Token::OpenParen))
            },
            ')' => {
                self.pos += 1;
                Some((start, Token::CloseParen))
            },
            _ => {
                let atom_len: usize = rest_of_string
                    .chars()
                    .take_while(|&c| is_atom_char(c))
                    .map(char::len_utf8)
                    .sum();
                self.pos += atom_len;
                Some((start, Token::Atom(&rest_of_string[..atom_len])))
            },
        }
    }
}

impl<'a> TokenIter<'a> {
    pub fn new(s: &'a str) -> TokenIter<'a> {
        TokenIter { s, pos: 0 }
    }

    fn rest_of_string(&self) -> &'a str {
        &self.s[self.pos..]
    }

    fn consume_whitespace(&mut self) {
        let rest_of_string = self.rest_of_string();
        for c in rest_of_string.chars() {
            if !c.is_whitespace() {
                break
            }
            self.pos += c.len_utf8();
        }
    }
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')'
}

// How a call to read_list() stopped.
enum Close {
    Paren(usize),
    Eof,
}

struct Reader<'a> {
    tokens: TokenIter<'a>,
    // lists that hit the end of input before their ')'.
    unclosed: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Reader<'a> {
        Reader {
            tokens: TokenIter::new(text),
            unclosed: 0,
        }
    }

    fn read_list(&mut self, nested: bool) -> (Vec<Sexpr>, Close) {
        let mut items = Vec::new();
        loop {
            match self.tokens.next() {
                None => {
                    if nested {
                        self.unclosed += 1;
                    }
                    return (items, Close::Eof);
                },
                Some((pos, Token::CloseParen)) => return (items, Close::Paren(pos)),
                Some((_, Token::OpenParen)) => {
                    let (inner, _) = self.read_list(true);
                    items.push(Sexpr::List(inner));
                },
                Some((_, Token::Atom(name))) => items.push(Sexpr::atom(name)),
            }
        }
    }
}

/// Reads every top-level form of `text` into one `Sexpr::List`.
///
/// Malformed nesting degrades to a partial tree: lists left open at the end
/// of input are closed, and a stray `)` at top level ends the read.
///
/// ```
/// # use lambda_step::sexpr::{read, Sexpr};
/// assert_eq!(read("(a b"), read("(a b)"));
/// assert_eq!(read("a ) b"), Sexpr::List(vec![Sexpr::atom("a")]));
/// ```
pub fn read(text: &str) -> Sexpr {
    let mut reader = Reader::new(text);
    let (items, close) = reader.read_list(false);
    if let Close::Paren(pos) = close {
        trace!(pos, "stray closing parenthesis, ignoring the rest of the input");
    }
    if reader.unclosed > 0 {
        trace!(count = reader.unclosed, "auto-closing parentheses at end of input");
    }
    Sexpr::List(items)
}

/// Like `read()`, but unbalanced parentheses are errors.
pub fn read_strict(text: &str) -> Result<Sexpr, ParseError> {
    let mut reader = Reader::new(text);
    let (items, close) = reader.read_list(false);
    if let Close::Paren(pos) = close {
        return Err(ParseError::UnexpectedCloseParen(pos));
    }
    if reader.unclosed > 0 {
        return Err(ParseError::UnclosedParens(reader.unclosed));
    }
    Ok(Sexpr::List(items))
}

/// Number of lists `text` leaves open at the end.
///
/// ```
/// # use lambda_step::sexpr::unclosed_parens;
/// assert_eq!(unclosed_parens("(lambda (x) (x"), 2);
/// assert_eq!(unclosed_parens("a b"), 0);
/// ```
pub fn unclosed_parens(text: &str) -> usize {
    let mut reader = Reader::new(text);
    reader.read_list(false);
    reader.unclosed
}

/// Rewrites the `λx.` shorthand (or its ASCII spelling `\x.`) into the
/// `lambda (x) ` form the reader understands. Curried chains such as
/// `λa.λb.a` expand one binder at a time.
///
/// ```
/// # use lambda_step::sexpr::expand_shorthand;
/// assert_eq!(expand_shorthand("λa.λb.a"), "lambda (a) lambda (b) a");
/// assert_eq!(expand_shorthand("(f x)"), "(f x)");
/// ```
pub fn expand_shorthand(text: &str) -> Cow<'_, str> {
    if !text.contains(is_lambda_marker) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    while let Some(i) = rest.find(is_lambda_marker) {
        let (before, from) = rest.split_at(i);
        out.push_str(before);

        let marker_len = from.chars().next().map_or(1, char::len_utf8);
        let after = &from[marker_len..];
        let name_len: usize = after
            .chars()
            .take_while(|&c| is_shorthand_name_char(c))
            .map(char::len_utf8)
            .sum();

        if name_len > 0 && after[name_len..].starts_with('.') {
            // keep "fλx.x" from gluing onto the preceding atom.
            if out.chars().next_back().map_or(false, is_atom_char) {
                out.push(' ');
            }
            out.push_str("lambda (");
            out.push_str(&after[..name_len]);
            out.push_str(") ");
            rest = &after[name_len + 1..];
        } else {
            out.push_str(&from[..marker_len]);
            rest = after;
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn is_lambda_marker(c: char) -> bool {
    c == 'λ' || c == '\\'
}

/// Whether `c` may appear in a parameter name written with the shorthand.
pub(crate) fn is_shorthand_name_char(c: char) -> bool {
    is_atom_char(c) && c != '.' && !is_lambda_marker(c)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn list(items: Vec<Sexpr>) -> Sexpr {
        Sexpr::List(items)
    }
    fn atom(name: &str) -> Sexpr {
        Sexpr::atom(name)
    }

    #[test]
    fn atoms_take_any_non_paren_run() {
        let tokens: Vec<_> = TokenIter::new("  λx.y  a'b(12)").collect();
        assert_eq!(tokens, vec![
            (2, Token::Atom("λx.y")),
            (9, Token::Atom("a'b")),
            (12, Token::OpenParen),
            (13, Token::Atom("12")),
            (15, Token::CloseParen),
        ]);
    }

    #[test]
    fn nested_lists() {
        assert_eq!(
            read("(lambda (x y) (x y))"),
            list(vec![list(vec![
                atom("lambda"),
                list(vec![atom("x"), atom("y")]),
                list(vec![atom("x"), atom("y")]),
            ])])
        );
    }

    #[test]
    fn bare_atoms_at_top_level() {
        assert_eq!(read("x y z"), list(vec![atom("x"), atom("y"), atom("z")]));
    }

    #[test]
    fn empty_input() {
        assert_eq!(read("   "), list(vec![]));
    }

    #[rstest]
    #[case("(a (b c", "(a (b c))")]
    #[case("((a", "((a))")]
    #[case("(", "()")]
    fn missing_close_parens_are_auto_closed(#[case] partial: &str, #[case] full: &str) {
        assert_eq!(read(partial), read(full));
    }

    #[test]
    fn stray_close_paren_stops_reading() {
        assert_eq!(read(") a"), list(vec![]));
        assert_eq!(read("(a) ) (b)"), list(vec![list(vec![atom("a")])]));
    }

    #[rstest]
    #[case("(a (b c", ParseError::UnclosedParens(2))]
    #[case("(a", ParseError::UnclosedParens(1))]
    #[case("a )", ParseError::UnexpectedCloseParen(2))]
    #[case("(a))", ParseError::UnexpectedCloseParen(3))]
    fn strict_read_rejects_unbalanced(#[case] text: &str, #[case] expected: ParseError) {
        assert_eq!(read_strict(text), Err(expected));
    }

    #[test]
    fn strict_read_agrees_on_balanced_input() {
        let text = "(lambda (f x) (f (f x))) y";
        assert_eq!(read_strict(text), Ok(read(text)));
    }

    #[test]
    fn display_is_parenthesized() {
        assert_eq!(read("(a (b) c)").to_string(), "((a (b) c))");
    }

    #[rstest]
    #[case("λx.x", "lambda (x) x")]
    #[case("\\x.x", "lambda (x) x")]
    #[case("(λx.x y)", "(lambda (x) x y)")]
    #[case("λf.λx.(f x)", "lambda (f) lambda (x) (f x)")]
    #[case("fλx.x", "f lambda (x) x")]
    #[case("λ.x", "λ.x")]
    #[case("λx y", "λx y")]
    fn shorthand_expansion(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(expand_shorthand(text), expected);
    }

    #[test]
    fn shorthand_expansion_borrows_when_untouched() {
        assert!(matches!(expand_shorthand("(lambda (x) x)"), Cow::Borrowed(_)));
    }
}
