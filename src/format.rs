use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use crate::sexpr::is_shorthand_name_char;
use crate::term::{scope_index, Term};

/// Surface notations a term can be rendered in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Style {
    /// Named variables, every application parenthesized: `λx.(x y)`.
    #[default]
    Named,
    /// Bound variables as their distance to the binder: `λ.(1 y)`.
    DeBruijn,
    /// Named variables with the fewest parentheses: `λx.x y`.
    Compact,
}

impl Style {
    pub const ALL: [Style; 3] = [Style::Named, Style::DeBruijn, Style::Compact];

    pub const fn name(&self) -> &'static str {
        match self {
            Style::Named => "named",
            Style::DeBruijn => "debruijn",
            Style::Compact => "compact",
        }
    }
}

impl Display for Style {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown style `{0}` (expected named, debruijn or compact)")]
pub struct UnknownStyle(String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Style, UnknownStyle> {
        Style::ALL
            .iter()
            .copied()
            .find(|style| style.name() == s)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

/// Renders `term` in `style`. Never modifies the term.
///
/// ```
/// # use lambda_step::{format, parse, Style};
/// let k = parse("(lambda (x y) x)").unwrap();
/// assert_eq!(format(&k, Style::Named), "λx.λy.x");
/// assert_eq!(format(&k, Style::DeBruijn), "λ.λ.2");
/// ```
pub fn format(term: &Term, style: Style) -> String {
    Formatted { term, style }.to_string()
}

/// A term paired with the style to display it in.
pub struct Formatted<'a> {
    pub term: &'a Term,
    pub style: Style,
}

impl Display for Formatted<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.style {
            Style::Named => fmt_named(self.term, f, false),
            Style::DeBruijn => fmt_debruijn(self.term, f, &mut Vec::new(), false),
            Style::Compact => fmt_compact(self.term, f, Position::TOP),
        }
    }
}

// Parameters the `λx.` shorthand can read back; anything else is written
// with the explicit `lambda` form.
fn shorthand_safe(param: &str) -> bool {
    !param.is_empty() && param.chars().all(is_shorthand_name_char)
}

fn fmt_named(term: &Term, f: &mut Formatter, in_func_pos: bool) -> fmt::Result {
    match term {
        Term::Var { name, .. } => write!(f, "{}", name),
        Term::Abs { param, body } => {
            if !shorthand_safe(param) {
                write!(f, "(lambda ({}) ", param)?;
                fmt_named(body, f, false)?;
                return write!(f, ")");
            }
            if in_func_pos {
                write!(f, "(")?;
            }
            write!(f, "λ{}.", param)?;
            fmt_named(body, f, false)?;
            if in_func_pos {
                write!(f, ")")?;
            }
            Ok(())
        },
        Term::App { func, arg } => {
            write!(f, "(")?;
            fmt_named(func, f, true)?;
            write!(f, " ")?;
            fmt_named(arg, f, false)?;
            write!(f, ")")
        },
    }
}

fn fmt_debruijn<'a>(
    term: &'a Term,
    f: &mut Formatter,
    lambda_vars: &mut Vec<&'a str>,
    in_func_pos: bool,
) -> fmt::Result {
    match term {
        Term::Var { name, .. } => match scope_index(lambda_vars.iter().copied(), name) {
            0 => write!(f, "{}", name),
            index => write!(f, "{}", index),
        },
        Term::Abs { param, body } => {
            if in_func_pos {
                write!(f, "(")?;
            }
            write!(f, "λ.")?;
            lambda_vars.push(param);
            let res = fmt_debruijn(body, f, lambda_vars, false);
            lambda_vars.pop();
            res?;
            if in_func_pos {
                write!(f, ")")?;
            }
            Ok(())
        },
        Term::App { func, arg } => {
            write!(f, "(")?;
            fmt_debruijn(func, f, lambda_vars, true)?;
            write!(f, " ")?;
            fmt_debruijn(arg, f, lambda_vars, false)?;
            write!(f, ")")
        },
    }
}

// Where a subterm sits in compact output.
#[derive(Copy, Clone)]
struct Position {
    func: bool,
    arg: bool,
    // nothing is printed after this subterm before the enclosing ')' or the
    // end of the text, so a lambda body can stretch without parens.
    right_edge: bool,
}

impl Position {
    const TOP: Position = Position { func: false, arg: false, right_edge: true };
}

fn fmt_compact(term: &Term, f: &mut Formatter, pos: Position) -> fmt::Result {
    match term {
        Term::Var { name, .. } => write!(f, "{}", name),
        Term::Abs { param, body } => {
            if !shorthand_safe(param) {
                write!(f, "(lambda ({}) ", param)?;
                fmt_compact(body, f, Position::TOP)?;
                return write!(f, ")");
            }
            let paren_needed = pos.func || !pos.right_edge;
            if paren_needed {
                write!(f, "(")?;
            }
            write!(f, "λ{}.", param)?;
            fmt_compact(body, f, Position::TOP)?;
            if paren_needed {
                write!(f, ")")?;
            }
            Ok(())
        },
        Term::App { func, arg } => {
            let paren_needed = pos.arg;
            if paren_needed {
                write!(f, "(")?;
            }
            fmt_compact(func, f, Position { func: true, arg: false, right_edge: false })?;
            write!(f, " ")?;
            let right_edge = paren_needed || pos.right_edge;
            fmt_compact(arg, f, Position { func: false, arg: true, right_edge })?;
            if paren_needed {
                write!(f, ")")?;
            }
            Ok(())
        },
    }
}
