use tracing::{debug, info};

use crate::address::Address;
use crate::builder::{parse, parse_strict};
use crate::env::Environment;
use crate::error::{NotReducible, SessionError};
use crate::format::{format, Style};
use crate::history::History;
use crate::reduce::{classify, enumerate_redexes, select_redex, step_at, Policy, Redex};
use crate::term::Term;

/// A term being reduced one user-chosen step at a time, together with the
/// definitions its free names resolve against.
///
/// Every operation is a response to one discrete event (a term typed in, a
/// redex picked, an undo); nothing runs in the background.
#[derive(Debug, Clone)]
pub struct Session {
    env: Environment,
    history: Option<History>,
    pub style: Style,
    pub policy: Policy,
    /// Report unbalanced parentheses instead of repairing them.
    pub strict: bool,
}

impl Session {
    pub fn new(env: Environment) -> Session {
        Session {
            env,
            history: None,
            style: Style::default(),
            policy: Policy::default(),
            strict: false,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    pub fn current(&self) -> Option<&Term> {
        self.history.as_ref().map(History::current)
    }

    /// Parses `text` and starts a new history with it. On error the previous
    /// history is kept as it was.
    pub fn load(&mut self, text: &str) -> Result<&Term, SessionError> {
        let term = if self.strict { parse_strict(text)? } else { parse(text)? };
        info!(term = %format(&term, Style::Named), "loaded");
        let history = self.history.insert(History::new(term));
        Ok(history.current())
    }

    /// Binds `name` to `text` in the environment.
    pub fn define(&mut self, name: &str, text: &str) -> Result<Option<Term>, SessionError> {
        Ok(self.env.define(name, text)?)
    }

    /// The reducible locations of the current term, in pre-order.
    pub fn redexes(&self) -> Result<Vec<Address>, SessionError> {
        let term = self.current().ok_or(SessionError::NoTerm)?;
        Ok(enumerate_redexes(term, &self.env))
    }

    /// What reducing `address` in the current term would do.
    pub fn describe(&self, address: &Address) -> Result<Result<Redex, NotReducible>, SessionError> {
        let term = self.current().ok_or(SessionError::NoTerm)?;
        Ok(classify(term, address, &self.env)?)
    }

    /// Reduces the current term at `address`. `Ok(None)` means there is no
    /// redex there, and the history is unchanged.
    pub fn step(&mut self, address: &Address) -> Result<Option<&Term>, SessionError> {
        let history = self.history.as_mut().ok_or(SessionError::NoTerm)?;
        match step_at(history.current(), address, &self.env)? {
            Some(next) => {
                history.push(next);
                debug!(%address, steps = history.steps(), "stepped");
                Ok(Some(history.current()))
            },
            None => Ok(None),
        }
    }

    /// Reduces the `n`-th entry of `redexes()`, counting from 1.
    pub fn step_nth(&mut self, n: usize) -> Result<Option<&Term>, SessionError> {
        let redexes = self.redexes()?;
        let address = n
            .checked_sub(1)
            .and_then(|i| redexes.get(i))
            .cloned()
            .ok_or(SessionError::NoSuchRedex { index: n, count: redexes.len() })?;
        self.step(&address)
    }

    /// Reduces the redex the session policy picks. `Ok(None)` once the
    /// current term has no redex left.
    pub fn step_auto(&mut self) -> Result<Option<&Term>, SessionError> {
        let address = match select_redex(&self.redexes()?, self.policy) {
            Some(address) => address,
            None => return Ok(None),
        };
        self.step(&address)
    }

    /// Returns to the previous term. The initial term cannot be undone.
    pub fn undo(&mut self) -> Result<Option<Term>, SessionError> {
        let history = self.history.as_mut().ok_or(SessionError::NoTerm)?;
        Ok(history.undo())
    }

    /// Returns to the term reached after `steps` reductions, forgetting
    /// everything after it.
    pub fn rewind(&mut self, steps: usize) -> Result<&Term, SessionError> {
        let history = self.history.as_mut().ok_or(SessionError::NoTerm)?;
        history.truncate(steps + 1);
        Ok(history.current())
    }

    pub fn render(&self, term: &Term) -> String {
        format(term, self.style)
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new(Environment::new())
    }
}
