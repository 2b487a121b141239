use crate::term::Term;

/// The terms a reduction session went through, oldest first. Never empty:
/// the initial term cannot be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    terms: Vec<Term>,
}

impl History {
    pub fn new(initial: Term) -> History {
        History { terms: vec![initial] }
    }

    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    pub fn current(&self) -> &Term {
        // `terms` always holds the initial term
        &self.terms[self.terms.len() - 1]
    }

    pub fn initial(&self) -> &Term {
        &self.terms[0]
    }

    pub fn get(&self, i: usize) -> Option<&Term> {
        self.terms.get(i)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Number of reductions recorded, i.e. `len() - 1`.
    pub fn steps(&self) -> usize {
        self.terms.len() - 1
    }

    /// Drops the latest term, unless it is the initial one.
    pub fn undo(&mut self) -> Option<Term> {
        if self.terms.len() > 1 {
            self.terms.pop()
        } else {
            None
        }
    }

    /// Goes back to the first `len` terms. A `len` of zero keeps the
    /// initial term; one past the end changes nothing.
    pub fn truncate(&mut self, len: usize) {
        self.terms.truncate(len.max(1));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Term {
        Term::free_var(name)
    }

    #[test]
    fn push_and_current() {
        let mut history = History::new(var("a"));
        assert_eq!(history.current(), &var("a"));
        history.push(var("b"));
        history.push(var("c"));
        assert_eq!(history.current(), &var("c"));
        assert_eq!(history.initial(), &var("a"));
        assert_eq!(history.get(1), Some(&var("b")));
        assert_eq!(history.get(3), None);
        assert_eq!(history.len(), 3);
        assert_eq!(history.steps(), 2);
    }

    #[test]
    fn undo_stops_at_the_initial_term() {
        let mut history = History::new(var("a"));
        history.push(var("b"));
        assert_eq!(history.undo(), Some(var("b")));
        assert_eq!(history.undo(), None);
        assert_eq!(history.current(), &var("a"));
    }

    #[test]
    fn truncate_drops_the_suffix() {
        let mut history = History::new(var("a"));
        for name in &["b", "c", "d"] {
            history.push(var(name));
        }
        history.truncate(2);
        assert_eq!(history.iter().cloned().collect::<Vec<_>>(), vec![var("a"), var("b")]);
        history.truncate(10);
        assert_eq!(history.len(), 2);
        history.truncate(0);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![&var("a")]);
    }
}
