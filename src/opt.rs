use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lambda_step::{Environment, Policy, Session, Style};

/// Reduce untyped lambda terms one chosen step at a time.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opt {
    /// Definition files to load (one `name = expr` per line). With
    /// --no-interactive, files of expressions to reduce instead.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Start without the standard definitions (I, K, S, TRUE, PLUS, ...)
    #[arg(long)]
    pub no_prelude: bool,

    /// How terms are printed: named, debruijn or compact
    #[arg(long, default_value_t = Style::Named)]
    pub style: Style,

    /// Redex picked by :step and :run: lo (normal order), li (applicative
    /// order), ro or ri
    #[arg(long, default_value_t = Policy::NORMAL_ORDER)]
    pub policy: Policy,

    /// Reject unbalanced parentheses instead of closing them
    #[arg(long)]
    pub strict: bool,

    /// Leave numerals above N unexpanded (default: expand all)
    #[arg(long, value_name = "N")]
    pub max_numeral: Option<u64>,

    /// Give up a :run (or a non-interactive reduction) after this many steps
    #[arg(long, default_value_t = 1000)]
    pub max_steps: usize,

    /// Read input from the given files, or stdin, and print every reduction
    /// step without prompting
    #[arg(short = 'n', long)]
    pub no_interactive: bool,
}

impl Opt {
    /// A session configured from the command line, with the prelude loaded
    /// unless disabled.
    pub fn session(&self) -> Result<Session> {
        let env = if self.no_prelude {
            Environment::new()
        } else {
            Environment::prelude().context("failed to load the prelude")?
        };
        let mut session = Session::new(env);
        session.env_mut().set_numeral_limit(self.max_numeral);
        session.style = self.style;
        session.policy = self.policy;
        session.strict = self.strict;
        Ok(session)
    }
}

/// Adds the definitions of `path` to the session environment.
pub fn load_file(session: &mut Session, path: &Path) -> Result<usize> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let defs = Environment::from_source(&source)
        .with_context(|| format!("failed to load '{}'", path.display()))?;
    let count = defs.len();
    session.env_mut().extend(defs);
    info!(path = %path.display(), count, "definitions loaded");
    Ok(count)
}
