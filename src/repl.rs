use std::{
    env,
    borrow::Cow,
    cell::RefCell,
    fs,
    io::{self, BufRead},
    path::{Path, PathBuf},
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use anyhow::{anyhow, bail, Context as _, Result};
use rustyline::{
    At,
    Cmd,
    Context,
    Editor,
    KeyPress,
    Movement,
    Word,
    completion::{Completer, FilenameCompleter, Pair},
    error::ReadlineError,
    highlight::{Highlighter, MatchingBracketHighlighter},
    hint::Hinter,
    line_buffer::LineBuffer,
};
use rustyline_derive::Helper;
use tracing::debug;

use lambda_step::{
    env::split_definition,
    get,
    sexpr::unclosed_parens,
    Address,
    Policy,
    Session,
    SessionError,
    Style,
};

use crate::{
    cmd::{self, get_command, get_command_starts_with, Command},
    opt,
};

#[derive(Helper)]
struct RustylineHelper {
    filename_completer: FilenameCompleter, // for :load
    highlighter: MatchingBracketHighlighter,
    session: Rc<RefCell<Session>>,
}

impl Hinter for RustylineHelper {
    fn hint(&self, _line: &str, _pos:usize, _context: &Context) -> Option<String> {
        None
    }
}

// Splits what follows ':' into the command name and, after the first space,
// its argument.
fn split_command(compl_str: &str) -> (&str, Option<&str>) {
    match compl_str.find(' ') {
        Some(pos) => (&compl_str[..pos], Some(&compl_str[pos + 1..])),
        None => (compl_str, None),
    }
}

fn pairs<'a, I: IntoIterator<Item = &'a str>>(names: I, prefix: &str) -> Vec<Pair> {
    names
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .map(|s| Pair { display: s.to_string(), replacement: s.to_string(), })
        .collect()
}

impl Completer for RustylineHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, cursor_pos: usize, context: &Context)
        -> Result<(usize, Vec<Self::Candidate>), ReadlineError>
    {
        let null_completion = (0, Vec::with_capacity(0));
        if cursor_pos == 0 {
            return Ok(null_completion);
        }
        match line.chars().next() {
            None => Ok(null_completion),
            Some(':') => {
                let compl_str = &line[1..cursor_pos];
                match split_command(compl_str) {
                    (_, None) => {
                        // no space: complete the command's name.
                        match get_command_starts_with(compl_str) {
                            None => Ok(null_completion),
                            Some(class) => {
                                let compl_pair = Pair {
                                    display: class.long_name.to_string(),
                                    replacement: class.long_name.to_string(),
                                };
                                Ok((1, vec![compl_pair]))
                            },
                        }
                    },
                    (name, Some(_)) => {
                        // with space: complete the argument.
                        let word_begin = get_start_word_under_cursor(line, cursor_pos);
                        let prefix = &line[word_begin..cursor_pos];
                        match get_command(name).map(|class| class.cmd) {
                            Some(Command::Load) => {
                                self.filename_completer.complete(line, cursor_pos, context)
                            },
                            Some(Command::Style) => {
                                Ok((word_begin, pairs(Style::ALL.iter().map(Style::name), prefix)))
                            },
                            Some(Command::Policy) => {
                                Ok((word_begin, pairs(Policy::ALL.iter().map(Policy::name), prefix)))
                            },
                            _ => Ok(null_completion),
                        }
                    },
                }
            },
            Some(_) => {
                let word_begin = get_start_word_under_cursor(line, cursor_pos);
                let session = self.session.borrow();
                let completion = pairs(session.env().names(), &line[word_begin..cursor_pos]);
                Ok((word_begin, completion))
            },
        }
    }

    fn update(&self, line: &mut LineBuffer, start: usize, elected: &str) {
        self.filename_completer.update(line, start, elected)
    }
}

impl Highlighter for RustylineHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize) -> bool {
        self.highlighter.highlight_char(line, pos)
    }
}

fn make_rustyline_editor(histfile: &str, session: Rc<RefCell<Session>>) -> Editor<RustylineHelper> {
    let mut rl = Editor::<RustylineHelper>::new();

    let rustyline_helper = RustylineHelper {
        filename_completer: FilenameCompleter::new(),
        highlighter: MatchingBracketHighlighter::new(),
        session,
    };
    rl.set_helper(Some(rustyline_helper));

    if let Err(e) = rl.load_history(histfile) {
        debug!(%e, histfile, "no history loaded");
    }

    rl.bind_sequence(KeyPress::ControlRight,
                     Cmd::Move(Movement::ForwardWord(1, At::Start, Word::Vi)));
    rl.bind_sequence(KeyPress::ControlLeft,
                     Cmd::Move(Movement::BackwardWord(1, Word::Vi)));
    rl
}

fn get_histfile_path() -> String {
    let home_key = "HOME";
    let fallback = "/tmp";
    let filename = "lambda_step_hist";
    match env::var(home_key) {
        Ok(home) => format!("{}/.cache/{}", home, filename),
        Err(e) => {
            eprintln!("warning: failed to read env variable {} ({}), using fallback {}.",
                      home_key, e, fallback);
            format!("{}/{}", fallback, filename)
        },
    }
}

/// Set by Ctrl-C; checked between the steps of a run.
fn install_interrupt_flag() -> Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::SIGINT, Arc::clone(&interrupted))
        .context("failed to install the Ctrl-C handler")?;
    Ok(interrupted)
}

pub fn read_eval_print_loop(session: Session, max_steps: usize) -> Result<()> {
    let session = Rc::new(RefCell::new(session));
    let interrupted = install_interrupt_flag()?;

    let histfile = get_histfile_path();
    let mut rl = make_rustyline_editor(&histfile, Rc::clone(&session));

    loop {
        match rl.readline("> ") {
            Ok(mut line) => {
                // keep reading until the parentheses balance
                while unclosed_parens(&line) > 0 {
                    match rl.readline("& ") {
                        Ok(new_line) => {
                            line.push(' ');
                            line.push_str(&new_line);
                        },
                        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                        Err(err) => {
                            eprintln!("error: {:?}", err);
                            break;
                        },
                    };
                }
                rl.add_history_entry(line.as_str());
                let mut session = session.borrow_mut();
                interrupted.store(false, Ordering::Relaxed);
                if let Err(e) = eval_line(&mut session, &line, max_steps, &interrupted) {
                    eprintln!("error: {:#}", e);
                }
            },
            Err(ReadlineError::Interrupted) => {
                break;
            },
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("error: {:?}", err);
                break;
            },
        };
    }
    if let Err(e) = rl.save_history(&histfile) {
        eprintln!("failed to save history file: {}", e);
    };
    Ok(())
}

/// Reads definitions and expressions from `files` (stdin when empty) and
/// prints the full reduction of every expression.
pub fn run_non_interactive(session: &mut Session, files: &[PathBuf], max_steps: usize) -> Result<()> {
    let inputs = read_inputs(files)?;
    // Ctrl-C only stops a run once all input is in; before that it still
    // kills the process.
    let interrupted = install_interrupt_flag()?;
    for (label, source) in &inputs {
        eval_source(session, source.lines(), max_steps, &interrupted)
            .with_context(|| format!("in '{}'", label))?;
        if interrupted.load(Ordering::Relaxed) {
            break;
        }
    }
    Ok(())
}

// The whole text of every file, or of stdin when there are none, labelled
// for error messages.
fn read_inputs(files: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if files.is_empty() {
        let stdin = io::stdin();
        let lines = stdin
            .lock()
            .lines()
            .collect::<io::Result<Vec<String>>>()
            .context("failed to read stdin")?;
        return Ok(vec![("<stdin>".to_string(), lines.join("\n"))]);
    }
    files
        .iter()
        .map(|path| {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            Ok((path.display().to_string(), source))
        })
        .collect()
}

fn eval_source<'a, I>(session: &mut Session, lines: I, max_steps: usize, interrupted: &AtomicBool) -> Result<()>
    where I: Iterator<Item = &'a str>
{
    for (i, line) in lines.enumerate() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Some((name, text)) = split_definition(line) {
            session.define(name, text).with_context(|| format!("line {}", i + 1))?;
            continue;
        }
        let term = session.load(line).with_context(|| format!("line {}", i + 1))?.clone();
        println!("{}", session.render(&term));
        run(session, max_steps, interrupted)?;
        if interrupted.load(Ordering::Relaxed) {
            break;
        }
    }
    Ok(())
}

fn eval_line(session: &mut Session, line: &str, max_steps: usize, interrupted: &AtomicBool) -> Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    if let Some(rest) = line.strip_prefix(':') {
        return eval_command(session, rest, max_steps, interrupted);
    }
    if let Some((name, text)) = split_definition(line) {
        if session.define(name, text)?.is_some() {
            println!("{} redefined", name);
        } else {
            println!("{} defined", name);
        }
        return Ok(());
    }
    let term = session.load(line)?.clone();
    println!("  {}", session.render(&term));
    print_redexes(session)
}

fn eval_command(session: &mut Session, input: &str, max_steps: usize, interrupted: &AtomicBool) -> Result<()> {
    let (name, arg) = match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim()),
        None => (input, ""),
    };
    let class = get_command(name).ok_or_else(|| anyhow!("unknown command ':{}', try :help", name))?;
    if class.arg_expected && arg.is_empty() {
        bail!("':{}' expects an argument", class.long_name);
    }

    match class.cmd {
        Command::Help => cmd::print_usage(),
        Command::Step => {
            let stepped = if arg.is_empty() {
                session.step_auto()?.cloned()
            } else {
                let n = arg.parse::<usize>().with_context(|| format!("'{}' is not a redex number", arg))?;
                session.step_nth(n)?.cloned()
            };
            match stepped {
                Some(term) => {
                    println!("= {}", session.render(&term));
                    print_redexes(session)?;
                },
                None => println!("no redex left"),
            }
        },
        Command::At => {
            let address: Address = arg.parse()?;
            match session.step(&address)?.cloned() {
                Some(term) => {
                    println!("= {}", session.render(&term));
                    print_redexes(session)?;
                },
                None => {
                    if let Err(reason) = session.describe(&address)? {
                        println!("nothing to reduce at {}: {}", address, reason);
                    }
                },
            }
        },
        Command::Undo => match session.undo()? {
            Some(_) => {
                let current = session.current().cloned().ok_or(SessionError::NoTerm)?;
                println!("  {}", session.render(&current));
                print_redexes(session)?;
            },
            None => println!("already at the initial term"),
        },
        Command::Run => {
            let limit = if arg.is_empty() {
                max_steps
            } else {
                arg.parse::<usize>().with_context(|| format!("'{}' is not a step count", arg))?
            };
            run(session, limit, interrupted)?;
        },
        Command::History => {
            if arg.is_empty() {
                let history = session.history().ok_or(SessionError::NoTerm)?;
                for (i, term) in history.iter().enumerate() {
                    println!("{:>4}  {}", i, session.render(term));
                }
            } else {
                let steps = arg.parse::<usize>().with_context(|| format!("'{}' is not a step number", arg))?;
                let term = session.rewind(steps)?.clone();
                println!("  {}", session.render(&term));
                print_redexes(session)?;
            }
        },
        Command::Redexes => print_redexes(session)?,
        Command::Env => {
            for (name, term) in session.env().iter() {
                println!("{} = {}", name, session.render(term));
            }
        },
        Command::Load => {
            let count = opt::load_file(session, Path::new(arg))?;
            println!("{} definitions loaded", count);
        },
        Command::Style => {
            if !arg.is_empty() {
                session.style = arg.parse()?;
            }
            println!("style: {}", session.style);
        },
        Command::Policy => {
            if !arg.is_empty() {
                session.policy = arg.parse()?;
            }
            println!("policy: {}", session.policy);
        },
    }
    Ok(())
}

fn print_redexes(session: &Session) -> Result<()> {
    let term = session.current().ok_or(SessionError::NoTerm)?;
    let redexes = session.redexes()?;
    if redexes.is_empty() {
        println!("  (normal form)");
    }
    for (i, address) in redexes.iter().enumerate() {
        let what = match session.describe(address)? {
            Ok(redex) => redex.to_string(),
            Err(reason) => reason.to_string(),
        };
        println!("  [{}] {}: {}  ({})", i + 1, address, session.render(get(term, address)?), what);
    }
    Ok(())
}

// Steps by the session policy, printing every term, until no redex is left,
// `limit` steps were taken or Ctrl-C was pressed.
fn run(session: &mut Session, limit: usize, interrupted: &AtomicBool) -> Result<()> {
    let mut steps = 0;
    while steps < limit {
        if interrupted.load(Ordering::Relaxed) {
            println!("interrupted after {} steps", steps);
            return Ok(());
        }
        match session.step_auto()?.cloned() {
            Some(term) => println!("= {}", session.render(&term)),
            None => {
                println!("normal form after {} steps", steps);
                return Ok(());
            },
        }
        steps += 1;
    }
    if session.redexes()?.is_empty() {
        println!("normal form after {} steps", steps);
    } else {
        println!("stopped after {} steps", steps);
    }
    Ok(())
}

// find the beginning of the word in line which is currently under the cursor,
// whose position is cursor_pos.
//
fn get_start_word_under_cursor(line: &str, cursor_pos: usize) -> usize {
    let mut chars = line[..cursor_pos].chars();
    let mut res = cursor_pos;
    while let Some(c) = chars.next_back() {
        if c.is_whitespace() || c == '(' || c == ')' || c == '.' || c == 'λ' || c == '\\' {
            break
        }
        res -= c.len_utf8();
    };
    // if iter == None, res == 0.
    res
}
