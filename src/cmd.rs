/// Commands understood by the prompt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Step,
    At,
    Undo,
    Run,
    History,
    Redexes,
    Env,
    Load,
    Style,
    Policy,
}

pub struct CommandClassifier<'a> {
    pub short_name: &'a str,
    pub long_name: &'a str,
    pub cmd: Command,
    pub arg_expected: bool,
    usage: &'a str,
    description: &'a str,
}

pub const COMMAND_CLASSIFIER : &[CommandClassifier] = &[
    CommandClassifier {
        short_name: "h",
        long_name: "help",
        cmd: Command::Help,
        arg_expected: false,
        usage: "",
        description: "print this message.",
    },
    CommandClassifier {
        short_name: "s",
        long_name: "step",
        cmd: Command::Step,
        arg_expected: false,
        usage: "[n]",
        description: "reduce redex number n, or the one the policy picks.",
    },
    CommandClassifier {
        short_name: "a",
        long_name: "at",
        cmd: Command::At,
        arg_expected: true,
        usage: "<address>",
        description: "reduce at an address such as func-side/body (root for the whole term).",
    },
    CommandClassifier {
        short_name: "u",
        long_name: "undo",
        cmd: Command::Undo,
        arg_expected: false,
        usage: "",
        description: "go back to the previous term.",
    },
    CommandClassifier {
        short_name: "r",
        long_name: "run",
        cmd: Command::Run,
        arg_expected: false,
        usage: "[limit]",
        description: "step by the policy until no redex is left; Ctrl-C stops.",
    },
    CommandClassifier {
        short_name: "hist",
        long_name: "history",
        cmd: Command::History,
        arg_expected: false,
        usage: "[n]",
        description: "list the terms so far, or go back to step n.",
    },
    CommandClassifier {
        short_name: "x",
        long_name: "redexes",
        cmd: Command::Redexes,
        arg_expected: false,
        usage: "",
        description: "list the redexes of the current term.",
    },
    CommandClassifier {
        short_name: "e",
        long_name: "env",
        cmd: Command::Env,
        arg_expected: false,
        usage: "",
        description: "list the definitions.",
    },
    CommandClassifier {
        short_name: "l",
        long_name: "load",
        cmd: Command::Load,
        arg_expected: true,
        usage: "<file>",
        description: "add the definitions of a file.",
    },
    CommandClassifier {
        short_name: "style",
        long_name: "style",
        cmd: Command::Style,
        arg_expected: false,
        usage: "[named|debruijn|compact]",
        description: "show or set how terms are printed.",
    },
    CommandClassifier {
        short_name: "policy",
        long_name: "policy",
        cmd: Command::Policy,
        arg_expected: false,
        usage: "[lo|li|ro|ri]",
        description: "show or set the redex :step and :run pick.",
    },
];

pub fn print_usage() {
    println!(
"A click-to-reduce lambda calculus stepper.

Type an expression to start reducing it, e.g. `(lambda (x) x) y` or `λx.x y`.
`name = expr` (or `name := expr`) adds a definition.

Available commands:"
    );
    for command in COMMAND_CLASSIFIER {
        let names = if command.short_name == command.long_name {
            format!(":{} {}", command.long_name, command.usage)
        } else {
            format!(":{}, :{} {}", command.short_name, command.long_name, command.usage)
        };
        println!("{:<32}{}", names.trim_end(), command.description);
    }
}

/// The entry whose short or long name is `name`.
pub fn get_command(name: &str) -> Option<&'static CommandClassifier<'static>> {
    COMMAND_CLASSIFIER
        .iter()
        .find(|class| name == class.short_name || name == class.long_name)
}

/// The first entry whose long name starts with `prefix`.
pub fn get_command_starts_with(prefix: &str) -> Option<&'static CommandClassifier<'static>> {
    COMMAND_CLASSIFIER.iter().find(|class| class.long_name.starts_with(prefix))
}
