mod cmd;
mod opt;
mod repl;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use opt::Opt;

fn main() -> Result<()> {
    // Log to stderr (if you run with `RUST_LOG=debug`), away from the terms.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Opt::parse();
    let mut session = args.session()?;

    if args.no_interactive {
        // never start interactive prompt when -n is used
        return repl::run_non_interactive(&mut session, &args.files, args.max_steps);
    }
    for path in &args.files {
        opt::load_file(&mut session, path)?;
    }
    repl::read_eval_print_loop(session, args.max_steps)
}
