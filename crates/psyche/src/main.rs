mod cli;
mod paths;
mod run;
mod settings;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Shader) => run::print_shader(&cli.run),
        Some(Command::Check) => run::check(&cli.run),
        Some(Command::Snapshot(args)) => run::snapshot(&cli.run, &args),
        None => run::run(&cli.run),
    }
}
