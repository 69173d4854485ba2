use clap::Parser;
use contrarian::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
