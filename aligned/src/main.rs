use clap::Parser;
use std::process;

mod commands;
mod handlers;
mod output;

use commands::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(err) = handlers::handle_command(cli.command) {
        output::print_error(&err.to_string());
        process::exit(1);
    }
}
