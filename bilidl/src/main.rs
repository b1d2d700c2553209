mod commands;
mod downloader;
mod logger;
mod output;
mod selector;

use clap::Parser;
use commands::{Args, Commands};
use kdam::{term, term::Colorizer};
use requestty::symbols;
use std::{
    io::{IsTerminal, stderr},
    process,
};

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(args.verbose)?;
    term::init(stderr().is_terminal());

    match args.command {
        Commands::Download(args) => args.execute()?,
        Commands::Info(args) => args.execute()?,
        Commands::Login(args) => args.execute()?,
    }

    Ok(())
}

fn main() {
    let mut symbols = symbols::UNICODE;
    symbols.completed = '•';
    symbols.cross = 'x';
    symbols::set(symbols);

    if let Err(e) = run() {
        eprintln!("{}: {}", "error".colorize("bold red"), e);
        process::exit(1);
    }
}
