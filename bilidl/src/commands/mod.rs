mod download;
mod info;
mod login;

pub use download::Download;
pub use info::Info;
pub use login::Login;

use clap::{Parser, Subcommand};

/// Download bilibili videos from the terminal.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Download(Download),
    Info(Info),
    Login(Login),
}
