use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "notekeeper")]
#[command(version, about = "A small multi-user note-taking web service")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML config file (default: ./notekeeper.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database path, overriding the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web server
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:8000
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Manage user accounts
    User(UserCommand),
}

#[derive(Args, Debug)]
pub struct UserCommand {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Create a user account
    Add {
        /// Login name
        username: String,

        /// Password (prefer --stdin to keep it out of shell history)
        #[arg(long, conflicts_with = "stdin")]
        password: Option<String>,

        /// Read the password from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// List user accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
