//! CLI interface for Gatehouse

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Username/password authentication with session guards", long_about = None)]
pub struct Cli {
    /// Path to gatehouse.toml (defaults to searching upward from the current directory)
    #[arg(short, long, global = true, env = "GATEHOUSE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default gatehouse.toml configuration file
    Init,

    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the credential and session tables if they do not exist
    Migrate,

    /// Register a user from the terminal
    AddUser {
        /// Username for the new account
        username: String,
    },
}
