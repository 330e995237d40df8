//! CLI module for the auth service
//!
//! Provides subcommands for running the server, applying migrations,
//! generating a signing secret and talking to a running server.

pub mod client;
pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// PMP Auth Service - username/password signup, login and profile
#[derive(Parser)]
#[command(name = "pmp-auth-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Apply pending Postgres migrations
    Migrate,

    /// Print a random base64url signing secret
    GenerateSecret {
        /// Number of random bytes
        #[arg(long, default_value_t = 32)]
        bytes: usize,
    },

    /// Call a running server
    Client(client::ClientArgs),
}
