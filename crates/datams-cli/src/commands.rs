use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "datams")]
#[command(about = "Data management for oceanographic deployments", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Drop and recreate every table
    InitDb,
    /// Drop every table
    WipeDb,
    /// Re-link file records whose stored path no longer exists
    ResolveFiles,
    /// Create a login account
    CreateUser {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        email: Option<String>,
        /// Grant the administrator role
        #[arg(long)]
        admin: bool,
    },
    /// Delete a login account
    DeleteUser { username: String },
    /// Print configuration values
    PrintConfig,
}
