//! Glamdesk CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! glamdesk-cli migrate
//!
//! # Generate a field encryption key for ENCRYPTION_KEY
//! glamdesk-cli keygen
//!
//! # Hash a password (after checking it against the password policy)
//! glamdesk-cli hash-password 'Abc12345!'
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "glamdesk-cli")]
#[command(author, version, about = "Glamdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Print a new random 32-byte encryption key as 64 hex characters
    Keygen,
    /// Print an Argon2id hash of a password
    HashPassword {
        /// Password to hash; must satisfy the password policy
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Keygen => println!("{}", commands::keys::generate_encryption_key()),
        Commands::HashPassword { password } => {
            println!("{}", commands::keys::hash_password(&password)?);
        }
    }
    Ok(())
}
