//! Bình Vương CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bv-cli migrate
//!
//! # Seed the default accounts and customer
//! bv-cli seed --defaults
//!
//! # Seed users, customers and models from a YAML file
//! bv-cli seed data/seed.yaml
//!
//! # Create a user
//! bv-cli user create -u kho -n "Thủ Kho" -r prod
//!
//! # Print every customer's balance and overdue notes
//! bv-cli debt report
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed accounts and master data
//! - `user create` - Create a user
//! - `debt report` - Receivables and aging per customer

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use binh_vuong_core::types::UserRole;

mod commands;

#[derive(Parser)]
#[command(name = "bv-cli")]
#[command(author, version, about = "Bình Vương ERP CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed accounts, customers and models
    Seed {
        /// YAML seed file
        file: Option<String>,

        /// Also seed the default accounts and sample customer
        #[arg(long)]
        defaults: bool,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Customer receivables
    Debt {
        #[command(subcommand)]
        action: DebtAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin`, `tech`, `prod`, `viewer`)
        #[arg(short, long, default_value = "prod")]
        role: UserRole,

        /// Password; defaults to `ADMIN_SEED_PASSWORD`
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum DebtAction {
    /// Print balances and aging for every customer
    Report,
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

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, defaults } => {
            commands::seed::run(file.as_deref(), defaults).await?;
        }
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                name,
                role,
                password,
            } => {
                commands::users::create_user(&username, &name, role, password).await?;
            }
        },
        Commands::Debt { action } => match action {
            DebtAction::Report => commands::debt::report().await?,
        },
    }
    Ok(())
}
