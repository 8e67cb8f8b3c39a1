//! Secure Bank CLI - your bank account in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use securebank_core::{Error, FeedFilter};

mod commands;
mod output;

use commands::{account, auth, biometrics, feed, logs, profile, status};

/// Secure Bank - your bank account in the terminal
#[derive(Parser)]
#[command(name = "sb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        /// Full name
        #[arg(long)]
        name: Option<String>,
        /// CPF formatted as 000.000.000-00
        #[arg(long)]
        cpf: Option<String>,
        /// Alias used to log in and receive transfers
        #[arg(long)]
        alias: Option<String>,
    },

    /// Log in with alias and secret (SECUREBANK_SECRET skips the prompt)
    Login {
        #[arg(long, short)]
        alias: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log in with biometrics, falling back to the secret
    Unlock {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// End the session (saved alias and secret are kept)
    Logout,

    /// Remove saved credentials from this machine
    Forget {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Manage biometric unlock
    Biometrics {
        #[command(subcommand)]
        command: biometrics::BiometricsCommands,
    },

    /// Show saved credentials, session and settings
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the account balance
    Balance {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send money to another alias
    Send {
        /// Destination alias
        to: String,
        /// Amount, e.g. 150 or 150,50
        amount: String,
        #[arg(long, short)]
        description: Option<String>,
        /// One of the transfer categories (prompted when omitted)
        #[arg(long, short)]
        category: Option<String>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show your profile and biometric login setting
    Profile {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the alias others use to send you money
    Receive {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions
    #[command(args_conflicts_with_subcommands = true)]
    Transactions {
        #[command(subcommand)]
        command: Option<TransactionsCommands>,
        /// all, incoming or outgoing
        #[arg(long, short, default_value = "all")]
        filter: FeedFilter,
        /// Search descriptions and counterparties
        #[arg(long, short)]
        search: Option<String>,
        /// Number of pages to load
        #[arg(long, default_value = "1", conflicts_with = "all")]
        pages: u32,
        /// Load every page
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Balance and recent transactions
    Dashboard {
        /// Number of recent transactions to show
        #[arg(long, short, default_value = "5")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

#[derive(Subcommand)]
enum TransactionsCommands {
    /// Show one transaction in detail
    Show {
        /// Transaction id from the listing
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            output::error(&format!("Failed to start runtime: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            if let Some(Error::AuthRejected(_)) = e.downcast_ref::<Error>() {
                output::info("Run 'sb login' or 'sb unlock' to start a new session.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register { name, cpf, alias } => auth::register(name, cpf, alias).await,
        Commands::Login { alias, json } => auth::login(alias, json).await,
        Commands::Unlock { json } => auth::unlock(json).await,
        Commands::Logout => auth::logout().await,
        Commands::Forget { force } => auth::forget(force).await,
        Commands::Biometrics { command } => biometrics::run(command).await,
        Commands::Status { json } => status::run(json).await,
        Commands::Balance { json } => account::balance(json).await,
        Commands::Send { to, amount, description, category, yes, json } => {
            account::send(to, amount, description, category, yes, json).await
        }
        Commands::Profile { json } => profile::profile(json).await,
        Commands::Receive { json } => profile::receive(json).await,
        Commands::Transactions { command: Some(TransactionsCommands::Show { id, json }), .. } => {
            feed::show(id, json).await
        }
        Commands::Transactions { command: None, filter, search, pages, all, json } => {
            feed::transactions(filter, search, pages, all, json).await
        }
        Commands::Dashboard { limit, json } => feed::dashboard(limit, json).await,
        Commands::Logs { command } => logs::run(command),
    }
}
