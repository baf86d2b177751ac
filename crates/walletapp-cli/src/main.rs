//! Wallet CLI - a terminal client for the wallet backend.
//!
//! Log in once, then list and record accounts, categories, transactions
//! and budgets from the command line. Tokens are kept between runs and
//! renewed automatically.

mod commands;
mod views;

use std::io;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use walletapp_core::models::TransactionType;
use walletapp_core::{ApiClient, ApiError, Config, SessionContext, TokenStore};

/// Personal finance tracking from the terminal.
#[derive(Parser, Debug)]
#[command(name = "wallet", version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides config and WALLET_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Keep tokens in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Also write logs to a daily rolling file in the data directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the token pair
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create a new user (does not log in)
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
    },
    /// Forget stored tokens
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Account balances
    Accounts {
        #[command(subcommand)]
        action: Option<AccountAction>,
    },
    /// Spending categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoryAction>,
    },
    /// Income, expenses and transfers
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionAction>,
    },
    /// Budgets and their progress
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },
    /// Aggregate report for a date range
    Report {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Chart-ready series from the backend
    Visualize,
    /// Accounts, recent transactions and budgets at a glance
    Dashboard,
}

#[derive(Subcommand, Debug)]
enum AccountAction {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0.0)]
        balance: f64,
    },
    Rename {
        id: i64,
        #[arg(long)]
        name: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryAction {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Parent category id, for subcategories
        #[arg(long)]
        parent: Option<i64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    #[arg(long, value_name = "IN|OUT|TRANSFER")]
    r#type: Option<TransactionType>,
    #[arg(long)]
    account: Option<i64>,
    #[arg(long)]
    category: Option<i64>,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[derive(Subcommand, Debug)]
enum TransactionAction {
    List(ListArgs),
    Add {
        #[arg(long, value_name = "IN|OUT|TRANSFER")]
        r#type: TransactionType,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        account: i64,
        #[arg(long)]
        category: Option<i64>,
        /// Destination account, required for transfers
        #[arg(long)]
        to_account: Option<i64>,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum BudgetAction {
    List,
    Add {
        #[arg(long)]
        category: i64,
        #[arg(long)]
        limit: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Percentage at which the budget is flagged
        #[arg(long)]
        threshold: Option<f64>,
    },
    Delete {
        id: i64,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: bool) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file.then(Config::data_dir) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(dir, "wallet.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file);
    info!("Wallet CLI starting");

    run(cli).await.map_err(user_facing)
}

/// Replace API errors with the message shown to the user
fn user_facing(e: anyhow::Error) -> anyhow::Error {
    match e.downcast::<ApiError>() {
        Ok(api_error) if api_error.is_auth_failure() => anyhow::anyhow!(
            "{}\nRun `wallet login` to sign in again.",
            api_error.user_message()
        ),
        Ok(api_error) => anyhow::anyhow!(api_error.user_message()),
        Err(other) => other,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let api = if cli.ephemeral {
        let transport = walletapp_core::api::ReqwestTransport::new(
            &config.api_base_url,
            config.request_timeout_secs,
        )?;
        ApiClient::with_transport(std::sync::Arc::new(transport), TokenStore::in_memory())
    } else {
        ApiClient::new(&config)?
    };
    let ctx = SessionContext::new(api);

    match cli.command {
        Command::Login { username } => commands::login(&ctx, &mut config, username).await,
        Command::Register { username, email } => commands::register(&ctx, username, email).await,
        Command::Logout => {
            ctx.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => commands::whoami(&ctx).await,
        Command::Accounts { action } => {
            commands::require_login(&ctx).await?;
            commands::accounts(&ctx, action.unwrap_or(AccountAction::List)).await
        }
        Command::Categories { action } => {
            commands::require_login(&ctx).await?;
            commands::categories(&ctx, action.unwrap_or(CategoryAction::List)).await
        }
        Command::Transactions { action } => {
            commands::require_login(&ctx).await?;
            let action = action.unwrap_or_else(|| TransactionAction::List(ListArgs {
                page: 1,
                ..Default::default()
            }));
            commands::transactions(&ctx, action).await
        }
        Command::Budgets { action } => {
            commands::require_login(&ctx).await?;
            commands::budgets(&ctx, action.unwrap_or(BudgetAction::List)).await
        }
        Command::Report { from, to } => {
            commands::require_login(&ctx).await?;
            commands::report(&ctx, from, to).await
        }
        Command::Visualize => {
            commands::require_login(&ctx).await?;
            commands::visualize(&ctx).await
        }
        Command::Dashboard => {
            commands::require_login(&ctx).await?;
            commands::dashboard(&ctx).await
        }
    }
}
