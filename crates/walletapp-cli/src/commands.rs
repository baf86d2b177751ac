//! Command handlers. Each one calls the core clients and hands the result
//! to a view; errors bubble up to `main` for display.

use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use walletapp_core::models::{
    transaction, Amount, Budget, BudgetProgress, Credentials, NewAccount, NewBudget, NewCategory,
    NewTransaction, Registration, ReportRange, TransactionFilter,
};
use walletapp_core::{ApiError, Config, SessionContext};

use crate::views;
use crate::{AccountAction, BudgetAction, CategoryAction, ListArgs, TransactionAction};

/// Restore the stored session, failing when nobody is logged in
pub async fn require_login(ctx: &SessionContext) -> Result<()> {
    if ctx.restore().await.is_none() {
        anyhow::bail!("Not logged in. Run `wallet login` first.");
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(label).context("Failed to read password")
}

pub async fn login(ctx: &SessionContext, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username
        .or_else(|| std::env::var("WALLET_USERNAME").ok())
        .or_else(|| config.last_username.clone())
    {
        Some(name) if !name.is_empty() => name,
        _ => prompt("Username: ")?,
    };
    let password = match std::env::var("WALLET_PASSWORD") {
        Ok(password) if !password.is_empty() => password,
        _ => prompt_password("Password: ")?,
    };

    println!("\nAuthenticating...");
    let user = ctx.login(&Credentials::new(username.clone(), password)).await?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", user.display_name());
    Ok(())
}

pub async fn register(ctx: &SessionContext, username: String, email: String) -> Result<()> {
    let password = prompt_password("Password: ")?;
    let password2 = prompt_password("Confirm password: ")?;

    ctx.register(&Registration {
        username: username.clone(),
        email,
        password,
        password2,
    })
    .await?;

    println!("Account created for {}. Run `wallet login` to sign in.", username);
    Ok(())
}

pub async fn whoami(ctx: &SessionContext) -> Result<()> {
    match ctx.restore().await {
        Some(user) => println!("{}", user.display_name()),
        None => println!("Not logged in."),
    }
    Ok(())
}

pub async fn accounts(ctx: &SessionContext, action: AccountAction) -> Result<()> {
    let client = ctx.api().accounts();
    match action {
        AccountAction::List => {
            let accounts = client.get_all().await?;
            views::print_accounts(&accounts);
        }
        AccountAction::Add { name, balance } => {
            let account = client
                .create(&NewAccount {
                    name,
                    balance: Amount::new(balance),
                })
                .await?;
            println!("Created account #{} {}", account.id, account.name);
        }
        AccountAction::Rename { id, name } => {
            let current = client.get_one(id).await?;
            let account = client
                .update(
                    id,
                    &NewAccount {
                        name,
                        balance: current.balance,
                    },
                )
                .await?;
            println!("Renamed account #{} to {}", account.id, account.name);
        }
        AccountAction::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted account #{}", id);
        }
    }
    Ok(())
}

pub async fn categories(ctx: &SessionContext, action: CategoryAction) -> Result<()> {
    let client = ctx.api().categories();
    match action {
        CategoryAction::List => {
            let categories = client.get_all().await?;
            views::print_categories(&categories);
        }
        CategoryAction::Add {
            name,
            description,
            parent,
        } => {
            let category = client
                .create(&NewCategory {
                    name,
                    description,
                    parent,
                })
                .await?;
            println!("Created category #{} {}", category.id, category.name);
        }
        CategoryAction::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted category #{}", id);
        }
    }
    Ok(())
}

pub async fn transactions(ctx: &SessionContext, action: TransactionAction) -> Result<()> {
    let client = ctx.api().transactions();
    match action {
        TransactionAction::List(args) => {
            let ListArgs {
                r#type,
                account,
                category,
                from,
                to,
                page,
            } = args;
            let filter = TransactionFilter {
                account,
                category,
                kind: r#type,
                start_date: from,
                end_date: to,
            };
            let mut list = client.get_filtered(&filter).await?;
            transaction::sort_newest_first(&mut list);
            views::print_transactions(&list, page);
        }
        TransactionAction::Add {
            r#type,
            amount,
            account,
            category,
            to_account,
            date,
            description,
        } => {
            let created = client
                .create(&NewTransaction {
                    account,
                    category,
                    amount: Amount::new(amount),
                    date: date.unwrap_or_else(|| Local::now().date_naive()),
                    description,
                    kind: r#type,
                    to_account,
                })
                .await?;
            println!("Recorded transaction #{} ({})", created.id, created.signed_amount());
        }
        TransactionAction::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted transaction #{}", id);
        }
    }
    Ok(())
}

/// Load progress for every budget. A failed progress call only affects
/// its own row.
async fn budget_progress(
    ctx: &SessionContext,
    budgets: &[Budget],
) -> Vec<Result<BudgetProgress, ApiError>> {
    let client = ctx.api().budgets();
    futures::future::join_all(budgets.iter().map(|b| {
        let client = client.clone();
        let id = b.id;
        async move { client.progress(id).await }
    }))
    .await
}

pub async fn budgets(ctx: &SessionContext, action: BudgetAction) -> Result<()> {
    let client = ctx.api().budgets();
    match action {
        BudgetAction::List => {
            let budgets = client.get_all().await?;
            let progress = budget_progress(ctx, &budgets).await;
            for (budget, result) in budgets.iter().zip(&progress) {
                if let Err(e) = result {
                    debug!(budget = budget.id, error = %e, "Budget progress unavailable");
                }
                if matches!(result, Err(ApiError::SessionExpired)) {
                    return Err(ApiError::SessionExpired.into());
                }
            }
            views::print_budgets(&budgets, &progress);
        }
        BudgetAction::Add {
            category,
            limit,
            start,
            end,
            threshold,
        } => {
            let budget = client
                .create(&NewBudget {
                    category,
                    limit: Amount::new(limit),
                    start_date: start,
                    end_date: end,
                    notification_threshold: threshold.map(Amount::new),
                })
                .await?;
            println!("Created budget #{} for {}", budget.id, budget.name());
        }
        BudgetAction::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted budget #{}", id);
        }
    }
    Ok(())
}

pub async fn report(ctx: &SessionContext, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let range = ReportRange::new(from, to)?;
    let report = ctx.api().transactions().report(&range).await?;
    views::print_report(&range, &report);
    Ok(())
}

pub async fn visualize(ctx: &SessionContext) -> Result<()> {
    let data = ctx
        .api()
        .transactions()
        .visualization_data(&TransactionFilter::default())
        .await?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Fetch accounts, transactions and budgets concurrently; any failure
/// aborts the whole dashboard.
pub async fn dashboard(ctx: &SessionContext) -> Result<()> {
    let api = ctx.api();
    let (accounts_api, transactions_api, budgets_api) =
        (api.accounts(), api.transactions(), api.budgets());
    let (accounts, mut transactions, budgets) = futures::try_join!(
        accounts_api.get_all(),
        transactions_api.get_all(),
        budgets_api.get_all(),
    )
    .map_err(|e| match e {
        ApiError::SessionExpired => e.into(),
        other => {
            warn!(error = %other, "Dashboard fetch failed");
            anyhow::anyhow!("Failed to load dashboard data. Please try again later.")
        }
    })?;

    let progress = budget_progress(ctx, &budgets).await;
    transaction::sort_newest_first(&mut transactions);
    views::print_dashboard(&accounts, &transactions, &budgets, &progress);
    Ok(())
}
