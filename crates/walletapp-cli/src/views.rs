//! Plain-text rendering of lists, budget cards and reports.

use walletapp_core::models::{
    account, category, daily_flows, Account, Budget, BudgetProgress, Category, ReportRange,
    Transaction, TransactionReport,
};
use walletapp_core::utils::{format_currency, format_date, format_percent, progress_bar, truncate_string};
use walletapp_core::ApiError;

/// Rows per page in transaction lists
pub const PAGE_SIZE: usize = 20;

/// Rows of recent activity on the dashboard
const DASHBOARD_RECENT: usize = 5;

/// Width of the text progress bar on budget cards
const BAR_WIDTH: usize = 20;

/// Slice out page `page` (1-based) and report the total page count
pub fn paginate<T>(items: &[T], page: usize) -> (&[T], usize) {
    let pages = items.len().div_ceil(PAGE_SIZE).max(1);
    let page = page.clamp(1, pages);
    let start = ((page - 1) * PAGE_SIZE).min(items.len());
    let end = (start + PAGE_SIZE).min(items.len());
    (&items[start..end], pages)
}

pub fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts found.");
        return;
    }
    println!("{:>5}  {:<30} {:>16}", "ID", "Name", "Balance");
    for a in accounts {
        println!(
            "{:>5}  {:<30} {:>16}",
            a.id,
            truncate_string(&a.name, 30),
            format_currency(a.display_balance())
        );
    }
    println!("{:>5}  {:<30} {:>16}", "", "Total", format_currency(account::total_balance(accounts)));
}

pub fn print_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }
    for line in category_lines(categories) {
        println!("{}", line);
    }
}

/// One row per category, indented by depth in the hierarchy
fn category_lines(categories: &[Category]) -> Vec<String> {
    category::tree(categories)
        .into_iter()
        .map(|(c, depth)| {
            let name = format!("{}{}", "  ".repeat(depth), c.name);
            format!(
                "{:>5}  {:<32} {:>16}  {}",
                c.id,
                truncate_string(&name, 32),
                format_currency(c.total_spending),
                truncate_string(&c.description, 30)
            )
        })
        .collect()
}

fn print_transaction_rows(transactions: &[Transaction]) {
    println!(
        "{:>5}  {:<13} {:<28} {:<16} {:>16}",
        "ID", "Date", "Description", "Category", "Amount"
    );
    for t in transactions {
        println!(
            "{:>5}  {:<13} {:<28} {:<16} {:>16}",
            t.id,
            format_date(t.date),
            truncate_string(&t.description, 28),
            truncate_string(&t.category_display(), 16),
            format!("{} RWF", t.signed_amount())
        );
    }
}

pub fn print_transactions(transactions: &[Transaction], page: usize) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }
    let (rows, pages) = paginate(transactions, page);
    print_transaction_rows(rows);
    println!("Page {} of {} ({} transactions)", page.clamp(1, pages), pages, transactions.len());
}

/// Budget card: name, period, bar and spent/limit
pub fn render_budget(budget: &Budget, progress: &Result<BudgetProgress, ApiError>) -> String {
    let header = format!(
        "{}  ({} - {})",
        budget.name(),
        format_date(budget.start_date),
        format_date(budget.end_date)
    );
    match progress {
        Ok(p) => {
            let percent = budget.percentage(p.total_spent);
            let flag = if budget.is_exceeded(p.total_spent) {
                "  EXCEEDED"
            } else if budget.is_over_threshold(p.total_spent) {
                "  near limit"
            } else {
                ""
            };
            format!(
                "{}\n  {} {:>4}  {} / {}{}",
                header,
                progress_bar(percent, BAR_WIDTH),
                format_percent(percent),
                format_currency(p.total_spent),
                format_currency(budget.limit),
                flag
            )
        }
        Err(_) => format!("{}\n  progress unavailable", header),
    }
}

pub fn print_budgets(budgets: &[Budget], progress: &[Result<BudgetProgress, ApiError>]) {
    if budgets.is_empty() {
        println!("No budgets found.");
        return;
    }
    for (budget, p) in budgets.iter().zip(progress) {
        println!("#{} {}", budget.id, render_budget(budget, p));
    }
}

pub fn print_report(range: &ReportRange, report: &TransactionReport) {
    println!(
        "Report {} - {}",
        format_date(range.start_date),
        format_date(range.end_date)
    );

    println!("\nSummary");
    for (label, value) in report.summary_rows() {
        println!("  {:<24} {:>16}", label, format_currency(value));
    }

    if !report.by_category.is_empty() {
        println!("\nBy category");
        for item in &report.by_category {
            println!(
                "  {:<24} {:>16} {:>6}",
                item.category_name.as_deref().unwrap_or("Uncategorized"),
                format_currency(item.total),
                item.count.map(|c| c.to_string()).unwrap_or_default()
            );
        }
    }

    if !report.by_account.is_empty() {
        println!("\nBy account");
        for item in &report.by_account {
            println!(
                "  {:<24} {:>16}",
                item.account_name.as_deref().unwrap_or("-"),
                format_currency(item.total)
            );
        }
    }

    if !report.daily_totals.is_empty() {
        println!("\nDaily totals");
        for day in &report.daily_totals {
            println!("  {:<24} {:>16}", format_date(day.day), format_currency(day.total));
        }
    }
}

pub fn print_dashboard(
    accounts: &[Account],
    transactions: &[Transaction],
    budgets: &[Budget],
    progress: &[Result<BudgetProgress, ApiError>],
) {
    println!("== Accounts ==");
    print_accounts(accounts);

    println!("\n== Income vs expenses ==");
    let flows = daily_flows(transactions);
    if flows.is_empty() {
        println!("No activity yet.");
    }
    for flow in flows.iter().rev().take(7).rev() {
        println!(
            "  {:<13} +{:>12}  -{:>12}",
            format_date(flow.date),
            flow.income.to_string(),
            flow.expense.to_string()
        );
    }

    println!("\n== Recent transactions ==");
    if transactions.is_empty() {
        println!("No transactions found.");
    } else {
        let recent = &transactions[..transactions.len().min(DASHBOARD_RECENT)];
        print_transaction_rows(recent);
    }

    println!("\n== Budgets ==");
    print_budgets(budgets, progress);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let items: Vec<usize> = (0..45).collect();
        let (first, pages) = paginate(&items, 1);
        assert_eq!(pages, 3);
        assert_eq!(first.len(), PAGE_SIZE);
        let (last, _) = paginate(&items, 3);
        assert_eq!(last, &[40, 41, 42, 43, 44]);
        // out-of-range pages clamp
        let (clamped, _) = paginate(&items, 99);
        assert_eq!(clamped, last);
        let empty: Vec<usize> = Vec::new();
        assert_eq!(paginate(&empty, 1), (&empty[..], 1));
    }

    #[test]
    fn test_category_lines_show_nested_levels() {
        let categories: Vec<Category> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Food"},
                {"id": 2, "name": "Groceries", "parent": 1},
                {"id": 3, "name": "Organic", "parent": 2}
            ]"#,
        )
        .unwrap();
        let lines = category_lines(&categories);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("    1  Food"));
        assert!(lines[1].starts_with("    2    Groceries"));
        assert!(lines[2].starts_with("    3      Organic"));
    }

    #[test]
    fn test_budget_card_shows_percentage() {
        let budget: Budget = serde_json::from_str(
            r#"{"id": 1, "category": 2, "category_name": "Food", "limit": "100.00",
                "start_date": "2024-05-01", "end_date": "2024-05-31"}"#,
        )
        .unwrap();
        let progress: BudgetProgress = serde_json::from_str(r#"{"total_spent": "25.00"}"#).unwrap();
        let card = render_budget(&budget, &Ok(progress));
        assert!(card.contains("25%"));
        assert!(card.contains("25.00 RWF / 100.00 RWF"));
        assert!(!card.contains("EXCEEDED"));

        let failed = render_budget(&budget, &Err(ApiError::ServerError(String::new())));
        assert!(failed.contains("progress unavailable"));
    }
}
