//! Transactions and dashboard commands - drive the feed controller

use anyhow::{bail, Result};
use comfy_table::Cell;
use colored::Colorize;
use securebank_core::services::{FeedController, FeedOutcome, FeedState};
use securebank_core::{FeedFilter, TransactionKind};

use super::{get_context, log_command, require_session};
use crate::output::{amount_cell, create_table, format_money, format_when, transactions_table};

/// Upper bound on pages fetched by one command
pub const MAX_PAGES: u32 = 100;

/// Keep calling `load_more` until `pages` pages are loaded, `found` matches
/// the feed state, or the feed runs dry. `None` loads up to `MAX_PAGES`.
async fn load_pages(
    feed: &FeedController,
    pages: Option<u32>,
    found: impl Fn(&FeedState) -> bool,
) -> Result<()> {
    let limit = pages.unwrap_or(MAX_PAGES).min(MAX_PAGES);
    let mut loaded = 1;
    loop {
        let state = feed.state();
        if loaded >= limit || state.exhausted || found(&state) {
            return Ok(());
        }
        match feed.load_more().await? {
            FeedOutcome::Loaded { .. } => loaded += 1,
            FeedOutcome::Exhausted | FeedOutcome::Skipped | FeedOutcome::Discarded => return Ok(()),
        }
    }
}

pub async fn transactions(
    filter: FeedFilter,
    search: Option<String>,
    pages: u32,
    all: bool,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "transactions");
    let session = require_session(&ctx).await?;

    let query = search.unwrap_or_default();
    let feed = ctx.feed(&session);
    feed.initial_load(filter, &query).await?;
    load_pages(&feed, if all { None } else { Some(pages.max(1)) }, |_| false).await?;

    let state = feed.state();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "filter": state.filter,
                "query": state.query,
                "page": state.page,
                "exhausted": state.exhausted,
                "items": state.items,
            }))?
        );
        return Ok(());
    }

    if state.items.is_empty() {
        if query.trim().is_empty() {
            println!("No transactions found.");
        } else {
            println!("No transactions match '{}'.", query.trim());
        }
        return Ok(());
    }

    println!("{}", transactions_table(&state.items));
    println!(
        "{}",
        format!(
            "{} transactions, {} page(s), filter: {}",
            state.items.len(),
            state.page,
            state.filter
        )
        .dimmed()
    );
    if !state.exhausted {
        println!(
            "{}",
            format!("More available: --pages {} or --all", state.page + 1).dimmed()
        );
    }

    Ok(())
}

pub async fn dashboard(limit: usize, json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "dashboard");
    let session = require_session(&ctx).await?;

    let feed = ctx.feed(&session);
    let (balance, loaded) = tokio::join!(
        ctx.accounts.balance(&session),
        feed.initial_load(FeedFilter::All, "")
    );
    let balance = balance?;
    loaded?;

    let mut recent = feed.items();
    recent.truncate(limit);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "name": session.display_name(),
                "balance": balance,
                "recent": recent,
            }))?
        );
        return Ok(());
    }

    let first_name = session
        .display_name()
        .split_whitespace()
        .next()
        .unwrap_or(session.alias());
    println!("{}", format!("Olá, {}", first_name).bold());
    println!("{}", "Seu resumo financeiro".dimmed());
    println!();
    println!("Saldo Atual: {}", format_money(balance).bold());
    println!();

    if recent.is_empty() {
        println!("No transactions yet.");
    } else {
        println!("{}", transactions_table(&recent));
    }
    println!();
    println!(
        "{}",
        "sb send <alias> <amount>  ·  sb transactions  ·  sb biometrics status".dimmed()
    );

    Ok(())
}

/// Look a transaction up by id in the listing and print every field
pub async fn show(id: i64, json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "transactions show");
    let session = require_session(&ctx).await?;

    let feed = ctx.feed(&session);
    feed.initial_load(FeedFilter::All, "").await?;
    load_pages(&feed, None, |state| state.items.iter().any(|tx| tx.id == id)).await?;

    let Some(tx) = feed.items().into_iter().find(|tx| tx.id == id) else {
        bail!("Transaction {} not found", id);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tx)?);
        return Ok(());
    }

    let direction = match tx.kind {
        TransactionKind::Incoming => "Received from",
        TransactionKind::Outgoing => "Sent to",
    };
    let counterparty = if tx.counterparty.name.is_empty() {
        format!("@{}", tx.counterparty.alias)
    } else {
        format!("{} (@{})", tx.counterparty.name, tx.counterparty.alias)
    };

    println!("{}", "Transaction Detail".bold());
    let mut table = create_table();
    table.add_row(vec![Cell::new("Amount"), amount_cell(&tx)]);
    table.add_row(vec![Cell::new(direction), Cell::new(counterparty)]);
    table.add_row(vec![Cell::new("Description"), Cell::new(&tx.description)]);
    table.add_row(vec![Cell::new("Category"), Cell::new(&tx.category)]);
    table.add_row(vec![Cell::new("Date"), Cell::new(format_when(&tx))]);
    table.add_row(vec![Cell::new("Id"), Cell::new(tx.id)]);
    println!("{}", table);

    Ok(())
}
