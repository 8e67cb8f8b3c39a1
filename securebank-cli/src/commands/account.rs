//! Balance and send commands

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Select};
use rust_decimal::Decimal;
use securebank_core::domain::{TransferRequest, DEFAULT_CATEGORIES};

use super::{get_context, log_command, require_session};
use crate::output::format_money;

pub async fn balance(json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "balance");
    let session = require_session(&ctx).await?;

    let balance = ctx.accounts.balance(&session).await?;
    if json {
        println!("{}", serde_json::json!({ "balance": balance }));
    } else {
        println!("{}", "Saldo Atual".bold());
        println!("  {}", format_money(balance).bold());
    }
    Ok(())
}

/// Accepts `150`, `150.5` and the Brazilian `150,50`
fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().trim_start_matches("R$").trim().replace(',', ".");
    cleaned
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount '{}'", raw))
}

/// Snap a typed category onto the listed spelling, ignoring case and accents
fn match_category(raw: &str) -> String {
    let fold = |s: &str| -> String {
        s.trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' | 'à' | 'â' | 'ã' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                other => other,
            })
            .collect()
    };
    let wanted = fold(raw);
    DEFAULT_CATEGORIES
        .iter()
        .find(|c| fold(c) == wanted)
        .map(|c| c.to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

fn pick_category() -> Result<String> {
    if !atty::is(atty::Stream::Stdin) {
        bail!(
            "No category given; use --category ({})",
            DEFAULT_CATEGORIES.join(", ")
        );
    }
    let index = Select::new()
        .with_prompt("Category")
        .items(DEFAULT_CATEGORIES)
        .default(0)
        .interact()?;
    Ok(DEFAULT_CATEGORIES[index].to_string())
}

pub async fn send(
    to: String,
    amount: String,
    description: Option<String>,
    category: Option<String>,
    yes: bool,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "send");
    let session = require_session(&ctx).await?;

    let category = match category {
        Some(c) => match_category(&c),
        None => pick_category()?,
    };
    let request = TransferRequest::new(
        to,
        parse_amount(&amount)?,
        description.unwrap_or_default(),
        category,
    )
    .normalized()?;

    if !yes && !json {
        println!(
            "Send {} to @{} ({}: {})",
            format_money(request.amount).bold(),
            request.destination_alias,
            request.category,
            request.description
        );
        if !Confirm::new()
            .with_prompt("Confirm transfer?")
            .default(false)
            .interact()?
        {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let sent = ctx.accounts.transfer(&session, &request).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&sent)?);
    } else {
        println!(
            "{} Sent {} to @{}",
            "✓".green(),
            format_money(sent.amount),
            sent.destination_alias
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("150").unwrap(), Decimal::new(150, 0));
        assert_eq!(parse_amount("150,50").unwrap(), Decimal::new(15050, 2));
        assert_eq!(parse_amount("R$ 12.5").unwrap(), Decimal::new(125, 1));
        assert!(parse_amount("doze").is_err());
    }

    #[test]
    fn test_match_category_uses_listed_spelling() {
        assert_eq!(match_category("servicos"), "Serviços");
        assert_eq!(match_category(" compras online "), "Compras Online");
        assert_eq!(match_category("Educação"), "Educação");
    }
}
