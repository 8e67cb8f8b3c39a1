//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use rust_decimal::{Decimal, RoundingStrategy};
use securebank_core::{Transaction, TransactionKind};

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an amount as `R$ 1234.50`
pub fn format_money(amount: Decimal) -> String {
    format!(
        "R$ {:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Signed, colored amount cell for a transaction row
pub fn amount_cell(tx: &Transaction) -> Cell {
    let text = format!("{} {}", tx.kind.sign(), format_money(tx.amount));
    match tx.kind {
        TransactionKind::Incoming => Cell::new(text).fg(Color::Green),
        TransactionKind::Outgoing => Cell::new(text).fg(Color::Red),
    }
}

/// Transaction date as `YYYY-MM-DD HH:MM`, or the raw text when unparseable
pub fn format_when(tx: &Transaction) -> String {
    tx.occurred_at()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| tx.timestamp.clone())
}

/// Table of transactions in feed order
pub fn transactions_table(items: &[Transaction]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Id", "Date", "Description", "Category", "Counterparty", "Amount"]);
    for tx in items {
        let counterparty = if tx.counterparty.name.is_empty() {
            tx.counterparty.alias.clone()
        } else {
            format!("{} (@{})", tx.counterparty.name, tx.counterparty.alias)
        };
        table.add_row(vec![
            Cell::new(tx.id),
            Cell::new(format_when(tx)),
            Cell::new(&tx.description),
            Cell::new(&tx.category),
            Cell::new(counterparty),
            amount_cell(tx),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money_rounds_to_cents() {
        assert_eq!(format_money(Decimal::new(150, 0)), "R$ 150.00");
        assert_eq!(format_money(Decimal::new(12346, 3)), "R$ 12.35");
    }

    #[test]
    fn test_format_when_falls_back_to_raw() {
        let mut tx = Transaction::new(1, TransactionKind::Incoming, Decimal::ONE);
        tx.timestamp = "2024-03-05T14:30:00Z".to_string();
        assert_eq!(format_when(&tx), "2024-03-05 14:30");

        tx.timestamp = "ontem".to_string();
        assert_eq!(format_when(&tx), "ontem");
    }
}
