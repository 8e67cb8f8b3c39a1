//! Profile and receive commands - who is signed in and how to get paid

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;
use securebank_core::Session;
use serde::Serialize;

use super::{get_context, log_command, require_session};
use crate::output::create_table;

#[derive(Serialize)]
struct ProfileReport {
    name: String,
    alias: String,
    cpf: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    member_since: Option<String>,
    biometric_login: bool,
}

impl ProfileReport {
    fn new(session: &Session, biometric_login: bool) -> Self {
        let profile = session.profile.clone().unwrap_or_default();
        Self {
            name: session.display_name().to_string(),
            alias: session.alias().to_string(),
            cpf: profile.cpf,
            email: profile.email,
            phone: profile.phone,
            member_since: profile.created_at.map(|at| at.format("%Y-%m-%d").to_string()),
            biometric_login,
        }
    }
}

pub async fn profile(json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "profile");
    let session = require_session(&ctx).await?;
    let report = ProfileReport::new(&session, ctx.sessions.biometric_login_enabled().await?);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    println!("{}", report.name.bold());
    println!("{}", format!("@{}", report.alias).dimmed());
    println!();

    let mut table = create_table();
    table.add_row(vec![Cell::new("CPF"), Cell::new(dash(&report.cpf))]);
    table.add_row(vec![Cell::new("Email"), Cell::new(dash(&report.email))]);
    table.add_row(vec![Cell::new("Phone"), Cell::new(dash(&report.phone))]);
    table.add_row(vec![Cell::new("Member since"), Cell::new(dash(&report.member_since))]);
    table.add_row(vec![
        Cell::new("Biometric login"),
        Cell::new(if report.biometric_login { "on" } else { "off" }),
    ]);
    println!("{}", table);

    if session.profile.is_none() {
        println!();
        println!(
            "{}",
            "The server sent no profile with this session. Run 'sb login' to refresh it.".yellow()
        );
    }
    println!();
    println!("{}", "sb biometrics on|off  ·  sb receive".dimmed());

    Ok(())
}

/// The key another customer types to send money here
fn receive_key(session: &Session) -> String {
    session
        .profile
        .as_ref()
        .map(|p| p.alias.trim())
        .filter(|alias| !alias.is_empty())
        .unwrap_or(session.alias())
        .to_string()
}

pub async fn receive(json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "receive");
    let session = require_session(&ctx).await?;
    let key = receive_key(&session);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "name": session.display_name(),
                "alias": key,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Receive money".bold());
    println!();
    println!("  {}", session.display_name());
    println!("  Key: {}", key.green().bold());
    println!();
    println!(
        "{}",
        format!("Share this alias. Others pay you with: sb send {} <amount>", key).dimmed()
    );

    Ok(())
}
