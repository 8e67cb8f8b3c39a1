//! Status command - show saved credentials, session and settings

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use super::{get_context, log_command};

#[derive(Serialize)]
struct StatusReport {
    app_dir: String,
    api_url: String,
    saved_alias: Option<String>,
    session_token: bool,
    session: &'static str,
    biometric_provider: String,
    biometric_opt_in: bool,
    biometric_available: bool,
}

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "status");

    let saved_alias = ctx.store.load().await?.map(|identity| identity.alias);
    let session_token = ctx.store.load_token().await?.is_some();
    ctx.sessions.resume().await?;

    let status = StatusReport {
        app_dir: ctx.app_dir.display().to_string(),
        api_url: ctx.config.base_url.clone(),
        saved_alias,
        session_token,
        session: ctx.sessions.state().name(),
        biometric_provider: ctx.sessions.gate().provider().to_string(),
        biometric_opt_in: ctx.store.biometric_preference().await?,
        biometric_available: ctx.sessions.gate().is_available().await,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Secure Bank Status".bold());
    println!();

    let yes_no = |v: bool| String::from(if v { "yes" } else { "no" });
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["Session".to_string(), status.session.to_string()]);
    table.add_row(vec![
        "Saved alias".to_string(),
        status.saved_alias.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec!["Session token".to_string(), yes_no(status.session_token)]);
    table.add_row(vec![
        "Biometric unlock".to_string(),
        format!(
            "{} (opted in: {}, available: {})",
            status.biometric_provider,
            yes_no(status.biometric_opt_in),
            yes_no(status.biometric_available)
        ),
    ]);
    table.add_row(vec!["API".to_string(), status.api_url.clone()]);
    table.add_row(vec!["Data directory".to_string(), status.app_dir.clone()]);

    println!("{}", table);

    if status.saved_alias.is_none() {
        println!();
        println!("{}", "No saved identity. Use 'sb register' or 'sb login'.".yellow());
    }

    Ok(())
}
