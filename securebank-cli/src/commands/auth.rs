//! Auth commands - register, login, biometric unlock, logout and forget

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use securebank_core::domain::Registration;
use securebank_core::services::{LogEvent, RestoreOutcome};
use securebank_core::{BankContext, Error, Session};

use super::{get_context, log_command, log_event};

/// Secret for non-interactive logins
pub const SECRET_ENV: &str = "SECUREBANK_SECRET";

fn interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

fn prompt_text(prompt: &str, initial: Option<String>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(value) = initial {
        input = input.with_initial_text(value);
    }
    Ok(input.interact_text()?)
}

/// Secret from SECUREBANK_SECRET, or prompt
fn secret_or_prompt() -> Result<String> {
    if let Ok(secret) = std::env::var(SECRET_ENV) {
        return Ok(secret);
    }
    if !interactive() {
        bail!("No terminal to prompt for the secret; set {}", SECRET_ENV);
    }
    Ok(Password::new().with_prompt("Secret").interact()?)
}

fn first_name(session: &Session) -> &str {
    session
        .display_name()
        .split_whitespace()
        .next()
        .unwrap_or(session.alias())
}

fn print_session(session: &Session, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "alias": session.alias(),
                "name": session.display_name(),
                "profile": session.profile,
            }))?
        );
    } else {
        println!("{} Olá, {}", "✓".green(), first_name(session).bold());
    }
    Ok(())
}

pub async fn register(
    name: Option<String>,
    cpf: Option<String>,
    alias: Option<String>,
) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "register");

    let name = match name {
        Some(n) => n,
        None => prompt_text("Full name", None)?,
    };
    let cpf = match cpf {
        Some(c) => c,
        None => prompt_text("CPF (000.000.000-00)", None)?,
    };
    let alias = match alias {
        Some(a) => a,
        None => prompt_text("Alias", None)?,
    };
    let (secret, secret_confirmation) = match std::env::var(SECRET_ENV) {
        Ok(secret) => (secret.clone(), secret),
        Err(_) => (
            Password::new().with_prompt("Secret").interact()?,
            Password::new().with_prompt("Confirm secret").interact()?,
        ),
    };

    let registration = Registration {
        name,
        cpf,
        alias,
        secret,
        secret_confirmation,
    };
    ctx.accounts.register(&registration).await?;

    println!("{} Account created", "✓".green());
    println!("Run 'sb login --alias {}' to sign in.", registration.alias);
    Ok(())
}

/// Offer biometric unlock right after a manual login
async fn offer_biometrics(ctx: &BankContext) -> Result<()> {
    if !interactive()
        || ctx.sessions.biometric_login_enabled().await?
        || !ctx.sessions.gate().is_available().await
    {
        return Ok(());
    }
    let enable = Confirm::new()
        .with_prompt(format!(
            "Use {} to unlock next time?",
            ctx.sessions.gate().provider()
        ))
        .default(false)
        .interact()?;
    if enable {
        ctx.sessions.set_biometric_preference(true).await?;
        println!("{}", "Biometric unlock enabled".green());
    }
    Ok(())
}

async fn manual_login(ctx: &BankContext, alias: Option<String>, json: bool) -> Result<Session> {
    let stored = ctx.store.load().await?.map(|identity| identity.alias);
    let alias = match alias {
        Some(a) => a,
        None if interactive() => prompt_text("Alias", stored)?,
        None => match stored {
            Some(a) => a,
            None => bail!("No alias given; use --alias"),
        },
    };
    let secret = secret_or_prompt()?;

    let session = ctx.sessions.login(&alias, &secret).await?;
    print_session(&session, json)?;
    if !json {
        offer_biometrics(ctx).await?;
    }
    Ok(session)
}

pub async fn login(alias: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "login");

    if let Some(session) = ctx.sessions.resume().await? {
        if alias.as_deref().map_or(true, |a| a.trim() == session.alias()) {
            if !json {
                println!("{}", "Already logged in.".dimmed());
            }
            return print_session(&session, json);
        }
        // Switching users drops the old token first
        ctx.sessions.sign_out().await?;
    }

    manual_login(&ctx, alias, json).await?;
    Ok(())
}

pub async fn unlock(json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "unlock");

    let reason = match ctx.sessions.restore().await {
        Ok(RestoreOutcome::Restored(session)) => return print_session(&session, json),
        Ok(RestoreOutcome::ManualLoginRequired) => {
            "Biometric unlock is not set up on this device.".to_string()
        }
        Err(e) if e.is_biometric() || matches!(e, Error::AuthRejected(_)) => e.to_string(),
        Err(e) => return Err(e.into()),
    };

    if json || !interactive() {
        bail!("{} Use 'sb login'.", reason);
    }

    println!("{}", reason.yellow());
    log_event(&ctx, LogEvent::new("manual_login_fallback").with_command("unlock"));
    manual_login(&ctx, None, json).await?;
    Ok(())
}

pub async fn logout() -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "logout");

    ctx.sessions.resume().await?;
    if ctx.sessions.sign_out().await? {
        println!("{} Logged out", "✓".green());
    } else {
        println!("{}", "No active session".dimmed());
    }
    Ok(())
}

pub async fn forget(force: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "forget");

    if !force {
        println!(
            "\n{}",
            "This removes the saved alias, secret, token and biometric setting.".yellow()
        );
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    ctx.sessions.logout();
    ctx.sessions.forget_credentials().await?;
    println!("{} Saved credentials removed", "✓".green());
    Ok(())
}
