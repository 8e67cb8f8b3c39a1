//! Biometrics command - opt in or out of biometric unlock

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use securebank_core::config::BiometricProvider;
use securebank_core::services::BiometricGate;

use super::{authenticator_for, get_context, log_command};

#[derive(Subcommand)]
pub enum BiometricsCommands {
    /// Unlock with biometrics on the next launch
    On,
    /// Always log in with alias and secret
    Off,
    /// Show device support and the saved preference
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Choose the biometric platform (fprintd, console, none)
    Provider {
        name: BiometricProvider,
    },
}

pub async fn run(command: BiometricsCommands) -> Result<()> {
    let mut ctx = get_context()?;
    log_command(&ctx, "biometrics");

    match command {
        BiometricsCommands::On => {
            ctx.sessions.set_biometric_preference(true).await?;
            println!("{} Biometric unlock enabled", "✓".green());

            if ctx.store.load().await?.is_none() {
                println!(
                    "{}",
                    "No saved identity yet; run 'sb login' once so there is something to unlock."
                        .yellow()
                );
            }
            if !ctx.sessions.gate().is_available().await {
                println!(
                    "{}",
                    format!(
                        "{} reports no enrolled biometrics; 'sb unlock' will ask for the secret.",
                        ctx.sessions.gate().provider()
                    )
                    .yellow()
                );
            }
        }
        BiometricsCommands::Off => {
            ctx.sessions.set_biometric_preference(false).await?;
            println!("{} Biometric unlock disabled", "✓".green());
        }
        BiometricsCommands::Status { json } => {
            let gate = ctx.sessions.gate();
            let supported = gate.is_supported().await;
            let enrolled = gate.is_enrolled().await;
            let preference = ctx.store.biometric_preference().await?;
            let active = ctx.sessions.biometric_login_enabled().await? && supported && enrolled;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "provider": gate.provider(),
                        "supported": supported,
                        "enrolled": enrolled,
                        "preference": preference,
                        "active": active,
                    }))?
                );
                return Ok(());
            }

            let yes_no = |v: bool| if v { "yes".green() } else { "no".red() };
            println!("{}", "Biometric Unlock".bold());
            println!("  Provider:   {}", gate.provider());
            println!("  Supported:  {}", yes_no(supported));
            println!("  Enrolled:   {}", yes_no(enrolled));
            println!("  Opted in:   {}", yes_no(preference));
            println!("  Active:     {}", yes_no(active));
        }
        BiometricsCommands::Provider { name } => {
            ctx.config.set_biometric_provider(name);
            ctx.config.save(&ctx.app_dir)?;

            let available = BiometricGate::new(authenticator_for(name)).is_available().await;
            println!("{} Biometric provider set to {}", "✓".green(), name);
            if !available && name != BiometricProvider::None {
                println!("{}", format!("{} is not available on this machine", name).yellow());
            }
        }
    }

    Ok(())
}
