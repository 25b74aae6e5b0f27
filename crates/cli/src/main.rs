//! Name Registry Command Line Interface
//!
//! Operator tool for inspecting and administering a name registry store.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use namereg_registry::{
    Address, Amount, CallContext, NameRegistry, RecoverableSignature,
    RegistryConfig,
};
use namereg_types::keccak256;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "namereg")]
#[command(about = "Name Registry Command Line Interface", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); NAMEREG_* environment variables also apply
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Caller address; defaults to the first configured operator
    #[arg(long)]
    caller: Option<Address>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with default values
    InitConfig {
        /// Output path
        #[arg(default_value = "namereg.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check whether a user name is taken
    UserTaken { name: String },
    /// Check whether an application name is taken in each namespace
    AppTaken { name: String },
    /// Show the address bound to a user name
    GetUser { name: String },
    /// Show current fees and registry counts
    Fees,
    /// Bind an official user name to an address (operator)
    OfficialUser { name: String, address: Address },
    /// Register an official application name (operator)
    OfficialApp { name: String },
    /// Bind a user name to the caller, paying the signup fee
    RegisterUser {
        name: String,
        #[arg(long, default_value_t = 0)]
        payment: Amount,
    },
    /// Register an unofficial application name, paying the signup fee
    RegisterApp {
        name: String,
        #[arg(long, default_value_t = 0)]
        payment: Amount,
    },
    /// Delete an application (operator)
    DeleteApp {
        name: String,
        /// Delete from the official namespace instead of the unofficial one
        #[arg(long)]
        official: bool,
    },
    /// Delete the caller's own user binding
    DeleteUser { name: String },
    /// Delete a user with their signature over "Delete" (operator)
    DeleteUserFor {
        name: String,
        /// 65-byte r || s || v signature, hex encoded
        signature: RecoverableSignature,
    },
    /// Set the unofficial user signup fee (operator)
    SetUserFee { fee: Amount },
    /// Set the unofficial application signup fee (operator)
    SetAppFee { fee: Amount },
    /// Check that an address signed a message
    Verify {
        address: Address,
        signature: RecoverableSignature,
        /// Signed message; the digest is its Keccak-256 hash
        #[arg(long, default_value = "Delete")]
        message: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { path, force } = &cli.command {
        return init_config(path, *force);
    }

    let config =
        RegistryConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let registry = NameRegistry::from_config(&config).context("failed to open registry")?;
    let caller = cli.caller.or_else(|| config.operators.first().copied());

    let result = run(&registry, caller, cli.command);
    registry.flush()?;
    result
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists; pass --force to overwrite",
            path.display()
        ));
    }
    let rendered = RegistryConfig::default().to_toml()?;
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn context(caller: Option<Address>) -> Result<CallContext> {
    caller
        .map(CallContext::new)
        .ok_or_else(|| anyhow!("no caller: pass --caller or configure an operator"))
}

fn run(registry: &NameRegistry, caller: Option<Address>, command: Commands) -> Result<()> {
    let output = match command {
        Commands::InitConfig { path, force } => return init_config(&path, force),
        Commands::UserTaken { name } => json!({
            "name": name,
            "taken": registry.user_name_taken(&name)?,
        }),
        Commands::AppTaken { name } => {
            let (official, unofficial) = registry.application_name_taken(&name)?;
            json!({ "name": name, "official": official, "unofficial": unofficial })
        }
        Commands::GetUser { name } => {
            let (address, official) = registry.get_user_by_name(&name)?;
            json!({ "name": name, "address": address, "official": official })
        }
        Commands::Fees => serde_json::to_value(registry.stats()?)?,
        Commands::OfficialUser { name, address } => {
            registry.official_user_sign_up(&context(caller)?, &name, address)?;
            json!({ "registered": name, "address": address, "official": true })
        }
        Commands::OfficialApp { name } => {
            registry.official_application_sign_up(&context(caller)?, &name)?;
            json!({ "registered": name, "official": true })
        }
        Commands::RegisterUser { name, payment } => {
            let ctx = context(caller)?.with_payment(payment);
            registry.unofficial_user_sign_up(&ctx, &name)?;
            json!({ "registered": name, "address": ctx.caller, "official": false })
        }
        Commands::RegisterApp { name, payment } => {
            let ctx = context(caller)?.with_payment(payment);
            registry.unofficial_application_sign_up(&ctx, &name)?;
            json!({ "registered": name, "official": false })
        }
        Commands::DeleteApp { name, official } => {
            registry.delete_application(&context(caller)?, &name, official)?;
            json!({ "deleted": name, "official": official })
        }
        Commands::DeleteUser { name } => {
            registry.delete_user(&context(caller)?, &name)?;
            json!({ "deleted": name })
        }
        Commands::DeleteUserFor { name, signature } => {
            registry.delete_user_for_user(&context(caller)?, &name, &signature)?;
            json!({ "deleted": name })
        }
        Commands::SetUserFee { fee } => {
            registry.set_unofficial_user_sign_up_fee(&context(caller)?, fee)?;
            serde_json::to_value(registry.fee_schedule()?)?
        }
        Commands::SetAppFee { fee } => {
            registry.set_unofficial_application_sign_up_fee(&context(caller)?, fee)?;
            serde_json::to_value(registry.fee_schedule()?)?
        }
        Commands::Verify {
            address,
            signature,
            message,
        } => {
            let digest = keccak256(message.as_bytes());
            json!({
                "address": address,
                "message": message,
                "signed": registry.is_signed(&address, &digest, &signature),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
