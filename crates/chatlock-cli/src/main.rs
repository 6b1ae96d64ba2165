//! Chatlock CLI - PIN-gated private chats and projects
//!
//! Drives the lock flow against a JSON view document that stands in for the
//! page: lock what it shows, unlock it with the PIN, browse the private
//! folder, or keep it in sync with the vault.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod ui;

use clap::Parser;
use chatlock_core::VERSION;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands, ConfigSubcommand, PinSubcommand};
use crate::commands::{folder, gate, misc, pin, watch};
use crate::errors::exit_code_for;
use crate::ui::print_error;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        let ui_ctx = ctx.ui_context(false);
        let full = format!("{}", e);
        let (message, hint) = split_hint(&full);
        print_error(&ui_ctx, message, hint);
        std::process::exit(exit_code_for(&e));
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(constants::env::LOG).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Split a trailing "Hint: ..." line off an error message.
fn split_hint(error: &str) -> (&str, Option<&str>) {
    match error.find("\nHint:") {
        Some(idx) => (&error[..idx], Some(error[idx + 1..].trim_start_matches("Hint:").trim())),
        None => (error, None),
    }
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Pin(args)) => match &args.command {
            PinSubcommand::Set(set_args) => pin::handle_set(ctx, set_args)?,
            PinSubcommand::Status(status_args) => pin::handle_status(ctx, status_args)?,
        },
        Some(Commands::Reset(args)) => {
            misc::handle_reset(ctx, args)?;
        }
        Some(Commands::Lock(args)) => {
            gate::handle_lock(ctx, args)?;
        }
        Some(Commands::Unlock(args)) => {
            gate::handle_unlock(ctx, args)?;
        }
        Some(Commands::Status(args)) => {
            gate::handle_status(ctx, args)?;
        }
        Some(Commands::Folder(args)) => {
            folder::handle_folder(ctx, args)?;
        }
        Some(Commands::Watch(args)) => {
            watch::handle_watch(ctx, args)?;
        }
        Some(Commands::Config(args)) => match &args.command {
            ConfigSubcommand::Init(init_args) => misc::handle_config_init(ctx, init_args)?,
            ConfigSubcommand::Show => misc::handle_config_show(ctx)?,
        },
        Some(Commands::Completions(args)) => {
            misc::handle_completions(args.shell)?;
        }
        None => {
            println!("Chatlock v{}", VERSION);
            println!("\nQuickstart:");
            println!("  chatlock pin set");
            println!("  chatlock lock --view page.json");
            println!("  chatlock unlock --view page.json");
            println!("  chatlock folder --view page.json");
            println!("\nRun `chatlock --help` for full usage.");
        }
    }

    Ok(())
}
