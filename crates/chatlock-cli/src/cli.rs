use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use chatlock_core::VERSION;

/// Chatlock - PIN-gated private chats and projects
#[derive(Parser)]
#[command(name = "chatlock")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = crate::constants::env::CONFIG)]
    pub config: Option<PathBuf>,

    /// Path to the vault database
    #[arg(long, global = true, env = crate::constants::env::STORE)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,
}

/// The view document a command acts on
#[derive(Args)]
pub struct ViewArgs {
    /// JSON view document standing in for the page
    #[arg(long, value_name = "FILE")]
    pub view: PathBuf,
}

/// Arguments for the `pin set` command
#[derive(Args)]
pub struct PinSetArgs {
    /// Disable interactive prompts (read CHATLOCK_PIN)
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `pin status` command
#[derive(Args)]
pub struct PinStatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `pin` command
#[derive(Args)]
pub struct PinArgs {
    #[command(subcommand)]
    pub command: PinSubcommand,
}

#[derive(Subcommand)]
pub enum PinSubcommand {
    /// Set or change the PIN
    Set(PinSetArgs),

    /// Show whether a PIN is set
    Status(PinStatusArgs),
}

/// Arguments for the `reset` command
#[derive(Args)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

/// Arguments for the `unlock` command
#[derive(Args)]
pub struct UnlockArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Disable interactive prompts (read CHATLOCK_PIN)
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `status` command
#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `folder` command
#[derive(Args)]
pub struct FolderArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Unlock this chat and navigate the view to it
    #[arg(long, value_name = "KEY")]
    pub open: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable interactive prompts (read CHATLOCK_PIN)
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `watch` command
#[derive(Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Poll interval in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Stop after this many ticks
    #[arg(long, value_name = "N")]
    pub ticks: Option<u64>,
}

/// Arguments for the `config init` command
#[derive(Args)]
pub struct ConfigInitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `config` command
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default config file
    Init(ConfigInitArgs),

    /// Print the effective configuration
    Show,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the PIN
    Pin(PinArgs),

    /// Forget the PIN and every locked item
    Reset(ResetArgs),

    /// Lock the chat or project shown in the view
    Lock(ViewArgs),

    /// Unlock the chat or project shown in the view
    Unlock(UnlockArgs),

    /// Show whether the view is gated
    Status(StatusArgs),

    /// List locked chats, optionally opening one
    Folder(FolderArgs),

    /// Keep the view in sync with the vault, printing overlay changes
    Watch(WatchArgs),

    /// Manage the config file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
