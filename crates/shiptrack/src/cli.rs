//! Clap derive structures for the `shiptrack` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// shiptrack -- shipment timelines and carrier status checks
#[derive(Debug, Parser)]
#[command(
    name = "shiptrack",
    version,
    about = "Reconcile shipment timelines and carrier status from the command line",
    long_about = "Merges carrier tracking with stored lifecycle events into one\n\
        timeline, and decides when a shipment is worth re-checking with the carrier.\n\n\
        Shipment records are read from JSON files (use '-' for stdin).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "SHIPTRACK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Callable functions base URL (overrides profile)
    #[arg(long, env = "SHIPTRACK_FUNCTIONS_URL", global = true)]
    pub functions_url: Option<String>,

    /// Event store base URL (overrides profile)
    #[arg(long, env = "SHIPTRACK_STORE_URL", global = true)]
    pub store_url: Option<String>,

    /// Bearer token
    #[arg(long, env = "SHIPTRACK_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SHIPTRACK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SHIPTRACK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SHIPTRACK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the merged timeline of a shipment
    #[command(alias = "tl")]
    Timeline(TimelineArgs),

    /// Run the policy-gated smart status update
    #[command(alias = "up")]
    Update(UpdateArgs),

    /// Force a carrier status refresh, ignoring the policy
    Refresh(ShipmentArgs),

    /// Explain the update policy decision for a shipment (offline)
    Policy(PolicyArgs),

    /// Show the resolved carrier rate of a shipment (offline)
    Rate(ShipmentArgs),

    /// Follow a shipment's timeline as events arrive
    Watch(WatchArgs),

    /// Smart-update many shipments in rate-limited chunks
    Batch(BatchArgs),

    /// List or append stored lifecycle events
    Events(EventsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shipment input ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShipmentArgs {
    /// Shipment JSON file ('-' for stdin)
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub shipment: ShipmentArgs,

    /// Run a smart update first so fresh carrier tracking is included
    #[arg(long)]
    pub refresh: bool,

    /// Show at most this many entries (newest first)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub shipment: ShipmentArgs,

    /// Skip the policy gate
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct PolicyArgs {
    #[command(flatten)]
    pub shipment: ShipmentArgs,

    /// Evaluate as of this RFC 3339 instant instead of now
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub shipment: ShipmentArgs,

    /// Also run smart updates at the recommended check interval
    #[arg(long)]
    pub auto_update: bool,

    /// Event store poll interval, e.g. "5s" (overrides profile)
    #[arg(long)]
    pub interval: Option<String>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// JSON file holding an array of shipments ('-' for stdin)
    pub file: PathBuf,

    /// Skip the policy gate for every shipment
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Shipments per concurrent chunk (overrides profile)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Pause between chunks, e.g. "1s" (overrides profile)
    #[arg(long)]
    pub cooldown: Option<String>,
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List normalized lifecycle events, newest first
    #[command(alias = "ls")]
    List {
        /// Shipment ID
        shipment_id: String,
    },

    /// Append a lifecycle event
    Append {
        /// Shipment ID
        shipment_id: String,

        /// Event type (e.g. user_action, status_update, document_generated)
        #[arg(long = "type", short = 't', default_value = "user_action")]
        event_type: String,

        /// Short title shown in the timeline
        #[arg(long)]
        title: Option<String>,

        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Recorded by (system, carrier, user, api)
        #[arg(long, default_value = "user")]
        source: String,

        /// Read the full event from a JSON file instead
        #[arg(long, short = 'F', conflicts_with_all = ["title", "description"])]
        from_file: Option<PathBuf>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show current configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value on a profile
    Set {
        /// Config key (e.g. functions_url, store_url, timeout, poll_interval)
        key: String,
        /// Value to set
        value: String,
    },

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// List all profiles
    Profiles,

    /// Store a bearer token for a profile in the system keyring
    SetToken,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
