//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod batch;
pub mod config_cmd;
pub mod events;
pub mod policy;
pub mod rate;
pub mod timeline;
pub mod update;
pub mod util;
pub mod watch;

use shiptrack_core::BackendConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    config: BackendConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Timeline(args) => timeline::handle(config, &args, global).await,
        Command::Update(args) => update::handle_update(config, &args, global).await,
        Command::Refresh(args) => update::handle_refresh(config, &args, global).await,
        Command::Watch(args) => watch::handle(config, &args, global).await,
        Command::Batch(args) => batch::handle(config, &args, global).await,
        Command::Events(args) => events::handle(config, args, global).await,
        // Offline commands are handled before a backend is configured
        Command::Policy(_) | Command::Rate(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Internal("offline command reached backend dispatch".into()))
        }
    }
}
