use clap::Args;
use intentgate_core::Config;
use serde_json::json;

use super::{open_coordinator, print_json, runtime, CliResult};

#[derive(Args)]
pub struct SetupArgs {
    /// Migrate state written by an older version instead of resetting
    #[arg(long)]
    pub upgrade: bool,
}

pub fn run(args: SetupArgs, config: Config) -> CliResult {
    let coordinator = open_coordinator(config)?;
    let rt = runtime()?;
    rt.block_on(async {
        if !args.upgrade {
            return print_json(&coordinator.first_time_setup().await?);
        }
        match coordinator.migrate_legacy().await? {
            Some(event) => print_json(&event),
            None => print_json(&json!({ "type": "Unchanged" })),
        }
    })
}
