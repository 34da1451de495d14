use clap::Args;
use intentgate_core::Config;

use super::{open_coordinator, print_json, runtime, CliResult};

#[derive(Args)]
pub struct LogArgs {
    /// Number of entries to show (defaults to `numIntentEntries`)
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run(args: LogArgs, config: Config) -> CliResult {
    let coordinator = open_coordinator(config)?;
    let rt = runtime()?;
    rt.block_on(async {
        let history = coordinator.intent_history(args.limit).await?;
        print_json(&history)
    })
}
