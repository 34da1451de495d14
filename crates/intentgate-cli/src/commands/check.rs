use clap::Args;
use intentgate_core::Config;
use serde_json::json;

use super::{open_coordinator, print_json, runtime, CliResult};

#[derive(Args)]
pub struct CheckArgs {
    /// Candidate URLs for the page; the first one decides
    #[arg(required = true)]
    pub urls: Vec<String>,
}

pub fn run(args: CheckArgs, config: Config) -> CliResult {
    let coordinator = open_coordinator(config)?;
    let rt = runtime()?;
    rt.block_on(async {
        let decision = coordinator.evaluate(&args.urls).await?;
        print_json(&json!({
            "url": args.urls[0],
            "gating": decision,
            "requires_prompt": decision.requires_prompt(),
        }))
    })
}
