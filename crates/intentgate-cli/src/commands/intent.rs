use clap::Args;
use intentgate_core::{Config, IntentRequest};
use serde_json::json;

use super::{open_coordinator, print_json, runtime, CliResult};

#[derive(Args)]
pub struct IntentArgs {
    /// Page the intent is for
    pub url: String,
    /// Why you are visiting
    pub text: String,
    /// Minutes to allow; defaults to the configured default
    #[arg(long)]
    pub minutes: Option<u32>,
}

pub fn run(args: IntentArgs, config: Config) -> CliResult {
    let coordinator = open_coordinator(config)?;
    let request = IntentRequest {
        intent: args.text,
        url: args.url,
        whitelist_minutes: args.minutes,
    };
    let rt = runtime()?;
    rt.block_on(async {
        let outcome = coordinator.handle_intent(&request).await?;
        print_json(&json!({
            "status": outcome.response.status,
            "event": outcome.event,
        }))
    })
}
