use clap::Args;
use intentgate_core::{badge, BadgeSink, BadgeUpdate, Config, IconState};

use super::{open_coordinator, print_json, runtime, CliResult};

#[derive(Args)]
pub struct BadgeArgs {
    /// Page to project the countdown for
    pub url: String,
    /// Keep ticking until the countdown clears
    #[arg(long)]
    pub watch: bool,
}

/// Prints each label change as a JSON line.
struct StdoutBadge {
    last: Option<String>,
}

impl BadgeSink for StdoutBadge {
    fn set_badge_text(&mut self, text: &str) {
        if self.last.as_deref() == Some(text) {
            return;
        }
        self.last = Some(text.to_string());
        let update = if text.is_empty() {
            BadgeUpdate::Clear
        } else {
            BadgeUpdate::Show(text.to_string())
        };
        if let Ok(line) = serde_json::to_string(&update) {
            println!("{line}");
        }
    }

    fn set_icon(&mut self, icon: IconState) {
        tracing::debug!(?icon, "icon");
    }
}

pub fn run(args: BadgeArgs, config: Config) -> CliResult {
    let interval = config.tick_interval();
    let coordinator = open_coordinator(config)?;
    let rt = runtime()?;
    rt.block_on(async {
        let urls = [args.url];
        if !args.watch {
            let whitelist = coordinator.state().await?.whitelist();
            return print_json(&badge::project(&urls, &whitelist, coordinator.now()));
        }

        let mut sink = StdoutBadge { last: None };
        coordinator.arm_badge().await;
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match coordinator.badge_tick(&urls, &mut sink).await? {
                Some(BadgeUpdate::Show(_)) => continue,
                _ => break,
            }
        }
        Ok(())
    })
}
