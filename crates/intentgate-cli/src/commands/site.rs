use clap::Subcommand;
use intentgate_core::Config;
use serde_json::json;

use super::{open_coordinator, print_json, runtime, CliResult};

#[derive(Subcommand)]
pub enum SiteAction {
    /// Activate a site and add it to the filter list
    Add {
        /// Domain (`news.com`) or URL; a URL activates only that exact origin
        site: String,
    },
    /// Remove a site from the active set and the filter list
    Remove { site: String },
    /// Turn gating on for a site already on the filter list
    On { site: String },
    /// Turn gating off for a site, keeping it on the filter list
    Off { site: String },
    /// List active and filter-list sites
    List,
    /// Turn gating off for every site
    Clear,
}

pub fn run(action: SiteAction, config: Config) -> CliResult {
    let coordinator = open_coordinator(config)?;
    let rt = runtime()?;
    rt.block_on(async {
        match action {
            SiteAction::Add { site } => print_json(&coordinator.add_active_site(&site).await?),
            SiteAction::Remove { site } => print_json(&coordinator.remove_active_site(&site).await?),
            SiteAction::On { site } => print_json(&coordinator.set_site_active(&site, true).await?),
            SiteAction::Off { site } => print_json(&coordinator.set_site_active(&site, false).await?),
            SiteAction::List => {
                let state = coordinator.state().await?;
                let active = state.active_sites();
                print_json(&json!({
                    "active": active,
                    "blocked": state.blocked_sites(),
                    "icon": active.icon_state(),
                }))
            }
            SiteAction::Clear => match coordinator.turn_all_off().await? {
                Some(event) => print_json(&event),
                None => print_json(&json!({ "type": "Unchanged" })),
            },
        }
    })
}
