pub mod badge;
pub mod check;
pub mod config;
pub mod intent;
pub mod log;
pub mod setup;
pub mod site;

use intentgate_core::{Config, Coordinator, SqliteStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Coordinator over the on-disk store.
pub fn open_coordinator(config: Config) -> Result<Coordinator<SqliteStore>, Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    Ok(Coordinator::new(store, config))
}

/// Current-thread runtime for one command.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
