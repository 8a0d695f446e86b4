//! Binary entry point that glues the JSON-backed records to the TUI. Startup
//! runs in a fixed order: resolve settings, start file logging, open the data
//! file, then hand the repository to the Ratatui event loop until the user
//! exits.
use anyhow::Context;
use log::info;
use school_records::{init_logging, run_app, App, AppConfig, JsonStore, Repository};

/// Bring up logging and persistence, then launch the TUI.
///
/// Logging starts before the data file is opened so a malformed or unreadable
/// file is recorded in the log as well as printed once the terminal is
/// restored. Fatal startup problems bubble up as `anyhow` errors with the data
/// file path attached.
fn main() -> anyhow::Result<()> {
    let config = AppConfig::resolve()?;
    init_logging(&config.log_level, &config.log_dir).context("failed to start logging")?;

    let store = JsonStore::new(config.data_file.clone());
    let repository = Repository::open(store).with_context(|| {
        format!("failed to open records at {}", config.data_file.display())
    })?;
    let path = repository.store().path().display();
    if repository.dataset().is_empty() {
        info!("event=records_open status=empty path={path}");
    } else {
        info!(
            "event=records_open status=ok path={path} students={} staff={}",
            repository.students().len(),
            repository.staff().len()
        );
    }

    let mut app = App::new(repository);
    let result = run_app(&mut app);
    info!("event=app_exit status={}", if result.is_ok() { "ok" } else { "error" });
    result
}
