pub mod config;
pub mod triage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use triage::{TriageDesk, TriageError, TriageReference};

/// Install the global `tracing` subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Load the configured reference data (or the builtin taxonomy) and open a
/// desk for a fresh case.
pub fn open_desk() -> Result<TriageDesk, TriageError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    let path = config::reference_data_path();
    let reference = TriageReference::load_or_builtin(path.as_deref())?;
    Ok(TriageDesk::new(Arc::new(reference)))
}
