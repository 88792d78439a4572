use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "Triage Engine";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable pointing at a reference-data JSON file.
pub const REFERENCE_PATH_ENV: &str = "TRIAGE_REFERENCE_PATH";

const REFERENCE_FILE_NAME: &str = "triage_reference.json";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "triage_engine=debug,warn"
    } else {
        "triage_engine=info,warn"
    }
}

/// Per-user configuration directory, e.g. `~/.config/TriageEngine/`.
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("TriageEngine"))
}

/// Reference data to load instead of the builtin taxonomy, if any.
///
/// `TRIAGE_REFERENCE_PATH` wins; otherwise `triage_reference.json` in the
/// config directory is used when it exists.
pub fn reference_data_path() -> Option<PathBuf> {
    resolve_reference_path(
        std::env::var(REFERENCE_PATH_ENV).ok().as_deref(),
        app_config_dir().as_deref(),
    )
}

fn resolve_reference_path(env_value: Option<&str>, config_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(value) = env_value.map(str::trim).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value));
    }
    config_dir
        .map(|dir| dir.join(REFERENCE_FILE_NAME))
        .filter(|path| path.is_file())
}
