use env_logger::{Builder, Env};
use std::env;

/// Loads `.env` if present and starts the logger at `info` unless `RUST_LOG`
/// says otherwise.
pub fn setup_env() {
    dotenvy::dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

/// Reads an environment variable, treating blank values as unset.
pub fn env_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
