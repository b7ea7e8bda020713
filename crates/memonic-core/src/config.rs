//! Runtime configuration, populated from environment variables with
//! documented defaults. Mirrors the way the storage layer resolves its
//! default data directory via `directories::ProjectDirs`, generalized to
//! every tunable the engine exposes.

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::warn;

/// All environment variables this crate recognizes.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: PathBuf,
    pub hot_capacity: usize,
    pub warm_capacity: usize,
    pub decay_interval_ms: u64,
    pub checkpoint_interval_ms: u64,
    pub prune_threshold: f32,
    pub skip_bm25: bool,
    pub max_wait_seconds: u64,
    pub daemon_socket: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub vocab_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_path: default_store_path(),
            hot_capacity: 50_000,
            warm_capacity: 500_000,
            decay_interval_ms: 60_000,
            checkpoint_interval_ms: 300_000,
            prune_threshold: 0.1,
            skip_bm25: false,
            max_wait_seconds: 30,
            daemon_socket: None,
            model_path: None,
            vocab_path: None,
        }
    }
}

impl Config {
    /// Reads every recognized variable, falling back to the default (with a
    /// `warn!`) on parse failure rather than panicking.
    pub fn from_env() -> Self {
        let mut cfg = Config::default();

        if let Ok(p) = std::env::var("STORE_PATH") {
            cfg.store_path = PathBuf::from(p);
        }
        cfg.hot_capacity = env_usize("HOT_CAPACITY", cfg.hot_capacity);
        cfg.warm_capacity = env_usize("WARM_CAPACITY", cfg.warm_capacity);
        cfg.decay_interval_ms = env_u64("DECAY_INTERVAL_MS", cfg.decay_interval_ms);
        cfg.checkpoint_interval_ms = env_u64("CHECKPOINT_INTERVAL_MS", cfg.checkpoint_interval_ms);
        cfg.prune_threshold = env_f32("PRUNE_THRESHOLD", cfg.prune_threshold);
        cfg.max_wait_seconds = env_u64("MAX_WAIT_SECONDS", cfg.max_wait_seconds);
        cfg.skip_bm25 = std::env::var("SKIP_BM25")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        cfg.daemon_socket = std::env::var("DAEMON_SOCKET").ok().map(PathBuf::from);
        cfg.model_path = std::env::var("MODEL_PATH").ok().map(PathBuf::from);
        cfg.vocab_path = std::env::var("VOCAB_PATH").ok().map(PathBuf::from);

        cfg
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            warn!(key, value = %v, "malformed usize env var, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            warn!(key, value = %v, "malformed u64 env var, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    match std::env::var(key) {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            warn!(key, value = %v, "malformed f32 env var, using default");
            default
        }),
        Err(_) => default,
    }
}

fn default_store_path() -> PathBuf {
    ProjectDirs::from("dev", "memonic", "memonic")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| PathBuf::from(".memonic/store"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let cfg = Config::default();
        assert!(cfg.hot_capacity > 0);
        assert!(cfg.warm_capacity >= cfg.hot_capacity);
        assert!(cfg.prune_threshold > 0.0 && cfg.prune_threshold < 1.0);
    }
}
