//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement.
//! This enables picking up `pspreview.toml` edits during a live preview.

use crate::config::PsConfig;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<PsConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(PsConfig::default()));

/// Hash of the current config file content.
static CONFIG_HASH: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn cfg() -> Arc<PsConfig> {
    CONFIG.load_full()
}

/// Reload config from disk if content changed.
///
/// Returns `Ok(true)` if config was updated, `Ok(false)` if unchanged.
pub fn reload_config() -> Result<bool> {
    let c = cfg();
    let cli = c.cli.context("config reloaded before initialization")?;

    let content = std::fs::read_to_string(&c.config_path)?;
    let new_hash = hash(&content);
    if new_hash == CONFIG_HASH.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let new_config = PsConfig::load(cli)?;
    CONFIG.store(Arc::new(new_config));
    CONFIG_HASH.store(new_hash, Ordering::Relaxed);

    Ok(true)
}

pub fn init_config(config: PsConfig) -> Arc<PsConfig> {
    if let Ok(content) = std::fs::read_to_string(&config.config_path) {
        CONFIG_HASH.store(hash(&content), Ordering::Relaxed);
    }

    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}

fn hash(content: &str) -> u64 {
    use rustc_hash::FxHasher;
    use std::hash::Hasher;

    let mut hasher = FxHasher::default();
    hasher.write(content.as_bytes());
    hasher.finish()
}
