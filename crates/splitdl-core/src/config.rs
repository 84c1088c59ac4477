use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration loaded from `~/.config/splitdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitdlConfig {
    /// Number of concurrent segment fetchers per download.
    pub workers: usize,
    /// Hard timeout for the HEAD probe, in seconds.
    pub probe_timeout_secs: u64,
    /// Connect and stall timeout for each ranged GET, in seconds.
    pub request_timeout_secs: u64,
    /// Upper bound on the size of one body chunk handed to storage.
    pub chunk_size: usize,
    /// Minimum delay between two progress redraws, in milliseconds.
    pub progress_interval_ms: u64,
    /// Narrowest progress bar ever drawn, whatever the terminal width.
    pub min_bar_width: usize,
    /// Widest filename shown on the progress line.
    pub max_filename_width: usize,
    /// How many `name.N.ext` candidates to try before overwriting.
    pub max_unique_attempts: u32,
}

impl Default for SplitdlConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            probe_timeout_secs: 10,
            request_timeout_secs: 30,
            chunk_size: 32 * 1024,
            progress_interval_ms: 100,
            min_bar_width: 10,
            max_filename_width: 30,
            max_unique_attempts: 1000,
        }
    }
}

impl SplitdlConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be at least 1");
        }
        if self.probe_timeout_secs == 0 || self.request_timeout_secs == 0 {
            anyhow::bail!("timeouts must be at least 1 second");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("splitdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SplitdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SplitdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SplitdlConfig =
        toml::from_str(&data).with_context(|| format!("invalid config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
