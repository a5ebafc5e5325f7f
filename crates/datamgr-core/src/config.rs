use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// libcurl tuning for the production downloader (`[download]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_timeout_secs: u64,
    /// Upper bound on a whole transfer, in seconds.
    pub timeout_secs: u64,
    /// Maximum number of redirects followed per request.
    pub max_redirections: u32,
    /// Abort when the rate stays below this many bytes/sec ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 3600,
            max_redirections: 10,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
        }
    }
}

impl DownloadConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

/// Resolution policy for the data manager (`[manager]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// When a candidate URL fails to download, try the next one in order.
    /// When false only the first candidate is attempted.
    pub url_fallback: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self { url_fallback: true }
    }
}

/// Global configuration loaded from `~/.config/datamgr/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatamgrConfig {
    /// Directory downloaded files are stored in. Defaults to
    /// `$XDG_CACHE_HOME/datamgr/files`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// SQLite cache index. Defaults to `$XDG_STATE_HOME/datamgr/cache.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
}

impl DatamgrConfig {
    /// Configured cache dir, or the XDG default.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("datamgr")?;
        Ok(xdg_dirs.get_cache_home().join("datamgr").join("files"))
    }

    /// Configured database path, or the XDG default.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        crate::storage::default_db_path()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("datamgr")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DatamgrConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DatamgrConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DatamgrConfig = toml::from_str(&data)?;
    Ok(cfg)
}
