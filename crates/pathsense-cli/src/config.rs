//! Configuration Vault – reads/writes `~/.pathsense/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Supported map storage backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Json => write!(f, "json"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Persisted user configuration stored in `~/.pathsense/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the map document lives on disk.
    #[serde(default = "default_map_path")]
    pub map_path: String,

    /// Map storage backend.
    #[serde(default)]
    pub storage_backend: StorageBackend,

    /// Seconds between automatic map saves.
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,

    /// Metres within which route endpoints snap to a mapped node.
    #[serde(default = "default_snap_radius_m")]
    pub snap_radius_m: f64,
}

fn default_map_path() -> String {
    "~/.pathsense/map.json".to_string()
}
fn default_save_interval_secs() -> u64 {
    600
}
fn default_snap_radius_m() -> f64 {
    25.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map_path: default_map_path(),
            storage_backend: StorageBackend::default(),
            save_interval_secs: default_save_interval_secs(),
            snap_radius_m: default_snap_radius_m(),
        }
    }
}

impl Config {
    /// `map_path` with a leading `~/` expanded against `$HOME`.
    pub fn resolved_map_path(&self) -> PathBuf {
        if let Some(rest) = self.map_path.strip_prefix("~/") {
            return PathBuf::from(home_dir()).join(rest);
        }
        PathBuf::from(&self.map_path)
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

/// Return the path to `~/.pathsense/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".pathsense").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `PATHSENSE_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `PATHSENSE_MAP_PATH` | `map_path` |
/// | `PATHSENSE_STORAGE` | `storage_backend` (`json` or `sqlite`) |
/// | `PATHSENSE_SAVE_INTERVAL_SECS` | `save_interval_secs` |
/// | `PATHSENSE_SNAP_RADIUS_M` | `snap_radius_m` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PATHSENSE_MAP_PATH") {
        cfg.map_path = v;
    }
    if let Ok(v) = std::env::var("PATHSENSE_STORAGE") {
        match v.to_ascii_lowercase().as_str() {
            "json" => cfg.storage_backend = StorageBackend::Json,
            "sqlite" => cfg.storage_backend = StorageBackend::Sqlite,
            _ => {}
        }
    }
    if let Ok(v) = std::env::var("PATHSENSE_SAVE_INTERVAL_SECS")
        && let Ok(secs) = v.parse::<u64>()
    {
        cfg.save_interval_secs = secs;
    }
    if let Ok(v) = std::env::var("PATHSENSE_SNAP_RADIUS_M")
        && let Ok(radius) = v.parse::<f64>()
    {
        cfg.snap_radius_m = radius;
    }
}

/// Save the config to disk, creating `~/.pathsense/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Restrict the config directory to the owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Write the file with owner-only read/write (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
