//! Path resolution for afsrobot
//!
//! # Environment Variables
//!
//! - `AFSROBOT_CONFIG` - Configuration file to load (same as `--config`)
//!
//! # Config File Resolution Priority
//!
//! 1. `--config` flag or `AFSROBOT_CONFIG` environment variable
//! 2. `./afsrobot.toml` in the current directory
//! 3. `XDG_CONFIG_HOME/afsrobot/afsrobot.toml` (if set)
//! 4. Platform default:
//!    - Windows: `%APPDATA%\afsrobot\afsrobot.toml`
//!    - macOS/Linux: `~/.config/afsrobot/afsrobot.toml`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const ENV_CONFIG: &str = "AFSROBOT_CONFIG";

/// Config file name, both in the working directory and the config directory
pub const CONFIG_FILE_NAME: &str = "afsrobot.toml";

/// Locate the configuration file
///
/// `explicit` comes from `--config` (clap folds `AFSROBOT_CONFIG` into it).
/// The returned path is not checked for existence beyond the working
/// directory probe; loading reports a missing file.
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    // 1. Explicit flag or environment
    if let Some(path) = explicit {
        let path = expand(&path.to_string_lossy());
        log::debug!("Using config file from command line: {}", path.display());
        return Ok(path);
    }

    // 2. Working directory
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        log::debug!("Using config file in working directory");
        return Ok(local);
    }

    // 3. / 4. Per-user config directory
    let path = config_dir()?.join(CONFIG_FILE_NAME);
    log::debug!("Using default config file: {}", path.display());
    Ok(path)
}

/// Per-user afsrobot config directory
fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Ok(PathBuf::from(xdg_config).join("afsrobot"));
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("afsrobot"));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("afsrobot"))
}

/// Expand ~ and environment variables in a path string.
///
/// Every path read from the configuration file goes through here.
///
/// # Examples
///
/// ```ignore
/// use crate::paths;
///
/// let keyfile = paths::expand("~/.ssh/id_rsa");
/// let dest = paths::expand("$HOME/openafs/amd64_linux26/dest");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
