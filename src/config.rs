//! Loading and validating the cluster configuration

use std::fs::{self, File};
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::{ClusterConfig, ConfigFile, KerberosMode};

/// Load the configuration at `path` for a run on this machine
pub fn load(path: &Path) -> Result<ClusterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let local_hostname = hostexec::local_hostname().map_err(ConfigError::Hostname)?;
    let config = parse(&content, path, &local_hostname)?;
    check_files(&config)?;
    log::debug!(
        "Loaded {} with {} hosts (local host is {})",
        path.display(),
        config.hosts.len(),
        config.local_hostname
    );
    Ok(config)
}

/// Parse configuration text without touching the filesystem
pub fn parse(content: &str, path: &Path, local_hostname: &str) -> Result<ClusterConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;
    ClusterConfig::from_file(file, local_hostname)
}

/// Files read on this machine must be readable before anything runs
fn check_files(config: &ClusterConfig) -> Result<(), ConfigError> {
    if config.hosts.iter().any(|h| !h.is_local())
        && let Some(keyfile) = &config.ssh.keyfile
    {
        check_readable("ssh key file", keyfile)?;
    }

    // In impersonate mode the service keytab is produced by fakekey during setup.
    if config.kerberos.mode == KerberosMode::Keytab {
        if let Some(keytab) = &config.kerberos.keytab {
            check_readable("service keytab", keytab)?;
        }
        if let Some(admin_keytab) = &config.kerberos.admin_keytab {
            check_readable("admin keytab", admin_keytab)?;
        }
    }

    if let Some(csdb) = &config.cell.csdb {
        check_readable("CellServDB.dist", csdb)?;
    }
    Ok(())
}

fn check_readable(what: &'static str, path: &Path) -> Result<(), ConfigError> {
    File::open(path)
        .map(drop)
        .map_err(|source| ConfigError::Unreadable {
            what,
            path: path.to_path_buf(),
            source,
        })
}
