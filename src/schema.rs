use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use hostexec::LOCALHOST;

use crate::error::ConfigError;
use crate::paths;

/// Program invoked for every install/start/stop/cell operation unless overridden
pub const DEFAULT_AFSUTIL: &str = "afsutil";

/// Time server used by the clock sync phase unless overridden
pub const DEFAULT_CLOCK_SERVER: &str = "pool.ntp.org";

/// Directory receiving setup.log, teardown.log and login.log unless overridden
pub const DEFAULT_LOG_DIR: &str = "output";

// ============================================================================
// Config File Schema
// ============================================================================

/// The afsrobot configuration file as written on disk
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Path to the afsutil program on every host
    #[serde(default)]
    pub afsutil: Option<String>,

    /// Directory for run logs
    #[serde(default)]
    pub log_dir: Option<String>,

    /// NTP server for hosts with `setclock`
    #[serde(default)]
    pub clock_server: Option<String>,

    #[serde(default)]
    pub cell: CellSection,

    #[serde(default)]
    pub kerberos: KerberosSection,

    #[serde(default)]
    pub ssh: SshSection,

    /// Extra server process flags passed verbatim to cell creation
    #[serde(default)]
    pub server_options: BTreeMap<String, String>,

    /// One `[host.<name>]` table per cluster member, in file order
    #[serde(default, rename = "host")]
    pub hosts: toml::Table,
}

#[derive(Debug, Deserialize, Default)]
pub struct CellSection {
    pub name: Option<String>,
    pub admin: Option<String>,
    #[serde(default)]
    pub top_volumes: Vec<String>,
    /// CellServDB.dist listing foreign cells
    pub csdb: Option<String>,
    /// Transarc `dest` directory produced by `make dest`
    pub dest: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct KerberosSection {
    pub realm: Option<String>,
    #[serde(default)]
    pub mode: KerberosMode,
    /// AFS service keytab
    pub keytab: Option<String>,
    /// Admin user keytab, for logins in keytab mode
    pub admin_keytab: Option<String>,
    pub enctype: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SshSection {
    pub keyfile: Option<String>,
    pub user: Option<String>,
}

/// Per-host table
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    #[serde(default)]
    pub installer: InstallerKind,
    #[serde(default)]
    pub isfileserver: bool,
    #[serde(default)]
    pub isdbserver: bool,
    #[serde(default)]
    pub isclient: bool,
    #[serde(default)]
    pub setclock: bool,
    #[serde(default)]
    pub nuke: bool,
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub dynroot: bool,
    pub dest: Option<String>,
    pub srcdir: Option<String>,
}

// ============================================================================
// Roles and Components
// ============================================================================

/// How binaries get onto a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerKind {
    /// Not managed: never installed, started, stopped or removed
    #[default]
    None,
    /// Transarc-style paths (/usr/afs, /usr/vice, /usr/afsws)
    Transarc,
}

impl InstallerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallerKind::None => "none",
            InstallerKind::Transarc => "transarc",
        }
    }
}

/// How the admin obtains credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KerberosMode {
    /// Forge tickets from a local service key; no KDC needed
    #[default]
    Impersonate,
    /// Real key/ticket exchange with the realm's KDC
    Keytab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    FileServer,
    DatabaseServer,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FileServer => "file-server",
            Role::DatabaseServer => "database-server",
            Role::Client => "client",
        }
    }
}

/// Unit of install/start/stop/remove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Server,
    Client,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::Server, Component::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Server => "server",
            Component::Client => "client",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Typed Cluster Model
// ============================================================================

/// One cluster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSpec {
    pub name: String,
    pub installer: InstallerKind,
    pub is_fileserver: bool,
    pub is_dbserver: bool,
    pub is_client: bool,
    pub setclock: bool,
    pub nuke: bool,
    pub build: bool,
    pub dynroot: bool,
    pub dest: Option<PathBuf>,
    pub srcdir: Option<PathBuf>,
}

impl HostSpec {
    /// Host with no roles and no installer
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            installer: InstallerKind::None,
            is_fileserver: false,
            is_dbserver: false,
            is_client: false,
            setclock: false,
            nuke: false,
            build: false,
            dynroot: false,
            dest: None,
            srcdir: None,
        }
    }

    fn from_section(name: &str, section: HostSection) -> Self {
        Self {
            name: name.to_string(),
            installer: section.installer,
            is_fileserver: section.isfileserver,
            is_dbserver: section.isdbserver,
            is_client: section.isclient,
            setclock: section.setclock,
            nuke: section.nuke,
            build: section.build,
            dynroot: section.dynroot,
            dest: section.dest.as_deref().map(paths::expand),
            srcdir: section.srcdir.as_deref().map(paths::expand),
        }
    }

    pub fn roles(&self) -> Vec<Role> {
        let mut roles = Vec::new();
        if self.is_fileserver {
            roles.push(Role::FileServer);
        }
        if self.is_dbserver {
            roles.push(Role::DatabaseServer);
        }
        if self.is_client {
            roles.push(Role::Client);
        }
        roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::FileServer => self.is_fileserver,
            Role::DatabaseServer => self.is_dbserver,
            Role::Client => self.is_client,
        }
    }

    /// Member of the server group (file server or database server)
    pub fn is_server(&self) -> bool {
        self.is_fileserver || self.is_dbserver
    }

    /// Components to install, start and stop, server first
    pub fn components(&self) -> Vec<Component> {
        let mut components = Vec::new();
        if self.is_server() {
            components.push(Component::Server);
        }
        if self.is_client {
            components.push(Component::Client);
        }
        components
    }

    /// Whether afsrobot installs and controls services on this host at all
    pub fn is_managed(&self) -> bool {
        self.installer != InstallerKind::None
    }

    pub fn is_local(&self) -> bool {
        self.name == LOCALHOST
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSettings {
    pub name: String,
    pub admin: String,
    pub top_volumes: Vec<String>,
    pub csdb: Option<PathBuf>,
    pub dest: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KerberosSettings {
    pub realm: String,
    pub mode: KerberosMode,
    pub keytab: Option<PathBuf>,
    pub admin_keytab: Option<PathBuf>,
    pub enctype: Option<String>,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshSettings {
    pub keyfile: Option<PathBuf>,
    pub user: Option<String>,
}

/// The whole deployment, fixed for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterConfig {
    pub cell: CellSettings,
    pub kerberos: KerberosSettings,
    pub ssh: SshSettings,
    pub server_options: BTreeMap<String, String>,
    pub hosts: Vec<HostSpec>,
    pub afsutil: String,
    pub clock_server: String,
    pub log_dir: PathBuf,
    /// Real name of this machine, substituted for "localhost" in host lists
    pub local_hostname: String,
}

impl ClusterConfig {
    /// Build the typed configuration from a parsed file
    pub fn from_file(file: ConfigFile, local_hostname: &str) -> Result<Self, ConfigError> {
        let name = required(file.cell.name, "cell.name")?;
        let admin = required(file.cell.admin, "cell.admin")?;

        let mut hosts = Vec::with_capacity(file.hosts.len());
        for (host_name, value) in file.hosts {
            if !is_valid_hostname(&host_name) {
                return Err(ConfigError::InvalidHostName(host_name));
            }
            let section: HostSection =
                value
                    .try_into()
                    .map_err(|source: toml::de::Error| ConfigError::InvalidHost {
                        host: host_name.clone(),
                        message: source.to_string(),
                    })?;
            hosts.push(HostSpec::from_section(&host_name, section));
        }
        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }

        let keyfile = file.ssh.keyfile.as_deref().map(paths::expand);
        if keyfile.is_none() && hosts.iter().any(|h| !h.is_local()) {
            return Err(ConfigError::Missing("ssh.keyfile"));
        }

        let realm = file
            .kerberos
            .realm
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| name.to_uppercase());

        Ok(Self {
            cell: CellSettings {
                name,
                admin,
                top_volumes: file.cell.top_volumes,
                csdb: file.cell.csdb.as_deref().map(paths::expand),
                dest: file.cell.dest.as_deref().map(paths::expand),
            },
            kerberos: KerberosSettings {
                realm,
                mode: file.kerberos.mode,
                keytab: file.kerberos.keytab.as_deref().map(paths::expand),
                admin_keytab: file.kerberos.admin_keytab.as_deref().map(paths::expand),
                enctype: non_empty(file.kerberos.enctype),
                secret: non_empty(file.kerberos.secret),
            },
            ssh: SshSettings {
                keyfile,
                user: non_empty(file.ssh.user),
            },
            server_options: file.server_options,
            hosts,
            afsutil: non_empty(file.afsutil).unwrap_or_else(|| DEFAULT_AFSUTIL.to_string()),
            clock_server: non_empty(file.clock_server)
                .unwrap_or_else(|| DEFAULT_CLOCK_SERVER.to_string()),
            log_dir: paths::expand(file.log_dir.as_deref().unwrap_or(DEFAULT_LOG_DIR)),
            local_hostname: local_hostname.to_string(),
        })
    }

    /// Names of hosts carrying `filter` (all hosts when `None`)
    ///
    /// With `resolve_local`, "localhost" is replaced by the real host name,
    /// for lists that will be interpreted on another machine.
    pub fn hostnames(&self, filter: Option<Role>, resolve_local: bool) -> Vec<String> {
        self.hosts
            .iter()
            .filter(|h| filter.is_none_or(|role| h.has_role(role)))
            .map(|h| {
                if resolve_local && h.is_local() {
                    self.local_hostname.clone()
                } else {
                    h.name.clone()
                }
            })
            .collect()
    }

    #[cfg(test)]
    pub fn find_host(&self, name: &str) -> Option<&HostSpec> {
        self.hosts.iter().find(|h| h.name == name)
    }

    /// Hosts afsrobot installs onto, in configuration order
    pub fn managed_hosts(&self) -> impl Iterator<Item = &HostSpec> {
        self.hosts.iter().filter(|h| h.is_managed())
    }

    pub fn uses_impersonation(&self) -> bool {
        self.kerberos.mode == KerberosMode::Impersonate
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    non_empty(value).ok_or(ConfigError::Missing(key))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// DNS-style name: labels of letters, digits and hyphens separated by dots
fn is_valid_hostname(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 253
        && name.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

// ============================================================================
// Tests
// ============================================================================
