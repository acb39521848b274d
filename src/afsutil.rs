//! Command lines for the afsutil tool and the few system commands around it
//!
//! Every builder is a pure function of the configuration. A flag whose value
//! is absent is left out entirely; no builder emits a flag with an empty value.

use std::path::Path;

use crate::schema::{ClusterConfig, Component, HostSpec, KerberosMode, Role};

/// Binary distribution installed by `afsutil install`
const DIST: &str = "transarc";

struct Args(Vec<String>);

impl Args {
    fn new(program: &str, subcommand: &str) -> Self {
        Self(vec![program.to_string(), subcommand.to_string()])
    }

    fn arg(mut self, value: impl Into<String>) -> Self {
        self.0.push(value.into());
        self
    }

    fn flag(self, name: &str) -> Self {
        self.arg(name)
    }

    /// `--name value`, skipped when the value is absent or empty
    fn opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.arg(name).arg(v),
            _ => self,
        }
    }

    fn val(self, name: &str, value: &str) -> Self {
        self.opt(name, Some(value))
    }

    fn opt_path(self, name: &str, value: Option<&Path>) -> Self {
        let value = value.map(|p| p.display().to_string());
        self.opt(name, value.as_deref())
    }

    /// `--name v1 v2 ...`, skipped when there are no values
    fn list<S: AsRef<str>>(mut self, name: &str, values: &[S]) -> Self {
        if values.is_empty() {
            return self;
        }
        self.0.push(name.to_string());
        self.0.extend(values.iter().map(|v| v.as_ref().to_string()));
        self
    }

    fn build(self) -> Vec<String> {
        self.0
    }
}

fn component_names(components: &[Component]) -> Vec<&'static str> {
    components.iter().map(Component::as_str).collect()
}

/// Install this host's components from the Transarc `dest` tree
pub fn install_args(config: &ClusterConfig, host: &HostSpec) -> Vec<String> {
    let dest = host.dest.as_deref().or(config.cell.dest.as_deref());
    let mut args = Args::new(&config.afsutil, "install")
        .val("--dist", DIST)
        .list("--components", &component_names(&host.components()))
        .val("--cell", &config.cell.name)
        .val("--realm", &config.kerberos.realm)
        .list("--hosts", &config.hostnames(Some(Role::DatabaseServer), true))
        .opt_path("--dir", dest)
        .opt_path("--csdb", config.cell.csdb.as_deref());
    if host.nuke {
        args = args.flag("--force");
    }
    args.build()
}

/// Create the cell, mount root volumes and create the top-level volumes
pub fn newcell_args(config: &ClusterConfig) -> Vec<String> {
    let mut args = Args::new(&config.afsutil, "newcell")
        .val("--cell", &config.cell.name)
        .val("--admin", &config.cell.admin)
        .list("--top", &config.cell.top_volumes)
        .list("--fs", &config.hostnames(Some(Role::FileServer), true))
        .list("--db", &config.hostnames(Some(Role::DatabaseServer), true));
    for (key, value) in &config.server_options {
        args = args.arg("-o").arg(format!("{key}={value}"));
    }
    args.build()
}

/// Write a service key for synthetic credentials
pub fn fakekey_args(config: &ClusterConfig) -> Vec<String> {
    let k = &config.kerberos;
    Args::new(&config.afsutil, "fakekey")
        .val("--cell", &config.cell.name)
        .val("--realm", &k.realm)
        .opt_path("--keytab", k.keytab.as_deref())
        .opt("--enctype", k.enctype.as_deref())
        .opt("--secret", k.secret.as_deref())
        .build()
}

/// Obtain an admin token on this machine
pub fn login_args(config: &ClusterConfig) -> Vec<String> {
    let k = &config.kerberos;
    let args = Args::new(&config.afsutil, "login")
        .val("--user", &config.cell.admin)
        .val("--cell", &config.cell.name)
        .val("--realm", &k.realm);
    let args = match k.mode {
        KerberosMode::Impersonate => args
            .flag("--akimpersonate")
            .opt_path("--keytab", k.keytab.as_deref()),
        KerberosMode::Keytab => args.opt_path("--keytab", k.admin_keytab.as_deref()),
    };
    args.build()
}

pub fn start_args(config: &ClusterConfig, component: Component) -> Vec<String> {
    Args::new(&config.afsutil, "start")
        .arg(component.as_str())
        .build()
}

pub fn stop_args(config: &ClusterConfig, components: &[Component]) -> Vec<String> {
    let mut args = Args::new(&config.afsutil, "stop");
    for component in components {
        args = args.arg(component.as_str());
    }
    args.build()
}

/// Uninstall components, including their configuration and data
pub fn remove_args(config: &ClusterConfig, components: &[Component]) -> Vec<String> {
    Args::new(&config.afsutil, "remove")
        .list("--components", &component_names(components))
        .flag("--purge")
        .build()
}

/// Compile binaries from the host's source tree
pub fn build_args(config: &ClusterConfig, host: &HostSpec) -> Vec<String> {
    Args::new(&config.afsutil, "build")
        .opt_path("--chdir", host.srcdir.as_deref())
        .build()
}

/// One-shot clock sync against the configured time server
pub fn clock_args(config: &ClusterConfig) -> Vec<String> {
    Args::new("ntpdate", "-u").arg(&config.clock_server).build()
}

/// No-op used to prove ssh and non-interactive sudo work on a host
pub fn probe_args() -> Vec<String> {
    vec!["true".to_string()]
}
