//! Layered application configuration.
//!
//! Precedence, lowest first: built-in defaults, the YAML file passed with
//! `--config`, `REGISTRAR__*` environment variables (`__` separates nested
//! keys, e.g. `REGISTRAR__SERVER__BIND_ADDR`), then CLI overrides.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use registration::RegistrationConfig;
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "REGISTRAR__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Landing page and other static assets, served for unmatched paths.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            static_dir: default_static_dir(),
            body_limit_bytes: default_body_limit_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 10_000))
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wildcard")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default = "default_wildcard")]
    pub allowed_headers: Vec<String>,
    #[serde(default)]
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: default_wildcard(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: default_wildcard(),
            max_age_seconds: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_wildcard() -> Vec<String> {
    vec!["*".to_owned()]
}

fn default_allowed_methods() -> Vec<String> {
    ["GET", "POST", "OPTIONS"].map(str::to_owned).to_vec()
}

impl AppConfig {
    /// Defaults, then the optional YAML file, then `REGISTRAR__*` variables.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// # Errors
    ///
    /// Fails when a layer holds an unknown key or a value of the wrong type.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::figment(path)
            .extract()
            .context("invalid configuration")
    }

    /// `--port` (or `PORT`) replaces only the port of `server.bind_addr`;
    /// each `-v` raises the log level one step above `info`.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
        }
        match verbose {
            0 => {}
            1 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
    }

    /// # Errors
    ///
    /// Fails if the configuration cannot be rendered as YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_saphyr::to_string(self).context("rendering configuration as YAML")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use registration::StoreConfig;

    fn write_yaml(dir: &tempfile::TempDir, yaml: &str) -> PathBuf {
        let path = dir.path().join("registrar.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn defaults_without_file() {
        let cfg = AppConfig::figment(None)
            .extract::<AppConfig>()
            .unwrap();
        assert_eq!(cfg.server.bind_addr.port(), 10_000);
        assert_eq!(cfg.server.static_dir, PathBuf::from("public"));
        assert_eq!(cfg.server.body_limit_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.logging.format, LogFormat::Text);
        assert!(cfg.cors.enabled);
        assert!(matches!(cfg.registration.store, StoreConfig::Memory));
    }

    #[test]
    fn yaml_overrides_defaults_and_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(
            &dir,
            r#"
server:
  bind_addr: "127.0.0.1:8088"
logging:
  format: json
registration:
  template_path: cards/template.png
  store:
    kind: sheets
    spreadsheet_id: sheet-xyz
"#,
        );

        let cfg = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8088".parse().unwrap());
        assert_eq!(cfg.server.request_timeout_secs, 30);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(
            cfg.registration.template_path,
            PathBuf::from("cards/template.png")
        );
        let StoreConfig::Sheets(sheets) = cfg.registration.store else {
            panic!("expected sheets store");
        };
        assert_eq!(sheets.spreadsheet_id, "sheet-xyz");
        assert_eq!(sheets.sheet_name, "Sheet1");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(&dir, "server:\n  bind_adress: \"0.0.0.0:1\"\n");

        let err = AppConfig::load(Some(&path)).unwrap_err();

        assert!(format!("{err:#}").contains("bind_adress"), "{err:#}");
    }

    #[test]
    fn port_override_keeps_host() {
        let mut cfg = AppConfig::default();
        cfg.server.bind_addr = "127.0.0.1:10000".parse().unwrap();

        cfg.apply_cli_overrides(Some(8080), 0);

        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn verbosity_raises_log_level() {
        let mut cfg = AppConfig::default();
        cfg.apply_cli_overrides(None, 1);
        assert_eq!(cfg.logging.level, "debug");
        cfg.apply_cli_overrides(None, 3);
        assert_eq!(cfg.logging.level, "trace");
    }

    #[test]
    fn yaml_dump_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        cfg.server.bind_addr = "127.0.0.1:9999".parse().unwrap();
        let path = write_yaml(&dir, &cfg.to_yaml().unwrap());

        let loaded = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(loaded.server.bind_addr, cfg.server.bind_addr);
    }
}
