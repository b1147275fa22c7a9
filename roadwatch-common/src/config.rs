//! Configuration loading and run-mode resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (applied by the caller)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! The run mode is resolved once at startup and decides which backend
//! adapter the repository uses for the whole process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::{Error, Result};

/// Default port of the local REST service
pub const DEFAULT_LOCAL_PORT: u16 = 3001;

/// Loopback alias of the host machine inside the Android emulator
pub const ANDROID_EMULATOR_HOST: &str = "10.0.2.2";

/// Public REST endpoint of the managed document store
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

pub const ENV_MODE: &str = "ROADWATCH_MODE";
pub const ENV_API_URL: &str = "ROADWATCH_API_URL";
pub const ENV_BROWSER_HOST: &str = "ROADWATCH_BROWSER_HOST";
pub const ENV_DEV_HOST: &str = "ROADWATCH_DEV_HOST";
pub const ENV_ANDROID_EMULATOR: &str = "ROADWATCH_ANDROID_EMULATOR";
pub const ENV_PROJECT_ID: &str = "ROADWATCH_FIREBASE_PROJECT_ID";
pub const ENV_API_KEY: &str = "ROADWATCH_FIREBASE_API_KEY";
pub const ENV_EMULATOR_HOST: &str = "FIRESTORE_EMULATOR_HOST";

/// Which backend a process talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Local REST service
    #[default]
    #[serde(alias = "dev", alias = "local")]
    Development,
    /// Managed document store
    #[serde(alias = "prod", alias = "remote")]
    Production,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Development => f.write_str("development"),
            RunMode::Production => f.write_str("production"),
        }
    }
}

impl FromStr for RunMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(RunMode::Development),
            "production" | "prod" | "remote" => Ok(RunMode::Production),
            other => Err(Error::Config(format!(
                "Unknown run mode '{}' (expected development or production)",
                other
            ))),
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub mode: Option<RunMode>,
    pub local: LocalSection,
    pub remote: RemoteSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalSection {
    pub api_url: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub emulator_host: Option<String>,
    pub base_url: Option<String>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// First existing platform config file, if any
    pub fn default_path() -> Option<PathBuf> {
        let user_config = dirs::config_dir().map(|d| d.join("roadwatch").join("config.toml"));
        if let Some(path) = user_config {
            if path.exists() {
                return Some(path);
            }
        }

        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/roadwatch/config.toml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }
}

/// Where the client runs, used to find the local REST service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEnvironment {
    /// Browser build: use the page's own hostname
    Browser { hostname: String },
    /// Device attached to a dev server; `host_uri` is `ip:port` of the dev machine
    DevServer { host_uri: String },
    /// Android emulator: host loopback is reachable at 10.0.2.2
    AndroidEmulator,
    /// Same machine as the service
    Loopback,
}

impl HostEnvironment {
    /// Detect from the process environment
    pub fn detect() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Detect using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(hostname) = present(ENV_BROWSER_HOST) {
            return HostEnvironment::Browser { hostname };
        }
        if let Some(host_uri) = present(ENV_DEV_HOST) {
            return HostEnvironment::DevServer { host_uri };
        }
        if let Some(flag) = present(ENV_ANDROID_EMULATOR) {
            if matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
                return HostEnvironment::AndroidEmulator;
            }
        }
        HostEnvironment::Loopback
    }

    /// Host name or address of the machine running the service
    pub fn host(&self) -> String {
        match self {
            HostEnvironment::Browser { hostname } => hostname.clone(),
            HostEnvironment::DevServer { host_uri } => host_uri
                .split(':')
                .next()
                .filter(|ip| !ip.is_empty())
                .unwrap_or("localhost")
                .to_string(),
            HostEnvironment::AndroidEmulator => ANDROID_EMULATOR_HOST.to_string(),
            HostEnvironment::Loopback => "localhost".to_string(),
        }
    }

    pub fn api_url(&self, port: u16) -> String {
        format!("http://{}:{}", self.host(), port)
    }
}

/// Settings for the local REST adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    /// Explicit base URL; overrides environment detection
    pub api_url: Option<String>,
    pub port: u16,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            port: DEFAULT_LOCAL_PORT,
        }
    }
}

/// Settings for the managed document store adapter
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub database: String,
    pub collection: String,
    /// `host:port` of a local emulator; replaces `base_url`
    pub emulator_host: Option<String>,
    pub base_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            database: "(default)".to_string(),
            collection: "sightings".to_string(),
            emulator_host: None,
            base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("emulator_host", &self.emulator_host)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Everything needed to build the repository for one run
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub mode: RunMode,
    pub local: LocalConfig,
    pub remote: RemoteConfig,
    pub host_environment: HostEnvironment,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            local: LocalConfig::default(),
            remote: RemoteConfig::default(),
            host_environment: HostEnvironment::Loopback,
        }
    }
}

impl BackendConfig {
    /// Resolve from the process environment and config file
    pub fn resolve(cli_mode: Option<RunMode>, config_path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(cli_mode, config_path, |key| std::env::var(key).ok())
    }

    /// Resolve with an arbitrary environment lookup.
    ///
    /// An explicit `config_path` must exist; the platform default file is
    /// optional and its absence only logs a warning.
    pub fn resolve_with(
        cli_mode: Option<RunMode>,
        config_path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let toml_config = match config_path {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                TomlConfig::load(path)?
            }
            None => match TomlConfig::default_path() {
                Some(path) => {
                    info!("Loading config file: {}", path.display());
                    TomlConfig::load(&path)?
                }
                None => {
                    warn!("No config file found, using defaults");
                    TomlConfig::default()
                }
            },
        };

        let env = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = match cli_mode {
            Some(mode) => mode,
            None => match env(ENV_MODE) {
                Some(value) => value.parse()?,
                None => toml_config.mode.unwrap_or_default(),
            },
        };

        let local = LocalConfig {
            api_url: env(ENV_API_URL).or(toml_config.local.api_url),
            port: toml_config.local.port.unwrap_or(DEFAULT_LOCAL_PORT),
        };

        let defaults = RemoteConfig::default();
        let section = toml_config.remote;
        let remote = RemoteConfig {
            project_id: env(ENV_PROJECT_ID).or(section.project_id),
            api_key: env(ENV_API_KEY).or(section.api_key),
            database: section.database.unwrap_or(defaults.database),
            collection: section.collection.unwrap_or(defaults.collection),
            emulator_host: env(ENV_EMULATOR_HOST).or(section.emulator_host),
            base_url: section.base_url.unwrap_or(defaults.base_url),
        };

        let host_environment = HostEnvironment::from_lookup(&lookup);

        Ok(Self {
            mode,
            local,
            remote,
            host_environment,
        })
    }

    /// Base URL of the local REST service
    pub fn local_api_url(&self) -> String {
        match &self.local.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.host_environment.api_url(self.local.port),
        }
    }
}
