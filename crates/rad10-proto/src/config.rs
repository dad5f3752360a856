use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::platform;
use super::protocol::{validate_presets, Preset, PresetError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot serialise config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Preset(#[from] PresetError),
    #[error("controller timeout_ms must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Declaration order is dispatch priority and page order.
    #[serde(rename = "preset", default = "default_presets")]
    pub presets: Vec<Preset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the page's `css/` and `images/`.  Served as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

/// Which adapter talks to MPD.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Shell out to the `mpc` command-line client.
    #[default]
    Mpc,
    /// Speak the MPD text protocol over TCP.
    Mpd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Explicit mpc path.  Searched on PATH when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpc_binary: Option<PathBuf>,
    /// MPD host.  Given to mpc as `--host` and used by the socket backend.
    #[serde(default = "default_mpd_host")]
    pub host: String,
    #[serde(default = "default_mpd_port")]
    pub port: u16,
    /// Upper bound for one controller operation.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Percentage points per volume button press.
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Append logs to `<data_dir>/rad10-web.log` instead of stderr.
    #[serde(default)]
    pub to_file: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            static_dir: None,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            mpc_binary: None,
            host: default_mpd_host(),
            port: default_mpd_port(),
            timeout_ms: default_timeout_ms(),
            volume_step: default_volume_step(),
        }
    }
}

impl ControllerConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    pub fn mpd_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_mpd_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mpd_port() -> u16 {
    6600
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_volume_step() -> u8 {
    10
}

pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "triple_j",
            "http://live-radio01.mediahubaustralia.com/2TJW/aac/",
        ),
        Preset::new(
            "coderadio",
            "https://coderadio-admin.freecodecamp.org/radio/8010/radio.mp3",
        ),
        Preset::new("proton", "http://www.protonradio.com:8000/schedule"),
        Preset::new("nightride_fm", "https://stream.nightride.fm/nightride.m4a"),
        Preset::new("rekt_fm", "https://stream.nightride.fm/rekt.m4a"),
    ]
}

impl Config {
    /// Load from the default location, writing a default file on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            info!("Wrote default config to {:?}", config_path);
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load an explicit file.  A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        validate_presets(&self.presets)?;
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn log_path() -> PathBuf {
        platform::data_dir().join("rad10-web.log")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            controller: ControllerConfig::default(),
            logging: LoggingConfig::default(),
            presets: default_presets(),
        }
    }
}
