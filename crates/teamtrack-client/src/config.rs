// Configuration for the schedule client.
//
// Layout under the base directory:
//
//   config/teamtrack.toml      backend, calendar and logging settings
//   config/credentials.toml    optional bearer token, never shipped
//   defaults/                  templates installed into config/ on first run

use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use teamtrack_core::schedule::WeekStart;
use thiserror::Error;

const CONFIG_DIR: &str = "config";
const DEFAULTS_DIR: &str = "defaults";
const SETTINGS_FILE: &str = "teamtrack.toml";
const CREDENTIALS_FILE: &str = "credentials.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("{path} is not valid: {source}")]
    Syntax {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error("no config/ or defaults/ directory under {0}")]
    NoConfigDir(PathBuf),

    #[error("cannot install default settings into {dir}: {source}")]
    Install { dir: PathBuf, source: io::Error },
}

impl ConfigError {
    /// The settings file (or its directory) does not exist yet.
    pub fn is_missing(&self) -> bool {
        match self {
            ConfigError::Read { source, .. } => source.kind() == io::ErrorKind::NotFound,
            ConfigError::NoConfigDir(_) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub calendar: CalendarConfig,
    pub logging: LoggingConfig,
    pub credentials: CredentialsConfig,
}

/// Raw deserialization target for teamtrack.toml.
#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    backend: BackendConfig,
    #[serde(default)]
    calendar: CalendarConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub week_start: WeekStart,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Write logs here instead of stderr.
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    /// Firebase ID token sent as a bearer token.
    pub id_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read and validate the settings under `base_dir/config`. A missing
/// credentials file means "no token". Nothing is installed.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join(CONFIG_DIR);
    let settings: SettingsFile = read_toml(&config_dir.join(SETTINGS_FILE))?;

    let credentials_path = config_dir.join(CREDENTIALS_FILE);
    let credentials = if credentials_path.is_file() {
        read_toml(&credentials_path)?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        backend: settings.backend,
        calendar: settings.calendar,
        logging: settings.logging,
        credentials,
    };
    validate(&config)?;
    Ok(config)
}

/// Install missing defaults, then load from `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    install_defaults(base_dir)?;
    load_config_from(base_dir)
}

/// Where to look for `config/` when no directory is given: the current
/// directory if it has `config/` or `defaults/`, else the per-user config dir.
pub fn default_base_dir() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if cwd.join(CONFIG_DIR).exists() || cwd.join(DEFAULTS_DIR).exists() {
        return cwd;
    }
    directories::ProjectDirs::from("org", "teamtrack", "teamtrack")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or(cwd)
}

// ---------------------------------------------------------------------------
// First-run install
// ---------------------------------------------------------------------------

/// Copy each template in `defaults/` into `config/` unless a file of that
/// name is already there. Returns what was installed.
///
/// A base directory with `config/` but no `defaults/` is a normal install
/// and needs nothing.
pub fn install_defaults(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join(DEFAULTS_DIR);
    let config_dir = base_dir.join(CONFIG_DIR);
    if !defaults_dir.is_dir() {
        return if config_dir.is_dir() {
            Ok(Vec::new())
        } else {
            Err(ConfigError::NoConfigDir(base_dir.to_path_buf()))
        };
    }

    let install_err = |source: io::Error| ConfigError::Install {
        dir: config_dir.clone(),
        source,
    };
    fs::create_dir_all(&config_dir).map_err(install_err)?;

    let mut installed = Vec::new();
    for template in templates(&defaults_dir).map_err(install_err)? {
        let Some(name) = template.file_name() else {
            continue;
        };
        let target = config_dir.join(name);
        if copy_if_absent(&template, &target).map_err(install_err)? {
            installed.push(target);
        }
    }
    Ok(installed)
}

/// Regular files in `dir`, minus `*.example` samples that are filled in by
/// hand.
fn templates(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension() != Some(OsStr::new("example")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `create_new` makes this a no-op when the user already has the file.
fn copy_if_absent(src: &Path, target: &Path) -> io::Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(mut dest) => {
            io::copy(&mut File::open(src)?, &mut dest)?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Syntax {
        path: path.to_path_buf(),
        source,
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = config.backend.base_url.trim();
    let scheme_ok = url.starts_with("http://") || url.starts_with("https://");
    if !scheme_ok {
        return Err(ConfigError::Invalid {
            field: "backend.base_url",
            message: format!("expected an http:// or https:// URL, got {url:?}"),
        });
    }
    if config.backend.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            field: "backend.timeout_secs",
            message: "must be at least 1".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
