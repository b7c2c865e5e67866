//! Configuration loading and XDG path helpers.
//!
//! Layering, lowest to highest precedence: built-in defaults, system
//! config (`/etc/xdg/blobproc/settings.toml`), the user's XDG config
//! dir, a `config/settings.toml` next to the working directory, an
//! explicit `BLOBPROC_CONFIG_FILE` override, and finally `BLOBPROC__`
//! environment variables (`BLOBPROC__SERVER__LISTEN_ADDR=...`).

use std::{env, path::PathBuf, time::Duration};

use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

const LOCAL_CONFIG_PATH: &str = "config/settings.toml";
const ETC_CONFIG_ENV: &str = "BLOBPROC_ETC_CONFIG_DIR";
const CONFIG_OVERRIDE_ENV: &str = "BLOBPROC_CONFIG_FILE";
const ETC_CONFIG_DEFAULT: &str = "/etc/xdg";

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("unable to resolve project directories")]
    MissingProjectDirs,
    #[error(transparent)]
    Build(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub spool: SpoolConfig,
    pub s3: S3Config,
    pub grobid: GrobidConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Uploads are refused while free disk falls below this percentage.
    pub min_free_disk_percent: u64,
    /// Maximum accepted upload size in bytes; 0 disables the cap.
    pub max_file_size: u64,
    /// Path of the optional URL audit database; absent disables it.
    #[serde(default)]
    pub urlmap_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpoolConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub default_bucket: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GrobidConfig {
    pub host: String,
    /// Files above this size are not sent to the remote service.
    pub max_file_size: u64,
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    pub workers: usize,
    pub timeout_secs: u64,
    pub keep_spool: bool,
}

impl ProcessingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn load() -> Result<AppConfig, AppConfigError> {
    let dirs = project_dirs()?;
    let default_spool = dirs.data_dir().join("spool");
    let mut builder = Config::builder()
        .set_default("server.listen_addr", "0.0.0.0:8000")?
        .set_default("server.min_free_disk_percent", 10_i64)?
        .set_default("server.max_file_size", 0_i64)?
        .set_default("spool.dir", default_spool.to_string_lossy().to_string())?
        .set_default("s3.endpoint", "http://localhost:9000")?
        .set_default("s3.access_key", "minioadmin")?
        .set_default("s3.secret_key", "minioadmin")?
        .set_default("s3.default_bucket", "sandcrawler")?
        .set_default("grobid.host", "http://localhost:8070")?
        .set_default("grobid.max_file_size", 268_435_456_i64)?
        .set_default("grobid.enabled", true)?
        .set_default("processing.workers", 4_i64)?
        .set_default("processing.timeout_secs", 300_i64)?
        .set_default("processing.keep_spool", false)?;

    for path in base_config_paths(&dirs) {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
    }

    if let Some(override_path) = config_override_path()? {
        builder = builder.add_source(
            File::from(override_path)
                .format(FileFormat::Toml)
                .required(true),
        );
    }

    builder = builder.add_source(Environment::with_prefix("BLOBPROC").separator("__"));

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn project_dirs() -> Result<ProjectDirs, AppConfigError> {
    ProjectDirs::from("org", "archive", "blobproc").ok_or(AppConfigError::MissingProjectDirs)
}

fn base_config_paths(dirs: &ProjectDirs) -> [PathBuf; 3] {
    let etc_root = etc_config_dir();
    [
        etc_root.join("blobproc").join("settings.toml"),
        dirs.config_dir().join("settings.toml"),
        PathBuf::from(LOCAL_CONFIG_PATH),
    ]
}

fn config_override_path() -> Result<Option<PathBuf>, AppConfigError> {
    match env::var_os(CONFIG_OVERRIDE_ENV) {
        None => Ok(None),
        Some(raw) => {
            let path = PathBuf::from(raw);
            if path.as_os_str().is_empty() {
                return Err(invalid_config("BLOBPROC_CONFIG_FILE must not be empty"));
            }
            Ok(Some(path))
        }
    }
}

fn etc_config_dir() -> PathBuf {
    match env::var_os(ETC_CONFIG_ENV) {
        Some(raw) => {
            let path = PathBuf::from(&raw);
            if path.as_os_str().is_empty() {
                PathBuf::from(ETC_CONFIG_DEFAULT)
            } else {
                path
            }
        }
        None => PathBuf::from(ETC_CONFIG_DEFAULT),
    }
}

fn validate_config(config: &AppConfig) -> Result<(), AppConfigError> {
    let addr = config.server.listen_addr.trim();
    if addr.is_empty() {
        return Err(invalid_config("server.listen_addr must not be empty"));
    }
    if addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(invalid_config(format!(
            "invalid server.listen_addr `{addr}`"
        )));
    }
    if config.server.min_free_disk_percent > 100 {
        return Err(invalid_config(
            "server.min_free_disk_percent must be between 0 and 100",
        ));
    }
    if config.processing.workers == 0 {
        return Err(invalid_config("processing.workers must be at least 1"));
    }
    if config.spool.dir.as_os_str().is_empty() {
        return Err(invalid_config("spool.dir must not be empty"));
    }
    Ok(())
}

fn invalid_config<S: Into<String>>(message: S) -> AppConfigError {
    AppConfigError::Build(config::ConfigError::Message(message.into()))
}
