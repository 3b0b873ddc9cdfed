//! Configuration management for the studio file gateway
//!
//! Separates startup configuration (requires restart) from the gateway configuration
//! (can be updated at runtime through the `/config` endpoint).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_PORT: u16 = 9527;
pub const DEFAULT_TRANSCODE_QUALITY: u8 = 95;

/// Complete configuration with startup/runtime separation
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub server: StartupConfig,
    pub gateway: GatewayConfig,
}

/// Configuration that requires a restart to take effect
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    /// Reduce log output to warnings and errors
    #[serde(default)]
    pub quiet: bool,
}

/// Gateway behaviour that can be changed while the server is running.
///
/// Roots are always held in expanded absolute form; `image_root` and `video_root`
/// are `None` when the primary root should be used instead.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GatewayConfig {
    pub primary_root: PathBuf,
    #[serde(default)]
    pub image_root: Option<PathBuf>,
    #[serde(default)]
    pub video_root: Option<PathBuf>,
    pub auto_create_dir: bool,
    pub allow_overwrite: bool,
    pub transcode_enabled: bool,
    pub transcode_quality: u8,
}

/// Thread-safe gateway configuration wrapper
pub type SharedGatewayConfig = Arc<RwLock<GatewayConfig>>;

/// Partial update accepted by `UpdateConfig`. Absent keys leave the current value alone.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(alias = "save_path")]
    pub primary_root: Option<String>,
    #[serde(alias = "image_save_path")]
    pub image_root: Option<String>,
    #[serde(alias = "video_save_path")]
    pub video_root: Option<String>,
    #[serde(alias = "auto_create_dir")]
    pub auto_create_dir: Option<bool>,
    #[serde(alias = "allow_overwrite")]
    pub allow_overwrite: Option<bool>,
    #[serde(alias = "convert_png_to_jpg")]
    pub transcode_enabled: Option<bool>,
    #[serde(alias = "jpg_quality")]
    pub transcode_quality: Option<f64>,
}

/// Effective configuration as reported to callers: category roots fall back to the
/// primary root when unset.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    pub primary_root: String,
    pub image_root: String,
    pub video_root: String,
    pub auto_create_dir: bool,
    pub allow_overwrite: bool,
    pub transcode_enabled: bool,
    pub transcode_quality: u8,
}

impl ServerConfig {
    /// Load configuration from defaults, an optional config.toml and environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_paths = ["studio-file-gateway/config", "config"];

        let mut builder = Config::builder()
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.quiet", false)?
            .set_default(
                "gateway.primary_root",
                default_primary_root().to_string_lossy().to_string(),
            )?
            .set_default("gateway.auto_create_dir", true)?
            .set_default("gateway.allow_overwrite", false)?
            .set_default("gateway.transcode_enabled", true)?
            .set_default("gateway.transcode_quality", i64::from(DEFAULT_TRANSCODE_QUALITY))?;

        for config_path in config_paths {
            builder = builder.add_source(File::with_name(config_path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("STUDIO_GATEWAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        config.gateway = config.gateway.normalized();
        Ok(config)
    }

    /// Split into startup (immutable) and gateway (mutable) parts
    pub fn split(self) -> (StartupConfig, SharedGatewayConfig) {
        let gateway = Arc::new(RwLock::new(self.gateway));
        (self.server, gateway)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.port == 0 {
            return Err(config::ConfigError::Message("Port cannot be 0".into()));
        }

        if self.gateway.primary_root.as_os_str().is_empty() {
            return Err(config::ConfigError::Message(
                "primary_root cannot be empty".into(),
            ));
        }

        if !(1..=100).contains(&self.gateway.transcode_quality) {
            return Err(config::ConfigError::Message(
                "transcode_quality must be between 1 and 100".into(),
            ));
        }

        Ok(())
    }
}

impl StartupConfig {
    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Prefix of every retrieval reference handed back to the browser
    pub fn file_url_prefix(&self) -> String {
        format!("http://{}:{}/file/", self.bind_address, self.port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::with_primary_root(default_primary_root())
    }
}

impl GatewayConfig {
    /// Default settings rooted at `primary_root`
    pub fn with_primary_root(primary_root: impl Into<PathBuf>) -> Self {
        Self {
            primary_root: primary_root.into(),
            image_root: None,
            video_root: None,
            auto_create_dir: true,
            allow_overwrite: false,
            transcode_enabled: true,
            transcode_quality: DEFAULT_TRANSCODE_QUALITY,
        }
    }

    /// Expand home shortcuts and drop empty category roots
    pub fn normalized(mut self) -> Self {
        self.primary_root = expand_root(&self.primary_root);
        self.image_root = self.image_root.as_deref().and_then(optional_root);
        self.video_root = self.video_root.as_deref().and_then(optional_root);
        self
    }

    /// Merge the keys present in `update`; returns the names of the keys that changed
    pub fn apply(&mut self, update: &ConfigUpdate) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(path) = update.primary_root.as_deref() {
            // An empty primary root is ignored, it must always be set
            if !path.trim().is_empty() {
                self.primary_root = expand_root(Path::new(path));
                changed.push("primaryRoot");
            }
        }
        if let Some(path) = update.image_root.as_deref() {
            self.image_root = optional_root(Path::new(path));
            changed.push("imageRoot");
        }
        if let Some(path) = update.video_root.as_deref() {
            self.video_root = optional_root(Path::new(path));
            changed.push("videoRoot");
        }
        if let Some(flag) = update.auto_create_dir {
            self.auto_create_dir = flag;
            changed.push("autoCreateDir");
        }
        if let Some(flag) = update.allow_overwrite {
            self.allow_overwrite = flag;
            changed.push("allowOverwrite");
        }
        if let Some(flag) = update.transcode_enabled {
            self.transcode_enabled = flag;
            changed.push("transcodeEnabled");
        }
        if let Some(quality) = update.transcode_quality {
            self.transcode_quality = clamp_quality(quality);
            changed.push("transcodeQuality");
        }

        changed
    }

    /// Root used for image assets
    pub fn image_root_or_primary(&self) -> &Path {
        self.image_root.as_deref().unwrap_or(&self.primary_root)
    }

    /// Root used for video assets
    pub fn video_root_or_primary(&self) -> &Path {
        self.video_root.as_deref().unwrap_or(&self.primary_root)
    }

    pub fn effective(&self) -> EffectiveConfig {
        EffectiveConfig {
            primary_root: path_string(&self.primary_root),
            image_root: path_string(self.image_root_or_primary()),
            video_root: path_string(self.video_root_or_primary()),
            auto_create_dir: self.auto_create_dir,
            allow_overwrite: self.allow_overwrite,
            transcode_enabled: self.transcode_enabled,
            transcode_quality: self.transcode_quality,
        }
    }
}

/// Clamp a requested quality to 1..=100
pub fn clamp_quality(quality: f64) -> u8 {
    if quality.is_nan() {
        return DEFAULT_TRANSCODE_QUALITY;
    }
    quality.round().clamp(1.0, 100.0) as u8
}

/// `~/Downloads/StudioGateway`, or a relative fallback when no home directory is known
pub fn default_primary_root() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join("Downloads").join("StudioGateway"),
        None => PathBuf::from("./studio_gateway"),
    }
}

/// Expand `~` and make the path absolute against the current directory
pub fn expand_root(path: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };

    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    }
}

fn optional_root(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        None
    } else {
        Some(expand_root(path))
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
