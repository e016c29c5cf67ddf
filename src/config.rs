//! Configuration file support for BallCurator.
//!
//! Settings are stored as versioned JSON in the platform config directory.
//! Every section falls back to its defaults when absent, so older or partial
//! files keep loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ballcurator_ui::KeyCode;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CLICK_SLOP, DEFAULT_CROP_SCALE, DEFAULT_GRID_COLUMNS, DEFAULT_GRID_GAP, DEFAULT_GROWTH_FACTOR,
    DEFAULT_LONG_PRESS_MS, DEFAULT_MAXIMIZE_DURATION_MS, DEFAULT_MIN_COMMIT_RADIUS,
    DEFAULT_PREFETCH_MARGIN, DEFAULT_RENDER_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_URL,
    DEFAULT_TELEMETRY_FLUSH_WINDOW_MS, LONG_PRESS_SLOP, MIN_CROP_HALF_EXTENT_FACTOR,
};
use crate::coords::CropTransform;
use crate::editor::EditorSettings;
use crate::grid::{GridLayout, GridMode};
use crate::keybindings::KeyBindings;
use crate::maximize::MaximizeSettings;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub maximize: MaximizeConfig,

    #[serde(default)]
    pub keybindings: KeyBindingsConfig,

    #[serde(default)]
    pub preferences: UserPreferences,
}

fn default_app_name() -> String {
    "BallCurator".to_string()
}

/// Backend connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the image/annotation server
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Circle editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Crop half-extent as a multiple of the circle radius
    pub crop_scale: f32,
    /// Thumbnail edge length in screen pixels
    pub render_size: f32,
    /// Drags at or below this radius clear the circle
    pub min_commit_radius: f32,
    /// Radius multiplier for a modifier-click
    pub growth_factor: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            crop_scale: DEFAULT_CROP_SCALE,
            render_size: DEFAULT_RENDER_SIZE,
            min_commit_radius: DEFAULT_MIN_COMMIT_RADIUS,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl EditorConfig {
    pub fn transform(&self) -> CropTransform {
        CropTransform::new(self.crop_scale, self.render_size)
            .with_min_half_extent(self.min_commit_radius * MIN_CROP_HALF_EXTENT_FACTOR)
    }

    pub fn settings(&self) -> EditorSettings {
        EditorSettings {
            transform: self.transform(),
            min_commit_radius: self.min_commit_radius,
            growth_factor: self.growth_factor,
            click_slop: CLICK_SLOP,
        }
    }
}

/// Grid layout and virtualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: usize,
    /// Gap between cells in pixels
    pub gap: f32,
    /// Pre-fetch margin as a fraction of the viewport size
    pub prefetch_margin: f32,
    /// Show static markers instead of editors
    pub read_only: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            gap: DEFAULT_GRID_GAP,
            prefetch_margin: DEFAULT_PREFETCH_MARGIN,
            read_only: false,
        }
    }
}

impl GridConfig {
    /// Layout for square cells of `cell_size` pixels.
    pub fn layout(&self, cell_size: f32) -> GridLayout {
        GridLayout::new(self.columns, cell_size, self.gap)
    }

    pub fn mode(&self) -> GridMode {
        if self.read_only {
            GridMode::ReadOnly
        } else {
            GridMode::Editable
        }
    }
}

/// Interaction telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// Accumulation window in milliseconds
    pub flush_window_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flush_window_ms: DEFAULT_TELEMETRY_FLUSH_WINDOW_MS,
        }
    }
}

impl TelemetryConfig {
    pub fn flush_window(&self) -> Duration {
        Duration::from_millis(self.flush_window_ms)
    }
}

/// Maximize/minimize behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaximizeConfig {
    /// Hold time before a press maximizes, in milliseconds
    pub long_press_ms: u64,
    /// Transition length in milliseconds
    pub duration_ms: u64,
}

impl Default for MaximizeConfig {
    fn default() -> Self {
        Self {
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            duration_ms: DEFAULT_MAXIMIZE_DURATION_MS,
        }
    }
}

impl MaximizeConfig {
    pub fn settings(&self) -> MaximizeSettings {
        MaximizeSettings {
            long_press: Duration::from_millis(self.long_press_ms),
            long_press_slop: LONG_PRESS_SLOP,
            duration: Duration::from_millis(self.duration_ms),
            ..Default::default()
        }
    }
}

/// User preferences section of the config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Keybinding configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindingsConfig {
    pub jump_last_removed: KeyCode,
    pub jump_last_cleared: KeyCode,
    pub dismiss: KeyCode,
}

impl Default for KeyBindingsConfig {
    fn default() -> Self {
        Self::from(&KeyBindings::default())
    }
}

impl From<&KeyBindings> for KeyBindingsConfig {
    fn from(bindings: &KeyBindings) -> Self {
        Self {
            jump_last_removed: bindings.jump_last_removed,
            jump_last_cleared: bindings.jump_last_cleared,
            dismiss: bindings.dismiss,
        }
    }
}

impl KeyBindingsConfig {
    pub fn to_keybindings(&self) -> KeyBindings {
        KeyBindings {
            jump_last_removed: self.jump_last_removed,
            jump_last_cleared: self.jump_last_cleared,
            dismiss: self.dismiss,
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            server: ServerConfig::default(),
            editor: EditorConfig::default(),
            grid: GridConfig::default(),
            telemetry: TelemetryConfig::default(),
            maximize: MaximizeConfig::default(),
            keybindings: KeyBindingsConfig::default(),
            preferences: UserPreferences::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default config filename.
    pub fn default_filename() -> &'static str {
        "ballcurator-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("ballcurator").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("ballcurator")
                    .join(Self::default_filename())
            })
        }
    }

    /// Read and parse a configuration file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load `path` if given, else the default path, falling back to defaults
    /// when the file is missing or invalid.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    log::debug!("No config directory available; using defaults");
                    return Self::default();
                }
            },
        };

        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}; using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.server.base_url, "http://localhost:8000/");
        assert_eq!(config.editor.crop_scale, 2.0);
        assert_eq!(config.editor.min_commit_radius, 2.0);
        assert_eq!(config.grid.columns, 5);
        assert_eq!(config.telemetry.flush_window(), Duration::from_millis(1000));
        assert_eq!(config.maximize.settings().long_press, Duration::from_millis(200));
        assert_eq!(config.keybindings.to_keybindings(), KeyBindings::default());
    }

    #[test]
    fn test_round_trip() {
        let mut config = AppConfig::default();
        config.grid.read_only = true;
        config.keybindings.dismiss = KeyCode::Q;
        config.preferences.log_level = LogLevel::Trace;

        let json = config.to_json().unwrap();
        let back = AppConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.grid.mode(), GridMode::ReadOnly);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::from_json(
            r#"{"version": 1, "editor": {"crop_scale": 3.0}, "preferences": {"log_level": "debug"}}"#,
        )
        .unwrap();
        assert_eq!(config.editor.crop_scale, 3.0);
        assert_eq!(config.editor.render_size, 200.0);
        assert_eq!(config.preferences.log_level, LogLevel::Debug);
        assert_eq!(config.app_name, "BallCurator");
        assert!(config.telemetry.enabled);
    }

    #[test]
    fn test_version_too_new() {
        let err = AppConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VersionTooNew {
                file_version: 99,
                ..
            }
        ));
    }

    #[test]
    fn test_editor_settings_follow_config() {
        let mut config = EditorConfig::default();
        config.min_commit_radius = 5.0;
        config.render_size = 100.0;
        let settings = config.settings();
        assert_eq!(settings.min_commit_radius, 5.0);
        assert_eq!(settings.transform.render_size, 100.0);
        assert_eq!(settings.transform.min_half_extent, 20.0);
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(AppConfig::default_filename());
        let config = AppConfig::load_or_default(Some(&path));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_or_default_with_broken_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(AppConfig::default_filename());
        std::fs::write(&path, "{ not json").expect("write config");
        assert_eq!(AppConfig::load_or_default(Some(&path)), AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.server.base_url = "http://example.org/".to_string();
        config.save_to(&path).expect("save config");

        assert_eq!(AppConfig::load_from(&path).expect("load config"), config);
        assert_eq!(AppConfig::load_or_default(Some(&path)), config);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
    }
}
