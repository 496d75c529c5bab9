//! Typed settings and the store they are loaded from.
//!
//! The on-disk format is the JSON document shared with the display and audio
//! front-ends. Only the sections the game core needs are modelled here; any
//! other section is left alone, including when the store writes back.
//!
//! ```json
//! {
//!     "serial": {"port": "/dev/ttyACM0", "baudrate": 9600, "timeout": 0.1, "auto_detect": false},
//!     "game": {"ball_draw_delay": 3000, "default_pattern": "horizontal"},
//!     "colors": {"ball_colors": {"B": [65, 105, 225]}}
//! }
//! ```
//!
//! Every field has a default, so a partial or empty document is valid.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::ball::BallPalette;
use crate::card::PatternKind;
use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DRAW_DELAY_MS, DEFAULT_PORT, DEFAULT_READ_TIMEOUT_SECS, MAX_BALL,
};
use crate::error::{Error, Result};

/// Settings read by the game core.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub serial: SerialSettings,
    pub game: GameSettings,
    pub colors: ColorSettings,
}

/// Serial link to the ball machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path or name, e.g. `/dev/ttyACM0` or `COM3`.
    pub port: String,

    /// Line speed in bits per second.
    pub baudrate: u32,

    /// Read timeout in seconds.
    pub timeout: f64,

    /// Scan for the device instead of using `port`.
    pub auto_detect: bool,
}

impl SerialSettings {
    /// Read timeout as a [`Duration`]; unusable values give the default.
    pub fn read_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_READ_TIMEOUT_SECS))
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_READ_TIMEOUT_SECS,
            auto_detect: false,
        }
    }
}

/// Game rules and pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub max_balls: u8,

    /// Milliseconds between automatic draws.
    pub ball_draw_delay: u64,

    /// Patterns offered to the settings screen.
    pub winning_patterns: Vec<PatternKind>,

    /// Pattern that wins a game.
    pub default_pattern: PatternKind,
}

impl GameSettings {
    pub fn draw_interval(&self) -> Duration {
        Duration::from_millis(self.ball_draw_delay)
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_balls: MAX_BALL,
            ball_draw_delay: DEFAULT_DRAW_DELAY_MS,
            winning_patterns: vec![
                PatternKind::Horizontal,
                PatternKind::Vertical,
                PatternKind::Diagonal,
                PatternKind::FourCorners,
                PatternKind::FullCard,
            ],
            default_pattern: PatternKind::Horizontal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub ball_colors: BallPalette,
}

impl Settings {
    /// Parse and validate a JSON settings document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is not valid JSON, carries
    /// an unknown pattern identifier, or fails [`Settings::validate`].
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self> {
        let settings: Settings =
            serde_json::from_value(value).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.serial.baudrate == 0 {
            return Err(Error::Config("serial.baudrate must be > 0".into()));
        }
        if !self.serial.timeout.is_finite() || self.serial.timeout < 0.0 {
            return Err(Error::Config("serial.timeout must be a non-negative number".into()));
        }
        if self.game.ball_draw_delay == 0 {
            return Err(Error::Config("game.ball_draw_delay must be > 0".into()));
        }
        if self.game.max_balls == 0 || self.game.max_balls > MAX_BALL {
            return Err(Error::Config(format!(
                "game.max_balls must be 1-{MAX_BALL}, got {}",
                self.game.max_balls
            )));
        }
        Ok(())
    }
}

/// Source of [`Settings`] that also accepts the auto-detected port back.
pub trait SettingsStore {
    /// Load and validate settings.
    fn load(&mut self) -> Result<Settings>;

    /// Persist `port` as `serial.port`, leaving every other value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigPersist`] when the write fails.
    fn persist_port(&mut self, port: &str) -> Result<()>;
}

/// Load settings from `store`, falling back to defaults on any error.
pub fn load_or_default(store: &mut dyn SettingsStore) -> Settings {
    match store.load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Error loading settings: {} - using defaults", e);
            Settings::default()
        }
    }
}

/// Settings kept in a JSON file.
///
/// The raw document is cached on load so that [`persist_port`] only patches
/// `serial.port`.
///
/// [`persist_port`]: SettingsStore::persist_port
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    document: Option<Value>,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist_error(&self, reason: impl ToString) -> Error {
        Error::ConfigPersist {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn write_document(&self, document: &Value) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        document
            .serialize(&mut serializer)
            .map_err(|e| self.persist_error(e))?;
        fs::write(&self.path, buffer).map_err(|e| self.persist_error(e))
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&mut self) -> Result<Settings> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Settings file {} not found, using defaults",
                    self.path.display()
                );
                self.document = None;
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };

        self.document = None;
        let document: Value =
            serde_json::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        // Kept even when validation fails so a later port write only touches
        // `serial.port`.
        self.document = Some(document.clone());
        let settings = Settings::from_value(document)?;
        debug!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }

    fn persist_port(&mut self, port: &str) -> Result<()> {
        let mut document = self
            .document
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let root = document
            .as_object_mut()
            .ok_or_else(|| self.persist_error("settings document is not a JSON object"))?;
        let serial = root
            .entry("serial")
            .or_insert_with(|| Value::Object(Map::new()));
        let serial = serial
            .as_object_mut()
            .ok_or_else(|| self.persist_error("\"serial\" is not a JSON object"))?;
        serial.insert("port".to_string(), Value::String(port.to_string()));

        self.write_document(&document)?;
        info!("Saved detected port {} to settings", port);
        self.document = Some(document);
        Ok(())
    }
}

/// In-memory store for tests and runs without a settings file.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    settings: Settings,
    persisted_port: Option<String>,
    fail_persist: bool,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            persisted_port: None,
            fail_persist: false,
        }
    }

    /// Make every later [`SettingsStore::persist_port`] call fail.
    pub fn failing(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    /// Last port handed to [`SettingsStore::persist_port`].
    pub fn persisted_port(&self) -> Option<&str> {
        self.persisted_port.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&mut self) -> Result<Settings> {
        self.settings.validate()?;
        Ok(self.settings.clone())
    }

    fn persist_port(&mut self, port: &str) -> Result<()> {
        if self.fail_persist {
            return Err(Error::ConfigPersist {
                path: PathBuf::from("<memory>"),
                reason: "store is read-only".to_string(),
            });
        }
        self.settings.serial.port = port.to_string();
        self.persisted_port = Some(port.to_string());
        Ok(())
    }
}
