//! Configuration file handling for gesture-loop.
//!
//! Loads configuration from `<config dir>/gesture-loop/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::FrameFilter;
use crate::classifier::{DEFAULT_INPUT_SIZE, MAX_INPUT_SIZE};
use crate::gesture::{Gesture, LabelTable, DEFAULT_THRESHOLD};
use crate::recognizer::{RecognizerSettings, DEFAULT_DELAY, DEFAULT_TIMEOUT};

/// Configuration file structure for gesture-loop.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    #[serde(default, rename = "loop")]
    pub cycle: LoopConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Extra or overriding `label = "gesture"` mappings
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoopConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Camera device index; takes precedence over `images`
    #[serde(default)]
    pub camera: Option<u32>,
    /// Flip camera frames left-right like a front camera preview
    #[serde(default = "default_mirror_camera")]
    pub mirror_camera: bool,
    /// Image file or directory to replay as the frame source
    #[serde(default)]
    pub images: Option<PathBuf>,
    /// Pre-filter (`saturation=1.0`, `mirror`, `none`)
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera: None,
            mirror_camera: default_mirror_camera(),
            images: None,
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifierConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// ONNX model path
    #[serde(default)]
    pub model: Option<PathBuf>,
    /// Labels file, one label per line in model output order
    #[serde(default)]
    pub labels: Option<PathBuf>,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    /// Recorded results to replay instead of running a model
    #[serde(default)]
    pub replay: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            model: None,
            labels: None,
            input_size: default_input_size(),
            replay: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct DisplayConfig {
    /// Print the gesture name next to the glyph
    #[serde(default)]
    pub show_label: bool,
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY.as_millis() as u64
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_mirror_camera() -> bool {
    true
}

fn default_filter() -> String {
    "saturation=1".to_string()
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_input_size() -> u32 {
    DEFAULT_INPUT_SIZE
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            Self::from_toml(&content, &path)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Render as TOML (for `config show` / `config init`).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Parsed pre-filter. `none` (or empty) disables filtering.
    pub fn filter(&self) -> Result<Option<FrameFilter>, ConfigError> {
        let name = self.capture.filter.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        FrameFilter::from_str(name)
            .map(Some)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown filter '{}'", name)))
    }

    /// Default label table with the threshold and `[labels]` overrides applied.
    pub fn label_table(&self) -> Result<LabelTable, ConfigError> {
        let threshold = self.classifier.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }
        let mut table = LabelTable::with_threshold(threshold);
        for (label, name) in &self.labels {
            let gesture = Gesture::from_str(name).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "label '{}' maps to unknown gesture '{}' (expected empty, open-hand or fist)",
                    label, name
                ))
            })?;
            table.insert(label.clone(), gesture);
        }
        Ok(table)
    }

    /// Model input side length, checked against what preprocessing can handle.
    pub fn input_size(&self) -> Result<u32, ConfigError> {
        let size = self.classifier.input_size;
        if !(1..=MAX_INPUT_SIZE).contains(&size) {
            return Err(ConfigError::Invalid(format!(
                "input_size must be between 1 and {}, got {}",
                MAX_INPUT_SIZE, size
            )));
        }
        Ok(size)
    }

    /// Everything the recognizer needs, validated.
    pub fn recognizer_settings(&self) -> Result<RecognizerSettings, ConfigError> {
        if self.cycle.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be greater than 0".to_string()));
        }
        Ok(RecognizerSettings {
            delay: Duration::from_millis(self.cycle.delay_ms),
            timeout: Duration::from_millis(self.cycle.timeout_ms),
            filter: self.filter()?,
            table: self.label_table()?,
        })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("gesture-loop").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/gesture-loop/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cycle.delay_ms, 100);
        assert_eq!(config.cycle.timeout_ms, 2000);
        assert_eq!(config.classifier.threshold, 0.01);
        assert_eq!(config.classifier.input_size, 227);
        assert_eq!(config.filter().unwrap(), Some(FrameFilter::Saturation(1.0)));
        assert!(!config.display.show_label);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("", Path::new("config.toml")).unwrap();
        assert_eq!(config.cycle.delay_ms, 100);
        assert_eq!(config.capture.filter, "saturation=1");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
[loop]
delay_ms = 500

[capture]
filter = "none"

[labels]
"fist-UB-LHand" = "fist"
"#,
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(config.cycle.delay_ms, 500);
        assert_eq!(config.cycle.timeout_ms, 2000);
        assert_eq!(config.filter().unwrap(), None);
        assert_eq!(
            config.label_table().unwrap().lookup("fist-UB-LHand"),
            Some(Gesture::Fist)
        );
    }

    #[test]
    fn test_unknown_gesture_in_labels_is_invalid() {
        let mut config = Config::default();
        config.labels.insert("peace".to_string(), "victory".to_string());
        let err = config.label_table().unwrap_err();
        assert!(err.to_string().contains("victory"));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = Config::default();
        config.classifier.threshold = 1.5;
        assert!(matches!(config.label_table(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let mut config = Config::default();
        config.cycle.timeout_ms = 0;
        assert!(config.recognizer_settings().is_err());
    }

    #[test]
    fn test_input_size_bounds() {
        let mut config = Config::default();
        assert_eq!(config.input_size().unwrap(), 227);

        config.classifier.input_size = 0;
        assert!(matches!(config.input_size(), Err(ConfigError::Invalid(_))));

        config.classifier.input_size = 70_000;
        let err = config.input_size().unwrap_err();
        assert!(err.to_string().contains("70000"));

        config.classifier.input_size = MAX_INPUT_SIZE;
        assert_eq!(config.input_size().unwrap(), MAX_INPUT_SIZE);
    }

    #[test]
    fn test_camera_section() {
        let config = Config::from_toml(
            "[capture]\ncamera = 1\nmirror_camera = false\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(config.capture.camera, Some(1));
        assert!(!config.capture.mirror_camera);
        assert!(Config::default().capture.mirror_camera);
    }

    #[test]
    fn test_bad_filter_is_invalid() {
        let mut config = Config::default();
        config.capture.filter = "sepia".to_string();
        assert!(config.filter().is_err());
    }

    #[test]
    fn test_recognizer_settings() {
        let mut config = Config::default();
        config.cycle.delay_ms = 250;
        config.cycle.timeout_ms = 1000;
        let settings = config.recognizer_settings().unwrap();
        assert_eq!(settings.delay, Duration::from_millis(250));
        assert_eq!(settings.timeout, Duration::from_secs(1));
        assert_eq!(settings.table.threshold(), 0.01);
    }

    #[test]
    fn test_to_toml_round_trip() {
        let mut config = Config::default();
        config.cycle.delay_ms = 300;
        config.labels.insert("thumb".to_string(), "open-hand".to_string());
        let text = config.to_toml().unwrap();
        let parsed = Config::from_toml(&text, Path::new("config.toml")).unwrap();
        assert_eq!(parsed.cycle.delay_ms, 300);
        assert_eq!(parsed.labels.get("thumb").map(String::as_str), Some("open-hand"));
    }

    #[test]
    fn test_parse_error_mentions_path() {
        let err = Config::from_toml("[loop\n", Path::new("/tmp/bad.toml")).unwrap_err();
        assert!(err.to_string().contains("/tmp/bad.toml"));
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_path();
        assert!(path.ends_with("gesture-loop/config.toml"));
    }
}
