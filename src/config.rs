//! Configuration module
//!
//! Loads `examseg.toml` from an explicit path or the user config
//! directory and merges command-line overrides on top. Every threshold
//! the engine consults is configurable here; the compiled-in defaults
//! are the empirical values from the segmentation module.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::segment::{
    SegmentOptions, CHOICE_MIN_REGION_HEIGHT, CHOICE_MIN_REGION_WIDTH, DEFAULT_GAP_THRESHOLD,
    DEFAULT_GRID_PADDING, DEFAULT_LAYOUT_STDEV_FACTOR, DEFAULT_LONG_TEXT_THRESHOLD,
    DEFAULT_MARGIN, DEFAULT_MIN_REGION_HEIGHT, DEFAULT_MIN_REGION_WIDTH,
    DEFAULT_OVERLAP_THRESHOLD, FLEXIBLE_MIN_GAP, STRICT_MIN_GAP,
};

// ============================================================
// Error Types
// ============================================================

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Config parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================
// Config Structure
// ============================================================

/// Segmentation thresholds section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Vertical gap that splits two label clusters (px)
    pub gap_threshold: f64,

    /// Margin kept between region edges and neighboring content (px)
    pub margin: f64,

    /// Minimum prompt region width (px)
    pub min_region_width: f64,

    /// Minimum prompt region height (px)
    pub min_region_height: f64,

    /// Minimum choice region width (px)
    pub choice_min_region_width: f64,

    /// Minimum choice region height (px)
    pub choice_min_region_height: f64,

    /// Self-overlap ratio above which a region is a duplicate (0-1)
    pub overlap_threshold: f64,

    /// Vertical/grid stdev factor as a fraction of page width (0-1)
    pub layout_stdev_factor: f64,

    /// Minimum usable gap height for the fallback detector (px)
    pub min_gap: f64,

    /// Characters above which an answer choice is protected prose
    pub long_text_threshold: usize,

    /// Padding applied to grid choice regions after clipping (px)
    pub grid_padding: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            margin: DEFAULT_MARGIN,
            min_region_width: DEFAULT_MIN_REGION_WIDTH,
            min_region_height: DEFAULT_MIN_REGION_HEIGHT,
            choice_min_region_width: CHOICE_MIN_REGION_WIDTH,
            choice_min_region_height: CHOICE_MIN_REGION_HEIGHT,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            layout_stdev_factor: DEFAULT_LAYOUT_STDEV_FACTOR,
            min_gap: STRICT_MIN_GAP,
            long_text_threshold: DEFAULT_LONG_TEXT_THRESHOLD,
            grid_padding: DEFAULT_GRID_PADDING,
        }
    }
}

/// Output section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Render a diagnostic overlay PNG per page
    pub overlay: bool,

    /// Pretty-print result JSON
    pub pretty: bool,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Segmentation thresholds
    pub thresholds: ThresholdConfig,

    /// Output behavior
    pub output: OutputConfig,
}

impl Config {
    /// Load from the user config directory
    /// (`$XDG_CONFIG_HOME/examseg/config.toml`), falling back to defaults
    /// when no file exists.
    pub fn load() -> Result<Self> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(Self::default());
        };
        let path = config_dir.join("examseg").join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values before they reach the engine
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.overlap_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "overlap_threshold must be in 0..=1, got {}",
                t.overlap_threshold
            )));
        }
        if !(0.0..=1.0).contains(&t.layout_stdev_factor) {
            return Err(ConfigError::InvalidValue(format!(
                "layout_stdev_factor must be in 0..=1, got {}",
                t.layout_stdev_factor
            )));
        }
        for (name, value) in [
            ("gap_threshold", t.gap_threshold),
            ("margin", t.margin),
            ("min_gap", t.min_gap),
            ("grid_padding", t.grid_padding),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("min_region_width", t.min_region_width),
            ("min_region_height", t.min_region_height),
            ("choice_min_region_width", t.choice_min_region_width),
            ("choice_min_region_height", t.choice_min_region_height),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Apply command-line overrides; the CLI always wins
    pub fn merge_overrides(&mut self, overrides: &CliOverrides) {
        let t = &mut self.thresholds;
        if let Some(margin) = overrides.margin {
            t.margin = margin;
        }
        if let Some(gap_threshold) = overrides.gap_threshold {
            t.gap_threshold = gap_threshold;
        }
        if let Some(min_gap) = overrides.min_gap {
            t.min_gap = min_gap;
        } else if overrides.flexible {
            t.min_gap = FLEXIBLE_MIN_GAP;
        }
        if let Some(overlap_threshold) = overrides.overlap_threshold {
            t.overlap_threshold = overlap_threshold;
        }
        if overrides.overlay {
            self.output.overlay = true;
        }
        if overrides.pretty {
            self.output.pretty = true;
        }
    }

    /// Build engine options from the thresholds section
    pub fn to_segment_options(&self) -> SegmentOptions {
        let t = &self.thresholds;
        SegmentOptions::builder()
            .gap_threshold(t.gap_threshold)
            .margin(t.margin)
            .min_region_size(t.min_region_width, t.min_region_height)
            .choice_min_region_size(t.choice_min_region_width, t.choice_min_region_height)
            .overlap_threshold(t.overlap_threshold)
            .layout_stdev_factor(t.layout_stdev_factor)
            .min_gap(t.min_gap)
            .long_text_threshold(t.long_text_threshold)
            .grid_padding(t.grid_padding)
            .build()
    }
}

// ============================================================
// CLI Overrides
// ============================================================

/// Overrides collected from command-line flags
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Override the content margin
    pub margin: Option<f64>,

    /// Override the cluster gap threshold
    pub gap_threshold: Option<f64>,

    /// Override the minimum gap height
    pub min_gap: Option<f64>,

    /// Use flexible-mode gap detection (ignored when `min_gap` is set)
    pub flexible: bool,

    /// Override the duplicate overlap threshold
    pub overlap_threshold: Option<f64>,

    /// Force overlay rendering on
    pub overlay: bool,

    /// Force pretty JSON on
    pub pretty: bool,
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_engine_defaults() {
        let config = Config::default();
        let options = config.to_segment_options();

        assert_eq!(options.gap_threshold, 20.0);
        assert_eq!(options.margin, 10.0);
        assert_eq!(options.min_region_width, 50.0);
        assert_eq!(options.min_region_height, 30.0);
        assert_eq!(options.choice_min_region_width, 30.0);
        assert_eq!(options.overlap_threshold, 0.8);
        assert_eq!(options.layout_stdev_factor, 0.1);
        assert_eq!(options.min_gap, 100.0);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [thresholds]
            margin = 12.5
            min_gap = 30.0

            [output]
            overlay = true
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();

        assert_eq!(config.thresholds.margin, 12.5);
        assert_eq!(config.thresholds.min_gap, 30.0);
        // Unspecified values keep their defaults
        assert_eq!(config.thresholds.gap_threshold, 20.0);
        assert!(config.output.overlay);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[thresholds]\nmargin = 8.0\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.thresholds.margin, 8.0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load_from_path(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.thresholds.overlap_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut config = Config::default();
        config.thresholds.min_region_width = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.thresholds.margin = -1.0;
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_from_path_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[thresholds]\noverlap_threshold = 2.0\n").unwrap();

        assert!(matches!(
            Config::load_from_path(&path),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = Config::default();
        let overrides = CliOverrides {
            margin: Some(4.0),
            gap_threshold: Some(25.0),
            overlap_threshold: Some(0.9),
            overlay: true,
            ..Default::default()
        };
        config.merge_overrides(&overrides);

        assert_eq!(config.thresholds.margin, 4.0);
        assert_eq!(config.thresholds.gap_threshold, 25.0);
        assert_eq!(config.thresholds.overlap_threshold, 0.9);
        assert!(config.output.overlay);
    }

    #[test]
    fn test_flexible_flag_sets_min_gap() {
        let mut config = Config::default();
        config.merge_overrides(&CliOverrides {
            flexible: true,
            ..Default::default()
        });
        assert_eq!(config.thresholds.min_gap, FLEXIBLE_MIN_GAP);

        // An explicit min_gap beats the flexible preset
        let mut config = Config::default();
        config.merge_overrides(&CliOverrides {
            flexible: true,
            min_gap: Some(42.0),
            ..Default::default()
        });
        assert_eq!(config.thresholds.min_gap, 42.0);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let encoded = toml::to_string(&config).unwrap();
        let decoded: Config = toml::from_str(&encoded).unwrap();
        assert_eq!(
            decoded.thresholds.gap_threshold,
            config.thresholds.gap_threshold
        );
    }
}
