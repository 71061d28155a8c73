//! Runtime options, read from a TOML file next to the user's config.
//!
//! Every field has a default, so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{default_colors, ColorDefinition, ColorRegistry};
use crate::error::Result;
use crate::mark::{Section, Thickness, ToolAttrs};
use crate::report::ReportQuoting;
use crate::transform::{ZOOM_MIN, ZOOM_STEP};

/// Click radius around a mark centre, in image pixels.
pub const MARK_RADIUS: f32 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub zoom_step: f32,
    pub zoom_min: f32,
    /// Drawn radius and hit radius of a mark, in image pixels.
    pub mark_radius: f32,
    pub report_quoting: ReportQuoting,
    pub default_thickness: Option<Thickness>,
    pub default_section: Section,
    /// Registry order is report row order.
    pub colors: Vec<ColorDefinition>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            zoom_step: ZOOM_STEP,
            zoom_min: ZOOM_MIN,
            mark_radius: MARK_RADIUS,
            report_quoting: ReportQuoting::default(),
            default_thickness: None,
            default_section: Section::Whole,
            colors: default_colors(),
        }
    }
}

impl Options {
    /// Parse options, replacing out-of-range values with defaults.
    pub fn parse(content: &str) -> Result<Self> {
        let mut options: Options = toml::from_str(content)?;
        options.sanitize();
        Ok(options)
    }

    /// Load from `path`, falling back to defaults if missing or malformed.
    pub fn load_from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(options) => {
                    log::info!("Options loaded from {}", path.display());
                    options
                }
                Err(e) => {
                    log::warn!("Options file is invalid, using defaults: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No options file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        log::info!("Options saved to {}", path.display());
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mark-tally")
            .join("options.toml")
    }

    pub fn registry(&self) -> ColorRegistry {
        ColorRegistry::new(self.colors.clone())
    }

    /// Take over the session's color labels and the chosen quoting, so the
    /// next save keeps them.
    pub fn remember(&mut self, registry: &ColorRegistry, quoting: ReportQuoting) {
        self.colors = registry.iter().cloned().collect();
        self.report_quoting = quoting;
    }

    /// Tool attributes for the first mark of a session.
    pub fn initial_tool(&self, registry: &ColorRegistry) -> ToolAttrs {
        ToolAttrs::new(registry.first().key().clone())
            .with_thickness(self.default_thickness)
            .with_section(self.default_section)
    }

    /// Copy with out-of-range values replaced by defaults.
    pub(crate) fn sanitized(&self) -> Self {
        let mut options = self.clone();
        options.sanitize();
        options
    }

    fn sanitize(&mut self) {
        let defaults = Self::default();
        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0) {
            log::warn!("zoom_step must be positive, using {}", defaults.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }
        if !(self.zoom_min.is_finite() && self.zoom_min > 0.0) {
            log::warn!("zoom_min must be positive, using {}", defaults.zoom_min);
            self.zoom_min = defaults.zoom_min;
        }
        if !(self.mark_radius.is_finite() && self.mark_radius > 0.0) {
            log::warn!("mark_radius must be positive, using {}", defaults.mark_radius);
            self.mark_radius = defaults.mark_radius;
        }
        if self.colors.is_empty() {
            log::warn!("No colors configured, using built-in colors");
            self.colors = defaults.colors;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let options = Options::parse("zoom_step = 0.25\n").unwrap();
        assert_eq!(options.zoom_step, 0.25);
        assert_eq!(options.zoom_min, ZOOM_MIN);
        assert_eq!(options.colors, default_colors());
    }

    #[test]
    fn test_colors_and_defaults_from_file() {
        let options = Options::parse(
            r#"
default_thickness = 40
default_section = "half-horizontal"
report_quoting = "raw"

[[colors]]
key = "white"
label = "White"
rgb = [250, 250, 250]

[[colors]]
key = "black"
label = "Black"
rgb = [0, 0, 0]
"#,
        )
        .unwrap();
        let registry = options.registry();
        let keys: Vec<&str> = registry.iter().map(|c| c.key().as_str()).collect();
        assert_eq!(keys, vec!["white", "black"]);
        assert_eq!(options.report_quoting, ReportQuoting::Raw);

        let tool = options.initial_tool(&registry);
        assert_eq!(tool.color.as_str(), "white");
        assert_eq!(tool.thickness, Some(Thickness::Mm40));
        assert_eq!(tool.section, Section::HalfHorizontal);
    }

    #[test]
    fn test_invalid_thickness_is_an_error() {
        assert!(Options::parse("default_thickness = 35\n").is_err());
    }

    #[test]
    fn test_non_positive_zoom_falls_back() {
        let options = Options::parse("zoom_min = 0.0\nzoom_step = -1.0\n").unwrap();
        assert_eq!(options.zoom_min, ZOOM_MIN);
        assert_eq!(options.zoom_step, ZOOM_STEP);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.toml");
        std::fs::write(&path, "zoom_step = [").unwrap();
        assert_eq!(Options::load_from_file(&path), Options::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("options.toml");
        let mut options = Options::default();
        options.mark_radius = 20.0;
        options.default_thickness = Some(Thickness::Mm30);
        options.save_to_file(&path).unwrap();
        assert_eq!(Options::load_from_file(&path), options);
    }

    #[test]
    fn test_saved_labels_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.toml");
        let mut options = Options::default();
        let mut registry = options.registry();
        registry.set_label(&"yellow".into(), "Wheat, dry");
        options.remember(&registry, ReportQuoting::Raw);
        options.save_to_file(&path).unwrap();

        let loaded = Options::load_from_file(&path);
        assert_eq!(loaded.report_quoting, ReportQuoting::Raw);
        assert_eq!(loaded.registry().label(&"yellow".into()), Some("Wheat, dry"));
        assert_eq!(loaded.registry(), registry);
    }
}
