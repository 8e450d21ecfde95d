//! Conversion configuration
//!
//! One [`ConversionConfig`] describes everything a single compilation needs:
//! machine units, speeds, tool commands, pass depth, bed geometry and the
//! layer to select. It is an immutable value handed to the compiler; nothing
//! is shared between compilations.
//!
//! Configuration files may be JSON or TOML. Every field has a default, so a
//! file only needs to list what it changes.

use layercut_core::units::Units;
use layercut_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the machine's (0, 0) sits on the bed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MachineOrigin {
    /// Bottom-left corner (most GRBL lasers)
    BottomLeft,
    /// Top-left corner
    TopLeft,
    /// Bottom-right corner
    BottomRight,
    /// Top-right corner
    TopRight,
    /// Centre of the bed
    Center,
}

impl Default for MachineOrigin {
    fn default() -> Self {
        Self::BottomLeft
    }
}

impl std::fmt::Display for MachineOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BottomLeft => write!(f, "bottom-left"),
            Self::TopLeft => write!(f, "top-left"),
            Self::BottomRight => write!(f, "bottom-right"),
            Self::TopRight => write!(f, "top-right"),
            Self::Center => write!(f, "center"),
        }
    }
}

impl std::str::FromStr for MachineOrigin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bottom-left" => Ok(Self::BottomLeft),
            "top-left" => Ok(Self::TopLeft),
            "bottom-right" => Ok(Self::BottomRight),
            "top-right" => Ok(Self::TopRight),
            "center" | "centre" => Ok(Self::Center),
            _ => Err(format!("Unknown machine origin: {}", s)),
        }
    }
}

/// Settings for one compilation
///
/// Every field is optional in files; unknown keys are rejected so a
/// misspelled setting cannot silently fall back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// Machine units (G21 / G20)
    pub unit: Units,
    /// Travel (G0) rate in units/min
    pub travel_speed: f64,
    /// Cutting (G1) rate in units/min
    pub cutting_speed: f64,
    /// Number of passes over every path
    pub passes: u32,
    /// Depth added per pass, in units
    pub pass_depth: f64,
    /// Dwell after switching the tool on, in milliseconds (0 disables)
    pub dwell_time: f64,
    /// Maximum deviation of flattened curves, in machine units
    pub approximation_tolerance: f64,
    /// Tool-on command, emitted verbatim
    pub tool_power_command: String,
    /// Tool-off command, emitted verbatim
    pub tool_off_command: String,
    /// Reference point of the machine origin
    pub machine_origin: MachineOrigin,
    /// Emit a coordinate-zeroing instruction in the footer
    pub zero_machine: bool,
    /// Mirror Y so a top-down document lands on a bottom-up machine
    pub invert_y_axis: bool,
    /// Take the bed size from the document instead of `bed_width`/`bed_height`
    pub use_document_size: bool,
    /// Bed width in units
    pub bed_width: f64,
    /// Bed height in units
    pub bed_height: f64,
    /// X offset added after origin placement, in units
    pub horizontal_offset: f64,
    /// Y offset added after origin placement, in units
    pub vertical_offset: f64,
    /// Uniform scale applied to the document
    pub scaling_factor: f64,
    /// Absolute Z position to start at, if any
    pub z_axis_start: Option<f64>,
    /// Travel back to (0, 0) when done
    pub move_to_origin_end: bool,
    /// Finish the program with a tool-off command
    pub tool_off_at_end: bool,
    /// Switch the tool off once after the last path instead of after each path
    pub defer_tool_off: bool,
    /// Layer label to compile; `None` compiles the whole document
    pub layer_name: Option<String>,
    /// Extra lines appended to the header, verbatim
    pub header: Vec<String>,
    /// Extra lines appended to the footer, verbatim
    pub footer: Vec<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            unit: Units::Millimeters,
            travel_speed: 3000.0,
            cutting_speed: 750.0,
            passes: 1,
            pass_depth: 1.0,
            dwell_time: 0.0,
            approximation_tolerance: 0.01,
            tool_power_command: "M3 S255;".to_string(),
            tool_off_command: "M5;".to_string(),
            machine_origin: MachineOrigin::BottomLeft,
            zero_machine: false,
            invert_y_axis: true,
            use_document_size: false,
            bed_width: 200.0,
            bed_height: 200.0,
            horizontal_offset: 0.0,
            vertical_offset: 0.0,
            scaling_factor: 1.0,
            z_axis_start: None,
            move_to_origin_end: false,
            tool_off_at_end: true,
            defer_tool_off: false,
            layer_name: None,
            header: Vec::new(),
            footer: Vec::new(),
        }
    }
}

impl ConversionConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style layer selection
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer_name = Some(layer.into());
        self
    }

    /// The requested layer label with surrounding whitespace removed.
    /// An empty label means "no layer".
    pub fn layer(&self) -> Option<&str> {
        self.layer_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let name = path.display().to_string();

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| Error::parse(&name, e.to_string()))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| Error::parse(&name, e.to_string()))?
        } else {
            return Err(Error::other("Config file must be .json or .toml"));
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", name);
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?
        } else {
            return Err(Error::other("Config file must be .json or .toml"));
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.passes == 0 {
            return Err(Error::config("passes", "must be at least 1"));
        }

        if !(self.approximation_tolerance.is_finite() && self.approximation_tolerance > 0.0) {
            return Err(Error::config(
                "approximation_tolerance",
                "must be a positive number",
            ));
        }

        if !(self.travel_speed.is_finite() && self.travel_speed > 0.0) {
            return Err(Error::config("travel_speed", "must be > 0"));
        }

        if !(self.cutting_speed.is_finite() && self.cutting_speed > 0.0) {
            return Err(Error::config("cutting_speed", "must be > 0"));
        }

        if !(self.pass_depth.is_finite() && self.pass_depth >= 0.0) {
            return Err(Error::config("pass_depth", "must be >= 0"));
        }

        if !(self.dwell_time.is_finite() && self.dwell_time >= 0.0) {
            return Err(Error::config("dwell_time", "must be >= 0"));
        }

        if !self.scaling_factor.is_finite() || self.scaling_factor == 0.0 {
            return Err(Error::config("scaling_factor", "must be finite and non-zero"));
        }

        if !self.use_document_size
            && !(self.bed_width.is_finite()
                && self.bed_width > 0.0
                && self.bed_height.is_finite()
                && self.bed_height > 0.0)
        {
            return Err(Error::config("bed_width/bed_height", "must be > 0"));
        }

        if !(self.horizontal_offset.is_finite() && self.vertical_offset.is_finite()) {
            return Err(Error::config("offset", "must be finite"));
        }

        if self.z_axis_start.is_some_and(|z| !z.is_finite()) {
            return Err(Error::config("z_axis_start", "must be finite"));
        }

        Ok(())
    }
}

/// Default location of the user configuration file
/// (`<config dir>/layercut/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("layercut").join("config.toml"))
}
