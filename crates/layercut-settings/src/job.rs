//! Multi-layer combine jobs
//!
//! A combine job compiles the same document several times, once per layer,
//! each with its own settings, and splices the results together. The job file
//! is TOML:
//!
//! ```toml
//! [defaults]
//! unit = "mm"
//! travel_speed = 3000
//!
//! [[layers]]
//! name = "engrave"
//! cutting_speed = 1500
//! tool_power_command = "M3 S80;"
//!
//! [[layers]]
//! name = "cut"
//! mandatory = true
//! passes = 3
//! pass_depth = 0.5
//! ```
//!
//! Each `[[layers]]` table overrides any [`ConversionConfig`] field on top of
//! `[defaults]`.

use crate::config::ConversionConfig;
use layercut_core::{Error, Result};
use std::path::Path;

/// One layer of a combine job
#[derive(Debug, Clone, PartialEq)]
pub struct LayerJob {
    /// Layer label to select
    pub name: String,
    /// Whether a missing layer aborts the whole job
    pub mandatory: bool,
    /// Fully resolved settings for this layer (`layer_name` is set)
    pub config: ConversionConfig,
}

/// An ordered list of layers to compile and combine
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombineJob {
    /// Layers in output order
    pub layers: Vec<LayerJob>,
}

impl CombineJob {
    /// Load a job from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parse a job from TOML text. `source_name` is used in error messages.
    pub fn from_toml_str(content: &str, source_name: &str) -> Result<Self> {
        let document: toml::Table =
            toml::from_str(content).map_err(|e| Error::parse(source_name, e.to_string()))?;

        let defaults = match document.get("defaults") {
            Some(toml::Value::Table(table)) => table.clone(),
            Some(_) => return Err(Error::parse(source_name, "[defaults] must be a table")),
            None => toml::Table::new(),
        };

        let entries = match document.get("layers") {
            Some(toml::Value::Array(entries)) => entries,
            Some(_) => return Err(Error::parse(source_name, "layers must be an array of tables")),
            None => return Err(Error::parse(source_name, "no [[layers]] defined")),
        };

        let mut layers = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let toml::Value::Table(overrides) = entry else {
                return Err(Error::parse(
                    source_name,
                    format!("layer #{} is not a table", index + 1),
                ));
            };
            layers.push(Self::resolve_layer(&defaults, overrides, index, source_name)?);
        }

        Ok(Self { layers })
    }

    fn resolve_layer(
        defaults: &toml::Table,
        overrides: &toml::Table,
        index: usize,
        source_name: &str,
    ) -> Result<LayerJob> {
        let mut merged = defaults.clone();
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }

        let name = match merged.remove("name") {
            Some(toml::Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                return Err(Error::parse(
                    source_name,
                    format!("layer #{} needs a non-empty name", index + 1),
                ))
            }
        };

        let mandatory = match merged.remove("mandatory") {
            Some(toml::Value::Boolean(flag)) => flag,
            Some(_) => {
                return Err(Error::parse(
                    source_name,
                    format!("layer '{}': mandatory must be a boolean", name),
                ))
            }
            None => false,
        };

        let mut config: ConversionConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| {
                Error::parse(source_name, format!("layer '{}': {}", name, e))
            })?;
        config.layer_name = Some(name.clone());
        config.validate()?;

        Ok(LayerJob {
            name,
            mandatory,
            config,
        })
    }
}
