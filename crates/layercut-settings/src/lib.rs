//! Conversion settings for layercut
//!
//! Provides the per-invocation [`ConversionConfig`], configuration file
//! handling and the multi-layer [`CombineJob`] description.
//! Supports JSON and TOML file formats.

pub mod config;
pub mod job;

pub use config::{default_config_path, ConversionConfig, MachineOrigin};
pub use job::{CombineJob, LayerJob};
pub use layercut_core::units::Units;
