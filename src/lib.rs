//! # layercut
//!
//! Compile layered SVG drawings into G-code for laser cutters, engravers and
//! other two-axis tools:
//! - Select one Inkscape layer or the whole drawing
//! - Flatten Béziers and elliptical arcs within a tolerance
//! - Place the drawing on the machine bed (origin corner or centre, offsets,
//!   scaling, Y inversion, inch or millimetre output)
//! - Multi-pass depth stepping, dwell and verbatim tool commands
//! - Per-layer settings spliced into one program
//!
//! ## Architecture
//!
//! 1. **layercut-core** - Error type, units and length parsing
//! 2. **layercut-settings** - Conversion settings, config files and combine jobs
//! 3. **layercut-compiler** - Document model, flattening, transforms and emission
//! 4. **layercut** - Command line front end (this crate)

pub mod cli;

pub use layercut_compiler::{
    combine, Compilation, CompileError, CompileWarning, Compiler, Document, InstructionStream,
};
pub use layercut_core::{Error, Result, Units};
pub use layercut_settings::{CombineJob, ConversionConfig, LayerJob, MachineOrigin};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging to stderr
///
/// `RUST_LOG` is honoured; otherwise the level is `info`, or `debug` when
/// `verbose` is set. Standard output stays free for G-code.
pub fn init_logging(verbose: bool, json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .without_time();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
