//! Command line interface
//!
//! `convert` compiles one layer (or the whole drawing) with settings taken
//! from a config file and flags. `combine` compiles every layer of a job
//! file in parallel and splices the results. `layers` lists layer labels.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use layercut_compiler::{combine, Compilation, CompileError, Compiler, Document, LayerMatch};
use layercut_core::{parse_length, Units};
use layercut_settings::{default_config_path, CombineJob, ConversionConfig, MachineOrigin};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "layercut",
    version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"),
    about = "Compile layered SVG drawings into G-code"
)]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert one layer, or the whole drawing, to G-code
    Convert(ConvertArgs),
    /// Compile the layers of a job file and splice them into one program
    Combine(CombineArgs),
    /// List the layer labels of a drawing
    Layers {
        /// Input SVG file
        svg: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input SVG file
    pub svg: PathBuf,

    /// Output file (`-` for stdout); defaults to the input name with a .gcode extension
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Layer label to convert
    #[arg(short, long, value_name = "LABEL")]
    pub layer: Option<String>,

    /// Settings file (.toml or .json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Input SVG file
    pub svg: PathBuf,

    /// Job file listing the layers and their settings
    #[arg(short, long, value_name = "FILE")]
    pub job: PathBuf,

    /// Output file (`-` for stdout); defaults to `<input>_combined.gcode`
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Setting overrides; lengths accept `mm`, `cm` or `in` suffixes
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Output units (mm or in)
    #[arg(long)]
    pub unit: Option<Units>,
    /// Travel rate in units/min
    #[arg(long, value_name = "RATE")]
    pub travel_speed: Option<f64>,
    /// Cutting rate in units/min
    #[arg(long, value_name = "RATE")]
    pub cutting_speed: Option<f64>,
    /// Number of passes
    #[arg(long)]
    pub passes: Option<u32>,
    /// Depth per pass
    #[arg(long, value_name = "LENGTH")]
    pub pass_depth: Option<String>,
    /// Dwell after tool-on, in milliseconds
    #[arg(long, value_name = "MS")]
    pub dwell_time: Option<f64>,
    /// Maximum curve deviation
    #[arg(long, value_name = "LENGTH")]
    pub tolerance: Option<String>,
    /// Tool-on command, emitted verbatim
    #[arg(long, value_name = "TEXT")]
    pub tool_on: Option<String>,
    /// Tool-off command, emitted verbatim
    #[arg(long, value_name = "TEXT")]
    pub tool_off: Option<String>,
    /// Machine origin: bottom-left, top-left, bottom-right, top-right or center
    #[arg(long)]
    pub origin: Option<MachineOrigin>,
    /// Bed width
    #[arg(long, value_name = "LENGTH")]
    pub bed_width: Option<String>,
    /// Bed height
    #[arg(long, value_name = "LENGTH")]
    pub bed_height: Option<String>,
    /// Take the bed size from the document
    #[arg(long)]
    pub use_document_size: bool,
    /// Horizontal offset
    #[arg(long, value_name = "LENGTH", allow_hyphen_values = true)]
    pub offset_x: Option<String>,
    /// Vertical offset
    #[arg(long, value_name = "LENGTH", allow_hyphen_values = true)]
    pub offset_y: Option<String>,
    /// Uniform scale factor
    #[arg(long)]
    pub scale: Option<f64>,
    /// Keep document Y direction
    #[arg(long)]
    pub no_invert_y: bool,
    /// Start at this Z height
    #[arg(long, value_name = "LENGTH", allow_hyphen_values = true)]
    pub z_start: Option<String>,
    /// Travel back to (0, 0) at the end
    #[arg(long)]
    pub return_to_origin: bool,
    /// Zero machine coordinates at the end
    #[arg(long)]
    pub zero_machine: bool,
    /// Switch the tool off once after the last path
    #[arg(long)]
    pub defer_tool_off: bool,
    /// Skip the final tool-off
    #[arg(long)]
    pub no_tool_off_at_end: bool,
    /// Extra header line (repeatable)
    #[arg(long, value_name = "LINE")]
    pub header: Vec<String>,
    /// Extra footer line (repeatable)
    #[arg(long, value_name = "LINE")]
    pub footer: Vec<String>,
}

impl SettingsArgs {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut ConversionConfig) -> anyhow::Result<()> {
        if let Some(unit) = self.unit {
            config.unit = unit;
        }
        let unit = config.unit;
        let length = |name: &str, value: &str| -> anyhow::Result<f64> {
            parse_length(value, unit).map_err(|e| anyhow::anyhow!("--{}: {}", name, e))
        };

        if let Some(speed) = self.travel_speed {
            config.travel_speed = speed;
        }
        if let Some(speed) = self.cutting_speed {
            config.cutting_speed = speed;
        }
        if let Some(passes) = self.passes {
            config.passes = passes;
        }
        if let Some(depth) = &self.pass_depth {
            config.pass_depth = length("pass-depth", depth)?;
        }
        if let Some(dwell) = self.dwell_time {
            config.dwell_time = dwell;
        }
        if let Some(tolerance) = &self.tolerance {
            config.approximation_tolerance = length("tolerance", tolerance)?;
        }
        if let Some(text) = &self.tool_on {
            config.tool_power_command = text.clone();
        }
        if let Some(text) = &self.tool_off {
            config.tool_off_command = text.clone();
        }
        if let Some(origin) = self.origin {
            config.machine_origin = origin;
        }
        if let Some(width) = &self.bed_width {
            config.bed_width = length("bed-width", width)?;
        }
        if let Some(height) = &self.bed_height {
            config.bed_height = length("bed-height", height)?;
        }
        if let Some(offset) = &self.offset_x {
            config.horizontal_offset = length("offset-x", offset)?;
        }
        if let Some(offset) = &self.offset_y {
            config.vertical_offset = length("offset-y", offset)?;
        }
        if let Some(scale) = self.scale {
            config.scaling_factor = scale;
        }
        if let Some(z) = &self.z_start {
            config.z_axis_start = Some(length("z-start", z)?);
        }
        config.use_document_size |= self.use_document_size;
        config.invert_y_axis &= !self.no_invert_y;
        config.move_to_origin_end |= self.return_to_origin;
        config.zero_machine |= self.zero_machine;
        config.defer_tool_off |= self.defer_tool_off;
        config.tool_off_at_end &= !self.no_tool_off_at_end;
        config.header.extend(self.header.iter().cloned());
        config.footer.extend(self.footer.iter().cloned());
        Ok(())
    }
}

/// Run a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Convert(args) => convert(&args),
        Command::Combine(args) => combine_layers(&args),
        Command::Layers { svg } => list_layers(&svg),
    }
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Document::parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Settings file from `--config`, else the user config file if present, else defaults
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<ConversionConfig> {
    if let Some(path) = explicit {
        return ConversionConfig::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!("Using settings from {}", path.display());
            ConversionConfig::load_from_file(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))
        }
        _ => Ok(ConversionConfig::default()),
    }
}

/// `<stem>.gcode`, `<stem>_<layer>.gcode` or `<stem>_<suffix>.gcode` beside the input
pub fn default_output_path(input: &Path, suffix: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match suffix {
        Some(suffix) => format!("{}_{}.gcode", stem, suffix.replace(['/', '\\', ' '], "_")),
        None => format!("{}.gcode", stem),
    };
    input.with_file_name(name)
}

fn write_output(path: &Path, text: &str) -> anyhow::Result<()> {
    if path == Path::new("-") {
        use std::io::Write;
        std::io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

fn convert(args: &ConvertArgs) -> anyhow::Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    args.settings.apply(&mut config)?;
    if let Some(layer) = &args.layer {
        config.layer_name = Some(layer.clone());
    }

    let document = read_document(&args.svg)?;
    let compiler = Compiler::new(config)?;
    let compilation = compiler
        .compile(&document)?
        .require_layer()?
        .require_geometry()?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.svg, compiler.config().layer()),
    };
    write_output(&output, &compilation.stream.render())
}

fn combine_layers(args: &CombineArgs) -> anyhow::Result<()> {
    let job = CombineJob::load_from_file(&args.job)
        .with_context(|| format!("Failed to load job {}", args.job.display()))?;
    let document = read_document(&args.svg)?;

    // Each layer owns its settings; only the document is shared
    let results: Vec<Result<Compilation, CompileError>> = job
        .layers
        .par_iter()
        .map(|layer| Compiler::new(layer.config.clone())?.compile(&document))
        .collect();

    let mut compiled = Vec::new();
    for (layer, result) in job.layers.iter().zip(results) {
        let compilation =
            result.with_context(|| format!("Failed to compile layer '{}'", layer.name))?;
        match &compilation.layer {
            LayerMatch::NotFound { .. } if layer.mandatory => {
                return Err(CompileError::LayerNotFound {
                    layer: layer.name.clone(),
                }
                .into());
            }
            LayerMatch::NotFound { .. } => {
                tracing::warn!("Layer '{}' not found, skipping", layer.name);
                continue;
            }
            _ => {}
        }
        if compilation.polylines == 0 {
            tracing::warn!("Layer '{}' has no geometry, skipping", layer.name);
            continue;
        }
        compiled.push((layer.name.as_str(), compilation));
    }

    if compiled.is_empty() {
        bail!("No paths were found in any layer of {}", args.job.display());
    }

    let streams: Vec<(&str, &layercut_compiler::InstructionStream)> = compiled
        .iter()
        .map(|(name, compilation)| (*name, &compilation.stream))
        .collect();
    let combined = combine(&streams)?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.svg, Some("combined")),
    };
    write_output(&output, &combined.render())
}

fn list_layers(svg: &Path) -> anyhow::Result<()> {
    let document = read_document(svg)?;
    let mut text = String::new();
    for label in document.layer_labels() {
        text.push_str(label);
        text.push('\n');
    }
    write_output(Path::new("-"), &text)
}
