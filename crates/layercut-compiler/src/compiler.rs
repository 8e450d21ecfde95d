//! Compile pipeline: select, flatten, transform, emit

use crate::document::Document;
use crate::emitter::{emit_program, InstructionStream};
use crate::error::{CompileError, CompileResult, CompileWarning};
use crate::flatten::{flatten_transformed, FlattenIssue, Polyline};
use crate::layer::{select_paths, LayerMatch};
use crate::transform::MachineTransform;
use layercut_settings::ConversionConfig;
use rayon::prelude::*;

/// Compiles documents with one fixed set of settings
#[derive(Debug, Clone)]
pub struct Compiler {
    config: ConversionConfig,
}

/// Output of one compilation
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub stream: InstructionStream,
    /// Whether the requested layer was found
    pub layer: LayerMatch,
    /// Number of polylines emitted
    pub polylines: usize,
    pub warnings: Vec<CompileWarning>,
}

impl Compilation {
    /// Fail with [`CompileError::LayerNotFound`] when the requested layer is missing
    pub fn require_layer(self) -> CompileResult<Self> {
        match &self.layer {
            LayerMatch::NotFound { layer } => Err(CompileError::LayerNotFound {
                layer: layer.clone(),
            }),
            _ => Ok(self),
        }
    }

    /// Fail with [`CompileError::NoGeometry`] when nothing was emitted
    pub fn require_geometry(self) -> CompileResult<Self> {
        if self.polylines == 0 {
            Err(CompileError::NoGeometry {
                layer: self.layer.layer().map(str::to_string),
            })
        } else {
            Ok(self)
        }
    }
}

impl Compiler {
    /// Create a compiler; the settings are validated once here
    pub fn new(config: ConversionConfig) -> CompileResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Parse SVG text and compile it
    pub fn compile_str(&self, svg: &str) -> CompileResult<Compilation> {
        let document = Document::parse(svg)?;
        self.compile(&document)
    }

    /// Compile a parsed document
    pub fn compile(&self, document: &Document) -> CompileResult<Compilation> {
        let transform = MachineTransform::from_config(&self.config, document.size())?;
        let selection = select_paths(document, self.config.layer());

        // Tolerance is given in machine units; flatten in document units
        let scale = transform.document_scale();
        let tolerance = if scale.is_finite() && scale > 0.0 {
            self.config.approximation_tolerance / scale
        } else {
            self.config.approximation_tolerance
        };

        let flattened: Vec<(&str, Vec<Polyline>, Vec<FlattenIssue>)> = selection
            .paths
            .par_iter()
            .map(|selected| {
                let result = flatten_transformed(selected.path, &selected.transform, tolerance);
                let polylines = result
                    .polylines
                    .iter()
                    .map(|polyline| transform.apply_polyline(polyline))
                    .collect();
                (selected.id, polylines, result.issues)
            })
            .collect();

        let mut warnings = Vec::new();
        let mut polylines = Vec::new();
        for (id, path_polylines, issues) in flattened {
            for issue in issues {
                let path = id.to_string();
                warnings.push(match issue {
                    FlattenIssue::SubdivisionLimit => CompileWarning::SubdivisionLimit { path },
                    FlattenIssue::Degenerate => CompileWarning::DegeneratePath { path },
                    FlattenIssue::NonFinite => CompileWarning::NonFiniteGeometry { path },
                });
            }
            polylines.extend(path_polylines);
        }

        if let LayerMatch::Found { layer, .. } = &selection.outcome {
            if polylines.is_empty() {
                warnings.push(CompileWarning::LayerEmpty {
                    layer: layer.clone(),
                });
            }
        }
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let stream = emit_program(&self.config, &polylines)?;

        tracing::info!(
            "Compiled {} paths into {} polylines ({} instructions){}",
            selection.paths.len(),
            polylines.len(),
            stream.len(),
            match selection.outcome.layer() {
                Some(layer) => format!(" for layer '{}'", layer),
                None => String::new(),
            }
        );

        Ok(Compilation {
            stream,
            layer: selection.outcome,
            polylines: polylines.len(),
            warnings,
        })
    }
}
