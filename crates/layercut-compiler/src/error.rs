//! Error and warning types for the compiler crate.
//!
//! Errors abort a compilation. Warnings describe geometry that was dropped or
//! approximated; they are accumulated on the [`Compilation`](crate::Compilation)
//! and never abort on their own.

use std::fmt;
use thiserror::Error;

/// Errors raised while parsing the input document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The input is not well-formed XML.
    #[error("Malformed XML: {0}")]
    Xml(String),

    /// The root element is not `<svg>`.
    #[error("Root element is <{0}>, expected <svg>")]
    NotSvg(String),

    /// A path's `d` attribute could not be parsed.
    #[error("Invalid path data in {element}: {reason}")]
    PathData { element: String, reason: String },

    /// A `transform` attribute could not be parsed.
    #[error("Invalid transform on {element}: {reason}")]
    Transform { element: String, reason: String },

    /// A basic shape carries an unparseable attribute.
    #[error("Invalid shape attribute on {element}: {reason}")]
    Shape { element: String, reason: String },
}

/// Errors raised by the instruction emitter state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// An emission step was requested in a state that does not allow it.
    #[error("Cannot {action} while emitter is {state}")]
    InvalidTransition { action: &'static str, state: String },
}

/// Errors raised when splicing instruction streams together.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CombineError {
    /// Nothing to combine.
    #[error("No instruction streams to combine")]
    Empty,

    /// Streams were compiled with different unit or positioning settings.
    #[error("Layer '{other}' uses different unit/positioning directives than layer '{first}'")]
    IncompatibleHeaders { first: String, other: String },
}

/// Errors that abort a compilation.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The document could not be parsed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The conversion settings are invalid.
    #[error(transparent)]
    Settings(#[from] layercut_core::Error),

    /// `use_document_size` was requested but the document carries no size.
    #[error("Document size not found in SVG (needed to derive the bed size)")]
    DocumentSizeUnavailable,

    /// The requested layer does not exist.
    #[error("Layer '{layer}' not found in document")]
    LayerNotFound { layer: String },

    /// Nothing drawable was selected.
    #[error("No paths were found{}", layer_suffix(.layer))]
    NoGeometry { layer: Option<String> },

    /// The emitter was driven out of order.
    #[error(transparent)]
    Emitter(#[from] EmitterError),
}

fn layer_suffix(layer: &Option<String>) -> String {
    match layer {
        Some(name) => format!(" in layer '{}'", name),
        None => String::new(),
    }
}

/// Result type alias for compiler operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Non-fatal conditions found while compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileWarning {
    /// The requested layer exists but contributed no drawable geometry.
    LayerEmpty { layer: String },
    /// A subpath collapsed to a single point and was dropped.
    DegeneratePath { path: String },
    /// A subpath contained non-finite coordinates and was dropped.
    NonFiniteGeometry { path: String },
    /// Curve subdivision hit its depth bound; the current approximation was kept.
    SubdivisionLimit { path: String },
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayerEmpty { layer } => write!(f, "Layer '{}' contains no drawable paths", layer),
            Self::DegeneratePath { path } => {
                write!(f, "Dropped degenerate geometry in {}", path)
            }
            Self::NonFiniteGeometry { path } => {
                write!(f, "Dropped non-finite coordinates in {}", path)
            }
            Self::SubdivisionLimit { path } => write!(
                f,
                "Curve subdivision limit reached in {}; kept coarser approximation",
                path
            ),
        }
    }
}
