//! # layercut-compiler
//!
//! Compiles SVG layers into G-code for laser cutters and engravers.
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`document`] parses the SVG into a typed tree.
//! 2. [`layer`] selects the paths of one layer (or the whole document).
//! 3. [`flatten`] turns curves into polylines within a tolerance.
//! 4. [`transform`] maps document coordinates onto the machine bed.
//! 5. [`emitter`] encodes the polylines as an instruction stream.
//!
//! [`combiner`] splices streams compiled for different layers into one
//! program. [`Compiler`] drives the first five steps.
//!
//! ```no_run
//! use layercut_compiler::Compiler;
//! use layercut_settings::ConversionConfig;
//!
//! let svg = std::fs::read_to_string("drawing.svg").unwrap();
//! let compiler = Compiler::new(ConversionConfig::new().with_layer("cut")).unwrap();
//! let compilation = compiler.compile_str(&svg).unwrap();
//! print!("{}", compilation.stream);
//! ```

pub mod combiner;
pub mod compiler;
pub mod document;
pub mod emitter;
pub mod error;
pub mod flatten;
pub mod layer;
pub mod path;
pub mod transform;

pub use combiner::{combine, layer_marker};
pub use compiler::{Compilation, Compiler};
pub use document::{Document, DocumentSize, Element};
pub use emitter::{emit_program, EmitterState, Instruction, InstructionEmitter, InstructionStream};
pub use error::{
    CombineError, CompileError, CompileResult, CompileWarning, DocumentError, EmitterError,
};
pub use flatten::{flatten_path, flatten_transformed, Polyline, MAX_SUBDIVISION_DEPTH};
pub use layer::{select_paths, LayerMatch, SelectedPath, Selection};
pub use path::{Path, PathCommand};
pub use transform::MachineTransform;
