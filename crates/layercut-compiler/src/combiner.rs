//! Splicing per-layer streams into one program
//!
//! The first stream keeps its header and the last its footer. Every later
//! body is preceded by a layer marker comment.

use crate::emitter::{Instruction, InstructionStream};
use crate::error::CombineError;

/// Marker comment placed before each layer body after the first
pub fn layer_marker(label: &str) -> Instruction {
    Instruction::Comment(format!("---- layer: {} ----", label))
}

/// Positioning and unit directives, which must agree across streams
fn directives(stream: &InstructionStream) -> Vec<&Instruction> {
    stream
        .header()
        .iter()
        .filter(|i| matches!(i, Instruction::AbsolutePositioning | Instruction::Units(_)))
        .collect()
}

/// Combine labelled streams in order.
///
/// A single stream is returned unchanged.
pub fn combine(streams: &[(&str, &InstructionStream)]) -> Result<InstructionStream, CombineError> {
    let Some(&(first_label, first)) = streams.first() else {
        return Err(CombineError::Empty);
    };

    let expected = directives(first);
    for &(label, stream) in &streams[1..] {
        if directives(stream) != expected {
            return Err(CombineError::IncompatibleHeaders {
                first: first_label.to_string(),
                other: label.to_string(),
            });
        }
    }

    let mut body = first.body().to_vec();
    for &(label, stream) in &streams[1..] {
        body.push(layer_marker(label));
        body.extend_from_slice(stream.body());
    }

    let footer = match streams.last() {
        Some(&(_, last)) => last.footer().to_vec(),
        None => Vec::new(),
    };

    tracing::debug!("Combined {} streams into {} body instructions", streams.len(), body.len());
    Ok(InstructionStream::from_sections(
        first.header().to_vec(),
        body,
        footer,
    ))
}
