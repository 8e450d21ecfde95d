use layercut_compiler::{Instruction, InstructionStream};

/// Wrap `body` in an Inkscape flavoured SVG root
pub fn svg(attrs: &str, body: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" {}>{}</svg>"#,
        attrs, body
    )
}

/// A layer group holding `body`
pub fn layer(label: &str, body: &str) -> String {
    format!(
        r#"<g inkscape:groupmode="layer" inkscape:label="{}">{}</g>"#,
        label, body
    )
}

pub const SQUARE: &str = r#"<path id="square" d="M 10 10 L 20 10 L 20 20 L 10 20 Z"/>"#;

pub fn body_lines(stream: &InstructionStream) -> Vec<String> {
    stream.body().iter().map(|i| i.to_string()).collect()
}

pub fn count<F: Fn(&Instruction) -> bool>(instructions: &[Instruction], pred: F) -> usize {
    instructions.iter().filter(|i| pred(i)).count()
}
