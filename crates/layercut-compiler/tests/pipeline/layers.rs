use super::common::{layer, svg};
use layercut_compiler::{Compiler, CompileWarning, Document, LayerMatch};
use layercut_settings::ConversionConfig;

fn document() -> String {
    svg(
        r#"width="200" height="200""#,
        &format!(
            "{}{}{}",
            layer("engrave", r#"<path id="logo" d="M 150 150 L 160 150"/>"#),
            layer(
                "cut",
                r#"<g transform="translate(5 0)"><rect id="outline" x="10" y="10" width="20" height="20"/></g>"#,
            ),
            layer("notes", r#"<path id="dot" d="M 1 1"/>"#),
        ),
    )
}

fn no_invert(layer: &str) -> ConversionConfig {
    ConversionConfig {
        invert_y_axis: false,
        ..ConversionConfig::new().with_layer(layer)
    }
}

#[test]
fn test_cut_never_contains_engrave_geometry() {
    let compilation = Compiler::new(no_invert("cut"))
        .unwrap()
        .compile_str(&document())
        .unwrap();
    let text = compilation.stream.render();
    assert!(!text.contains("X150.000"));
    assert!(!text.contains("X160.000"));
    // Group transform is applied
    assert!(text.contains("G0 X15.000 Y10.000 F3000;"));
}

#[test]
fn test_layer_labels_in_document_order() {
    let document = Document::parse(&document()).unwrap();
    assert_eq!(document.layer_labels(), ["engrave", "cut", "notes"]);
}

#[test]
fn test_layer_with_only_degenerate_paths() {
    let compilation = Compiler::new(no_invert("notes"))
        .unwrap()
        .compile_str(&document())
        .unwrap();
    assert!(matches!(compilation.layer, LayerMatch::Found { .. }));
    assert_eq!(compilation.polylines, 0);
    assert_eq!(
        compilation.warnings,
        [
            CompileWarning::DegeneratePath {
                path: "dot".to_string()
            },
            CompileWarning::LayerEmpty {
                layer: "notes".to_string()
            },
        ]
    );
    assert!(compilation.require_geometry().is_err());
}

#[test]
fn test_whole_document_keeps_document_order() {
    let compilation = Compiler::new(ConversionConfig {
        invert_y_axis: false,
        ..ConversionConfig::default()
    })
    .unwrap()
    .compile_str(&document())
    .unwrap();
    let text = compilation.stream.render();
    let engrave = text.find("X150.000").unwrap();
    let cut = text.find("X15.000").unwrap();
    assert!(engrave < cut);
    assert_eq!(compilation.polylines, 2);
}

#[test]
fn test_compiling_twice_is_byte_identical() {
    let compiler = Compiler::new(ConversionConfig {
        passes: 2,
        ..ConversionConfig::default()
    })
    .unwrap();
    let document = Document::parse(&document()).unwrap();
    let first = compiler.compile(&document).unwrap().stream.render();
    let second = compiler.compile(&document).unwrap().stream.render();
    assert_eq!(first, second);
}
