use super::common::{body_lines, count, layer, svg, SQUARE};
use layercut_compiler::{CompileError, Compiler, Instruction, LayerMatch};
use layercut_settings::{ConversionConfig, MachineOrigin};

fn square_document() -> String {
    svg(r#"width="100" height="100""#, &layer("cut", SQUARE))
}

#[test]
fn test_single_pass_square() {
    let compiler = Compiler::new(ConversionConfig::new().with_layer("cut")).unwrap();
    let compilation = compiler.compile_str(&square_document()).unwrap();
    let body = compilation.stream.body();

    assert_eq!(compilation.polylines, 1);
    assert!(compilation.warnings.is_empty());
    assert_eq!(count(body, |i| matches!(i, Instruction::Travel { .. })), 1);
    assert_eq!(count(body, |i| matches!(i, Instruction::ToolOn(_))), 1);
    assert_eq!(count(body, |i| matches!(i, Instruction::Cut { .. })), 4);
    assert_eq!(count(body, |i| matches!(i, Instruction::ToolOff(_))), 1);

    // Y is mirrored on the 200 mm default bed
    assert_eq!(
        body_lines(&compilation.stream),
        [
            "G0 X10.000 Y190.000 F3000;",
            "M3 S255;",
            "G1 X20.000 Y190.000 F750;",
            "G1 X20.000 Y180.000;",
            "G1 X10.000 Y180.000;",
            "G1 X10.000 Y190.000;",
            "M5;",
        ]
    );

    // One tool-off in the header, one after the square, none repeated at the end
    let all = compilation.stream.instructions();
    assert_eq!(all.filter(|i| matches!(i, Instruction::ToolOff(_))).count(), 2);
    assert!(compilation.stream.footer().is_empty());
    assert!(compilation
        .stream
        .render()
        .ends_with("G1 X10.000 Y190.000;\nM5;\n"));
}

#[test]
fn test_deferred_tool_off_is_emitted_once() {
    let config = ConversionConfig {
        defer_tool_off: true,
        ..ConversionConfig::new().with_layer("cut")
    };
    let document = svg(
        r#"width="100" height="100""#,
        &layer(
            "cut",
            &format!(r#"{}<path id="dash" d="M 50 50 L 60 50"/>"#, SQUARE),
        ),
    );
    let compilation = Compiler::new(config).unwrap().compile_str(&document).unwrap();
    let stream = &compilation.stream;

    assert_eq!(compilation.polylines, 2);
    assert_eq!(count(stream.body(), |i| matches!(i, Instruction::ToolOff(_))), 1);
    assert!(matches!(stream.body().last(), Some(Instruction::ToolOff(_))));
    assert!(stream.footer().is_empty());
    assert_eq!(
        stream
            .instructions()
            .filter(|i| matches!(i, Instruction::ToolOff(_)))
            .count(),
        2
    );
    assert!(stream.render().ends_with("G1 X60.000 Y150.000;\nM5;\n"));
}

#[test]
fn test_three_passes_step_down() {
    let config = ConversionConfig {
        passes: 3,
        pass_depth: 0.5,
        ..ConversionConfig::new().with_layer("cut")
    };
    let compilation = Compiler::new(config)
        .unwrap()
        .compile_str(&square_document())
        .unwrap();
    let body = compilation.stream.body();

    assert_eq!(count(body, |i| matches!(i, Instruction::Cut { .. })), 12);
    assert_eq!(count(body, |i| matches!(i, Instruction::ToolOn(_))), 1);
    assert_eq!(count(body, |i| matches!(i, Instruction::ToolOff(_))), 1);

    let depths: Vec<f64> = body
        .iter()
        .filter_map(|i| match i {
            Instruction::Cut { z, .. } => *z,
            _ => None,
        })
        .collect();
    assert_eq!(depths.len(), 12);
    for (pass, chunk) in depths.chunks(4).enumerate() {
        let expected = -0.5 * pass as f64;
        assert!(chunk.iter().all(|z| (*z - expected).abs() < 1e-12));
    }
}

#[test]
fn test_missing_layer_is_reported() {
    let compilation = Compiler::new(ConversionConfig::new().with_layer("engrave"))
        .unwrap()
        .compile_str(&square_document())
        .unwrap();

    assert_eq!(
        compilation.layer,
        LayerMatch::NotFound {
            layer: "engrave".to_string()
        }
    );
    assert_eq!(compilation.polylines, 0);
    assert!(compilation.stream.body().is_empty());
    assert!(matches!(
        compilation.require_layer(),
        Err(CompileError::LayerNotFound { layer }) if layer == "engrave"
    ));
}

#[test]
fn test_center_origin_on_derived_bed() {
    let document = svg(
        r#"viewBox="0 0 100 100""#,
        r#"<path d="M 50 50 L 60 50"/>"#,
    );
    for invert_y_axis in [true, false] {
        let config = ConversionConfig {
            machine_origin: MachineOrigin::Center,
            use_document_size: true,
            invert_y_axis,
            ..ConversionConfig::default()
        };
        let compilation = Compiler::new(config).unwrap().compile_str(&document).unwrap();
        let body = body_lines(&compilation.stream);
        assert_eq!(body[0], "G0 X0.000 Y0.000 F3000;");
        assert_eq!(body[2], "G1 X10.000 Y0.000 F750;");
    }
}

#[test]
fn test_derived_bed_needs_document_size() {
    let config = ConversionConfig {
        use_document_size: true,
        ..ConversionConfig::default()
    };
    let err = Compiler::new(config)
        .unwrap()
        .compile_str(&svg("", SQUARE))
        .unwrap_err();
    assert!(matches!(err, CompileError::DocumentSizeUnavailable));
}

#[test]
fn test_inch_output() {
    let document = svg(
        r#"width="50.8mm" height="50.8mm" viewBox="0 0 50.8 50.8""#,
        r#"<path d="M 0 0 L 25.4 0"/>"#,
    );
    let config = ConversionConfig {
        unit: layercut_settings::Units::Inches,
        invert_y_axis: false,
        ..ConversionConfig::default()
    };
    let compilation = Compiler::new(config).unwrap().compile_str(&document).unwrap();
    let text = compilation.stream.render();
    assert!(text.starts_with("G90;\nG20;\n"));
    assert!(text.contains("G1 X1.000 Y0.000 F750;"));
}
