use super::common::{layer, svg, SQUARE};
use layercut_compiler::{combine, Compiler, Instruction};
use layercut_settings::ConversionConfig;

#[test]
fn test_combined_stream_has_one_header_and_footer() {
    let document = svg(
        r#"width="100" height="100""#,
        &format!(
            "{}{}",
            layer("cut", SQUARE),
            layer("engrave", r#"<path d="M 40 40 L 60 40"/>"#)
        ),
    );
    let base = ConversionConfig {
        move_to_origin_end: true,
        zero_machine: true,
        ..ConversionConfig::default()
    };

    let cut = Compiler::new(base.clone().with_layer("cut"))
        .unwrap()
        .compile_str(&document)
        .unwrap();
    let engrave = Compiler::new(ConversionConfig {
        cutting_speed: 1500.0,
        tool_power_command: "M3 S40;".to_string(),
        ..base.with_layer("engrave")
    })
    .unwrap()
    .compile_str(&document)
    .unwrap();

    let combined = combine(&[("cut", &cut.stream), ("engrave", &engrave.stream)]).unwrap();
    let text = combined.render();

    assert_eq!(text.matches("G90;").count(), 1);
    assert_eq!(text.matches("G21;").count(), 1);
    assert_eq!(text.matches("G92 X0 Y0 Z0;").count(), 1);
    assert_eq!(text.matches("G0 X0.000 Y0.000").count(), 1);
    assert_eq!(text.matches("; ---- layer: engrave ----").count(), 1);
    assert!(text.contains("M3 S40;"));
    assert!(text.contains("F1500;"));

    let markers = combined
        .body()
        .iter()
        .position(|i| matches!(i, Instruction::Comment(_)))
        .unwrap();
    assert_eq!(&combined.body()[..markers], cut.stream.body());
    assert_eq!(&combined.body()[markers + 1..], engrave.stream.body());
}
