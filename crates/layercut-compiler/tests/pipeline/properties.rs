use layercut_compiler::{flatten_path, Compiler, Instruction, MachineTransform, Path};
use layercut_settings::{ConversionConfig, MachineOrigin};
use lyon::geom::{
    point, vector, Angle, ArcFlags, CubicBezierSegment, Point, QuadraticBezierSegment, SvgArc,
};
use proptest::prelude::*;

fn distance_to_polyline(points: &[Point<f64>], p: Point<f64>) -> f64 {
    points
        .windows(2)
        .map(|w| {
            let v = w[1] - w[0];
            let len2 = v.square_length();
            if len2 == 0.0 {
                return (p - w[0]).length();
            }
            let t = ((p - w[0]).dot(v) / len2).clamp(0.0, 1.0);
            (p - (w[0] + v * t)).length()
        })
        .fold(f64::INFINITY, f64::min)
}

fn origin() -> impl Strategy<Value = MachineOrigin> {
    prop_oneof![
        Just(MachineOrigin::BottomLeft),
        Just(MachineOrigin::TopLeft),
        Just(MachineOrigin::BottomRight),
        Just(MachineOrigin::TopRight),
        Just(MachineOrigin::Center),
    ]
}

proptest! {
    #[test]
    fn cubic_flattening_stays_within_tolerance(
        c in prop::array::uniform8(-100.0f64..100.0),
        tolerance in 0.01f64..1.0,
    ) {
        let curve = CubicBezierSegment {
            from: point(c[0], c[1]),
            ctrl1: point(c[2], c[3]),
            ctrl2: point(c[4], c[5]),
            to: point(c[6], c[7]),
        };
        let path = Path::parse(&format!(
            "M {} {} C {} {} {} {} {} {}",
            c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]
        )).unwrap();
        let flattened = flatten_path(&path, tolerance);
        prop_assume!(!flattened.polylines.is_empty());
        let points = &flattened.polylines[0].points;

        for i in 0..=100 {
            let p = curve.sample(i as f64 / 100.0);
            prop_assert!(distance_to_polyline(points, p) <= tolerance + 1e-9);
        }
    }

    #[test]
    fn circular_arc_flattening_stays_within_tolerance(
        radius in 1.0f64..100.0,
        start in 0.0f64..360.0,
        end in 0.0f64..360.0,
        large_arc in any::<bool>(),
        sweep in any::<bool>(),
        tolerance in 0.01f64..1.0,
    ) {
        let from = point(radius * start.to_radians().cos(), radius * start.to_radians().sin());
        let to = point(radius * end.to_radians().cos(), radius * end.to_radians().sin());
        prop_assume!((to - from).length() > 1e-3);

        let arc = SvgArc {
            from,
            to,
            radii: vector(radius, radius),
            x_rotation: Angle::degrees(0.0),
            flags: ArcFlags { large_arc, sweep },
        }
        .to_arc();
        let path = Path::parse(&format!(
            "M {} {} A {} {} 0 {} {} {} {}",
            from.x, from.y, radius, radius, large_arc as u8, sweep as u8, to.x, to.y
        )).unwrap();
        let flattened = flatten_path(&path, tolerance);
        let points = &flattened.polylines[0].points;

        for i in 0..=100 {
            let p = arc.sample(i as f64 / 100.0);
            prop_assert!(distance_to_polyline(points, p) <= tolerance + 1e-6);
        }
    }

    #[test]
    fn quadratic_flattening_stays_within_tolerance(
        c in prop::array::uniform6(-100.0f64..100.0),
        tolerance in 0.01f64..1.0,
    ) {
        let curve = QuadraticBezierSegment {
            from: point(c[0], c[1]),
            ctrl: point(c[2], c[3]),
            to: point(c[4], c[5]),
        };
        let path = Path::parse(&format!(
            "M {} {} Q {} {} {} {}",
            c[0], c[1], c[2], c[3], c[4], c[5]
        )).unwrap();
        let flattened = flatten_path(&path, tolerance);
        prop_assume!(!flattened.polylines.is_empty());
        let points = &flattened.polylines[0].points;

        for i in 0..=100 {
            let p = curve.sample(i as f64 / 100.0);
            prop_assert!(distance_to_polyline(points, p) <= tolerance + 1e-9);
        }
    }

    #[test]
    fn rotated_elliptical_arc_flattening_stays_within_tolerance(
        rx in 1.0f64..200.0,
        ry in 1.0f64..200.0,
        rotation in 0.0f64..180.0,
        end in prop::array::uniform2(-100.0f64..100.0),
        large_arc in any::<bool>(),
        sweep in any::<bool>(),
        tolerance in 0.01f64..1.0,
    ) {
        let from = point(0.0, 0.0);
        let to = point(end[0], end[1]);
        prop_assume!((to - from).length() > 1e-3);

        let arc = SvgArc {
            from,
            to,
            radii: vector(rx, ry),
            x_rotation: Angle::degrees(rotation),
            flags: ArcFlags { large_arc, sweep },
        }
        .to_arc();
        let path = Path::parse(&format!(
            "M 0 0 A {} {} {} {} {} {} {}",
            rx, ry, rotation, large_arc as u8, sweep as u8, to.x, to.y
        )).unwrap();
        let flattened = flatten_path(&path, tolerance);
        prop_assume!(!flattened.polylines.is_empty());
        let points = &flattened.polylines[0].points;
        prop_assert_eq!(*points.last().unwrap(), to);

        for i in 0..=100 {
            let p = arc.sample(i as f64 / 100.0);
            prop_assert!(distance_to_polyline(points, p) <= tolerance + 1e-6);
        }
    }

    #[test]
    fn transform_is_deterministic(
        x in -1000.0f64..1000.0,
        y in -1000.0f64..1000.0,
        origin in origin(),
        invert in any::<bool>(),
        scale in 0.1f64..10.0,
        offset in -50.0f64..50.0,
    ) {
        let config = ConversionConfig {
            machine_origin: origin,
            invert_y_axis: invert,
            scaling_factor: scale,
            horizontal_offset: offset,
            vertical_offset: -offset,
            ..ConversionConfig::default()
        };
        let size = layercut_compiler::DocumentSize::default();
        let a = MachineTransform::from_config(&config, &size).unwrap();
        let b = MachineTransform::from_config(&config, &size).unwrap();

        let p = point(x, y);
        let first = a.apply(p);
        // Interleave other work to show the result does not depend on call order
        let _ = a.apply(point(y, x));
        let second = b.apply(p);
        prop_assert_eq!(first.x.to_bits(), second.x.to_bits());
        prop_assert_eq!(first.y.to_bits(), second.y.to_bits());
    }

    #[test]
    fn polylines_and_passes_keep_their_order(
        count in 1usize..8,
        passes in 1u32..4,
    ) {
        let mut body = String::new();
        for i in 0..count {
            let x = 10.0 * i as f64;
            body.push_str(&format!("<path d=\"M {} 0 L {} 0 L {} 5\"/>", x, x + 5.0, x + 5.0));
        }
        let document = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">{}</svg>"#,
            body
        );
        let config = ConversionConfig {
            passes,
            invert_y_axis: false,
            ..ConversionConfig::default()
        };
        let compilation = Compiler::new(config).unwrap().compile_str(&document).unwrap();

        let mut travels = Vec::new();
        let mut depths: Vec<Vec<f64>> = Vec::new();
        for instruction in compilation.stream.body() {
            match instruction {
                Instruction::Travel { x, .. } => {
                    travels.push(*x);
                    depths.push(Vec::new());
                }
                Instruction::Cut { z, .. } => {
                    if let (Some(block), Some(z)) = (depths.last_mut(), z) {
                        block.push(*z);
                    }
                }
                _ => {}
            }
        }

        prop_assert_eq!(travels.len(), count);
        prop_assert!(travels.windows(2).all(|w| w[0] < w[1]));
        for block in depths {
            prop_assert!(block.windows(2).all(|w| w[1] <= w[0]));
        }
    }
}
