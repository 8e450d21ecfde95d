//! Path commands and SVG path data parsing.
//!
//! Every command is stored in absolute coordinates. Relative, horizontal,
//! vertical and smooth SVG commands are resolved while parsing so the
//! flattener only sees six command kinds.

use lyon::geom::{point, vector, Point, Vector};
use svgtypes::{PathParser, PathSegment};

/// A single absolute drawing command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new subpath
    MoveTo(Point<f64>),
    /// Straight line to a point
    LineTo(Point<f64>),
    /// Cubic Bézier curve
    CubicTo {
        ctrl1: Point<f64>,
        ctrl2: Point<f64>,
        to: Point<f64>,
    },
    /// Quadratic Bézier curve
    QuadraticTo { ctrl: Point<f64>, to: Point<f64> },
    /// Elliptical arc in SVG endpoint parameterisation
    ArcTo {
        radii: Vector<f64>,
        /// Rotation of the ellipse's x axis, in degrees
        x_rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point<f64>,
    },
    /// Close the current subpath
    Close,
}

/// An immutable sequence of absolute drawing commands
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// Build a path from already-absolute commands
    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    /// Commands in drawing order
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// True if the path has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of subpaths (one per `MoveTo`)
    pub fn subpath_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count()
    }

    /// Parse SVG path data (the `d` attribute).
    ///
    /// Empty or whitespace-only data yields an empty path.
    pub fn parse(data: &str) -> Result<Self, String> {
        let mut commands = Vec::new();
        let mut current = point(0.0, 0.0);
        let mut start = current;
        let mut open_subpath = false;
        // Reflection sources for S/s and T/t
        let mut last_cubic_ctrl: Option<Point<f64>> = None;
        let mut last_quad_ctrl: Option<Point<f64>> = None;

        for segment in PathParser::from(data) {
            let segment = segment.map_err(|e| e.to_string())?;

            let resolve = |abs: bool, x: f64, y: f64| {
                if abs {
                    point(x, y)
                } else {
                    point(current.x + x, current.y + y)
                }
            };

            if let PathSegment::MoveTo { abs, x, y } = segment {
                current = resolve(abs, x, y);
                start = current;
                open_subpath = true;
                commands.push(PathCommand::MoveTo(current));
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
                continue;
            }

            // Drawing after a close (or without any move) restarts at the subpath start
            if !open_subpath {
                commands.push(PathCommand::MoveTo(current));
                start = current;
                open_subpath = true;
            }

            let mut cubic_ctrl = None;
            let mut quad_ctrl = None;

            match segment {
                PathSegment::MoveTo { .. } => {}
                PathSegment::LineTo { abs, x, y } => {
                    current = resolve(abs, x, y);
                    commands.push(PathCommand::LineTo(current));
                }
                PathSegment::HorizontalLineTo { abs, x } => {
                    current = if abs {
                        point(x, current.y)
                    } else {
                        point(current.x + x, current.y)
                    };
                    commands.push(PathCommand::LineTo(current));
                }
                PathSegment::VerticalLineTo { abs, y } => {
                    current = if abs {
                        point(current.x, y)
                    } else {
                        point(current.x, current.y + y)
                    };
                    commands.push(PathCommand::LineTo(current));
                }
                PathSegment::CurveTo {
                    abs,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let ctrl1 = resolve(abs, x1, y1);
                    let ctrl2 = resolve(abs, x2, y2);
                    let to = resolve(abs, x, y);
                    commands.push(PathCommand::CubicTo { ctrl1, ctrl2, to });
                    cubic_ctrl = Some(ctrl2);
                    current = to;
                }
                PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                    let ctrl1 = reflect(last_cubic_ctrl, current);
                    let ctrl2 = resolve(abs, x2, y2);
                    let to = resolve(abs, x, y);
                    commands.push(PathCommand::CubicTo { ctrl1, ctrl2, to });
                    cubic_ctrl = Some(ctrl2);
                    current = to;
                }
                PathSegment::Quadratic { abs, x1, y1, x, y } => {
                    let ctrl = resolve(abs, x1, y1);
                    let to = resolve(abs, x, y);
                    commands.push(PathCommand::QuadraticTo { ctrl, to });
                    quad_ctrl = Some(ctrl);
                    current = to;
                }
                PathSegment::SmoothQuadratic { abs, x, y } => {
                    let ctrl = reflect(last_quad_ctrl, current);
                    let to = resolve(abs, x, y);
                    commands.push(PathCommand::QuadraticTo { ctrl, to });
                    quad_ctrl = Some(ctrl);
                    current = to;
                }
                PathSegment::EllipticalArc {
                    abs,
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                } => {
                    let to = resolve(abs, x, y);
                    commands.push(PathCommand::ArcTo {
                        radii: vector(rx.abs(), ry.abs()),
                        x_rotation: x_axis_rotation,
                        large_arc,
                        sweep,
                        to,
                    });
                    current = to;
                }
                PathSegment::ClosePath { .. } => {
                    commands.push(PathCommand::Close);
                    current = start;
                    open_subpath = false;
                }
            }

            last_cubic_ctrl = cubic_ctrl;
            last_quad_ctrl = quad_ctrl;
        }

        Ok(Self { commands })
    }

    /// Axis-aligned rectangle, optionally with rounded corners.
    ///
    /// Returns `None` for non-positive width or height. A zero corner radius
    /// on one axis takes the other axis' value; radii are clamped to half the
    /// side length.
    pub fn rect(x: f64, y: f64, width: f64, height: f64, rx: f64, ry: f64) -> Option<Self> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        let (mut rx, mut ry) = (rx.max(0.0), ry.max(0.0));
        if rx == 0.0 && ry == 0.0 {
            return Some(Self::polygon(&[
                (x, y),
                (x + width, y),
                (x + width, y + height),
                (x, y + height),
            ]));
        }
        if ry == 0.0 {
            ry = rx;
        }
        if rx == 0.0 {
            rx = ry;
        }
        rx = rx.min(width / 2.0);
        ry = ry.min(height / 2.0);

        let corner = |to: Point<f64>| PathCommand::ArcTo {
            radii: vector(rx, ry),
            x_rotation: 0.0,
            large_arc: false,
            sweep: true,
            to,
        };

        Some(Self::from_commands(vec![
            PathCommand::MoveTo(point(x + rx, y)),
            PathCommand::LineTo(point(x + width - rx, y)),
            corner(point(x + width, y + ry)),
            PathCommand::LineTo(point(x + width, y + height - ry)),
            corner(point(x + width - rx, y + height)),
            PathCommand::LineTo(point(x + rx, y + height)),
            corner(point(x, y + height - ry)),
            PathCommand::LineTo(point(x, y + ry)),
            corner(point(x + rx, y)),
            PathCommand::Close,
        ]))
    }

    /// Ellipse (or circle when `rx == ry`) as two half arcs.
    /// Returns `None` for non-positive radii.
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Option<Self> {
        if rx <= 0.0 || ry <= 0.0 {
            return None;
        }

        let half = |to: Point<f64>| PathCommand::ArcTo {
            radii: vector(rx, ry),
            x_rotation: 0.0,
            large_arc: true,
            sweep: true,
            to,
        };

        Some(Self::from_commands(vec![
            PathCommand::MoveTo(point(cx - rx, cy)),
            half(point(cx + rx, cy)),
            half(point(cx - rx, cy)),
            PathCommand::Close,
        ]))
    }

    /// Single straight segment
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::from_commands(vec![
            PathCommand::MoveTo(point(x1, y1)),
            PathCommand::LineTo(point(x2, y2)),
        ])
    }

    /// Open polyline through the points
    pub fn polyline(points: &[(f64, f64)]) -> Self {
        let mut commands = Vec::with_capacity(points.len());
        for (i, &(x, y)) in points.iter().enumerate() {
            if i == 0 {
                commands.push(PathCommand::MoveTo(point(x, y)));
            } else {
                commands.push(PathCommand::LineTo(point(x, y)));
            }
        }
        Self::from_commands(commands)
    }

    /// Closed polygon through the points
    pub fn polygon(points: &[(f64, f64)]) -> Self {
        let mut path = Self::polyline(points);
        if !path.is_empty() {
            path.commands.push(PathCommand::Close);
        }
        path
    }
}

fn reflect(ctrl: Option<Point<f64>>, around: Point<f64>) -> Point<f64> {
    match ctrl {
        Some(c) => point(2.0 * around.x - c.x, 2.0 * around.y - c.y),
        None => around,
    }
}
