//! Instruction emission
//!
//! [`InstructionEmitter`] is a small state machine that turns machine-space
//! polylines into an [`InstructionStream`]:
//!
//! ```text
//! Idle -> HeaderEmitted -> { Traveling -> ToolOn -> Cutting -> ToolOff }* -> FooterEmitted -> Done
//! ```
//!
//! Calls made out of order return [`EmitterError::InvalidTransition`].
//! Tool command text is copied into the stream untouched.

use crate::error::EmitterError;
use crate::flatten::Polyline;
use layercut_core::Units;
use layercut_settings::ConversionConfig;
use lyon::geom::Point;
use std::fmt;

/// One line of output
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `G90;`
    AbsolutePositioning,
    /// `G21;` or `G20;`
    Units(Units),
    /// `G0 X.. Y.. F..;`
    Travel { x: f64, y: f64, feed: f64 },
    /// `G0 Z.. F..;`
    TravelZ { z: f64, feed: f64 },
    /// `G1 X.. Y..[ Z..][ F..];`
    Cut {
        x: f64,
        y: f64,
        z: Option<f64>,
        feed: Option<f64>,
    },
    /// `G4 P..;` (milliseconds)
    Dwell { ms: f64 },
    /// `G92 X0 Y0 Z0;`
    ZeroCoordinates,
    /// User tool-on text
    ToolOn(String),
    /// User tool-off text
    ToolOff(String),
    /// `; text`
    Comment(String),
    /// User header/footer line
    Raw(String),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbsolutePositioning => f.write_str("G90;"),
            Self::Units(Units::Millimeters) => f.write_str("G21;"),
            Self::Units(Units::Inches) => f.write_str("G20;"),
            Self::Travel { x, y, feed } => {
                write!(f, "G0 X{} Y{} F{};", coord(*x), coord(*y), feed)
            }
            Self::TravelZ { z, feed } => write!(f, "G0 Z{} F{};", coord(*z), feed),
            Self::Cut { x, y, z, feed } => {
                write!(f, "G1 X{} Y{}", coord(*x), coord(*y))?;
                if let Some(z) = z {
                    write!(f, " Z{}", coord(*z))?;
                }
                if let Some(feed) = feed {
                    write!(f, " F{}", feed)?;
                }
                f.write_str(";")
            }
            Self::Dwell { ms } => write!(f, "G4 P{};", ms),
            Self::ZeroCoordinates => f.write_str("G92 X0 Y0 Z0;"),
            Self::ToolOn(text) | Self::ToolOff(text) | Self::Raw(text) => f.write_str(text),
            Self::Comment(text) => write!(f, "; {}", text),
        }
    }
}

/// Three decimals, never `-0.000`
fn coord(value: f64) -> String {
    let text = format!("{:.3}", value);
    if text == "-0.000" {
        "0.000".to_string()
    } else {
        text
    }
}

/// Emitted program, split into header, body and footer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstructionStream {
    header: Vec<Instruction>,
    body: Vec<Instruction>,
    footer: Vec<Instruction>,
}

impl InstructionStream {
    pub(crate) fn from_sections(
        header: Vec<Instruction>,
        body: Vec<Instruction>,
        footer: Vec<Instruction>,
    ) -> Self {
        Self {
            header,
            body,
            footer,
        }
    }

    pub fn header(&self) -> &[Instruction] {
        &self.header
    }

    pub fn body(&self) -> &[Instruction] {
        &self.body
    }

    pub fn footer(&self) -> &[Instruction] {
        &self.footer
    }

    /// All instructions in output order
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.header.iter().chain(&self.body).chain(&self.footer)
    }

    pub fn len(&self) -> usize {
        self.header.len() + self.body.len() + self.footer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unit directive from the header, if any
    pub fn units(&self) -> Option<Units> {
        self.header.iter().find_map(|instruction| match instruction {
            Instruction::Units(units) => Some(*units),
            _ => None,
        })
    }

    /// Render as text, one instruction per line, each terminated by `\n`
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InstructionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in self.instructions() {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

/// Emitter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    Idle,
    HeaderEmitted,
    Traveling,
    ToolOn,
    Cutting,
    ToolOff,
    FooterEmitted,
    Done,
}

impl fmt::Display for EmitterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::HeaderEmitted => "header-emitted",
            Self::Traveling => "traveling",
            Self::ToolOn => "tool-on",
            Self::Cutting => "cutting",
            Self::ToolOff => "tool-off",
            Self::FooterEmitted => "footer-emitted",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Stateful encoder for one compilation
#[derive(Debug)]
pub struct InstructionEmitter<'c> {
    config: &'c ConversionConfig,
    state: EmitterState,
    stream: InstructionStream,
    /// Modal feed rate of the last cutting move
    feed: Option<f64>,
    tool_used: bool,
    polylines: usize,
}

impl<'c> InstructionEmitter<'c> {
    pub fn new(config: &'c ConversionConfig) -> Self {
        Self {
            config,
            state: EmitterState::Idle,
            stream: InstructionStream::default(),
            feed: None,
            tool_used: false,
            polylines: 0,
        }
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    /// Number of polylines emitted so far
    pub fn polylines(&self) -> usize {
        self.polylines
    }

    fn expect(&self, action: &'static str, allowed: &[EmitterState]) -> Result<(), EmitterError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(EmitterError::InvalidTransition {
                action,
                state: self.state.to_string(),
            })
        }
    }

    /// Positioning mode, units, a safe tool-off, optional Z start and user lines
    pub fn emit_header(&mut self) -> Result<(), EmitterError> {
        self.expect("emit header", &[EmitterState::Idle])?;

        let config = self.config;
        let header = &mut self.stream.header;
        header.push(Instruction::AbsolutePositioning);
        header.push(Instruction::Units(config.unit));
        header.push(Instruction::ToolOff(config.tool_off_command.clone()));
        if let Some(z) = config.z_axis_start {
            header.push(Instruction::TravelZ {
                z,
                feed: config.travel_speed,
            });
        }
        header.extend(config.header.iter().cloned().map(Instruction::Raw));

        self.state = EmitterState::HeaderEmitted;
        Ok(())
    }

    /// Travel, tool-on, optional dwell, every pass, then tool-off.
    ///
    /// Polylines with fewer than two points produce nothing.
    pub fn emit_polyline(&mut self, polyline: &Polyline) -> Result<(), EmitterError> {
        self.expect(
            "emit polyline",
            &[EmitterState::HeaderEmitted, EmitterState::ToolOff],
        )?;

        let mut route: Vec<Point<f64>> = polyline.points.clone();
        if route.len() < 2 {
            return Ok(());
        }
        if polyline.closed && route.first() != route.last() {
            route.push(route[0]);
        }

        let config = self.config;
        let start = route[0];

        self.state = EmitterState::Traveling;
        self.stream.body.push(Instruction::Travel {
            x: start.x,
            y: start.y,
            feed: config.travel_speed,
        });
        self.feed = None;

        self.state = EmitterState::ToolOn;
        self.stream
            .body
            .push(Instruction::ToolOn(config.tool_power_command.clone()));
        self.tool_used = true;
        if config.dwell_time > 0.0 {
            self.stream.body.push(Instruction::Dwell {
                ms: config.dwell_time,
            });
        }

        self.state = EmitterState::Cutting;
        let with_depth = config.passes > 1 || config.z_axis_start.is_some();
        let z_start = config.z_axis_start.unwrap_or(0.0);

        for pass in 0..config.passes {
            let z = with_depth.then(|| z_start - f64::from(pass) * config.pass_depth);
            // Open paths run back and forth so each pass starts where the last ended
            let reversed = !polyline.closed && pass % 2 == 1;
            let targets: Vec<Point<f64>> = if reversed {
                route.iter().rev().skip(1).copied().collect()
            } else {
                route[1..].to_vec()
            };

            for target in targets {
                let feed = if self.feed == Some(config.cutting_speed) {
                    None
                } else {
                    Some(config.cutting_speed)
                };
                self.feed = Some(config.cutting_speed);
                self.stream.body.push(Instruction::Cut {
                    x: target.x,
                    y: target.y,
                    z,
                    feed,
                });
            }
        }

        if !config.defer_tool_off {
            self.stream
                .body
                .push(Instruction::ToolOff(config.tool_off_command.clone()));
        }
        self.state = EmitterState::ToolOff;
        self.polylines += 1;
        Ok(())
    }

    /// Deferred tool-off, return to origin, zeroing, user lines, final tool-off
    pub fn emit_footer(&mut self) -> Result<(), EmitterError> {
        self.expect(
            "emit footer",
            &[EmitterState::HeaderEmitted, EmitterState::ToolOff],
        )?;

        let config = self.config;
        if config.defer_tool_off && self.tool_used {
            self.stream
                .body
                .push(Instruction::ToolOff(config.tool_off_command.clone()));
        }

        let footer = &mut self.stream.footer;
        if config.move_to_origin_end {
            footer.push(Instruction::Travel {
                x: 0.0,
                y: 0.0,
                feed: config.travel_speed,
            });
        }
        if config.zero_machine {
            footer.push(Instruction::ZeroCoordinates);
        }
        footer.extend(config.footer.iter().cloned().map(Instruction::Raw));

        // Every emitted polyline already ends in a tool-off, per path or deferred
        let covered = self.tool_used
            || matches!(self.stream.instructions().last(), Some(Instruction::ToolOff(_)));
        if config.tool_off_at_end && !covered {
            self.stream
                .footer
                .push(Instruction::ToolOff(config.tool_off_command.clone()));
        }

        self.state = EmitterState::FooterEmitted;
        Ok(())
    }

    /// Hand over the finished stream
    pub fn finish(mut self) -> Result<InstructionStream, EmitterError> {
        self.expect("finish", &[EmitterState::FooterEmitted])?;
        self.state = EmitterState::Done;
        Ok(self.stream)
    }
}

/// Emit a complete program for `polylines` in order
pub fn emit_program(
    config: &ConversionConfig,
    polylines: &[Polyline],
) -> Result<InstructionStream, EmitterError> {
    let mut emitter = InstructionEmitter::new(config);
    emitter.emit_header()?;
    for polyline in polylines {
        emitter.emit_polyline(polyline)?;
    }
    emitter.emit_footer()?;
    emitter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::geom::point;

    fn square() -> Polyline {
        Polyline::new(
            vec![
                point(0.0, 0.0),
                point(10.0, 0.0),
                point(10.0, 10.0),
                point(0.0, 10.0),
                point(0.0, 0.0),
            ],
            true,
        )
    }

    fn lines(stream: &InstructionStream) -> Vec<String> {
        stream.instructions().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_single_pass_square() {
        let config = ConversionConfig::default();
        let stream = emit_program(&config, &[square()]).unwrap();
        assert_eq!(
            lines(&stream),
            [
                "G90;",
                "G21;",
                "M5;",
                "G0 X0.000 Y0.000 F3000;",
                "M3 S255;",
                "G1 X10.000 Y0.000 F750;",
                "G1 X10.000 Y10.000;",
                "G1 X0.000 Y10.000;",
                "G1 X0.000 Y0.000;",
                "M5;",
            ]
        );
    }

    #[test]
    fn test_multi_pass_steps_depth() {
        let config = ConversionConfig {
            passes: 3,
            pass_depth: 0.5,
            dwell_time: 250.0,
            ..ConversionConfig::default()
        };
        let stream = emit_program(&config, &[square()]).unwrap();
        let body: Vec<String> = stream.body().iter().map(|i| i.to_string()).collect();

        assert_eq!(body.iter().filter(|l| *l == "M3 S255;").count(), 1);
        assert_eq!(body.iter().filter(|l| *l == "M5;").count(), 1);
        assert_eq!(body.iter().filter(|l| l.starts_with("G4")).count(), 1);
        assert_eq!(body[2], "G4 P250;");
        assert_eq!(body[3], "G1 X10.000 Y0.000 Z0.000 F750;");
        assert_eq!(body[7], "G1 X10.000 Y0.000 Z-0.500;");
        assert_eq!(body[14], "G1 X0.000 Y0.000 Z-1.000;");
    }

    #[test]
    fn test_open_paths_alternate_direction() {
        let config = ConversionConfig {
            passes: 2,
            ..ConversionConfig::default()
        };
        let line = Polyline::new(vec![point(0.0, 0.0), point(5.0, 0.0), point(5.0, 5.0)], false);
        let stream = emit_program(&config, &[line]).unwrap();
        let cuts: Vec<String> = stream
            .body()
            .iter()
            .filter(|i| matches!(i, Instruction::Cut { .. }))
            .map(|i| i.to_string())
            .collect();
        assert_eq!(
            cuts,
            [
                "G1 X5.000 Y0.000 Z0.000 F750;",
                "G1 X5.000 Y5.000 Z0.000;",
                "G1 X5.000 Y0.000 Z-1.000;",
                "G1 X0.000 Y0.000 Z-1.000;",
            ]
        );
    }

    #[test]
    fn test_deferred_tool_off_and_footer_options() {
        let config = ConversionConfig {
            defer_tool_off: true,
            move_to_origin_end: true,
            zero_machine: true,
            z_axis_start: Some(3.0),
            header: vec!["$H".to_string()],
            footer: vec!["M2".to_string()],
            ..ConversionConfig::default()
        };
        let stream = emit_program(&config, &[square(), square()]).unwrap();

        let header: Vec<String> = stream.header().iter().map(|i| i.to_string()).collect();
        assert_eq!(header, ["G90;", "G21;", "M5;", "G0 Z3.000 F3000;", "$H"]);
        let body = stream.body();
        assert_eq!(body.iter().filter(|i| matches!(i, Instruction::ToolOff(_))).count(), 1);
        assert!(matches!(body.last(), Some(Instruction::ToolOff(_))));
        // Every travel resets the modal feed
        assert_eq!(body[8].to_string(), "G1 X10.000 Y0.000 Z3.000 F750;");

        let footer: Vec<String> = stream.footer().iter().map(|i| i.to_string()).collect();
        assert_eq!(footer, ["G0 X0.000 Y0.000 F3000;", "G92 X0 Y0 Z0;", "M2"]);
        let tool_offs = stream
            .instructions()
            .filter(|i| matches!(i, Instruction::ToolOff(_)))
            .count();
        assert_eq!(tool_offs, 2);
    }

    #[test]
    fn test_trailing_tool_off_only_when_uncovered() {
        let config = ConversionConfig {
            footer: vec!["M2".to_string()],
            ..ConversionConfig::default()
        };
        let stream = emit_program(&config, &[square()]).unwrap();
        assert!(stream.render().ends_with("G1 X0.000 Y0.000;\nM5;\nM2\n"));

        // Nothing cut, but user lines follow the header tool-off
        let config = ConversionConfig {
            header: vec!["$H".to_string()],
            ..ConversionConfig::default()
        };
        let stream = emit_program(&config, &[]).unwrap();
        assert_eq!(lines(&stream), ["G90;", "G21;", "M5;", "$H", "M5;"]);

        let config = ConversionConfig {
            header: vec!["$H".to_string()],
            tool_off_at_end: false,
            ..ConversionConfig::default()
        };
        assert!(emit_program(&config, &[]).unwrap().footer().is_empty());
    }

    #[test]
    fn test_out_of_order_calls_are_rejected() {
        let config = ConversionConfig::default();
        let mut emitter = InstructionEmitter::new(&config);
        assert!(emitter.emit_polyline(&square()).is_err());
        assert!(emitter.emit_footer().is_err());

        emitter.emit_header().unwrap();
        let err = emitter.emit_header().unwrap_err();
        assert_eq!(
            err,
            EmitterError::InvalidTransition {
                action: "emit header",
                state: "header-emitted".to_string()
            }
        );

        emitter.emit_polyline(&square()).unwrap();
        assert_eq!(emitter.state(), EmitterState::ToolOff);
        emitter.emit_footer().unwrap();
        assert!(emitter.emit_polyline(&square()).is_err());
        assert!(emitter.finish().is_ok());
    }

    #[test]
    fn test_short_polylines_emit_nothing() {
        let config = ConversionConfig::default();
        let dot = Polyline::new(vec![point(1.0, 1.0)], false);
        let stream = emit_program(&config, &[dot]).unwrap();
        assert!(stream.body().is_empty());
    }

    #[test]
    fn test_coordinate_formatting() {
        let cut = Instruction::Cut {
            x: -0.0001,
            y: 12.34567,
            z: None,
            feed: Some(1500.5),
        };
        assert_eq!(cut.to_string(), "G1 X0.000 Y12.346 F1500.5;");
        assert_eq!(Instruction::Units(Units::Inches).to_string(), "G20;");
        assert_eq!(Instruction::Comment("hi".to_string()).to_string(), "; hi");
    }

    #[test]
    fn test_render_terminates_lines() {
        let stream = emit_program(&ConversionConfig::default(), &[]).unwrap();
        assert_eq!(stream.render(), "G90;\nG21;\nM5;\n");
        assert_eq!(stream.units(), Some(Units::Millimeters));
    }
}
