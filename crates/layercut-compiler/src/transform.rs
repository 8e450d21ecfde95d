//! Document to machine coordinate mapping
//!
//! Steps are applied in a fixed order: unit conversion, uniform scale,
//! origin placement on the bed, offsets, then Y inversion. The transform
//! only holds precomputed constants so it can be applied from any thread.

use crate::document::DocumentSize;
use crate::error::CompileError;
use crate::flatten::Polyline;
use layercut_settings::{ConversionConfig, MachineOrigin};
use lyon::geom::{point, vector, Point, Vector};

/// Mapping from document space to machine space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineTransform {
    /// Machine units per document user unit
    unit_factor: f64,
    scale: f64,
    bed_width: f64,
    bed_height: f64,
    /// Bed minimum corner relative to the machine origin
    bed_min: Vector<f64>,
    /// Scaled document point placed on `bed_min`
    anchor: Vector<f64>,
    offset: Vector<f64>,
    invert_y: bool,
}

impl MachineTransform {
    /// Build the transform for `config` and a document's size.
    ///
    /// With `use_document_size` the bed is the document's extents after unit
    /// conversion and scaling, and a document without usable extents is an
    /// error.
    pub fn from_config(config: &ConversionConfig, size: &DocumentSize) -> Result<Self, CompileError> {
        let unit_factor = config.unit.from_mm(size.user_unit_mm());
        let k = unit_factor * config.scaling_factor;

        let (bed_width, bed_height, anchor) = if config.use_document_size {
            let extents = size.extents().ok_or(CompileError::DocumentSizeUnavailable)?;
            let (a, b) = (extents.min, extents.max);
            (
                (extents.width() * k).abs(),
                (extents.height() * k).abs(),
                vector((a.x * k).min(b.x * k), (a.y * k).min(b.y * k)),
            )
        } else {
            (config.bed_width, config.bed_height, vector(0.0, 0.0))
        };

        let bed_min = match config.machine_origin {
            MachineOrigin::BottomLeft => vector(0.0, 0.0),
            MachineOrigin::TopLeft => vector(0.0, -bed_height),
            MachineOrigin::BottomRight => vector(-bed_width, 0.0),
            MachineOrigin::TopRight => vector(-bed_width, -bed_height),
            MachineOrigin::Center => vector(-bed_width / 2.0, -bed_height / 2.0),
        };

        let transform = Self {
            unit_factor,
            scale: config.scaling_factor,
            bed_width,
            bed_height,
            bed_min,
            anchor,
            offset: vector(config.horizontal_offset, config.vertical_offset),
            invert_y: config.invert_y_axis,
        };
        tracing::debug!(
            "Machine transform: {:.4} {}/unit, scale {}, bed {:.3}x{:.3} at ({:.3}, {:.3}), origin {}",
            unit_factor,
            config.unit,
            config.scaling_factor,
            bed_width,
            bed_height,
            bed_min.x,
            bed_min.y,
            config.machine_origin
        );
        Ok(transform)
    }

    /// Map one document point into machine space
    pub fn apply(&self, p: Point<f64>) -> Point<f64> {
        let converted = point(p.x * self.unit_factor, p.y * self.unit_factor);
        let scaled = point(converted.x * self.scale, converted.y * self.scale);
        let placed = scaled - self.anchor + self.bed_min;
        let shifted = placed + self.offset;

        if self.invert_y {
            let mirror = 2.0 * (self.bed_min.y + self.offset.y) + self.bed_height;
            point(shifted.x, mirror - shifted.y)
        } else {
            shifted
        }
    }

    /// Map every vertex of a polyline
    pub fn apply_polyline(&self, polyline: &Polyline) -> Polyline {
        Polyline::new(
            polyline.points.iter().map(|p| self.apply(*p)).collect(),
            polyline.closed,
        )
    }

    /// Magnitude of the document to machine scale
    pub fn document_scale(&self) -> f64 {
        (self.unit_factor * self.scale).abs()
    }

    /// Bed size in machine units
    pub fn bed_size(&self) -> (f64, f64) {
        (self.bed_width, self.bed_height)
    }
}
