//! Unit conversion utilities
//!
//! Handles the two machine unit systems G-code can be emitted in and parsing
//! of user supplied lengths (with optional `mm`, `cm` or `in` suffix and
//! fractional inches).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Machine unit system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Units {
    /// Millimetres (G21)
    #[serde(rename = "mm")]
    Millimeters,
    /// Inches (G20)
    #[serde(rename = "in")]
    Inches,
}

impl Default for Units {
    fn default() -> Self {
        Self::Millimeters
    }
}

impl Units {
    /// Convert a length in millimetres into this unit
    pub fn from_mm(self, value_mm: f64) -> f64 {
        match self {
            Self::Millimeters => value_mm,
            Self::Inches => value_mm / MM_PER_INCH,
        }
    }

    /// Short label ("mm" or "in")
    pub fn label(self) -> &'static str {
        match self {
            Self::Millimeters => "mm",
            Self::Inches => "in",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "metric" | "millimeters" => Ok(Self::Millimeters),
            "in" | "inch" | "inches" | "imperial" => Ok(Self::Inches),
            _ => Err(format!("Unknown unit: {}", s)),
        }
    }
}

/// Parse a length string into `units`.
///
/// A bare number is taken to already be in `units`. A `mm`, `cm` or `in`
/// suffix converts from that unit. Inch values may be written as fractions
/// (`1 1/2in`, `3/8in`).
pub fn parse_length(input: &str, units: Units) -> Result<f64, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Empty length".to_string());
    }

    let (number, mm_factor) = if let Some(rest) = input.strip_suffix("mm") {
        (rest, Some(1.0))
    } else if let Some(rest) = input.strip_suffix("cm") {
        (rest, Some(10.0))
    } else if let Some(rest) = input.strip_suffix("in") {
        (rest, Some(MM_PER_INCH))
    } else {
        (input, None)
    };

    let value = parse_number_or_fraction(number.trim())?;
    match mm_factor {
        Some(factor) => Ok(units.from_mm(value * factor)),
        None => Ok(value),
    }
}

fn parse_number_or_fraction(input: &str) -> Result<f64, String> {
    if !input.contains('/') {
        return input.parse::<f64>().map_err(|e| e.to_string());
    }

    let negative = input.starts_with('-');
    let body = input.trim_start_matches('-');
    let mut total = 0.0;
    for part in body.split_whitespace() {
        if part.contains('/') {
            let frac_parts: Vec<&str> = part.split('/').collect();
            if frac_parts.len() != 2 {
                return Err("Invalid fraction format".to_string());
            }
            let num = frac_parts[0]
                .parse::<f64>()
                .map_err(|_| "Invalid numerator")?;
            let den = frac_parts[1]
                .parse::<f64>()
                .map_err(|_| "Invalid denominator")?;
            if den == 0.0 {
                return Err("Division by zero".to_string());
            }
            total += num / den;
        } else {
            total += part.parse::<f64>().map_err(|_| "Invalid number part")?;
        }
    }
    Ok(if negative { -total } else { total })
}
