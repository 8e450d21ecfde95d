//! # layercut Core
//!
//! Shared types for the layercut workspace: the unified error type and the
//! measurement units machines are driven in.

pub mod error;
pub mod units;

pub use error::{Error, Result};
pub use units::{parse_length, Units, MM_PER_INCH};
