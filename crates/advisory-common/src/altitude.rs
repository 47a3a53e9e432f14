//! Altitude band selection.

use serde::{Deserialize, Serialize};

use crate::error::{AdvisoryError, AdvisoryResult};

/// Upper bound of the selectable altitude domain, in feet.
pub const MAX_ALTITUDE_FT: u32 = 48_000;

/// Ordered altitude band in feet, `0 <= min <= max <= 48000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct AltitudeRange {
    min: u32,
    max: u32,
}

impl AltitudeRange {
    /// The whole selectable domain.
    pub const FULL: AltitudeRange = AltitudeRange {
        min: 0,
        max: MAX_ALTITUDE_FT,
    };

    /// Create a range, rejecting inverted or out-of-domain bounds.
    pub fn new(min: u32, max: u32) -> AdvisoryResult<Self> {
        if min > max {
            return Err(AdvisoryError::InvalidAltitudeRange {
                min,
                max,
                message: "min must not exceed max".to_string(),
            });
        }
        if max > MAX_ALTITUDE_FT {
            return Err(AdvisoryError::InvalidAltitudeRange {
                min,
                max,
                message: format!("max must not exceed {} ft", MAX_ALTITUDE_FT),
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Default for AltitudeRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<[u32; 2]> for AltitudeRange {
    type Error = AdvisoryError;

    fn try_from(value: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1])
    }
}

impl From<AltitudeRange> for [u32; 2] {
    fn from(range: AltitudeRange) -> Self {
        [range.min, range.max]
    }
}
