//! Common types shared by the advisory map core, client and proxy.

pub mod altitude;
pub mod category;
pub mod error;
pub mod geojson;
pub mod time;

pub use altitude::{AltitudeRange, MAX_ALTITUDE_FT};
pub use category::{Category, CategorySpec, FillPaint, VisibilitySet};
pub use error::{AdvisoryError, AdvisoryResult};
pub use geojson::{Feature, FeatureCollection, Geometry, Position, Properties};
pub use time::{format_validity, parse_validity};
