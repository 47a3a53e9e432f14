//! Advisory categories and their static rendering configuration.
//!
//! Every per-category detail (engine identifiers, attribute names, colors)
//! lives in a single [`CategorySpec`] table entry so callers iterate over
//! [`Category::ALL`] instead of branching per category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AdvisoryError;

/// Fill opacity shared by every advisory layer.
pub const FILL_OPACITY: f64 = 0.4;

/// Category of aviation hazard advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sigmet,
    Airsigmet,
}

/// Paint configuration of a polygon fill layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FillPaint {
    #[serde(rename = "fill-color")]
    pub fill_color: &'static str,
    #[serde(rename = "fill-opacity")]
    pub fill_opacity: f64,
    #[serde(rename = "fill-outline-color")]
    pub fill_outline_color: &'static str,
}

/// Static configuration for one advisory category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategorySpec {
    pub category: Category,
    /// Upstream and proxy path segment (e.g. "isigmet").
    pub endpoint: &'static str,
    pub source_id: &'static str,
    pub layer_id: &'static str,
    /// Attribute pair (lower, upper) read by the altitude filter.
    pub filter_altitude_props: (&'static str, &'static str),
    /// Attribute pair (lower, upper) shown in popups.
    pub display_altitude_props: (&'static str, &'static str),
    pub raw_text_prop: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

const SIGMET: CategorySpec = CategorySpec {
    category: Category::Sigmet,
    endpoint: "isigmet",
    source_id: "sigmet-source",
    layer_id: "sigmet-layer",
    filter_altitude_props: ("base", "top"),
    display_altitude_props: ("base", "top"),
    raw_text_prop: "rawSigmet",
    label: "SIGMET",
    color: "#d9534f",
};

const AIRSIGMET: CategorySpec = CategorySpec {
    category: Category::Airsigmet,
    endpoint: "airsigmet",
    source_id: "airsigmet-source",
    layer_id: "airsigmet-layer",
    filter_altitude_props: ("altitudeHi1", "altitudeHi2"),
    display_altitude_props: ("altitudeLow1", "altitudeHi1"),
    raw_text_prop: "rawAirSigmet",
    label: "AIRSIGMET",
    color: "#428bca",
};

impl Category {
    /// All categories in layer stacking order (first is drawn lowest).
    pub const ALL: [Category; 2] = [Category::Sigmet, Category::Airsigmet];

    /// Configuration table entry for this category.
    pub fn spec(self) -> &'static CategorySpec {
        match self {
            Category::Sigmet => &SIGMET,
            Category::Airsigmet => &AIRSIGMET,
        }
    }

    /// Resolve the category owning an engine layer id.
    pub fn from_layer_id(layer_id: &str) -> Option<Category> {
        Self::ALL
            .into_iter()
            .find(|c| c.spec().layer_id == layer_id)
    }

    /// Resolve the category served at a proxy/upstream path segment.
    pub fn from_endpoint(endpoint: &str) -> Option<Category> {
        let endpoint = endpoint.trim_start_matches('/');
        Self::ALL
            .into_iter()
            .find(|c| c.spec().endpoint == endpoint)
    }

    /// Layer ids of every category, in stacking order.
    pub fn layer_ids() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.spec().layer_id).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Sigmet => "sigmet",
            Category::Airsigmet => "airsigmet",
        }
    }
}

impl CategorySpec {
    /// Fill paint for this category's layer.
    pub fn paint(&self) -> FillPaint {
        FillPaint {
            fill_color: self.color,
            fill_opacity: FILL_OPACITY,
            fill_outline_color: self.color,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AdvisoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sigmet" => Ok(Category::Sigmet),
            "airsigmet" => Ok(Category::Airsigmet),
            other => Err(AdvisoryError::UnknownCategory(other.to_string())),
        }
    }
}

/// Set of categories the host currently wants rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilitySet(BTreeSet<Category>);

impl VisibilitySet {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn all() -> Self {
        Self(Category::ALL.into_iter().collect())
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn insert(&mut self, category: Category) -> bool {
        self.0.insert(category)
    }

    pub fn remove(&mut self, category: Category) -> bool {
        self.0.remove(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }
}

impl Default for VisibilitySet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Category> for VisibilitySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
