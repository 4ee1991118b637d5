use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

// ============================================================================
// Bidding Zones
// ============================================================================

/// Bidding-zone code, e.g. `HU` or the compound `DE_LU`.
///
/// The code string is the zone's whole identity. Zones are compared and
/// hashed by their code only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(String);

impl Zone {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Underscore-delimited tokens of the code (`DE_LU` -> `["DE", "LU"]`)
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split('_')
    }

    /// True when the code spans more than one filename token
    pub fn is_compound(&self) -> bool {
        self.0.contains('_')
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Zone {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for Zone {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl Borrow<str> for Zone {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Zone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Geography
// ============================================================================

/// Geographic position of a zone's map marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPosition {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for GeoPosition {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl From<GeoPosition> for (f64, f64) {
    fn from(p: GeoPosition) -> Self {
        (p.lat, p.lon)
    }
}

/// Graph node: one zone and, when the topology knows it, its position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub zone: Zone,
    pub position: Option<GeoPosition>,
}
