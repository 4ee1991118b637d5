//! Static zone topology: which bidding zones border each other and where
//! they sit on the map.
//!
//! Declaration order matters. For every unordered pair of zones, the first
//! declared `(zone, neighbor)` pair fixes the direction that counts as
//! positive flow on the resulting graph edge.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::domain::{GeoPosition, Zone};

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Failed to read topology file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid topology definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Zone code must not be empty")]
    EmptyCode,

    #[error("Zone {0} is declared more than once")]
    DuplicateZone(Zone),
}

/// One declared zone with its neighbors and map position
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
    pub code: Zone,
    #[serde(default)]
    pub neighbors: Vec<Zone>,
    #[serde(default)]
    pub position: Option<GeoPosition>,
}

impl ZoneEntry {
    pub fn new(code: &str, neighbors: &[&str], position: Option<GeoPosition>) -> Self {
        Self {
            code: Zone::from(code),
            neighbors: neighbors.iter().map(|n| Zone::from(*n)).collect(),
            position,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TopologyFile {
    zones: Vec<ZoneEntry>,
}

/// Zone table in declaration order
#[derive(Debug, Clone)]
pub struct Topology {
    zones: Vec<ZoneEntry>,
}

impl Topology {
    pub fn new(zones: Vec<ZoneEntry>) -> Result<Self, TopologyError> {
        let mut seen = HashSet::new();
        for entry in &zones {
            if entry.code.as_str().is_empty()
                || entry.neighbors.iter().any(|n| n.as_str().is_empty())
            {
                return Err(TopologyError::EmptyCode);
            }
            if !seen.insert(entry.code.clone()) {
                return Err(TopologyError::DuplicateZone(entry.code.clone()));
            }
        }
        Ok(Self { zones })
    }

    /// Parse a table of the form
    ///
    /// ```toml
    /// [[zones]]
    /// code = "AT"
    /// neighbors = ["HU", "SI"]
    /// position = [47.5162, 14.5501]
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, TopologyError> {
        let file: TopologyFile = toml::from_str(s)?;
        Self::new(file.zones)
    }

    pub fn load(path: &Path) -> Result<Self, TopologyError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Built-in table of the central European bidding zones
    pub fn european() -> Self {
        let p = |lat, lon| Some(GeoPosition::new(lat, lon));
        Self {
            zones: vec![
                ZoneEntry::new("FR", &["DE_LU", "BE"], p(46.6033, 1.8883)),
                ZoneEntry::new(
                    "DE_LU",
                    &["FR", "BE", "PL", "CZ", "AT", "NL"],
                    p(51.1657, 10.4515),
                ),
                ZoneEntry::new("PL", &["DE_LU", "CZ", "SK"], p(51.9194, 19.1451)),
                ZoneEntry::new("CZ", &["DE_LU", "PL", "SK", "AT"], p(49.8175, 15.4730)),
                ZoneEntry::new("SK", &["PL", "CZ", "HU", "AT"], p(48.6690, 19.6990)),
                ZoneEntry::new("HU", &["SK", "AT", "HR", "SI", "RO"], p(47.1625, 19.5033)),
                ZoneEntry::new("AT", &["DE_LU", "CZ", "SK", "HU", "SI"], p(47.5162, 14.5501)),
                ZoneEntry::new("BE", &["FR", "DE_LU", "NL"], p(50.5039, 4.4699)),
                ZoneEntry::new("NL", &["DE_LU", "BE"], p(52.1326, 5.2913)),
                ZoneEntry::new("SI", &["AT", "HU", "HR"], p(46.1512, 14.9955)),
                ZoneEntry::new("HR", &["HU", "SI"], p(45.1, 15.2)),
                ZoneEntry::new("RO", &["HU", "BG"], p(45.9432, 24.9668)),
                ZoneEntry::new("BG", &["RO"], p(42.7339, 25.4858)),
            ],
        }
    }

    pub fn zones(&self) -> &[ZoneEntry] {
        &self.zones
    }

    pub fn entry(&self, zone: &str) -> Option<&ZoneEntry> {
        self.zones.iter().find(|e| e.code.as_str() == zone)
    }

    pub fn neighbors(&self, zone: &str) -> &[Zone] {
        self.entry(zone).map(|e| e.neighbors.as_slice()).unwrap_or(&[])
    }

    pub fn position(&self, zone: &str) -> Option<GeoPosition> {
        self.entry(zone).and_then(|e| e.position)
    }

    /// Every declared `(zone, neighbor)` pair, in declaration order
    pub fn declared_pairs(&self) -> impl Iterator<Item = (&Zone, &Zone)> {
        self.zones
            .iter()
            .flat_map(|e| e.neighbors.iter().map(move |n| (&e.code, n)))
    }

    /// Compound codes (`DE_LU`) appearing anywhere in the table
    pub fn compound_codes(&self) -> Vec<Zone> {
        let mut codes: Vec<Zone> = self
            .zones
            .iter()
            .flat_map(|e| std::iter::once(&e.code).chain(e.neighbors.iter()))
            .filter(|z| z.is_compound())
            .cloned()
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::european()
    }
}
