///! Core data structures - plant registry records and crosswalk output
///!
///! PlantRecord is the unit-level row of the loaded registry. CrosswalkRow
///! is the flat output shape consumed by downstream extractors.

use serde::{Deserialize, Serialize};

/// Plant unit status as published in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlantStatus {
    Operating,
    Construction,
    Announced,
    PrePermit,
    Permitted,
    Shelved,
    Cancelled,
    Mothballed,
    Retired,
    Unknown,
}

impl PlantStatus {
    /// Parse from the registry's status label
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "operating" => PlantStatus::Operating,
            "construction" => PlantStatus::Construction,
            "announced" => PlantStatus::Announced,
            "pre-permit" | "pre-permit development" => PlantStatus::PrePermit,
            "permitted" => PlantStatus::Permitted,
            "shelved" => PlantStatus::Shelved,
            "cancelled" => PlantStatus::Cancelled,
            "mothballed" => PlantStatus::Mothballed,
            "retired" => PlantStatus::Retired,
            _ => PlantStatus::Unknown,
        }
    }

    /// Registry-facing label
    pub fn label(&self) -> &'static str {
        match self {
            PlantStatus::Operating => "operating",
            PlantStatus::Construction => "construction",
            PlantStatus::Announced => "announced",
            PlantStatus::PrePermit => "pre-permit",
            PlantStatus::Permitted => "permitted",
            PlantStatus::Shelved => "shelved",
            PlantStatus::Cancelled => "cancelled",
            PlantStatus::Mothballed => "mothballed",
            PlantStatus::Retired => "retired",
            PlantStatus::Unknown => "unknown",
        }
    }
}

/// One unit-level row of the loaded plant registry
///
/// Immutable once loaded. Identity is the source row position plus the
/// external ID when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantRecord {
    /// Plant-level project name, e.g. "Colstrip Power Station"
    pub project_name: String,

    /// Unit name within the plant, e.g. "Unit 1"
    #[serde(default)]
    pub unit_name: String,

    /// Country or area name as published
    pub country: String,

    /// Subnational region (state/province), when published
    #[serde(default)]
    pub subnational: Option<String>,

    /// Latitude in WGS84 degrees; present iff longitude is present
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Longitude in WGS84 degrees; present iff latitude is present
    #[serde(default)]
    pub longitude: Option<f64>,

    pub status: PlantStatus,

    /// Nameplate capacity in MW, when published
    #[serde(default)]
    pub capacity_mw: Option<f64>,

    /// Composite external identifier, format "plant_id|unit_id"
    #[serde(default)]
    pub external_id: Option<String>,

    /// Row position in the source table (0-based, excluding the header)
    pub row: usize,
}

impl PlantRecord {
    /// Both coordinates, when the record carries them
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }
}

/// How a query was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    None,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Fuzzy => write!(f, "fuzzy"),
            MatchMethod::None => write!(f, "none"),
        }
    }
}

/// Outcome of resolving one query against the registry
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// The query name or external ID as supplied
    pub query: String,

    /// The winning registry record, absent on no match
    pub matched: Option<PlantRecord>,

    /// Match confidence, 0.0 to 1.0 (1.0 for exact-ID hits)
    pub confidence: f64,

    pub method: MatchMethod,

    /// Why no match was reported, when method is None
    pub reason: Option<String>,
}

impl MatchResult {
    /// A no-match outcome. Normal result, not an error.
    pub fn no_match(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            matched: None,
            confidence: 0.0,
            method: MatchMethod::None,
            reason: Some(reason.into()),
        }
    }

    pub fn is_match(&self) -> bool {
        self.method != MatchMethod::None
    }
}

/// One row of a crosswalk output file
///
/// Written in bulk, never mutated after write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosswalkRow {
    pub source_identifier: String,
    pub latitude: f64,
    pub longitude: f64,
    pub match_confidence: f64,
}

/// Split a composite external ID into (plant_id, unit_id)
///
/// Accepts exactly two non-empty "|"-separated parts:
/// "6076|1" -> Some(("6076", "1")), "6076" -> None, "6076|" -> None
pub fn split_external_id(id: &str) -> Option<(String, String)> {
    let mut parts = id.split('|');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(plant), Some(unit), None) => {
            let plant = plant.trim();
            let unit = unit.trim();
            if plant.is_empty() || unit.is_empty() {
                None
            } else {
                Some((plant.to_string(), unit.to_string()))
            }
        }
        _ => None,
    }
}

/// WGS84 bounds check
pub fn validate_coordinates(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}
