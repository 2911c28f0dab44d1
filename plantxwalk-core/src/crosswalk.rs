///! Crosswalk builders - flat coordinate files for downstream extractors
///!
///! Three source-specific builders over one loaded registry: EIA (exact
///! external IDs), ENTSOE (European plants), NPP (Indian plants). Output is
///! plain CSV plus a manifest; rows are sorted on write so re-running over
///! unchanged input produces byte-identical files.

use crate::error::CrosswalkError;
use crate::loader::{PlantRegistry, EUROPEAN_COUNTRIES};
use crate::types::{split_external_id, CrosswalkRow, PlantRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Build the EIA crosswalk: one row per well-formed external ID
pub fn build_eia_crosswalk(registry: &PlantRegistry) -> (Vec<CrosswalkRow>, CrosswalkSummary) {
    info!("Building EIA crosswalk...");

    let mut rows = Vec::new();
    let mut summary = CrosswalkSummary::new("eia");
    let mut seen: HashSet<&str> = HashSet::new();

    for record in registry.records() {
        let Some(id) = record.external_id.as_deref() else {
            continue;
        };

        if split_external_id(id).is_none() {
            summary.malformed_ids += 1;
            warn!("Skipping malformed external ID {:?}", id);
            continue;
        }

        let Some((latitude, longitude)) = record.coordinates() else {
            summary.skipped_no_coordinates += 1;
            continue;
        };

        if !seen.insert(id) {
            summary.duplicates_dropped += 1;
            continue;
        }

        rows.push(CrosswalkRow {
            source_identifier: id.to_string(),
            latitude,
            longitude,
            match_confidence: 1.0,
        });
    }

    summary.rows = rows.len();
    info!("{}", summary);
    (rows, summary)
}

/// Build the ENTSOE crosswalk: European plants keyed by name
pub fn build_entsoe_crosswalk(registry: &PlantRegistry) -> (Vec<CrosswalkRow>, CrosswalkSummary) {
    build_region_crosswalk(registry, "entsoe", EUROPEAN_COUNTRIES)
}

/// Build the India NPP crosswalk: Indian plants keyed by name
pub fn build_npp_crosswalk(registry: &PlantRegistry) -> (Vec<CrosswalkRow>, CrosswalkSummary) {
    build_region_crosswalk(registry, "npp", &["India"])
}

/// Regional name-keyed crosswalk: records with coordinates from the given
/// countries, deduplicated by (project, unit) keeping the first occurrence
pub fn build_region_crosswalk(
    registry: &PlantRegistry,
    source: &str,
    countries: &[&str],
) -> (Vec<CrosswalkRow>, CrosswalkSummary) {
    info!("Building {} crosswalk...", source);

    let mut rows = Vec::new();
    let mut summary = CrosswalkSummary::new(source);
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for record in registry.filter_by_country(countries) {
        let Some((latitude, longitude)) = record.coordinates() else {
            summary.skipped_no_coordinates += 1;
            continue;
        };

        let key = (record.project_name.clone(), record.unit_name.clone());
        if !seen.insert(key) {
            summary.duplicates_dropped += 1;
            continue;
        }

        rows.push(CrosswalkRow {
            source_identifier: name_identifier(record),
            latitude,
            longitude,
            match_confidence: 1.0,
        });
    }

    summary.rows = rows.len();
    info!("{}", summary);
    (rows, summary)
}

/// Composite name identifier for name-keyed crosswalks
fn name_identifier(record: &PlantRecord) -> String {
    format!("{}|{}", record.project_name, record.unit_name)
}

/// Crosswalk file path for a source under an output directory
pub fn crosswalk_path(dir: impl AsRef<Path>, source: &str) -> PathBuf {
    dir.as_ref().join(format!("{}_plant_coordinates.csv", source))
}

/// Write crosswalk rows as CSV, sorted by source identifier
pub fn write_crosswalk(path: impl AsRef<Path>, rows: &[CrosswalkRow]) -> Result<(), CrosswalkError> {
    let path = path.as_ref();

    let mut sorted: Vec<&CrosswalkRow> = rows.iter().collect();
    sorted.sort_by(|a, b| a.source_identifier.cmp(&b.source_identifier));

    let mut writer = csv::Writer::from_path(path).map_err(|source| CrosswalkError::Csv {
        path: path.display().to_string(),
        source,
    })?;

    for row in sorted {
        writer.serialize(row).map_err(|source| CrosswalkError::Csv {
            path: path.display().to_string(),
            source,
        })?;
    }

    writer.flush().map_err(|source| CrosswalkError::Io {
        path: path.display().to_string(),
        source,
    })?;

    info!("Saved {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Read a previously written crosswalk back
pub fn load_crosswalk(path: impl AsRef<Path>) -> Result<Vec<CrosswalkRow>, CrosswalkError> {
    let path = path.as_ref();

    let mut reader = csv::Reader::from_path(path).map_err(|source| CrosswalkError::Csv {
        path: path.display().to_string(),
        source,
    })?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: CrosswalkRow = result.map_err(|source| CrosswalkError::Csv {
            path: path.display().to_string(),
            source,
        })?;
        rows.push(row);
    }

    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Per-build counts for one crosswalk source
#[derive(Debug, Clone)]
pub struct CrosswalkSummary {
    pub source: String,
    pub rows: usize,
    pub skipped_no_coordinates: usize,
    pub duplicates_dropped: usize,
    pub malformed_ids: usize,
}

impl CrosswalkSummary {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            rows: 0,
            skipped_no_coordinates: 0,
            duplicates_dropped: 0,
            malformed_ids: 0,
        }
    }
}

impl std::fmt::Display for CrosswalkSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} crosswalk: {} rows ({} without coordinates, {} duplicates dropped, {} malformed IDs)",
            self.source,
            self.rows,
            self.skipped_no_coordinates,
            self.duplicates_dropped,
            self.malformed_ids
        )
    }
}

/// Build bookkeeping written next to the crosswalk files
///
/// Deliberately timestamp-free: re-running over unchanged input must leave
/// every output file byte-identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrosswalkManifest {
    pub registry_file: String,
    pub sources: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source: String,
    pub rows: usize,
}

/// Write manifest.json under the output directory
pub fn write_manifest(
    dir: impl AsRef<Path>,
    registry_file: &str,
    summaries: &[CrosswalkSummary],
) -> Result<PathBuf, CrosswalkError> {
    let mut sources: Vec<ManifestEntry> = summaries
        .iter()
        .map(|s| ManifestEntry {
            source: s.source.clone(),
            rows: s.rows,
        })
        .collect();
    sources.sort_by(|a, b| a.source.cmp(&b.source));

    let manifest = CrosswalkManifest {
        registry_file: registry_file.to_string(),
        sources,
    };

    let path = dir.as_ref().join("manifest.json");
    let mut json = serde_json::to_string_pretty(&manifest)?;
    json.push('\n');

    fs::write(&path, json).map_err(|source| CrosswalkError::Io {
        path: path.display().to_string(),
        source,
    })?;

    info!("Saved manifest to {}", path.display());
    Ok(path)
}
