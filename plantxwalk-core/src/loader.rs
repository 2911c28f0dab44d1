///! Registry loader - reads the plant registry table into memory
///!
///! Parses the published unit-level CSV export into PlantRecords and keeps
///! an exact-lookup index from external ID to record.

use crate::error::LoadError;
use crate::types::{validate_coordinates, PlantRecord, PlantStatus};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Published column titles and their canonical names
const COLUMN_MAPPING: &[(&str, &str)] = &[
    ("Project Name", "project_name"),
    ("Unit Name", "unit_name"),
    ("Country/Area", "country"),
    ("Subnational", "subnational"),
    ("Latitude", "latitude"),
    ("Longitude", "longitude"),
    ("Status", "status"),
    ("Capacity (MW)", "capacity_mw"),
    ("EIA plant + unit ID", "external_id"),
];

/// Columns the load cannot proceed without
const REQUIRED_COLUMNS: &[&str] = &[
    "project_name",
    "country",
    "status",
    "capacity_mw",
    "latitude",
    "longitude",
];

/// European countries used for the ENTSOE regional crosswalk
pub const EUROPEAN_COUNTRIES: &[&str] = &[
    "Germany", "France", "Poland", "United Kingdom", "Italy",
    "Spain", "Netherlands", "Belgium", "Czech Republic", "Greece",
    "Romania", "Bulgaria", "Austria", "Hungary", "Slovakia",
    "Finland", "Denmark", "Portugal", "Ireland", "Slovenia",
    "Croatia", "Estonia", "Latvia", "Lithuania", "Luxembourg",
];

/// The loaded plant registry
///
/// Records are immutable once loaded; all filters are non-mutating
/// projections over the record vector.
pub struct PlantRegistry {
    records: Vec<PlantRecord>,

    /// External ID -> record index, first occurrence wins
    by_external_id: HashMap<String, usize>,
}

impl PlantRegistry {
    /// Load the registry from a CSV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        info!("Loading plant registry from {}", path.display());

        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse registry CSV content
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // Allow variable number of fields
            .from_reader(content.as_bytes());

        let columns = resolve_columns(reader.headers()?)?;

        let mut records = Vec::new();
        let mut by_external_id: HashMap<String, usize> = HashMap::new();
        let mut row_count = 0;
        let mut skipped = 0;
        let mut coords_dropped = 0;

        for result in reader.records() {
            row_count += 1;

            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    skipped += 1;
                    warn!("Error parsing registry row {}: {}", row_count, e);
                    continue;
                }
            };

            let project_name = columns.cell(&row, "project_name");
            let country = columns.cell(&row, "country");
            if project_name.is_empty() || country.is_empty() {
                skipped += 1;
                warn!(
                    "Skipping registry row {} without project name or country",
                    row_count
                );
                continue;
            }

            let latitude = columns.numeric_cell(&row, "latitude");
            let longitude = columns.numeric_cell(&row, "longitude");
            let (latitude, longitude) = match (latitude, longitude) {
                (Some(lat), Some(lon)) if validate_coordinates(lat, lon) => (Some(lat), Some(lon)),
                (None, None) => (None, None),
                _ => {
                    // Half-present or out-of-bounds pairs become jointly absent
                    coords_dropped += 1;
                    debug!("Dropping unusable coordinates on registry row {}", row_count);
                    (None, None)
                }
            };

            let external_id = {
                let cell = columns.cell(&row, "external_id");
                if cell.is_empty() { None } else { Some(cell.to_string()) }
            };

            let index = records.len();
            if let Some(ref id) = external_id {
                if let Some(&existing) = by_external_id.get(id) {
                    warn!(
                        "Duplicate external ID {} on registry row {} (keeping row {})",
                        id, row_count, existing
                    );
                } else {
                    by_external_id.insert(id.clone(), index);
                }
            }

            records.push(PlantRecord {
                project_name: project_name.to_string(),
                unit_name: columns.cell(&row, "unit_name").to_string(),
                country: country.to_string(),
                subnational: {
                    let cell = columns.cell(&row, "subnational");
                    if cell.is_empty() { None } else { Some(cell.to_string()) }
                },
                latitude,
                longitude,
                status: PlantStatus::from_label(columns.cell(&row, "status")),
                capacity_mw: columns.numeric_cell(&row, "capacity_mw"),
                external_id,
                row: index,
            });
        }

        info!(
            "Loaded {} registry records ({} rows skipped, {} coordinate pairs dropped)",
            records.len(),
            skipped,
            coords_dropped
        );

        Ok(Self {
            records,
            by_external_id,
        })
    }

    pub fn records(&self) -> &[PlantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact external-ID lookup, O(1)
    pub fn by_external_id(&self, id: &str) -> Option<&PlantRecord> {
        self.by_external_id.get(id).map(|&i| &self.records[i])
    }

    /// Records from any of the given countries (case-insensitive)
    pub fn filter_by_country(&self, countries: &[&str]) -> Vec<&PlantRecord> {
        self.records
            .iter()
            .filter(|r| {
                countries
                    .iter()
                    .any(|c| r.country.trim().eq_ignore_ascii_case(c.trim()))
            })
            .collect()
    }

    /// Records in any of the given statuses
    pub fn filter_by_status(&self, statuses: &[PlantStatus]) -> Vec<&PlantRecord> {
        self.records
            .iter()
            .filter(|r| statuses.contains(&r.status))
            .collect()
    }

    /// All US plants (the exact-ID crosswalk population)
    pub fn us_plants(&self) -> Vec<&PlantRecord> {
        self.filter_by_country(&["United States"])
    }

    /// All European plants (the ENTSOE crosswalk population)
    pub fn european_plants(&self) -> Vec<&PlantRecord> {
        self.filter_by_country(EUROPEAN_COUNTRIES)
    }

    /// All Indian plants (the NPP crosswalk population)
    pub fn indian_plants(&self) -> Vec<&PlantRecord> {
        self.filter_by_country(&["India"])
    }

    pub fn stats(&self) -> RegistryStats {
        let countries: HashSet<&str> = self.records.iter().map(|r| r.country.as_str()).collect();

        RegistryStats {
            total_records: self.records.len(),
            with_coordinates: self.records.iter().filter(|r| r.has_coordinates()).count(),
            with_external_id: self.by_external_id.len(),
            countries: countries.len(),
        }
    }
}

/// Resolved column positions for one registry file
struct ColumnIndex(HashMap<&'static str, usize>);

impl ColumnIndex {
    /// Trimmed cell under a canonical column, empty when the column or the
    /// cell is absent
    fn cell<'a>(&self, row: &'a csv::StringRecord, column: &str) -> &'a str {
        self.0
            .get(column)
            .and_then(|&i| row.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    /// Numeric cell; unparseable values coerce to absent
    fn numeric_cell(&self, row: &csv::StringRecord, column: &str) -> Option<f64> {
        self.cell(row, column).parse::<f64>().ok()
    }
}

/// Map header cells to canonical columns, accepting both the published
/// titles and their snake_case equivalents
fn resolve_columns(headers: &csv::StringRecord) -> Result<ColumnIndex, LoadError> {
    let mut index = HashMap::new();

    for (position, cell) in headers.iter().enumerate() {
        let cell = cell.trim();
        for (title, canonical) in COLUMN_MAPPING {
            if cell == *title || cell == *canonical {
                index.entry(*canonical).or_insert(position);
            }
        }
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !index.contains_key(**c))
        .map(|c| c.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    Ok(ColumnIndex(index))
}

/// Find the most recently modified registry CSV in a directory
pub fn find_registry_file(dir: impl AsRef<Path>) -> Result<PathBuf, LoadError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let lowered = name.to_lowercase();
        if !lowered.ends_with(".csv") {
            continue;
        }
        if !(lowered.contains("gcpt") || lowered.contains("coal-plant-tracker")) {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::UNIX_EPOCH);

        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| LoadError::NoRegistryFile(dir.display().to_string()))
}

/// Registry coverage statistics
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_records: usize,
    pub with_coordinates: usize,
    pub with_external_id: usize,
    pub countries: usize,
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Records: {}, With coordinates: {}, With external ID: {}, Countries: {}",
            self.total_records, self.with_coordinates, self.with_external_id, self.countries
        )
    }
}
