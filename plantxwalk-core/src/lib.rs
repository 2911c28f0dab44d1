///! Plant coordinate crosswalk library
///!
///! Loads the Global Coal Plant Tracker unit table and resolves source-system
///! plant identifiers to coordinates, by exact external ID or by fuzzy plant
///! name. Crosswalk builders turn the loaded registry into flat files
///! consumed statically by downstream extractors.
///!
///! ## Main Components
///! - `PlantRegistry`: loaded registry with filters and an exact-ID index
///! - `CoordinateMatcher`: exact-then-fuzzy query resolution
///! - Crosswalk builders: per-source flat CSV output plus manifest

// ============ Core Data Structures ============
pub mod types;
pub use types::{
    split_external_id, validate_coordinates, CrosswalkRow, MatchMethod, MatchResult, PlantRecord,
    PlantStatus,
};

// ============ Errors ============
pub mod error;
pub use error::{CrosswalkError, LoadError, QueryError};

// ============ Registry Loading ============
pub mod loader;
pub use loader::{find_registry_file, PlantRegistry, RegistryStats, EUROPEAN_COUNTRIES};

// ============ Name Normalization ============
pub mod normalize;
pub use normalize::{normalize_name, token_set};

// ============ Matching ============
pub mod matcher;
pub use matcher::{
    score_names, CoordinateMatcher, MatchReport, PlantQuery, DEFAULT_THRESHOLD,
};

// ============ Crosswalk Output ============
pub mod crosswalk;
pub use crosswalk::{
    build_eia_crosswalk, build_entsoe_crosswalk, build_npp_crosswalk, build_region_crosswalk,
    crosswalk_path, load_crosswalk, write_crosswalk, write_manifest, CrosswalkManifest,
    CrosswalkSummary, ManifestEntry,
};
