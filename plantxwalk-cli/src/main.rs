//! plantxwalk - plant coordinate crosswalk builder
//!
//! Loads the Global Coal Plant Tracker unit table and builds the per-source
//! coordinate crosswalk files consumed by downstream extractors.

mod config;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use config::AppConfig;
use plantxwalk_core::{
    build_eia_crosswalk, build_entsoe_crosswalk, build_npp_crosswalk, crosswalk_path,
    find_registry_file, load_crosswalk, write_crosswalk, write_manifest, CoordinateMatcher,
    CrosswalkRow, CrosswalkSummary, MatchReport, PlantQuery, PlantRegistry,
};

/// Build plant coordinate crosswalks from the Global Coal Plant Tracker
#[derive(Parser)]
#[command(name = "plantxwalk")]
#[command(about = "Build plant coordinate crosswalks from the Global Coal Plant Tracker")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "plantxwalk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build crosswalk files from the registry
    Build {
        /// Which crosswalk to build
        #[arg(long, value_enum, default_value = "all")]
        source: Source,

        /// Registry CSV (default: newest registry file in the data directory)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output directory (default: from config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Resolve one plant identifier and print the outcome
    Query {
        /// Plant name
        name: Option<String>,

        /// Exact external ID, format "plant_id|unit_id"
        #[arg(long)]
        id: Option<String>,

        /// Country scope for name matching
        #[arg(long)]
        country: Option<String>,

        /// Fuzzy acceptance threshold override
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Match an external CSV of plant names/IDs and write a crosswalk
    MatchFile {
        /// Input CSV with one row per plant to resolve
        input: PathBuf,

        /// Crosswalk file to write
        #[arg(long)]
        output: PathBuf,

        /// Column holding plant names
        #[arg(long, default_value = "name")]
        name_column: String,

        /// Column holding country names
        #[arg(long)]
        country_column: Option<String>,

        /// Column holding exact external IDs
        #[arg(long)]
        id_column: Option<String>,

        /// Registry CSV (default: newest registry file in the data directory)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Fuzzy acceptance threshold override
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Print row counts and confidence spread of built crosswalks
    Inspect {
        #[arg(value_enum, default_value = "all")]
        source: Source,

        /// Output directory (default: from config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the manual registry download instructions
    Download,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    Eia,
    Entsoe,
    Npp,
    All,
}

impl Source {
    fn labels(self) -> &'static [&'static str] {
        match self {
            Source::Eia => &["eia"],
            Source::Entsoe => &["entsoe"],
            Source::Npp => &["npp"],
            Source::All => &["eia", "entsoe", "npp"],
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)?;
    let _logging_guard = logging::init_logging("logs", "plantxwalk", &config.log_level);

    match cli.command {
        Commands::Build {
            source,
            registry,
            output_dir,
        } => run_build(&config, source, registry, output_dir),
        Commands::Query {
            name,
            id,
            country,
            threshold,
        } => run_query(&config, name, id, country, threshold),
        Commands::MatchFile {
            input,
            output,
            name_column,
            country_column,
            id_column,
            registry,
            threshold,
        } => run_match_file(
            &config,
            &input,
            &output,
            &name_column,
            country_column.as_deref(),
            id_column.as_deref(),
            registry,
            threshold,
        ),
        Commands::Inspect { source, output_dir } => run_inspect(&config, source, output_dir),
        Commands::Download => run_download(&config),
    }
}

/// Load the registry from an explicit path or the newest file in data_dir
fn load_registry(config: &AppConfig, registry: Option<PathBuf>) -> Result<(PlantRegistry, String)> {
    let path = match registry {
        Some(path) => path,
        None => find_registry_file(&config.data_dir)?,
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let registry = PlantRegistry::load(&path)?;
    tracing::info!("{}", registry.stats());

    Ok((registry, file_name))
}

fn run_build(
    config: &AppConfig,
    source: Source,
    registry: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let (registry, registry_file) = load_registry(config, registry)?;

    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output_dir));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let mut summaries: Vec<CrosswalkSummary> = Vec::new();

    for label in source.labels() {
        let (rows, summary) = match *label {
            "eia" => build_eia_crosswalk(&registry),
            "entsoe" => build_entsoe_crosswalk(&registry),
            _ => build_npp_crosswalk(&registry),
        };

        if rows.is_empty() {
            tracing::warn!("No data for {} crosswalk", label);
            continue;
        }

        write_crosswalk(crosswalk_path(&output_dir, label), &rows)?;
        summaries.push(summary);
    }

    write_manifest(&output_dir, &registry_file, &summaries)?;
    tracing::info!("Crosswalk building complete");

    Ok(())
}

fn run_query(
    config: &AppConfig,
    name: Option<String>,
    id: Option<String>,
    country: Option<String>,
    threshold: Option<f64>,
) -> Result<()> {
    let (registry, _) = load_registry(config, None)?;
    let matcher = CoordinateMatcher::new(&registry)
        .with_threshold(threshold.unwrap_or(config.fuzzy_threshold));

    let query = PlantQuery {
        external_id: id,
        name,
        country,
    };
    let result = matcher.resolve(&query)?;

    match &result.matched {
        Some(record) => {
            println!(
                "{} -> {} / {} ({})",
                result.query, record.project_name, record.unit_name, record.country
            );
            println!(
                "  method: {}, confidence: {:.2}, status: {}",
                result.method,
                result.confidence,
                record.status.label()
            );
            match record.coordinates() {
                Some((lat, lon)) => println!("  coordinates: {:.5}, {:.5}", lat, lon),
                None => println!("  coordinates: unknown"),
            }
        }
        None => {
            println!("{} -> no match", result.query);
            if let Some(reason) = &result.reason {
                println!("  reason: {}", reason);
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_match_file(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    name_column: &str,
    country_column: Option<&str>,
    id_column: Option<&str>,
    registry: Option<PathBuf>,
    threshold: Option<f64>,
) -> Result<()> {
    let (registry, _) = load_registry(config, registry)?;
    let matcher = CoordinateMatcher::new(&registry)
        .with_threshold(threshold.unwrap_or(config.fuzzy_threshold));

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to read input file {}", input.display()))?;

    let headers = reader.headers()?.clone();
    let position = |column: &str| headers.iter().position(|h| h.trim() == column);

    let name_position = position(name_column);
    let country_position = country_column.and_then(&position);
    let id_position = id_column.and_then(&position);

    if name_position.is_none() && id_position.is_none() {
        bail!(
            "Input file has neither a \"{}\" column nor an external-ID column",
            name_column
        );
    }

    let mut queries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |position: Option<usize>| {
            position
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        queries.push(PlantQuery {
            external_id: cell(id_position),
            name: cell(name_position),
            country: cell(country_position),
        });
    }

    let results = matcher.resolve_all(&queries);
    let report = MatchReport::build(&results);

    let mut rows = Vec::new();
    let mut matched_without_coordinates = 0;
    for result in results.iter().flatten() {
        let Some(record) = &result.matched else {
            continue;
        };
        let Some((latitude, longitude)) = record.coordinates() else {
            matched_without_coordinates += 1;
            continue;
        };
        rows.push(CrosswalkRow {
            source_identifier: result.query.clone(),
            latitude,
            longitude,
            match_confidence: result.confidence,
        });
    }

    write_crosswalk(output, &rows)?;

    println!("{}", report);
    if matched_without_coordinates > 0 {
        println!(
            "Dropped {} matches without registry coordinates",
            matched_without_coordinates
        );
    }
    if !report.unmatched.is_empty() {
        println!("Unmatched plants ({}):", report.unmatched.len());
        for name in report.unmatched.iter().take(10) {
            println!("  {}", name);
        }
        if report.unmatched.len() > 10 {
            println!("  ... and {} more", report.unmatched.len() - 10);
        }
    }

    Ok(())
}

fn run_inspect(config: &AppConfig, source: Source, output_dir: Option<PathBuf>) -> Result<()> {
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output_dir));

    for label in source.labels() {
        let path = crosswalk_path(&output_dir, label);
        if !path.exists() {
            tracing::warn!("No {} crosswalk at {}", label, path.display());
            continue;
        }

        let rows = load_crosswalk(&path)?;
        if rows.is_empty() {
            println!("{}: empty", label);
            continue;
        }

        let min = rows
            .iter()
            .map(|r| r.match_confidence)
            .fold(f64::INFINITY, f64::min);
        let mean =
            rows.iter().map(|r| r.match_confidence).sum::<f64>() / rows.len() as f64;
        println!(
            "{}: {} rows, confidence min {:.2} / mean {:.2}",
            label,
            rows.len(),
            min,
            mean
        );
    }

    Ok(())
}

fn run_download(config: &AppConfig) -> Result<()> {
    let data_dir = Path::new(&config.data_dir);
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    println!(
        r#"
================================================================================
                 Global Coal Plant Tracker (GCPT) Download
================================================================================

The registry must be downloaded manually from Global Energy Monitor:

1. Visit: https://globalenergymonitor.org/projects/global-coal-plant-tracker/download-data/

2. Agree to the terms of use (CC BY 4.0 license)

3. Download the unit-level table and export it as CSV

4. Save the file to:
   {}

5. Rename to: gcpt_global_{}.csv
   (or update the year as appropriate)

6. Build the crosswalks:
   plantxwalk build

================================================================================
"#,
        data_dir.display(),
        Utc::now().year()
    );

    let mut existing: Vec<String> = fs::read_dir(data_dir)?
        .flatten()
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.to_lowercase().ends_with(".csv"))
        .collect();
    existing.sort();

    if existing.is_empty() {
        println!("No registry files found in {}", data_dir.display());
    } else {
        println!("Existing files in {}:", data_dir.display());
        for name in existing {
            println!("  - {}", name);
        }
    }

    Ok(())
}
