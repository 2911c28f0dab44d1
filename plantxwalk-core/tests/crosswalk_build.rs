//! End-to-end crosswalk builds over a scratch directory

use plantxwalk_core::{
    build_eia_crosswalk, build_entsoe_crosswalk, build_npp_crosswalk, crosswalk_path,
    find_registry_file, write_crosswalk, write_manifest, CoordinateMatcher, MatchMethod,
    PlantQuery, PlantRegistry,
};
use std::fs;
use std::path::Path;

const REGISTRY_CSV: &str = "\
Project Name,Unit Name,Country/Area,Subnational,Latitude,Longitude,Status,Capacity (MW),EIA plant + unit ID
Scherer,Unit 1,United States,Georgia,33.05,-83.77,Operating,818,6146|1
Colstrip Power Station,Unit 1,United States,Montana,45.88,-106.61,Operating,307,6076|1
Colstrip Power Station,Unit 2,United States,Montana,45.88,-106.61,Operating,307,6076|2
Navajo Generating Station,Unit 1,United States,Arizona,36.91,-111.39,Retired,750,4941|1
Bełchatów power station,Unit 1,Poland,Łódź,51.26,19.32,Operating,370,
Neurath,Unit F,Germany,North Rhine-Westphalia,51.03,6.61,Operating,1060,
Vindhyachal,Unit 1,India,Madhya Pradesh,24.09,82.67,Operating,210,
Sipat TPP,Unit 1,India,Chhattisgarh,22.13,82.29,Operating,660,
";

fn build_all(registry: &PlantRegistry, registry_file: &str, out: &Path) {
    fs::create_dir_all(out).unwrap();

    let mut summaries = Vec::new();
    for (rows, summary) in [
        build_eia_crosswalk(registry),
        build_entsoe_crosswalk(registry),
        build_npp_crosswalk(registry),
    ] {
        write_crosswalk(crosswalk_path(out, &summary.source), &rows).unwrap();
        summaries.push(summary);
    }
    write_manifest(out, registry_file, &summaries).unwrap();
}

#[test]
fn test_rebuild_is_byte_identical() {
    let scratch = tempfile::tempdir().unwrap();
    let data_dir = scratch.path().join("gcpt");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("gcpt_global_2026.csv"), REGISTRY_CSV).unwrap();

    let registry_path = find_registry_file(&data_dir).unwrap();
    let registry = PlantRegistry::load(&registry_path).unwrap();

    let first = scratch.path().join("run1");
    let second = scratch.path().join("run2");
    build_all(&registry, "gcpt_global_2026.csv", &first);
    build_all(&registry, "gcpt_global_2026.csv", &second);

    for file in [
        "eia_plant_coordinates.csv",
        "entsoe_plant_coordinates.csv",
        "npp_plant_coordinates.csv",
        "manifest.json",
    ] {
        let a = fs::read(first.join(file)).unwrap();
        let b = fs::read(second.join(file)).unwrap();
        assert_eq!(a, b, "{} differs between identical runs", file);
        assert!(!a.is_empty(), "{} is empty", file);
    }
}

#[test]
fn test_exact_ids_survive_the_round_trip() {
    let scratch = tempfile::tempdir().unwrap();
    let registry = PlantRegistry::parse(REGISTRY_CSV).unwrap();

    let (rows, _) = build_eia_crosswalk(&registry);
    let path = crosswalk_path(scratch.path(), "eia");
    write_crosswalk(&path, &rows).unwrap();

    let loaded = plantxwalk_core::load_crosswalk(&path).unwrap();
    let colstrip = loaded
        .iter()
        .find(|r| r.source_identifier == "6076|1")
        .unwrap();
    assert_eq!(colstrip.latitude, 45.88);
    assert_eq!(colstrip.longitude, -106.61);
    assert_eq!(colstrip.match_confidence, 1.0);
}

#[test]
fn test_resolution_over_a_loaded_registry() {
    let registry = PlantRegistry::parse(REGISTRY_CSV).unwrap();
    let matcher = CoordinateMatcher::new(&registry);

    let exact = matcher
        .resolve(&PlantQuery::by_external_id("4941|1"))
        .unwrap();
    assert_eq!(exact.method, MatchMethod::Exact);

    let fuzzy = matcher
        .resolve(&PlantQuery::by_name("Colstrip", Some("United States")))
        .unwrap();
    assert_eq!(fuzzy.method, MatchMethod::Fuzzy);
    assert_eq!(
        fuzzy.matched.as_ref().unwrap().coordinates(),
        Some((45.88, -106.61))
    );

    let none = matcher
        .resolve(&PlantQuery::by_name(
            "Zzyzx Imaginary Plant",
            Some("United States"),
        ))
        .unwrap();
    assert_eq!(none.method, MatchMethod::None);
}
