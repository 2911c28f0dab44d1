///! Coordinate matcher - resolves plant identifiers to registry records
///!
///! Two strategies, tried in order:
///! 1. Exact match on the composite external ID (precomputed, unambiguous)
///! 2. Fuzzy match on the normalized plant name within the query's country
///!
///! Matching is a pure function over the loaded record set.

use crate::error::QueryError;
use crate::loader::PlantRegistry;
use crate::normalize::{normalize_name, token_set};
use crate::types::{MatchMethod, MatchResult, PlantRecord};
use strsim::normalized_levenshtein;
use tracing::info;

/// Default acceptance threshold for fuzzy matches
pub const DEFAULT_THRESHOLD: f64 = 0.70;

/// Scores closer than this count as a tie
const SCORE_EPSILON: f64 = 1e-9;

const TOKEN_WEIGHT: f64 = 0.5;
const EDIT_WEIGHT: f64 = 0.5;

/// A source-system plant identifier to resolve
///
/// Carries an exact external ID, a free-text name plus country, or both.
#[derive(Debug, Clone, Default)]
pub struct PlantQuery {
    /// Composite external ID, format "plant_id|unit_id"
    pub external_id: Option<String>,

    /// Free-text plant name
    pub name: Option<String>,

    /// Country scope for name matching
    pub country: Option<String>,
}

impl PlantQuery {
    pub fn by_external_id(id: impl Into<String>) -> Self {
        Self {
            external_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>, country: Option<&str>) -> Self {
        Self {
            name: Some(name.into()),
            country: country.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Blended similarity of two normalized names: token-set overlap (Jaccard)
/// and edit-distance ratio, equal weights. Identical names score 1.0.
pub fn score_names(a: &str, b: &str) -> f64 {
    let a_tokens = token_set(a);
    let b_tokens = token_set(b);

    let intersection = a_tokens.intersection(&b_tokens).count();
    let union = a_tokens.union(&b_tokens).count();
    let token_overlap = if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    };

    TOKEN_WEIGHT * token_overlap + EDIT_WEIGHT * normalized_levenshtein(a, b)
}

/// Match plant identifiers to registry coordinates
pub struct CoordinateMatcher<'a> {
    registry: &'a PlantRegistry,
    threshold: f64,
}

impl<'a> CoordinateMatcher<'a> {
    pub fn new(registry: &'a PlantRegistry) -> Self {
        Self {
            registry,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Resolve one query: exact-ID path first, fuzzy name path second
    ///
    /// A query with neither an external ID nor a usable name fails fast;
    /// everything else produces a MatchResult, unmatched included.
    pub fn resolve(&self, query: &PlantQuery) -> Result<MatchResult, QueryError> {
        let id = query
            .external_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let name = query
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match (id, name) {
            (None, None) => Err(QueryError::InvalidQuery),
            (Some(id), name) => {
                if let Some(record) = self.registry.by_external_id(id) {
                    return Ok(MatchResult {
                        query: id.to_string(),
                        matched: Some(record.clone()),
                        confidence: 1.0,
                        method: MatchMethod::Exact,
                        reason: None,
                    });
                }
                match name {
                    Some(name) => Ok(self.fuzzy_match(name, query.country.as_deref())),
                    None => Ok(MatchResult::no_match(
                        id,
                        format!("external ID {} not in registry", id),
                    )),
                }
            }
            (None, Some(name)) => Ok(self.fuzzy_match(name, query.country.as_deref())),
        }
    }

    /// Resolve a batch; an invalid query never aborts the rest
    pub fn resolve_all(&self, queries: &[PlantQuery]) -> Vec<Result<MatchResult, QueryError>> {
        let results: Vec<_> = queries.iter().map(|q| self.resolve(q)).collect();

        let matched = results
            .iter()
            .filter(|r| matches!(r, Ok(r) if r.is_match()))
            .count();
        info!("Resolved {} of {} queries", matched, queries.len());

        results
    }

    fn fuzzy_match(&self, name: &str, country: Option<&str>) -> MatchResult {
        let needle = normalize_name(name);
        if needle.is_empty() {
            return MatchResult::no_match(name, "name is empty after normalization");
        }

        let candidates: Vec<&PlantRecord> = match country {
            Some(c) => self.registry.filter_by_country(&[c]),
            None => self.registry.records().iter().collect(),
        };
        if candidates.is_empty() {
            return MatchResult::no_match(
                name,
                format!(
                    "no registry candidates for country {}",
                    country.unwrap_or("<any>")
                ),
            );
        }

        let mut best: Option<(f64, &PlantRecord)> = None;
        for record in candidates {
            let hay = normalize_name(&record.project_name);
            if hay.is_empty() {
                continue;
            }
            let score = score_names(&needle, &hay);

            let better = match best {
                None => true,
                Some((best_score, best_record)) => {
                    score > best_score + SCORE_EPSILON
                        || ((score - best_score).abs() <= SCORE_EPSILON
                            && record.capacity_mw.unwrap_or(0.0)
                                > best_record.capacity_mw.unwrap_or(0.0))
                }
            };
            if better {
                best = Some((score, record));
            }
        }

        match best {
            Some((score, record)) if score >= self.threshold => MatchResult {
                query: name.to_string(),
                matched: Some(record.clone()),
                confidence: score,
                method: MatchMethod::Fuzzy,
                reason: None,
            },
            Some((score, record)) => MatchResult::no_match(
                name,
                format!(
                    "best candidate \"{}\" scored {:.2}, below threshold {:.2}",
                    record.project_name, score, self.threshold
                ),
            ),
            None => MatchResult::no_match(name, "no candidate names to score"),
        }
    }
}

/// Batch matching outcome buckets
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    /// (query, matched project name)
    pub matched: Vec<(String, String)>,
    pub unmatched: Vec<String>,
    pub invalid: usize,
}

impl MatchReport {
    pub fn build(results: &[Result<MatchResult, QueryError>]) -> Self {
        let mut report = Self::default();

        for result in results {
            match result {
                Ok(r) => match &r.matched {
                    Some(record) => report
                        .matched
                        .push((r.query.clone(), record.project_name.clone())),
                    None => report.unmatched.push(r.query.clone()),
                },
                Err(_) => report.invalid += 1,
            }
        }

        report
    }

    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len() + self.invalid
    }

    /// Share of non-invalid queries that matched, as a percentage
    pub fn coverage(&self) -> f64 {
        let scored = self.matched.len() + self.unmatched.len();
        if scored == 0 {
            return 0.0;
        }
        (self.matched.len() as f64 / scored as f64) * 100.0
    }
}

impl std::fmt::Display for MatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Matched: {}, Unmatched: {}, Invalid: {}, Coverage: {:.1}%",
            self.matched.len(),
            self.unmatched.len(),
            self.invalid,
            self.coverage()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Project Name,Unit Name,Country/Area,Subnational,Latitude,Longitude,Status,Capacity (MW),EIA plant + unit ID
Colstrip Power Station,Unit 1,United States,Montana,45.88,-106.61,Operating,307,1234|A
Colstrip Power Station,Unit 2,United States,Montana,45.88,-106.61,Operating,360,1234|AB
Navajo Generating Station,Unit 1,United States,Arizona,36.91,-111.39,Retired,750,4941|1
Scherer,Unit 1,United States,Georgia,33.05,-83.77,Operating,818,6146|1
Fork River One,Unit 1,United States,Montana,47.00,-114.00,Operating,100,
Fork River Two,Unit 1,United States,Montana,47.10,-114.10,Operating,900,
Bełchatów power station,Unit 1,Poland,Łódź,51.26,19.32,Operating,370,
";

    fn sample_registry() -> PlantRegistry {
        PlantRegistry::parse(SAMPLE_CSV).unwrap()
    }

    #[test]
    fn test_exact_id_match() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        let result = matcher
            .resolve(&PlantQuery::by_external_id("1234|A"))
            .unwrap();
        assert_eq!(result.method, MatchMethod::Exact);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.matched.as_ref().unwrap().unit_name, "Unit 1");
    }

    #[test]
    fn test_exact_id_is_not_prefix_match() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        let a = matcher
            .resolve(&PlantQuery::by_external_id("1234|A"))
            .unwrap();
        let ab = matcher
            .resolve(&PlantQuery::by_external_id("1234|AB"))
            .unwrap();
        assert_eq!(a.matched.as_ref().unwrap().capacity_mw, Some(307.0));
        assert_eq!(ab.matched.as_ref().unwrap().capacity_mw, Some(360.0));

        let miss = matcher
            .resolve(&PlantQuery::by_external_id("1234|"))
            .unwrap();
        assert!(!miss.is_match());
    }

    #[test]
    fn test_exact_id_is_deterministic() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);
        let query = PlantQuery::by_external_id("4941|1");

        let first = matcher.resolve(&query).unwrap();
        let second = matcher.resolve(&query).unwrap();
        assert_eq!(
            first.matched.as_ref().unwrap().row,
            second.matched.as_ref().unwrap().row
        );
    }

    #[test]
    fn test_id_miss_falls_through_to_name() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        let query = PlantQuery {
            external_id: Some("9999|9".to_string()),
            name: Some("Scherer".to_string()),
            country: Some("United States".to_string()),
        };
        let result = matcher.resolve(&query).unwrap();
        assert_eq!(result.method, MatchMethod::Fuzzy);
        assert_eq!(result.matched.as_ref().unwrap().project_name, "Scherer");
    }

    #[test]
    fn test_colstrip_scenario() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        let result = matcher
            .resolve(&PlantQuery::by_name("Colstrip", Some("United States")))
            .unwrap();
        assert_eq!(result.method, MatchMethod::Fuzzy);
        assert!(result.confidence >= DEFAULT_THRESHOLD);
        assert_eq!(
            result.matched.as_ref().unwrap().project_name,
            "Colstrip Power Station"
        );
    }

    #[test]
    fn test_self_match_scores_maximum() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        let result = matcher
            .resolve(&PlantQuery::by_name(
                "Navajo Generating Station",
                Some("United States"),
            ))
            .unwrap();
        assert_eq!(result.confidence, 1.0);

        assert_eq!(score_names("colstrip", "colstrip"), 1.0);
    }

    #[test]
    fn test_no_match_for_unknown_plant() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        let result = matcher
            .resolve(&PlantQuery::by_name(
                "Zzyzx Imaginary Plant",
                Some("United States"),
            ))
            .unwrap();
        assert_eq!(result.method, MatchMethod::None);
        assert!(result.matched.is_none());
        assert!(result.reason.is_some());
    }

    #[test]
    fn test_country_scopes_candidates() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        let result = matcher
            .resolve(&PlantQuery::by_name("Colstrip", Some("Poland")))
            .unwrap();
        assert!(!result.is_match());

        let diacritics = matcher
            .resolve(&PlantQuery::by_name("Belchatow", Some("Poland")))
            .unwrap();
        assert_eq!(diacritics.method, MatchMethod::Fuzzy);
        assert_eq!(
            diacritics.matched.as_ref().unwrap().project_name,
            "Bełchatów power station"
        );
    }

    #[test]
    fn test_tie_breaks_on_larger_capacity() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry).with_threshold(0.5);

        let result = matcher
            .resolve(&PlantQuery::by_name("Fork River", Some("United States")))
            .unwrap();
        assert_eq!(
            result.matched.as_ref().unwrap().project_name,
            "Fork River Two"
        );
    }

    #[test]
    fn test_invalid_query_fails_fast() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        assert!(matches!(
            matcher.resolve(&PlantQuery::default()),
            Err(QueryError::InvalidQuery)
        ));
        assert!(matches!(
            matcher.resolve(&PlantQuery::by_name("   ", None)),
            Err(QueryError::InvalidQuery)
        ));
    }

    #[test]
    fn test_batch_survives_invalid_query() {
        let registry = sample_registry();
        let matcher = CoordinateMatcher::new(&registry);

        let queries = vec![
            PlantQuery::by_name("Colstrip", Some("United States")),
            PlantQuery::default(),
            PlantQuery::by_name("Zzyzx Imaginary Plant", Some("United States")),
        ];
        let results = matcher.resolve_all(&queries);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());

        let report = MatchReport::build(&results);
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.invalid, 1);
        assert_eq!(report.total(), 3);
        assert!((report.coverage() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_rejects_weak_candidates() {
        let registry = sample_registry();

        let lenient = CoordinateMatcher::new(&registry).with_threshold(0.2);
        let strict = CoordinateMatcher::new(&registry).with_threshold(0.95);
        let query = PlantQuery::by_name("Navajo Generating", Some("United States"));

        assert!(lenient.resolve(&query).unwrap().is_match());
        assert!(!strict.resolve(&query).unwrap().is_match());
    }
}
