//! TOML query catalog loader
//!
//! Catalogs use a flat, human-friendly format (one table per query with a
//! `pair_type` and loose parameter fields) that differs from the typed
//! [`Predicate`] enum. Conversion validates that every query carries the
//! parameters its kind needs.

use std::collections::HashSet;
use std::path::Path;

use common::{Error, Result};
use serde::Deserialize;

use crate::query::{PairQuery, Predicate};

const BUILTIN_CATALOG: &str = include_str!("../catalog/oolong_pairs.toml");

/// External TOML catalog format
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    catalog: Option<CatalogMeta>,
    #[serde(default)]
    queries: Vec<TomlQuery>,
}

#[derive(Debug, Deserialize)]
struct CatalogMeta {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuery {
    id: String,
    query: String,
    pair_type: String,
    #[serde(default)]
    label_filter: Option<LabelFilter>,
    #[serde(default)]
    min_instances: Option<usize>,
    #[serde(default)]
    year_filter: Option<String>,
}

/// `label_filter` is a single label for most kinds and a pair of labels for
/// `exclusive_different`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelFilter {
    One(String),
    Many(Vec<String>),
}

/// The 20 built-in OOLONG-Pairs queries
pub fn builtin_catalog() -> Result<Vec<PairQuery>> {
    parse_catalog(BUILTIN_CATALOG)
}

/// Load a catalog from a TOML file
pub fn load_catalog(path: &Path) -> Result<Vec<PairQuery>> {
    let content = std::fs::read_to_string(path)?;
    let queries = parse_catalog(&content)?;
    tracing::info!("Loaded {} queries from {}", queries.len(), path.display());
    Ok(queries)
}

/// Load every `.toml` catalog in a directory
///
/// Any file that fails to load fails the whole directory. Queries are sorted
/// by id, and an id appearing in two files is an error.
pub fn load_catalogs_from_dir(dir: &Path) -> Result<Vec<PairQuery>> {
    let mut queries = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().map_or(false, |ext| ext == "toml") {
            let loaded = load_catalog(&path).map_err(|e| {
                tracing::error!("Failed to load {}: {}", path.display(), e);
                e
            })?;
            queries.extend(loaded);
        } else {
            tracing::debug!("Skipping non-catalog file {}", path.display());
        }
    }

    queries.sort_by(|a, b| a.id.cmp(&b.id));
    check_unique_ids(&queries)?;

    Ok(queries)
}

/// Parse catalog text
pub fn parse_catalog(content: &str) -> Result<Vec<PairQuery>> {
    let catalog: TomlCatalog = toml::from_str(content)?;
    if let Some(meta) = &catalog.catalog {
        tracing::debug!(
            "Parsing catalog {} ({})",
            meta.name,
            meta.description.as_deref().unwrap_or("no description")
        );
    }

    let queries = catalog
        .queries
        .into_iter()
        .map(convert_query)
        .collect::<Result<Vec<_>>>()?;
    check_unique_ids(&queries)?;

    Ok(queries)
}

fn check_unique_ids(queries: &[PairQuery]) -> Result<()> {
    let mut seen = HashSet::new();
    for q in queries {
        if !seen.insert(q.id.as_str()) {
            return Err(invalid(&q.id, "duplicate query id"));
        }
    }
    Ok(())
}

/// Convert a TOML query to a typed query
fn convert_query(toml: TomlQuery) -> Result<PairQuery> {
    let id = toml.id.clone();
    let predicate = match toml.pair_type.as_str() {
        "both_have_label" => Predicate::BothHaveLabel {
            label: single_label(&id, toml.label_filter)?,
        },
        "both_missing_label" => Predicate::BothMissingLabel {
            label: single_label(&id, toml.label_filter)?,
        },
        "exclusive_different" => {
            let (first, second) = label_pair(&id, toml.label_filter)?;
            Predicate::ExclusiveDifferent { first, second }
        }
        "min_instances" => Predicate::MinInstances {
            min: toml
                .min_instances
                .ok_or_else(|| invalid(&id, "min_instances requires min_instances"))?,
        },
        "both_have_year" => Predicate::BothHaveYear {
            year: toml
                .year_filter
                .ok_or_else(|| invalid(&id, "both_have_year requires year_filter"))?,
        },
        "share_label" => Predicate::ShareLabel,
        "no_shared_labels" => Predicate::NoSharedLabels,
        "one_single_one_multi" => Predicate::OneSingleOneMulti,
        "same_first_month" => Predicate::SameFirstMonth,
        "count_all_pairs" => Predicate::CountAllPairs,
        other => return Err(Error::UnknownPredicate(other.to_string())),
    };

    Ok(PairQuery {
        id: toml.id,
        query: toml.query,
        predicate,
    })
}

fn single_label(id: &str, filter: Option<LabelFilter>) -> Result<String> {
    match filter {
        Some(LabelFilter::One(label)) => Ok(label),
        Some(LabelFilter::Many(_)) => Err(invalid(id, "label_filter must be a single label")),
        None => Err(invalid(id, "label_filter is required")),
    }
}

fn label_pair(id: &str, filter: Option<LabelFilter>) -> Result<(String, String)> {
    let labels = match filter {
        Some(LabelFilter::Many(labels)) => labels,
        _ => return Err(invalid(id, "label_filter must list exactly two labels")),
    };
    match <[String; 2]>::try_from(labels) {
        Ok([first, second]) => Ok((first, second)),
        Err(_) => Err(invalid(id, "label_filter must list exactly two labels")),
    }
}

fn invalid(id: &str, reason: &str) -> Error {
    Error::InvalidQuery {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let queries = builtin_catalog().unwrap();

        assert_eq!(queries.len(), 20);
        assert_eq!(queries[0].id, "pairs_01");
        assert_eq!(
            queries[6].predicate,
            Predicate::ExclusiveDifferent {
                first: "numeric value".to_string(),
                second: "location".to_string(),
            }
        );
        assert_eq!(queries[9].predicate, Predicate::MinInstances { min: 3 });
        assert_eq!(
            queries[11].predicate,
            Predicate::BothHaveYear {
                year: "2024".to_string()
            }
        );
        assert_eq!(queries[19].predicate, Predicate::CountAllPairs);
    }

    #[test]
    fn test_unknown_pair_type_fails() {
        let toml_str = r#"
[[queries]]
id = "q1"
query = "Anything"
pair_type = "both_like_cheese"
"#;
        let err = parse_catalog(toml_str).unwrap_err();
        assert!(matches!(err, Error::UnknownPredicate(kind) if kind == "both_like_cheese"));
    }

    #[test]
    fn test_missing_parameters_fail() {
        let toml_str = r#"
[[queries]]
id = "q1"
query = "Both have a label"
pair_type = "both_have_label"
"#;
        assert!(matches!(
            parse_catalog(toml_str),
            Err(Error::InvalidQuery { .. })
        ));

        let toml_str = r#"
[[queries]]
id = "q2"
query = "Exclusive"
pair_type = "exclusive_different"
label_filter = ["numeric value"]
"#;
        assert!(matches!(
            parse_catalog(toml_str),
            Err(Error::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_fail() {
        let toml_str = r#"
[[queries]]
id = "q1"
query = "Share"
pair_type = "share_label"

[[queries]]
id = "q1"
query = "Share again"
pair_type = "share_label"
"#;
        assert!(matches!(
            parse_catalog(toml_str),
            Err(Error::InvalidQuery { .. })
        ));
    }

    const SHARE_QUERY: &str = r#"
[[queries]]
id = "q1"
query = "Share"
pair_type = "share_label"
"#;

    fn write_catalog(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_catalogs_from_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_catalog(temp_dir.path(), "b.toml", SHARE_QUERY);
        write_catalog(
            temp_dir.path(),
            "a.toml",
            r#"
[[queries]]
id = "q0"
query = "Count"
pair_type = "count_all_pairs"
"#,
        );
        write_catalog(temp_dir.path(), "notes.txt", "not a catalog");

        let queries = load_catalogs_from_dir(temp_dir.path()).unwrap();
        let ids: Vec<&str> = queries.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q0", "q1"]);

        let single = load_catalog(&temp_dir.path().join("b.toml")).unwrap();
        assert_eq!(single[0].predicate, Predicate::ShareLabel);
    }

    #[test]
    fn test_dir_with_unknown_pair_type_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_catalog(temp_dir.path(), "a.toml", SHARE_QUERY);
        write_catalog(
            temp_dir.path(),
            "b.toml",
            r#"
[[queries]]
id = "q2"
query = "Share, misspelled"
pair_type = "share_labels"
"#,
        );

        let err = load_catalogs_from_dir(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::UnknownPredicate(kind) if kind == "share_labels"));
    }

    #[test]
    fn test_dir_duplicate_ids_across_files_fail() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_catalog(temp_dir.path(), "a.toml", SHARE_QUERY);
        write_catalog(temp_dir.path(), "b.toml", SHARE_QUERY);

        assert!(matches!(
            load_catalogs_from_dir(temp_dir.path()),
            Err(Error::InvalidQuery { id, .. }) if id == "q1"
        ));
    }

    #[test]
    fn test_load_missing_catalog_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_catalog(&temp_dir.path().join("absent.toml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_malformed_toml_fails() {
        assert!(matches!(
            parse_catalog("[[queries]\nid ="),
            Err(Error::Toml(_))
        ));
    }
}
