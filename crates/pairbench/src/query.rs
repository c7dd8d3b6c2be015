//! Pair query definitions
//!
//! A query pairs a human-readable question with the predicate the oracle
//! uses to compute its ground truth.

use serde::{Deserialize, Serialize};

/// Rule deciding which user pairs match a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pair_type", rename_all = "snake_case")]
pub enum Predicate {
    /// Both users have at least one instance with `label`
    BothHaveLabel { label: String },
    /// Neither user has an instance with `label`
    BothMissingLabel { label: String },
    /// One user has only `first` labels and the other only `second` labels
    ExclusiveDifferent { first: String, second: String },
    /// Both users have at least `min` instances
    MinInstances { min: usize },
    /// Both users have a date containing `year`
    BothHaveYear { year: String },
    /// The users share at least one label
    ShareLabel,
    /// The users have disjoint label sets
    NoSharedLabels,
    /// One user has exactly one instance, the other more than one
    OneSingleOneMulti,
    /// Both users' earliest dates fall in the same month and year
    SameFirstMonth,
    /// Number of user pairs overall; answered with a count, not a pair list
    CountAllPairs,
}

impl Predicate {
    /// Name used for this kind in query catalogs
    pub fn kind(&self) -> &'static str {
        match self {
            Predicate::BothHaveLabel { .. } => "both_have_label",
            Predicate::BothMissingLabel { .. } => "both_missing_label",
            Predicate::ExclusiveDifferent { .. } => "exclusive_different",
            Predicate::MinInstances { .. } => "min_instances",
            Predicate::BothHaveYear { .. } => "both_have_year",
            Predicate::ShareLabel => "share_label",
            Predicate::NoSharedLabels => "no_shared_labels",
            Predicate::OneSingleOneMulti => "one_single_one_multi",
            Predicate::SameFirstMonth => "same_first_month",
            Predicate::CountAllPairs => "count_all_pairs",
        }
    }
}

/// A pair-finding query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairQuery {
    /// Stable identifier (e.g. "pairs_07")
    pub id: String,
    /// Question text shown to the answerer
    pub query: String,
    /// How the ground truth is computed
    pub predicate: Predicate,
}

impl PairQuery {
    pub fn new(id: impl Into<String>, query: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            predicate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let predicate = Predicate::ExclusiveDifferent {
            first: "numeric value".to_string(),
            second: "location".to_string(),
        };
        assert_eq!(predicate.kind(), "exclusive_different");
        assert_eq!(Predicate::CountAllPairs.kind(), "count_all_pairs");
    }

    #[test]
    fn test_predicate_serializes_with_tag() {
        let predicate = Predicate::MinInstances { min: 3 };
        let json = serde_json::to_string(&predicate).unwrap();
        assert_eq!(json, r#"{"pair_type":"min_instances","min":3}"#);

        let back: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, predicate);
    }
}
