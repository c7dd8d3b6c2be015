//! Ground-truth oracle
//!
//! Computes the exact answer to a pair query over a parsed corpus. Every
//! unordered pair of users is checked once, in ascending numeric id order,
//! so the rendered answer is canonical.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::query::{PairQuery, Predicate};
use crate::record::{Corpus, UserRecord};

/// Rendered answer when no pair matches
pub const NO_PAIRS: &str = "No pairs found";

/// `<Month> <Day>, <Year>`, matched from the start of a date string
static MONTH_DAY_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s+\d+,\s+(\d+)").expect("Invalid date regex"));

/// Exact answer to a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GroundTruth {
    /// Matching pairs as `(lower id, higher id)`, ascending
    Pairs(Vec<(String, String)>),
    /// Answer to a counting query
    Count(u64),
}

impl fmt::Display for GroundTruth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroundTruth::Count(n) => write!(f, "{}", n),
            GroundTruth::Pairs(pairs) if pairs.is_empty() => f.write_str(NO_PAIRS),
            GroundTruth::Pairs(pairs) => {
                for (i, (lo, hi)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "({}, {})", lo, hi)?;
                }
                Ok(())
            }
        }
    }
}

/// Compute the ground truth for a query
pub fn evaluate(corpus: &Corpus, query: &PairQuery) -> GroundTruth {
    evaluate_predicate(corpus, &query.predicate)
}

/// Compute the ground truth for a bare predicate
pub fn evaluate_predicate(corpus: &Corpus, predicate: &Predicate) -> GroundTruth {
    let users = corpus.sorted_users();

    let pairs = match predicate {
        Predicate::BothHaveLabel { label } => {
            matching_pairs(&users, |a, b| a.has_label(label) && b.has_label(label))
        }
        Predicate::BothMissingLabel { label } => {
            matching_pairs(&users, |a, b| !a.has_label(label) && !b.has_label(label))
        }
        Predicate::ExclusiveDifferent { first, second } => matching_pairs(&users, |a, b| {
            (a.has_only_label(first) && b.has_only_label(second))
                || (a.has_only_label(second) && b.has_only_label(first))
        }),
        Predicate::MinInstances { min } => matching_pairs(&users, |a, b| {
            a.instance_count() >= *min && b.instance_count() >= *min
        }),
        Predicate::BothHaveYear { year } => matching_pairs(&users, |a, b| {
            a.has_date_containing(year) && b.has_date_containing(year)
        }),
        Predicate::ShareLabel => matching_pairs(&users, |a, b| a.shares_label_with(b)),
        Predicate::NoSharedLabels => matching_pairs(&users, |a, b| !a.shares_label_with(b)),
        Predicate::OneSingleOneMulti => matching_pairs(&users, |a, b| {
            let (c1, c2) = (a.instance_count(), b.instance_count());
            (c1 == 1 && c2 > 1) || (c1 > 1 && c2 == 1)
        }),
        Predicate::SameFirstMonth => same_first_month(&users),
        Predicate::CountAllPairs => {
            let n = users.iter().filter(|u| u.instance_count() > 0).count() as u64;
            return GroundTruth::Count(n * n.saturating_sub(1) / 2);
        }
    };

    GroundTruth::Pairs(pairs)
}

/// Check `matches` against every pair `(users[i], users[j])` with `i < j`
fn matching_pairs<F>(users: &[&UserRecord], matches: F) -> Vec<(String, String)>
where
    F: Fn(&UserRecord, &UserRecord) -> bool,
{
    let mut pairs = Vec::new();
    for (i, &a) in users.iter().enumerate() {
        for &b in &users[i + 1..] {
            if matches(a, b) {
                pairs.push((a.user_id().to_string(), b.user_id().to_string()));
            }
        }
    }
    pairs
}

fn same_first_month(users: &[&UserRecord]) -> Vec<(String, String)> {
    let months: Vec<Option<(String, String)>> = users.iter().map(|&u| first_month(u)).collect();

    let mut pairs = Vec::new();
    for i in 0..users.len() {
        for j in i + 1..users.len() {
            if let (Some(m1), Some(m2)) = (&months[i], &months[j]) {
                if m1 == m2 {
                    pairs.push((users[i].user_id().to_string(), users[j].user_id().to_string()));
                }
            }
        }
    }
    pairs
}

/// (month, year) of a user's earliest date
///
/// "Earliest" is the smallest raw date string, not the earliest calendar
/// date. Users whose earliest date does not parse have no month.
fn first_month(user: &UserRecord) -> Option<(String, String)> {
    let earliest = user.earliest_date()?;
    let caps = MONTH_DAY_YEAR.captures(earliest)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}
