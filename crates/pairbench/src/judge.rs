//! Rule-based answer evaluation
//!
//! Compares a free-text answer against the oracle's ground truth. Pair lists
//! are compared as sets of canonical `(lo, hi)` pairs with partial credit;
//! counts compare the first number on each side; empty answers compare the
//! "no pairs" phrase.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::compare_ids;

/// Minimum precision for a partially matching answer to pass
pub const PRECISION_THRESHOLD: f64 = 0.8;
/// Minimum recall for a partially matching answer to pass
pub const RECALL_THRESHOLD: f64 = 0.8;

static PAIR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([0-9]+),\s*([0-9]+)\)").expect("Invalid pair regex"));

static NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("Invalid number regex"));

const NO_PAIRS_PHRASE: &str = "no pairs";

/// Which rule decided the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Counting question: first numbers compared
    Count,
    /// Empty ground truth: "no pairs" phrase compared
    NoPairs,
    /// Pair sets compared
    PairSet,
    /// No rule applied
    Unmatched,
}

/// Outcome of judging one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    passed: bool,
    pub kind: MatchKind,
    /// |P ∩ T| / |P|, set comparisons only
    pub precision: Option<f64>,
    /// |P ∩ T| / |T|, set comparisons only
    pub recall: Option<f64>,
    pub predicted_pairs: usize,
    pub truth_pairs: usize,
}

impl Verdict {
    fn new(passed: bool, kind: MatchKind, predicted_pairs: usize, truth_pairs: usize) -> Self {
        Self {
            passed,
            kind,
            precision: None,
            recall: None,
            predicted_pairs,
            truth_pairs,
        }
    }

    /// Check if the answer was accepted
    pub fn passed(&self) -> bool {
        self.passed
    }
}

/// Decide whether `predicted` is an acceptable answer
pub fn judge(predicted: &str, ground_truth: &str, query: &str) -> bool {
    evaluate_answer(predicted, ground_truth, query).passed()
}

/// Judge an answer and report how the decision was made
pub fn evaluate_answer(predicted: &str, ground_truth: &str, query: &str) -> Verdict {
    let pred_pairs = extract_pairs(predicted);
    let truth_pairs = extract_pairs(ground_truth);
    let (p_len, t_len) = (pred_pairs.len(), truth_pairs.len());

    if query.to_lowercase().contains("count") || is_decimal(ground_truth) {
        let passed = match (first_number(predicted), first_number(ground_truth)) {
            (Some(pred), Some(truth)) => pred == truth,
            _ => false,
        };
        return Verdict::new(passed, MatchKind::Count, p_len, t_len);
    }

    if truth_pairs.is_empty() && ground_truth.to_lowercase().contains(NO_PAIRS_PHRASE) {
        let passed = predicted.to_lowercase().contains(NO_PAIRS_PHRASE);
        return Verdict::new(passed, MatchKind::NoPairs, p_len, t_len);
    }

    if truth_pairs.is_empty() {
        return Verdict::new(false, MatchKind::Unmatched, p_len, t_len);
    }

    let overlap = pred_pairs.intersection(&truth_pairs).count() as f64;
    let precision = if pred_pairs.is_empty() {
        0.0
    } else {
        overlap / p_len as f64
    };
    let recall = overlap / t_len as f64;

    let passed = pred_pairs == truth_pairs
        || (precision >= PRECISION_THRESHOLD && recall >= RECALL_THRESHOLD);

    Verdict {
        passed,
        kind: MatchKind::PairSet,
        precision: Some(precision),
        recall: Some(recall),
        predicted_pairs: p_len,
        truth_pairs: t_len,
    }
}

/// Every `(a, b)` in the text, reordered so the smaller id comes first
pub fn extract_pairs(text: &str) -> HashSet<(String, String)> {
    PAIR_PATTERN
        .captures_iter(text)
        .map(|caps| {
            let (a, b) = (caps[1].to_string(), caps[2].to_string());
            if compare_ids(&a, &b).is_gt() {
                (b, a)
            } else {
                (a, b)
            }
        })
        .collect()
}

fn first_number(text: &str) -> Option<&str> {
    NUMBER_PATTERN.find(text).map(|m| m.as_str())
}

fn is_decimal(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}
