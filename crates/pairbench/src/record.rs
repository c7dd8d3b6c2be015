//! Per-user records extracted from a context window
//!
//! A [`Corpus`] maps each user id to the instances that user contributed.
//! It is built once by the parser and only read afterwards.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A single annotated question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Raw date string as it appears in the context (e.g. "Jan 05, 2023")
    pub date: String,
    /// The question text
    pub question: String,
    /// Label category, explicit or inferred
    pub label: String,
}

/// Everything known about one user
///
/// `labels` and `dates` are derived from `instances` and only change through
/// [`UserRecord::add_instance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    user_id: String,
    instances: Vec<Instance>,
    labels: BTreeSet<String>,
    dates: Vec<String>,
}

impl UserRecord {
    /// Create an empty record
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            instances: Vec::new(),
            labels: BTreeSet::new(),
            dates: Vec::new(),
        }
    }

    /// Append an instance, keeping the label set and date list in sync
    pub fn add_instance(
        &mut self,
        date: impl Into<String>,
        question: impl Into<String>,
        label: impl Into<String>,
    ) {
        let instance = Instance {
            date: date.into(),
            question: question.into(),
            label: label.into(),
        };
        self.labels.insert(instance.label.clone());
        self.dates.push(instance.date.clone());
        self.instances.push(instance);
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// True when the label set is exactly `{label}`
    pub fn has_only_label(&self, label: &str) -> bool {
        self.labels.len() == 1 && self.labels.contains(label)
    }

    pub fn shares_label_with(&self, other: &UserRecord) -> bool {
        !self.labels.is_disjoint(&other.labels)
    }

    /// True when any date string contains `year` as a substring
    pub fn has_date_containing(&self, year: &str) -> bool {
        self.dates.iter().any(|d| d.contains(year))
    }

    /// Lexicographically smallest raw date string
    pub fn earliest_date(&self) -> Option<&str> {
        self.dates.iter().min().map(String::as_str)
    }
}

/// All users parsed from one context window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Corpus {
    users: HashMap<String, UserRecord>,
    /// User ids in order of first appearance
    first_seen: Vec<String>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an instance for `user_id`, creating the user on first sight
    pub fn add_instance(&mut self, user_id: &str, date: &str, question: &str, label: &str) {
        let user = match self.users.entry(user_id.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.first_seen.push(user_id.to_string());
                entry.insert(UserRecord::new(user_id))
            }
        };
        user.add_instance(date, question, label);
    }

    pub fn get(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Total number of instances across all users
    pub fn instance_count(&self) -> usize {
        self.users.values().map(UserRecord::instance_count).sum()
    }

    /// Users ordered by numeric id
    ///
    /// Ids with the same value but different spelling ("7" and "07") keep
    /// the order in which they first appeared.
    pub fn sorted_users(&self) -> Vec<&UserRecord> {
        let mut users: Vec<&UserRecord> = self
            .first_seen
            .iter()
            .filter_map(|id| self.users.get(id))
            .collect();
        users.sort_by(|a, b| compare_ids(a.user_id(), b.user_id()));
        users
    }
}

/// Compare two decimal id strings by numeric value
///
/// Works for ids of any length. Ids with equal value but different spelling
/// ("07" and "7") compare equal.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let a_digits = a.trim_start_matches('0');
    let b_digits = b.trim_start_matches('0');
    a_digits
        .len()
        .cmp(&b_digits.len())
        .then_with(|| a_digits.cmp(b_digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_instance_keeps_derived_fields_in_sync() {
        let mut user = UserRecord::new("42");
        user.add_instance("Jan 01, 2023", "Where is Paris?", "location");
        user.add_instance("Feb 02, 2023", "Who wrote Hamlet?", "human being");
        user.add_instance("Mar 03, 2023", "Where is Rome?", "location");

        assert_eq!(user.instance_count(), 3);
        assert_eq!(user.dates().len(), 3);
        assert_eq!(user.labels().len(), 2);
        assert!(user.has_label("location"));
        assert!(!user.has_only_label("location"));
    }

    #[test]
    fn test_earliest_date_is_string_minimum() {
        let mut user = UserRecord::new("1");
        user.add_instance("Mar 01, 2022", "q", "entity");
        user.add_instance("Jan 15, 2024", "q", "entity");
        user.add_instance("Feb 10, 2021", "q", "entity");

        assert_eq!(user.earliest_date(), Some("Feb 10, 2021"));
    }

    #[test]
    fn test_compare_ids_numeric() {
        assert_eq!(compare_ids("9", "10"), Ordering::Less);
        assert_eq!(compare_ids("100", "99"), Ordering::Greater);
        assert_eq!(compare_ids("007", "7"), Ordering::Equal);
        assert_eq!(compare_ids("12", "12"), Ordering::Equal);
        assert_eq!(
            compare_ids("123456789012345678901234567890", "99"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_sorted_users() {
        let mut corpus = Corpus::new();
        corpus.add_instance("10", "d", "q", "entity");
        corpus.add_instance("9", "d", "q", "entity");
        corpus.add_instance("100", "d", "q", "entity");

        let ids: Vec<&str> = corpus.sorted_users().iter().map(|u| u.user_id()).collect();
        assert_eq!(ids, vec!["9", "10", "100"]);
    }

    #[test]
    fn test_sorted_users_keeps_first_seen_order_for_equal_ids() {
        let mut corpus = Corpus::new();
        corpus.add_instance("8", "d", "q", "entity");
        corpus.add_instance("7", "d", "q", "entity");
        corpus.add_instance("07", "d", "q", "entity");
        corpus.add_instance("7", "d", "q", "entity");

        let ids: Vec<&str> = corpus.sorted_users().iter().map(|u| u.user_id()).collect();
        assert_eq!(ids, vec!["7", "07", "8"]);

        let mut reversed = Corpus::new();
        reversed.add_instance("07", "d", "q", "entity");
        reversed.add_instance("7", "d", "q", "entity");

        let ids: Vec<&str> = reversed.sorted_users().iter().map(|u| u.user_id()).collect();
        assert_eq!(ids, vec!["07", "7"]);
    }
}
