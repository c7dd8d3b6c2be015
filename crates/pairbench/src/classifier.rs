//! Keyword heuristic for labelling unlabelled questions
//!
//! Rules are checked in order and the first one that matches decides the
//! category. Anything unmatched is a description.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The six TREC coarse question categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCategory {
    Abbreviation,
    NumericValue,
    Location,
    HumanBeing,
    Entity,
    Description,
}

impl LabelCategory {
    /// Label text as it appears in annotated contexts
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelCategory::Abbreviation => "abbreviation",
            LabelCategory::NumericValue => "numeric value",
            LabelCategory::Location => "location",
            LabelCategory::HumanBeing => "human being",
            LabelCategory::Entity => "entity",
            LabelCategory::Description => "description and abstract concept",
        }
    }
}

impl fmt::Display for LabelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification rule: a question matches when any cue is a substring
/// of the lowercased question.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub category: LabelCategory,
    pub cues: &'static [&'static str],
}

impl Rule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.cues.iter().any(|cue| lowered.contains(cue))
    }
}

// "what does" and "mean by" are too ambiguous on their own, so the
// abbreviation rule only fires on an explicit abbreviation cue.
const ABBREVIATION_CUES: &[&str] = &["stand for", "abbreviat", "acronym"];

const NUMERIC_CUES: &[&str] = &[
    "how many",
    "how much",
    "how old",
    "how long",
    "what year",
    "how far",
    "what number",
    "how tall",
];

const LOCATION_CUES: &[&str] = &[
    "where", "city", "country", "located", "location", "place", "capital",
];

const HUMAN_CUES: &[&str] = &[
    "who ",
    "who's",
    "whose",
    "whom",
    "author",
    "president",
    "inventor",
    "founder",
    "actor",
];

const ENTITY_CUES: &[&str] = &[
    "what is the name",
    "what film",
    "what movie",
    "what book",
    "what company",
    "what product",
];

/// Rules in priority order
pub const RULES: [Rule; 5] = [
    Rule {
        category: LabelCategory::Abbreviation,
        cues: ABBREVIATION_CUES,
    },
    Rule {
        category: LabelCategory::NumericValue,
        cues: NUMERIC_CUES,
    },
    Rule {
        category: LabelCategory::Location,
        cues: LOCATION_CUES,
    },
    Rule {
        category: LabelCategory::HumanBeing,
        cues: HUMAN_CUES,
    },
    Rule {
        category: LabelCategory::Entity,
        cues: ENTITY_CUES,
    },
];

/// Infer a label category for a question
pub fn classify(question: &str) -> LabelCategory {
    let lowered = question.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.category)
        .unwrap_or(LabelCategory::Description)
}
