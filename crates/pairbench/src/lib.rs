//! Pair-relation benchmark engine
//!
//! Scores a model on OOLONG-Pairs style questions: "list every pair of users
//! that satisfies P" over a flat log of annotated questions.
//!
//! ## Pipeline
//!
//! - **Parser**: context window text into per-user records
//! - **Classifier**: keyword fallback for questions without a label
//! - **Oracle**: exact, canonically ordered ground truth for a query
//! - **Judge**: accepts a free-text answer on exact match, or with at least
//!   80% precision and 80% recall over the extracted pairs
//!
//! The [`Harness`] wires these together over many samples, with the model
//! behind the [`Answerer`] trait.

pub mod classifier;
pub mod config;
pub mod harness;
pub mod judge;
pub mod loader;
pub mod oracle;
pub mod parser;
pub mod query;
pub mod record;

pub use classifier::{classify, LabelCategory};
pub use config::BenchmarkConfig;
pub use harness::{
    Answer, AnswerRequest, Answerer, BenchmarkReport, Harness, QueryOutcome, ReplayAnswerer,
    Sample,
};
pub use judge::{evaluate_answer, judge, MatchKind, Verdict};
pub use loader::{builtin_catalog, load_catalog, load_catalogs_from_dir, parse_catalog};
pub use oracle::{evaluate, evaluate_predicate, GroundTruth, NO_PAIRS};
pub use parser::parse_context;
pub use query::{PairQuery, Predicate};
pub use record::{Corpus, Instance, UserRecord};
