//! Benchmark harness
//!
//! Runs every query against every sample: computes the ground truth from the
//! labelled context, asks the [`Answerer`] for a prediction, judges it, and
//! collects the outcomes into a [`BenchmarkReport`].

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BenchmarkConfig;
use crate::judge::evaluate_answer;
use crate::oracle::evaluate;
use crate::parser::parse_context;
use crate::query::PairQuery;

/// One context window from the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    /// Context without labels
    #[serde(default)]
    pub context: String,
    /// Context with `|| Label:` fields, used for ground truth
    #[serde(default)]
    pub labeled_context: Option<String>,
}

impl Sample {
    /// Context used both for ground truth and for the answerer
    pub fn ground_truth_context(&self) -> &str {
        self.labeled_context.as_deref().unwrap_or(&self.context)
    }
}

/// What the answerer is asked
#[derive(Debug, Clone, Copy)]
pub struct AnswerRequest<'a> {
    pub sample_id: &'a str,
    pub query_id: &'a str,
    pub context: &'a str,
    pub query: &'a str,
}

impl AnswerRequest<'_> {
    /// System prompt for the answering model
    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    /// User prompt embedding the context and query
    pub fn user_prompt(&self) -> String {
        format!(
            r#"CONTEXT DATA:
{}

QUERY: {}

Analyze the data above and provide your answer. List all matching pairs in the format (id1, id2) where id1 < id2."#,
            self.context, self.query
        )
    }
}

/// A model's answer
#[derive(Debug, Clone, Default)]
pub struct Answer {
    pub text: String,
    /// Prompt plus completion tokens
    pub tokens: u64,
}

/// Source of candidate answers, usually an LLM client
pub trait Answerer {
    fn answer(&mut self, request: &AnswerRequest<'_>) -> Result<Answer>;
}

/// Answers recorded earlier, keyed by sample and query id
#[derive(Debug, Default)]
pub struct ReplayAnswerer {
    answers: HashMap<(String, String), String>,
}

#[derive(Debug, Deserialize)]
struct RecordedAnswer {
    sample_id: String,
    query_id: String,
    predicted: String,
}

impl ReplayAnswerer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        sample_id: impl Into<String>,
        query_id: impl Into<String>,
        predicted: impl Into<String>,
    ) {
        self.answers
            .insert((sample_id.into(), query_id.into()), predicted.into());
    }

    /// Parse JSON lines of `{sample_id, query_id, predicted}`
    pub fn from_jsonl(content: &str) -> Result<Self> {
        let mut replay = Self::new();
        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let recorded: RecordedAnswer = serde_json::from_str(line)
                .with_context(|| format!("Invalid answer on line {}", line_num + 1))?;
            replay.insert(recorded.sample_id, recorded.query_id, recorded.predicted);
        }
        Ok(replay)
    }
}

impl Answerer for ReplayAnswerer {
    fn answer(&mut self, request: &AnswerRequest<'_>) -> Result<Answer> {
        let key = (request.sample_id.to_string(), request.query_id.to_string());
        let text = self.answers.get(&key).cloned().with_context(|| {
            format!(
                "No recorded answer for sample {} query {}",
                request.sample_id, request.query_id
            )
        })?;
        Ok(Answer { text, tokens: 0 })
    }
}

/// Result of one query on one sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub sample_id: String,
    pub query_id: String,
    pub query: String,
    pub ground_truth: String,
    /// Prediction, truncated to `max_predicted_chars`
    pub predicted: String,
    pub is_correct: bool,
    pub tokens: u64,
}

/// Accuracy of one catalog query across samples
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryAccuracy {
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
}

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub overall_accuracy: f64,
    pub total_correct: usize,
    pub total_questions: usize,
    pub baseline_accuracy: f64,
    pub delta_vs_baseline: f64,
    pub accuracy_by_query: BTreeMap<String, QueryAccuracy>,
    pub total_tokens: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(skip)]
    pub outcomes: Vec<QueryOutcome>,
}

impl BenchmarkReport {
    fn from_outcomes(outcomes: Vec<QueryOutcome>, baseline_accuracy: f64) -> Self {
        let total_questions = outcomes.len();
        let total_correct = outcomes.iter().filter(|o| o.is_correct).count();
        let total_tokens = outcomes.iter().map(|o| o.tokens).sum();
        let overall_accuracy = ratio(total_correct, total_questions);

        let mut accuracy_by_query: BTreeMap<String, QueryAccuracy> = BTreeMap::new();
        for outcome in &outcomes {
            let entry = accuracy_by_query.entry(outcome.query_id.clone()).or_default();
            entry.total += 1;
            if outcome.is_correct {
                entry.correct += 1;
            }
        }
        for entry in accuracy_by_query.values_mut() {
            entry.accuracy = ratio(entry.correct, entry.total);
        }

        Self {
            overall_accuracy,
            total_correct,
            total_questions,
            baseline_accuracy,
            delta_vs_baseline: overall_accuracy - baseline_accuracy,
            accuracy_by_query,
            total_tokens,
            timestamp: chrono::Utc::now(),
            outcomes,
        }
    }

    /// Summary as pretty JSON (outcomes excluded)
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize benchmark report")
    }

    /// One JSON object per outcome, newline separated
    pub fn outcomes_jsonl(&self) -> Result<String> {
        let mut out = String::new();
        for outcome in &self.outcomes {
            out.push_str(&serde_json::to_string(outcome).context("Failed to serialize outcome")?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Print a summary of the report
    pub fn print_summary(&self) {
        println!("\n========== OOLONG-PAIRS BENCHMARK REPORT ==========\n");
        println!(
            "Overall Accuracy: {:.2}% ({}/{})",
            self.overall_accuracy * 100.0,
            self.total_correct,
            self.total_questions
        );
        println!("Baseline:         {:.2}%", self.baseline_accuracy * 100.0);
        println!("Difference:       {:+.2}%", self.delta_vs_baseline * 100.0);

        println!("\n---------- Accuracy by Query ----------\n");
        for (query_id, acc) in &self.accuracy_by_query {
            println!(
                "  {}: {:.2}% ({}/{})",
                query_id,
                acc.accuracy * 100.0,
                acc.correct,
                acc.total
            );
        }

        println!("\nTotal tokens: {}", self.total_tokens);
        println!("\n===================================================\n");
    }
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

/// System prompt given to the answering model
pub const SYSTEM_PROMPT: &str = r#"You are analyzing data to find pairs of user IDs that meet specific criteria.

IMPORTANT INSTRUCTIONS:
1. Read the context carefully to identify all users and their attributes
2. For each user, note their User ID, labels/categories of their questions, and dates
3. Find ALL pairs that meet the criteria
4. List pairs as (lower_id, higher_id) format
5. Be exhaustive - check every possible pair combination
6. If no pairs match, say "No pairs found"

Be precise and thorough. Check every user combination."#;

/// Runs queries over samples with a given answerer
pub struct Harness<A> {
    answerer: A,
    config: BenchmarkConfig,
}

impl<A: Answerer> Harness<A> {
    /// Create a new harness
    pub fn new(answerer: A, config: BenchmarkConfig) -> Self {
        Self { answerer, config }
    }

    /// Run the first `num_queries` queries against the first `num_samples`
    /// samples
    pub fn run(&mut self, samples: &[Sample], queries: &[PairQuery]) -> BenchmarkReport {
        let samples = &samples[..samples.len().min(self.config.num_samples)];
        let queries = &queries[..queries.len().min(self.config.num_queries)];
        info!(
            "Running {} queries over {} samples",
            queries.len(),
            samples.len()
        );

        let mut outcomes = Vec::with_capacity(samples.len() * queries.len());
        for sample in samples {
            outcomes.extend(self.run_sample(sample, queries));
        }

        BenchmarkReport::from_outcomes(outcomes, self.config.baseline_accuracy)
    }

    /// Run every query against one sample
    pub fn run_sample(&mut self, sample: &Sample, queries: &[PairQuery]) -> Vec<QueryOutcome> {
        let context = sample.ground_truth_context();
        let corpus = parse_context(context, true);
        let max_chars = self.config.max_predicted_chars;
        debug!("Sample {}: {} users found", sample.id, corpus.len());

        queries
            .iter()
            .map(|query| {
                let ground_truth = evaluate(&corpus, query).to_string();
                let request = AnswerRequest {
                    sample_id: &sample.id,
                    query_id: &query.id,
                    context,
                    query: &query.query,
                };
                let answer = match self.answerer.answer(&request) {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!("Answerer failed on {}/{}: {:#}", sample.id, query.id, e);
                        Answer::default()
                    }
                };

                let verdict = evaluate_answer(&answer.text, &ground_truth, &query.query);
                debug!(
                    "{}/{}: {:?} passed={}",
                    sample.id,
                    query.id,
                    verdict.kind,
                    verdict.passed()
                );

                QueryOutcome {
                    sample_id: sample.id.clone(),
                    query_id: query.id.clone(),
                    query: query.query.clone(),
                    ground_truth,
                    predicted: truncate_chars(&answer.text, max_chars),
                    is_correct: verdict.passed(),
                    tokens: answer.tokens,
                }
            })
            .collect()
    }

    /// Consume the harness and return its answerer
    pub fn into_answerer(self) -> A {
        self.answerer
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
