//! Context window parser
//!
//! Context windows are flat text made of records like
//!
//! ```text
//! Date: Jan 05, 2023 || User: 4821 || Instance: Where is Lima? || Label: location
//! ```
//!
//! Unlabelled windows drop the `|| Label:` field, and the question then runs
//! until the next `Date:` marker (it may span several lines). Records that do
//! not fit the shape are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::classifier::classify;
use crate::record::Corpus;

/// Marker that switches the parser into labelled mode
const LABEL_MARKER: &str = "|| Label:";

/// Start of the next record in unlabelled mode
const DATE_MARKER: &str = "Date:";

static LABELED_RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Date:\s*([^|]+)\|\|\s*User:\s*([0-9]+)\s*\|\|\s*Instance:\s*([^|]+)\|\|\s*Label:\s*([^\n]+)",
    )
    .expect("Invalid labeled record regex")
});

static UNLABELED_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Date:\s*([^|]+)\|\|\s*User:\s*([0-9]+)\s*\|\|\s*Instance:\s*")
        .expect("Invalid unlabeled record regex")
});

/// Parse a context window into a corpus
///
/// With `labeled` set and a `|| Label:` field present, labels are read from
/// the text. Otherwise every question is labelled by the keyword classifier.
pub fn parse_context(context: &str, labeled: bool) -> Corpus {
    let corpus = if labeled && context.contains(LABEL_MARKER) {
        parse_labeled(context)
    } else {
        parse_unlabeled(context)
    };

    debug!(
        "Parsed context: {} users, {} instances",
        corpus.len(),
        corpus.instance_count()
    );
    corpus
}

fn parse_labeled(context: &str) -> Corpus {
    let mut corpus = Corpus::new();

    for caps in LABELED_RECORD.captures_iter(context) {
        let date = caps[1].trim();
        let user_id = caps[2].trim();
        let question = caps[3].trim();
        let label = caps[4].trim();
        corpus.add_instance(user_id, date, question, label);
    }

    corpus
}

fn parse_unlabeled(context: &str) -> Corpus {
    let mut corpus = Corpus::new();
    let mut pos = 0;

    while let Some(caps) = UNLABELED_HEADER.captures_at(context, pos) {
        let Some(header) = caps.get(0) else {
            break;
        };
        let (header_start, header_end) = (header.start(), header.end());

        let Some(body_end) = question_end(context, header_end, header_start) else {
            debug!("Skipping record at byte {} with no question text", header_start);
            pos = header_end;
            continue;
        };

        let question = context[header_end..body_end].trim();
        let date = caps[1].trim();
        let user_id = caps[2].trim();
        corpus.add_instance(user_id, date, question, classify(question).as_str());

        pos = body_end;
    }

    corpus
}

/// Find where the question starting at `start` ends.
///
/// The question holds at least one character and stops right before the
/// next `Date:` marker, or at the end of the text. When the header swallowed
/// all remaining text, its trailing whitespace stands in as an empty question.
fn question_end(context: &str, start: usize, header_start: usize) -> Option<usize> {
    let rest = &context[start..];
    let Some(first) = rest.chars().next() else {
        let header = &context[header_start..start];
        return header
            .chars()
            .last()
            .filter(|c| c.is_whitespace())
            .map(|_| start);
    };

    let after_first = start + first.len_utf8();
    let end = context[after_first..]
        .find(DATE_MARKER)
        .map(|offset| after_first + offset)
        .unwrap_or(context.len());
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELED: &str = "\
Date: Jan 05, 2023 || User: 12 || Instance: Where is Lima? || Label: location
Date: Feb 11, 2023 || User: 7 || Instance: Who wrote Dune? || Label: human being
Date: Mar 02, 2024 || User: 12 || Instance: How tall is K2? || Label: numeric value
";

    #[test]
    fn test_parse_labeled() {
        let corpus = parse_context(LABELED, true);

        assert_eq!(corpus.len(), 2);
        let user = corpus.get("12").unwrap();
        assert_eq!(user.instance_count(), 2);
        assert_eq!(user.instances()[0].date, "Jan 05, 2023");
        assert_eq!(user.instances()[0].question, "Where is Lima?");
        assert_eq!(user.instances()[1].label, "numeric value");
        assert!(corpus.get("7").unwrap().has_only_label("human being"));
    }

    #[test]
    fn test_labeled_skips_malformed_records() {
        let text = "\
Date: Jan 05, 2023 || User: 12 || Instance: Where is Lima? || Label: location
Date: Jan 06, 2023 || User: abc || Instance: broken user || Label: entity
Date: Jan 07, 2023 || Instance: missing user || Label: entity
Date: Jan 08, 2023 || User: 3 || Instance: Who is Ada? || Label: human being
";
        let corpus = parse_context(text, true);

        assert_eq!(corpus.len(), 2);
        assert!(corpus.get("12").is_some());
        assert!(corpus.get("3").is_some());
    }

    #[test]
    fn test_parse_unlabeled_infers_labels() {
        let text = "\
Date: Jan 05, 2023 || User: 12 || Instance: Where is Lima?
Date: Feb 11, 2023 || User: 7 || Instance: Who wrote Dune?
and what else did they write
Date: Mar 02, 2024 || User: 12 || Instance: How tall is K2?";
        let corpus = parse_context(text, false);

        assert_eq!(corpus.len(), 2);
        let twelve = corpus.get("12").unwrap();
        assert_eq!(twelve.instances()[0].label, "location");
        assert_eq!(twelve.instances()[1].label, "numeric value");
        assert_eq!(twelve.instances()[1].question, "How tall is K2?");

        let seven = corpus.get("7").unwrap();
        assert_eq!(
            seven.instances()[0].question,
            "Who wrote Dune?\nand what else did they write"
        );
        assert!(seven.has_only_label("human being"));
    }

    #[test]
    fn test_labeled_flag_without_label_field_falls_back() {
        let text = "Date: Jan 05, 2023 || User: 12 || Instance: Where is Lima?";
        let corpus = parse_context(text, true);

        assert!(corpus.get("12").unwrap().has_only_label("location"));
    }

    #[test]
    fn test_unlabeled_mode_parses_one_record() {
        let text = "Date: Jan 05, 2023 || User: 12 || Instance: Where is Lima?";
        let corpus = parse_context(text, false);
        assert_eq!(corpus.instance_count(), 1);
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(parse_context("", true).is_empty());
        assert!(parse_context("", false).is_empty());
        assert!(parse_context("nothing to see here", false).is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse_context(LABELED, true), parse_context(LABELED, true));
    }
}
