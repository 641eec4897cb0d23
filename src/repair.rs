//! Repair heuristics and the pipeline that drives them.
//!
//! Each heuristic is one entry in an ordered attempt chain: it either parses
//! the candidate, rewrites it and records the parse error that stopped it, or
//! declares itself not applicable. The rewritten text is threaded into the
//! next attempt, so later heuristics see earlier normalizations — quote
//! repair must run before comma repair, because the comma repair's
//! line-content tests only work once quoting noise is gone.

use crate::lines;
use crate::rules::{self, RuleTag};
use crate::Result;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// A successfully parsed block: field name to scalar value.
pub type Record = serde_json::Map<String, Value>;

/// Substrings that mark a message as a plausible record candidate. Plain
/// chatter contains none of them and is never fed to the parser.
const CANDIDATE_KEYWORDS: &[&str] = &["{", "}", "grip_mod"];

/// Sentinel naming the final content field, which by convention carries no
/// trailing comma.
const SUPER_SET_MARKER: &str = "super_set";

/// One failed parse attempt, kept for the discard report.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptError {
    pub attempt: &'static str,
    pub message: String,
}

/// What one repair attempt did with the candidate text.
enum Attempt {
    Parsed(Record),
    /// Gate unmet; candidate unchanged, no error recorded.
    NotApplicable,
    /// The (possibly rewritten) candidate did not parse; later attempts
    /// continue from the rewritten text.
    Failed(String, AttemptError),
}

/// Terminal result of the repair pipeline for one block.
#[derive(Debug)]
pub enum RepairOutcome {
    Parsed(Record),
    /// Fails minimal structural sanity; not worth per-rule diagnostics.
    Unreadable { errors: Vec<AttemptError> },
    /// Exhausted every attempt; carries the accumulated parse errors and the
    /// syntactic rules the original block breaks, for manual review.
    Failed {
        errors: Vec<AttemptError>,
        broken_rules: BTreeSet<RuleTag>,
    },
}

fn looks_like_candidate(text: &str) -> bool {
    CANDIDATE_KEYWORDS.iter().any(|k| text.contains(k))
}

fn parse_attempt(attempt: &'static str, text: String) -> Attempt {
    match serde_json::from_str::<Record>(&text) {
        Ok(record) => Attempt::Parsed(record),
        Err(e) => Attempt::Failed(
            text,
            AttemptError {
                attempt,
                message: e.to_string(),
            },
        ),
    }
}

/// Attempt 1: parse the text as-is.
fn parse_as_is(text: &str) -> Result<Attempt> {
    if !looks_like_candidate(text) {
        return Ok(Attempt::NotApplicable);
    }
    Ok(parse_attempt("parse_as_is", text.to_string()))
}

/// Attempt 2: quote a bodyweight expression so the record is not lost.
///
/// `"total_weight": BW + 10,` becomes `"total_weight": "BW + 10",` — the
/// value stays recoverable as text even though it is not numeric.
fn coerce_bodyweight(text: &str) -> Result<Attempt> {
    if !text.contains("BW") {
        return Ok(Attempt::NotApplicable);
    }
    let re = Regex::new(r#"total_weight":[ ]*([a-zA-Z\-\+0-9\. ]*),"#)?;
    let rewritten = re
        .replace_all(text, |caps: &Captures| {
            format!(r#"total_weight": "{}","#, &caps[1])
        })
        .into_owned();
    Ok(parse_attempt("coerce_bodyweight", rewritten))
}

/// Strip every quote from a segment and re-wrap the trimmed remainder.
fn strip_and_requote(segment: &str) -> String {
    format!("\"{}\"", segment.replace('"', "").trim())
}

/// Attempt 3: normalize quoting per interior line.
///
/// A line splitting on `:` into exactly two parts gets its key re-quoted;
/// the value is re-quoted only if it contained a quote (bare numbers and
/// booleans stay unquoted).
fn rewrap_quotes(text: &str) -> Result<Attempt> {
    if !looks_like_candidate(text) {
        return Ok(Attempt::NotApplicable);
    }
    let mut line_list: Vec<String> = text.split('\n').map(str::to_string).collect();
    let len = line_list.len();
    if len > 2 {
        for line in &mut line_list[1..len - 1] {
            let mut parts: Vec<String> = line.split(':').map(str::to_string).collect();
            if parts.len() == 2 {
                parts[0] = strip_and_requote(&parts[0]);
                if parts[1].contains('"') {
                    parts[1] = strip_and_requote(&parts[1]);
                }
            }
            *line = parts.join(" : ");
        }
    }
    Ok(parse_attempt("rewrap_quotes", lines::reassemble(&line_list)))
}

/// Attempt 4: normalize comma placement per line.
///
/// Exactly one of three transformations applies to each line:
/// - neither brace nor super-set marker: strip commas, append one;
/// - super-set marker: strip commas (the last content line must have none);
/// - a brace: strip stray dots.
fn normalize_commas(text: &str) -> Result<Attempt> {
    if !looks_like_candidate(text) {
        return Ok(Attempt::NotApplicable);
    }
    let line_list: Vec<String> = text
        .split('\n')
        .map(|line| {
            if !line.contains(SUPER_SET_MARKER) && !line.contains('{') && !line.contains('}') {
                let mut out = line.replace(',', "");
                out.push(',');
                out
            } else if line.contains(SUPER_SET_MARKER) {
                line.replace(',', "")
            } else {
                line.replace('.', "")
            }
        })
        .collect();
    Ok(parse_attempt("normalize_commas", lines::reassemble(&line_list)))
}

/// Run the repair chain on one block. Earlier success wins; a failed attempt
/// records its parse error and hands its rewritten text to the next one.
pub fn repair_block(text: &str) -> Result<RepairOutcome> {
    let attempts: [fn(&str) -> Result<Attempt>; 4] = [
        parse_as_is,
        coerce_bodyweight,
        rewrap_quotes,
        normalize_commas,
    ];

    let mut candidate = text.to_string();
    let mut errors: Vec<AttemptError> = Vec::new();
    for attempt in attempts {
        match attempt(&candidate)? {
            Attempt::Parsed(record) => return Ok(RepairOutcome::Parsed(record)),
            Attempt::NotApplicable => {}
            Attempt::Failed(rewritten, error) => {
                candidate = rewritten;
                errors.push(error);
            }
        }
    }

    // Classify the original block for the discard report.
    let line_list = lines::split_block(text);
    let broken_rules = rules::check_rules(&line_list);
    if broken_rules.contains(&RuleTag::Readability) {
        return Ok(RepairOutcome::Unreadable { errors });
    }
    Ok(RepairOutcome::Failed {
        errors,
        broken_rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parsed(outcome: RepairOutcome) -> Record {
        match outcome {
            RepairOutcome::Parsed(record) => record,
            other => panic!("expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn valid_block_parses_directly() {
        let text = "{\n\"exercise\": \"Squat\",\n\"weight\": 100,\n\"reps\": 5\n}";
        let record = parsed(repair_block(text).unwrap());
        assert_eq!(record["exercise"], json!("Squat"));
        assert_eq!(record["weight"], json!(100));
        assert_eq!(record["reps"], json!(5));
    }

    #[test]
    fn valid_single_line_block_parses_directly() {
        // Readability never gates the parse attempts.
        let record = parsed(repair_block(r#"{"grip_mod_1": "hook", "reps": 5}"#).unwrap());
        assert_eq!(record["grip_mod_1"], json!("hook"));
    }

    #[test]
    fn bodyweight_expression_is_preserved_as_string() {
        let text = "{\n\"exercise\": \"Pull ups\",\n\"total_weight\": BW + 10,\n\"reps\": 8,\n\"super_set\": false\n}";
        let record = parsed(repair_block(text).unwrap());
        assert_eq!(record["total_weight"], json!("BW + 10"));
        assert_eq!(record["reps"], json!(8));
    }

    #[test]
    fn unquoted_keys_are_requoted() {
        let text = "{\nexercise: \"Bench\",\nreps: 5,\nsuper_set: false\n}";
        let record = parsed(repair_block(text).unwrap());
        assert_eq!(record["exercise"], json!("Bench"));
        assert_eq!(record["reps"], json!(5));
        assert_eq!(record["super_set"], json!(false));
    }

    #[test]
    fn missing_commas_are_added() {
        let text = "{\n\"exercise\": \"Squat\"\n\"reps\": 5\n\"super_set\": false\n}";
        let record = parsed(repair_block(text).unwrap());
        assert_eq!(record["exercise"], json!("Squat"));
        assert_eq!(record["reps"], json!(5));
    }

    #[test]
    fn trailing_comma_on_last_entry_is_stripped() {
        let text = "{\n\"exercise\": \"Squat\",\n\"reps\": 5,\n\"super_set\": false,\n}";
        let record = parsed(repair_block(text).unwrap());
        assert_eq!(record["super_set"], json!(false));
    }

    #[test]
    fn plain_chatter_is_unreadable_without_errors() {
        match repair_block("see you at the gym tomorrow").unwrap() {
            RepairOutcome::Unreadable { errors } => assert_eq!(errors.len(), 0),
            other => panic!("expected Unreadable, got {:?}", other),
        }
    }

    #[test]
    fn unrepairable_block_reports_errors_and_rules() {
        // Readable, but the bare expression value never parses: the marker is
        // BW yet the field is `weight`, which the coercion does not target.
        let text = "{\n\"exercise\": \"Dips\",\n\"weight\": BW + 5,\n\"reps\": 5,\n\"super_set\": false\n}";
        match repair_block(text).unwrap() {
            RepairOutcome::Failed {
                errors,
                broken_rules,
            } => {
                assert!(!errors.is_empty());
                assert_eq!(errors[0].attempt, "parse_as_is");
                assert!(broken_rules.contains(&RuleTag::Weight));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
