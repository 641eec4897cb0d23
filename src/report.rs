//! Terminal classification and report building.
//!
//! Every message ends in exactly one of four outcomes; nothing is silently
//! dropped. The discard report keeps enough context per message (original
//! text, parse errors, broken rules or failing field spec) for manual review.

use crate::export::Message;
use crate::lines;
use crate::repair::{self, AttemptError, Record, RepairOutcome};
use crate::rules::{self, RuleTag};
use crate::schema::{self, Reject, Verdict};
use crate::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Terminal outcome for one message.
#[derive(Debug)]
pub enum Outcome {
    Accepted(Record),
    SchemaRejected { record: Record, reason: Reject },
    ParseFailed {
        errors: Vec<AttemptError>,
        broken_rules: BTreeSet<RuleTag>,
    },
    Unreadable { errors: Vec<AttemptError> },
}

/// An accepted record, keyed by its message id for correlation.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedView {
    pub id: String,
    pub record: Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaRejectView {
    pub id: String,
    pub record: Record,
    pub reason: Reject,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseFailView {
    pub id: String,
    pub text: String,
    pub errors: Vec<AttemptError>,
    pub broken_rules: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadableView {
    pub id: String,
    pub text: String,
    pub errors: Vec<AttemptError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub messages: usize,
    pub accepted: usize,
    pub schema_rejected: usize,
    pub parse_failed: usize,
    pub unreadable: usize,
}

/// Everything written to the discard dump.
#[derive(Debug, Clone, Serialize)]
pub struct DiscardReport {
    pub totals: TotalsView,
    pub schema_rejected: Vec<SchemaRejectView>,
    pub parse_failed: Vec<ParseFailView>,
    pub unreadable: Vec<UnreadableView>,
}

/// Accepted records plus the discard report for one run.
#[derive(Debug)]
pub struct RunSummary {
    pub accepted: Vec<AcceptedView>,
    pub report: DiscardReport,
}

/// Repair and validate one message's text.
pub fn classify_message(text: &str) -> Result<Outcome> {
    let outcome = match repair::repair_block(text)? {
        RepairOutcome::Parsed(record) => match schema::validate_with_key_repair(record) {
            Verdict::Accepted(record) => Outcome::Accepted(record),
            Verdict::Rejected { record, reason } => Outcome::SchemaRejected { record, reason },
        },
        RepairOutcome::Unreadable { errors } => Outcome::Unreadable { errors },
        RepairOutcome::Failed {
            errors,
            broken_rules,
        } => Outcome::ParseFailed {
            errors,
            broken_rules,
        },
    };
    Ok(outcome)
}

/// Run every message through the pipeline and partition the outcomes.
pub fn build_run(messages: &[Message]) -> Result<RunSummary> {
    let mut accepted: Vec<AcceptedView> = Vec::new();
    let mut schema_rejected: Vec<SchemaRejectView> = Vec::new();
    let mut parse_failed: Vec<ParseFailView> = Vec::new();
    let mut unreadable: Vec<UnreadableView> = Vec::new();

    for message in messages {
        match classify_message(&message.text)? {
            Outcome::Accepted(record) => accepted.push(AcceptedView {
                id: message.id.clone(),
                record,
            }),
            Outcome::SchemaRejected { record, reason } => {
                schema_rejected.push(SchemaRejectView {
                    id: message.id.clone(),
                    record,
                    reason,
                })
            }
            Outcome::ParseFailed {
                errors,
                broken_rules,
            } => parse_failed.push(ParseFailView {
                id: message.id.clone(),
                text: message.text.clone(),
                errors,
                broken_rules: broken_rules.iter().map(RuleTag::as_str).collect(),
            }),
            Outcome::Unreadable { errors } => unreadable.push(UnreadableView {
                id: message.id.clone(),
                text: message.text.clone(),
                errors,
            }),
        }
    }

    let totals = TotalsView {
        messages: messages.len(),
        accepted: accepted.len(),
        schema_rejected: schema_rejected.len(),
        parse_failed: parse_failed.len(),
        unreadable: unreadable.len(),
    };
    Ok(RunSummary {
        accepted,
        report: DiscardReport {
            totals,
            schema_rejected,
            parse_failed,
            unreadable,
        },
    })
}

/// Count how many messages break each syntactic rule.
pub fn rule_histogram(messages: &[Message]) -> BTreeMap<&'static str, usize> {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for message in messages {
        let line_list = lines::split_block(&message.text);
        for tag in rules::check_rules(&line_list) {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }
    counts
}
