//! Field-level schema validation for recovered records.
//!
//! The schema is a fixed table of specs. A spec binds one or more synonym
//! keys (a schema-evolution artifact: `total_weight` and `weight` name the
//! same field) to the set of scalar types the value may take. Core fields
//! must be present; auxiliary fields are type-checked only when present.

use crate::repair::Record;
use serde::Serialize;
use serde_json::Value;

/// Scalar types a field value may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Null,
}

/// One schema rule: one of `keys` holds a value typed as one of `types`.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub keys: &'static [&'static str],
    pub types: &'static [FieldType],
    /// Whether absence of every synonym key rejects the record.
    pub required: bool,
}

pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        keys: &["exercise"],
        types: &[FieldType::String],
        required: true,
    },
    FieldSpec {
        keys: &["total_weight", "weight"],
        types: &[FieldType::Float, FieldType::Integer, FieldType::String],
        required: true,
    },
    FieldSpec {
        keys: &["angle"],
        types: &[FieldType::Float, FieldType::Integer],
        required: false,
    },
    FieldSpec {
        keys: &["equipment"],
        types: &[FieldType::String],
        required: false,
    },
    FieldSpec {
        keys: &["reps"],
        types: &[FieldType::Integer],
        required: true,
    },
    FieldSpec {
        keys: &["assisted"],
        types: &[FieldType::Integer],
        required: false,
    },
    FieldSpec {
        keys: &["partial_rom"],
        types: &[FieldType::Integer],
        required: false,
    },
    FieldSpec {
        keys: &["dropped_weight"],
        types: &[FieldType::Integer],
        required: false,
    },
    FieldSpec {
        keys: &["grip_mod_1"],
        types: &[FieldType::String],
        required: false,
    },
    FieldSpec {
        keys: &["grip_mod_2"],
        types: &[FieldType::String],
        required: false,
    },
    FieldSpec {
        keys: &["grip_mod_3"],
        types: &[FieldType::String],
        required: false,
    },
    FieldSpec {
        keys: &["grip_mod_4"],
        types: &[FieldType::String],
        required: false,
    },
    FieldSpec {
        keys: &["plates"],
        types: &[FieldType::Integer, FieldType::Null, FieldType::Float],
        required: false,
    },
    FieldSpec {
        keys: &["half_weight"],
        types: &[FieldType::Boolean],
        required: false,
    },
    FieldSpec {
        keys: &["drop_set"],
        types: &[FieldType::Boolean],
        required: false,
    },
    FieldSpec {
        keys: &["super_set"],
        types: &[FieldType::Boolean],
        required: false,
    },
];

/// Why a record was rejected. Carries the failing spec's synonym key list so
/// the discard report points at the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reject {
    /// None of the spec's synonym keys is present (incorrect formatting).
    MissingField(&'static [&'static str]),
    /// A synonym key is present but its value has a disallowed type.
    WrongType(&'static [&'static str]),
}

/// Validation verdict for one record.
#[derive(Debug)]
pub enum Verdict {
    Accepted(Record),
    Rejected { record: Record, reason: Reject },
}

fn matches_type(value: &Value, ty: FieldType) -> bool {
    match ty {
        FieldType::String => value.is_string(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Float => value.is_f64(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Null => value.is_null(),
    }
}

/// Check one record against every spec; first failure wins.
pub fn validate_record(record: &Record) -> std::result::Result<(), Reject> {
    for spec in FIELD_SPECS {
        let Some(key) = spec.keys.iter().find(|k| record.contains_key(**k)) else {
            if spec.required {
                return Err(Reject::MissingField(spec.keys));
            }
            continue;
        };
        let value = &record[*key];
        if !spec.types.iter().any(|&ty| matches_type(value, ty)) {
            return Err(Reject::WrongType(spec.keys));
        }
    }
    Ok(())
}

/// Trim stray whitespace from every field name, an artifact of sloppy
/// quoting in the source text.
fn trim_record_keys(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| (key.trim().to_string(), value.clone()))
        .collect()
}

/// Validate a record, retrying once with whitespace-trimmed keys before
/// finally rejecting it.
pub fn validate_with_key_repair(record: Record) -> Verdict {
    let reason = match validate_record(&record) {
        Ok(()) => return Verdict::Accepted(record),
        Err(reason) => reason,
    };

    let trimmed = trim_record_keys(&record);
    if trimmed == record {
        return Verdict::Rejected { record, reason };
    }
    match validate_record(&trimmed) {
        Ok(()) => Verdict::Accepted(trimmed),
        Err(reason) => Verdict::Rejected {
            record: trimmed,
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn minimal_correct_record_is_accepted() {
        let r = record(json!({"exercise": "Squat", "weight": 100, "reps": 5}));
        assert_eq!(validate_record(&r), Ok(()));
    }

    #[test]
    fn full_record_is_accepted() {
        let r = record(json!({
            "exercise": "Bench press",
            "total_weight": 72.5,
            "angle": 30,
            "equipment": "barbell",
            "reps": 8,
            "assisted": 0,
            "partial_rom": 0,
            "dropped_weight": 0,
            "grip_mod_1": "wide",
            "grip_mod_2": "overhand",
            "grip_mod_3": "",
            "grip_mod_4": "",
            "plates": null,
            "half_weight": false,
            "drop_set": false,
            "super_set": true
        }));
        assert_eq!(validate_record(&r), Ok(()));
    }

    #[test]
    fn string_weight_is_accepted() {
        // Expression values survive as strings; interpreting them is a
        // downstream concern.
        let r = record(json!({"exercise": "Pull ups", "total_weight": "BW + 10", "reps": 8}));
        assert_eq!(validate_record(&r), Ok(()));
    }

    #[test]
    fn wrong_reps_type_is_rejected() {
        let r = record(json!({"exercise": "Squat", "weight": 100, "reps": "five"}));
        assert_eq!(validate_record(&r), Err(Reject::WrongType(&["reps"])));
    }

    #[test]
    fn missing_weight_is_rejected_with_synonym_list() {
        let r = record(json!({"exercise": "Squat", "reps": 5}));
        assert_eq!(
            validate_record(&r),
            Err(Reject::MissingField(&["total_weight", "weight"]))
        );
    }

    #[test]
    fn boolean_reps_is_not_an_integer() {
        let r = record(json!({"exercise": "Squat", "weight": 100, "reps": true}));
        assert_eq!(validate_record(&r), Err(Reject::WrongType(&["reps"])));
    }

    #[test]
    fn optional_field_present_with_wrong_type_is_rejected() {
        let r = record(json!({"exercise": "Squat", "weight": 100, "reps": 5, "plates": "two"}));
        assert_eq!(validate_record(&r), Err(Reject::WrongType(&["plates"])));
    }

    #[test]
    fn whitespace_keys_are_trimmed_and_revalidated() {
        let r = record(json!({" exercise ": "Squat", "weight": 100, "reps": 5}));
        match validate_with_key_repair(r) {
            Verdict::Accepted(fixed) => {
                assert_eq!(fixed["exercise"], json!("Squat"));
                assert!(!fixed.contains_key(" exercise "));
            }
            Verdict::Rejected { reason, .. } => panic!("expected Accepted, got {:?}", reason),
        }
    }

    #[test]
    fn trim_retry_happens_only_once() {
        // Trimming does not help here: reps is genuinely mistyped.
        let r = record(json!({" exercise ": "Squat", "weight": 100, "reps": "five"}));
        match validate_with_key_repair(r) {
            Verdict::Rejected { record, reason } => {
                assert_eq!(reason, Reject::WrongType(&["reps"]));
                // The rejected record is the trimmed variant, ready for review.
                assert!(record.contains_key("exercise"));
            }
            Verdict::Accepted(_) => panic!("expected Rejected"),
        }
    }
}
