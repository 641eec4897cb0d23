//! Chat export ingestion (result.json).
//!
//! JSON shape:
//! {
//!   "messages": [
//!     { "id": 1217, "text": "{\n\"exercise\": \"Squat\",\n...\n}" },
//!     ...
//!   ]
//! }
//!
//! The export tool is loose about both fields: ids may be numbers or strings,
//! and text may be a plain string or an array of rich-text fragments (plain
//! strings mixed with `{ "type": ..., "text": ... }` objects). Both are
//! normalized here; the rest of the crate only sees `{id, text}` pairs.

use crate::Result;
use anyhow::{Context, bail};
use serde::Deserialize;
use serde::de::Deserializer;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct Export {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// One message from the export: an opaque id and its raw text block.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub text: String,
}

/// Read and parse an export file into its message list.
pub fn parse_export_file(path: &str) -> Result<Vec<Message>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read export file {}", path))?;
    let export: Export = serde_json::from_str(&text)
        .with_context(|| format!("parse export file {}", path))?;

    if export.messages.is_empty() {
        bail!("export file {} contained no messages", path);
    }
    Ok(export.messages)
}

/// Ids are numeric in chat exports but opaque to us; accept either shape.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Str(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Num(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

/// Flatten rich-text fragment arrays into one plain string.
fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Plain(String),
        Rich(Vec<Fragment>),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Fragment {
        Plain(String),
        Styled {
            #[serde(default)]
            text: String,
        },
    }

    Ok(match RawText::deserialize(deserializer)? {
        RawText::Plain(s) => s,
        RawText::Rich(fragments) => fragments
            .into_iter()
            .map(|f| match f {
                Fragment::Plain(s) => s,
                Fragment::Styled { text } => text,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_plain_messages() {
        let export: Export = serde_json::from_str(
            r#"{"messages": [{"id": 12, "text": "{\n\"reps\": 5\n}"}]}"#,
        )
        .unwrap();
        assert_eq!(export.messages.len(), 1);
        assert_eq!(export.messages[0].id, "12");
        assert_eq!(export.messages[0].text, "{\n\"reps\": 5\n}");
    }

    #[test]
    fn accepts_string_ids() {
        let export: Export =
            serde_json::from_str(r#"{"messages": [{"id": "m-7", "text": "hi"}]}"#).unwrap();
        assert_eq!(export.messages[0].id, "m-7");
    }

    #[test]
    fn flattens_rich_text_fragments() {
        let export: Export = serde_json::from_str(
            r#"{"messages": [{"id": 3, "text": ["{\n", {"type": "bold", "text": "\"reps\": 5"}, "\n}"]}]}"#,
        )
        .unwrap();
        assert_eq!(export.messages[0].text, "{\n\"reps\": 5\n}");
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let export: Export =
            serde_json::from_str(r#"{"messages": [{"id": 4}]}"#).unwrap();
        assert_eq!(export.messages[0].text, "");
    }
}
