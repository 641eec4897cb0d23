//! Syntactic rules a candidate block can break.
//!
//! Each rule is a pure predicate over the line-level view of one block. The
//! dispatcher runs a readability pre-check first: a block that is too short,
//! lacks braces, or lacks the minimum field set gets no further scrutiny and
//! is tagged unreadable only.

use crate::lines;
use std::collections::BTreeSet;

/// Stable identifiers for the syntactic rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleTag {
    Readability,
    Braces,
    Comma,
    Colon,
    Quote,
    Weight,
    MiscSymbols,
}

impl RuleTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleTag::Readability => "readability_rule",
            RuleTag::Braces => "braces_rule",
            RuleTag::Comma => "comma_rule",
            RuleTag::Colon => "colon_rule",
            RuleTag::Quote => "quote_rule",
            RuleTag::Weight => "weight_rule",
            RuleTag::MiscSymbols => "misc_rule",
        }
    }
}

/// Symbols allowed anywhere in a block, besides letters and digits.
const ALLOWED_SYMBOLS: &[char] = &[
    '+', '-', '"', ':', '.', '<', '>', '{', '}', ',', '\n', '_', ' ',
];

/// Byte positions of every occurrence of `needle` in `line`.
fn occurrences(line: &str, needle: char) -> Vec<usize> {
    line.char_indices()
        .filter_map(|(i, c)| (c == needle).then_some(i))
        .collect()
}

/// Minimal structural sanity: more than two lines, both braces present, and
/// the most-important fields named somewhere in the block. "weight" matches
/// both accepted synonyms (`weight`, `total_weight`).
pub fn is_readable(lines: &[&str]) -> bool {
    if lines.len() <= 2 {
        return false;
    }
    let contains = |needle: &str| lines.iter().any(|l| l.contains(needle));
    if !contains("{") || !contains("}") {
        return false;
    }
    contains("exercise") && contains("reps") && contains("weight")
}

/// The first and last lines of each block should be `{` and `}`.
pub fn breaks_braces(lines: &[&str]) -> bool {
    let first = lines.first().map(|l| l.trim());
    let last = lines.last().map(|l| l.trim());
    !(first == Some("{") && last == Some("}"))
}

/// Comma placement:
/// 1. every scrutinized line ends in exactly one trailing comma;
/// 2. extra commas are tolerated only strictly inside a quote pair (quote
///    positions paired sequentially);
/// 3. the last content line carries no comma at all.
pub fn breaks_comma(lines: &[&str]) -> bool {
    for line in lines::scrutinized(lines) {
        let commas = occurrences(line, ',');
        if commas.is_empty() {
            return true;
        }
        if commas.len() > 1 {
            let quotes = occurrences(line, '"');
            let pairs: Vec<(usize, usize)> =
                quotes.chunks_exact(2).map(|q| (q[0], q[1])).collect();
            for &comma in &commas[..commas.len() - 1] {
                if !pairs.iter().any(|&(open, close)| open < comma && comma < close) {
                    return true;
                }
            }
        }
        if !line.trim().ends_with(',') {
            return true;
        }
    }

    match lines.len().checked_sub(2) {
        Some(i) => lines[i].contains(','),
        None => false,
    }
}

/// Exactly one `:` per scrutinized line.
pub fn breaks_colon(lines: &[&str]) -> bool {
    lines::scrutinized(lines)
        .iter()
        .any(|line| occurrences(line, ':').len() != 1)
}

/// Either 2 or 4 quote marks per scrutinized line (quoted key with a bare
/// value, or quoted key and quoted string value).
pub fn breaks_quote(lines: &[&str]) -> bool {
    lines::scrutinized(lines)
        .iter()
        .any(|line| !matches!(occurrences(line, '"').len(), 2 | 4))
}

/// The weight value must convert to a number. An arithmetic expression such
/// as `BW + 3` (or a missing weight line entirely) breaks this rule.
pub fn breaks_weight(lines: &[&str]) -> bool {
    let Some(line) = lines::scrutinized(lines)
        .iter()
        .find(|l| l.contains("weight"))
    else {
        return true;
    };
    let Some((_, value)) = line.split_once(':') else {
        return true;
    };
    value.trim().trim_matches(',').trim().parse::<f64>().is_err()
}

/// Only letters, digits, and the symbols in [`ALLOWED_SYMBOLS`] may appear
/// anywhere in the block.
pub fn breaks_misc_symbols(lines: &[&str]) -> bool {
    lines
        .iter()
        .flat_map(|l| l.chars())
        .any(|c| !c.is_ascii_alphanumeric() && !ALLOWED_SYMBOLS.contains(&c))
}

/// Evaluate every rule against one block.
///
/// Readability short-circuits: an unreadable block is tagged with
/// `Readability` alone.
pub fn check_rules(lines: &[&str]) -> BTreeSet<RuleTag> {
    let mut broken = BTreeSet::new();
    if !is_readable(lines) {
        broken.insert(RuleTag::Readability);
        return broken;
    }

    let checks: [(RuleTag, fn(&[&str]) -> bool); 6] = [
        (RuleTag::Comma, breaks_comma),
        (RuleTag::Braces, breaks_braces),
        (RuleTag::Colon, breaks_colon),
        (RuleTag::Quote, breaks_quote),
        (RuleTag::Weight, breaks_weight),
        (RuleTag::MiscSymbols, breaks_misc_symbols),
    ];
    for (tag, breaks) in checks {
        if breaks(lines) {
            broken.insert(tag);
        }
    }
    broken
}
