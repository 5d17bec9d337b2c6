//! Key-section extraction for secondary documents.
//!
//! Only the lines that carry structure or signal are kept: headings, list
//! items, lines mentioning an outcome keyword, and fenced code blocks in full.

use std::sync::LazyLock;

use regex::Regex;

use docmerge_shared::MergeRulesConfig;

/// Marker appended when an excerpt is cut short.
pub const TRUNCATION_MARKER: &str = "...";

/// What counts as a key line and how many are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySectionRules {
    pub max_lines: usize,
    /// Lowercased signal keywords.
    signal_keywords: Vec<String>,
}

impl KeySectionRules {
    pub fn new(max_lines: usize, signal_keywords: &[String]) -> Self {
        Self {
            max_lines,
            signal_keywords: signal_keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn is_signal(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.signal_keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl Default for KeySectionRules {
    fn default() -> Self {
        Self::from(&MergeRulesConfig::default())
    }
}

impl From<&MergeRulesConfig> for KeySectionRules {
    fn from(config: &MergeRulesConfig) -> Self {
        Self::new(config.max_key_lines, &config.signal_keywords)
    }
}

fn is_list_item(trimmed: &str) -> bool {
    static NUMBERED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\d+\.").expect("valid regex"));

    trimmed.starts_with(['-', '*', '+']) || NUMBERED_RE.is_match(trimmed)
}

/// Extract the key lines of `content`.
pub fn extract_key_sections(content: &str, rules: &KeySectionRules) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut in_code_block = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            kept.push(line);
            continue;
        }

        if in_code_block {
            kept.push(line);
            continue;
        }

        if trimmed.is_empty() {
            // Collapse blank runs; never start with a blank.
            if kept.last().is_some_and(|prev| !prev.trim().is_empty()) {
                kept.push("");
            }
            continue;
        }

        if trimmed.starts_with('#') || is_list_item(trimmed) || rules.is_signal(trimmed) {
            kept.push(line);
        }
    }

    if kept.len() > rules.max_lines {
        kept.truncate(rules.max_lines);
        kept.push(TRUNCATION_MARKER);
    }

    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    kept.join("\n")
}
