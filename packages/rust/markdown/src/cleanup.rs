//! Cleanup passes for document bodies folded into a merged document.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.

use crate::provenance::strip_provenance;

/// Clean the master's content before it becomes the main section.
pub(crate) fn clean_master(md: &str) -> String {
    let mut result = strip_provenance(md);

    result = normalize_whitespace(&result);
    result = collapse_blank_runs(&result);
    result = trim_blank_edges(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Normalize whitespace
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line and normalize line endings.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Collapse blank runs
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines outside code blocks into one.
fn collapse_blank_runs(md: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_code_block = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(line);
            continue;
        }

        let blank = !in_code_block && line.trim().is_empty();
        if blank && lines.last().is_some_and(|prev| prev.trim().is_empty()) {
            continue;
        }
        lines.push(line);
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Trim leading and trailing blank lines
// ---------------------------------------------------------------------------

fn trim_blank_edges(md: &str) -> String {
    md.trim_start_matches('\n').trim_end_matches('\n').to_string()
}

// ---------------------------------------------------------------------------
// Final pass: Ensure trailing newline
// ---------------------------------------------------------------------------

/// Ensure the file ends with exactly one newline.
pub(crate) fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_whitespace_trims_trailing() {
        let input = "Line 1   \r\nLine 2\t\nLine 3";
        assert_eq!(normalize_whitespace(input), "Line 1\nLine 2\nLine 3");
    }

    #[test]
    fn collapse_blank_runs_outside_code() {
        let input = "a\n\n\n\nb\n```\n\n\n```\nc";
        assert_eq!(collapse_blank_runs(input), "a\n\nb\n```\n\n\n```\nc");
    }

    #[test]
    fn trim_blank_edges_strips_outer_newlines() {
        assert_eq!(trim_blank_edges("\n\nbody\n\n"), "body");
    }

    #[test]
    fn ensure_trailing_newline_normalizes_multiple() {
        assert_eq!(ensure_trailing_newline("Content"), "Content\n");
        assert_eq!(ensure_trailing_newline("Content\n\n\n"), "Content\n");
    }

    #[test]
    fn clean_master_leaves_no_gap_where_header_was() {
        let input = "> 主题: 预算管理\n> 本文档由 2 个相关文档合并而成\n\n\n正文\n\n\n\n结尾\n";
        assert_eq!(clean_master(input), "正文\n\n结尾");
    }
}
