//! Provenance lines written into merged documents, and their removal.
//!
//! A merged document carries a header and footer describing how it was made.
//! When such a document becomes the master of a later merge, those lines are
//! stripped so they never pile up.

/// Labels used in the merge header and footer.
pub const THEME_LABEL: &str = "主题:";
pub const MERGED_AT_LABEL: &str = "合并时间:";
pub const SOURCE_COUNT_LABEL: &str = "原始文档数量:";
pub const MASTER_LABEL: &str = "主文档:";
pub const COMPLETED_AT_LABEL: &str = "合并完成时间:";

/// Title suffixes left behind by earlier merges.
const TITLE_SUFFIXES: [&str; 4] = ["_合并文档", "-合并", "_总结", "-merged"];

/// Labels that open a `>` header line.
const HEADER_LABELS: [&str; 5] = [
    THEME_LABEL,
    MERGED_AT_LABEL,
    SOURCE_COUNT_LABEL,
    MASTER_LABEL,
    COMPLETED_AT_LABEL,
];

/// Whether a line is part of a merge header or footer.
///
/// Only two shapes qualify: a blockquote whose text starts with a header
/// label (an emoji marker in front is allowed), and the `*合并完成时间: ..*`
/// footer. Ordinary prose mentioning a label is left alone.
pub fn is_provenance_line(line: &str) -> bool {
    let line = line.trim();

    if let Some(quoted) = line.strip_prefix('>') {
        let text = quoted
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim_start();
        if text.starts_with("本文档由") && text.contains("合并而成") {
            return true;
        }
        return HEADER_LABELS.iter().any(|label| text.starts_with(label));
    }

    line.strip_prefix('*')
        .and_then(|rest| rest.strip_suffix('*'))
        .is_some_and(|footer| footer.trim_start().starts_with(COMPLETED_AT_LABEL))
}

/// Drop provenance lines outside fenced code blocks.
pub fn strip_provenance(content: &str) -> String {
    let mut kept = Vec::new();
    let mut in_code_block = false;

    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
        } else if !in_code_block && is_provenance_line(line) {
            continue;
        }
        kept.push(line);
    }

    kept.join("\n")
}

/// Title for a merged document derived from its master's stem.
pub fn clean_title(stem: &str) -> String {
    TITLE_SUFFIXES
        .iter()
        .fold(stem.to_string(), |title, suffix| title.replace(suffix, ""))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_header_and_footer_lines() {
        let content = "\
# 预算
> 主题: 预算管理
> 本文档由 3 个相关文档合并而成
> 合并时间: 2025-01-01 10:00:00
> 原始文档数量: 3
> 主文档: a.md
正文保留
*合并完成时间: 2025-01-01 10:00:01*";
        assert_eq!(strip_provenance(content), "# 预算\n正文保留");
    }

    #[test]
    fn code_blocks_are_untouched() {
        let content = "```\n> 主题: 示例\n```\n> 主题: 删除";
        assert_eq!(strip_provenance(content), "```\n> 主题: 示例\n```");
    }

    #[test]
    fn partial_markers_survive() {
        assert!(!is_provenance_line("> 本文档由三部分组成"));
        assert!(!is_provenance_line("> 合并时间 未知"));
        assert!(is_provenance_line("> 🕒 合并时间: 2024-05-01 08:00:00"));
        assert!(is_provenance_line("> 📝 本文档由 4 个相关文档合并而成"));
        assert!(is_provenance_line("> 🎯 主文档: a.md"));
    }

    #[test]
    fn labels_in_ordinary_prose_are_kept() {
        let content = "\
会议主题: 第三季度预算评审
主文档: 见附件A
> 会议主题: 引用里的议程
- 合并时间: 周五之前
*备注 合并完成时间: 待定*
> 主题: 预算管理";
        assert_eq!(
            strip_provenance(content),
            "会议主题: 第三季度预算评审\n主文档: 见附件A\n> 会议主题: 引用里的议程\n- 合并时间: 周五之前\n*备注 合并完成时间: 待定*"
        );
    }

    #[test]
    fn clean_title_removes_known_suffixes() {
        assert_eq!(clean_title("预算管理_合并文档"), "预算管理");
        assert_eq!(clean_title("发布-合并"), "发布");
        assert_eq!(clean_title("A_总结"), "A");
        assert_eq!(clean_title("notes-merged"), "notes");
        assert_eq!(clean_title("plain"), "plain");
        assert_eq!(clean_title("_总结"), "");
    }
}
