//! Markdown rendering of a [`RunReport`].

use std::fmt::Write as _;

use docmerge_shared::{MergeOutcome, RunReport};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the run summary written to the report file.
pub fn render_markdown(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str("# 文档合并总结报告\n\n");

    out.push_str("## 执行信息\n\n");
    let _ = writeln!(out, "- 运行编号: `{}`", report.run_id);
    let _ = writeln!(
        out,
        "- 开始时间: {}",
        report.started_at.format(TIMESTAMP_FORMAT)
    );
    let _ = writeln!(
        out,
        "- 结束时间: {}",
        report.finished_at.format(TIMESTAMP_FORMAT)
    );
    let _ = writeln!(out, "- 处理目录: `{}`", report.root);
    let _ = writeln!(out, "- 扫描文档数: {}", report.documents_scanned);
    if report.dry_run {
        out.push_str("- 模式: 试运行（未修改任何文件）\n");
    }

    out.push_str("\n## 合并结果统计\n\n");
    let _ = writeln!(out, "- 总主题数: {}", report.total_themes());
    let _ = writeln!(out, "- 成功合并: {}", report.successful());
    let _ = writeln!(out, "- 失败数量: {}", report.failed());
    let _ = writeln!(out, "- 成功率: {:.1}%", report.success_rate());

    out.push_str("\n## 详细合并结果\n\n");
    for result in &report.results {
        let members = result.members.len();
        match &result.outcome {
            MergeOutcome::Merged {
                output,
                master,
                failed_removals,
                sha256,
                ..
            } => {
                let _ = writeln!(
                    out,
                    "- **{}**: ✅ 成功 → `{output}`（主文档 `{master}`，{members} 个文档，sha256 `{}`）",
                    result.theme,
                    &sha256[..sha256.len().min(12)]
                );
                for path in failed_removals {
                    let _ = writeln!(out, "  - ⚠️ 未能删除: `{path}`");
                }
            }
            MergeOutcome::Skipped { reason } => {
                let _ = writeln!(out, "- **{}**: ⏭️ 跳过（{reason}）", result.theme);
            }
            MergeOutcome::Planned {
                master,
                source_count,
            } => {
                let _ = writeln!(
                    out,
                    "- **{}**: 📝 计划合并 {source_count} 个文档（主文档 `{master}`）",
                    result.theme
                );
            }
            MergeOutcome::Failed { error } => {
                let _ = writeln!(out, "- **{}**: ❌ 失败: {error}", result.theme);
            }
        }
    }

    let stray: Vec<&String> = report
        .results
        .iter()
        .flat_map(|r| match &r.outcome {
            MergeOutcome::Merged {
                failed_removals, ..
            } => failed_removals.iter().collect(),
            _ => Vec::new(),
        })
        .collect();
    if !stray.is_empty() {
        out.push_str("\n## 未删除的原始文档\n\n");
        out.push_str("以下文档已合并但未能删除，请手动处理:\n\n");
        for path in stray {
            let _ = writeln!(out, "- `{path}`");
        }
    }

    out.push_str("\n## 备份信息\n\n");
    match &report.backup {
        Some(path) => {
            let _ = writeln!(out, "- 原始文档已备份至: `{}`", path.display());
            out.push_str("- 如需恢复，请手动复制备份文件\n");
        }
        None => out.push_str("- 未创建备份\n"),
    }

    out.push_str("\n## 日志文件\n\n");
    match &report.log_location {
        Some(location) => {
            let _ = writeln!(out, "详细操作日志请查看: `{location}`");
        }
        None => out.push_str("详细操作日志已输出到标准错误\n"),
    }

    out
}
