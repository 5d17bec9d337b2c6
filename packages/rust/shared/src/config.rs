//! Application configuration for docmerge.
//!
//! User config lives at `~/.docmerge/docmerge.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocMergeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docmerge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docmerge";

// ---------------------------------------------------------------------------
// Config structs (matching docmerge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Which files the scanner admits.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Theme table and match weights.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Master-document importance weights.
    #[serde(default)]
    pub importance: ImportanceConfig,

    /// Key-section extraction rules.
    #[serde(default)]
    pub merge: MergeRulesConfig,
}

/// Where merged documents are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputPlacement {
    /// At the root of the document tree.
    #[default]
    Root,
    /// Next to the chosen master document.
    AlongsideMaster,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Document root used when no path is given on the command line.
    #[serde(default = "default_docs_path")]
    pub docs_path: String,

    /// Placement of merged documents.
    #[serde(default)]
    pub output_placement: OutputPlacement,

    /// Whether the unclassified bucket is merged like any other theme.
    #[serde(default = "default_true")]
    pub merge_unclassified: bool,

    /// File name of the run report, written at the document root.
    #[serde(default = "default_report_file")]
    pub report_file: String,

    /// Suffix appended to the root's name for the sibling backup directory.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            docs_path: default_docs_path(),
            output_placement: OutputPlacement::default(),
            merge_unclassified: true,
            report_file: default_report_file(),
            backup_suffix: default_backup_suffix(),
        }
    }
}

fn default_docs_path() -> String {
    "./docs".into()
}
fn default_true() -> bool {
    true
}
fn default_report_file() -> String {
    "docmerge-report.md".into()
}
fn default_backup_suffix() -> String {
    "_backup".into()
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Admitted file extensions (without the dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directories whose name starts with this prefix are skipped.
    #[serde(default = "default_skip_dir_prefix")]
    pub skip_dir_prefix: String,

    /// Directory names skipped entirely.
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// Stem suffix marking merged output; such files are never scanned.
    #[serde(default = "default_merged_suffix")]
    pub merged_suffix: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            skip_dir_prefix: default_skip_dir_prefix(),
            excluded_dirs: default_excluded_dirs(),
            merged_suffix: default_merged_suffix(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["md", "txt", "docx", "doc"].map(String::from).to_vec()
}
fn default_skip_dir_prefix() -> String {
    ".".into()
}
fn default_excluded_dirs() -> Vec<String> {
    ["_archived", "_backup"].map(String::from).to_vec()
}
fn default_merged_suffix() -> String {
    "-merged".into()
}

/// A theme and the keywords that vote for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDef {
    pub name: String,
    pub keywords: Vec<String>,
}

/// `[classifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Points per keyword found in the document name.
    #[serde(default = "default_name_weight")]
    pub name_weight: u32,

    /// Points per keyword found in the relative path.
    #[serde(default = "default_path_weight")]
    pub path_weight: u32,

    /// Points per keyword found in the content prefix.
    #[serde(default = "default_content_weight")]
    pub content_weight: u32,

    /// How many leading characters of content are searched.
    #[serde(default = "default_content_prefix_chars")]
    pub content_prefix_chars: usize,

    /// Bucket for documents that match no theme.
    #[serde(default = "default_unclassified_label")]
    pub unclassified_label: String,

    /// Ordered theme table. Order decides ties.
    #[serde(default = "default_themes")]
    pub themes: Vec<ThemeDef>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            name_weight: default_name_weight(),
            path_weight: default_path_weight(),
            content_weight: default_content_weight(),
            content_prefix_chars: default_content_prefix_chars(),
            unclassified_label: default_unclassified_label(),
            themes: default_themes(),
        }
    }
}

fn default_name_weight() -> u32 {
    3
}
fn default_path_weight() -> u32 {
    2
}
fn default_content_weight() -> u32 {
    1
}
fn default_content_prefix_chars() -> usize {
    2000
}
fn default_unclassified_label() -> String {
    "未分类".into()
}

fn theme(name: &str, keywords: &[&str]) -> ThemeDef {
    ThemeDef {
        name: name.into(),
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
    }
}

fn default_themes() -> Vec<ThemeDef> {
    vec![
        theme(
            "交易记录",
            &["交易记录", "transaction", "记录页面", "日期筛选", "查询功能", "交易", "记录"],
        ),
        theme(
            "资产管理",
            &["资产", "assets", "资产页面", "资产数据", "历史快照", "资产管理"],
        ),
        theme("预算管理", &["预算", "budget", "预算对比", "预算数据", "预算管理"]),
        theme(
            "家庭协作",
            &["家庭协作", "家庭管理", "协作功能", "成员管理", "家庭", "协作"],
        ),
        theme("报表统计", &["报表", "统计", "reports", "趋势图", "分析", "报表统计"]),
        theme("问题修复", &["修复", "fix", "问题", "错误", "bug", "问题修复"]),
        theme("功能优化", &["优化", "optimization", "改进", "enhancement", "功能优化"]),
        theme("测试相关", &["测试", "test", "验证", "检查", "测试相关"]),
        theme(
            "数据库相关",
            &["数据库", "database", "集合", "索引", "云开发", "数据库相关"],
        ),
        theme("UI界面", &["UI", "界面", "交互", "导航", "安全区", "UI界面"]),
        theme("技术文档", &["技术", "API", "接口", "架构", "设计", "技术文档"]),
        theme("兼容性", &["兼容", "compatibility", "适配", "版本", "兼容性"]),
    ]
}

/// A name keyword and the importance it lends a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordWeight {
    pub keyword: String,
    pub weight: u32,
}

/// Content longer than `above` characters earns `points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeTier {
    pub above: usize,
    pub points: u32,
}

/// `[importance.structure]` — one-time bonuses for structural markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureWeights {
    #[serde(default = "default_top_heading")]
    pub top_heading: u32,
    #[serde(default = "default_sub_heading")]
    pub sub_heading: u32,
    #[serde(default = "default_code_fence")]
    pub code_fence: u32,
    #[serde(default = "default_rule")]
    pub rule: u32,
}

impl Default for StructureWeights {
    fn default() -> Self {
        Self {
            top_heading: default_top_heading(),
            sub_heading: default_sub_heading(),
            code_fence: default_code_fence(),
            rule: default_rule(),
        }
    }
}

fn default_top_heading() -> u32 {
    3
}
fn default_sub_heading() -> u32 {
    2
}
fn default_code_fence() -> u32 {
    1
}
fn default_rule() -> u32 {
    1
}

/// `[importance]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceConfig {
    /// Name keywords, matched as substrings of the document stem.
    #[serde(default = "default_importance_keywords")]
    pub keywords: Vec<KeywordWeight>,

    /// Content-length tiers; the first tier exceeded wins.
    #[serde(default = "default_size_tiers")]
    pub size_tiers: Vec<SizeTier>,

    #[serde(default)]
    pub structure: StructureWeights,

    /// Directory names whose documents are preferred as masters.
    #[serde(default = "default_trusted_dirs")]
    pub trusted_dirs: Vec<String>,

    /// Bonus for living under a trusted directory.
    #[serde(default = "default_trusted_bonus")]
    pub trusted_bonus: u32,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            keywords: default_importance_keywords(),
            size_tiers: default_size_tiers(),
            structure: StructureWeights::default(),
            trusted_dirs: default_trusted_dirs(),
            trusted_bonus: default_trusted_bonus(),
        }
    }
}

fn default_importance_keywords() -> Vec<KeywordWeight> {
    [
        ("合并文档", 15),
        ("总结", 10),
        ("完成", 9),
        ("最终", 8),
        ("方案", 7),
        ("报告", 6),
        ("记录", 5),
        ("分析", 4),
        ("计划", 3),
        ("指南", 2),
    ]
    .into_iter()
    .map(|(keyword, weight)| KeywordWeight {
        keyword: keyword.into(),
        weight,
    })
    .collect()
}

fn default_size_tiers() -> Vec<SizeTier> {
    [(10_000, 8), (5_000, 5), (2_000, 3), (500, 1)]
        .into_iter()
        .map(|(above, points)| SizeTier { above, points })
        .collect()
}

fn default_trusted_dirs() -> Vec<String> {
    vec!["analysis-reports".into()]
}
fn default_trusted_bonus() -> u32 {
    2
}

/// `[merge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRulesConfig {
    /// Secondary documents at or below this many trimmed characters are not excerpted.
    #[serde(default = "default_min_substantive_chars")]
    pub min_substantive_chars: usize,

    /// Maximum excerpted lines per secondary document.
    #[serde(default = "default_max_key_lines")]
    pub max_key_lines: usize,

    /// Lines containing any of these are kept as key lines.
    #[serde(default = "default_signal_keywords")]
    pub signal_keywords: Vec<String>,
}

impl Default for MergeRulesConfig {
    fn default() -> Self {
        Self {
            min_substantive_chars: default_min_substantive_chars(),
            max_key_lines: default_max_key_lines(),
            signal_keywords: default_signal_keywords(),
        }
    }
}

fn default_min_substantive_chars() -> usize {
    100
}
fn default_max_key_lines() -> usize {
    50
}
fn default_signal_keywords() -> Vec<String> {
    [
        "问题", "解决", "修复", "优化", "结果", "总结", "完成", "实现", "problem", "fix", "result",
        "done",
    ]
    .map(String::from)
    .to_vec()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docmerge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DocMergeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docmerge/docmerge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocMergeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| DocMergeError::config(format!("failed to parse {}: {e}", path.display())))?;

    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocMergeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocMergeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocMergeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check the invariants the classifier and scanner rely on.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let c = &config.classifier;
    if !(c.name_weight > c.path_weight && c.path_weight > c.content_weight && c.content_weight > 0)
    {
        return Err(DocMergeError::config(format!(
            "classifier weights must satisfy name > path > content > 0 (got {} / {} / {})",
            c.name_weight, c.path_weight, c.content_weight
        )));
    }

    if c.themes.is_empty() {
        return Err(DocMergeError::config("classifier.themes must not be empty"));
    }

    let mut seen = HashSet::new();
    for def in &c.themes {
        if def.name.trim().is_empty() {
            return Err(DocMergeError::config("theme names must not be empty"));
        }
        if def.name == c.unclassified_label {
            return Err(DocMergeError::config(format!(
                "theme '{}' collides with the unclassified label",
                def.name
            )));
        }
        if !seen.insert(def.name.as_str()) {
            return Err(DocMergeError::config(format!(
                "duplicate theme '{}'",
                def.name
            )));
        }
        if def.keywords.iter().any(|k| k.is_empty()) {
            return Err(DocMergeError::config(format!(
                "theme '{}' has an empty keyword",
                def.name
            )));
        }
    }

    if config.scan.merged_suffix.is_empty() {
        return Err(DocMergeError::config("scan.merged_suffix must not be empty"));
    }

    if config.defaults.report_file.contains('/') || config.defaults.report_file.is_empty() {
        return Err(DocMergeError::config(
            "defaults.report_file must be a plain file name",
        ));
    }

    Ok(())
}
