//! Keyword-weighted theme classifier.
//!
//! Every keyword of every theme is checked against three places with
//! decreasing confidence: the document name, its relative path, and a bounded
//! prefix of its content. The highest total wins; ties go to the theme that
//! comes first in the table, and documents with no hits at all land in the
//! unclassified bucket.

use tracing::{debug, info, instrument};

use docmerge_shared::{ClassifierConfig, Document, LoadedDocument, ThemeDef, ThemeGroup};

/// Points awarded per keyword hit, by location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchWeights {
    pub name: u32,
    pub path: u32,
    pub content: u32,
    /// Leading characters of content that are searched.
    pub content_prefix_chars: usize,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

impl From<&ClassifierConfig> for MatchWeights {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            name: config.name_weight,
            path: config.path_weight,
            content: config.content_weight,
            content_prefix_chars: config.content_prefix_chars,
        }
    }
}

/// Outcome of classifying one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeMatch {
    pub theme: String,
    /// Winning score; 0 for the unclassified bucket.
    pub score: u32,
}

#[derive(Debug, Clone)]
struct Theme {
    name: String,
    /// Lowercased keywords, in table order.
    keywords: Vec<String>,
}

/// Classifies documents against a fixed, ordered theme table.
#[derive(Debug, Clone)]
pub struct ThemeClassifier {
    themes: Vec<Theme>,
    unclassified: String,
    weights: MatchWeights,
}

impl ThemeClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self::from_parts(
            &config.themes,
            &config.unclassified_label,
            MatchWeights::from(config),
        )
    }

    pub fn from_parts(themes: &[ThemeDef], unclassified: &str, weights: MatchWeights) -> Self {
        let themes = themes
            .iter()
            .map(|def| Theme {
                name: def.name.clone(),
                keywords: def.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();

        Self {
            themes,
            unclassified: unclassified.to_string(),
            weights,
        }
    }

    /// Name of the bucket for documents without any keyword hit.
    pub fn unclassified_label(&self) -> &str {
        &self.unclassified
    }

    /// Score of every theme, in table order.
    pub fn theme_scores(&self, document: &Document, content: &str) -> Vec<(&str, u32)> {
        let name = document.name.to_lowercase();
        let path = document.relative_path.to_lowercase();
        let prefix: String = content
            .chars()
            .take(self.weights.content_prefix_chars)
            .collect::<String>()
            .to_lowercase();

        self.themes
            .iter()
            .map(|theme| {
                let score = theme
                    .keywords
                    .iter()
                    .map(|kw| {
                        let mut points = 0;
                        if name.contains(kw.as_str()) {
                            points += self.weights.name;
                        }
                        if path.contains(kw.as_str()) {
                            points += self.weights.path;
                        }
                        if prefix.contains(kw.as_str()) {
                            points += self.weights.content;
                        }
                        points
                    })
                    .sum();
                (theme.name.as_str(), score)
            })
            .collect()
    }

    /// Assign a document to exactly one theme.
    pub fn classify(&self, document: &Document, content: &str) -> ThemeMatch {
        let mut best: Option<(&str, u32)> = None;

        for (theme, score) in self.theme_scores(document, content) {
            // Strict comparison keeps the earliest theme on ties.
            if score > 0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((theme, score));
            }
        }

        match best {
            Some((theme, score)) => {
                debug!(path = %document.relative_path, theme, score, "classified document");
                ThemeMatch {
                    theme: theme.to_string(),
                    score,
                }
            }
            None => {
                debug!(path = %document.relative_path, "no theme matched");
                ThemeMatch {
                    theme: self.unclassified.clone(),
                    score: 0,
                }
            }
        }
    }

    /// Classify every document and collect the non-empty groups.
    ///
    /// Groups follow table order with the unclassified bucket last; members
    /// keep their input order.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn group(&self, documents: Vec<LoadedDocument>) -> Vec<ThemeGroup> {
        let mut buckets: Vec<Vec<LoadedDocument>> = vec![Vec::new(); self.themes.len() + 1];

        for loaded in documents {
            let matched = self.classify(&loaded.document, &loaded.content);
            let slot = self
                .themes
                .iter()
                .position(|t| t.name == matched.theme)
                .unwrap_or(self.themes.len());
            buckets[slot].push(loaded);
        }

        let groups: Vec<ThemeGroup> = buckets
            .into_iter()
            .enumerate()
            .filter(|(_, members)| !members.is_empty())
            .map(|(slot, members)| ThemeGroup {
                theme: self
                    .themes
                    .get(slot)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| self.unclassified.clone()),
                members,
            })
            .collect();

        for group in &groups {
            info!(theme = %group.theme, count = group.members.len(), "theme group");
        }

        groups
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str) -> Document {
        Document::from_relative(path).unwrap()
    }

    fn loaded(path: &str, content: &str) -> LoadedDocument {
        LoadedDocument::new(doc(path), content)
    }

    fn default_classifier() -> ThemeClassifier {
        ThemeClassifier::new(&ClassifierConfig::default())
    }

    fn def(name: &str, keywords: &[&str]) -> ThemeDef {
        ThemeDef {
            name: name.into(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    #[test]
    fn budget_name_wins_over_analysis() {
        let classifier = default_classifier();
        let m = classifier.classify(&doc("预算对比分析.md"), "");
        assert_eq!(m.theme, "预算管理");
        // 预算 and 预算对比 each hit name (3) and path (2).
        assert_eq!(m.score, 10);

        let scores = classifier.theme_scores(&doc("预算对比分析.md"), "");
        let reports = scores.iter().find(|(t, _)| *t == "报表统计").unwrap();
        assert_eq!(reports.1, 5);
    }

    #[test]
    fn no_hits_is_unclassified() {
        let classifier = default_classifier();
        let m = classifier.classify(&doc("readme.md"), "hello world");
        assert_eq!(m.theme, "未分类");
        assert_eq!(m.score, 0);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = default_classifier();
        let d = doc("sub/交易记录修复.md");
        let content = "修复了交易记录页面的 bug";
        let first = classifier.classify(&d, content);
        for _ in 0..10 {
            assert_eq!(classifier.classify(&d, content), first);
        }
    }

    #[test]
    fn ties_go_to_first_theme_in_table() {
        let themes = [def("alpha", &["shared"]), def("beta", &["shared"])];
        let classifier = ThemeClassifier::from_parts(&themes, "none", MatchWeights::default());
        assert_eq!(classifier.classify(&doc("shared.md"), "").theme, "alpha");

        let reversed = [def("beta", &["shared"]), def("alpha", &["shared"])];
        let classifier = ThemeClassifier::from_parts(&reversed, "none", MatchWeights::default());
        assert_eq!(classifier.classify(&doc("shared.md"), "").theme, "beta");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let classifier = default_classifier();
        let m = classifier.classify(&doc("ui-notes.md"), "");
        assert_eq!(m.theme, "UI界面");

        let m = classifier.classify(&doc("notes.md"), "Budget review");
        assert_eq!(m.theme, "预算管理");
        assert_eq!(m.score, 1);
    }

    #[test]
    fn path_hits_rank_between_name_and_content() {
        let themes = [def("by-path", &["alpha"]), def("by-content", &["beta"])];
        let classifier = ThemeClassifier::from_parts(&themes, "none", MatchWeights::default());

        // "alpha" appears in the directory only, "beta" in the content only.
        let m = classifier.classify(&doc("alpha/notes.md"), "beta beta beta");
        assert_eq!(m.theme, "by-path");
        assert_eq!(m.score, 2);
    }

    #[test]
    fn content_beyond_prefix_is_ignored() {
        let themes = [def("late", &["needle"])];
        let weights = MatchWeights {
            content_prefix_chars: 10,
            ..MatchWeights::default()
        };
        let classifier = ThemeClassifier::from_parts(&themes, "none", weights);

        let content = format!("{}needle", "x".repeat(10));
        assert_eq!(classifier.classify(&doc("a.md"), &content).theme, "none");

        let content = format!("{}needle", "x".repeat(4));
        assert_eq!(classifier.classify(&doc("a.md"), &content).theme, "late");
    }

    #[test]
    fn every_document_lands_in_exactly_one_group() {
        let classifier = default_classifier();
        let docs = vec![
            loaded("预算对比分析.md", ""),
            loaded("readme.md", "nothing here"),
            loaded("测试报告.md", ""),
            loaded("budget-q3.txt", ""),
            loaded("misc.docx", "misc"),
        ];

        let groups = classifier.group(docs);
        let total: usize = groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(total, 5);

        let names: Vec<_> = groups.iter().map(|g| g.theme.as_str()).collect();
        assert_eq!(names, ["预算管理", "测试相关", "未分类"]);

        let budget = &groups[0];
        let members: Vec<_> = budget
            .members
            .iter()
            .map(|m| m.document.relative_path.as_str())
            .collect();
        assert_eq!(members, ["预算对比分析.md", "budget-q3.txt"]);
    }
}
