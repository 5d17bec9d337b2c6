//! Importance scoring for master-document selection.
//!
//! A document's importance is the sum of four non-negative parts:
//! name keywords, a content-size tier, one-time structural bonuses, and a
//! bonus for living under a trusted directory.

use serde::Serialize;

use docmerge_shared::{Document, ImportanceConfig, SizeTier, StructureWeights};

/// Breakdown of an importance score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportanceScore {
    pub keyword: u32,
    pub size: u32,
    pub structure: u32,
    pub location: u32,
}

impl ImportanceScore {
    pub fn total(&self) -> u32 {
        self.keyword + self.size + self.structure + self.location
    }
}

/// Pure scorer built from injected weight tables.
#[derive(Debug, Clone)]
pub struct ImportanceScorer {
    /// Lowercased keywords with their weights.
    keywords: Vec<(String, u32)>,
    /// Sorted by threshold, highest first.
    tiers: Vec<SizeTier>,
    structure: StructureWeights,
    trusted_dirs: Vec<String>,
    trusted_bonus: u32,
}

impl Default for ImportanceScorer {
    fn default() -> Self {
        Self::new(&ImportanceConfig::default())
    }
}

impl ImportanceScorer {
    pub fn new(config: &ImportanceConfig) -> Self {
        let mut tiers = config.size_tiers.clone();
        tiers.sort_by(|a, b| b.above.cmp(&a.above));

        Self {
            keywords: config
                .keywords
                .iter()
                .map(|kw| (kw.keyword.to_lowercase(), kw.weight))
                .collect(),
            tiers,
            structure: config.structure,
            trusted_dirs: config.trusted_dirs.clone(),
            trusted_bonus: config.trusted_bonus,
        }
    }

    pub fn score(&self, document: &Document, content: &str) -> ImportanceScore {
        ImportanceScore {
            keyword: self.keyword_points(&document.name),
            size: self.size_points(content.chars().count()),
            structure: self.structure_points(content),
            location: self.location_points(document),
        }
    }

    fn keyword_points(&self, name: &str) -> u32 {
        let name = name.to_lowercase();
        self.keywords
            .iter()
            .filter(|(kw, _)| name.contains(kw.as_str()))
            .map(|(_, weight)| weight)
            .sum()
    }

    fn size_points(&self, len: usize) -> u32 {
        self.tiers
            .iter()
            .find(|tier| len > tier.above)
            .map_or(0, |tier| tier.points)
    }

    fn structure_points(&self, content: &str) -> u32 {
        let markers = StructureMarkers::detect(content);
        let w = &self.structure;
        [
            (markers.top_heading, w.top_heading),
            (markers.sub_heading, w.sub_heading),
            (markers.code_fence, w.code_fence),
            (markers.rule, w.rule),
        ]
        .into_iter()
        .filter(|(present, _)| *present)
        .map(|(_, points)| points)
        .sum()
    }

    fn location_points(&self, document: &Document) -> u32 {
        let parent = document.parent_dir();
        let trusted = !parent.is_empty()
            && parent
                .split('/')
                .any(|dir| self.trusted_dirs.iter().any(|t| t == dir));
        if trusted { self.trusted_bonus } else { 0 }
    }
}

/// Which structural markers occur at least once, by line.
#[derive(Debug, Default, PartialEq, Eq)]
struct StructureMarkers {
    top_heading: bool,
    sub_heading: bool,
    code_fence: bool,
    rule: bool,
}

impl StructureMarkers {
    fn detect(content: &str) -> Self {
        let mut markers = Self::default();
        for line in content.lines() {
            let t = line.trim();
            if t.starts_with("# ") {
                markers.top_heading = true;
            } else if t.starts_with("## ") {
                markers.sub_heading = true;
            } else if t.starts_with("```") {
                markers.code_fence = true;
            } else if t.len() >= 3 && t.chars().all(|c| c == '-') {
                markers.rule = true;
            }
        }
        markers
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

    /// `## ` headings plus one fenced block, padded to exactly `len` chars.
    fn structured_content(len: usize) -> String {
        let head = "## 概述\n\n```rust\nfn main() {}\n```\n\n## 细节\n\n";
        let pad = len - head.chars().count();
        format!("{head}{}", "文".repeat(pad))
    }

    #[test]
    fn summary_document_outscores_notes() {
        let scorer = ImportanceScorer::default();

        let a = scorer.score(&doc("A_总结.md"), &structured_content(6000));
        assert_eq!(a.keyword, 10);
        assert_eq!(a.size, 5);
        assert_eq!(a.structure, 3);
        assert_eq!(a.total(), 18);

        let b = scorer.score(&doc("B_记录.md"), &"文".repeat(300));
        assert_eq!(b.keyword, 5);
        assert_eq!(b.size, 0);
        assert_eq!(b.total(), 5);
    }

    #[test]
    fn multiple_name_keywords_all_count() {
        let scorer = ImportanceScorer::default();
        let score = scorer.score(&doc("最终方案总结.md"), "");
        assert_eq!(score.keyword, 8 + 7 + 10);
    }

    #[test]
    fn size_tiers_are_monotonic() {
        let scorer = ImportanceScorer::default();
        let points: Vec<u32> = [0, 500, 501, 2001, 5001, 10_001, 50_000]
            .into_iter()
            .map(|n| scorer.size_points(n))
            .collect();
        assert_eq!(points, [0, 0, 1, 3, 5, 8, 8]);
    }

    #[test]
    fn size_tiers_order_does_not_matter() {
        let mut config = ImportanceConfig::default();
        config.size_tiers.reverse();
        let scorer = ImportanceScorer::new(&config);
        assert_eq!(scorer.size_points(6000), 5);
    }

    #[test]
    fn structure_bonuses_count_once() {
        let scorer = ImportanceScorer::default();
        let content = "# One\n# Two\n## A\n## B\n```\nx\n```\n---\n-----\n";
        assert_eq!(scorer.structure_points(content), 3 + 2 + 1 + 1);

        let prose = "A sentence with # inside and a - dash -- here.";
        assert_eq!(scorer.structure_points(prose), 0);
    }

    #[test]
    fn trusted_directory_bonus() {
        let scorer = ImportanceScorer::default();
        assert_eq!(scorer.score(&doc("analysis-reports/x.md"), "").location, 2);
        assert_eq!(scorer.score(&doc("a/analysis-reports/b/x.md"), "").location, 2);
        assert_eq!(scorer.score(&doc("analysis-reports.md"), "").location, 0);
        assert_eq!(scorer.score(&doc("other/x.md"), "").location, 0);
    }

    #[test]
    fn scoring_is_pure() {
        let scorer = ImportanceScorer::default();
        let d = doc("analysis-reports/报告.md");
        let content = structured_content(2500);
        assert_eq!(scorer.score(&d, &content), scorer.score(&d, &content));
    }
}
