//! Master-document selection within a theme group.

use tracing::debug;

use docmerge_shared::LoadedDocument;

use crate::importance::{ImportanceScore, ImportanceScorer};

/// A group member with its importance, in ranking order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedDocument {
    /// Position of the document in the group's member list.
    pub index: usize,
    pub score: ImportanceScore,
    pub content_len: usize,
}

/// The chosen master of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterChoice {
    pub index: usize,
    pub score: u32,
    pub content_len: usize,
}

/// Rank members by importance, then content length, both descending.
///
/// The sort is stable, so fully tied documents keep their group order.
pub fn rank(scorer: &ImportanceScorer, members: &[LoadedDocument]) -> Vec<RankedDocument> {
    let mut ranked: Vec<RankedDocument> = members
        .iter()
        .enumerate()
        .map(|(index, loaded)| RankedDocument {
            index,
            score: scorer.score(&loaded.document, &loaded.content),
            content_len: loaded.content_len(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total()
            .cmp(&a.score.total())
            .then_with(|| b.content_len.cmp(&a.content_len))
    });
    ranked
}

/// Pick the master of a group; `None` only for an empty group.
pub fn select_master(scorer: &ImportanceScorer, members: &[LoadedDocument]) -> Option<MasterChoice> {
    let ranked = rank(scorer, members);
    let top = ranked.first()?;

    debug!(
        master = %members[top.index].document.relative_path,
        score = top.score.total(),
        candidates = ranked.len(),
        "selected master document"
    );

    Some(MasterChoice {
        index: top.index,
        score: top.score.total(),
        content_len: top.content_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmerge_shared::Document;

    fn loaded(path: &str, content: &str) -> LoadedDocument {
        LoadedDocument::new(Document::from_relative(path).unwrap(), content)
    }

    #[test]
    fn empty_group_has_no_master() {
        assert!(select_master(&ImportanceScorer::default(), &[]).is_none());
    }

    #[test]
    fn singleton_is_its_own_master() {
        let group = [loaded("only.md", "x")];
        let choice = select_master(&ImportanceScorer::default(), &group).unwrap();
        assert_eq!(choice.index, 0);
        assert_eq!(choice.content_len, 1);
    }

    #[test]
    fn summary_beats_notes() {
        let body = format!("## 概述\n\n```\ncode\n```\n\n{}", "文".repeat(5980));
        let group = [
            loaded("B_记录.md", &"文".repeat(300)),
            loaded("A_总结.md", &body),
        ];
        let scorer = ImportanceScorer::default();
        let choice = select_master(&scorer, &group).unwrap();
        assert_eq!(choice.index, 1);
        assert_eq!(choice.score, 18);

        let ranked = rank(&scorer, &group);
        let order: Vec<_> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, [1, 0]);
    }

    #[test]
    fn longer_content_breaks_score_ties() {
        let group = [
            loaded("one.md", &"a".repeat(100)),
            loaded("two.md", &"a".repeat(300)),
        ];
        let choice = select_master(&ImportanceScorer::default(), &group).unwrap();
        assert_eq!(choice.index, 1);
    }

    #[test]
    fn full_ties_keep_first_seen() {
        let forward = [loaded("x.md", "same"), loaded("y.md", "same")];
        let choice = select_master(&ImportanceScorer::default(), &forward).unwrap();
        assert_eq!(forward[choice.index].document.name, "x");

        let backward = [loaded("y.md", "same"), loaded("x.md", "same")];
        let choice = select_master(&ImportanceScorer::default(), &backward).unwrap();
        assert_eq!(backward[choice.index].document.name, "y");
    }
}
