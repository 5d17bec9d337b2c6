//! Theme classification and master-document selection.
//!
//! - [`ThemeClassifier`] scores documents against an ordered theme table.
//! - [`ImportanceScorer`] rates how suitable a document is as a merge master.
//! - [`select_master`] picks the master of a theme group with a stable ranking.
//!
//! All tables are injected at construction; nothing here touches storage.

pub mod importance;
pub mod select;
pub mod theme;

pub use importance::{ImportanceScore, ImportanceScorer};
pub use select::{MasterChoice, RankedDocument, rank, select_master};
pub use theme::{MatchWeights, ThemeClassifier, ThemeMatch};
