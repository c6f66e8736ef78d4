//! Per-status message counts.

use serde::Serialize;

use super::model::{
    TranslationStatus,
    TranslationTable,
};

/// Number of messages in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub missing: usize,
    pub unfinished: usize,
    pub blank: usize,
    pub translated: usize,
    pub obsolete: usize,
    pub vanished: usize,
}

impl StatusCounts {
    pub const fn add(&mut self, status: TranslationStatus) {
        match status {
            TranslationStatus::Missing => self.missing += 1,
            TranslationStatus::Unfinished => self.unfinished += 1,
            TranslationStatus::Blank => self.blank += 1,
            TranslationStatus::Translated => self.translated += 1,
            TranslationStatus::Obsolete => self.obsolete += 1,
            TranslationStatus::Vanished => self.vanished += 1,
        }
    }

    pub const fn merge(&mut self, other: &Self) {
        self.missing += other.missing;
        self.unfinished += other.unfinished;
        self.blank += other.blank;
        self.translated += other.translated;
        self.obsolete += other.obsolete;
        self.vanished += other.vanished;
    }

    #[must_use]
    pub const fn get(&self, status: TranslationStatus) -> usize {
        match status {
            TranslationStatus::Missing => self.missing,
            TranslationStatus::Unfinished => self.unfinished,
            TranslationStatus::Blank => self.blank,
            TranslationStatus::Translated => self.translated,
            TranslationStatus::Obsolete => self.obsolete,
            TranslationStatus::Vanished => self.vanished,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.active() + self.obsolete + self.vanished
    }

    /// Messages still used by the UI.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.missing + self.unfinished + self.blank + self.translated
    }

    /// Active messages needing no more work (blank counts as done).
    #[must_use]
    pub const fn done(&self) -> usize {
        self.blank + self.translated
    }

    /// Whole percent of active messages done, rounded down; 100 when there are none.
    #[must_use]
    pub const fn percent_done(&self) -> usize {
        match self.active() {
            0 => 100,
            active => self.done() * 100 / active,
        }
    }
}

/// Counts for one context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextStats {
    pub name: String,
    pub counts: StatusCounts,
}

/// Counts for a whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub contexts: Vec<ContextStats>,
    pub total: StatusCounts,
}

impl TranslationTable {
    /// Counts messages by status, per context and overall.
    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats::default();
        for context in self.contexts() {
            let mut counts = StatusCounts::default();
            for message in context.messages() {
                counts.add(message.status());
            }
            stats.total.merge(&counts);
            stats.contexts.push(ContextStats { name: context.name().to_string(), counts });
        }
        stats
    }
}
