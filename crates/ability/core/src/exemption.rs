//! Entity types that cannot be bloodbent.
//!
//! The set is replaced wholesale on reload. Readers clone the current `Arc`
//! and keep using it for the rest of their check, so a swap never exposes a
//! half-built set.
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::config::ConfigWarning;
use crate::state::EntityKind;

/// Result of parsing an exemption list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExemptionReport {
    pub accepted: usize,
    pub skipped: Vec<ConfigWarning>,
}

#[derive(Debug, Default)]
pub struct ExemptionSet {
    kinds: RwLock<Arc<HashSet<EntityKind>>>,
}

impl ExemptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from config entries, skipping unknown names.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> (Self, ExemptionReport) {
        let (kinds, report) = Self::parse(entries);
        let set = Self {
            kinds: RwLock::new(Arc::new(kinds)),
        };
        (set, report)
    }

    /// Parses each entry independently. Malformed entries are reported and skipped.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> (HashSet<EntityKind>, ExemptionReport) {
        let mut kinds = HashSet::new();
        let mut report = ExemptionReport::default();

        for entry in entries {
            let raw = entry.as_ref().trim();
            match EntityKind::from_str(raw) {
                Ok(kind) => {
                    kinds.insert(kind);
                    report.accepted += 1;
                }
                Err(_) => {
                    let warning = ConfigWarning::UnknownEntityKind {
                        path: crate::config::BloodbendingConfig::BLOODLESS.to_owned(),
                        value: raw.to_owned(),
                    };
                    warn!(target: "ability::exemption", %warning, "skipping exemption entry");
                    report.skipped.push(warning);
                }
            }
        }

        (kinds, report)
    }

    /// Parses `entries` completely, then swaps the new set in.
    pub fn reload<S: AsRef<str>>(&self, entries: &[S]) -> ExemptionReport {
        let (kinds, report) = Self::parse(entries);
        self.replace(kinds);
        info!(
            target: "ability::exemption",
            accepted = report.accepted,
            skipped = report.skipped.len(),
            "exemption set reloaded"
        );
        report
    }

    pub fn replace(&self, kinds: HashSet<EntityKind>) {
        let mut current = self.kinds.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(kinds);
    }

    /// The set as of this call. Later reloads do not affect the returned value.
    pub fn snapshot(&self) -> Arc<HashSet<EntityKind>> {
        let current = self.kinds.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.snapshot().contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_entries_are_skipped_individually() {
        let (set, report) = ExemptionSet::from_entries(&["SKELETON", "not a mob", " blaze "]);

        assert_eq!(report.accepted, 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            &report.skipped[0],
            ConfigWarning::UnknownEntityKind { value, .. } if value == "not a mob"
        ));
        assert!(set.contains(EntityKind::Skeleton));
        assert!(set.contains(EntityKind::Blaze));
    }

    #[test]
    fn reload_swaps_whole_set_and_leaves_old_snapshots_intact() {
        let (set, _) = ExemptionSet::from_entries(&["SKELETON"]);
        let before = set.snapshot();

        let report = set.reload(&["WITHER", "???"]);

        assert_eq!(report.accepted, 1);
        assert!(before.contains(&EntityKind::Skeleton));
        assert!(!set.contains(EntityKind::Skeleton));
        assert!(set.contains(EntityKind::Wither));
    }
}
