//! Per-actor "usable again at" timestamps.
use std::collections::HashMap;

use crate::ability::AbilityKind;
use crate::state::{EntityId, Millis};

/// Maps `(actor, ability)` to the logical time the ability becomes usable again.
///
/// Owned by the engine and only touched from the simulation thread.
#[derive(Clone, Debug, Default)]
pub struct CooldownLedger {
    ready_at: HashMap<(EntityId, AbilityKind), Millis>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, actor: EntityId, ability: AbilityKind) -> Option<Millis> {
        self.ready_at.get(&(actor, ability)).copied()
    }

    /// Creates or overwrites the entry.
    pub fn insert(&mut self, actor: EntityId, ability: AbilityKind, ready_at: Millis) {
        self.ready_at.insert((actor, ability), ready_at);
    }

    pub fn is_cooling_down(&self, actor: EntityId, ability: AbilityKind, now: Millis) -> bool {
        self.get(actor, ability).is_some_and(|ready_at| now < ready_at)
    }

    /// Milliseconds left before the ability is usable again; zero when ready.
    pub fn remaining(&self, actor: EntityId, ability: AbilityKind, now: Millis) -> Millis {
        self.get(actor, ability)
            .map_or(0, |ready_at| ready_at.saturating_sub(now))
    }

    /// Drops entries that have already elapsed. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Millis) -> usize {
        let before = self.ready_at.len();
        self.ready_at.retain(|_, ready_at| *ready_at > now);
        before - self.ready_at.len()
    }

    pub fn len(&self) -> usize {
        self.ready_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready_at.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIND: AbilityKind = AbilityKind::Bloodbending;

    #[test]
    fn cooling_down_until_ready_time() {
        let mut ledger = CooldownLedger::new();
        ledger.insert(EntityId(1), KIND, 5000);

        assert!(ledger.is_cooling_down(EntityId(1), KIND, 4999));
        assert!(!ledger.is_cooling_down(EntityId(1), KIND, 5000));
        assert_eq!(ledger.remaining(EntityId(1), KIND, 1000), 4000);
        assert_eq!(ledger.remaining(EntityId(1), KIND, 9000), 0);
        assert!(!ledger.is_cooling_down(EntityId(2), KIND, 0));
    }

    #[test]
    fn insert_overwrites() {
        let mut ledger = CooldownLedger::new();
        ledger.insert(EntityId(1), KIND, 5000);
        ledger.insert(EntityId(1), KIND, 100);
        assert_eq!(ledger.get(EntityId(1), KIND), Some(100));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn purge_drops_elapsed_entries() {
        let mut ledger = CooldownLedger::new();
        ledger.insert(EntityId(1), KIND, 100);
        ledger.insert(EntityId(2), KIND, 900);

        assert_eq!(ledger.purge_expired(500), 1);
        assert_eq!(ledger.get(EntityId(1), KIND), None);
        assert_eq!(ledger.get(EntityId(2), KIND), Some(900));
        assert_eq!(ledger.purge_expired(900), 1);
        assert!(ledger.is_empty());
    }
}
