//! One live instance per `(actor, ability)`.
use std::collections::BTreeMap;

use crate::ability::{AbilityInstance, AbilityKind};
use crate::state::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceKey {
    pub actor: EntityId,
    pub kind: AbilityKind,
}

impl InstanceKey {
    pub const fn new(actor: EntityId, kind: AbilityKind) -> Self {
        Self { actor, kind }
    }
}

/// Returned by [`InstanceDirectory::try_activate`] when an instance already
/// existed. It has been removed from the directory and is handed back so the
/// caller can terminate it.
#[derive(Debug)]
pub struct AlreadyActive(pub Box<AbilityInstance>);

/// Live instances keyed by actor and ability.
///
/// Ordered by key so the tick pass visits instances deterministically.
#[derive(Debug, Default)]
pub struct InstanceDirectory {
    instances: BTreeMap<InstanceKey, AbilityInstance>,
}

impl InstanceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle check for a new activation.
    ///
    /// `Ok(key)` means the slot is free. An existing instance is evicted and
    /// returned inside `Err`.
    pub fn try_activate(&mut self, key: InstanceKey) -> Result<InstanceKey, AlreadyActive> {
        match self.instances.remove(&key) {
            Some(existing) => Err(AlreadyActive(Box::new(existing))),
            None => Ok(key),
        }
    }

    /// Registers a live instance, returning whatever it displaced.
    pub fn insert(&mut self, instance: AbilityInstance) -> Option<AbilityInstance> {
        let key = InstanceKey::new(instance.actor(), instance.kind());
        self.instances.insert(key, instance)
    }

    pub fn lookup(&self, key: &InstanceKey) -> Option<&AbilityInstance> {
        self.instances.get(key)
    }

    pub fn remove(&mut self, key: &InstanceKey) -> Option<AbilityInstance> {
        self.instances.remove(key)
    }

    /// Snapshot of the current keys; safe to mutate the directory while walking it.
    pub fn keys(&self) -> Vec<InstanceKey> {
        self.instances.keys().copied().collect()
    }

    pub fn of_actor(&self, actor: EntityId) -> Vec<InstanceKey> {
        self.instances
            .keys()
            .filter(|key| key.actor == actor)
            .copied()
            .collect()
    }

    /// Drops every instance without running any per-instance cleanup.
    pub fn reload_all(&mut self) -> Vec<AbilityInstance> {
        std::mem::take(&mut self.instances).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{Ability, AcquisitionMode, Bloodbending, InstanceId};
    use crate::config::BloodbendingConfig;

    fn instance(actor: u32) -> AbilityInstance {
        AbilityInstance::new(
            InstanceId(u64::from(actor)),
            EntityId(actor),
            0,
            Ability::Bloodbending(Bloodbending::new(
                BloodbendingConfig::default(),
                AcquisitionMode::Line,
            )),
        )
    }

    #[test]
    fn second_activation_evicts_first() {
        let mut directory = InstanceDirectory::new();
        let key = InstanceKey::new(EntityId(1), AbilityKind::Bloodbending);

        assert_eq!(directory.try_activate(key).ok(), Some(key));
        directory.insert(instance(1));

        let AlreadyActive(existing) = directory.try_activate(key).unwrap_err();
        assert_eq!(existing.actor(), EntityId(1));
        assert!(directory.lookup(&key).is_none());
    }

    #[test]
    fn reload_all_drains_everything() {
        let mut directory = InstanceDirectory::new();
        directory.insert(instance(2));
        directory.insert(instance(1));

        assert_eq!(
            directory.keys(),
            vec![
                InstanceKey::new(EntityId(1), AbilityKind::Bloodbending),
                InstanceKey::new(EntityId(2), AbilityKind::Bloodbending),
            ]
        );
        assert_eq!(directory.reload_all().len(), 2);
        assert!(directory.is_empty());
    }
}
