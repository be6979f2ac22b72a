//! Shared target → controller assignments.
//!
//! The registry is the one structure other systems read while abilities run
//! ("is this entity currently bloodbent?"), so it is shared as
//! `Arc<TargetRegistry>` and guards its map with a single `RwLock`. Each
//! mutation takes the write lock exactly once, which makes acquire and release
//! atomic with respect to each other. Bulk operations never iterate and
//! remove through two separate lock acquisitions.
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::ability::AbilityKind;
use crate::state::{EntityId, Millis};

/// One `(target, controller)` assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetEntry {
    pub target: EntityId,
    pub controller: EntityId,
    pub kind: AbilityKind,
    pub acquired_at: Millis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AcquireOutcome {
    Acquired,
    AlreadyOwnedBySelf,
    /// Another actor controls the target. Ownership is never transferred implicitly.
    RejectedForeignOwnership { owner: EntityId },
}

impl AcquireOutcome {
    /// True when the caller controls the target after the call.
    pub const fn is_owned(&self) -> bool {
        matches!(self, Self::Acquired | Self::AlreadyOwnedBySelf)
    }
}

type Key = (AbilityKind, EntityId);

#[derive(Debug, Default)]
pub struct TargetRegistry {
    entries: RwLock<HashMap<Key, TargetEntry>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are `Copy` data; a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Key, TargetEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Key, TargetEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Grants `actor` control of `target` if nobody else holds it.
    pub fn acquire(
        &self,
        kind: AbilityKind,
        target: EntityId,
        actor: EntityId,
        now: Millis,
    ) -> AcquireOutcome {
        let mut entries = self.write();
        let owner = entries.get(&(kind, target)).map(|entry| entry.controller);
        match owner {
            Some(owner) if owner == actor => AcquireOutcome::AlreadyOwnedBySelf,
            Some(owner) => AcquireOutcome::RejectedForeignOwnership { owner },
            None => {
                entries.insert(
                    (kind, target),
                    TargetEntry {
                        target,
                        controller: actor,
                        kind,
                        acquired_at: now,
                    },
                );
                AcquireOutcome::Acquired
            }
        }
    }

    /// Removes the entry only when `actor` is its current controller.
    ///
    /// A release by anyone else is a no-op and returns `false`.
    pub fn release(&self, kind: AbilityKind, target: EntityId, actor: EntityId) -> bool {
        let mut entries = self.write();
        let owner = entries.get(&(kind, target)).map(|entry| entry.controller);
        match owner {
            Some(owner) if owner == actor => {
                entries.remove(&(kind, target));
                true
            }
            Some(owner) => {
                debug!(
                    target: "ability::registry",
                    entity = %target,
                    requester = %actor,
                    %owner,
                    "ignoring release by non-owner"
                );
                false
            }
            None => false,
        }
    }

    /// Removes every entry `actor` controls for `kind`, returning them in acquisition order.
    pub fn release_all_owned_by(&self, kind: AbilityKind, actor: EntityId) -> Vec<TargetEntry> {
        let mut removed = Vec::new();
        self.write().retain(|_, entry| {
            let owned = entry.kind == kind && entry.controller == actor;
            if owned {
                removed.push(*entry);
            }
            !owned
        });
        sort_entries(&mut removed);
        removed
    }

    pub fn owner_of(&self, kind: AbilityKind, target: EntityId) -> Option<EntityId> {
        self.read().get(&(kind, target)).map(|entry| entry.controller)
    }

    pub fn entry(&self, kind: AbilityKind, target: EntityId) -> Option<TargetEntry> {
        self.read().get(&(kind, target)).copied()
    }

    /// True if any ability currently controls `target`.
    pub fn is_targeted(&self, target: EntityId) -> bool {
        self.read().keys().any(|(_, entity)| *entity == target)
    }

    /// Targets held by `actor`, oldest first.
    pub fn targets_of(&self, kind: AbilityKind, actor: EntityId) -> Vec<EntityId> {
        let mut owned: Vec<TargetEntry> = self
            .read()
            .values()
            .filter(|entry| entry.kind == kind && entry.controller == actor)
            .copied()
            .collect();
        sort_entries(&mut owned);
        owned.into_iter().map(|entry| entry.target).collect()
    }

    /// Copy of every entry, oldest first. Callers mutate from the copy.
    pub fn snapshot(&self) -> Vec<TargetEntry> {
        let mut entries: Vec<TargetEntry> = self.read().values().copied().collect();
        sort_entries(&mut entries);
        entries
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn sort_entries(entries: &mut [TargetEntry]) {
    entries.sort_by_key(|entry| (entry.acquired_at, entry.target));
}
