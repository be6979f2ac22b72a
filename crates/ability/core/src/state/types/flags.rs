bitflags::bitflags! {
    /// Status bits the host reports for entities that carry a bending profile.
    ///
    /// Mobs have no profile at all; the actor oracle returns `None` for them.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ActorFlags: u8 {
        /// Holding the maintain gesture (sneak).
        const SNEAKING = 1 << 0;
        /// Elevated state that bypasses time and target restrictions.
        const OVERRIDE = 1 << 1;
        /// May bloodbend; other bloodbenders are protected unless cross-bending is on.
        const BLOODBENDER = 1 << 2;
        /// Ignores the night and full-moon restrictions.
        const BLOODBEND_ANYTIME = 1 << 3;
        /// Can never be held.
        const UNBENDABLE = 1 << 4;
    }
}

impl ActorFlags {
    pub const fn is_sneaking(self) -> bool {
        self.contains(Self::SNEAKING)
    }

    pub const fn is_overridden(self) -> bool {
        self.contains(Self::OVERRIDE)
    }

    /// True when time-of-day and moon restrictions do not apply.
    pub const fn ignores_time(self) -> bool {
        self.intersects(Self::OVERRIDE.union(Self::BLOODBEND_ANYTIME))
    }

    pub const fn is_bloodbender(self) -> bool {
        self.intersects(Self::BLOODBENDER.union(Self::BLOODBEND_ANYTIME))
    }
}
