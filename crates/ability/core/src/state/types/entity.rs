/// Entity type tags known to the ability core.
///
/// Names parse from the SCREAMING_SNAKE_CASE form used in configuration files
/// (`"ZOMBIE"`, `"IRON_GOLEM"`, ...), ignoring ASCII case.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::EnumString,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    // ========================================================================
    // Players and passive mobs
    // ========================================================================
    Player,
    Villager,
    Cow,
    Pig,
    Sheep,
    Chicken,
    Wolf,
    IronGolem,
    SnowGolem,

    // ========================================================================
    // Hostile mobs
    // ========================================================================
    Creeper,
    Spider,
    Enderman,
    Blaze,
    Slime,
    MagmaCube,

    // ========================================================================
    // Undead
    // ========================================================================
    Zombie,
    ZombieVillager,
    Husk,
    Drowned,
    Skeleton,
    Stray,
    WitherSkeleton,
    Wither,
    Phantom,
    ZombifiedPiglin,

    // ========================================================================
    // Non-living / decorative
    // ========================================================================
    ArmorStand,
    ItemFrame,
    DroppedItem,
    Arrow,
    Minecart,
}

impl EntityKind {
    /// Living entities have health and can be held. Armor stands count as
    /// living but are excluded separately as decorative.
    pub const fn is_living(self) -> bool {
        !matches!(
            self,
            Self::ItemFrame | Self::DroppedItem | Self::Arrow | Self::Minecart
        )
    }

    pub const fn is_decorative(self) -> bool {
        matches!(self, Self::ArmorStand)
    }

    pub const fn is_undead(self) -> bool {
        matches!(
            self,
            Self::Zombie
                | Self::ZombieVillager
                | Self::Husk
                | Self::Drowned
                | Self::Skeleton
                | Self::Stray
                | Self::WitherSkeleton
                | Self::Wither
                | Self::Phantom
                | Self::ZombifiedPiglin
        )
    }

    /// Mobs with a pathfinding attack target that a hold should clear.
    pub const fn is_creature(self) -> bool {
        self.is_living()
            && !matches!(
                self,
                Self::Player | Self::ArmorStand | Self::Slime | Self::MagmaCube
            )
    }

    pub const fn is_player(self) -> bool {
        matches!(self, Self::Player)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_config_spelling() {
        assert_eq!(EntityKind::from_str("ZOMBIE"), Ok(EntityKind::Zombie));
        assert_eq!(EntityKind::from_str("iron_golem"), Ok(EntityKind::IronGolem));
        assert_eq!(
            EntityKind::from_str("WITHER_SKELETON"),
            Ok(EntityKind::WitherSkeleton)
        );
        assert!(EntityKind::from_str("NOT_A_MOB").is_err());
    }

    #[test]
    fn displays_config_spelling() {
        assert_eq!(EntityKind::ArmorStand.to_string(), "ARMOR_STAND");
    }

    #[test]
    fn classification() {
        assert!(EntityKind::ArmorStand.is_living());
        assert!(EntityKind::ArmorStand.is_decorative());
        assert!(!EntityKind::DroppedItem.is_living());
        assert!(EntityKind::Husk.is_undead());
        assert!(!EntityKind::Player.is_creature());
        assert!(EntityKind::Cow.is_creature());
    }
}
