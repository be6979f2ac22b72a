use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Logical wall-clock milliseconds as seen by the simulation.
pub type Millis = u64;

/// Monotonic tick counter driven by the scheduler.
pub type Tick = u64;

/// Stable handle for any entity the world reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a world (dimension). Entities in different worlds never interact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldId(pub u32);

impl WorldId {
    pub const OVERWORLD: Self = Self(0);
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world-{}", self.0)
    }
}

/// Three-component vector used for positions, directions and velocities.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector in the same direction.
    ///
    /// A zero or non-finite vector normalizes to [`Vec3::ZERO`] rather than NaN.
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            return Self::ZERO;
        }
        self * (1.0 / length)
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// A point inside a specific world.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub world: WorldId,
    pub position: Vec3,
}

impl Location {
    pub const fn new(world: WorldId, position: Vec3) -> Self {
        Self { world, position }
    }

    pub fn same_world(&self, other: &Self) -> bool {
        self.world == other.world
    }

    /// Euclidean distance, or `None` when the locations are in different worlds.
    pub fn distance(&self, other: &Self) -> Option<f64> {
        self.same_world(other)
            .then(|| self.position.distance(other.position))
    }

    pub fn offset(&self, delta: Vec3) -> Self {
        Self::new(self.world, self.position + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_zero_vector_stays_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn normalize_produces_unit_length() {
        let v = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
        assert!((v.z - 0.8).abs() < 1e-12);
    }

    #[test]
    fn distance_across_worlds_is_none() {
        let a = Location::new(WorldId(0), Vec3::ZERO);
        let b = Location::new(WorldId(1), Vec3::ZERO);
        assert_eq!(a.distance(&b), None);
        assert_eq!(a.distance(&a.offset(Vec3::new(0.0, 2.0, 0.0))), Some(2.0));
    }
}
