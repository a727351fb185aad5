//! Octant indexing for region subdivision
//!
//! Octants are numbered 1 through 8 relative to a region's center:
//!
//! ```text
//! index = (1 if x >  cx else 2)
//!       + (4 if y <= cy else 0)
//!       + (2 if z >= cz else 0)
//!
//! 1: +X, +Y, -Z      5: +X, -Y, -Z
//! 2: -X, +Y, -Z      6: -X, -Y, -Z
//! 3: +X, +Y, +Z      7: +X, -Y, +Z
//! 4: -X, +Y, +Z      8: -X, -Y, +Z
//! ```
//!
//! Ties on the X axis go to the negative half, ties on Y go to the lower
//! half, and ties on Z go to the positive half. Every boundary point
//! therefore has exactly one owning octant.

use std::fmt;

use crate::foundation::math::Vec3;

/// One of the eight subregions of a region, numbered 1-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Octant(u8);

/// Unit center offsets of each octant, indexed by `octant - 1`
const OFFSETS: [[f64; 3]; 8] = [
    [0.25, 0.25, -0.25],
    [-0.25, 0.25, -0.25],
    [0.25, 0.25, 0.25],
    [-0.25, 0.25, 0.25],
    [0.25, -0.25, -0.25],
    [-0.25, -0.25, -0.25],
    [0.25, -0.25, 0.25],
    [-0.25, -0.25, 0.25],
];

impl Octant {
    /// All octants in index order
    pub const ALL: [Self; 8] = [
        Self(1),
        Self(2),
        Self(3),
        Self(4),
        Self(5),
        Self(6),
        Self(7),
        Self(8),
    ];

    /// Create an octant from its 1-based index
    pub const fn new(index: u8) -> Option<Self> {
        if index >= 1 && index <= 8 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Classify `point` into an octant of a region centered at `center`
    pub fn classify(center: &Vec3, point: &Vec3) -> Self {
        let mut index = if point.x > center.x { 1 } else { 2 };
        if point.y <= center.y {
            index += 4;
        }
        if point.z >= center.z {
            index += 2;
        }
        Self(index)
    }

    /// The 1-based index
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Position of this octant in a dense `[_; 8]` table
    pub const fn slot(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Unit offset of this octant's center, to be scaled by the parent's size
    pub fn offset(self) -> Vec3 {
        let [x, y, z] = OFFSETS[self.slot()];
        Vec3::new(x, y, z)
    }
}

impl fmt::Display for Octant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Octant::new(0).is_none());
        assert!(Octant::new(9).is_none());
        for index in 1..=8 {
            assert_eq!(Octant::new(index).map(Octant::index), Some(index));
        }
    }

    #[test]
    fn test_center_point_goes_to_eight() {
        let center = Vec3::zeros();
        assert_eq!(Octant::classify(&center, &center).index(), 8);
    }

    #[test]
    fn test_axis_ties() {
        let center = Vec3::new(1.0, 2.0, 3.0);

        // X ties fall to the negative half
        assert_eq!(Octant::classify(&center, &Vec3::new(1.0, 5.0, 0.0)).index(), 2);
        // Y ties fall to the lower half
        assert_eq!(Octant::classify(&center, &Vec3::new(5.0, 2.0, 0.0)).index(), 5);
        // Z ties fall to the positive half
        assert_eq!(Octant::classify(&center, &Vec3::new(5.0, 5.0, 3.0)).index(), 3);
    }

    #[test]
    fn test_offsets_match_classification() {
        // A point at each octant's offset must classify back into that octant
        let center = Vec3::zeros();
        for octant in Octant::ALL {
            assert_eq!(Octant::classify(&center, &octant.offset()), octant);
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        let center = Vec3::new(0.5, -0.5, 0.25);
        let point = Vec3::new(0.5, -0.5, 0.25);
        let first = Octant::classify(&center, &point);
        for _ in 0..10 {
            assert_eq!(Octant::classify(&center, &point), first);
        }
    }
}
