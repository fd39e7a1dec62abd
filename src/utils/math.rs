use glam::Vec3;
use std::hash::{Hash, Hasher};

/// Tolerance below which the seed tangent is considered parallel to the
/// normal and the fallback seed is used instead.
const BASIS_DEGENERACY_TOLERANCE: f32 = 1e-10;

/// Builds an orthonormal basis whose first vector is aligned with `v`.
///
/// Gram-Schmidt seeded on world +x; if `v` is (nearly) parallel to +x the
/// seed switches to +z, so the basis is well defined for any input direction.
pub fn tangent_basis(v: Vec3) -> (Vec3, Vec3, Vec3) {
    let t1 = v.normalize();

    let mut t2 = Vec3::X;
    t2 -= t1 * t1.dot(t2);
    if t2.length() < BASIS_DEGENERACY_TOLERANCE {
        t2 = Vec3::Z;
        t2 -= t1 * t1.dot(t2);
    }
    let t2 = t2.normalize();

    let t3 = t1.cross(t2).normalize();
    (t1, t2, t3)
}

/// Unordered pair key. Equality and hashing ignore the order of the two
/// elements, while `first`/`second` keep whatever order the pair was built
/// with, which callers use to carry an orientation.
#[derive(Debug, Clone, Copy)]
pub struct Pair<T> {
    pub first: T,
    pub second: T,
}

impl<T: Copy + Ord> Pair<T> {
    pub fn new(first: T, second: T) -> Self {
        Self { first, second }
    }

    pub fn swapped(&self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }

    pub fn contains(&self, element: T) -> bool {
        self.first == element || self.second == element
    }

    /// The element that is not `element`. Meaningless if `element` is not a
    /// member of the pair.
    pub fn other(&self, element: T) -> T {
        if self.first == element {
            self.second
        } else {
            self.first
        }
    }

    fn ordered(&self) -> (T, T) {
        if self.first <= self.second {
            (self.first, self.second)
        } else {
            (self.second, self.first)
        }
    }
}

impl<T: Copy + Ord> PartialEq for Pair<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ordered() == other.ordered()
    }
}

impl<T: Copy + Ord> Eq for Pair<T> {}

impl<T: Copy + Ord + Hash> Hash for Pair<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (low, high) = self.ordered();
        low.hash(state);
        high.hash(state);
    }
}
