use crate::engine::utils::math::{ vec3_length, vec3_sub, Vec3 };

/// Axis-aligned bounding box.
///
/// `Bounds::empty()` starts at the ±`f32::MAX` sentinel so the first merged
/// point or box always wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min: [f32::MAX; 3],
            max: [-f32::MAX; 3],
        }
    }

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_point(point: Vec3) -> Self {
        Self { min: point, max: point }
    }

    /// True while no real data has been folded in.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn include_point(&mut self, point: Vec3) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(point[i]);
            self.max[i] = self.max[i].max(point[i]);
        }
    }

    pub fn merge(&mut self, other: &Bounds) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    pub fn merged(mut self, other: &Bounds) -> Bounds {
        self.merge(other);
        self
    }

    pub fn center(&self) -> Vec3 {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Distance between the two corners. Zero for a single point and
    /// non-finite for the empty sentinel; callers dividing by it must check.
    pub fn diagonal(&self) -> f32 {
        vec3_length(vec3_sub(self.max, self.min))
    }

    pub fn base_length(&self) -> f32 {
        (self.max[0] - self.min[0]).max(0.0)
    }

    pub fn max_length(&self) -> f32 {
        let extent = vec3_sub(self.max, self.min);
        extent[0].max(extent[1]).max(extent[2]).max(0.0)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_commutative() {
        let a = Bounds::new([-1.0, 0.0, 2.0], [1.0, 3.0, 4.0]);
        let b = Bounds::new([0.5, -2.0, -1.0], [2.0, 1.0, 3.0]);
        assert_eq!(a.merged(&b), b.merged(&a));
        assert_eq!(a.merged(&b), Bounds::new([-1.0, -2.0, -1.0], [2.0, 3.0, 4.0]));
    }

    #[test]
    fn merge_with_self_is_identity() {
        let a = Bounds::new([-1.0, 0.0, 2.0], [1.0, 3.0, 4.0]);
        assert_eq!(a.merged(&a), a);
    }

    #[test]
    fn empty_is_absorbed_by_first_merge() {
        let a = Bounds::new([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]);
        assert!(Bounds::empty().is_empty());
        assert_eq!(Bounds::empty().merged(&a), a);
        assert!(!a.is_empty());
    }

    #[test]
    fn single_point_has_zero_diagonal() {
        let p = [1.5, -2.0, 7.0];
        let b = Bounds::from_point(p);
        assert_eq!(b.center(), p);
        assert_eq!(b.diagonal(), 0.0);

        let mut folded = Bounds::empty();
        folded.include_point(p);
        assert_eq!(folded, b);
    }

    #[test]
    fn lengths_clamp_malformed_boxes() {
        let inverted = Bounds::new([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        assert_eq!(inverted.base_length(), 0.0);
        assert_eq!(inverted.max_length(), 0.0);

        let b = Bounds::new([0.0, 0.0, 0.0], [1.0, 4.0, 2.0]);
        assert_eq!(b.base_length(), 1.0);
        assert_eq!(b.max_length(), 4.0);
    }

    #[test]
    fn diagonal_of_span() {
        let b = Bounds::new([-1.0, -1.0, -1.0], [3.0, 3.0, 3.0]);
        assert!((b.diagonal() - 48f32.sqrt()).abs() < 1e-6);
        assert_eq!(b.center(), [1.0, 1.0, 1.0]);
    }
}
