use crate::{Point2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in 2D.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: Point2,
    pub max: Point2,
}

impl Aabb2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let (&first, rest) = points.split_first()?;
        let mut min = first;
        let mut max = first;
        for &p in rest {
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self { min, max })
    }

    pub fn extents(&self) -> Vector2 {
        self.max - self.min
    }

    pub fn center(&self) -> Point2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_point(&self, p: Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb3 {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (&first, rest) = points.split_first()?;
        let mut min = first;
        let mut max = first;
        for &p in rest {
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self { min, max })
    }

    pub fn extents(&self) -> Vector3 {
        self.max - self.min
    }

    pub fn center(&self) -> Point3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_point(&self, p: Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{dvec2, dvec3};

    #[test]
    fn test_aabb2_from_points() {
        let pts = [dvec2(1.0, -2.0), dvec2(-3.0, 4.0), dvec2(0.5, 0.5)];
        let b = Aabb2::from_points(&pts).unwrap();
        assert_eq!(b.min, dvec2(-3.0, -2.0));
        assert_eq!(b.max, dvec2(1.0, 4.0));
        assert!(b.contains_point(dvec2(0.0, 0.0)));
        assert!(!b.contains_point(dvec2(2.0, 0.0)));
    }

    #[test]
    fn test_aabb2_empty() {
        assert!(Aabb2::from_points(&[]).is_none());
    }

    #[test]
    fn test_aabb3_extents() {
        let b = Aabb3::new(dvec3(0.0, 0.0, 0.0), dvec3(2.0, 4.0, 6.0));
        assert_eq!(b.extents(), dvec3(2.0, 4.0, 6.0));
        assert_eq!(b.center(), dvec3(1.0, 2.0, 3.0));
    }
}
