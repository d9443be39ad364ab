//! Mapping between world-space floating point positions and the index's
//! fixed integer coordinate domain `[0, ROOT_EXTENT)`.

use luciferase_error::{LuciferaseError, Result};
use luciferase_geometry::ROOT_EXTENT;
use luciferase_types::{Aabb, Vec3f};

/// Linear scale between a world-space bounding volume and the integer
/// domain every [`luciferase_geometry::SFCKey`] and [`luciferase_geometry::Tet`]
/// operate over.
#[derive(Debug, Clone, Copy)]
pub struct CoordMapper {
    bounds: Aabb,
    scale_x: f64,
    scale_y: f64,
    scale_z: f64,
}

impl CoordMapper {
    #[must_use]
    pub fn new(bounds: Aabb) -> Self {
        let extent = ROOT_EXTENT as f64;
        let span = |min: f32, max: f32| {
            let span = f64::from(max - min);
            if span > 0.0 {
                extent / span
            } else {
                1.0
            }
        };
        Self {
            bounds,
            scale_x: span(bounds.min.x, bounds.max.x),
            scale_y: span(bounds.min.y, bounds.max.y),
            scale_z: span(bounds.min.z, bounds.max.z),
        }
    }

    /// Map a world-space point into the integer domain.
    ///
    /// # Errors
    /// Returns an error if `p` lies outside `bounds`.
    pub fn to_int(&self, p: Vec3f) -> Result<(i64, i64, i64)> {
        if !self.bounds.contains_point(p) {
            return Err(LuciferaseError::invalid_coordinate(format!(
                "point {p:?} outside index bounds {:?}..{:?}",
                self.bounds.min, self.bounds.max
            )));
        }
        let max = ROOT_EXTENT - 1;
        let clamp = |v: i64| v.clamp(0, max);
        let ix = clamp((f64::from(p.x - self.bounds.min.x) * self.scale_x) as i64);
        let iy = clamp((f64::from(p.y - self.bounds.min.y) * self.scale_y) as i64);
        let iz = clamp((f64::from(p.z - self.bounds.min.z) * self.scale_z) as i64);
        Ok((ix, iy, iz))
    }

    /// Inverse of [`Self::to_int`]: the world-space position of the
    /// lower corner of integer cell `(x, y, z)`.
    #[must_use]
    pub fn to_world(&self, c: (i64, i64, i64)) -> Vec3f {
        let (x, y, z) = c;
        Vec3f::new(
            self.bounds.min.x + (x as f64 / self.scale_x) as f32,
            self.bounds.min.y + (y as f64 / self.scale_y) as f32,
            self.bounds.min.z + (z as f64 / self.scale_z) as f32,
        )
    }

    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }
}
