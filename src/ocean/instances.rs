//! Instanced tiling of the simulated tile.
//!
//! Instances live in a flat arena indexed by slot. [`InstanceSet::reset`]
//! destroys and recreates every record (bumping the epoch so render glue knows
//! to rebuild its resources); [`InstanceSet::reposition`] only recomputes the
//! model matrices.

use glam::{Mat4, Quat, Vec2, Vec3};
use log::{debug, warn};

/// World placement of the owning ocean object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// One tile copy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    /// Column and row within the instance grid
    pub cell: (usize, usize),
    pub model: Mat4,
}

/// Arena of `count²` instance records
#[derive(Debug, Clone, Default)]
pub struct InstanceSet {
    per_side: usize,
    transform: Transform,
    tile_extent: Vec2,
    records: Vec<Instance>,
    base_inverse: Option<Mat4>,
    epoch: u64,
}

impl InstanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy every record and recreate `per_side²` of them
    ///
    /// A count whose square overflows leaves the set empty.
    pub fn reset(&mut self, per_side: usize, transform: Transform, tile_extent: Vec2) {
        self.transform = transform;
        self.tile_extent = tile_extent;
        self.records.clear();
        self.epoch += 1;

        let Some(total) = per_side.checked_mul(per_side) else {
            warn!("Cannot create {}x{} instances, leaving none", per_side, per_side);
            self.per_side = 0;
            self.base_inverse = None;
            return;
        };
        self.per_side = per_side;
        self.records.reserve(total);
        for z in 0..per_side {
            for x in 0..per_side {
                self.records.push(Instance {
                    cell: (x, z),
                    model: Mat4::IDENTITY,
                });
            }
        }
        self.update_models();
        debug!(
            "Instance reset: {} instances (epoch {})",
            self.records.len(),
            self.epoch
        );
    }

    /// Move every instance to follow `transform` without recreating records
    pub fn reposition(&mut self, transform: Transform) {
        self.transform = transform;
        self.update_models();
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
        self.base_inverse = None;
        self.per_side = 0;
    }

    fn update_models(&mut self) {
        let base = self.transform.matrix();
        for record in &mut self.records {
            let (x, z) = record.cell;
            let offset = Vec3::new(
                x as f32 * self.tile_extent.x,
                0.0,
                -(z as f32) * self.tile_extent.y,
            );
            record.model = base * Mat4::from_translation(offset);
        }

        // A degenerate scale has no inverse, queries then fall back
        self.base_inverse = self
            .records
            .first()
            .map(|record| record.model)
            .filter(|model| model.determinant().abs() > f32::EPSILON)
            .map(|model| model.inverse());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn per_side(&self) -> usize {
        self.per_side
    }

    /// Incremented by every [`InstanceSet::reset`]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn get(&self, slot: usize) -> Option<&Instance> {
        self.records.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.records.iter()
    }

    /// Model matrix of instance 0
    pub fn base_model(&self) -> Option<Mat4> {
        self.records.first().map(|record| record.model)
    }

    /// Inverse model matrix of instance 0, `None` when there is no invertible instance
    pub fn base_inverse(&self) -> Option<Mat4> {
        self.base_inverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_creates_square_grid() {
        let mut set = InstanceSet::new();
        set.reset(3, Transform::IDENTITY, Vec2::new(10.0, 20.0));
        assert_eq!(set.len(), 9);
        assert_eq!(set.per_side(), 3);

        let origin = |slot: usize| set.get(slot).map(|i| i.model.transform_point3(Vec3::ZERO));
        assert_eq!(origin(0), Some(Vec3::ZERO));
        assert_eq!(origin(1), Some(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(origin(3), Some(Vec3::new(0.0, 0.0, -20.0)));
        assert_eq!(origin(8), Some(Vec3::new(20.0, 0.0, -40.0)));
    }

    #[test]
    fn test_offsets_follow_rotation_and_scale() {
        let mut set = InstanceSet::new();
        let transform = Transform {
            translation: Vec3::new(5.0, 1.0, 0.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        set.reset(2, transform, Vec2::splat(4.0));
        let origin = set.get(1).map(|i| i.model.transform_point3(Vec3::ZERO));
        // +x offset of 4 scaled by 2 then rotated a quarter turn about y lands on -z
        let origin = origin.unwrap();
        assert!((origin - Vec3::new(5.0, 1.0, -8.0)).length() < 1e-4);
    }

    #[test]
    fn test_epoch_only_bumps_on_reset() {
        let mut set = InstanceSet::new();
        set.reset(1, Transform::IDENTITY, Vec2::ONE);
        assert_eq!(set.epoch(), 1);
        set.reposition(Transform::from_translation(Vec3::X));
        assert_eq!(set.epoch(), 1);
        assert_eq!(
            set.base_model().map(|m| m.transform_point3(Vec3::ZERO)),
            Some(Vec3::X)
        );
        set.reset(2, Transform::IDENTITY, Vec2::ONE);
        assert_eq!(set.epoch(), 2);
    }

    #[test]
    fn test_overflowing_count_leaves_set_empty() {
        let mut set = InstanceSet::new();
        set.reset(2, Transform::IDENTITY, Vec2::ONE);
        set.reset(usize::MAX, Transform::IDENTITY, Vec2::ONE);
        assert!(set.is_empty());
        assert_eq!(set.per_side(), 0);
        assert!(set.base_inverse().is_none());
        assert_eq!(set.epoch(), 2);
    }

    #[test]
    fn test_base_inverse_round_trips() {
        let mut set = InstanceSet::new();
        set.reset(
            1,
            Transform {
                translation: Vec3::new(3.0, 0.0, -2.0),
                rotation: Quat::from_rotation_y(0.3),
                scale: Vec3::new(1.5, 1.0, 0.5),
            },
            Vec2::splat(8.0),
        );
        let model = set.base_model().unwrap();
        let inverse = set.base_inverse().unwrap();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!((inverse.transform_point3(model.transform_point3(p)) - p).length() < 1e-4);
    }

    #[test]
    fn test_empty_and_degenerate_sets_have_no_inverse() {
        let mut set = InstanceSet::new();
        assert!(set.base_inverse().is_none());

        set.reset(
            1,
            Transform {
                scale: Vec3::ZERO,
                ..Transform::IDENTITY
            },
            Vec2::ONE,
        );
        assert!(set.base_inverse().is_none());

        set.reset(1, Transform::IDENTITY, Vec2::ONE);
        set.clear();
        assert!(set.is_empty());
        assert!(set.base_inverse().is_none());
    }
}
