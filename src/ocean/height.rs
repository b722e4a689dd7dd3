//! World-space height queries against the tiled wave field.

use glam::Vec3;

use super::field::WaveField;
use super::influence::InfluenceMaps;
use super::instances::InstanceSet;

/// Wrap a possibly negative grid index into `[0, n)`
#[inline]
pub fn wrap_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    (((i % n) + n) % n) as usize
}

/// Surface height at tile-local `(x, z)`, bilinear between the four surrounding vertices
///
/// The tile repeats with its own extent, so any `(x, z)` on the infinite plane
/// is valid.
pub fn local_height(field: &WaveField, x: f32, z: f32) -> f32 {
    let n = field.grid_size();
    let cell = field.cell_size();
    let half = n as f32 / 2.0;

    let fx = x / cell.x + half;
    let fz = z / cell.y + half;
    let (x0, z0) = (fx.floor(), fz.floor());
    let (tx, tz) = (fx - x0, fz - z0);

    // i + 1 may land on the wrapped last row/column, which mirrors row/column 0
    let ix = wrap_index(x0 as i64, n);
    let iz = wrap_index(z0 as i64, n);
    let height = |x: usize, z: usize| field.vertex(x, z).position[1];

    let top = height(ix, iz) * (1.0 - tx) + height(ix + 1, iz) * tx;
    let bottom = height(ix, iz + 1) * (1.0 - tx) + height(ix + 1, iz + 1) * tx;
    top * (1.0 - tz) + bottom * tz
}

/// Water surface point below world `(x, z)`, after influence blending
///
/// The wave offset is measured against the transformed rest plane, so the
/// returned height is `base_height` plus the displacement along the tile's
/// up axis. Calm-zone weights are taken at the queried `(x, z)`.
///
/// Without an invertible instance 0 the query falls back to
/// `(world_x, base_height, world_z)`.
pub fn query_height(
    field: &WaveField,
    instances: &InstanceSet,
    influence: &InfluenceMaps,
    world_x: f32,
    world_z: f32,
) -> Vec3 {
    let base = influence.base_height();
    let fallback = Vec3::new(world_x, base, world_z);
    let (Some(model), Some(inverse)) = (instances.base_model(), instances.base_inverse()) else {
        return fallback;
    };

    let local = inverse.transform_point3(Vec3::new(world_x, 0.0, world_z));
    let height = local_height(field, local.x, local.z);
    let surface = model.transform_point3(Vec3::new(local.x, height, local.z));
    let rest = model.transform_point3(Vec3::new(local.x, 0.0, local.z));
    let raw = base + (surface.y - rest.y);
    if !surface.is_finite() || !raw.is_finite() {
        return fallback;
    }

    let y = influence.blend(raw, Vec3::new(world_x, raw, world_z));
    Vec3::new(surface.x, y, surface.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::influence::{Falloff, InfluenceMap};
    use crate::ocean::instances::Transform;
    use crate::params::OceanParams;
    use glam::Vec2;

    fn field(wave_height: f32) -> WaveField {
        let mut field = WaveField::new(&OceanParams {
            grid_size: 16,
            vertex_distance: Vec2::splat(32.0),
            wave_height,
            ..OceanParams::default()
        });
        field.generate(5.0);
        field
    }

    fn instances(transform: Transform) -> InstanceSet {
        let mut set = InstanceSet::new();
        set.reset(1, transform, Vec2::splat(32.0));
        set
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(0, 8), 0);
        assert_eq!(wrap_index(9, 8), 1);
        assert_eq!(wrap_index(-1, 8), 7);
        assert_eq!(wrap_index(-17, 8), 7);
    }

    #[test]
    fn test_grid_points_return_vertex_height() {
        let field = field(0.0005);
        // Cell size is 2, grid point (3, 5) sits at ((3 - 8) * 2, (5 - 8) * 2)
        let h = local_height(&field, -10.0, -6.0);
        assert!((h - field.vertex(3, 5).position[1]).abs() < 1e-6);
    }

    #[test]
    fn test_query_repeats_every_tile() {
        let field = field(0.0005);
        let set = instances(Transform::IDENTITY);
        let maps = InfluenceMaps::new(0.0);
        let a = query_height(&field, &set, &maps, 3.3, -7.1);
        let b = query_height(&field, &set, &maps, 3.3 + 32.0, -7.1 - 64.0);
        assert!((a.y - b.y).abs() < 1e-4);
    }

    #[test]
    fn test_query_follows_instance_translation() {
        let field = field(0.0005);
        let maps = InfluenceMaps::new(0.0);
        let plain = query_height(&field, &instances(Transform::IDENTITY), &maps, 1.0, 1.0);
        let moved = instances(Transform::from_translation(Vec3::new(2.0, 4.0, 0.0)));

        // Lifting the object does not lift the water, moving it shifts the sample
        let shifted = query_height(&field, &moved, &maps, 3.0, 1.0);
        assert!((shifted.y - plain.y).abs() < 1e-5);
        assert!((shifted.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_flat_field_reports_base_height_without_lift() {
        let field = field(0.0);
        let set = instances(Transform::IDENTITY);
        let maps = InfluenceMaps::new(2.0);
        for (x, z) in [(3.0, 4.0), (-17.5, 60.0)] {
            assert_eq!(query_height(&field, &set, &maps, x, z).y, 2.0);
        }
    }

    #[test]
    fn test_influence_weight_uses_query_position() {
        let field = field(0.0005);
        let tilted = instances(Transform {
            rotation: glam::Quat::from_rotation_x(0.6),
            ..Transform::IDENTITY
        });
        let mut maps = InfluenceMaps::new(0.0);
        let raw = query_height(&field, &tilted, &maps, 5.0, 7.0);
        assert!(raw.y.abs() > 0.0);

        // The tilt moves the surface point's z away from 7, the weight must not follow it
        maps.set_base_height(-0.25);
        maps.add(InfluenceMap::new(Vec3::new(5.0, 0.0, 7.0), 0.5, 1.0, Falloff::Linear));
        let calmed = query_height(&field, &tilted, &maps, 5.0, 7.0);
        assert!((calmed.y + 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_flat_field_returns_base_height() {
        let field = field(0.0);
        let set = instances(Transform::IDENTITY);
        let mut maps = InfluenceMaps::new(0.0);
        assert_eq!(query_height(&field, &set, &maps, 12.0, -40.0).y, 0.0);

        maps.add(InfluenceMap::new(Vec3::ZERO, 5.0, 0.5, Falloff::Cubic));
        assert_eq!(query_height(&field, &set, &maps, 1.0, 2.0).y, 0.0);
    }

    #[test]
    fn test_uninitialized_instances_fall_back() {
        let field = field(0.0005);
        let maps = InfluenceMaps::new(1.5);
        let point = query_height(&field, &InstanceSet::new(), &maps, 2.0, -3.0);
        assert_eq!(point, Vec3::new(2.0, 1.5, -3.0));
    }
}
