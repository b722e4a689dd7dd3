//! Influence maps: localized calm zones that pull queried heights toward a base height.
//!
//! Influence maps never touch the synthesized field; they only post-process
//! the result of a height query.

use glam::{Vec2, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};

/// Maximum number of registered influence maps
pub const MAX_INFLUENCE_MAPS: usize = 8;

/// Falloff curve evaluated on the normalized distance `d` in `[0, 1]`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    #[default]
    Linear,
    Squared,
    Cubic,
    Logarithmic,
}

impl Falloff {
    /// Maps `d` in `[0, 1]` onto `[0, 1]` with `f(0) = 0` and `f(1) = 1`
    pub fn evaluate(self, d: f32) -> f32 {
        let d = d.clamp(0.0, 1.0);
        match self {
            Self::Linear => d,
            Self::Squared => d * d,
            Self::Cubic => d * d * d,
            Self::Logarithmic => (1.0 + (std::f32::consts::E - 1.0) * d).ln(),
        }
    }
}

/// One circular calm zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceMap {
    /// World-space center (only x and z are used for distance)
    pub center: Vec3,

    /// Radius of the zone in world units
    pub radius: f32,

    /// 1.0 flattens fully at the center, 0.0 disables the zone
    pub intensity: f32,

    pub falloff: Falloff,

    pub active: bool,
}

impl Default for InfluenceMap {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 10.0,
            intensity: 1.0,
            falloff: Falloff::Linear,
            active: true,
        }
    }
}

impl InfluenceMap {
    pub fn new(center: Vec3, radius: f32, intensity: f32, falloff: Falloff) -> Self {
        Self {
            center,
            radius,
            intensity,
            falloff,
            active: true,
        }
    }

    /// Normalized XZ distance `|point - center| / radius`
    pub fn normalized_distance(&self, point: Vec3) -> f32 {
        let offset = Vec2::new(point.x - self.center.x, point.z - self.center.z);
        offset.length() / self.radius
    }

    /// Multiplicative height factor this zone applies at `point`
    ///
    /// Returns 1.0 outside the zone, for inactive zones and for degenerate radii.
    pub fn factor_at(&self, point: Vec3) -> f32 {
        if !self.active || !(self.radius > 0.0) {
            return 1.0;
        }
        let d = self.normalized_distance(point);
        if d >= 1.0 {
            return 1.0;
        }
        let intensity = self.intensity.clamp(0.0, 1.0);
        1.0 - intensity * (1.0 - self.falloff.evaluate(d))
    }
}

/// Registry of influence maps plus the base height they blend toward
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InfluenceMaps {
    maps: Vec<InfluenceMap>,
    base_height: f32,
}

impl InfluenceMaps {
    pub fn new(base_height: f32) -> Self {
        Self {
            maps: Vec::with_capacity(MAX_INFLUENCE_MAPS),
            base_height,
        }
    }

    pub fn base_height(&self) -> f32 {
        self.base_height
    }

    pub fn set_base_height(&mut self, base_height: f32) {
        self.base_height = base_height;
    }

    /// Register a map, returning its index, or `None` when the registry is full
    pub fn add(&mut self, map: InfluenceMap) -> Option<usize> {
        if self.maps.len() >= MAX_INFLUENCE_MAPS {
            warn!(
                "Influence map registry is full ({} maps), map was not added",
                MAX_INFLUENCE_MAPS
            );
            return None;
        }
        self.maps.push(map);
        Some(self.maps.len() - 1)
    }

    /// Remove a map; maps after it shift down by one index
    pub fn remove(&mut self, index: usize) -> Option<InfluenceMap> {
        (index < self.maps.len()).then(|| self.maps.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&InfluenceMap> {
        self.maps.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut InfluenceMap> {
        self.maps.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InfluenceMap> {
        self.maps.iter()
    }

    /// Product of every active map's factor at `point`
    pub fn height_influence(&self, point: Vec3) -> f32 {
        self.maps
            .iter()
            .filter(|map| map.active)
            .map(|map| map.factor_at(point))
            .product()
    }

    /// `base + (raw - base) * heightInfluence`
    pub fn blend(&self, raw_height: f32, point: Vec3) -> f32 {
        let influence = self.height_influence(point);
        self.base_height + (raw_height - self.base_height) * influence
    }
}
