//! Ocean lifecycle controller: parameter staging, resets and the per-tick update.

use std::time::Instant;

use glam::{Vec2, Vec3};
use log::{debug, trace, warn};

use super::field::WaveField;
use super::height;
use super::influence::InfluenceMaps;
use super::instances::{InstanceSet, Transform};
use super::mesh::{Topology, Vertex};
use crate::params::{
    validate_grid_size, validate_instance_count, validate_vertex_distance, ConjugateSampling,
    OceanConfig, OceanParams, Parallelism, SynthesisBackend, WaveVectorScale, MIN_TIME_DILATION,
};

/// Observable lifecycle of an [`OceanSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing allocated yet, the first tick constructs
    Uninitialized,
    /// Arrays allocated and spectrum sampled, no tick synthesized yet
    Constructed,
    Running,
    /// A parameter change or reset request waits for the next tick boundary
    ResetPending,
    Destructed,
}

/// High-level ocean system
///
/// Setters only stage values. Spectrum-shaping changes are applied at the
/// next tick boundary (destruct, construct, instance reset), so a tick never
/// sees half-updated arrays.
pub struct OceanSystem {
    params: OceanParams,
    pending: OceanParams,
    reset_needed: bool,
    instance_reset_needed: bool,
    state: LifecycleState,
    field: Option<WaveField>,
    instances: InstanceSet,
    transform: Transform,
    influence: InfluenceMaps,
    time_s: f64,
    ticks_since_synthesis: u32,
}

impl OceanSystem {
    /// Create an uninitialized system, the first [`OceanSystem::update`] constructs it
    pub fn new(params: OceanParams) -> Self {
        let params = params.sanitized();
        Self {
            params,
            pending: params,
            reset_needed: true,
            instance_reset_needed: false,
            state: LifecycleState::Uninitialized,
            field: None,
            instances: InstanceSet::new(),
            transform: Transform::IDENTITY,
            influence: InfluenceMaps::new(0.0),
            time_s: 0.0,
            ticks_since_synthesis: 0,
        }
    }

    pub fn from_config(config: &OceanConfig) -> Self {
        let mut system = Self::new(config.ocean);
        system.influence = config.influence_maps();
        system
    }

    // ---- Lifecycle ----

    /// Allocate every array and sample the spectrum from the staged parameters
    pub fn construct(&mut self) {
        self.params = self.pending;
        self.field = Some(WaveField::new(&self.params));
        self.reset_needed = false;
        // The first tick after construction always synthesizes
        self.ticks_since_synthesis = self.params.step_interval;
        self.state = LifecycleState::Constructed;
        debug!("Ocean constructed ({}x{})", self.params.grid_size, self.params.grid_size);
        self.instance_reset();
    }

    /// Free the field and every instance
    pub fn destruct(&mut self) {
        self.field = None;
        self.instances.clear();
        self.state = LifecycleState::Destructed;
        debug!("Ocean destructed");
    }

    /// Recreate every instance for the current count and transform
    pub fn instance_reset(&mut self) {
        self.params.instance_count = self.pending.instance_count;
        self.instances.reset(
            self.params.instances_per_side(),
            self.transform,
            self.params.vertex_distance,
        );
        self.instance_reset_needed = false;
    }

    /// Rebuild immediately from the staged parameters and rewind time to zero
    pub fn reset(&mut self) {
        debug!("Ocean reset");
        self.destruct();
        self.construct();
        self.time_s = 0.0;
    }

    /// Schedule a full reset for the next tick boundary
    pub fn request_reset(&mut self) {
        self.reset_needed = true;
        self.mark_pending();
    }

    fn mark_pending(&mut self) {
        if matches!(
            self.state,
            LifecycleState::Constructed | LifecycleState::Running
        ) {
            self.state = LifecycleState::ResetPending;
        }
    }

    /// Apply staged changes that are due at a tick boundary
    fn apply_pending(&mut self) {
        if self.reset_needed {
            if self.field.is_some() {
                self.destruct();
            }
            self.construct();
            return;
        }

        // Options that leave the spectrum intact
        self.params.time_dilation = self.pending.time_dilation;
        self.params.displacement = self.pending.displacement;
        self.params.backend = self.pending.backend;
        self.params.parallelism = self.pending.parallelism;
        self.params.step_interval = self.pending.step_interval;
        if let Some(field) = self.field.as_mut() {
            field.configure(&self.params);
        }

        if self.instance_reset_needed {
            self.instance_reset();
        }
        if self.state == LifecycleState::ResetPending {
            self.state = LifecycleState::Running;
        }
    }

    /// Advance simulation time by `dt_s` wall-clock seconds and synthesize when due
    pub fn update(&mut self, dt_s: f32) {
        if self.state == LifecycleState::Destructed && !self.reset_needed {
            trace!("Update skipped, ocean is destructed");
            return;
        }
        self.apply_pending();

        self.time_s += dt_s as f64 * self.params.time_dilation as f64;

        if self.ticks_since_synthesis < self.params.step_interval {
            self.ticks_since_synthesis += 1;
            return;
        }
        self.ticks_since_synthesis = 0;

        let Some(field) = self.field.as_mut() else {
            return;
        };
        let start = Instant::now();
        field.generate(self.time_s);
        trace!(
            "Synthesized t={:.3}s in {:.2}ms",
            self.time_s,
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.state = LifecycleState::Running;
    }

    // ---- Parameter surface ----

    /// Stage arbitrary parameter edits
    ///
    /// Edits that change the spectrum schedule a reset, instance count
    /// changes schedule an instance reset, everything else applies at the
    /// next tick without rebuilding.
    pub fn stage(&mut self, edit: impl FnOnce(&mut OceanParams)) {
        let previous_dilation = self.pending.time_dilation;
        edit(&mut self.pending);
        if !(self.pending.time_dilation >= MIN_TIME_DILATION) {
            warn!(
                "Rejected time dilation {} (minimum {}), keeping {}",
                self.pending.time_dilation, MIN_TIME_DILATION, previous_dilation
            );
            self.pending.time_dilation = previous_dilation;
        }
        self.pending = self.pending.sanitized();

        if self.params.requires_reset(&self.pending) {
            self.reset_needed = true;
            self.mark_pending();
        } else if self.params.instance_count != self.pending.instance_count {
            self.instance_reset_needed = true;
            self.mark_pending();
        }
    }

    pub fn set_grid_size(&mut self, grid_size: usize) {
        let grid_size = validate_grid_size(grid_size);
        self.stage(|p| p.grid_size = grid_size);
    }

    pub fn set_wave_height(&mut self, wave_height: f32) {
        self.stage(|p| p.wave_height = wave_height);
    }

    pub fn set_wind_factor(&mut self, wind_factor: Vec2) {
        self.stage(|p| p.wind_factor = wind_factor);
    }

    pub fn set_vertex_distance(&mut self, vertex_distance: Vec2) {
        let vertex_distance = validate_vertex_distance(vertex_distance);
        self.stage(|p| p.vertex_distance = vertex_distance);
    }

    pub fn set_gravitational_pull(&mut self, gravitational_pull: f32) {
        self.stage(|p| p.gravitational_pull = gravitational_pull);
    }

    pub fn set_instance_count(&mut self, instance_count: i32) {
        let instance_count = validate_instance_count(instance_count);
        self.stage(|p| p.instance_count = instance_count);
    }

    /// Values below the minimum are rejected and the previous value kept
    pub fn set_time_dilation(&mut self, time_dilation: f32) {
        self.stage(|p| p.time_dilation = time_dilation);
    }

    pub fn set_repeat_period(&mut self, repeat_period_s: f32) {
        self.stage(|p| p.repeat_period_s = repeat_period_s);
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.stage(|p| p.seed = seed);
    }

    pub fn set_conjugate_sampling(&mut self, sampling: ConjugateSampling) {
        self.stage(|p| p.conjugate_sampling = sampling);
    }

    pub fn set_wave_vector(&mut self, scale: WaveVectorScale) {
        self.stage(|p| p.wave_vector = scale);
    }

    pub fn set_displacement(&mut self, displacement: bool) {
        self.stage(|p| p.displacement = displacement);
    }

    pub fn set_backend(&mut self, backend: SynthesisBackend) {
        self.stage(|p| p.backend = backend);
    }

    pub fn set_parallelism(&mut self, parallelism: Parallelism) {
        self.stage(|p| p.parallelism = parallelism);
    }

    pub fn set_step_interval(&mut self, step_interval: u32) {
        self.stage(|p| p.step_interval = step_interval);
    }

    pub fn grid_size(&self) -> usize {
        self.pending.grid_size
    }

    pub fn wave_height(&self) -> f32 {
        self.pending.wave_height
    }

    pub fn wind_factor(&self) -> Vec2 {
        self.pending.wind_factor
    }

    pub fn vertex_distance(&self) -> Vec2 {
        self.pending.vertex_distance
    }

    pub fn gravitational_pull(&self) -> f32 {
        self.pending.gravitational_pull
    }

    pub fn instance_count(&self) -> i32 {
        self.pending.instance_count
    }

    pub fn time_dilation(&self) -> f32 {
        self.pending.time_dilation
    }

    /// Parameters the live arrays were built from
    pub fn params(&self) -> &OceanParams {
        &self.params
    }

    /// Parameters the next tick boundary will apply
    pub fn pending_params(&self) -> &OceanParams {
        &self.pending
    }

    // ---- State access ----

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_reset_pending(&self) -> bool {
        self.reset_needed
    }

    /// Dilated simulation time (seconds)
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn field(&self) -> Option<&WaveField> {
        self.field.as_ref()
    }

    /// Render vertices for upload, empty until constructed
    pub fn vertices(&self) -> &[Vertex] {
        self.field.as_ref().map_or(&[][..], |field| field.vertices())
    }

    pub fn indices(&self, topology: Topology) -> &[u32] {
        self.field.as_ref().map_or(&[][..], |field| field.indices(topology))
    }

    pub fn instances(&self) -> &InstanceSet {
        &self.instances
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Move the ocean, repositioning instances without recreating them
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.instances.reposition(transform);
    }

    pub fn influence_maps(&self) -> &InfluenceMaps {
        &self.influence
    }

    pub fn influence_maps_mut(&mut self) -> &mut InfluenceMaps {
        &mut self.influence
    }

    pub fn base_height(&self) -> f32 {
        self.influence.base_height()
    }

    pub fn set_base_height(&mut self, base_height: f32) {
        self.influence.set_base_height(base_height);
    }

    /// Water surface point below world `(x, z)`
    ///
    /// Before construction (or after destruction) this returns
    /// `(world_x, base_height, world_z)`.
    pub fn get_height(&self, world_x: f32, world_z: f32) -> Vec3 {
        match self.field.as_ref() {
            Some(field) => {
                height::query_height(field, &self.instances, &self.influence, world_x, world_z)
            }
            None => Vec3::new(world_x, self.influence.base_height(), world_z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MAX_INSTANCE_COUNT;

    fn params() -> OceanParams {
        OceanParams {
            grid_size: 16,
            vertex_distance: Vec2::splat(32.0),
            ..OceanParams::default()
        }
    }

    fn max_height(system: &OceanSystem) -> f32 {
        system
            .vertices()
            .iter()
            .map(|v| v.position[1].abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_first_update_constructs_and_runs() {
        let mut ocean = OceanSystem::new(params());
        assert_eq!(ocean.state(), LifecycleState::Uninitialized);
        assert!(ocean.vertices().is_empty());

        ocean.update(0.1);
        assert_eq!(ocean.state(), LifecycleState::Running);
        assert_eq!(ocean.vertices().len(), 17 * 17);
        assert_eq!(ocean.instances().len(), 1);
        assert!(max_height(&ocean) > 0.0);
    }

    #[test]
    fn test_setter_defers_reset_to_tick_boundary() {
        let mut ocean = OceanSystem::new(params());
        ocean.update(0.1);

        ocean.set_grid_size(32);
        assert_eq!(ocean.state(), LifecycleState::ResetPending);
        assert_eq!(ocean.grid_size(), 32);
        assert_eq!(ocean.params().grid_size, 16);
        assert_eq!(ocean.vertices().len(), 17 * 17);

        ocean.update(0.1);
        assert_eq!(ocean.state(), LifecycleState::Running);
        assert_eq!(ocean.params().grid_size, 32);
        assert_eq!(ocean.vertices().len(), 33 * 33);
    }

    #[test]
    fn test_invalid_grid_size_substitutes_default() {
        let mut ocean = OceanSystem::new(params());
        ocean.set_grid_size(100);
        assert_eq!(ocean.grid_size(), crate::params::DEFAULT_GRID_SIZE);
    }

    #[test]
    fn test_time_dilation_scales_and_rejects_tiny_values() {
        let mut ocean = OceanSystem::new(params());
        ocean.set_time_dilation(2.0);
        ocean.update(0.5);
        assert!((ocean.time_s() - 1.0).abs() < 1e-9);

        ocean.set_time_dilation(1e-6);
        assert_eq!(ocean.time_dilation(), 2.0);
        assert!(!ocean.is_reset_pending());
    }

    #[test]
    fn test_instance_count_change_only_resets_instances() {
        let mut ocean = OceanSystem::new(params());
        ocean.update(0.1);
        let epoch = ocean.instances().epoch();
        let time = ocean.time_s();

        ocean.set_instance_count(3);
        assert!(!ocean.is_reset_pending());
        ocean.update(0.1);

        assert_eq!(ocean.instances().len(), 9);
        assert_eq!(ocean.instances().epoch(), epoch + 1);
        assert!(ocean.time_s() > time);
    }

    #[test]
    fn test_negative_instance_count_clamped() {
        let mut ocean = OceanSystem::new(params());
        ocean.set_instance_count(-4);
        assert_eq!(ocean.instance_count(), 1);
    }

    #[test]
    fn test_huge_instance_count_clamped() {
        let mut ocean = OceanSystem::new(params());
        ocean.update(0.1);
        ocean.set_instance_count(i32::MAX);
        ocean.update(0.1);
        assert_eq!(ocean.instance_count(), MAX_INSTANCE_COUNT);
        let per_side = MAX_INSTANCE_COUNT as usize;
        assert_eq!(ocean.instances().len(), per_side * per_side);
        assert_eq!(ocean.state(), LifecycleState::Running);
    }

    #[test]
    fn test_reset_rewinds_time_and_is_idempotent() {
        let mut ocean = OceanSystem::new(params());
        ocean.update(0.0);
        let initial: Vec<Vertex> = ocean.vertices().to_vec();

        ocean.update(3.0);
        ocean.reset();
        assert_eq!(ocean.time_s(), 0.0);
        ocean.update(0.0);
        assert_eq!(ocean.vertices(), initial.as_slice());

        ocean.reset();
        ocean.reset();
        ocean.update(0.0);
        assert_eq!(ocean.vertices(), initial.as_slice());
    }

    #[test]
    fn test_request_reset_applies_on_next_update() {
        let mut ocean = OceanSystem::new(params());
        ocean.update(0.1);
        ocean.request_reset();
        assert_eq!(ocean.state(), LifecycleState::ResetPending);
        ocean.update(0.1);
        assert_eq!(ocean.state(), LifecycleState::Running);
        assert!(!ocean.is_reset_pending());
    }

    #[test]
    fn test_step_interval_throttles_synthesis() {
        let mut ocean = OceanSystem::new(OceanParams {
            step_interval: 2,
            ..params()
        });
        ocean.update(1.0);
        let first: Vec<Vertex> = ocean.vertices().to_vec();

        ocean.update(1.0);
        ocean.update(1.0);
        assert_eq!(ocean.vertices(), first.as_slice());

        ocean.update(1.0);
        assert_ne!(ocean.vertices(), first.as_slice());
        assert_eq!(ocean.field().map(|f| f.time_s()), Some(4.0));
    }

    #[test]
    fn test_destructed_system_stays_idle() {
        let mut ocean = OceanSystem::new(params());
        ocean.update(0.1);
        ocean.destruct();
        ocean.update(0.1);
        assert_eq!(ocean.state(), LifecycleState::Destructed);
        assert!(ocean.vertices().is_empty());
        assert_eq!(ocean.get_height(1.0, 2.0), Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_set_transform_moves_height_queries() {
        let mut ocean = OceanSystem::new(params());
        ocean.update(0.5);
        let before = ocean.get_height(2.0, 3.0);
        ocean.set_transform(Transform::from_translation(Vec3::new(6.0, 10.0, 0.0)));
        let after = ocean.get_height(8.0, 3.0);
        assert!((after.y - before.y).abs() < 1e-5);
        assert_eq!(ocean.instances().epoch(), 1);
    }

    #[test]
    fn test_flat_sea_sits_at_base_height() {
        let mut ocean = OceanSystem::new(OceanParams {
            wave_height: 0.0,
            ..params()
        });
        ocean.set_base_height(2.0);
        ocean.update(1.0);
        assert_eq!(ocean.get_height(3.0, 4.0), Vec3::new(3.0, 2.0, 4.0));
    }

    #[test]
    fn test_backend_switch_does_not_resample_spectrum() {
        let mut ocean = OceanSystem::new(OceanParams {
            grid_size: 8,
            ..params()
        });
        ocean.update(0.5);
        let fft: Vec<Vertex> = ocean.vertices().to_vec();

        ocean.set_backend(SynthesisBackend::Direct);
        assert!(!ocean.is_reset_pending());
        ocean.reset();
        ocean.update(0.5);
        for (a, b) in fft.iter().zip(ocean.vertices()) {
            assert!((a.position() - b.position()).length() < 1e-4);
        }
    }
}
