use std::f32::consts::PI;

use glam::{vec3a, Vec3A};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Rows per render band; the last band takes the remainder.
    pub band_size: usize,
    /// Threads in the render pool, `None` lets rayon pick one per core.
    pub worker_threads: Option<usize>,

    pub vertical_fov: f32,
    pub orbit_center: Vec3A,
    pub orbit_offset: Vec3A,
    /// Camera orbit in radians per second of total time.
    pub orbit_speed: f32,

    /// Seconds between scene resets.
    pub reset_interval: f32,
    /// Largest offset (exclusive) applied to reset positions.
    pub reset_spread: i32,
    pub seed: u64,

    pub overlay_angle_step: f32,

    pub stats_width: u32,
    pub stats_height: u32,
    /// Frames slower than this many seconds get logged.
    pub frame_budget: f32,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            width: 320,
            height: 200,
            band_size: 16,
            worker_threads: None,

            vertical_fov: 80.0,
            orbit_center: vec3a(0.0, 5.0, -25.0),
            orbit_offset: vec3a(0.0, 5.0, 25.0),
            orbit_speed: 2.0,

            reset_interval: 5.0,
            reset_spread: 5,
            seed: 0x5eed,

            overlay_angle_step: PI / 32.0,

            stats_width: 320,
            stats_height: 32,
            frame_budget: 0.032,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyImage {
                width: self.width,
                height: self.height,
            });
        }
        if self.stats_width == 0 || self.stats_height == 0 {
            return Err(ConfigError::EmptyStatsStrip {
                width: self.stats_width,
                height: self.stats_height,
            });
        }
        if self.band_size == 0 {
            return Err(ConfigError::ZeroBandSize);
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::ZeroWorkerThreads);
        }
        if !(self.vertical_fov > 0.0 && self.vertical_fov < 180.0) {
            return Err(ConfigError::FieldOfView(self.vertical_fov));
        }
        Ok(())
    }
}
