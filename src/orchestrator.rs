use std::time::Instant;

use glam::Vec3A;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::define_scene::SceneSetup;
use crate::error::ConfigError;
use crate::framebuffer::{Bgra, FrameBuffer};
use crate::overlay::CubeOverlay;
use crate::physics::{ParticleWorld, PhysicsWorld};
use crate::scene::RenderScene;
use crate::scheduler::TileScheduler;
use crate::stats::{FrameStats, StatsStrip};

const CLEAR_COLOR: Bgra = Bgra::new(128, 128, 128, 255);

/// Ties a sphere in the scene to the physics body that moves it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereBinding {
    pub sphere: usize,
    pub body: usize,
    pub reset: Option<ResetPlacement>,
}

/// Where a body goes on a scene reset: `home` moved along Y by the random offset times
/// `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResetPlacement {
    pub home: Vec3A,
    pub direction: f32,
}

/// Measures the time between consecutive frames.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_tick: Option<Instant>,
}

impl FrameClock {
    /// Seconds since the previous tick, zero on the first one.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = self
            .last_tick
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_tick = Some(now);
        elapsed
    }
}

/// Drives one frame at a time: reset, physics, scene sync, ray tracing, overlay and
/// diagnostics.
#[derive(Debug)]
pub struct FrameOrchestrator<P: PhysicsWorld = ParticleWorld> {
    config: RenderConfig,
    scene: RenderScene,
    physics: P,
    bindings: Vec<SphereBinding>,

    camera: Camera,
    scheduler: TileScheduler,
    overlay: CubeOverlay,
    frame: FrameBuffer,
    stats: StatsStrip,

    clock: FrameClock,
    rng: StdRng,
    total_time: f32,
    since_reset: f32,
    frame_index: u64,
}

impl FrameOrchestrator<ParticleWorld> {
    pub fn from_setup(config: RenderConfig, setup: SceneSetup) -> Result<Self, ConfigError> {
        FrameOrchestrator::new(config, setup.scene, setup.physics, setup.bindings)
    }
}

impl<P: PhysicsWorld> FrameOrchestrator<P> {
    pub fn new(
        config: RenderConfig,
        scene: RenderScene,
        physics: P,
        bindings: Vec<SphereBinding>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        scene.validate()?;

        for binding in &bindings {
            if binding.body >= physics.body_count() {
                return Err(ConfigError::UnknownBody {
                    sphere: binding.sphere,
                    body: binding.body,
                });
            }
            if binding.sphere >= scene.spheres.len() {
                return Err(ConfigError::InvalidSphere {
                    index: binding.sphere,
                    reason: "bound to physics but missing from the scene".to_string(),
                });
            }
        }

        let camera = Camera::new(config.width, config.height, config.vertical_fov)?
            .with_orbit(config.orbit_center, config.orbit_offset);

        let scheduler = TileScheduler::new(
            config.height as usize,
            config.band_size,
            config.worker_threads,
        )?;

        info!(
            "rendering {}x{} in {} bands on {} threads, {} spheres",
            config.width,
            config.height,
            scheduler.bands().len(),
            scheduler.worker_threads(),
            scene.spheres.len()
        );

        Ok(FrameOrchestrator {
            overlay: CubeOverlay::new(
                config.width as usize,
                config.height as usize,
                config.overlay_angle_step,
            ),
            frame: FrameBuffer::new(config.width as usize, config.height as usize, CLEAR_COLOR),
            stats: StatsStrip::new(config.stats_width as usize, config.stats_height as usize),
            clock: FrameClock::default(),
            rng: StdRng::seed_from_u64(config.seed),
            total_time: 0.0,
            since_reset: 0.0,
            frame_index: 0,
            config,
            scene,
            physics,
            bindings,
            camera,
            scheduler,
        })
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn stats(&self) -> &StatsStrip {
        &self.stats
    }

    pub fn scene(&self) -> &RenderScene {
        &self.scene
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scheduler(&self) -> &TileScheduler {
        &self.scheduler
    }

    /// Runs a frame with the wall-clock time since the previous one.
    pub fn tick(&mut self) -> FrameStats {
        let elapsed = self.clock.tick();
        self.run_frame(elapsed)
    }

    pub fn run_frame(&mut self, elapsed: f32) -> FrameStats {
        let start_time = Instant::now();

        self.total_time += elapsed;
        self.since_reset += elapsed;
        if self.since_reset > self.config.reset_interval {
            self.since_reset = 0.0;
            self.reset_scene();
        }

        self.physics.advance(elapsed);
        self.sync_scene();

        self.camera
            .set_orbit_angle(self.total_time * self.config.orbit_speed);
        self.scheduler
            .render_frame(self.frame.as_bytes_mut(), &self.scene, &self.camera);

        self.overlay.draw(&mut self.frame);
        self.overlay.advance();

        let stats = FrameStats {
            duration: start_time.elapsed().as_secs_f32(),
            total_time: self.total_time,
            frame_index: self.frame_index,
        };
        self.frame_index += 1;

        if stats.duration > self.config.frame_budget {
            warn!(
                "frame {} took {:.2}ms, budget is {:.2}ms",
                stats.frame_index,
                stats.duration * 1000.0,
                self.config.frame_budget * 1000.0
            );
        }
        debug!("{stats}");

        self.stats.record(stats);
        stats
    }

    fn reset_scene(&mut self) {
        let spread = self.config.reset_spread;
        let offset = if spread > 0 {
            self.rng.gen_range(-spread..spread) as f32
        } else {
            0.0
        };

        debug!("resetting scene with offset {offset}");

        for binding in &self.bindings {
            if let Some(placement) = binding.reset {
                let position = placement.home + Vec3A::Y * offset * placement.direction;
                self.physics.reset_body(binding.body, position);
            }
        }
    }

    fn sync_scene(&mut self) {
        for binding in &self.bindings {
            self.scene.spheres[binding.sphere].center = self.physics.position(binding.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Sphere;
    use glam::vec3a;

    /// Bodies that move up by one unit per advance call.
    #[derive(Debug, Default)]
    struct ScriptedPhysics {
        positions: Vec<Vec3A>,
        advanced: Vec<f32>,
        resets: Vec<(usize, Vec3A)>,
    }

    impl PhysicsWorld for ScriptedPhysics {
        fn advance(&mut self, seconds: f32) {
            self.advanced.push(seconds);
            for position in &mut self.positions {
                position.y += 1.0;
            }
        }

        fn body_count(&self) -> usize {
            self.positions.len()
        }

        fn position(&self, body: usize) -> Vec3A {
            self.positions[body]
        }

        fn reset_body(&mut self, body: usize, position: Vec3A) {
            self.resets.push((body, position));
            self.positions[body] = position;
        }
    }

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 32,
            height: 20,
            band_size: 6,
            worker_threads: Some(2),
            stats_width: 16,
            stats_height: 8,
            frame_budget: f32::MAX,
            ..RenderConfig::default()
        }
    }

    fn orchestrator() -> FrameOrchestrator<ScriptedPhysics> {
        let scene = RenderScene::new(vec![
            Sphere::new(vec3a(0.0, 0.0, -20.0), 2.0, vec3a(0.9, 0.5, 0.1), 0.0, 0.0),
            Sphere::light(vec3a(10.0, 20.0, -20.0), 1.0, Vec3A::splat(3.0)),
        ]);
        let physics = ScriptedPhysics {
            positions: vec![vec3a(0.0, 0.0, -20.0)],
            ..ScriptedPhysics::default()
        };
        let bindings = vec![SphereBinding {
            sphere: 0,
            body: 0,
            reset: Some(ResetPlacement {
                home: vec3a(0.0, 0.0, -20.0),
                direction: -1.0,
            }),
        }];

        FrameOrchestrator::new(small_config(), scene, physics, bindings).unwrap()
    }

    #[test]
    fn physics_positions_reach_the_scene() {
        let mut orchestrator = orchestrator();

        orchestrator.run_frame(0.1);
        orchestrator.run_frame(0.1);

        assert_eq!(orchestrator.physics().advanced, vec![0.1, 0.1]);
        assert_eq!(
            orchestrator.scene().spheres[0].center,
            vec3a(0.0, 2.0, -20.0)
        );
        // unbound spheres are left alone
        assert_eq!(
            orchestrator.scene().spheres[1].center,
            vec3a(10.0, 20.0, -20.0)
        );
    }

    #[test]
    fn scene_resets_after_interval() {
        let mut orchestrator = orchestrator();

        orchestrator.run_frame(3.0);
        assert!(orchestrator.physics().resets.is_empty());

        orchestrator.run_frame(3.0);
        let resets = &orchestrator.physics().resets;
        assert_eq!(resets.len(), 1);

        let (body, position) = resets[0];
        assert_eq!(body, 0);
        assert_eq!(position.x, 0.0);
        assert_eq!(position.z, -20.0);
        assert!((-5.0..=5.0).contains(&position.y));
        assert_eq!(position.y.fract(), 0.0);

        // the reset happens before the physics step of the same frame
        assert_eq!(
            orchestrator.scene().spheres[0].center,
            position + Vec3A::Y
        );
    }

    #[test]
    fn frames_are_counted_and_plotted() {
        let mut orchestrator = orchestrator();

        let first = orchestrator.run_frame(0.25);
        let second = orchestrator.run_frame(0.25);

        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
        assert_eq!(second.total_time, 0.5);
        assert_eq!(orchestrator.stats().last(), second);
    }

    #[test]
    fn frame_is_fully_rendered() {
        let mut orchestrator = orchestrator();
        orchestrator.run_frame(0.0);

        let frame = orchestrator.frame();
        assert_eq!(frame.width(), 32);
        assert_eq!(frame.height(), 20);

        // the clear color never survives a traced frame
        for y in 0..20 {
            for x in 0..32 {
                assert_ne!(frame.pixel(x, y), CLEAR_COLOR);
            }
        }
    }

    #[test]
    fn bindings_must_match_physics_bodies() {
        let scene = RenderScene::new(vec![Sphere::new(
            Vec3A::ZERO,
            1.0,
            Vec3A::ONE,
            0.0,
            0.0,
        )]);
        let bindings = vec![SphereBinding {
            sphere: 0,
            body: 3,
            reset: None,
        }];

        let result =
            FrameOrchestrator::new(small_config(), scene, ScriptedPhysics::default(), bindings);
        assert!(matches!(
            result,
            Err(ConfigError::UnknownBody { sphere: 0, body: 3 })
        ));
    }

    #[test]
    fn clock_starts_at_zero() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(), 0.0);
        assert!(clock.tick() >= 0.0);
    }
}
