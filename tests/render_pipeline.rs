use cpu_ray_tracing::camera::Camera;
use cpu_ray_tracing::config::RenderConfig;
use cpu_ray_tracing::define_scene::define_render_scene;
use cpu_ray_tracing::framebuffer::{Bgra, FrameBuffer};
use cpu_ray_tracing::orchestrator::FrameOrchestrator;
use cpu_ray_tracing::scheduler::TileScheduler;

const WIDTH: u32 = 80;
const HEIGHT: u32 = 50;

fn render_with(band_size: usize, worker_threads: Option<usize>, orbit_angle: f32) -> FrameBuffer {
    let scene = define_render_scene().scene;
    let mut camera = Camera::new(WIDTH, HEIGHT, 80.0).unwrap();
    camera.set_orbit_angle(orbit_angle);

    let scheduler = TileScheduler::new(HEIGHT as usize, band_size, worker_threads).unwrap();
    let mut frame = FrameBuffer::new(WIDTH as usize, HEIGHT as usize, Bgra::default());
    scheduler.render_frame(frame.as_bytes_mut(), &scene, &camera);
    frame
}

#[test]
fn banding_does_not_change_the_image() {
    for angle in [0.0, 1.3] {
        let single_band = render_with(HEIGHT as usize, Some(1), angle);

        for (band_size, threads) in [(16, None), (7, Some(3)), (1, Some(4)), (49, Some(2))] {
            assert!(
                render_with(band_size, threads, angle) == single_band,
                "band size {band_size} rendered a different image at angle {angle}"
            );
        }
    }
}

#[test]
fn every_pixel_is_written_and_opaque() {
    let frame = render_with(16, None, 0.4);

    for y in 0..HEIGHT as usize {
        for x in 0..WIDTH as usize {
            assert_eq!(frame.pixel(x, y).alpha, 255, "pixel {x},{y} was never traced");
        }
    }
}

#[test]
fn sky_and_ground_are_both_visible() {
    let frame = render_with(16, None, 0.0);

    let white = Bgra::new(255, 255, 255, 255);
    let top_row_sky = (0..WIDTH as usize).any(|x| frame.pixel(x, 0) == white);
    let bottom_row_ground = (0..WIDTH as usize).all(|x| frame.pixel(x, HEIGHT as usize - 1) != white);

    assert!(top_row_sky);
    assert!(bottom_row_ground);
}

fn small_config() -> RenderConfig {
    RenderConfig {
        width: WIDTH,
        height: HEIGHT,
        band_size: 8,
        stats_width: WIDTH,
        frame_budget: f32::MAX,
        ..RenderConfig::default()
    }
}

#[test]
fn spheres_fall_between_frames() {
    let mut orchestrator = FrameOrchestrator::from_setup(small_config(), define_render_scene()).unwrap();
    let start = orchestrator.scene().spheres[1].center;

    for _ in 0..30 {
        orchestrator.run_frame(1.0 / 60.0);
    }

    let after = orchestrator.scene().spheres[1].center;
    assert!(after.y < start.y, "{start} -> {after}");
    // the ground never moves
    assert_eq!(
        orchestrator.scene().spheres[0].center,
        define_render_scene().scene.spheres[0].center
    );
}

#[test]
fn same_seed_same_frames() {
    let mut first = FrameOrchestrator::from_setup(small_config(), define_render_scene()).unwrap();
    let mut second = FrameOrchestrator::from_setup(small_config(), define_render_scene()).unwrap();

    // long enough to pass a scene reset
    for _ in 0..12 {
        first.run_frame(0.5);
        second.run_frame(0.5);
    }

    assert!(first.frame() == second.frame());
    assert_eq!(first.scene(), second.scene());
}

#[test]
fn invalid_config_is_rejected_before_rendering() {
    let config = RenderConfig {
        band_size: 0,
        ..small_config()
    };
    assert!(FrameOrchestrator::from_setup(config, define_render_scene()).is_err());
}
