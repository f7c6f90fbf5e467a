mod present;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info};

use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use cpu_ray_tracing::config::RenderConfig;
use cpu_ray_tracing::define_scene::define_render_scene;
use cpu_ray_tracing::orchestrator::FrameOrchestrator;

use present::Presenter;

#[derive(Parser, Debug)]
#[command(author, version, about = "CPU Whitted ray tracer of bouncing glass spheres")]
struct Cli {
    #[arg(long, default_value_t = 320)]
    width: u32,
    #[arg(long, default_value_t = 200)]
    height: u32,
    /// rows traced by each parallel task
    #[arg(long, default_value_t = 16)]
    band_size: usize,
    /// render threads, defaults to one per core
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long, default_value_t = 80.0)]
    fov: f32,
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// window pixels per traced pixel
    #[arg(long, default_value_t = 3)]
    scale: u32,
    /// render without a window and save the last frame
    #[arg(long, default_value_t = false)]
    headless: bool,
    #[arg(long, default_value_t = 120)]
    frames: u32,
    #[arg(long, default_value = "frame.png")]
    output: PathBuf,
}

impl Cli {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            width: self.width,
            height: self.height,
            band_size: self.band_size,
            worker_threads: self.threads,
            vertical_fov: self.fov,
            seed: self.seed,
            stats_width: self.width,
            ..RenderConfig::default()
        }
    }
}

pub fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let orchestrator = FrameOrchestrator::from_setup(cli.render_config(), define_render_scene())
        .context("invalid render setup")?;

    if cli.headless {
        return render_headless(orchestrator, cli.frames, &cli.output);
    }

    let event_loop = EventLoop::new().map_err(|error| anyhow!("failed to make eventloop: {error}"))?;

    let window_size = PhysicalSize::new(cli.width * cli.scale.max(1), cli.height * cli.scale.max(1));

    let window = WindowBuilder::new()
        .with_title("cpu ray tracing")
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|error| anyhow!("failed to make window: {error}"))?;

    pollster::block_on(run(event_loop, &window, orchestrator))
}

fn render_headless(mut orchestrator: FrameOrchestrator, frames: u32, output: &Path) -> Result<()> {
    // fixed step so the output only depends on the seed and frame count
    let timestep = 1.0 / 60.0;

    for _ in 0..frames {
        orchestrator.run_frame(timestep);
    }

    let frame = orchestrator.frame();
    let image = image::RgbaImage::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.to_rgba(),
    )
    .context("frame buffer does not match its dimensions")?;

    image
        .save(output)
        .with_context(|| format!("could not write {}", output.display()))?;

    info!(
        "saved frame {} to {} ({})",
        frames,
        output.display(),
        orchestrator.stats().last()
    );
    Ok(())
}

async fn run(
    event_loop: EventLoop<()>,
    window: &Window,
    mut orchestrator: FrameOrchestrator,
) -> Result<()> {
    let frame = orchestrator.frame();
    let mut presenter = Presenter::new(window, frame.width() as u32, frame.height() as u32).await?;

    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run(|event, target| {
            presenter.handle_event(&event);

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => target.exit(),

                    WindowEvent::Resized(new_size) => presenter.resize(new_size),

                    WindowEvent::RedrawRequested => {
                        orchestrator.tick();

                        if let Err(error) =
                            presenter.present(orchestrator.frame(), orchestrator.stats())
                        {
                            error!("presenting the frame failed: {error:#}");
                            target.exit();
                        }
                    }

                    _ => {}
                },

                // one traced frame per pass through the event loop
                Event::AboutToWait => window.request_redraw(),

                _ => {}
            }
        })
        .map_err(|error| anyhow!("event loop failed: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_maps_onto_render_config() {
        let cli = Cli::parse_from([
            "cpu_ray_tracing",
            "--width",
            "64",
            "--height",
            "48",
            "--band-size",
            "5",
            "--threads",
            "3",
        ]);
        let config = cli.render_config();

        assert_eq!(config.width, 64);
        assert_eq!(config.height, 48);
        assert_eq!(config.band_size, 5);
        assert_eq!(config.worker_threads, Some(3));
        assert_eq!(config.stats_width, 64);
        config.validate().unwrap();
    }

    #[test]
    fn defaults_parse() {
        let cli = Cli::parse_from(["cpu_ray_tracing"]);
        assert!(!cli.headless);
        assert_eq!(cli.render_config(), RenderConfig::default());
    }
}
