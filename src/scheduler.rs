use std::time::Instant;

use log::trace;

use crate::camera::Camera;
use crate::error::ConfigError;
use crate::framebuffer::{self, Bgra};
use crate::renderer;
use crate::scene::RenderScene;

/// Half open row range `[from_row, to_row)` rendered by one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBand {
    pub from_row: usize,
    pub to_row: usize,
}

impl RenderBand {
    pub fn rows(&self) -> usize {
        self.to_row - self.from_row
    }
}

/// Splits `height` rows into consecutive bands of `band_size`, the last one taking
/// whatever is left over.
pub fn partition(height: usize, band_size: usize) -> Vec<RenderBand> {
    assert!(band_size > 0, "band size has to be over 0");

    (0..height)
        .step_by(band_size)
        .map(|from_row| RenderBand {
            from_row,
            to_row: (from_row + band_size).min(height),
        })
        .collect()
}

/// Renders frames by tracing every band of the image as its own task on a dedicated
/// thread pool.
#[derive(Debug)]
pub struct TileScheduler {
    bands: Vec<RenderBand>,
    height: usize,
    thread_pool: rayon::ThreadPool,
}

impl TileScheduler {
    pub fn new(
        height: usize,
        band_size: usize,
        worker_threads: Option<usize>,
    ) -> Result<TileScheduler, ConfigError> {
        if band_size == 0 {
            return Err(ConfigError::ZeroBandSize);
        }

        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("render-band-{index}"));

        if let Some(threads) = worker_threads {
            if threads == 0 {
                return Err(ConfigError::ZeroWorkerThreads);
            }
            builder = builder.num_threads(threads);
        }

        Ok(TileScheduler {
            bands: partition(height, band_size),
            height,
            thread_pool: builder.build()?,
        })
    }

    pub fn bands(&self) -> &[RenderBand] {
        &self.bands
    }

    pub fn worker_threads(&self) -> usize {
        self.thread_pool.current_num_threads()
    }

    /// Traces the whole image into `buffer` and returns once every band is done.
    ///
    /// The buffer must hold exactly `camera.viewport_width` × the height this scheduler
    /// was built for.
    pub fn render_frame(&self, buffer: &mut [u8], scene: &RenderScene, camera: &Camera) {
        let width = camera.viewport_width as usize;
        let row_bytes = framebuffer::stride(width);

        debug_assert_eq!(buffer.len(), row_bytes * self.height);
        debug_assert_eq!(camera.viewport_height as usize, self.height);

        // bands are disjoint row ranges, so each task gets its own slice of the buffer
        let mut band_slices = Vec::with_capacity(self.bands.len());
        let mut rest = buffer;
        for band in &self.bands {
            let (band_pixels, remaining) =
                std::mem::take(&mut rest).split_at_mut(band.rows() * row_bytes);
            band_slices.push((*band, band_pixels));
            rest = remaining;
        }

        self.thread_pool.scope(|scope| {
            for (band, band_pixels) in band_slices {
                scope.spawn(move |_| render_band(band, band_pixels, scene, camera));
            }
        });
    }
}

fn render_band(band: RenderBand, band_pixels: &mut [u8], scene: &RenderScene, camera: &Camera) {
    let start_time = Instant::now();
    let width = camera.viewport_width as usize;

    for y in band.from_row..band.to_row {
        for x in 0..width {
            let ray = camera.primary_ray(x as u32, y as u32);
            let color = renderer::trace(scene, &ray, 0);

            framebuffer::set_pixel(
                band_pixels,
                x,
                y - band.from_row,
                Bgra::from_color(color),
                width,
            );
        }
    }

    trace!(
        "band {}..{} traced in {:.2}ms",
        band.from_row,
        band.to_row,
        start_time.elapsed().as_micros() as f32 / 1000.0
    );
}
