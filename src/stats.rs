use std::fmt;

use crate::framebuffer::{Bgra, FrameBuffer};

pub const STRIP_BACKGROUND: Bgra = Bgra::new(32, 32, 32, 255);
pub const STRIP_PLOT: Bgra = Bgra::new(0, 255, 0, 255);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Seconds spent on the last frame.
    pub duration: f32,
    /// Seconds since the first frame.
    pub total_time: f32,
    pub frame_index: u64,
}

impl FrameStats {
    pub fn fps(&self) -> f32 {
        if self.duration > 0.0 {
            1.0 / self.duration
        } else {
            0.0
        }
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RenderDuration: {:.2}ms; FPS: {:.0}; TotalTime: {:.3}sec",
            self.duration * 1000.0,
            self.fps(),
            self.total_time
        )
    }
}

/// Rolling frame time graph, one column per frame and one row per millisecond.
///
/// New samples enter on the right; row 0 is 0 ms.
#[derive(Debug, Clone)]
pub struct StatsStrip {
    pixels: FrameBuffer,
    last: FrameStats,
}

impl StatsStrip {
    pub fn new(width: usize, height: usize) -> StatsStrip {
        StatsStrip {
            pixels: FrameBuffer::new(width, height, STRIP_BACKGROUND),
            last: FrameStats::default(),
        }
    }

    pub fn pixels(&self) -> &FrameBuffer {
        &self.pixels
    }

    pub fn last(&self) -> FrameStats {
        self.last
    }

    pub fn record(&mut self, stats: FrameStats) {
        self.last = stats;
        self.pixels.scroll_left_and_refill(STRIP_BACKGROUND, 1);

        let milliseconds = (stats.duration * 1000.0) as i64;
        if milliseconds >= 0 && (milliseconds as usize) < self.pixels.height() {
            let x = self.pixels.width() - 1;
            self.pixels.set_pixel(x, milliseconds as usize, STRIP_PLOT);
        }
    }
}
