//! Pixel operations over caller-owned BGRA byte buffers.
//!
//! Every buffer is `width * height * 4` bytes, row-major, with a stride of exactly
//! `width * 4`. The height is always derived from the buffer length.

use bytemuck::{Pod, Zeroable};
use glam::Vec3A;

pub const BYTES_PER_PIXEL: usize = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Bgra {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub alpha: u8,
}

impl Bgra {
    pub const fn new(blue: u8, green: u8, red: u8, alpha: u8) -> Bgra {
        Bgra {
            blue,
            green,
            red,
            alpha,
        }
    }

    /// Opaque pixel from a linear color. Channels are clamped to [0, 1] before scaling.
    pub fn from_color(color: Vec3A) -> Bgra {
        let scaled = color.clamp(Vec3A::ZERO, Vec3A::ONE) * 255.0;
        Bgra::new(scaled.z as u8, scaled.y as u8, scaled.x as u8, 255)
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

pub fn stride(width: usize) -> usize {
    width * BYTES_PER_PIXEL
}

pub fn height_of(buffer: &[u8], width: usize) -> usize {
    match stride(width) {
        0 => 0,
        row => buffer.len() / row,
    }
}

#[inline]
pub fn set_pixel(buffer: &mut [u8], x: usize, y: usize, color: Bgra, width: usize) {
    let offset = (x + y * width) * BYTES_PER_PIXEL;
    buffer[offset..offset + BYTES_PER_PIXEL].copy_from_slice(bytemuck::bytes_of(&color));
}

#[inline]
pub fn get_pixel(buffer: &[u8], x: usize, y: usize, width: usize) -> Bgra {
    let offset = (x + y * width) * BYTES_PER_PIXEL;
    *bytemuck::from_bytes(&buffer[offset..offset + BYTES_PER_PIXEL])
}

/// Bresenham line from `from` to `to`, both ends included.
///
/// Samples that land outside the buffer are skipped, so lines may start or end off-screen.
pub fn draw_line(buffer: &mut [u8], from: (i32, i32), to: (i32, i32), color: Bgra, width: usize) {
    let height = height_of(buffer, width) as i32;
    let width_i = width as i32;

    let (mut x0, mut y0) = from;
    let (x1, y1) = to;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };

    let dy = (y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut err = (if dx > dy { dx } else { -dy }) / 2;

    loop {
        if x0 >= 0 && y0 >= 0 && x0 < width_i && y0 < height {
            set_pixel(buffer, x0 as usize, y0 as usize, color, width);
        }

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = err;

        if e2 > -dx {
            err -= dy;
            x0 += sx;
        }

        if e2 < dy {
            err += dx;
            y0 += sy;
        }
    }
}

pub fn fill(buffer: &mut [u8], color: Bgra, width: usize) {
    let used = height_of(buffer, width) * stride(width);
    let pixels: &mut [Bgra] = bytemuck::cast_slice_mut(&mut buffer[..used]);
    pixels.fill(color);
}

/// Shifts every row `amount` pixels to the left and paints the vacated right-hand columns
/// with `fill_color`.
pub fn scroll_left_and_refill(buffer: &mut [u8], fill_color: Bgra, amount: usize, width: usize) {
    let row_bytes = stride(width);
    if row_bytes == 0 {
        return;
    }
    let shift = amount.min(width);
    let used = height_of(buffer, width) * row_bytes;

    for row in buffer[..used].chunks_exact_mut(row_bytes) {
        row.copy_within(shift * BYTES_PER_PIXEL.., 0);

        let vacated: &mut [Bgra] =
            bytemuck::cast_slice_mut(&mut row[(width - shift) * BYTES_PER_PIXEL..]);
        vacated.fill(fill_color);
    }
}

/// An owned BGRA image together with its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, color: Bgra) -> FrameBuffer {
        let mut frame = FrameBuffer {
            pixels: vec![0; width * height * BYTES_PER_PIXEL],
            width,
            height,
        };
        frame.fill(color);
        frame
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Bgra {
        get_pixel(&self.pixels, x, y, self.width)
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Bgra) {
        set_pixel(&mut self.pixels, x, y, color, self.width);
    }

    pub fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Bgra) {
        draw_line(&mut self.pixels, from, to, color, self.width);
    }

    pub fn fill(&mut self, color: Bgra) {
        fill(&mut self.pixels, color, self.width);
    }

    pub fn scroll_left_and_refill(&mut self, fill_color: Bgra, amount: usize) {
        scroll_left_and_refill(&mut self.pixels, fill_color, amount, self.width);
    }

    /// Same pixels, reordered to RGBA for consumers that don't take BGRA.
    pub fn to_rgba(&self) -> Vec<u8> {
        let pixels: &[Bgra] = bytemuck::cast_slice(&self.pixels);
        pixels.iter().flat_map(|pixel| pixel.to_rgba()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3a;

    const BLACK: Bgra = Bgra::new(0, 0, 0, 255);
    const ORANGE: Bgra = Bgra::new(65, 94, 195, 255);

    fn painted(frame: &FrameBuffer) -> Vec<(usize, usize)> {
        let mut points = vec![];
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                if frame.pixel(x, y) != BLACK {
                    points.push((x, y));
                }
            }
        }
        points
    }

    #[test]
    fn set_pixel_writes_bgra_order() {
        let mut frame = FrameBuffer::new(4, 3, BLACK);
        frame.set_pixel(2, 1, Bgra::new(1, 2, 3, 4));

        let offset = (2 + 4) * 4;
        assert_eq!(&frame.as_bytes()[offset..offset + 4], &[1, 2, 3, 4]);
    }

    #[test]
    fn degenerate_line_writes_one_pixel() {
        let mut frame = FrameBuffer::new(8, 8, BLACK);
        frame.draw_line((0, 0), (0, 0), ORANGE);
        assert_eq!(painted(&frame), vec![(0, 0)]);
    }

    #[test]
    fn horizontal_line_writes_whole_run() {
        let mut frame = FrameBuffer::new(8, 8, BLACK);
        frame.draw_line((0, 0), (5, 0), ORANGE);
        assert_eq!(painted(&frame), (0..=5).map(|x| (x, 0)).collect::<Vec<_>>());
    }

    #[test]
    fn diagonal_line_is_symmetric() {
        let mut forward = FrameBuffer::new(8, 8, BLACK);
        forward.draw_line((1, 1), (6, 6), ORANGE);

        let mut backward = FrameBuffer::new(8, 8, BLACK);
        backward.draw_line((6, 6), (1, 1), ORANGE);

        assert_eq!(painted(&forward), (1..=6).map(|i| (i, i)).collect::<Vec<_>>());
        assert_eq!(forward, backward);
    }

    #[test]
    fn off_screen_samples_are_skipped() {
        let mut frame = FrameBuffer::new(4, 4, BLACK);
        frame.draw_line((-3, 2), (10, 2), ORANGE);
        assert_eq!(painted(&frame), (0..4).map(|x| (x, 2)).collect::<Vec<_>>());

        let mut untouched = FrameBuffer::new(4, 4, BLACK);
        untouched.draw_line((-10, -10), (-2, -5), ORANGE);
        assert!(painted(&untouched).is_empty());
    }

    #[test]
    fn fill_sets_every_pixel() {
        let mut frame = FrameBuffer::new(7, 5, BLACK);
        frame.fill(ORANGE);

        for y in 0..5 {
            for x in 0..7 {
                assert_eq!(frame.pixel(x, y), ORANGE);
            }
        }
    }

    #[test]
    fn scroll_moves_pixels_left_and_refills() {
        let mut frame = FrameBuffer::new(5, 2, BLACK);
        for x in 0..5 {
            frame.set_pixel(x, 1, Bgra::new(x as u8, 0, 0, 255));
        }

        frame.scroll_left_and_refill(ORANGE, 2);

        assert_eq!(frame.pixel(0, 1), Bgra::new(2, 0, 0, 255));
        assert_eq!(frame.pixel(1, 1), Bgra::new(3, 0, 0, 255));
        assert_eq!(frame.pixel(2, 1), Bgra::new(4, 0, 0, 255));
        assert_eq!(frame.pixel(3, 1), ORANGE);
        assert_eq!(frame.pixel(4, 1), ORANGE);
        assert_eq!(frame.pixel(0, 0), BLACK);
    }

    #[test]
    fn scrolling_by_full_width_clears_buffer() {
        let mut frame = FrameBuffer::new(6, 3, ORANGE);
        frame.set_pixel(5, 2, Bgra::new(9, 9, 9, 9));

        frame.scroll_left_and_refill(BLACK, 6);

        assert_eq!(frame, FrameBuffer::new(6, 3, BLACK));
    }

    #[test]
    fn color_conversion_clamps_instead_of_wrapping() {
        let pixel = Bgra::from_color(vec3a(1.7, 0.5, -0.2));
        assert_eq!(pixel, Bgra::new(0, 127, 255, 255));
    }

    #[test]
    fn rgba_export_swaps_channels() {
        let frame = FrameBuffer::new(1, 1, Bgra::new(10, 20, 30, 40));
        assert_eq!(frame.to_rgba(), vec![30, 20, 10, 40]);
    }
}
