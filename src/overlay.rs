use std::f32::consts::PI;

use glam::{vec3, Mat4, Vec4};

use crate::framebuffer::{Bgra, FrameBuffer};

pub const OVERLAY_COLOR: Bgra = Bgra::new(195, 94, 65, 255);

const CUBE_VERTICES: [Vec4; 8] = [
    Vec4::new(-1.0, 1.0, 1.0, 1.0),
    Vec4::new(1.0, 1.0, 1.0, 1.0),
    Vec4::new(1.0, -1.0, 1.0, 1.0),
    Vec4::new(-1.0, -1.0, 1.0, 1.0),
    Vec4::new(-1.0, 1.0, -1.0, 1.0),
    Vec4::new(1.0, 1.0, -1.0, 1.0),
    Vec4::new(1.0, -1.0, -1.0, 1.0),
    Vec4::new(-1.0, -1.0, -1.0, 1.0),
];

// front face, back face, then the four edges joining them
const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Spinning wireframe cube drawn over the traced image.
#[derive(Debug, Clone)]
pub struct CubeOverlay {
    pub angle: f32,
    pub angle_step: f32,
    pub color: Bgra,
    view: Mat4,
    projection: Mat4,
}

impl CubeOverlay {
    pub fn new(width: usize, height: usize, angle_step: f32) -> CubeOverlay {
        // squash x so the cube stays square on a wide image
        let aspect_correction = height as f32 / width as f32;

        CubeOverlay {
            angle: 0.0,
            angle_step,
            color: OVERLAY_COLOR,
            view: Mat4::from_translation(vec3(0.0, 0.0, -4.0))
                * Mat4::from_scale(vec3(aspect_correction, 1.0, 1.0)),
            projection: Mat4::perspective_rh_gl(60.0f32.to_radians(), 1.0, 0.1, 1000.0),
        }
    }

    pub fn default_step() -> f32 {
        PI / 32.0
    }

    fn model(&self) -> Mat4 {
        Mat4::from_rotation_x(self.angle) * Mat4::from_rotation_z(self.angle)
    }

    /// Screen coordinates of the eight corners for the current angle.
    pub fn project(&self, width: usize, height: usize) -> [(i32, i32); 8] {
        let model_view_projection = self.projection * self.view * self.model();

        CUBE_VERTICES.map(|vertex| {
            let clip = model_view_projection * vertex;
            let ndc = clip / clip.w;

            let x = (ndc.x + 1.0) / 2.0 * width as f32;
            let y = (1.0 - ndc.y) / 2.0 * height as f32;
            (x as i32, y as i32)
        })
    }

    pub fn draw(&self, frame: &mut FrameBuffer) {
        let corners = self.project(frame.width(), frame.height());

        for (from, to) in CUBE_EDGES {
            frame.draw_line(corners[from], corners[to], self.color);
        }
    }

    pub fn advance(&mut self) {
        self.angle += self.angle_step;
    }
}
