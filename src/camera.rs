use glam::{vec2, vec3a, Mat4, Vec2, Vec3A};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3A,
    pub direction: Vec3A,
}

impl Ray {
    /// `direction` is normalized here so callers can pass any non-zero vector.
    pub fn new(origin: Vec3A, direction: Vec3A) -> Ray {
        Ray {
            origin,
            direction: direction.normalize(),
        }
    }
}

/// Pinhole camera circling a fixed point around the Y axis.
#[derive(Debug, Clone)]
pub struct Camera {
    pub orbit_center: Vec3A,
    pub orbit_offset: Vec3A,
    pub position: Vec3A,
    ray_directions: Vec<Vec3A>,

    vertical_fov: f32,
    orbit_angle: f32,
    orbit: Mat4,

    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Camera {
    pub fn new(width: u32, height: u32, vertical_fov: f32) -> Result<Camera, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyImage { width, height });
        }
        if !(vertical_fov > 0.0 && vertical_fov < 180.0) {
            return Err(ConfigError::FieldOfView(vertical_fov));
        }

        let mut camera = Camera {
            orbit_center: vec3a(0.0, 5.0, -25.0),
            orbit_offset: vec3a(0.0, 5.0, 25.0),
            position: Vec3A::ZERO,
            ray_directions: vec![],

            vertical_fov,
            orbit_angle: 0.0,
            orbit: Mat4::IDENTITY,

            viewport_width: width,
            viewport_height: height,
        };

        camera.recalculate_ray_directions();
        camera.set_orbit_angle(0.0);
        Ok(camera)
    }

    pub fn with_orbit(mut self, center: Vec3A, offset: Vec3A) -> Camera {
        self.orbit_center = center;
        self.orbit_offset = offset;
        self.set_orbit_angle(self.orbit_angle);
        self
    }

    pub fn orbit_angle(&self) -> f32 {
        self.orbit_angle
    }

    /// Rotates the camera (position and view directions) by `angle` radians around the
    /// orbit center.
    pub fn set_orbit_angle(&mut self, angle: f32) {
        self.orbit_angle = angle;
        self.orbit = Mat4::from_rotation_y(-angle);

        let rotated_offset: Vec3A = (self.orbit * self.orbit_offset.extend(0.0)).truncate().into();
        self.position = self.orbit_center + rotated_offset;
    }

    fn recalculate_ray_directions(&mut self) {
        let width = self.viewport_width as f32;
        let height = self.viewport_height as f32;

        let aspect_ratio = width / height;
        let angle = (self.vertical_fov.to_radians() * 0.5).tan();

        self.ray_directions.clear();
        self.ray_directions
            .reserve((self.viewport_width * self.viewport_height) as usize);

        for y in 0..self.viewport_height {
            for x in 0..self.viewport_width {
                // pixel centers mapped into -1..1, y pointing up
                let normalized_coord = vec2(
                    2.0 * ((x as f32 + 0.5) / width) - 1.0,
                    1.0 - 2.0 * ((y as f32 + 0.5) / height),
                );
                let film = normalized_coord * angle * Vec2::new(aspect_ratio, 1.0);

                // caching the camera space directions, only the orbit changes per frame
                self.ray_directions
                    .push(vec3a(film.x, film.y, -1.0).normalize());
            }
        }
    }

    pub fn primary_ray(&self, x: u32, y: u32) -> Ray {
        let local = self.ray_directions[(x + y * self.viewport_width) as usize];
        let direction: Vec3A = (self.orbit * local.extend(0.0)).truncate().into();

        Ray {
            origin: self.position,
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_setups_are_rejected() {
        assert!(matches!(
            Camera::new(0, 10, 80.0),
            Err(ConfigError::EmptyImage { .. })
        ));
        assert!(matches!(
            Camera::new(10, 10, 180.0),
            Err(ConfigError::FieldOfView(_))
        ));
        assert!(Camera::new(10, 10, 0.0).is_err());
    }

    #[test]
    fn center_ray_looks_down_negative_z_before_orbiting() {
        // odd dimensions so a pixel center sits exactly on the optical axis
        let camera = Camera::new(3, 3, 80.0).unwrap();
        let ray = camera.primary_ray(1, 1);

        assert!((ray.direction - vec3a(0.0, 0.0, -1.0)).length() < 1e-6);
        assert!((ray.origin - vec3a(0.0, 10.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn top_left_ray_points_up_and_left() {
        let camera = Camera::new(320, 200, 80.0).unwrap();
        let ray = camera.primary_ray(0, 0);

        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y > 0.0);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn orbit_keeps_distance_to_center() {
        let mut camera = Camera::new(16, 16, 80.0).unwrap();
        let radius = camera.orbit_offset.length();

        for step in 0..8 {
            camera.set_orbit_angle(step as f32 * 0.7);
            let distance = (camera.position - camera.orbit_center).length();
            assert!((distance - radius).abs() < 1e-4);

            let ray = camera.primary_ray(5, 9);
            assert!((ray.direction.length() - 1.0).abs() < 1e-5);
        }
    }
}
