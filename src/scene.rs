use glam::Vec3A;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderScene {
    pub spheres: Vec<Sphere>,
    pub sky_color: Vec3A,
}

impl RenderScene {
    pub fn new(spheres: Vec<Sphere>) -> RenderScene {
        RenderScene {
            spheres,
            sky_color: Vec3A::ONE,
        }
    }

    pub fn with_sky_color(mut self, sky_color: Vec3A) -> RenderScene {
        self.sky_color = sky_color;
        self
    }

    pub fn lights(&self) -> impl Iterator<Item = (usize, &Sphere)> {
        self.spheres
            .iter()
            .enumerate()
            .filter(|(_, sphere)| sphere.is_light())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, sphere) in self.spheres.iter().enumerate() {
            sphere.validate(index)?;
        }
        Ok(())
    }
}

/// Whether a sphere only gets lit or also lights the rest of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SphereRole {
    #[default]
    Surface,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3A,
    pub radius: f32,
    pub surface_color: Vec3A,
    pub reflection: f32,
    pub transparency: f32,
    pub emission_color: Vec3A,
    pub role: SphereRole,
}

impl Sphere {
    pub fn new(
        center: Vec3A,
        radius: f32,
        surface_color: Vec3A,
        reflection: f32,
        transparency: f32,
    ) -> Sphere {
        Sphere {
            center,
            radius,
            surface_color,
            reflection,
            transparency,
            emission_color: Vec3A::ZERO,
            role: SphereRole::Surface,
        }
    }

    /// An emissive sphere that also casts light onto diffuse surfaces.
    pub fn light(center: Vec3A, radius: f32, emission_color: Vec3A) -> Sphere {
        Sphere {
            center,
            radius,
            surface_color: Vec3A::ZERO,
            reflection: 0.0,
            transparency: 0.0,
            emission_color,
            role: SphereRole::Light,
        }
    }

    pub fn is_light(&self) -> bool {
        self.role == SphereRole::Light
    }

    pub fn is_specular(&self) -> bool {
        self.reflection > 0.0 || self.transparency > 0.0
    }

    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if !(self.radius > 0.0) {
            return Err(ConfigError::InvalidSphere {
                index,
                reason: format!("radius must be positive, got {}", self.radius),
            });
        }
        if !(0.0..=1.0).contains(&self.reflection) {
            return Err(ConfigError::InvalidSphere {
                index,
                reason: format!("reflection must be in [0, 1], got {}", self.reflection),
            });
        }
        if !(0.0..=1.0).contains(&self.transparency) {
            return Err(ConfigError::InvalidSphere {
                index,
                reason: format!(
                    "transparency must be in [0, 1], got {}",
                    self.transparency
                ),
            });
        }
        Ok(())
    }

    /// Distance along the ray to the nearest non-negative intersection.
    ///
    /// When the ray starts inside the sphere the near root is negative and the far root is
    /// returned instead.
    pub fn intersect(&self, origin: Vec3A, direction: Vec3A) -> Option<f32> {
        // (bx^2 + by^2)t^2 + 2*(axbx + ayby)t + (ax^2 + by^2 - r^2) = 0
        // where
        // a = ray origin relative to the center
        // b = ray direction
        // r = sphere radius
        // t = hit distance
        let offset = origin - self.center;

        let a: f32 = direction.dot(direction);
        let b: f32 = 2.0 * direction.dot(offset);
        let c: f32 = offset.dot(offset) - (self.radius * self.radius);

        let discriminant = b * b - 4. * a * c;
        if discriminant < 0. {
            return None;
        }

        let root = discriminant.sqrt();
        let t0 = (-b - root) / (2. * a);
        let t1 = (-b + root) / (2. * a);

        if t1 < 0. {
            // sphere is entirely behind the ray
            return None;
        }

        Some(if t0 < 0. { t1 } else { t0 })
    }
}
