//! The particle simulation that moves spheres between frames.
//!
//! The renderer only depends on [`PhysicsWorld`]; [`ParticleWorld`] is a small
//! mass-point simulation with gravity and sphere contacts that fulfils it.

use glam::{vec3a, Vec3A};

pub trait PhysicsWorld {
    /// Steps the simulation forward by `seconds`.
    fn advance(&mut self, seconds: f32);

    fn body_count(&self) -> usize;

    fn position(&self, body: usize) -> Vec3A;

    /// Teleports a body and stops it.
    fn reset_body(&mut self, body: usize, position: Vec3A);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3A,
    pub velocity: Vec3A,
    pub radius: f32,
    /// Zero for bodies that never move, like the ground.
    pub inverse_mass: f32,
    pub damping: f32,
}

impl Particle {
    pub fn new(position: Vec3A, radius: f32, mass: f32) -> Particle {
        let inverse_mass = if mass.is_finite() && mass > 0.0 {
            1.0 / mass
        } else {
            0.0
        };

        Particle {
            position,
            velocity: Vec3A::ZERO,
            radius,
            inverse_mass,
            damping: 0.99,
        }
    }

    pub fn immovable(position: Vec3A, radius: f32) -> Particle {
        Particle::new(position, radius, f32::INFINITY)
    }

    fn is_movable(&self) -> bool {
        self.inverse_mass > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct ParticleWorld {
    particles: Vec<Particle>,
    contacts: Vec<(usize, usize)>,
    pub gravity: Vec3A,
    pub restitution: f32,
    max_contacts: usize,
    iterations: usize,
}

impl Default for ParticleWorld {
    fn default() -> ParticleWorld {
        ParticleWorld::new(300, 16)
    }
}

impl ParticleWorld {
    pub fn new(max_contacts: usize, iterations: usize) -> ParticleWorld {
        ParticleWorld {
            particles: vec![],
            contacts: Vec::with_capacity(max_contacts),
            gravity: vec3a(0.0, -9.8 * 4.0, 0.0),
            restitution: 0.4,
            max_contacts,
            iterations,
        }
    }

    /// Adds a particle and returns its body index.
    pub fn add_particle(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn integrate(&mut self, seconds: f32) {
        for particle in self.particles.iter_mut().filter(|p| p.is_movable()) {
            particle.velocity += self.gravity * seconds;
            particle.velocity *= particle.damping.powf(seconds);
            particle.position += particle.velocity * seconds;
        }
    }

    fn generate_contacts(&mut self) {
        self.contacts.clear();

        'search: for a in 0..self.particles.len() {
            for b in (a + 1)..self.particles.len() {
                if self.contacts.len() >= self.max_contacts {
                    break 'search;
                }
                let (pa, pb) = (&self.particles[a], &self.particles[b]);
                if !pa.is_movable() && !pb.is_movable() {
                    continue;
                }
                if penetration(pa, pb) > 0.0 {
                    self.contacts.push((a, b));
                }
            }
        }
    }

    fn resolve_contacts(&mut self) {
        for _ in 0..self.iterations {
            for &(a, b) in &self.contacts {
                let (pa, pb) = (self.particles[a], self.particles[b]);
                let total_inverse_mass = pa.inverse_mass + pb.inverse_mass;
                let depth = penetration(&pa, &pb);
                if depth <= 0.0 || total_inverse_mass <= 0.0 {
                    continue;
                }

                // normal points from b towards a
                let normal = (pa.position - pb.position).try_normalize().unwrap_or(Vec3A::Y);

                let separating_velocity = (pa.velocity - pb.velocity).dot(normal);
                let mut impulse = Vec3A::ZERO;
                if separating_velocity < 0.0 {
                    let target = -separating_velocity * self.restitution;
                    impulse = normal * ((target - separating_velocity) / total_inverse_mass);
                }

                let push = normal * (depth / total_inverse_mass);

                let pa = &mut self.particles[a];
                pa.velocity += impulse * pa.inverse_mass;
                pa.position += push * pa.inverse_mass;

                let pb = &mut self.particles[b];
                pb.velocity -= impulse * pb.inverse_mass;
                pb.position -= push * pb.inverse_mass;
            }
        }
    }
}

fn penetration(a: &Particle, b: &Particle) -> f32 {
    a.radius + b.radius - (a.position - b.position).length()
}

impl PhysicsWorld for ParticleWorld {
    fn advance(&mut self, seconds: f32) {
        if !(seconds > 0.0) {
            return;
        }

        self.integrate(seconds);
        self.generate_contacts();
        self.resolve_contacts();
    }

    fn body_count(&self) -> usize {
        self.particles.len()
    }

    fn position(&self, body: usize) -> Vec3A {
        self.particles[body].position
    }

    fn reset_body(&mut self, body: usize, position: Vec3A) {
        let particle = &mut self.particles[body];
        particle.position = position;
        particle.velocity = Vec3A::ZERO;
    }
}
