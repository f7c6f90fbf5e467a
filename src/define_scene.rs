use glam::{vec3a, Vec3A};

use super::orchestrator::{ResetPlacement, SphereBinding};
use super::physics::{Particle, ParticleWorld};
use super::scene::{RenderScene, Sphere};

pub struct SceneSetup {
    pub scene: RenderScene,
    pub physics: ParticleWorld,
    pub bindings: Vec<SphereBinding>,
}

/// Ground, eight glass and mirror balls stacked in two layers, and one light.
pub fn define_render_scene() -> SceneSetup {
    let ground = Sphere::new(
        vec3a(0.0, -10005.0, -20.0),
        10000.0,
        vec3a(0.20, 0.20, 0.20),
        0.0,
        0.0,
    );

    // position, radius, surface color, reflectivity, transparency
    let balls = [
        Sphere::new(vec3a(0.0, 20.0, -20.0), 4.0, vec3a(1.00, 0.32, 0.36), 1.0, 0.9),
        Sphere::new(vec3a(5.0, 10.0, -15.0), 2.0, vec3a(0.90, 0.76, 0.46), 1.0, 0.9),
        Sphere::new(vec3a(5.0, 10.0, -25.0), 3.0, vec3a(0.65, 0.77, 0.97), 1.0, 0.9),
        Sphere::new(vec3a(-5.5, 10.0, -15.0), 3.0, vec3a(0.90, 0.90, 0.90), 1.0, 0.0),
        Sphere::new(vec3a(0.0, 40.0, -21.0), 6.0, vec3a(0.92, 0.36, 0.26), 1.0, 0.9),
        Sphere::new(vec3a(5.0, 30.0, -15.0), 2.0, vec3a(0.76, 0.72, 0.36), 1.0, 0.9),
        Sphere::new(vec3a(5.0, 30.0, -25.0), 3.0, vec3a(0.65, 0.77, 0.97), 1.0, 0.9),
        Sphere::new(vec3a(-5.5, 30.0, -15.0), 3.0, vec3a(0.60, 0.60, 0.60), 1.0, 0.9),
    ];

    let light = Sphere::light(vec3a(20.0, 30.0, -40.0), 3.0, Vec3A::splat(3.0));

    let mut physics = ParticleWorld::default();
    let mut spheres = vec![ground];
    let mut bindings = vec![SphereBinding {
        sphere: 0,
        body: physics.add_particle(Particle::immovable(ground.center, ground.radius)),
        reset: None,
    }];

    for (index, ball) in balls.into_iter().enumerate() {
        let body = physics.add_particle(Particle::new(ball.center, ball.radius, 10.0));

        spheres.push(ball);
        bindings.push(SphereBinding {
            sphere: spheres.len() - 1,
            body,
            reset: Some(ResetPlacement {
                home: ball.center,
                // neighbours move in opposite directions so they don't all drop together
                direction: if index % 2 == 0 { 1.0 } else { -1.0 },
            }),
        });
    }

    spheres.push(light);

    SceneSetup {
        scene: RenderScene::new(spheres),
        physics,
        bindings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsWorld;

    #[test]
    fn scene_is_valid_and_lit() {
        let setup = define_render_scene();

        setup.scene.validate().unwrap();
        assert_eq!(setup.scene.spheres.len(), 10);
        assert_eq!(setup.scene.lights().count(), 1);
    }

    #[test]
    fn every_binding_starts_in_sync() {
        let setup = define_render_scene();

        assert_eq!(setup.bindings.len(), setup.physics.body_count());
        for binding in &setup.bindings {
            assert_eq!(
                setup.scene.spheres[binding.sphere].center,
                setup.physics.position(binding.body)
            );
        }
        assert!(setup.bindings[0].reset.is_none());
        assert!(setup.bindings[1..].iter().all(|b| b.reset.is_some()));
    }
}
