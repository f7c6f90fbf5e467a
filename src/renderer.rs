use glam::Vec3A;

use super::camera::Ray;
use super::scene::{RenderScene, Sphere};

pub const MAX_RAY_DEPTH: u32 = 5;

/// Offset applied to secondary ray origins so they don't hit the surface they leave.
pub const BIAS: f32 = 0.0001;

pub const INDEX_OF_REFRACTION: f32 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HitPayload {
    hit_distance: f32,
    world_position: Vec3A,
    world_normal: Vec3A,
    inside: bool,

    object_index: usize,
}

/// Color seen along `ray`, following reflection and refraction up to [`MAX_RAY_DEPTH`].
///
/// Only reads the scene, so it can be called from any number of threads at once.
pub fn trace(scene: &RenderScene, ray: &Ray, depth: u32) -> Vec3A {
    let Some(hit_payload) = trace_ray(scene, ray) else {
        return scene.sky_color;
    };

    let sphere = &scene.spheres[hit_payload.object_index];

    let surface_color = if sphere.is_specular() && depth < MAX_RAY_DEPTH {
        specular_color(scene, ray, &hit_payload, sphere, depth)
    } else {
        diffuse_color(scene, &hit_payload, sphere)
    };

    surface_color + sphere.emission_color
}

fn trace_ray(scene: &RenderScene, ray: &Ray) -> Option<HitPayload> {
    let mut hit_distance = f32::INFINITY;
    let mut closest_sphere_index: Option<usize> = None;

    for (sphere_index, sphere) in scene.spheres.iter().enumerate() {
        if let Some(current_t) = sphere.intersect(ray.origin, ray.direction) {
            if current_t < hit_distance {
                hit_distance = current_t;
                closest_sphere_index = Some(sphere_index);
            }
        }
    }

    closest_sphere_index.map(|object_index| closest_hit(scene, ray, hit_distance, object_index))
}

fn closest_hit(scene: &RenderScene, ray: &Ray, hit_distance: f32, object_index: usize) -> HitPayload {
    let closest_sphere = &scene.spheres[object_index];

    let hit_point = ray.origin + ray.direction * hit_distance;
    let mut sphere_normal = (hit_point - closest_sphere.center).normalize();

    // the normal has to face the incoming ray, otherwise we started inside the sphere
    let inside = ray.direction.dot(sphere_normal) > 0.0;
    if inside {
        sphere_normal = -sphere_normal;
    }

    HitPayload {
        hit_distance,
        world_position: hit_point,
        world_normal: sphere_normal,
        inside,
        object_index,
    }
}

fn specular_color(
    scene: &RenderScene,
    ray: &Ray,
    hit_payload: &HitPayload,
    sphere: &Sphere,
    depth: u32,
) -> Vec3A {
    let normal = hit_payload.world_normal;
    let facing_ratio = -ray.direction.dot(normal);

    let mut fresnel_effect = mix((1.0 - facing_ratio).powi(3), 1.0, 0.1);

    let reflection_ray = Ray {
        origin: hit_payload.world_position + normal * BIAS,
        direction: reflect_ray(ray.direction, normal).normalize(),
    };
    let reflection = trace(scene, &reflection_ray, depth + 1);

    let mut refraction = Vec3A::ZERO;

    if sphere.transparency != 0.0 {
        match refract_ray(ray.direction, normal, hit_payload.inside) {
            Some(direction) => {
                let refraction_ray = Ray {
                    origin: hit_payload.world_position - normal * BIAS,
                    direction,
                };
                refraction = trace(scene, &refraction_ray, depth + 1);
            }
            // total internal reflection, everything goes to the reflected ray
            None => fresnel_effect = 1.0,
        }
    }

    (reflection * fresnel_effect + refraction * (1.0 - fresnel_effect) * sphere.transparency)
        * sphere.surface_color
}

fn diffuse_color(scene: &RenderScene, hit_payload: &HitPayload, sphere: &Sphere) -> Vec3A {
    let shadow_origin = hit_payload.world_position + hit_payload.world_normal * BIAS;
    let mut color = Vec3A::ZERO;

    for (light_index, light) in scene.lights() {
        if light_index == hit_payload.object_index {
            continue;
        }

        let to_light = light.center - hit_payload.world_position;
        let light_distance = to_light.length();
        let light_direction = to_light / light_distance;

        let occluded = scene
            .spheres
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != light_index)
            .any(|(_, blocker)| {
                blocker
                    .intersect(shadow_origin, light_direction)
                    .is_some_and(|t| t > 0.0 && t < light_distance)
            });

        if occluded {
            continue;
        }

        color += sphere.surface_color
            * hit_payload.world_normal.dot(light_direction).max(0.0)
            * light.emission_color;
    }

    color
}

fn mix(a: f32, b: f32, mix: f32) -> f32 {
    b * mix + a * (1.0 - mix)
}

fn reflect_ray(ray: Vec3A, normal: Vec3A) -> Vec3A {
    ray - (2.0 * ray.dot(normal) * normal)
}

/// Snell's law through a surface whose normal faces the incoming ray.
///
/// Returns `None` on total internal reflection.
fn refract_ray(ray: Vec3A, normal: Vec3A, inside: bool) -> Option<Vec3A> {
    let eta = if inside {
        INDEX_OF_REFRACTION
    } else {
        1.0 / INDEX_OF_REFRACTION
    };
    let cos_incidence = -normal.dot(ray);
    let k = 1.0 - eta * eta * (1.0 - cos_incidence * cos_incidence);

    if k < 0.0 {
        return None;
    }

    Some((ray * eta + normal * (eta * cos_incidence - k.sqrt())).normalize())
}
