//! Falling fragments spawned by pruning.
//!
//! A cosmetic approximation: each body is integrated with explicit Euler
//! steps under constant gravity and spins at a fixed angular velocity.

use crate::config::Config;
use crate::scene::SceneGraph;
use glam::{Affine3A, EulerRot, Quat, Vec3};
use rand::Rng;

#[derive(Clone, Debug)]
pub struct DebrisBody {
    /// Detached copy of the pruned part. Its root is re-posed every tick.
    pub fragment: SceneGraph,
    pub position: Vec3,
    /// Euler angles (XYZ order), radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl DebrisBody {
    /// Wraps a fragment whose root already carries its world transform.
    pub fn new(fragment: SceneGraph, velocity: Vec3, angular_velocity: Vec3) -> Self {
        let (scale, rotation, position) = fragment.nodes[0].local.to_scale_rotation_translation();
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        let mut body = Self {
            fragment,
            position,
            rotation: Vec3::new(x, y, z),
            scale,
            velocity,
            angular_velocity,
        };
        body.sync_transform();
        body
    }

    pub fn transform(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(
            self.scale,
            Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z),
            self.position,
        )
    }

    fn sync_transform(&mut self) {
        self.fragment.nodes[0].local = self.transform();
    }

    fn step(&mut self, dt: f32, gravity: f32) {
        self.velocity.y -= gravity * dt;
        self.position += self.velocity * dt;
        self.rotation += self.angular_velocity * dt;
        self.sync_transform();
    }
}

#[derive(Clone, Debug, Default)]
pub struct DebrisSim {
    pub bodies: Vec<DebrisBody>,
}

impl DebrisSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Launches `fragment` with a small random kick and spin.
    pub fn spawn(&mut self, fragment: SceneGraph, rng: &mut impl Rng, cfg: &Config) {
        let lin = cfg.debris_linear_spread;
        let ang = cfg.debris_angular_spread;
        let velocity = Vec3::new(
            rng.random_range(-lin..=lin),
            rng.random_range(0.0..=cfg.debris_upward_speed),
            rng.random_range(-lin..=lin),
        );
        let angular_velocity = Vec3::new(
            rng.random_range(-ang..=ang),
            rng.random_range(-ang..=ang),
            rng.random_range(-ang..=ang),
        );
        self.spawn_body(DebrisBody::new(fragment, velocity, angular_velocity));
    }

    pub fn spawn_body(&mut self, body: DebrisBody) {
        log::debug!(
            "debris spawned at {:?} ({} nodes)",
            body.position,
            body.fragment.len()
        );
        self.bodies.push(body);
    }

    /// Advances every body by `dt` seconds and drops those below the floor.
    ///
    /// Returns how many bodies were removed.
    pub fn tick(&mut self, dt: f32, cfg: &Config) -> usize {
        let before = self.bodies.len();
        self.bodies.retain_mut(|body| {
            body.step(dt, cfg.gravity);
            body.position.y >= cfg.floor_y
        });
        let removed = before - self.bodies.len();
        if removed > 0 {
            log::debug!("{removed} debris bodies fell below {}", cfg.floor_y);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    fn fragment_at(y: f32) -> SceneGraph {
        SceneGraph::new(Affine3A::from_translation(Vec3::new(0.0, y, 0.0)))
    }

    #[test]
    fn body_falls_out_after_crossing_the_floor() {
        let cfg = Config::default();
        let mut sim = DebrisSim::new();
        sim.spawn_body(DebrisBody::new(fragment_at(5.0), Vec3::ZERO, Vec3::ZERO));

        let dt = 0.1;
        // y_n = 5 - g * dt^2 * n(n+1)/2; after 17 steps y ~ -9.994.
        for _ in 0..17 {
            assert_eq!(sim.tick(dt, &cfg), 0);
        }
        assert_eq!(sim.len(), 1);
        assert!(sim.bodies[0].position.y > cfg.floor_y);
        assert!(sim.bodies[0].position.y < -9.9);

        assert_eq!(sim.tick(dt, &cfg), 1);
        assert!(sim.is_empty());
    }

    #[test]
    fn integration_updates_velocity_then_position() {
        let cfg = Config::default();
        let mut sim = DebrisSim::new();
        sim.spawn_body(DebrisBody::new(
            fragment_at(0.0),
            Vec3::new(1.0, 0.0, -2.0),
            Vec3::new(0.5, 0.0, 1.0),
        ));
        sim.tick(0.5, &cfg);

        let b = &sim.bodies[0];
        assert!((b.velocity.y + 4.9).abs() < 1e-5);
        assert!((b.position - Vec3::new(0.5, -2.45, -1.0)).length() < 1e-5);
        assert!((b.rotation - Vec3::new(0.25, 0.0, 0.5)).length() < 1e-5);
        assert!(b.fragment.nodes[0].local.abs_diff_eq(b.transform(), 1e-6));
    }

    #[test]
    fn removal_does_not_skip_neighbours() {
        let cfg = Config::default();
        let mut sim = DebrisSim::new();
        for y in [-9.95, 50.0, -9.99, 40.0, -9.98] {
            sim.spawn_body(DebrisBody::new(fragment_at(y), Vec3::ZERO, Vec3::ZERO));
        }
        assert_eq!(sim.tick(0.1, &cfg), 3);
        let ys: Vec<f32> = sim.bodies.iter().map(|b| b.position.y).collect();
        assert_eq!(ys.len(), 2);
        assert!((ys[0] - (50.0 - 0.098)).abs() < 1e-4);
        assert!((ys[1] - (40.0 - 0.098)).abs() < 1e-4);
    }

    #[test]
    fn random_kick_respects_config() {
        let cfg = Config::default();
        let mut rng = SeededRandom::new(3);
        let mut sim = DebrisSim::new();
        for _ in 0..50 {
            sim.spawn(fragment_at(1.0), &mut rng, &cfg);
        }
        for b in &sim.bodies {
            assert!(b.velocity.x.abs() <= cfg.debris_linear_spread);
            assert!(b.velocity.z.abs() <= cfg.debris_linear_spread);
            assert!((0.0..=cfg.debris_upward_speed).contains(&b.velocity.y));
            assert!(b.angular_velocity.abs().max_element() <= cfg.debris_angular_spread);
            assert!((b.position.y - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn baked_rotation_survives_the_round_trip() {
        let q = Quat::from_euler(EulerRot::XYZ, 0.3, -0.2, 0.7);
        let fragment = SceneGraph::new(Affine3A::from_rotation_translation(q, Vec3::ONE));
        let body = DebrisBody::new(fragment.clone(), Vec3::ZERO, Vec3::ZERO);
        assert!(body.transform().abs_diff_eq(fragment.nodes[0].local, 1e-5));
    }
}
