use nalgebra::Vector2;
use rand::rngs::ThreadRng;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use crate::body::{Body, SystemState};
use crate::gravity::G;

/// Source of random initial configurations.
pub trait StateSampler {
    fn sample_state(&mut self) -> SystemState;

    fn sample_states(&mut self, n: usize) -> Vec<SystemState> {
        (0..n).map(|_| self.sample_state()).collect()
    }
}

/// Dirt-simple initializer: every field standard normal, mass overwritten
/// with a fixed constant, positions and velocities re-centered so their mean
/// over all bodies is zero.
#[derive(Clone)]
pub struct RandomStateSampler<R = ThreadRng>
where
    R: Rng,
{
    rng: R,
    num_bodies: usize,
    mass: f64,
}

impl RandomStateSampler<ThreadRng> {
    pub fn new(num_bodies: usize, mass: f64) -> Self {
        Self::with_rng(num_bodies, mass, rand::thread_rng())
    }
}

impl<R: Rng> RandomStateSampler<R> {
    pub fn with_rng(num_bodies: usize, mass: f64, rng: R) -> Self {
        Self {
            rng,
            num_bodies,
            mass,
        }
    }
}

impl<R: Rng> StateSampler for RandomStateSampler<R> {
    fn sample_state(&mut self) -> SystemState {
        let rng = &mut self.rng;
        let normal = StandardNormal;

        let mut bodies: Vec<Body> = (0..self.num_bodies)
            .map(|_| {
                Body::new(
                    self.mass,
                    Vector2::new(normal.sample(rng), normal.sample(rng)),
                    Vector2::new(normal.sample(rng), normal.sample(rng)),
                )
            })
            .collect();

        // Center around (0, 0) and conserve momentum.
        let n = bodies.len() as f64;
        let mean_position: Vector2<f64> = bodies.iter().map(|b| b.position).sum::<Vector2<f64>>() / n;
        let mean_velocity: Vector2<f64> = bodies.iter().map(|b| b.velocity).sum::<Vector2<f64>>() / n;
        for body in &mut bodies {
            body.position -= mean_position;
            body.velocity -= mean_velocity;
        }

        SystemState::new(bodies)
    }
}

/// Two bodies on a near-circular mutual orbit.
///
/// The separation is drawn uniformly from [0.5, 1.5] with a uniformly random
/// orientation. Tangential speeds come from the circular-orbit condition
/// `v_rel = sqrt(G (m1 + m2) / r)`, split between the bodies by mass ratio
/// and scaled by a small uniform jitter so orbits are not perfectly
/// circular. Center of mass and total momentum are zero by construction.
#[derive(Clone)]
pub struct OrbitStateSampler<R = ThreadRng>
where
    R: Rng,
{
    rng: R,
    same_mass: bool,
}

/// Relative speed jitter applied around the circular-orbit velocity.
const ECCENTRICITY_JITTER: f64 = 0.05;

impl OrbitStateSampler<ThreadRng> {
    pub fn new(same_mass: bool) -> Self {
        Self::with_rng(same_mass, rand::thread_rng())
    }
}

impl<R: Rng> OrbitStateSampler<R> {
    pub fn with_rng(same_mass: bool, rng: R) -> Self {
        Self { rng, same_mass }
    }
}

impl<R: Rng> StateSampler for OrbitStateSampler<R> {
    fn sample_state(&mut self) -> SystemState {
        let rng = &mut self.rng;

        let mass1 = 1.;
        let mass2 = if self.same_mass {
            mass1
        } else {
            Uniform::new(0.5, 1.5).sample(rng)
        };
        let total_mass = mass1 + mass2;

        let separation = Uniform::new(0.5, 1.5).sample(rng);
        let phi = Uniform::new(0., std::f64::consts::TAU).sample(rng);
        let radial = Vector2::new(phi.cos(), phi.sin());
        let tangential = Vector2::new(-phi.sin(), phi.cos());

        let jitter = 1. + Uniform::new(-ECCENTRICITY_JITTER, ECCENTRICITY_JITTER).sample(rng);
        let v_rel = (G * total_mass / separation).sqrt() * jitter;

        // Each body sits and moves opposite the other, weighted so that the
        // center of mass stays at the origin and total momentum vanishes.
        let body1 = Body::new(
            mass1,
            radial * separation * mass2 / total_mass,
            tangential * v_rel * mass2 / total_mass,
        );
        let body2 = Body::new(
            mass2,
            -radial * separation * mass1 / total_mass,
            -tangential * v_rel * mass1 / total_mass,
        );

        SystemState::new(vec![body1, body2])
    }
}
