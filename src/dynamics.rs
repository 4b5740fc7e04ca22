use ode_solvers::SVector;

use crate::body::{Body, SystemState, FIELDS};
use crate::gravity;

/// Flat state of a two-body system as handed to the ODE solver.
pub type FlatState = SVector<f64, { 2 * FIELDS }>;

/// Time derivative of a system state.
///
/// Returned in the shared layout: the mass slot is zero, the position slots
/// carry the input velocities unchanged and the velocity slots carry the
/// pairwise gravitational accelerations.
pub fn derivative(state: &SystemState, softening: f64) -> SystemState {
    let accelerations = gravity::accelerations(&state.bodies, softening);

    let bodies = state
        .bodies
        .iter()
        .zip(accelerations)
        .map(|(body, acceleration)| Body::new(0., body.velocity, acceleration))
        .collect();
    SystemState::new(bodies)
}

/// The vector field of the two-body problem over flat states.
///
/// This is the adapter between [`derivative`] and the solver's calling
/// convention of `(time, flat state) -> flat derivative`.
#[derive(Clone, Copy, Debug)]
pub struct TwoBodyDynamics {
    pub softening: f64,
}

impl TwoBodyDynamics {
    pub fn new(softening: f64) -> Self {
        Self { softening }
    }
}

impl ode_solvers::System<f64, FlatState> for TwoBodyDynamics {
    fn system(&self, _t: f64, y: &FlatState, dy: &mut FlatState) {
        let state = SystemState::from_flat(y.as_slice());
        let deriv = derivative(&state, self.softening);
        dy.copy_from_slice(&deriv.flatten());
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector2;
    use ode_solvers::System;

    use super::{derivative, FlatState, TwoBodyDynamics};
    use crate::body::{Body, SystemState};

    fn sample_state() -> SystemState {
        SystemState::new(vec![
            Body::new(10., Vector2::new(0.5, 0.1), Vector2::new(-0.3, 0.8)),
            Body::new(10., Vector2::new(-0.5, -0.1), Vector2::new(0.3, -0.8)),
        ])
    }

    #[test]
    fn mass_derivative_is_zero() {
        let deriv = derivative(&sample_state(), 0.);
        for body in &deriv.bodies {
            assert_eq!(body.mass, 0.);
        }
    }

    #[test]
    fn position_derivative_copies_velocity_exactly() {
        let state = sample_state();
        let deriv = derivative(&state, 0.);

        // A direct copy, not a computed value.
        for (d, s) in deriv.bodies.iter().zip(&state.bodies) {
            assert_eq!(d.position, s.velocity);
        }
    }

    #[test]
    fn velocity_derivative_matches_kernel() {
        let state = sample_state();
        let deriv = derivative(&state, 0.);
        let acc = crate::gravity::accelerations(&state.bodies, 0.);

        for (d, a) in deriv.bodies.iter().zip(acc) {
            assert_abs_diff_eq!(d.velocity.x, a.x);
            assert_abs_diff_eq!(d.velocity.y, a.y);
        }
    }

    #[test]
    fn flat_system_agrees_with_derivative() {
        let state = sample_state();
        let y = FlatState::from_column_slice(&state.flatten());
        let mut dy = FlatState::zeros();

        TwoBodyDynamics::new(0.).system(0., &y, &mut dy);

        let expected = derivative(&state, 0.).flatten();
        for (got, want) in dy.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want);
        }
    }
}
