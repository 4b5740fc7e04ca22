use std::fs;
use std::path::PathBuf;

use log::debug;
use nalgebra::DMatrix;
use ode_solvers::dop853::Dop853;

use crate::body::{SystemState, FIELDS};
use crate::dynamics::{derivative, FlatState, TwoBodyDynamics};
use crate::error::DatasetError;
use crate::init::StateSampler;
use crate::plot::plot_trajectory;

/// Aligned training data: one flattened state per row of `x`, its time
/// derivative in the same row of `dx`.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub x: DMatrix<f64>,
    pub dx: DMatrix<f64>,
}

impl Dataset {
    fn from_rows(x_rows: &[Vec<f64>], dx_rows: &[Vec<f64>], width: usize) -> Self {
        let x_flat: Vec<f64> = x_rows.iter().flatten().copied().collect();
        let dx_flat: Vec<f64> = dx_rows.iter().flatten().copied().collect();
        Self {
            x: DMatrix::from_row_slice(x_rows.len(), width, &x_flat),
            dx: DMatrix::from_row_slice(dx_rows.len(), width, &dx_flat),
        }
    }
}

/// Parameters of batch generation by rejection sampling.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Bodies per sampled state.
    pub num_bodies: usize,
    /// Fixed mass assigned to every body.
    pub mass: f64,
    /// A candidate is accepted when every acceleration component stays
    /// strictly below this bound in absolute value.
    pub accel_threshold: f64,
    /// Attempt budget per sample before giving up.
    pub max_attempts: usize,
    /// Softening passed to the gravity kernel.
    pub softening: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_bodies: 2,
            mass: 10.,
            accel_threshold: 3.,
            max_attempts: 1000,
            softening: 0.,
        }
    }
}

/// Draw `size` independent `(state, derivative)` pairs.
///
/// Candidates whose accelerations exceed the threshold are rejected and
/// redrawn, up to `max_attempts` per sample. Accepted samples are appended
/// in draw order.
pub fn sample_batch(
    size: usize,
    config: &BatchConfig,
    sampler: &mut impl StateSampler,
) -> Result<Dataset, DatasetError> {
    let mut x_rows = Vec::with_capacity(size);
    let mut dx_rows = Vec::with_capacity(size);

    for _ in 0..size {
        let (state, deriv) = sample_below_threshold(config, sampler)?;
        x_rows.push(state.flatten());
        dx_rows.push(deriv.flatten());
    }

    Ok(Dataset::from_rows(
        &x_rows,
        &dx_rows,
        config.num_bodies * FIELDS,
    ))
}

fn sample_below_threshold(
    config: &BatchConfig,
    sampler: &mut impl StateSampler,
) -> Result<(SystemState, SystemState), DatasetError> {
    for attempt in 1..=config.max_attempts {
        let state = sampler.sample_state();
        let deriv = derivative(&state, config.softening);

        let max_accel = deriv
            .bodies
            .iter()
            .flat_map(|b| [b.velocity.x.abs(), b.velocity.y.abs()])
            .fold(0., f64::max);
        if max_accel < config.accel_threshold {
            if attempt > 1 {
                debug!("accepted sample after {attempt} attempts");
            }
            return Ok((state, deriv));
        }
    }

    Err(DatasetError::RejectionLimit {
        attempts: config.max_attempts,
        threshold: config.accel_threshold,
    })
}

/// Parameters of trajectory-based generation.
#[derive(Clone, Debug)]
pub struct OrbitConfig {
    /// Number of independent orbits.
    pub samples: usize,
    /// Time horizon; each orbit is integrated over [0, t_end].
    pub t_end: f64,
    /// Evaluation points per orbit, evenly spaced from 0 to t_end inclusive.
    pub points: usize,
    /// Relative tolerance of the solver. Kept tight so the generated orbits
    /// stay physically plausible over the full horizon; the high-order
    /// solver reaches it within its step budget.
    pub rtol: f64,
    /// Absolute tolerance of the solver.
    pub atol: f64,
    /// Softening passed to the gravity kernel.
    pub softening: f64,
    /// If set, one PNG per orbit is rendered into this directory, named by
    /// orbit index.
    pub plot_dir: Option<PathBuf>,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            samples: 500,
            t_end: 20.,
            points: 50,
            rtol: 1e-14,
            atol: 1e-6,
            softening: 0.,
            plot_dir: None,
        }
    }
}

/// One simulated orbit: the initial state, the trajectory sampled at the
/// requested times and the derivative at every instant.
#[derive(Clone, Debug)]
pub struct Orbit {
    pub initial: SystemState,
    pub trajectory: Vec<SystemState>,
    pub derivatives: Vec<SystemState>,
}

/// Trajectory-based training data together with its generation parameters.
#[derive(Clone, Debug)]
pub struct OrbitDataset {
    pub x: DMatrix<f64>,
    pub dx: DMatrix<f64>,
    pub meta: OrbitConfig,
}

/// Integrate one orbit from `initial` and evaluate its derivatives.
///
/// With a single evaluation point no integration happens and the trajectory
/// is the initial state alone. The last evaluated instant sits at
/// `t_end · (1 - 1e-12)` rather than exactly `t_end`; see the output-step
/// note below.
pub fn simulate_orbit(
    initial: SystemState,
    index: usize,
    config: &OrbitConfig,
) -> Result<Orbit, DatasetError> {
    let trajectory = if config.points > 1 {
        let y0 = FlatState::from_column_slice(&initial.flatten());
        // Shrink the output step by one ulp-scale factor so the last grid
        // time cannot round past t_end and get dropped from the dense
        // output. The final instant therefore lands a relative 1e-12 short
        // of t_end, far below the solver tolerance.
        let dt_out = config.t_end / (config.points - 1) as f64 * (1. - 1e-12);

        let mut stepper = Dop853::new(
            TwoBodyDynamics::new(config.softening),
            0.,
            config.t_end,
            dt_out,
            y0,
            config.rtol,
            config.atol,
        );
        let stats = stepper
            .integrate()
            .map_err(|e| DatasetError::Integration {
                orbit: index,
                reason: e.to_string(),
            })?;
        debug!("orbit {index}: {stats}");

        stepper
            .y_out()
            .iter()
            .take(config.points)
            .map(|y| SystemState::from_flat(y.as_slice()))
            .collect()
    } else {
        vec![initial.clone()]
    };

    let derivatives = trajectory
        .iter()
        .map(|instant| derivative(instant, config.softening))
        .collect();

    Ok(Orbit {
        initial,
        trajectory,
        derivatives,
    })
}

/// Generate a trajectory dataset from independently simulated orbits.
///
/// Every trajectory instant and its derivative are flattened into aligned
/// rows, orbit-major then time-step-minor. If `plot_dir` is set the
/// directory is created idempotently and each orbit is rendered to
/// `{index}.png`.
pub fn orbit_dataset(
    config: &OrbitConfig,
    sampler: &mut impl StateSampler,
) -> Result<OrbitDataset, DatasetError> {
    let mut orbits = Vec::with_capacity(config.samples);
    for index in 0..config.samples {
        let initial = sampler.sample_state();
        orbits.push(simulate_orbit(initial, index, config)?);
    }

    let mut x_rows = Vec::new();
    let mut dx_rows = Vec::new();
    for orbit in &orbits {
        for (instant, deriv) in orbit.trajectory.iter().zip(&orbit.derivatives) {
            x_rows.push(instant.flatten());
            dx_rows.push(deriv.flatten());
        }
    }
    let width = x_rows.first().map_or(0, Vec::len);
    let dataset = Dataset::from_rows(&x_rows, &dx_rows, width);

    if let Some(dir) = &config.plot_dir {
        fs::create_dir_all(dir).map_err(|source| DatasetError::PlotDir {
            path: dir.clone(),
            source,
        })?;
        for (index, orbit) in orbits.iter().enumerate() {
            plot_trajectory(&orbit.trajectory, dir.join(format!("{index}.png")))?;
        }
    }

    Ok(OrbitDataset {
        x: dataset.x,
        dx: dataset.dx,
        meta: config.clone(),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{orbit_dataset, sample_batch, simulate_orbit, BatchConfig, OrbitConfig};
    use crate::error::DatasetError;
    use crate::init::{OrbitStateSampler, RandomStateSampler, StateSampler};

    #[test]
    fn batch_has_requested_shape() {
        let config = BatchConfig::default();
        let mut sampler = RandomStateSampler::with_rng(2, config.mass, StdRng::seed_from_u64(0));

        let data = sample_batch(5, &config, &mut sampler).unwrap();

        assert_eq!(data.x.shape(), (5, 10));
        assert_eq!(data.dx.shape(), (5, 10));
    }

    #[test]
    fn batch_accelerations_stay_below_threshold() {
        let config = BatchConfig::default();
        let mut sampler = RandomStateSampler::with_rng(2, config.mass, StdRng::seed_from_u64(1));

        let data = sample_batch(20, &config, &mut sampler).unwrap();

        // Acceleration components sit in the velocity slots of dx.
        for row in data.dx.row_iter() {
            for body in 0..2 {
                assert!(row[body * 5 + 3].abs() < config.accel_threshold);
                assert!(row[body * 5 + 4].abs() < config.accel_threshold);
            }
        }
    }

    #[test]
    fn batch_rows_pair_state_with_derivative() {
        let config = BatchConfig::default();
        let mut sampler = RandomStateSampler::with_rng(2, config.mass, StdRng::seed_from_u64(2));

        let data = sample_batch(3, &config, &mut sampler).unwrap();

        for i in 0..3 {
            // Mass derivative is zero, position derivative copies velocity.
            for body in 0..2 {
                assert_eq!(data.dx[(i, body * 5)], 0.);
                assert_eq!(data.dx[(i, body * 5 + 1)], data.x[(i, body * 5 + 3)]);
                assert_eq!(data.dx[(i, body * 5 + 2)], data.x[(i, body * 5 + 4)]);
            }
        }
    }

    #[test]
    fn unsatisfiable_threshold_errors_out() {
        let config = BatchConfig {
            accel_threshold: 0.,
            max_attempts: 10,
            ..BatchConfig::default()
        };
        let mut sampler = RandomStateSampler::with_rng(2, config.mass, StdRng::seed_from_u64(3));

        let err = sample_batch(1, &config, &mut sampler).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::RejectionLimit { attempts: 10, .. }
        ));
    }

    #[test]
    fn orbit_dataset_has_orbit_major_shape() {
        let config = OrbitConfig {
            samples: 2,
            t_end: 20.,
            points: 50,
            ..OrbitConfig::default()
        };
        let mut sampler = OrbitStateSampler::with_rng(true, StdRng::seed_from_u64(4));

        let data = orbit_dataset(&config, &mut sampler).unwrap();

        assert_eq!(data.x.shape(), (100, 10));
        assert_eq!(data.dx.shape(), (100, 10));
        assert_eq!(data.meta.samples, 2);
    }

    #[test]
    fn default_config_integrates_to_t_end() {
        // The default tolerances must carry ordinary sampled orbits over the
        // whole horizon, not just loosened ones.
        let config = OrbitConfig::default();

        for seed in 0..8 {
            let mut sampler = OrbitStateSampler::with_rng(true, StdRng::seed_from_u64(seed));
            let orbit = simulate_orbit(sampler.sample_state(), 0, &config)
                .unwrap_or_else(|e| panic!("seed {seed}: {e}"));

            assert_eq!(orbit.trajectory.len(), config.points);
            let last = orbit.trajectory.last().unwrap();
            for body in &last.bodies {
                assert!(body.position.x.is_finite() && body.position.y.is_finite());
            }
        }
    }

    #[test]
    fn trajectory_starts_at_the_initial_state() {
        let config = OrbitConfig {
            points: 10,
            t_end: 2.,
            ..OrbitConfig::default()
        };
        let mut sampler = OrbitStateSampler::with_rng(true, StdRng::seed_from_u64(5));
        let initial = sampler.sample_state();

        let orbit = simulate_orbit(initial.clone(), 0, &config).unwrap();

        assert_eq!(orbit.trajectory.len(), 10);
        assert_eq!(orbit.derivatives.len(), 10);
        for (got, want) in orbit.trajectory[0].bodies.iter().zip(&initial.bodies) {
            assert_abs_diff_eq!(got.position.x, want.position.x, epsilon = 1e-12);
            assert_abs_diff_eq!(got.velocity.y, want.velocity.y, epsilon = 1e-12);
        }
    }

    #[test]
    fn single_point_orbit_skips_integration() {
        let config = OrbitConfig {
            points: 1,
            ..OrbitConfig::default()
        };
        let mut sampler = OrbitStateSampler::with_rng(true, StdRng::seed_from_u64(6));
        let initial = sampler.sample_state();

        let orbit = simulate_orbit(initial.clone(), 0, &config).unwrap();

        assert_eq!(orbit.trajectory.len(), 1);
        assert_eq!(orbit.trajectory[0], initial);
    }

    #[test]
    fn tight_tolerance_preserves_momentum() {
        let config = OrbitConfig {
            points: 50,
            t_end: 20.,
            ..OrbitConfig::default()
        };
        let mut sampler = OrbitStateSampler::with_rng(true, StdRng::seed_from_u64(7));
        let orbit = simulate_orbit(sampler.sample_state(), 0, &config).unwrap();

        // Equal masses: momentum of the pair should stay ~0 along the orbit.
        let last = orbit.trajectory.last().unwrap();
        let momentum_x: f64 = last.bodies.iter().map(|b| b.mass * b.velocity.x).sum();
        let momentum_y: f64 = last.bodies.iter().map(|b| b.mass * b.velocity.y).sum();
        assert_abs_diff_eq!(momentum_x, 0., epsilon = 1e-8);
        assert_abs_diff_eq!(momentum_y, 0., epsilon = 1e-8);
    }

    #[test]
    fn plot_dir_is_created_and_filled() {
        let dir = std::env::temp_dir().join("nbody_data_orbit_plots");
        let _ = std::fs::remove_dir_all(&dir);

        let config = OrbitConfig {
            samples: 1,
            points: 20,
            t_end: 5.,
            plot_dir: Some(dir.clone()),
            ..OrbitConfig::default()
        };
        let mut sampler = OrbitStateSampler::with_rng(true, StdRng::seed_from_u64(8));

        orbit_dataset(&config, &mut sampler).unwrap();

        assert!(dir.join("0.png").is_file());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
