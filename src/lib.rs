//! Synthetic training data for models that learn physical dynamics.
//!
//! Small systems of point masses attract each other under pairwise gravity
//! in two dimensions. The crate produces aligned `(state, derivative)` pairs
//! for supervised learning, either as instantaneous samples drawn by
//! rejection sampling ([`sample_batch`]) or along numerically integrated
//! orbits ([`orbit_dataset`]). A deterministic rotational vector field
//! ([`sample_field`]) is available as a diagnostic pattern.
//!
//! States are rows of `[mass, px, py, vx, vy]` per body; the flat layout is
//! the calling convention shared with the ODE solver.

pub mod body;
pub mod dataset;
pub mod dynamics;
pub mod error;
pub mod field;
pub mod gravity;
pub mod init;
pub mod plot;

pub use body::{Body, SystemState, FIELDS};
pub use dataset::{
    orbit_dataset, sample_batch, simulate_orbit, BatchConfig, Dataset, Orbit, OrbitConfig,
    OrbitDataset,
};
pub use dynamics::{derivative, FlatState, TwoBodyDynamics};
pub use error::DatasetError;
pub use field::{sample_field, FieldConfig, FieldSample};
pub use init::{OrbitStateSampler, RandomStateSampler, StateSampler};
pub use plot::plot_trajectory;
