use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while generating datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Rejection sampling never produced a state below the acceleration
    /// threshold within the attempt budget.
    #[error("rejection sampling exhausted {attempts} attempts (acceleration threshold {threshold})")]
    RejectionLimit { attempts: usize, threshold: f64 },

    /// The ODE solver failed to integrate one orbit.
    #[error("integration of orbit {orbit} failed: {reason}")]
    Integration { orbit: usize, reason: String },

    /// The plot output directory could not be created.
    #[error("failed to create plot directory {}: {source}", path.display())]
    PlotDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The plotting backend failed to render or write an image.
    #[error("failed to render plot: {0}")]
    Plot(String),
}
