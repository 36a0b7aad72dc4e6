use thiserror::Error;

use crate::prelude::{Epoch, SV};

#[derive(Debug, Error)]
pub enum Error {
    /// Not enough qualified measurements to attempt a coarse fix.
    #[error("not enough measurements: {0}/{1}")]
    NotEnoughMeasurements(usize, usize),

    /// Invalid orbital states or bad signal data may cause the algebric calculations
    /// to wind up here.
    #[error("failed to invert matrix")]
    MatrixInversion,

    /// Iterative least squares did not converge within the allowed iterations.
    #[error("coarse fix did not converge")]
    NotConverged,

    /// Physical non sense due to bad signal data or degenerate geometry.
    #[error("coarse fix converged to physically invalid state")]
    InvalidState,

    /// Eccentric anomaly iteration failed to converge.
    #[error("{0}({1}) - kepler solver in failure")]
    KeplerSolver(Epoch, SV),

    #[error("invalid ephemeris: {0}")]
    InvalidEphemeris(String),

    #[error("invalid satellite identifier \"{0}\"")]
    InvalidSatelliteId(String),

    #[error("unknown tropo model \"{0}\"")]
    UnknownTropoModel(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
