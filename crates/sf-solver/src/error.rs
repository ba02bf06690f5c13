//! Error types for solver operations.

use sf_config::ValidationError;
use sf_core::RegionId;
use sf_core::error::SfError;
use thiserror::Error;

use crate::state::FieldSet;

/// Errors that can occur while assembling or solving.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Invalid state: {what}")]
    InvalidState { what: String },

    #[error("No material assigned to {region}")]
    InvalidMaterialAssignment { region: RegionId },

    #[error("Malformed mesh: {what}")]
    MalformedMesh { what: String },

    #[error("Singular system: {what}")]
    SingularSystem { what: String },

    #[error("Linear solver did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },

    /// Fatal nonlinear instability. Carries the last iterate whose values
    /// were all finite.
    #[error("Nonlinear iteration diverged at iteration {iteration} (update {metric:e})")]
    Diverged {
        iteration: usize,
        metric: f64,
        last_finite: Box<FieldSet>,
    },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    /// NaN or infinity in an assembled system or a solved update. The driver
    /// reports it as `Diverged`.
    #[error("Non-finite values in {what}")]
    NonFinite { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for SfError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { what: _ } => SfError::InvalidArg {
                what: "problem setup",
            },
            SolverError::Config(_) => SfError::InvalidArg {
                what: "configuration",
            },
            SolverError::InvalidState { what: _ } => SfError::InvalidArg { what: "state" },
            SolverError::InvalidMaterialAssignment { region: _ } => SfError::InvalidArg {
                what: "material assignment",
            },
            SolverError::MalformedMesh { what: _ } => SfError::InvalidArg { what: "mesh" },
            SolverError::SingularSystem { what: _ } => SfError::InvalidArg {
                what: "singular system",
            },
            SolverError::NotConverged { .. } => SfError::InvalidArg {
                what: "linear convergence",
            },
            SolverError::Diverged { .. } => SfError::InvalidArg {
                what: "nonlinear divergence",
            },
            SolverError::Numeric { what: _ } => SfError::InvalidArg { what: "numeric" },
            SolverError::NonFinite { what: _ } => SfError::InvalidArg {
                what: "non-finite values",
            },
        }
    }
}
