//! Error types for device setup and post-processing.

use sf_config::ValidationError;
use sf_core::{CellId, FacetId, RegionId};
use sf_flux::FluxError;
use sf_solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("No material assigned to {region}")]
    InvalidMaterialAssignment { region: RegionId },

    #[error("Malformed mesh at facet {facet}: {what}")]
    MalformedMesh { facet: FacetId, what: String },

    #[error("Unknown cell {cell}")]
    UnknownCell { cell: CellId },

    #[error("Invalid parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Missing field {what}")]
    MissingField { what: String },

    #[error("Field {what} has {actual} values, expected {expected}")]
    FieldLength {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Flux(#[from] FluxError),
}

pub type DeviceResult<T> = Result<T, DeviceError>;

impl From<DeviceError> for SolverError {
    fn from(e: DeviceError) -> Self {
        match e {
            DeviceError::InvalidMaterialAssignment { region } => {
                SolverError::InvalidMaterialAssignment { region }
            }
            DeviceError::MalformedMesh { facet, what } => SolverError::MalformedMesh {
                what: format!("facet {facet}: {what}"),
            },
            DeviceError::MissingField { .. } | DeviceError::FieldLength { .. } => {
                SolverError::InvalidState {
                    what: e.to_string(),
                }
            }
            DeviceError::UnknownCell { .. } | DeviceError::InvalidParameter { .. } => {
                SolverError::ProblemSetup {
                    what: e.to_string(),
                }
            }
            DeviceError::Config(err) => SolverError::Config(err),
            DeviceError::Flux(err) => SolverError::Numeric {
                what: err.to_string(),
            },
        }
    }
}
