//! sf-device: semiconductor device equations for semiflux.
//!
//! A `Device` couples a mesh with region materials, per-cell doping and
//! contact potentials. `DeviceAssembler` turns it into the linear systems the
//! `sf_solver::Driver` iterates:
//! - Poisson for the electrostatic potential
//! - drift-diffusion continuity per carrier (Scharfetter–Gummel fluxes, SRH)
//! - first-order SHE per carrier on a total-energy grid
//!
//! `postprocess` exposes facet fluxes of a solution (electric field, particle
//! currents) for dual-box reconstruction and terminal currents.

pub mod assembler;
pub(crate) mod continuity;
pub(crate) mod coupling;
pub mod device;
pub mod energy;
pub mod error;
pub mod material;
pub mod physics;
pub(crate) mod poisson;
pub mod postprocess;
pub(crate) mod she;

pub use assembler::{DeviceAssembler, density_quantity, distribution_quantity};
pub use device::{Device, Doping};
pub use energy::EnergyGrid;
pub use error::{DeviceError, DeviceResult};
pub use material::{CarrierParams, Material, MaterialKind, ScatteringParams};
pub use postprocess::{ElectricField, ParticleCurrent, cell_vectors};
