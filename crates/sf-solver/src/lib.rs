//! Nonlinear coupling driver for semiflux.
//!
//! The driver iterates a set of coupled equations (Poisson, carrier
//! continuity, SHE) until the largest relative update falls below the
//! configured threshold. Equations are supplied by an `Assembler`, which turns
//! the current fields into one sparse linear system per equation; the linear
//! systems are handed to a `LinearSolver`.
//!
//! Two strategies are available:
//! - Gummel: equations solved one after the other with damping
//! - Newton: all equations at once with a finite-difference Jacobian

pub mod assembler;
pub mod convergence;
pub mod driver;
pub mod error;
pub mod jacobian;
pub mod linear;
pub mod newton;
pub mod state;
pub mod system;

pub use assembler::Assembler;
pub use driver::{Driver, DriverState, SolveStatus, Solution};
pub use error::{SolverError, SolverResult};
pub use linear::{BiCgStab, DenseLu, LinearSolver, solver_for};
pub use state::FieldSet;
pub use system::{LinearSystem, Row};

pub use sf_config::{EquationKind, Quantity};
