//! The equation assembler interface consumed by the driver.

use nalgebra::DVector;
use sf_config::{EquationKind, Quantity};

use crate::error::SolverResult;
use crate::state::FieldSet;
use crate::system::LinearSystem;

/// Turns the current fields into one linear system per equation.
///
/// `assemble` must be deterministic for identical inputs. For the Newton
/// strategy, `A(x) x - b(x)` with `x` the equation's current unknown must be
/// the nonlinear residual of that equation.
pub trait Assembler {
    /// Number of unknowns of `equation`.
    fn unknown_count(&self, equation: EquationKind) -> usize;

    /// Starting fields for a solve. `seeded` holds caller-supplied initial
    /// guesses, which take precedence over the assembler's defaults.
    ///
    /// Called once per solve, before the first iteration; anything that stays
    /// fixed for the whole solve (e.g. an energy grid) is set up here.
    fn initial_fields(&mut self, seeded: &FieldSet) -> SolverResult<FieldSet>;

    fn assemble(&self, equation: EquationKind, fields: &FieldSet) -> SolverResult<LinearSystem>;

    /// Secondary fields recomputed after `equation` has been updated
    /// (e.g. a carrier density from its distribution function).
    fn derived_fields(
        &self,
        _equation: EquationKind,
        _fields: &FieldSet,
    ) -> SolverResult<Vec<(Quantity, DVector<f64>)>> {
        Ok(Vec::new())
    }
}
