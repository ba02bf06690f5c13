//! Nonlinear coupling driver.
//!
//! ```text
//! Initialized -> Iterating -> { Converged | MaxIterationsReached | Diverged }
//! ```
//!
//! The configuration is copied at construction; edits to the caller's copy
//! afterwards have no effect on this driver. Fields only become visible
//! through the returned [`Solution`] (or the iterate carried by
//! [`SolverError::Diverged`]) once the driver has left `Iterating`.

use std::time::Instant;

use nalgebra::DVector;
use sf_config::{EquationKind, NonlinearKind, Quantity, SimulationConfig, validate_config};
use sf_core::timing::{self, Stage};

use crate::assembler::Assembler;
use crate::convergence::{DivergenceMonitor, max_relative_change};
use crate::error::{SolverError, SolverResult};
use crate::linear::{LinearSolver, solver_for};
use crate::newton::newton_direction;
use crate::state::{FieldSet, IterationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Initialized,
    Iterating,
    Converged,
    MaxIterationsReached,
    Diverged,
    /// An assembly or linear solve failed; the error was returned by `run`.
    Aborted,
}

/// Terminal outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Converged,
    /// Iteration cap or wall-clock budget hit before convergence. The fields
    /// are the best available iterate.
    MaxIterationsReached,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolveStatus,
    pub iterations: usize,
    /// Metric of the last iteration.
    pub metric: f64,
    /// Metric of every iteration.
    pub history: Vec<f64>,
    pub fields: FieldSet,
}

impl Solution {
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    pub fn field(&self, quantity: Quantity) -> Option<&DVector<f64>> {
        self.fields.get(quantity)
    }
}

pub struct Driver<A: Assembler> {
    assembler: A,
    config: SimulationConfig,
    equations: Vec<EquationKind>,
    linear: Box<dyn LinearSolver>,
    seeded: FieldSet,
    state: DriverState,
}

impl<A: Assembler> Driver<A> {
    /// Validate and freeze `config`, and select the linear solver from it.
    pub fn new(assembler: A, config: &SimulationConfig) -> SolverResult<Self> {
        validate_config(config)?;
        let config = config.clone();
        Ok(Self {
            assembler,
            equations: config.enabled_equations(),
            linear: solver_for(&config.linear),
            config,
            seeded: FieldSet::new(),
            state: DriverState::Initialized,
        })
    }

    /// Replace the configured linear solver.
    pub fn with_linear_solver(mut self, linear: Box<dyn LinearSolver>) -> Self {
        self.linear = linear;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The frozen configuration snapshot.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Enabled equations in solve order.
    pub fn equations(&self) -> &[EquationKind] {
        &self.equations
    }

    pub fn assembler(&self) -> &A {
        &self.assembler
    }

    pub fn into_assembler(self) -> A {
        self.assembler
    }

    /// Seed a quantity (e.g. densities from a previous drift-diffusion solve
    /// to start a SHE solve). Only legal before `run`.
    pub fn set_initial_guess(&mut self, quantity: Quantity, values: DVector<f64>) -> SolverResult<()> {
        if self.state != DriverState::Initialized {
            return Err(SolverError::InvalidState {
                what: format!("initial guess for {quantity} set in state {:?}", self.state),
            });
        }
        self.seeded.insert(quantity, values);
        Ok(())
    }

    /// Iterate until a terminal state is reached.
    pub fn run(&mut self) -> SolverResult<Solution> {
        if self.state != DriverState::Initialized {
            return Err(SolverError::InvalidState {
                what: format!("run called in state {:?}", self.state),
            });
        }
        self.state = DriverState::Iterating;

        let result = self.iterate();
        self.state = match &result {
            Ok(solution) => match solution.status {
                SolveStatus::Converged => DriverState::Converged,
                SolveStatus::MaxIterationsReached => DriverState::MaxIterationsReached,
            },
            Err(SolverError::Diverged { .. }) => DriverState::Diverged,
            Err(_) => DriverState::Aborted,
        };
        timing::log_stage_summary();
        result
    }

    fn iterate(&mut self) -> SolverResult<Solution> {
        let nl = self.config.nonlinear.clone();
        tracing::info!(
            equations = ?self.equations,
            strategy = ?nl.kind,
            linear = self.linear.name(),
            max_iterations = nl.max_iterations,
            "starting nonlinear solve"
        );

        let initial = self.assembler.initial_fields(&self.seeded)?;
        self.check_unknowns(&initial)?;

        let unknowns: Vec<Quantity> = self.equations.iter().map(|e| e.unknown()).collect();
        let mut state = IterationState::new(initial);
        let mut monitor = DivergenceMonitor::new(nl.divergence_window);
        let started = Instant::now();

        while state.iteration < nl.max_iterations {
            let step = match nl.kind {
                NonlinearKind::Gummel => self.gummel_sweep(&state.fields, nl.damping),
                NonlinearKind::Newton => self.newton_update(&state.fields, nl.damping),
            };
            let next = match step {
                Ok(next) => next,
                Err(SolverError::NonFinite { what }) => {
                    let iteration = state.iteration + 1;
                    tracing::error!(iteration, %what, "non-finite values, nonlinear iteration diverged");
                    return Err(SolverError::Diverged {
                        iteration,
                        metric: f64::NAN,
                        last_finite: Box::new(state.fields),
                    });
                }
                Err(e) => return Err(e),
            };

            let metric = max_relative_change(&state.fields, &next, &unknowns);
            let iteration = state.iteration + 1;
            tracing::debug!(iteration, metric, "nonlinear iteration");

            if monitor.observe(metric) {
                let last_finite = if next.is_finite() { next } else { state.fields };
                tracing::error!(iteration, metric, "nonlinear iteration diverged");
                return Err(SolverError::Diverged {
                    iteration,
                    metric,
                    last_finite: Box::new(last_finite),
                });
            }

            state.advance(next, metric);

            if metric < nl.tolerance {
                tracing::info!(iterations = state.iteration, metric, "nonlinear solve converged");
                return Ok(self.finish(state, SolveStatus::Converged));
            }

            if let Some(budget) = nl.time_budget_s {
                let elapsed = started.elapsed().as_secs_f64();
                if elapsed >= budget {
                    tracing::warn!(
                        iterations = state.iteration,
                        elapsed_s = elapsed,
                        budget_s = budget,
                        "wall-clock budget exhausted before convergence"
                    );
                    return Ok(self.finish(state, SolveStatus::MaxIterationsReached));
                }
            }
        }

        tracing::warn!(
            iterations = state.iteration,
            metric = ?state.last_metric,
            "maximum iterations reached without convergence"
        );
        Ok(self.finish(state, SolveStatus::MaxIterationsReached))
    }

    fn finish(&self, state: IterationState, status: SolveStatus) -> Solution {
        Solution {
            status,
            iterations: state.iteration,
            metric: state.last_metric.unwrap_or(0.0),
            history: state.history,
            fields: state.fields,
        }
    }

    fn check_unknowns(&self, fields: &FieldSet) -> SolverResult<()> {
        for &eq in &self.equations {
            let expected = self.assembler.unknown_count(eq);
            let actual = fields.get(eq.unknown()).map(|v| v.len());
            if actual != Some(expected) {
                return Err(SolverError::ProblemSetup {
                    what: format!(
                        "initial {} has {:?} values, {} expected",
                        eq.unknown(),
                        actual,
                        expected
                    ),
                });
            }
        }
        Ok(())
    }

    fn solve_equation(&self, eq: EquationKind, fields: &FieldSet) -> SolverResult<DVector<f64>> {
        let system = timing::timed(Stage::Assembly, || self.assembler.assemble(eq, fields))?;
        if !system.is_finite() {
            return Err(SolverError::NonFinite {
                what: format!("assembled {eq} system"),
            });
        }

        let expected = self.assembler.unknown_count(eq);
        if system.dimension() != expected {
            return Err(SolverError::ProblemSetup {
                what: format!("{eq} system has {} rows, {} expected", system.dimension(), expected),
            });
        }

        let solved = timing::timed(Stage::LinearSolve, || {
            self.linear.solve(&system.matrix, &system.rhs)
        })?;
        if !solved.iter().all(|v| v.is_finite()) {
            return Err(SolverError::NonFinite {
                what: format!("{eq} solution"),
            });
        }
        Ok(solved)
    }

    /// One Gummel sweep: each equation solved in turn with the others frozen.
    fn gummel_sweep(&self, fields: &FieldSet, damping: f64) -> SolverResult<FieldSet> {
        let mut current = fields.clone();
        for &eq in &self.equations {
            let solved = self.solve_equation(eq, &current)?;
            let old = current.get(eq.unknown()).ok_or_else(|| SolverError::InvalidState {
                what: format!("missing {}", eq.unknown()),
            })?;
            let updated = old.zip_map(&solved, |o, s| o + damping * (s - o));
            current.insert(eq.unknown(), updated);
            self.apply_derived(eq, &mut current)?;
        }
        Ok(current)
    }

    fn apply_derived(&self, eq: EquationKind, fields: &mut FieldSet) -> SolverResult<()> {
        for (q, values) in self.assembler.derived_fields(eq, fields)? {
            fields.insert(q, values);
        }
        Ok(())
    }

    /// One damped Newton update of all equations at once.
    fn newton_update(&self, fields: &FieldSet, damping: f64) -> SolverResult<FieldSet> {
        let blocks: Vec<(Quantity, usize)> = self
            .equations
            .iter()
            .map(|&eq| (eq.unknown(), self.assembler.unknown_count(eq)))
            .collect();

        let mut x = Vec::new();
        for &(q, _) in &blocks {
            let v = fields.get(q).ok_or_else(|| SolverError::InvalidState {
                what: format!("missing {q}"),
            })?;
            x.extend(v.iter().copied());
        }
        let x = DVector::from_vec(x);

        let split = |x: &DVector<f64>| -> SolverResult<FieldSet> {
            let mut trial = fields.clone();
            let mut offset = 0;
            for &(q, n) in &blocks {
                trial.insert(q, x.rows(offset, n).into_owned());
                offset += n;
            }
            for &eq in &self.equations {
                self.apply_derived(eq, &mut trial)?;
            }
            Ok(trial)
        };

        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            let trial = split(x)?;
            let mut r = Vec::with_capacity(x.len());
            for &eq in &self.equations {
                let system =
                    timing::timed(Stage::Assembly, || self.assembler.assemble(eq, &trial))?;
                let unknown = trial.get(eq.unknown()).ok_or_else(|| SolverError::InvalidState {
                    what: format!("missing {}", eq.unknown()),
                })?;
                r.extend(system.residual(unknown).iter().copied());
            }
            Ok(DVector::from_vec(r))
        };

        let step = newton_direction(&x, residual)?;
        tracing::trace!(residual_norm = step.residual_norm, "newton step");
        split(&(x + step.dx * damping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{LinearSystem, Row};

    /// x = target, one unknown per entry.
    struct Fixed {
        target: Vec<f64>,
    }

    impl Assembler for Fixed {
        fn unknown_count(&self, _equation: EquationKind) -> usize {
            self.target.len()
        }

        fn initial_fields(&mut self, seeded: &FieldSet) -> SolverResult<FieldSet> {
            let mut f = FieldSet::new();
            f.insert(Quantity::Potential, DVector::zeros(self.target.len()));
            f.overlay(seeded);
            Ok(f)
        }

        fn assemble(&self, _equation: EquationKind, _fields: &FieldSet) -> SolverResult<LinearSystem> {
            let rows = self.target.iter().enumerate().map(|(i, &t)| Row::fixed(i, t));
            LinearSystem::from_rows(self.target.len(), rows)
        }
    }

    fn poisson_only() -> SimulationConfig {
        SimulationConfig::default().with_electrons(false).with_holes(false)
    }

    #[test]
    fn state_transitions() {
        let mut driver = Driver::new(Fixed { target: vec![1.0] }, &poisson_only()).unwrap();
        assert_eq!(driver.state(), DriverState::Initialized);
        driver.set_initial_guess(Quantity::Potential, DVector::from_element(1, 1.0)).unwrap();
        let solution = driver.run().unwrap();
        assert!(solution.converged());
        assert_eq!(driver.state(), DriverState::Converged);

        assert!(matches!(driver.run(), Err(SolverError::InvalidState { .. })));
        assert!(matches!(
            driver.set_initial_guess(Quantity::Potential, DVector::zeros(1)),
            Err(SolverError::InvalidState { .. })
        ));
    }

    #[test]
    fn config_is_frozen_at_construction() {
        let mut config = poisson_only();
        config.nonlinear.max_iterations = 7;
        let driver = Driver::new(Fixed { target: vec![1.0] }, &config).unwrap();
        config.nonlinear.max_iterations = 1;
        assert_eq!(driver.config().nonlinear.max_iterations, 7);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = poisson_only();
        config.nonlinear.damping = 0.0;
        assert!(matches!(
            Driver::new(Fixed { target: vec![1.0] }, &config),
            Err(SolverError::Config(_))
        ));
    }

    #[test]
    fn wrong_initial_size_rejected() {
        let mut driver = Driver::new(Fixed { target: vec![1.0, 2.0] }, &poisson_only()).unwrap();
        driver.set_initial_guess(Quantity::Potential, DVector::zeros(3)).unwrap();
        assert!(matches!(driver.run(), Err(SolverError::ProblemSetup { .. })));
        assert_eq!(driver.state(), DriverState::Aborted);
    }
}
