//! Field storage and iteration state.

use std::collections::BTreeMap;

use nalgebra::DVector;
use sf_config::Quantity;

/// Per-entity values for each solution quantity.
///
/// Cell quantities are indexed by cell index. Distribution functions are
/// stored level-major within each cell (`cell * levels + level`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: BTreeMap<Quantity, DVector<f64>>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, quantity: Quantity) -> Option<&DVector<f64>> {
        self.fields.get(&quantity)
    }

    /// Insert or replace a field, returning the previous values.
    pub fn insert(&mut self, quantity: Quantity, values: DVector<f64>) -> Option<DVector<f64>> {
        self.fields.insert(quantity, values)
    }

    pub fn contains(&self, quantity: Quantity) -> bool {
        self.fields.contains_key(&quantity)
    }

    pub fn remove(&mut self, quantity: Quantity) -> Option<DVector<f64>> {
        self.fields.remove(&quantity)
    }

    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.fields.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quantity, &DVector<f64>)> {
        self.fields.iter().map(|(q, v)| (*q, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether every stored value is finite.
    pub fn is_finite(&self) -> bool {
        self.fields.values().all(|v| v.iter().all(|x| x.is_finite()))
    }

    /// Copy every field of `other` into `self`, replacing existing ones.
    pub fn overlay(&mut self, other: &FieldSet) {
        for (q, v) in other.iter() {
            self.fields.insert(q, v.clone());
        }
    }
}

/// Iteration state of a running solve. Never leaves the driver.
#[derive(Debug, Clone)]
pub(crate) struct IterationState {
    pub fields: FieldSet,
    pub iteration: usize,
    pub last_metric: Option<f64>,
    pub history: Vec<f64>,
}

impl IterationState {
    pub fn new(fields: FieldSet) -> Self {
        Self {
            fields,
            iteration: 0,
            last_metric: None,
            history: Vec::new(),
        }
    }

    /// Accept a new iterate.
    pub fn advance(&mut self, fields: FieldSet, metric: f64) {
        self.fields = fields;
        self.iteration += 1;
        self.last_metric = Some(metric);
        self.history.push(metric);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_replaces() {
        let mut a = FieldSet::new();
        a.insert(Quantity::Potential, DVector::from_vec(vec![1.0, 2.0]));
        a.insert(Quantity::ElectronDensity, DVector::from_vec(vec![5.0]));

        let mut b = FieldSet::new();
        b.insert(Quantity::Potential, DVector::from_vec(vec![3.0, 4.0]));

        a.overlay(&b);
        assert_eq!(a.get(Quantity::Potential).unwrap().as_slice(), &[3.0, 4.0]);
        assert_eq!(a.len(), 2);
        assert_eq!(
            a.quantities().collect::<Vec<_>>(),
            vec![Quantity::Potential, Quantity::ElectronDensity]
        );
    }

    #[test]
    fn finiteness() {
        let mut a = FieldSet::new();
        a.insert(Quantity::HoleDensity, DVector::from_vec(vec![1.0, f64::INFINITY]));
        assert!(!a.is_finite());
        a.remove(Quantity::HoleDensity);
        assert!(a.is_finite() && a.is_empty());
    }

    #[test]
    fn iteration_state_records_history() {
        let mut s = IterationState::new(FieldSet::new());
        s.advance(FieldSet::new(), 0.5);
        s.advance(FieldSet::new(), 0.25);
        assert_eq!(s.iteration, 2);
        assert_eq!(s.last_metric, Some(0.25));
        assert_eq!(s.history, vec![0.5, 0.25]);
    }
}
