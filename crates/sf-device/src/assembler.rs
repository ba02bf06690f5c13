//! Device equation assembler.
//!
//! Implements `sf_solver::Assembler` for Poisson, carrier continuity and
//! first-order SHE on a cell-centered box discretization. Material and mesh
//! problems are reported when the assembler is built, before any iteration.

use std::collections::BTreeMap;

use nalgebra::DVector;
use sf_config::{Carrier, CarrierEquation, EquationKind, Quantity, SimulationConfig, validate_config};
use sf_core::units::constants::thermal_voltage;
use sf_core::{CellId, RegionId};
use sf_solver::{Assembler, FieldSet, LinearSystem, SolverError, SolverResult};
use tracing::debug;
use uom::si::electric_potential::volt;

use crate::continuity;
use crate::coupling::Coupling;
use crate::device::Device;
use crate::energy::EnergyGrid;
use crate::error::{DeviceError, DeviceResult};
use crate::material::{Material, MaterialKind};
use crate::physics::{boltzmann_densities, builtin_potential, equilibrium_densities};
use crate::poisson;
use crate::she::SheModel;

/// Equilibrium values imposed in an ohmic contact cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Contact {
    pub potential: f64,
    pub electrons: f64,
    pub holes: f64,
    /// Material slot of the semiconductor the contact touches (the contact's
    /// own slot if it touches none).
    pub reference: usize,
}

impl Contact {
    pub fn density(&self, carrier: Carrier) -> f64 {
        match carrier {
            Carrier::Electron => self.electrons,
            Carrier::Hole => self.holes,
        }
    }
}

/// Electron and hole densities seen by one assembly.
#[derive(Debug, Clone)]
pub(crate) struct Densities {
    pub electrons: DVector<f64>,
    pub holes: DVector<f64>,
}

pub fn density_quantity(carrier: Carrier) -> Quantity {
    match carrier {
        Carrier::Electron => Quantity::ElectronDensity,
        Carrier::Hole => Quantity::HoleDensity,
    }
}

pub fn distribution_quantity(carrier: Carrier) -> Quantity {
    match carrier {
        Carrier::Electron => Quantity::ElectronDistribution,
        Carrier::Hole => Quantity::HoleDistribution,
    }
}

fn carrier_slot(carrier: Carrier) -> usize {
    match carrier {
        Carrier::Electron => 0,
        Carrier::Hole => 1,
    }
}

pub struct DeviceAssembler {
    pub(crate) device: Device,
    pub(crate) materials: Vec<Material>,
    pub(crate) cell_material: Vec<usize>,
    pub(crate) coupling: Coupling,
    pub(crate) contacts: Vec<Option<Contact>>,
    pub(crate) config: SimulationConfig,
    /// Thermal voltage (V), numerically equal to kT in eV.
    pub(crate) vt: f64,
    grids: [Option<EnergyGrid>; 2],
}

impl DeviceAssembler {
    /// Check materials and mesh and precompute the facet coupling.
    pub fn new(device: Device, config: &SimulationConfig) -> DeviceResult<Self> {
        validate_config(config)?;

        let mut slots: BTreeMap<RegionId, usize> = BTreeMap::new();
        let mut materials = Vec::new();
        let mut cell_material = Vec::with_capacity(device.mesh().cells().len());
        for cell in device.mesh().cells() {
            let slot = match slots.get(&cell.region) {
                Some(&slot) => slot,
                None => {
                    let material = device
                        .material(cell.region)
                        .ok_or(DeviceError::InvalidMaterialAssignment {
                            region: cell.region,
                        })?;
                    material.validate()?;
                    materials.push(material.clone());
                    slots.insert(cell.region, materials.len() - 1);
                    materials.len() - 1
                }
            };
            cell_material.push(slot);
        }

        let coupling = Coupling::build(device.mesh())?;
        let vt = thermal_voltage(config.temperature()).get::<volt>();

        let mut assembler = Self {
            device,
            materials,
            cell_material,
            coupling,
            contacts: Vec::new(),
            config: config.clone(),
            vt,
            grids: [None, None],
        };
        assembler.contacts = assembler.resolve_contacts();

        debug!(
            cells = assembler.cell_count(),
            materials = assembler.materials.len(),
            contacts = assembler.contacts.iter().flatten().count(),
            "Device assembler ready"
        );
        Ok(assembler)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn cell_count(&self) -> usize {
        self.coupling.cell_count()
    }

    /// Thermal voltage in volts.
    pub fn thermal_voltage(&self) -> f64 {
        self.vt
    }

    /// Energy grid of a SHE carrier, available once the solve has started.
    pub fn energy_grid(&self, carrier: Carrier) -> Option<&EnergyGrid> {
        self.grids[carrier_slot(carrier)].as_ref()
    }

    pub(crate) fn kind(&self, cell: usize) -> MaterialKind {
        self.materials[self.cell_material[cell]].kind
    }

    pub(crate) fn material(&self, cell: usize) -> &Material {
        &self.materials[self.cell_material[cell]]
    }

    pub(crate) fn net_doping(&self, cell: usize) -> f64 {
        self.device.doping(CellId::from_usize(cell)).net()
    }

    pub(crate) fn impurity_density(&self, cell: usize) -> f64 {
        self.device.doping(CellId::from_usize(cell)).total()
    }

    pub(crate) fn contact(&self, cell: usize) -> SolverResult<&Contact> {
        self.contacts[cell]
            .as_ref()
            .ok_or_else(|| SolverError::InvalidState {
                what: format!("cell {cell} is not a contact"),
            })
    }

    /// Whether `carrier` is solved for (continuity or SHE).
    pub(crate) fn solves(&self, carrier: Carrier) -> bool {
        self.config.equation_for(carrier).is_some()
    }

    fn uses_she(&self, carrier: Carrier) -> bool {
        self.config.carrier(carrier).enabled
            && self.config.carrier(carrier).equation == CarrierEquation::She
    }

    /// Contact values for every metal cell.
    ///
    /// The doping of a contact is the mean net doping of the semiconductor
    /// cells adjacent to any cell of its region.
    fn resolve_contacts(&self) -> Vec<Option<Contact>> {
        let mut per_region: BTreeMap<RegionId, (f64, usize, Option<usize>)> = BTreeMap::new();
        for cell in 0..self.cell_count() {
            if self.kind(cell) != MaterialKind::Metal {
                continue;
            }
            let region = self.region(cell);
            let entry = per_region.entry(region).or_insert((0.0, 0, None));
            for nb in &self.coupling.neighbors[cell] {
                if self.kind(nb.cell) == MaterialKind::Semiconductor {
                    entry.0 += self.net_doping(nb.cell);
                    entry.1 += 1;
                    entry.2.get_or_insert(self.cell_material[nb.cell]);
                }
            }
        }

        (0..self.cell_count())
            .map(|cell| {
                if self.kind(cell) != MaterialKind::Metal {
                    return None;
                }
                let region = self.region(cell);
                let (sum, count, reference) = per_region
                    .get(&region)
                    .copied()
                    .unwrap_or((0.0, 0, None));
                let net = if count > 0 { sum / count as f64 } else { 0.0 };
                let reference = reference.unwrap_or(self.cell_material[cell]);
                let ni = self.materials[reference].intrinsic_density;
                let applied = self.device.contact_potential(region).get::<volt>();
                let (electrons, holes) = equilibrium_densities(ni, net);
                Some(Contact {
                    potential: applied + builtin_potential(ni, net, self.vt),
                    electrons,
                    holes,
                    reference,
                })
            })
            .collect()
    }

    fn region(&self, cell: usize) -> RegionId {
        self.device.mesh().cells()[cell].region
    }

    /// Charge-neutral potential: contact value in metal, built-in potential in
    /// semiconductors, 0 in insulators.
    fn default_potential(&self) -> DVector<f64> {
        DVector::from_fn(self.cell_count(), |cell, _| match self.kind(cell) {
            MaterialKind::Metal => self.contacts[cell].map_or(0.0, |c| c.potential),
            MaterialKind::Semiconductor => {
                let ni = self.material(cell).intrinsic_density;
                builtin_potential(ni, self.net_doping(cell), self.vt)
            }
            MaterialKind::Insulator => 0.0,
        })
    }

    /// Boltzmann density of `carrier` at potential `psi`.
    pub(crate) fn equilibrium_density(&self, carrier: Carrier, psi: &DVector<f64>) -> DVector<f64> {
        DVector::from_fn(self.cell_count(), |cell, _| match self.kind(cell) {
            MaterialKind::Metal => self.contacts[cell].map_or(0.0, |c| c.density(carrier)),
            MaterialKind::Semiconductor => {
                let (n, p) =
                    boltzmann_densities(self.material(cell).intrinsic_density, psi[cell], self.vt);
                match carrier {
                    Carrier::Electron => n,
                    Carrier::Hole => p,
                }
            }
            MaterialKind::Insulator => 0.0,
        })
    }

    pub(crate) fn potential<'f>(&self, fields: &'f FieldSet) -> DeviceResult<&'f DVector<f64>> {
        self.field(fields, Quantity::Potential, self.cell_count())
    }

    pub(crate) fn field<'f>(
        &self,
        fields: &'f FieldSet,
        quantity: Quantity,
        expected: usize,
    ) -> DeviceResult<&'f DVector<f64>> {
        let values = fields.get(quantity).ok_or_else(|| DeviceError::MissingField {
            what: quantity.to_string(),
        })?;
        if values.len() != expected {
            return Err(DeviceError::FieldLength {
                what: quantity.to_string(),
                expected,
                actual: values.len(),
            });
        }
        Ok(values)
    }

    /// Carrier densities: the current fields for solved carriers, Boltzmann
    /// equilibrium at the current potential otherwise.
    pub(crate) fn densities(&self, fields: &FieldSet) -> DeviceResult<Densities> {
        let psi = self.potential(fields)?;
        let pick = |carrier: Carrier| -> DeviceResult<DVector<f64>> {
            if self.solves(carrier) {
                Ok(self
                    .field(fields, density_quantity(carrier), self.cell_count())?
                    .clone())
            } else {
                Ok(self.equilibrium_density(carrier, psi))
            }
        };
        Ok(Densities {
            electrons: pick(Carrier::Electron)?,
            holes: pick(Carrier::Hole)?,
        })
    }

    pub(crate) fn she_model(&self, carrier: Carrier) -> SolverResult<SheModel<'_>> {
        let grid = self
            .energy_grid(carrier)
            .copied()
            .ok_or_else(|| SolverError::InvalidState {
                what: format!("no energy grid for {carrier:?} SHE; the solve has not started"),
            })?;
        Ok(SheModel::new(self, carrier, grid))
    }

    fn seeded_or(
        &self,
        seeded: &FieldSet,
        quantity: Quantity,
        expected: usize,
        default: impl FnOnce() -> DVector<f64>,
    ) -> SolverResult<DVector<f64>> {
        if seeded.contains(quantity) {
            Ok(self.field(seeded, quantity, expected)?.clone())
        } else {
            Ok(default())
        }
    }
}

impl Assembler for DeviceAssembler {
    fn unknown_count(&self, equation: EquationKind) -> usize {
        match equation.carrier() {
            Some(carrier) if equation.is_she() => self
                .energy_grid(carrier)
                .map_or(0, |g| g.levels() * self.cell_count()),
            _ => self.cell_count(),
        }
    }

    fn initial_fields(&mut self, seeded: &FieldSet) -> SolverResult<FieldSet> {
        let cells = self.cell_count();
        let psi = self.seeded_or(seeded, Quantity::Potential, cells, || self.default_potential())?;

        let mut fields = FieldSet::new();
        for carrier in [Carrier::Electron, Carrier::Hole] {
            let q = density_quantity(carrier);
            let density = self.seeded_or(seeded, q, cells, || self.equilibrium_density(carrier, &psi))?;
            fields.insert(q, density);
        }

        for carrier in [Carrier::Electron, Carrier::Hole] {
            if !self.uses_she(carrier) {
                self.grids[carrier_slot(carrier)] = None;
                continue;
            }
            let sign = carrier.charge_sign();
            let edges: Vec<f64> = (0..cells)
                .filter(|&c| self.kind(c) != MaterialKind::Insulator)
                .map(|c| sign * psi[c])
                .collect();
            let grid = EnergyGrid::fit(
                edges,
                self.config.she.energy_spacing_ev,
                self.config.she.energy_window_ev,
            )?;
            debug!(
                carrier = ?carrier,
                levels = grid.levels(),
                spacing = grid.spacing(),
                "Energy grid fixed"
            );
            self.grids[carrier_slot(carrier)] = Some(grid);

            let model = SheModel::new(self, carrier, grid);
            let q = distribution_quantity(carrier);
            let density = fields
                .get(density_quantity(carrier))
                .cloned()
                .unwrap_or_else(|| DVector::zeros(cells));
            let distribution = self.seeded_or(seeded, q, cells * grid.levels(), || {
                model.maxwellian_field(&psi, &density)
            })?;
            let derived = model.density_field(&psi, &distribution);
            fields.insert(q, distribution);
            fields.insert(density_quantity(carrier), derived);
        }

        fields.insert(Quantity::Potential, psi);
        Ok(fields)
    }

    fn assemble(&self, equation: EquationKind, fields: &FieldSet) -> SolverResult<LinearSystem> {
        let cells = self.cell_count();
        match equation {
            EquationKind::Poisson => {
                let psi = self.potential(fields)?;
                let densities = self.densities(fields)?;
                LinearSystem::assemble_par(cells, cells, |cell| {
                    Ok(vec![poisson::row(self, cell, psi, &densities)])
                })
            }
            EquationKind::ElectronContinuity | EquationKind::HoleContinuity => {
                let carrier = carrier_of(equation)?;
                let psi = self.potential(fields)?;
                let densities = self.densities(fields)?;
                LinearSystem::assemble_par(cells, cells, |cell| {
                    continuity::row(self, carrier, cell, psi, &densities).map(|r| vec![r])
                })
            }
            EquationKind::ElectronShe | EquationKind::HoleShe => {
                let carrier = carrier_of(equation)?;
                let model = self.she_model(carrier)?;
                let psi = self.potential(fields)?;
                let n = cells * model.levels();
                LinearSystem::assemble_par(n, cells, |cell| model.rows(cell, psi))
            }
        }
    }

    fn derived_fields(
        &self,
        equation: EquationKind,
        fields: &FieldSet,
    ) -> SolverResult<Vec<(Quantity, DVector<f64>)>> {
        match equation {
            EquationKind::ElectronShe | EquationKind::HoleShe => {
                let carrier = carrier_of(equation)?;
                let model = self.she_model(carrier)?;
                let psi = self.potential(fields)?;
                let f = self.field(
                    fields,
                    distribution_quantity(carrier),
                    self.unknown_count(equation),
                )?;
                Ok(vec![(density_quantity(carrier), model.density_field(psi, f))])
            }
            EquationKind::Poisson => {
                let psi = self.potential(fields)?;
                Ok([Carrier::Electron, Carrier::Hole]
                    .into_iter()
                    .filter(|&c| !self.solves(c))
                    .map(|c| (density_quantity(c), self.equilibrium_density(c, psi)))
                    .collect())
            }
            EquationKind::ElectronContinuity | EquationKind::HoleContinuity => Ok(Vec::new()),
        }
    }
}

fn carrier_of(equation: EquationKind) -> SolverResult<Carrier> {
    equation.carrier().ok_or_else(|| SolverError::InvalidState {
        what: format!("{equation} has no carrier"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Doping;
    use sf_core::units::volts;
    use sf_mesh::structured::line_mesh;

    const N_REGION: RegionId = RegionId(1);
    const CONTACT: RegionId = RegionId(2);

    fn resistor(cells: usize) -> Device {
        let mesh = line_mesh(0.0, 1e-6, cells, |p| {
            if p[0] > 1e-6 * (cells as f64 - 1.0) / cells as f64 {
                CONTACT
            } else {
                N_REGION
            }
        })
        .unwrap();
        let mut device = Device::new(mesh);
        device
            .set_material(N_REGION, Material::silicon())
            .set_material(CONTACT, Material::metal())
            .set_region_doping(N_REGION, Doping::donors(1e23));
        device
    }

    #[test]
    fn missing_material_is_reported_with_region() {
        let mut bare = Device::new(resistor(5).mesh().clone());
        bare.set_material(CONTACT, Material::metal());
        let err = DeviceAssembler::new(bare, &SimulationConfig::default()).err();
        assert_eq!(
            err,
            Some(DeviceError::InvalidMaterialAssignment { region: N_REGION })
        );
    }

    #[test]
    fn contact_sees_adjacent_doping() {
        let mut device = resistor(5);
        device.set_contact_potential(CONTACT, volts(0.5));
        let asm = DeviceAssembler::new(device, &SimulationConfig::default()).unwrap();
        let contact = asm.contacts[4].unwrap();
        let builtin = builtin_potential(1.0e16, 1e23, asm.vt);
        assert!((contact.potential - (0.5 + builtin)).abs() < 1e-12);
        assert!((contact.electrons / 1e23 - 1.0).abs() < 1e-12);
        assert!(asm.contacts[0].is_none());
    }

    #[test]
    fn initial_fields_are_charge_neutral() {
        let device = resistor(5);
        let mut asm = DeviceAssembler::new(device, &SimulationConfig::default()).unwrap();
        let fields = asm.initial_fields(&FieldSet::new()).unwrap();
        let n = fields.get(Quantity::ElectronDensity).unwrap();
        for cell in 0..5 {
            assert!((n[cell] / 1e23 - 1.0).abs() < 1e-9);
        }
        assert_eq!(asm.unknown_count(EquationKind::Poisson), 5);
    }

    #[test]
    fn seeded_field_of_wrong_length_is_rejected() {
        let device = resistor(5);
        let mut asm = DeviceAssembler::new(device, &SimulationConfig::default()).unwrap();
        let mut seeded = FieldSet::new();
        seeded.insert(Quantity::Potential, DVector::zeros(3));
        assert!(matches!(
            asm.initial_fields(&seeded),
            Err(SolverError::InvalidState { .. })
        ));
    }
}
