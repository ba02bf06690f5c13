//! Facet fluxes of a converged solution and their cell reconstruction.
//!
//! All sources report the flux through a facet per unit facet area, oriented
//! from the facet's first coboundary cell, and 0 on boundary facets.

use nalgebra::DVector;
use sf_config::Carrier;
use sf_core::units::constants::Q;
use sf_core::{FacetId, RegionId};
use sf_flux::{FacetFluxSource, FluxError, FluxResult, reconstruct_all_to_vec};
use sf_mesh::Topology;
use sf_solver::FieldSet;

use crate::assembler::{DeviceAssembler, density_quantity, distribution_quantity};
use crate::continuity::facet_diffusivity;
use crate::coupling::FacetLink;
use crate::error::DeviceResult;
use crate::physics::sg_flux;
use crate::she::SheModel;

fn link(asm: &DeviceAssembler, facet: FacetId) -> FluxResult<&FacetLink> {
    asm.coupling
        .facets
        .get(facet.idx())
        .ok_or_else(|| FluxError::Accessor {
            facet,
            what: "facet not in device mesh".to_string(),
        })
}

/// Normal electric field `E·n = -(ψ_b - ψ_a) / d`.
pub struct ElectricField<'a> {
    asm: &'a DeviceAssembler,
    psi: &'a DVector<f64>,
}

impl FacetFluxSource for ElectricField<'_> {
    fn facet_flux(&self, facet: FacetId) -> FluxResult<f64> {
        let link = link(self.asm, facet)?;
        Ok(match link.neighbor {
            Some(b) => -(self.psi[b] - self.psi[link.owner]) / link.distance,
            None => 0.0,
        })
    }
}

enum Transport<'a> {
    DriftDiffusion { density: &'a DVector<f64> },
    She {
        model: SheModel<'a>,
        distribution: &'a DVector<f64>,
    },
}

/// Particle current density of one carrier.
pub struct ParticleCurrent<'a> {
    asm: &'a DeviceAssembler,
    carrier: Carrier,
    psi: &'a DVector<f64>,
    transport: Transport<'a>,
}

impl ParticleCurrent<'_> {
    fn between(&self, a: usize, b: usize, distance: f64) -> f64 {
        match &self.transport {
            Transport::DriftDiffusion { density } => {
                let diffusivity = facet_diffusivity(self.asm, self.carrier, a, b);
                if diffusivity == 0.0 {
                    return 0.0;
                }
                sg_flux(
                    diffusivity,
                    distance,
                    self.carrier.charge_sign(),
                    self.psi[b] - self.psi[a],
                    self.asm.vt,
                    density[a],
                    density[b],
                )
            }
            Transport::She {
                model,
                distribution,
            } => model.facet_flux(a, b, distance, self.psi, distribution),
        }
    }
}

impl FacetFluxSource for ParticleCurrent<'_> {
    fn facet_flux(&self, facet: FacetId) -> FluxResult<f64> {
        let link = link(self.asm, facet)?;
        Ok(match link.neighbor {
            Some(b) => self.between(link.owner, b, link.distance),
            None => 0.0,
        })
    }
}

impl DeviceAssembler {
    pub fn electric_field<'a>(&'a self, fields: &'a FieldSet) -> DeviceResult<ElectricField<'a>> {
        Ok(ElectricField {
            asm: self,
            psi: self.potential(fields)?,
        })
    }

    /// Particle current density of `carrier`, from the density for
    /// drift-diffusion carriers and from the distribution for SHE carriers.
    pub fn particle_current<'a>(
        &'a self,
        carrier: Carrier,
        fields: &'a FieldSet,
    ) -> DeviceResult<ParticleCurrent<'a>> {
        let psi = self.potential(fields)?;
        let transport = match self.energy_grid(carrier) {
            Some(&grid) if self.config.equation_for(carrier).is_some_and(|e| e.is_she()) => {
                let model = SheModel::new(self, carrier, grid);
                let distribution = self.field(
                    fields,
                    distribution_quantity(carrier),
                    self.cell_count() * grid.levels(),
                )?;
                Transport::She {
                    model,
                    distribution,
                }
            }
            _ => Transport::DriftDiffusion {
                density: self.field(fields, density_quantity(carrier), self.cell_count())?,
            },
        };
        Ok(ParticleCurrent {
            asm: self,
            carrier,
            psi,
            transport,
        })
    }

    /// Electrical current (A, per unit of the dimensions the mesh does not
    /// resolve) flowing from region `from` into region `to` through their
    /// shared facets. Only solved carriers contribute.
    pub fn terminal_current(&self, fields: &FieldSet, from: RegionId, to: RegionId) -> DeviceResult<f64> {
        let mut currents = Vec::new();
        for carrier in [Carrier::Electron, Carrier::Hole] {
            if self.solves(carrier) {
                currents.push(self.particle_current(carrier, fields)?);
            }
        }

        let mesh = self.device.mesh();
        let mut total = 0.0;
        for link in &self.coupling.facets {
            let Some(b) = link.neighbor else { continue };
            let (ra, rb) = (mesh.cells()[link.owner].region, mesh.cells()[b].region);
            let orientation = if (ra, rb) == (from, to) {
                1.0
            } else if (ra, rb) == (to, from) {
                -1.0
            } else {
                continue;
            };
            for current in &currents {
                let particles = current.between(link.owner, b, link.distance);
                total += orientation * Q * current.carrier.charge_sign() * particles * link.area;
            }
        }
        Ok(total)
    }
}

/// Reconstruct one vector per cell from a facet flux source.
pub fn cell_vectors<T, S>(mesh: &T, source: &S) -> DeviceResult<Vec<DVector<f64>>>
where
    T: Topology + Sync + ?Sized,
    S: FacetFluxSource + Sync + ?Sized,
{
    Ok(reconstruct_all_to_vec(mesh, source)?)
}

