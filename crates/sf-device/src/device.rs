//! Device description: mesh, region materials, doping and contacts.

use std::collections::BTreeMap;

use sf_core::units::{Potential, volts};
use sf_core::{CellId, RegionId};
use sf_mesh::Mesh;
use sf_mesh::geometry::Point;

use crate::error::{DeviceError, DeviceResult};
use crate::material::Material;

/// Donor and acceptor concentration of a cell (m⁻³).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Doping {
    pub donors: f64,
    pub acceptors: f64,
}

impl Doping {
    pub fn donors(density: f64) -> Self {
        Self {
            donors: density,
            acceptors: 0.0,
        }
    }

    pub fn acceptors(density: f64) -> Self {
        Self {
            donors: 0.0,
            acceptors: density,
        }
    }

    /// `N_D - N_A`.
    pub fn net(&self) -> f64 {
        self.donors - self.acceptors
    }

    /// `N_D + N_A`, the ionized impurity density.
    pub fn total(&self) -> f64 {
        self.donors + self.acceptors
    }
}

/// A semiconductor device on an immutable mesh.
///
/// Cells are grouped into regions; each region used by the mesh needs a
/// material before an assembler can be built. Metal regions act as ohmic
/// contacts with an applied potential (0 V unless set).
#[derive(Debug, Clone)]
pub struct Device {
    mesh: Mesh,
    materials: BTreeMap<RegionId, Material>,
    doping: Vec<Doping>,
    contacts: BTreeMap<RegionId, Potential>,
}

impl Device {
    pub fn new(mesh: Mesh) -> Self {
        let cells = mesh.cells().len();
        Self {
            mesh,
            materials: BTreeMap::new(),
            doping: vec![Doping::default(); cells],
            contacts: BTreeMap::new(),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn set_material(&mut self, region: RegionId, material: Material) -> &mut Self {
        self.materials.insert(region, material);
        self
    }

    pub fn material(&self, region: RegionId) -> Option<&Material> {
        self.materials.get(&region)
    }

    pub fn materials(&self) -> &BTreeMap<RegionId, Material> {
        &self.materials
    }

    pub fn set_doping(&mut self, cell: CellId, doping: Doping) -> DeviceResult<()> {
        let slot = self
            .doping
            .get_mut(cell.idx())
            .ok_or(DeviceError::UnknownCell { cell })?;
        *slot = doping;
        Ok(())
    }

    /// Assign doping to every cell of `region`.
    pub fn set_region_doping(&mut self, region: RegionId, doping: Doping) -> &mut Self {
        for cell in self.mesh.cells() {
            if cell.region == region {
                self.doping[cell.id.idx()] = doping;
            }
        }
        self
    }

    /// Assign doping from a profile evaluated at each cell centroid.
    pub fn set_doping_profile<F>(&mut self, profile: F) -> &mut Self
    where
        F: Fn(Point) -> Doping,
    {
        use sf_mesh::Topology;
        for (i, slot) in self.doping.iter_mut().enumerate() {
            *slot = profile(self.mesh.cell_centroid(CellId::from_usize(i)));
        }
        self
    }

    pub fn doping(&self, cell: CellId) -> Doping {
        self.doping.get(cell.idx()).copied().unwrap_or_default()
    }

    pub fn set_contact_potential(&mut self, region: RegionId, potential: Potential) -> &mut Self {
        self.contacts.insert(region, potential);
        self
    }

    pub fn contact_potential(&self, region: RegionId) -> Potential {
        self.contacts.get(&region).copied().unwrap_or_else(|| volts(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_mesh::structured::line_mesh;

    fn two_regions() -> Device {
        let mesh = line_mesh(0.0, 1.0, 4, |p| {
            if p[0] < 0.5 { RegionId(1) } else { RegionId(2) }
        })
        .unwrap();
        Device::new(mesh)
    }

    #[test]
    fn region_doping_only_touches_region() {
        let mut device = two_regions();
        device.set_region_doping(RegionId(2), Doping::donors(1e22));
        assert_eq!(device.doping(CellId::from_usize(0)).net(), 0.0);
        assert_eq!(device.doping(CellId::from_usize(3)).net(), 1e22);
    }

    #[test]
    fn profile_sees_centroids() {
        let mut device = two_regions();
        device.set_doping_profile(|p| Doping::acceptors(p[0]));
        assert!((device.doping(CellId::from_usize(1)).acceptors - 0.375).abs() < 1e-12);
    }

    #[test]
    fn unknown_cell_is_rejected() {
        let mut device = two_regions();
        let err = device
            .set_doping(CellId::from_usize(10), Doping::default())
            .unwrap_err();
        assert!(matches!(err, DeviceError::UnknownCell { .. }));
    }

    #[test]
    fn contacts_default_to_zero_volts() {
        let mut device = two_regions();
        assert_eq!(device.contact_potential(RegionId(1)).value, 0.0);
        device.set_contact_potential(RegionId(1), volts(0.3));
        assert_eq!(device.contact_potential(RegionId(1)).value, 0.3);
    }
}
