use sf_config::{Carrier, CarrierEquation, SimulationConfig};
use sf_core::RegionId;
use sf_core::units::volts;
use sf_device::physics::equilibrium_densities;
use sf_device::{Device, DeviceAssembler, Doping, Material, MaterialKind};
use sf_mesh::Mesh;
use sf_mesh::structured::{RectElements, line_mesh, rect_mesh};
use sf_solver::{Driver, Quantity};

const LEFT: RegionId = RegionId(10);
const RIGHT: RegionId = RegionId(11);
const BULK: RegionId = RegionId(1);
const LENGTH: f64 = 4e-7;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn contacts_at_ends(x: f64, h: f64) -> RegionId {
    if x < h {
        LEFT
    } else if x > LENGTH - h {
        RIGHT
    } else {
        BULK
    }
}

fn device(mesh: Mesh, doping: Doping) -> Device {
    let mut device = Device::new(mesh);
    device
        .set_material(LEFT, Material::metal())
        .set_material(RIGHT, Material::metal())
        .set_material(BULK, Material::silicon())
        .set_region_doping(BULK, doping);
    device
}

fn she_config(carrier: Carrier, poisson: bool) -> SimulationConfig {
    let mut config = SimulationConfig::default()
        .with_electrons(carrier == Carrier::Electron)
        .with_holes(carrier == Carrier::Hole)
        .with_equation(carrier, CarrierEquation::She);
    config.poisson.enabled = poisson;
    config
}

fn assert_equilibrium_density(solution_density: &nalgebra::DVector<f64>, device: &Device, expected: f64) {
    for (cell, c) in device.mesh().cells().iter().enumerate() {
        let kind = device.material(c.region).unwrap().kind;
        if kind == MaterialKind::Semiconductor {
            let rel = (solution_density[cell] / expected - 1.0).abs();
            assert!(rel < 1e-9, "cell {cell}: {} vs {expected}", solution_density[cell]);
        }
    }
}

#[test]
fn uniform_electrons_reproduce_contact_density() {
    init_tracing();
    let cells = 8;
    let h = LENGTH / cells as f64;
    let mesh = line_mesh(0.0, LENGTH, cells, |p| contacts_at_ends(p[0], h)).unwrap();
    let config = she_config(Carrier::Electron, true);
    let asm = DeviceAssembler::new(device(mesh, Doping::donors(1e23)), &config).unwrap();
    let mut driver = Driver::new(asm, &config).unwrap();
    let solution = driver.run().unwrap();
    assert!(solution.converged(), "{:?}", solution.status);

    let asm = driver.into_assembler();
    let grid = asm.energy_grid(Carrier::Electron).unwrap();
    assert_eq!(
        solution.field(Quantity::ElectronDistribution).unwrap().len(),
        cells * grid.levels()
    );
    let (n0, _) = equilibrium_densities(Material::silicon().intrinsic_density, 1e23);
    let n = solution.field(Quantity::ElectronDensity).unwrap();
    assert_equilibrium_density(n, asm.device(), n0);

    let current = asm.terminal_current(&solution.fields, LEFT, BULK).unwrap();
    assert!(current.abs() < 1e-9 * 1.6e-19 * n0 * 1e5, "current {current:e}");
}

#[test]
fn uniform_holes_on_a_quad_mesh() {
    init_tracing();
    let h = LENGTH / 4.0;
    let mesh = rect_mesh(LENGTH, 2e-7, 4, 2, RectElements::Quadrilaterals, |p| {
        contacts_at_ends(p[0], h)
    })
    .unwrap();
    let mut config = she_config(Carrier::Hole, false);
    config.scattering.ionized_impurity = true;
    let asm = DeviceAssembler::new(device(mesh, Doping::acceptors(5e22)), &config).unwrap();
    let mut driver = Driver::new(asm, &config).unwrap();
    let solution = driver.run().unwrap();
    assert!(solution.converged(), "{:?}", solution.status);

    let (_, p0) = equilibrium_densities(Material::silicon().intrinsic_density, -5e22);
    let p = solution.field(Quantity::HoleDensity).unwrap();
    let asm = driver.into_assembler();
    assert_equilibrium_density(p, asm.device(), p0);
    // the electron density follows the fixed potential
    let n = solution.field(Quantity::ElectronDensity).unwrap();
    let ni = Material::silicon().intrinsic_density;
    assert!((n[1] * p[1] / (ni * ni) - 1.0).abs() < 1e-9);
}

#[test]
fn drift_diffusion_solution_seeds_biased_she() {
    init_tracing();
    let cells = 10;
    let h = LENGTH / cells as f64;
    let mesh = line_mesh(0.0, LENGTH, cells, |p| contacts_at_ends(p[0], h)).unwrap();
    let mut dev = device(mesh, Doping::donors(1e23));
    dev.set_contact_potential(RIGHT, volts(0.02));

    let dd_config = SimulationConfig::default().with_holes(false);
    let asm = DeviceAssembler::new(dev.clone(), &dd_config).unwrap();
    let mut driver = Driver::new(asm, &dd_config).unwrap();
    let dd = driver.run().unwrap();
    assert!(dd.converged());

    let config = she_config(Carrier::Electron, false);
    let asm = DeviceAssembler::new(dev, &config).unwrap();
    let mut driver = Driver::new(asm, &config).unwrap();
    for q in [Quantity::Potential, Quantity::ElectronDensity] {
        driver
            .set_initial_guess(q, dd.field(q).unwrap().clone())
            .unwrap();
    }
    let solution = driver.run().unwrap();
    assert!(solution.converged(), "{:?}", solution.status);

    let asm = driver.into_assembler();
    let into = asm.terminal_current(&solution.fields, RIGHT, BULK).unwrap();
    let out = asm.terminal_current(&solution.fields, BULK, LEFT).unwrap();
    // electrons drift towards the positive contact: current enters there
    assert!(into > 0.0);
    assert!((out / into - 1.0).abs() < 1e-6, "{into:e} vs {out:e}");
}
