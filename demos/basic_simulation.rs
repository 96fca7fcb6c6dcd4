use particle_ensemble::{config::MD_SECTION, *};

fn main() {
    let mut store = MemoryStore::new()
        .with(MD_SECTION, "N", 36)
        .with(MD_SECTION, "Lx", 8.0)
        .with(MD_SECTION, "Ly", 8.0)
        .with(MD_SECTION, "nRow", 6)
        .with(MD_SECTION, "initPosScale", 0.9)
        .with(MD_SECTION, "edgeCondition", BoundaryMode::Closed.index());

    for kind in [ModelKind::MolecularDynamics, ModelKind::HardSphere] {
        let mut sim = Simulation::from_config(kind, &mut store);
        sim.set_running(true);
        for frame in 0..60 {
            sim.update();
            if frame % 20 == 19 {
                println!("{} frame {}: {:?}", kind.name(), frame + 1, sim.stats());
            }
        }
        println!("{}", sim.profile().report());
    }
}
