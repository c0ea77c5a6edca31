//! Headless demo: a few agents wandering and hunting on a tiled terrain

use prowl::prelude::*;

fn main() {
    env_logger::init();

    // Static collision world: a 12x12 ground slab with its top at y = 0
    let mut physics = NavPhysics::new();
    physics.add_terrain_box(Vec3::new(6.0, -0.5, 6.0), Vec3::new(6.0, 0.5, 6.0));
    physics.refresh();

    let graph = match TileGraph::build(
        TerrainBounds::new(Vec3::ZERO, Vec3::new(12.0, 0.0, 12.0)),
        &GraphConfig::default(),
        &physics,
        &physics,
    ) {
        Ok(graph) => graph,
        Err(err) => {
            eprintln!("graph build failed: {err}");
            return;
        }
    };

    let mut sim = Simulation::new(graph, 0xC0FFEE);

    // Drop a couple of rocks into the world; their tiles are re-queried
    // immediately rather than waiting for the rescan backstop
    for center in [Vec3::new(6.5, 0.5, 6.5), Vec3::new(4.5, 0.5, 8.5)] {
        let rock = sim.world_mut().spawn(());
        physics.add_obstacle(rock, center, Vec3::splat(0.45), false);
        physics.refresh();
        let coord = sim.graph().world_to_coord(center);
        sim.graph_mut().update_passability(coord, &physics);
    }
    log::info!(
        "graph ready: {} tiles, {} passable",
        sim.graph().tile_count(),
        sim.graph().passable_count()
    );

    let mut hunter = AgentProfile {
        name: "hunter".to_string(),
        ..Default::default()
    };
    hunter.perception.set_sight_weight(85.0);
    hunter.perception.base_chance = 75.0;

    let mut drifter = AgentProfile {
        name: "drifter".to_string(),
        ..Default::default()
    };
    drifter.perception.base_chance = 0.0;
    drifter.behavior.wander_anchor = WanderAnchor::CurrentPosition;

    sim.spawn_agent(Vec3::new(2.5, 0.1, 2.5), Vec3::Z, hunter);
    sim.spawn_agent(Vec3::new(9.5, 0.1, 9.5), -Vec3::Z, drifter.clone());
    sim.spawn_agent(Vec3::new(9.5, 0.1, 2.5), -Vec3::X, drifter);

    // 30 simulated seconds at a 20 Hz fixed tick
    let dt = 0.05;
    for tick in 0..600 {
        sim.tick(dt, &physics, &physics);

        for event in sim.events().iter() {
            match event {
                AgentEvent::TargetAcquired { entity, target } => {
                    log::info!("[{tick}] {entity:?} acquired {target:?}");
                }
                AgentEvent::Damaged { entity, amount, .. } => {
                    log::info!("[{tick}] {entity:?} took {amount:.1} damage");
                }
                AgentEvent::Died { entity, killer } => {
                    log::info!("[{tick}] {entity:?} died (killer: {killer:?})");
                }
                AgentEvent::DestinationAbandoned {
                    entity,
                    destination,
                } => {
                    log::info!("[{tick}] {entity:?} gave up on {destination}");
                }
                _ => {}
            }
        }
    }

    let mut survivors = sim.world().query::<(&Pose, &Health)>();
    for (entity, (pose, health)) in survivors.iter() {
        println!(
            "{entity:?}: at {:.2}, {:.0}/{:.0} hp",
            pose.position, health.current, health.max
        );
    }
}
