use anyhow::Result;
use clap::Parser;
use log::info;

use tile_traffic::simulation::{Position, SimConfig, SimWorld};

#[derive(Parser)]
#[command(name = "tile_traffic")]
#[command(about = "Grid road-tile traffic simulation, run headless")]
struct Cli {
    /// Grid height in tiles
    #[arg(long, default_value = "12")]
    rows: usize,

    /// Grid width in tiles
    #[arg(long, default_value = "16")]
    cols: usize,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "600")]
    ticks: u32,

    /// Time delta per tick in milliseconds
    #[arg(long, default_value = "50")]
    tick_ms: f32,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Chance that placing a tile spawns a vehicle on it
    #[arg(long, default_value = "0.4", value_parser = parse_probability)]
    spawn_chance: f64,

    /// Extra vehicles to spawn on random nodes before the run
    #[arg(long, default_value = "10")]
    vehicles: usize,

    /// Log a summary and map every N ticks (0 disables)
    #[arg(long, default_value = "200")]
    print_every: u32,

    /// Print each tile's shape and segment nodes
    #[arg(long)]
    show_descriptors: bool,

    /// Print every routing edge
    #[arg(long)]
    show_edges: bool,

    /// Print vehicle body and probe corners
    #[arg(long)]
    show_colliders: bool,
}

fn parse_probability(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|e| format!("`{}` is not a number: {}", raw, e))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("`{}` is not between 0.0 and 1.0", raw));
    }
    Ok(value)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    let mut config = SimConfig::new(cli.rows, cli.cols).with_spawn_chance(cli.spawn_chance);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    info!("Running tile traffic simulation in headless mode...");
    info!(
        "Grid: {}x{}, Ticks: {}, Delta: {}ms",
        cli.rows, cli.cols, cli.ticks, cli.tick_ms
    );

    let mut world = SimWorld::create_test_world(config);
    for _ in 0..cli.vehicles {
        if world.spawn_random_vehicle().is_none() {
            break;
        }
    }

    info!("Initial state:");
    report(&world, cli);

    for tick in 1..=cli.ticks {
        world.step(cli.tick_ms);

        if cli.print_every > 0 && tick % cli.print_every == 0 && tick < cli.ticks {
            info!(
                "--- After tick {} ({:.1}s simulated time) ---",
                tick,
                world.time_ms() / 1000.0
            );
            report(&world, cli);
        }
    }

    info!("Final state:");
    report(&world, cli);

    let stats = world.stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.2}s", stats.time_ms / 1000.0);
    info!("Ticks: {}", stats.ticks);
    info!("Tiles: {}", stats.tiles);
    info!("Live nodes: {}", stats.live_nodes);
    info!("Edges: {}", stats.edges);
    info!("Vehicles: {}", stats.vehicles);
    info!("Waiting at intersections: {}", stats.waiting_vehicles);
    info!("Total vehicles spawned: {}", stats.vehicles_spawned);
    info!("Total vehicles removed: {}", stats.vehicles_removed);

    Ok(())
}

fn report(world: &SimWorld, cli: &Cli) {
    world.print_summary();
    info!("\n{}", world.draw_map());

    if cli.show_descriptors {
        let network = world.road_network();
        for (row, tiles) in world.tile_grid().iter().enumerate() {
            for (col, tile_type) in tiles.iter().enumerate() {
                let Some(insct) = network.intersection(row, col) else {
                    continue;
                };
                let segments: Vec<String> = insct
                    .segments()
                    .map(|(d, s)| format!("{:?}: {} -> {}", d, s.entry, s.exit))
                    .collect();
                info!(
                    "Tile ({}, {}) {:?} [{}]",
                    row,
                    col,
                    tile_type,
                    segments.join(", ")
                );
            }
        }
    }

    if cli.show_edges {
        for edge in world.edge_snapshots() {
            info!(
                "Edge {} -> {} ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                edge.source, edge.target, edge.from.x, edge.from.y, edge.to.x, edge.to.y
            );
        }
    }

    if cli.show_colliders {
        for vehicle in world.vehicle_snapshots() {
            info!(
                "Vehicle {:?} body [{}] probe [{}]",
                vehicle.id,
                format_corners(&vehicle.body),
                format_corners(&vehicle.probe)
            );
        }
    }
}

fn format_corners(corners: &[Position; 4]) -> String {
    corners
        .iter()
        .map(|c| format!("({:.1}, {:.1})", c.x, c.y))
        .collect::<Vec<_>>()
        .join(" ")
}
