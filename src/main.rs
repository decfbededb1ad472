use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use web_time::Instant;

use treegrav::{
    config::Config,
    initial,
    shared::LeapFrogIntegrator,
    simulation::SimulationContext,
    vis::{self, HeadlessVisualizer},
};

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() -> Result<()> {
    init_logger();

    let config = Config::parse();
    let settings = config.settings().context("Invalid simulation settings")?;

    let bodies = match &config.input {
        Some(path) => initial::load_bodies(path)
            .with_context(|| format!("Failed to load bodies from {}", path.display()))?,
        None => {
            info!(
                "No input file, generating {} bodies from seed {}",
                config.random,
                config.seed
            );
            initial::random_system(config.random, config.seed, settings.g)
        }
    };

    let mut sim = SimulationContext::new(bodies, LeapFrogIntegrator::new(), settings)
        .context("Failed to set up the simulation")?;
    let mut visualizer = HeadlessVisualizer::new(config.steps);

    let start = Instant::now();
    let summary = vis::run(&mut sim, &mut visualizer);
    info!(
        "Ran {} steps in {:?} ({} s simulated)",
        summary.steps,
        start.elapsed(),
        summary.elapsed
    );

    Ok(())
}
