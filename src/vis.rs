use log::{Level, debug, info, log_enabled, trace, warn};

use crate::diagnostics;
use crate::error::VisualizerError;
use crate::shared::{Float, ForceMethod, Particle, Simulation};

/// Receives the positions of every body once per step, as three parallel coordinate slices in
/// body order. `Ok(false)` stops the run.
///
/// A visualizer that fails or loses its output returns an error, which also stops the run.
pub trait Visualizer<F: Float> {
    fn draw(&mut self, x: &[F], y: &[F], z: &[F]) -> Result<bool, VisualizerError>;
}

impl<F: Float, T> Visualizer<F> for T
where
    T: FnMut(&[F], &[F], &[F]) -> bool,
{
    fn draw(&mut self, x: &[F], y: &[F], z: &[F]) -> Result<bool, VisualizerError> {
        Ok(self(x, y, z))
    }
}

/// Draws nothing. Stops after `limit` frames, or never.
#[derive(Debug, Clone, Default)]
pub struct HeadlessVisualizer {
    limit: Option<u64>,
    frames: u64,
}

impl HeadlessVisualizer {
    pub fn new(limit: Option<u64>) -> Self {
        Self { limit, frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl<F: Float> Visualizer<F> for HeadlessVisualizer {
    fn draw(&mut self, _x: &[F], _y: &[F], _z: &[F]) -> Result<bool, VisualizerError> {
        if self.limit.is_some_and(|limit| self.frames >= limit) {
            return Ok(false);
        }
        self.frames += 1;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary<F: Float> {
    /// Steps taken during this run
    pub steps: u64,
    /// Simulated time at the end of the run
    pub elapsed: F,
    /// Whether the run ended because the visualizer failed
    pub visualizer_failed: bool,
}

/// Steps `simulation` until `visualizer` asks to stop.
///
/// The visualizer sees the state before every step, starting with the initial conditions.
pub fn run<F, P, S, V>(simulation: &mut S, visualizer: &mut V) -> RunSummary<F>
where
    F: Float,
    P: Particle<F>,
    S: Simulation<F, P>,
    V: Visualizer<F> + ?Sized,
{
    let settings = simulation.settings().clone();
    let count = simulation.get_points().len();
    match settings.method {
        ForceMethod::Direct => info!(
            "Starting {} bodies with the {} method: dt {}, softening {}",
            count,
            settings.method,
            settings.dt,
            settings.softening
        ),
        ForceMethod::BarnesHut => info!(
            "Starting {} bodies with the {} method: dt {}, softening {}, theta {}",
            count,
            settings.method,
            settings.dt,
            settings.softening,
            settings.theta
        ),
    }

    let report_interval = settings.report_interval.max(1);
    let first_step = simulation.steps();
    let mut visualizer_failed = false;
    let (mut x, mut y, mut z) = (
        Vec::with_capacity(count),
        Vec::with_capacity(count),
        Vec::with_capacity(count),
    );
    loop {
        x.clear();
        y.clear();
        z.clear();
        for point in simulation.get_points() {
            let position = point.position();
            x.push(position.x);
            y.push(position.y);
            z.push(position.z);
        }

        match visualizer.draw(&x, &y, &z) {
            Ok(true) => {}
            Ok(false) => {
                trace!("Visualizer requested stop");
                break;
            }
            Err(e) => {
                warn!("Stopping at step {}: {}", simulation.steps(), e);
                visualizer_failed = true;
                break;
            }
        }

        simulation.step();
        let steps = simulation.steps();
        if steps % report_interval == 0 {
            info!("Step {} complete", steps);
            if log_enabled!(Level::Debug) {
                let points = simulation.get_points();
                debug!(
                    "Energy {}, momentum {}",
                    diagnostics::total_energy(points, settings.g, settings.softening),
                    diagnostics::total_momentum(points).norm()
                );
            }
        }
    }

    let summary = RunSummary {
        steps: simulation.steps() - first_step,
        elapsed: simulation.elapsed(),
        visualizer_failed,
    };
    info!(
        "Stopped after {} steps, simulated time {}",
        summary.steps,
        summary.elapsed
    );
    summary
}
