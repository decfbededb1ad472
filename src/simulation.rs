use log::debug;

use crate::error::SimulationError;
use crate::force::ForceStrategy;
use crate::shared::{
    Body, Float, ForceEvaluator, Integrator, LeapFrogIntegrator, Particle, Simulation,
    SimulationSettings,
};

/// Bodies plus everything needed to advance them: settings, the resolved force strategy and the
/// integrator.
#[derive(Debug, Clone)]
pub struct SimulationContext<F: Float, P = Body<F>, I = LeapFrogIntegrator>
where
    P: Particle<F>,
    I: Integrator<F, P>,
{
    points: Vec<P>,
    settings: SimulationSettings<F>,
    force: ForceStrategy,
    integrator: I,
    steps: u64,
    elapsed: F,
}

impl<F: Float, P, I> SimulationContext<F, P, I>
where
    P: Particle<F>,
    I: Integrator<F, P>,
{
    /// Validates the settings and masses and resolves the force method.
    ///
    /// Accelerations are left as given (zero for freshly loaded bodies), so the first half kick
    /// of the first step does nothing.
    pub fn new(
        points: Vec<P>,
        integrator: I,
        settings: SimulationSettings<F>,
    ) -> Result<Self, SimulationError> {
        settings.validate()?;
        if let Some((index, point)) = points
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.get_mass() > F::zero() && p.get_mass().is_finite()))
        {
            return Err(SimulationError::InvalidMass {
                index,
                mass: point.get_mass().to_string(),
            });
        }

        debug!(
            "Simulation context with {} bodies using the {} method",
            points.len(),
            settings.method
        );
        Ok(Self {
            points,
            force: ForceStrategy::from(settings.method),
            settings,
            integrator,
            steps: 0,
            elapsed: F::zero(),
        })
    }

    pub fn force(&self) -> &ForceStrategy {
        &self.force
    }

    pub fn into_points(self) -> Vec<P> {
        self.points
    }

    /// Recomputes every acceleration from the current positions.
    pub fn update_forces(&mut self) {
        self.force.update_forces(&mut self.points, &self.settings);
    }
}

impl<F: Float, P, I> Simulation<F, P> for SimulationContext<F, P, I>
where
    P: Particle<F>,
    I: Integrator<F, P>,
{
    fn step(&mut self) {
        let dt = self.settings.dt;
        self.integrator.integrate_pre_force(&mut self.points, dt);
        self.update_forces();
        self.integrator.integrate_after_force(&mut self.points, dt);
        self.elapsed += dt;
        self.steps += 1;
    }

    fn get_points(&self) -> &[P] {
        &self.points
    }

    fn settings(&self) -> &SimulationSettings<F> {
        &self.settings
    }

    fn steps(&self) -> u64 {
        self.steps
    }

    fn elapsed(&self) -> F {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;
    use crate::error::ConfigError;
    use crate::shared::{EulerIntegrator, ForceMethod};

    fn two_bodies() -> Vec<Body<f64>> {
        vec![
            Body::new(Vector3::new(-1.0, 0.0, 0.0), Vector3::new(0.0, -0.5, 0.0), 1.0),
            Body::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.5, 0.0), 1.0),
        ]
    }

    fn settings() -> SimulationSettings<f64> {
        SimulationSettings {
            g: 1.0,
            dt: 0.01,
            softening: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_non_positive_mass() {
        let mut bodies = two_bodies();
        bodies[1].mass = 0.0;
        let result = SimulationContext::new(bodies, LeapFrogIntegrator::new(), settings());
        assert!(matches!(
            result,
            Err(SimulationError::InvalidMass { index: 1, .. })
        ));

        let mut bodies = two_bodies();
        bodies[0].mass = f64::NAN;
        let result = SimulationContext::new(bodies, LeapFrogIntegrator::new(), settings());
        assert!(matches!(
            result,
            Err(SimulationError::InvalidMass { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_invalid_settings() {
        let settings = SimulationSettings {
            dt: 0.0,
            ..settings()
        };
        let result = SimulationContext::new(two_bodies(), LeapFrogIntegrator::new(), settings);
        assert!(matches!(
            result,
            Err(SimulationError::Config(ConfigError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn resolves_method_once() {
        let settings = SimulationSettings {
            method: ForceMethod::BarnesHut,
            ..settings()
        };
        let sim = SimulationContext::new(two_bodies(), LeapFrogIntegrator::new(), settings)
            .unwrap();
        assert_eq!(sim.force().method(), ForceMethod::BarnesHut);
    }

    #[test]
    fn step_advances_counters() {
        let mut sim =
            SimulationContext::new(two_bodies(), LeapFrogIntegrator::new(), settings()).unwrap();
        assert_eq!(sim.steps(), 0);
        for _ in 0..10 {
            sim.step();
        }
        assert_eq!(sim.steps(), 10);
        assert!((sim.elapsed() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn step_keeps_masses_and_order() {
        let bodies = two_bodies();
        let mut sim =
            SimulationContext::new(bodies.clone(), LeapFrogIntegrator::new(), settings()).unwrap();
        for _ in 0..100 {
            sim.step();
        }
        let masses: Vec<f64> = sim.get_points().iter().map(|p| p.mass).collect();
        assert_eq!(masses, vec![1.0, 1.0]);
        assert!(sim.get_points()[0].position.x < 0.0);
        assert!(sim.get_points()[1].position.x > 0.0);
    }

    #[test]
    fn first_step_kicks_with_settled_forces() {
        let mut sim =
            SimulationContext::new(two_bodies(), LeapFrogIntegrator::new(), settings()).unwrap();
        sim.step();

        let right = &sim.get_points()[1];
        let expected = *right.acceleration();
        assert!(expected.x < 0.0);
        // Only the closing half kick used a non-zero acceleration.
        assert!((right.velocity.x - expected.x * 0.005).abs() < 1e-12);
    }

    #[test]
    fn works_with_euler() {
        let mut sim =
            SimulationContext::new(two_bodies(), EulerIntegrator, settings()).unwrap();
        sim.step();
        assert_eq!(sim.steps(), 1);
        assert!(sim.into_points().iter().all(|p| p.position.iter().all(|x| x.is_finite())));
    }
}
