mod barnes_hut;
mod brute_force;

pub use brute_force::*;

pub use barnes_hut::*;

use crate::shared::{Float, ForceEvaluator, ForceMethod, Particle, SimulationSettings};

/// The force evaluator selected by [`ForceMethod`], resolved once when a simulation is set up.
#[derive(Debug, Clone, Copy)]
pub enum ForceStrategy {
    Direct(BruteForce),
    BarnesHut(BarnesHut),
}

impl ForceStrategy {
    pub fn method(&self) -> ForceMethod {
        match self {
            Self::Direct(_) => ForceMethod::Direct,
            Self::BarnesHut(_) => ForceMethod::BarnesHut,
        }
    }
}

impl From<ForceMethod> for ForceStrategy {
    fn from(method: ForceMethod) -> Self {
        match method {
            ForceMethod::Direct => Self::Direct(BruteForce),
            ForceMethod::BarnesHut => Self::BarnesHut(BarnesHut::new()),
        }
    }
}

impl<F: Float, P: Particle<F>> ForceEvaluator<F, P> for ForceStrategy {
    fn update_forces(&mut self, points: &mut [P], settings: &SimulationSettings<F>) {
        match self {
            Self::Direct(evaluator) => evaluator.update_forces(points, settings),
            Self::BarnesHut(evaluator) => evaluator.update_forces(points, settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;
    use crate::shared::Body;

    #[test]
    fn strategy_follows_method() {
        for method in [ForceMethod::Direct, ForceMethod::BarnesHut] {
            assert_eq!(ForceStrategy::from(method).method(), method);
        }
        assert!(matches!(
            ForceStrategy::from(ForceMethod::BarnesHut),
            ForceStrategy::BarnesHut(evaluator) if evaluator.max_depth() == DEFAULT_MAX_DEPTH
        ));
    }

    #[test]
    fn both_strategies_agree_on_two_bodies() {
        let bodies = vec![
            Body::new(Vector3::new(0.0, 0.0, 0.0), Vector3::zeros(), 5.0),
            Body::new(Vector3::new(2.0, 0.0, 0.0), Vector3::zeros(), 1.0),
        ];
        let settings = SimulationSettings {
            g: 1.0,
            softening: 0.0,
            ..Default::default()
        };

        let mut direct = bodies.clone();
        ForceStrategy::from(ForceMethod::Direct).update_forces(&mut direct, &settings);
        let mut tree = bodies;
        ForceStrategy::from(ForceMethod::BarnesHut).update_forces(&mut tree, &settings);

        for (a, b) in direct.iter().zip(&tree) {
            assert!((a.acceleration - b.acceleration).norm() < 1e-12);
        }
    }
}
