use crate::shared::{Float, ForceEvaluator, Particle, SimulationSettings};

/// Exact O(N²) softened gravity. Every pair is visited once and both bodies are updated.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl<F: Float, P: Particle<F>> ForceEvaluator<F, P> for BruteForce {
    fn update_forces(&mut self, points: &mut [P], settings: &SimulationSettings<F>) {
        for point in points.iter_mut() {
            point.acceleration_mut().fill(F::zero());
        }

        let g_soft2 = settings.softening2();
        for i in 0..points.len() {
            for j in 0..i {
                let r = points[j].position() - points[i].position();
                let r2 = r.norm_squared() + g_soft2;
                if r2 <= F::zero() {
                    continue;
                }
                let r_dist = r2.sqrt();
                let force = settings.g / (r2 * r_dist);
                let m_i = points[i].get_mass();
                let m_j = points[j].get_mass();
                *points[i].acceleration_mut() += r * (force * m_j);
                *points[j].acceleration_mut() -= r * (force * m_i);
            }
        }
    }
}
