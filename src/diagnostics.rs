// Conserved quantities of a body set, used for progress logging and by the tests.

use nalgebra::{Vector3, convert};

use crate::shared::{Float, Particle};

pub fn total_mass<F: Float, P: Particle<F>>(points: &[P]) -> F {
    points.iter().fold(F::zero(), |total, p| total + p.get_mass())
}

pub fn total_momentum<F: Float, P: Particle<F>>(points: &[P]) -> Vector3<F> {
    points
        .iter()
        .fold(Vector3::zeros(), |total, p| total + p.velocity() * p.get_mass())
}

/// Mass-weighted mean position, or `None` for an empty set.
pub fn center_of_mass<F: Float, P: Particle<F>>(points: &[P]) -> Option<Vector3<F>> {
    let mass = total_mass(points);
    if points.is_empty() || mass <= F::zero() {
        return None;
    }
    let weighted = points
        .iter()
        .fold(Vector3::zeros(), |total, p| total + p.position() * p.get_mass());
    Some(weighted / mass)
}

pub fn kinetic_energy<F: Float, P: Particle<F>>(points: &[P]) -> F {
    let half: F = convert(0.5);
    points.iter().fold(F::zero(), |total, p| {
        total + half * p.get_mass() * p.velocity().norm_squared()
    })
}

/// Pairwise potential `-g * m_i * m_j / sqrt(r^2 + eps^2)`, consistent with the softened force.
///
/// Coincident pairs without softening are skipped.
pub fn potential_energy<F: Float, P: Particle<F>>(points: &[P], g: F, softening: F) -> F {
    let softening2 = softening * softening;
    let mut total = F::zero();
    for i in 0..points.len() {
        for j in 0..i {
            let d2 = (points[j].position() - points[i].position()).norm_squared() + softening2;
            if d2 > F::zero() {
                total -= g * points[i].get_mass() * points[j].get_mass() / d2.sqrt();
            }
        }
    }
    total
}

pub fn total_energy<F: Float, P: Particle<F>>(points: &[P], g: F, softening: F) -> F {
    kinetic_energy(points) + potential_energy(points, g, softening)
}
