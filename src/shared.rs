// This file defines the behavior shared by the force evaluators, the integrators and the driver.

use std::fmt;
use std::str::FromStr;

use nalgebra::{RealField, Vector3, convert};

use crate::error::ConfigError;

/// Scalar type the simulation core is generic over (`f32` or `f64`).
pub trait Float: RealField + Copy {}

impl<T: RealField + Copy> Float for T {}

pub trait Particle<F: Float> {
    fn position(&self) -> &Vector3<F>;
    fn velocity(&self) -> &Vector3<F>;
    fn acceleration(&self) -> &Vector3<F>;
    fn position_mut(&mut self) -> &mut Vector3<F>;
    fn velocity_mut(&mut self) -> &mut Vector3<F>;
    fn acceleration_mut(&mut self) -> &mut Vector3<F>;
    fn get_mass(&self) -> F;
}

/// A point mass. The acceleration is recomputed every step and starts at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Body<F: Float> {
    pub position: Vector3<F>,
    pub velocity: Vector3<F>,
    pub acceleration: Vector3<F>,
    pub mass: F,
}

impl<F: Float> Body<F> {
    pub fn new(position: Vector3<F>, velocity: Vector3<F>, mass: F) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector3::zeros(),
            mass,
        }
    }
}

impl<F: Float> Particle<F> for Body<F> {
    fn position(&self) -> &Vector3<F> {
        &self.position
    }

    fn velocity(&self) -> &Vector3<F> {
        &self.velocity
    }

    fn acceleration(&self) -> &Vector3<F> {
        &self.acceleration
    }

    fn position_mut(&mut self) -> &mut Vector3<F> {
        &mut self.position
    }

    fn velocity_mut(&mut self) -> &mut Vector3<F> {
        &mut self.velocity
    }

    fn acceleration_mut(&mut self) -> &mut Vector3<F> {
        &mut self.acceleration
    }

    fn get_mass(&self) -> F {
        self.mass
    }
}

/// Fraction of the largest extent added to every face of the root cube.
const PADDING_FRACTION: f64 = 0.1;
/// Padding used when all bodies share one point and the extent is zero.
const PADDING_FLOOR: f64 = 1.0;

/// An axis-aligned cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<F: Float> {
    pub center: Vector3<F>,
    pub width: F,
}

impl<F: Float> Bounds<F> {
    pub fn new(center: Vector3<F>, width: F) -> Self {
        Self { center, width }
    }

    /// Smallest padded cube around `positions`.
    ///
    /// The cube is centered on the bounding box of the positions and its width is the largest
    /// extent of that box plus 10% of it on each side, so no position lies on a face. A zero
    /// extent (a single body, or all bodies coincident) falls back to a fixed padding.
    pub fn enclosing<'a, I>(positions: I) -> Self
    where
        I: IntoIterator<Item = &'a Vector3<F>>,
        F: 'a,
    {
        let mut positions = positions.into_iter();
        let Some(first) = positions.next() else {
            return Self::new(Vector3::zeros(), convert(2.0 * PADDING_FLOOR));
        };

        let (min, max) = positions.fold((*first, *first), |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });

        let extent = max - min;
        let largest = extent.x.max(extent.y).max(extent.z);
        let mut padding = largest * convert::<f64, F>(PADDING_FRACTION);
        if padding <= F::zero() {
            padding = convert(PADDING_FLOOR);
        }

        let center = (min + max) * convert::<f64, F>(0.5);
        Self::new(center, largest + padding * convert::<f64, F>(2.0))
    }

    pub fn half_width(&self) -> F {
        self.width * convert::<f64, F>(0.5)
    }

    pub fn min(&self) -> Vector3<F> {
        self.center.add_scalar(-self.half_width())
    }

    pub fn max(&self) -> Vector3<F> {
        self.center.add_scalar(self.half_width())
    }

    pub fn contains(&self, position: &Vector3<F>) -> bool {
        let (min, max) = (self.min(), self.max());
        (0..3).all(|axis| position[axis] >= min[axis] && position[axis] <= max[axis])
    }

    /// Octant index of `position`: bit 0 set when x >= center.x, bit 1 for y, bit 2 for z.
    pub fn get_orthant(&self, position: &Vector3<F>) -> usize {
        (0..3)
            .filter(|&axis| position[axis] >= self.center[axis])
            .fold(0, |orthant, axis| orthant | (1 << axis))
    }

    /// Sub-cube covering octant `orthant` of this cube.
    pub fn create_orthant(&self, orthant: usize) -> Self {
        let quarter = self.width * convert::<f64, F>(0.25);
        let offset = Vector3::from_fn(|axis, _| {
            if orthant & (1 << axis) != 0 {
                quarter
            } else {
                -quarter
            }
        });
        Self::new(self.center + offset, self.half_width())
    }
}

/// Which evaluator computes the accelerations each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceMethod {
    /// Exact pairwise summation.
    #[default]
    Direct,
    /// Octree approximation controlled by the acceptance threshold.
    BarnesHut,
}

impl FromStr for ForceMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "naive" => Ok(Self::Direct),
            "barnes-hut" | "barnes_hut" | "barneshut" | "bh" => Ok(Self::BarnesHut),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for ForceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::BarnesHut => write!(f, "barnes-hut"),
        }
    }
}

/// Global configuration, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings<F: Float> {
    /// Gravitational constant
    pub g: F,
    /// Fixed timestep
    pub dt: F,
    /// Softening length, added in quadrature to every separation
    pub softening: F,
    pub method: ForceMethod,
    /// Acceptance threshold for the tree walk, only used by Barnes-Hut
    pub theta: F,
    /// Steps between progress reports
    pub report_interval: u64,
}

impl<F: Float> Default for SimulationSettings<F> {
    fn default() -> Self {
        Self {
            g: convert(6.67430e-11),
            dt: convert(8640.0),
            softening: convert(1e9),
            method: ForceMethod::Direct,
            theta: convert(0.5),
            report_interval: 100,
        }
    }
}

impl<F: Float> SimulationSettings<F> {
    pub fn softening2(&self) -> F {
        self.softening * self.softening
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero = F::zero();
        check("gravitational constant", self.g, self.g > zero, "positive")?;
        check("timestep", self.dt, self.dt > zero, "positive")?;
        check(
            "softening",
            self.softening,
            self.softening >= zero,
            "non-negative",
        )?;
        check("theta", self.theta, self.theta > zero, "positive")?;
        if self.report_interval == 0 {
            return Err(ConfigError::OutOfRange {
                name: "report interval",
                value: "0".to_string(),
                expected: "at least 1",
            });
        }
        Ok(())
    }
}

fn check<F: Float>(
    name: &'static str,
    value: F,
    in_range: bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if in_range && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value: value.to_string(),
            expected,
        })
    }
}

/// Acceleration exerted on a point by `mass` located at displacement `r` from it.
///
/// Uses the softened law `g * mass * r / (|r|^2 + eps^2)^(3/2)`. With zero softening a zero
/// displacement contributes nothing rather than a NaN.
pub fn softened_pull<F: Float>(r: Vector3<F>, mass: F, g: F, softening2: F) -> Vector3<F> {
    let d2 = r.norm_squared() + softening2;
    if d2 <= F::zero() {
        return Vector3::zeros();
    }
    let d = d2.sqrt();
    r * (g * mass / (d2 * d))
}

pub trait ForceEvaluator<F: Float, P: Particle<F>> {
    /// Overwrites the acceleration of every point from the current positions.
    fn update_forces(&mut self, points: &mut [P], settings: &SimulationSettings<F>);
}

pub trait Integrator<F: Float, P: Particle<F>> {
    /// Runs before the accelerations are recomputed at the new positions.
    fn integrate_pre_force(&mut self, points: &mut [P], dt: F);
    /// Runs once the accelerations are settled for the new positions.
    fn integrate_after_force(&mut self, points: &mut [P], dt: F);
}

/// Kick-drift-kick leapfrog.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeapFrogIntegrator;

impl LeapFrogIntegrator {
    pub fn new() -> Self {
        Self
    }

    fn kick<F: Float, P: Particle<F>>(points: &mut [P], dt: F) {
        let half_dt = dt * convert::<f64, F>(0.5);
        for point in points.iter_mut() {
            let kick = point.acceleration() * half_dt;
            *point.velocity_mut() += kick;
        }
    }
}

impl<F: Float, P: Particle<F>> Integrator<F, P> for LeapFrogIntegrator {
    fn integrate_pre_force(&mut self, points: &mut [P], dt: F) {
        Self::kick(points, dt);
        for point in points.iter_mut() {
            let drift = point.velocity() * dt;
            *point.position_mut() += drift;
        }
    }

    fn integrate_after_force(&mut self, points: &mut [P], dt: F) {
        Self::kick(points, dt);
    }
}

/// Forward Euler. Not symplectic; kept as the baseline leapfrog is measured against.
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerIntegrator;

impl<F: Float, P: Particle<F>> Integrator<F, P> for EulerIntegrator {
    fn integrate_pre_force(&mut self, points: &mut [P], dt: F) {
        for point in points.iter_mut() {
            let drift = point.velocity() * dt;
            let kick = point.acceleration() * dt;
            *point.position_mut() += drift;
            *point.velocity_mut() += kick;
        }
    }

    fn integrate_after_force(&mut self, _points: &mut [P], _dt: F) {}
}

pub trait Simulation<F: Float, P: Particle<F>> {
    /// Advances the state by one timestep.
    fn step(&mut self);
    fn get_points(&self) -> &[P];
    fn settings(&self) -> &SimulationSettings<F>;
    /// Number of steps taken so far.
    fn steps(&self) -> u64;
    /// Simulated time elapsed so far.
    fn elapsed(&self) -> F;
}
