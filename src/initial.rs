use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use nalgebra::Vector3;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::LoadError;
use crate::shared::Body;

const COLUMNS: [&str; 7] = [
    "mass",
    "distanceX",
    "distanceY",
    "distanceZ",
    "velocityX",
    "velocityY",
    "velocityZ",
];

/// Mass of the central body of a random system, in kg.
pub const CENTRAL_MASS: f64 = 1.989e30;
/// Astronomical unit, in m.
pub const AU: f64 = 1.496e11;

/// Reads bodies from the CSV file at `path`.
pub fn load_bodies(path: impl AsRef<Path>) -> Result<Vec<Body<f64>>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let bodies = from_reader(BufReader::new(file))?;
    info!("Loaded {} bodies from {}", bodies.len(), path.display());
    Ok(bodies)
}

/// Parses bodies from CSV text.
///
/// The first line is a header naming the columns `mass`, `distanceX`, `distanceY`, `distanceZ`,
/// `velocityX`, `velocityY` and `velocityZ`, in any order; other columns are ignored. Each
/// following non-blank line is one body, in order.
pub fn from_reader<R: BufRead>(reader: R) -> Result<Vec<Body<f64>>, LoadError> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(LoadError::MissingHeader),
    };
    if header.trim().is_empty() {
        return Err(LoadError::MissingHeader);
    }

    let names: Vec<&str> = header.split(',').map(str::trim).collect();
    let mut indices = [0; COLUMNS.len()];
    for (slot, column) in indices.iter_mut().zip(COLUMNS) {
        *slot = names
            .iter()
            .position(|&name| name == column)
            .ok_or(LoadError::MissingColumn(column))?;
    }

    let mut bodies = Vec::new();
    for (line_idx, line) in lines.enumerate() {
        let line = line?;
        // The header is line 1.
        let line_number = line_idx + 2;
        if line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let mut values = [0.0_f64; COLUMNS.len()];
        for ((value, &index), column) in values.iter_mut().zip(&indices).zip(COLUMNS) {
            let text = parts
                .get(index)
                .filter(|text| !text.is_empty())
                .ok_or(LoadError::MissingValue {
                    line: line_number,
                    column,
                })?;
            *value = text.parse().map_err(|_| LoadError::InvalidNumber {
                line: line_number,
                column,
                value: text.to_string(),
            })?;
        }

        let [mass, x, y, z, vx, vy, vz] = values;
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(LoadError::InvalidMass {
                line: line_number,
                mass,
            });
        }
        bodies.push(Body::new(
            Vector3::new(x, y, z),
            Vector3::new(vx, vy, vz),
            mass,
        ));
    }
    Ok(bodies)
}

/// A seeded system of one heavy central body and `count - 1` lighter bodies on near-circular
/// orbits around it, in SI units.
///
/// Orbital radii lie between 0.3 and 5 AU in a thin disc; speeds are the circular speed around
/// the central mass alone, so the system stays bound for the constant `g` it is generated for.
pub fn random_system(count: usize, seed: u64, g: f64) -> Vec<Body<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bodies = Vec::with_capacity(count);
    if count == 0 {
        return bodies;
    }
    bodies.push(Body::new(Vector3::zeros(), Vector3::zeros(), CENTRAL_MASS));

    for _ in 1..count {
        let radius = rng.random_range(0.3_f64..5.0) * AU;
        let angle = rng.random_range(0.0..std::f64::consts::TAU);
        let height = rng.random_range(-0.01_f64..0.01) * radius;
        let mass = 10f64.powf(rng.random_range(23.0..26.0));

        let (sin, cos) = angle.sin_cos();
        let speed = (g * CENTRAL_MASS / radius).sqrt();
        bodies.push(Body::new(
            Vector3::new(radius * cos, radius * sin, height),
            Vector3::new(-speed * sin, speed * cos, 0.0),
            mass,
        ));
    }
    debug!("Generated {} bodies from seed {}", bodies.len(), seed);
    bodies
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const SAMPLE: &str = "\
name,mass,distanceX,distanceY,distanceZ,velocityX,velocityY,velocityZ
sun,1.989e30,0,0,0,0,0,0
earth,5.972e24,1.496e11,0,0,0,29780,0
";

    #[test]
    fn parses_bodies_in_order() {
        let bodies = from_reader(Cursor::new(SAMPLE)).unwrap();

        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].mass, 1.989e30);
        assert_eq!(bodies[1].position, Vector3::new(1.496e11, 0.0, 0.0));
        assert_eq!(bodies[1].velocity, Vector3::new(0.0, 29780.0, 0.0));
        assert_eq!(bodies[1].acceleration, Vector3::zeros());
    }

    #[test]
    fn columns_are_found_by_name() {
        let text = "velocityZ,velocityY,velocityX,distanceZ,distanceY,distanceX,mass\n\
                    6,5,4,3,2,1,7\n\n";
        let bodies = from_reader(Cursor::new(text)).unwrap();

        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].mass, 7.0);
        assert_eq!(bodies[0].position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(bodies[0].velocity, Vector3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(
            from_reader(Cursor::new("")),
            Err(LoadError::MissingHeader)
        ));
    }

    #[test]
    fn missing_column() {
        let text = "mass,distanceX,distanceY,distanceZ,velocityX,velocityY\n1,0,0,0,0,0\n";
        assert!(matches!(
            from_reader(Cursor::new(text)),
            Err(LoadError::MissingColumn("velocityZ"))
        ));
    }

    #[test]
    fn bad_number_reports_line() {
        let text = SAMPLE.replace("29780", "fast");
        assert!(matches!(
            from_reader(Cursor::new(text)),
            Err(LoadError::InvalidNumber { line: 3, column: "velocityY", value }) if value == "fast"
        ));
    }

    #[test]
    fn short_row_is_missing_a_value() {
        let text = "mass,distanceX,distanceY,distanceZ,velocityX,velocityY,velocityZ\n1,0,0\n";
        assert!(matches!(
            from_reader(Cursor::new(text)),
            Err(LoadError::MissingValue { line: 2, column: "distanceZ" })
        ));
    }

    #[test]
    fn non_positive_mass_is_rejected() {
        let text = SAMPLE.replace("5.972e24", "-1");
        assert!(matches!(
            from_reader(Cursor::new(text)),
            Err(LoadError::InvalidMass { line: 3, .. })
        ));
    }

    #[test]
    fn non_finite_mass_is_rejected() {
        for mass in ["inf", "NaN"] {
            let text = SAMPLE.replace("1.989e30", mass);
            assert!(matches!(
                from_reader(Cursor::new(text)),
                Err(LoadError::InvalidMass { line: 2, .. })
            ));
        }
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            load_bodies("/nonexistent/bodies.csv"),
            Err(LoadError::Io(_))
        ));
    }

    #[test]
    fn random_system_is_seeded() {
        let g: f64 = 6.67430e-11;
        let first = random_system(50, 9, g);
        let second = random_system(50, 9, g);
        let other = random_system(50, 10, g);

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.len(), 50);
        assert_eq!(first[0].mass, CENTRAL_MASS);
        assert!(first.iter().all(|b| b.mass > 0.0));
    }

    #[test]
    fn random_orbits_are_circular() {
        let g: f64 = 6.67430e-11;
        for body in random_system(20, 1, g).iter().skip(1) {
            let r = body.position.xy().norm();
            assert!((0.3 * AU..5.0 * AU).contains(&r));
            let radial = body.position.xy().dot(&body.velocity.xy());
            assert!(radial.abs() < 1e-6 * r * body.velocity.norm());
            let speed = (g * CENTRAL_MASS / body.position.norm()).sqrt();
            assert!((body.velocity.norm() - speed).abs() < 1e-3 * speed);
        }
        assert!(random_system(0, 1, g).is_empty());
        assert_eq!(random_system(1, 1, g).len(), 1);
    }
}
