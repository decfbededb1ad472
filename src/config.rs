use std::path::PathBuf;

use clap::Parser;

use crate::error::ConfigError;
use crate::shared::{ForceMethod, SimulationSettings};

/// Gravitational N-body simulation with direct or Barnes-Hut forces.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// CSV file with initial conditions. A random system is generated when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Number of bodies in the random system
    #[arg(long, default_value_t = 100)]
    pub random: usize,

    /// Seed of the random system
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Gravitational constant
    #[arg(short, long, default_value_t = 6.67430e-11, allow_negative_numbers = true)]
    pub gravity: f64,

    /// Timestep in seconds
    #[arg(long, default_value_t = 8640.0, allow_negative_numbers = true)]
    pub dt: f64,

    /// Softening length
    #[arg(long, default_value_t = 1e9, allow_negative_numbers = true)]
    pub softening: f64,

    /// Force method: direct or barnes-hut
    #[arg(short, long, default_value_t = ForceMethod::Direct)]
    pub method: ForceMethod,

    /// Barnes-Hut acceptance threshold
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub theta: f64,

    /// Stop after this many steps. Runs until interrupted when omitted.
    #[arg(long)]
    pub steps: Option<u64>,

    /// Steps between progress reports
    #[arg(long, default_value_t = 100)]
    pub report_interval: u64,
}

impl Config {
    /// Checked simulation settings for this configuration.
    pub fn settings(&self) -> Result<SimulationSettings<f64>, ConfigError> {
        let settings = SimulationSettings {
            g: self.gravity,
            dt: self.dt,
            softening: self.softening,
            method: self.method,
            theta: self.theta,
            report_interval: self.report_interval,
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["treegrav"]).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(config.input, None);
        assert_eq!(config.random, 100);
        assert_eq!(config.steps, None);
        assert_eq!(settings, SimulationSettings::default());
    }

    #[test]
    fn flags() {
        let config = Config::try_parse_from([
            "treegrav",
            "--input",
            "bodies.csv",
            "-g",
            "1",
            "--dt",
            "0.01",
            "--softening",
            "0",
            "-m",
            "BH",
            "--theta",
            "0.7",
            "--steps",
            "50",
            "--report-interval",
            "10",
        ])
        .unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(config.input, Some(PathBuf::from("bodies.csv")));
        assert_eq!(config.steps, Some(50));
        assert_eq!(settings.g, 1.0);
        assert_eq!(settings.dt, 0.01);
        assert_eq!(settings.softening, 0.0);
        assert_eq!(settings.method, ForceMethod::BarnesHut);
        assert_eq!(settings.theta, 0.7);
        assert_eq!(settings.report_interval, 10);
    }

    #[test]
    fn unknown_method_fails_parsing() {
        assert!(Config::try_parse_from(["treegrav", "--method", "fmm"]).is_err());
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        for args in [
            ["treegrav", "--gravity", "-1"],
            ["treegrav", "--dt", "0"],
            ["treegrav", "--softening", "-0.5"],
            ["treegrav", "--theta", "0"],
            ["treegrav", "--dt", "inf"],
            ["treegrav", "--report-interval", "0"],
        ] {
            let config = Config::try_parse_from(args).unwrap();
            assert!(matches!(
                config.settings(),
                Err(ConfigError::OutOfRange { .. })
            ));
        }
    }
}
