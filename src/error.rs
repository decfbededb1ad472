use thiserror::Error;

/// Errors raised while validating the simulation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The force method name is not one of the supported strategies
    #[error("Unknown force method '{0}', expected 'direct' or 'barnes-hut'")]
    UnknownMethod(String),

    /// A numeric parameter is outside its valid range
    #[error("Invalid value {value} for {name}: must be {expected}")]
    OutOfRange {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Errors raised while reading initial conditions.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read initial conditions: {0}")]
    Io(#[from] std::io::Error),

    #[error("Initial conditions file has no header line")]
    MissingHeader,

    #[error("Initial conditions header has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("Line {line}: missing value for '{column}'")]
    MissingValue { line: usize, column: &'static str },

    #[error("Line {line}: invalid number '{value}' for '{column}'")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("Line {line}: mass must be positive and finite, got {mass}")]
    InvalidMass { line: usize, mass: f64 },
}

/// Errors raised when a simulation context is constructed.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Zero, negative or non-finite mass would produce undefined accelerations
    #[error("Body {index} has invalid mass {mass}: masses must be positive and finite")]
    InvalidMass { index: usize, mass: String },
}

/// Errors a visualizer reports instead of drawing a frame. The driver stops on any of them.
#[derive(Debug, Error)]
pub enum VisualizerError {
    #[error("Visualizer output is unavailable: {0}")]
    Unavailable(String),

    #[error("Visualizer failed to write a frame: {0}")]
    Io(#[from] std::io::Error),
}
