/// Host-side contract violations, reported before a tick starts.
///
/// Nothing inside a tick can fail; these only come from setup, parameter
/// updates and scenario I/O.
#[derive(Debug)]
pub enum SimError {
    /// Dispatch width of zero cannot map any lane to a particle.
    ZeroWidth,
    /// Time step must be finite and positive.
    InvalidTimeStep(f32),
    /// Particle count is fixed for the lifetime of a store.
    ParticleCountMismatch { expected: usize, found: usize },
    /// A config field is out of range.
    InvalidConfig(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::ZeroWidth => write!(f, "dispatch width must be at least 1"),
            SimError::InvalidTimeStep(dt) => write!(f, "invalid time step: {}", dt),
            SimError::ParticleCountMismatch { expected, found } => write!(
                f,
                "particle count mismatch: store holds {}, got {}",
                expected, found
            ),
            SimError::InvalidConfig(reason) => write!(f, "invalid config: {}", reason),
            SimError::Io(e) => write!(f, "I/O error: {}", e),
            SimError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            SimError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Json(e)
    }
}
