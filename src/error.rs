use thiserror::Error;

/// Why a chain could not be packed for simulation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("a simulated chain must contain at least two bones, found {0}")]
    TooShort(usize),
}

/// Rejected physics settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("solver iterations must be at least 1")]
    NoSolverIterations,
    #[error("base frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f32),
    #[error("hitch threshold must be finite and positive, got {0}")]
    InvalidHitchThreshold(f32),
    #[error("gravity must be finite")]
    NonFiniteGravity,
}

#[derive(Error, Debug)]
pub enum FuwaError {
    #[error("invalid physics settings")]
    Settings(#[from] SettingsError),
}

pub type Result<T> = std::result::Result<T, FuwaError>;
