use thiserror::Error;

/// Errors raised by the collision core.
///
/// Construction-time problems (`InvalidGrid`) abort model construction, so a
/// model that exists can always be sampled. Per-sample problems (`Domain`,
/// `NumericalFailure`) abort only the current sample or collision.
#[derive(Error, Debug)]
pub enum CollisionError {
    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Numerical failure at energy {energy} MeV (parameter = {parameter}): {message}")]
    NumericalFailure {
        energy: f64,
        parameter: f64,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CollisionResult<T> = Result<T, CollisionError>;

/// Reject energies that are negative or not finite.
pub(crate) fn check_energy(energy: f64) -> CollisionResult<()> {
    if !energy.is_finite() || energy < 0.0 {
        return Err(CollisionError::Domain(format!(
            "energy {} is not a finite, non-negative value",
            energy
        )));
    }
    Ok(())
}

/// Reject random numbers outside [0, 1].
pub(crate) fn check_random_number(random_number: f64) -> CollisionResult<()> {
    if !(0.0..=1.0).contains(&random_number) {
        return Err(CollisionError::Domain(format!(
            "random number {} is outside [0, 1]",
            random_number
        )));
    }
    Ok(())
}
