//! Error taxonomy for experiment configuration, execution and reporting.

/// Errors produced by the simulation engine and its reporting shell.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter failed validation before any trial was launched.
    #[error("InvalidParameter: {name} {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A single trial failed; the whole experiment is aborted.
    #[error("TrialExecution: lambda={lambda}, repetition={repetition}: {reason}")]
    TrialExecution {
        lambda: f64,
        repetition: usize,
        reason: String,
    },

    #[error("ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Io: {0}")]
    Io(#[from] std::io::Error),

    #[error("Yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject non-positive or non-finite λ.
pub(crate) fn check_lambda(lambda: f64) -> Result<()> {
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(Error::invalid(
            "lambda",
            format!("must be a positive finite number, got {}", lambda),
        ));
    }
    Ok(())
}

/// Reject confidence levels outside the open interval (0, 1).
pub(crate) fn check_confidence(level: f64) -> Result<()> {
    if !(level > 0.0 && level < 1.0) {
        return Err(Error::invalid(
            "confidence_level",
            format!("must lie strictly between 0 and 1, got {}", level),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_lambda() {
        assert!(check_lambda(1.2).is_ok());
        assert!(check_lambda(1e-9).is_ok());
        assert!(check_lambda(0.0).is_err());
        assert!(check_lambda(-1.0).is_err());
        assert!(check_lambda(f64::NAN).is_err());
        assert!(check_lambda(f64::INFINITY).is_err());
    }

    #[test]
    fn test_check_confidence() {
        assert!(check_confidence(0.95).is_ok());
        assert!(check_confidence(0.0).is_err());
        assert!(check_confidence(1.0).is_err());
        assert!(check_confidence(f64::NAN).is_err());
    }

    #[test]
    fn test_trial_error_names_grid_point() {
        let err = Error::TrialExecution {
            lambda: 1.3,
            repetition: 17,
            reason: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("lambda=1.3"));
        assert!(msg.contains("repetition=17"));
    }
}
