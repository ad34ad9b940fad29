/// Invalid exit weights passed to a [`WeightedRouter`](crate::WeightedRouter).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingConfigurationError {
    /// All weights are zero, so they cannot be normalized.
    #[error("exit weights sum to zero")]
    ZeroTotalWeight,
    /// The weights are finite, but their sum is not.
    #[error("exit weights sum to {0}")]
    NonFiniteTotal(f64),
    /// A weight is negative, infinite, or NaN.
    #[error("invalid weight {weight} for exit `{exit}`")]
    InvalidWeight {
        /// Name of the exit.
        exit: String,
        /// The offending weight.
        weight: f64,
    },
}

/// A router could not map a uniform draw to any of its exits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("no exit threshold covers the draw {draw}")]
pub struct SelectionError {
    /// The draw that fell outside all thresholds.
    pub draw: f64,
}

/// Topology cannot be constructed. No simulation is created when this happens.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The description is not valid JSON or does not follow the schema, e.g., a required field
    /// such as `name` or `lambda` is missing, or a number cannot be parsed.
    #[error("malformed topology description: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Reading the description failed.
    #[error("unable to read topology description: {0}")]
    Io(#[from] std::io::Error),
    /// No entrance was defined.
    #[error("topology has no entrance")]
    MissingEntrance,
    /// Arrival rate must be positive and finite.
    #[error("invalid arrival rate: {0}")]
    InvalidArrivalRate(f64),
    /// Service rate must be non-negative and finite.
    #[error("invalid service rate {mu} of station `{station}`")]
    InvalidServiceRate {
        /// Station name.
        station: String,
        /// The offending rate.
        mu: f64,
    },
    /// Bounded capacity must be positive.
    #[error("station `{0}` has zero capacity")]
    InvalidCapacity(String),
    /// Two stations share a name.
    #[error("duplicate station name: `{0}`")]
    DuplicateStation(String),
    /// Exit weights of a station are invalid.
    #[error("invalid exits of station `{station}`: {source}")]
    Routing {
        /// Station name.
        station: String,
        /// What is wrong with the weights.
        source: RoutingConfigurationError,
    },
}
