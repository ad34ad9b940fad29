use crate::{RoutingConfigurationError, SelectionError, UniformSource};

use itertools::Itertools;

/// Selects the next station from relative exit weights.
///
/// Weights are accumulated in the order they are given and normalized by their total, which
/// produces ascending thresholds in `(0, 1]`. A draw `r` selects the first exit whose threshold
/// is at least `r`. Exits with zero weight can never be selected and are dropped.
///
/// A router without exits is *terminal*: it never selects anything and consumes no draws.
///
/// ```
/// # use qnsim::WeightedRouter;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let router = WeightedRouter::new(vec![("Regal", 9.0), ("Theke", 1.0)])?;
/// assert_eq!(router.select(0.5)?, Some("Regal"));
/// assert_eq!(router.select(0.95)?, Some("Theke"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightedRouter {
    thresholds: Vec<(String, f64)>,
}

impl WeightedRouter {
    /// Constructs a router from `(exit, weight)` pairs. An empty list makes a terminal router.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingConfigurationError::InvalidWeight`] if any weight is negative or not
    /// finite, [`RoutingConfigurationError::ZeroTotalWeight`] if there are some exits but
    /// their weights sum to zero, and [`RoutingConfigurationError::NonFiniteTotal`] if the sum
    /// overflows.
    pub fn new<I, S>(weights: I) -> Result<Self, RoutingConfigurationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut exits = 0_usize;
        let mut total = 0.0;
        let mut cumulative = Vec::new();
        for (exit, weight) in weights {
            let exit = exit.into();
            if !weight.is_finite() || weight < 0.0 {
                return Err(RoutingConfigurationError::InvalidWeight { exit, weight });
            }
            exits += 1;
            total += weight;
            if weight > 0.0 {
                cumulative.push((exit, total));
            }
        }
        if exits == 0 {
            return Ok(Self::terminal());
        }
        if cumulative.is_empty() {
            return Err(RoutingConfigurationError::ZeroTotalWeight);
        }
        if !total.is_finite() {
            return Err(RoutingConfigurationError::NonFiniteTotal(total));
        }
        Ok(Self {
            thresholds: cumulative
                .into_iter()
                .map(|(exit, sum)| (exit, sum / total))
                .collect(),
        })
    }

    /// A router that always leaves the network.
    #[must_use]
    pub fn terminal() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no exits.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Iterates over exits and their normalized cumulative thresholds.
    pub fn thresholds(&self) -> impl Iterator<Item = (&str, f64)> {
        self.thresholds.iter().map(|(exit, t)| (exit.as_str(), *t))
    }

    /// Selects an exit for a `draw` from `[0, 1)`. Terminal routers always return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if the draw is not covered by any threshold, which can happen
    /// only for draws outside of `[0, 1]`.
    pub fn select(&self, draw: f64) -> Result<Option<&str>, SelectionError> {
        if self.is_terminal() {
            return Ok(None);
        }
        if draw < 0.0 {
            return Err(SelectionError { draw });
        }
        self.thresholds
            .iter()
            .find(|(_, threshold)| *threshold >= draw)
            .map(|(exit, _)| Some(exit.as_str()))
            .ok_or(SelectionError { draw })
    }

    /// Takes one draw from `source` (none if terminal) and selects an exit.
    ///
    /// # Errors
    ///
    /// See [`WeightedRouter::select`].
    pub fn route(&self, source: &mut dyn UniformSource) -> Result<Option<&str>, SelectionError> {
        if self.is_terminal() {
            Ok(None)
        } else {
            self.select(source.next_uniform())
        }
    }
}

impl std::fmt::Display for WeightedRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_terminal() {
            write!(f, "terminal")
        } else {
            write!(
                f,
                "{}",
                self.thresholds
                    .iter()
                    .map(|(exit, t)| format!("{}<={:.3}", exit, t))
                    .format(", ")
            )
        }
    }
}
