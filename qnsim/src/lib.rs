//! Discrete-event simulation of a queueing network.
//!
//! Customers enter the network at a designated entrance, following a Poisson arrival process,
//! and travel from station to station. Each station has a service rate, a service desk of
//! limited capacity, a FIFO waiting queue, and a [`WeightedRouter`] choosing where a customer
//! goes next. The [`Simulation`] is advanced one event at a time, and its state can be inspected
//! between the steps with [`Simulation::status`] and [`Simulation::peek_next_event`].
//!
//! ```
//! # use qnsim::{Simulation, Step, Topology};
//! # fn main() -> Result<(), qnsim::SelectionError> {
//! let mut simulation = Simulation::with_seed(Topology::cheese_shop(), 17);
//! assert!(matches!(simulation.advance()?, Step::Dispatched(_)));
//! assert_eq!(simulation.time(), 0.0);
//! println!("{}", simulation.status(Default::default()));
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_precision_loss
)]

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod error;
pub use error::{ConfigurationError, RoutingConfigurationError, SelectionError};

mod random;
pub use random::{exponential, ReplaySource, RngSource, UniformSource};

mod router;
pub use router::WeightedRouter;

mod station;
pub use station::{ServiceDesk, Station};

mod scheduler;
pub use scheduler::{Event, Scheduler};

pub mod topology;
pub use topology::{Topology, TopologyBuilder, TopologyDescription};

mod status;
pub use status::{format_time, RenderOptions, StationStatus, StatusSnapshot};

mod simulation;
pub use simulation::{Dispatched, EventDescription, Outcome, Simulation, Step};

/// Station ID: the position of the station in the order of registration.
#[derive(
    From,
    Into,
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
pub struct StationId(usize);

/// Customer ID, displayed as `K_<n>`. Customers are numbered from 1 in order of arrival.
#[derive(
    From,
    Into,
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
#[display(fmt = "K_{}", _0)]
pub struct CustomerId(u64);

/// Number of customers a station can serve at the same time.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Capacity {
    /// At most this many customers. Must be positive.
    Bounded(usize),
    /// No limit.
    Unbounded,
}

impl Default for Capacity {
    fn default() -> Self {
        Self::Unbounded
    }
}

impl Capacity {
    /// Whether another customer fits next to `occupied` ones.
    #[must_use]
    pub fn admits(self, occupied: usize) -> bool {
        match self {
            Self::Bounded(limit) => occupied < limit,
            Self::Unbounded => true,
        }
    }
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounded(limit) => write!(f, "{}", limit),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}
