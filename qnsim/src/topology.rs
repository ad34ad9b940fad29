//! Anything related to setting up the network: the topology description format, the builder,
//! and the built-in shops.

use crate::{Capacity, ConfigurationError, Station, StationId, WeightedRouter};

use std::collections::HashSet;
use std::io::Read;

use serde::{Deserialize, Serialize};

/// A single exit of a station with its relative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitDescription {
    /// Name of the successor station.
    #[serde(rename = "exitname")]
    pub name: String,
    /// Relative weight; weights of a station do not need to sum to 1.
    pub p: f64,
}

/// The entrance of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntranceDescription {
    /// Station name.
    pub name: String,
    /// Where customers go after entering.
    pub exits: Vec<ExitDescription>,
}

/// An interior station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDescription {
    /// Station name.
    pub name: String,
    /// Service rate; zero if missing.
    #[serde(default)]
    pub mu: Option<f64>,
    /// Capacity of the service desk; unbounded if missing.
    #[serde(default, rename = "maxServiceSize")]
    pub max_service_size: Option<usize>,
    /// Exits; a station without exits is where customers leave the network.
    #[serde(default)]
    pub exits: Vec<ExitDescription>,
}

/// Topology description as read from a JSON document.
///
/// # Example
///
/// ```
/// # use qnsim::TopologyDescription;
/// # fn main() -> Result<(), serde_json::Error> {
/// let description: TopologyDescription = serde_json::from_str(r#"{
///     "name": "Kiosk",
///     "lambda": 1.5,
///     "entrance": { "name": "Door", "exits": [{ "exitname": "Till", "p": 1 }] },
///     "stations": [
///         { "name": "Till", "mu": 2.0, "maxServiceSize": 1, "exits": [{ "exitname": "Out", "p": 1 }] },
///         { "name": "Out" }
///     ]
/// }"#)?;
/// assert_eq!(description.stations.len(), 2);
/// assert_eq!(description.stations[0].max_service_size, Some(1));
/// assert_eq!(description.stations[1].mu, None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyDescription {
    /// Descriptive title.
    pub name: String,
    /// Arrival rate at the entrance.
    pub lambda: f64,
    /// The entrance.
    pub entrance: EntranceDescription,
    /// All other stations, in display order.
    #[serde(default)]
    pub stations: Vec<StationDescription>,
}

fn exit_pairs(exits: &[ExitDescription]) -> Vec<(String, f64)> {
    exits.iter().map(|e| (e.name.clone(), e.p)).collect()
}

struct StationEntry {
    name: String,
    service_rate: f64,
    capacity: Capacity,
    exits: Vec<(String, f64)>,
}

/// Collects station definitions and validates them all at once in [`TopologyBuilder::build`].
pub struct TopologyBuilder {
    title: String,
    lambda: f64,
    entrance: Option<usize>,
    stations: Vec<StationEntry>,
}

impl TopologyBuilder {
    /// Defines the entrance. It has no service time and unbounded capacity.
    /// Stations are displayed in the order they are defined, the entrance included.
    #[must_use]
    pub fn entrance<S, E>(mut self, name: S, exits: &[(E, f64)]) -> Self
    where
        S: Into<String>,
        E: AsRef<str>,
    {
        self.entrance = Some(self.stations.len());
        self.station(name, 0.0, Capacity::Unbounded, exits)
    }

    /// Defines a station. An empty `exits` list makes it a network exit.
    #[must_use]
    pub fn station<S, E>(
        mut self,
        name: S,
        service_rate: f64,
        capacity: Capacity,
        exits: &[(E, f64)],
    ) -> Self
    where
        S: Into<String>,
        E: AsRef<str>,
    {
        self.stations.push(StationEntry {
            name: name.into(),
            service_rate,
            capacity,
            exits: exits
                .iter()
                .map(|(exit, p)| (exit.as_ref().to_string(), *p))
                .collect(),
        });
        self
    }

    /// Validates the definitions and constructs the topology.
    ///
    /// Exits naming unknown stations are accepted, but customers routed there leave the
    /// network; a warning is logged for each of them.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when the arrival rate is not positive, the entrance is
    /// missing, names are not unique, a service rate is negative, a capacity is zero, or exit
    /// weights are invalid.
    pub fn build(self) -> Result<Topology, ConfigurationError> {
        if !self.lambda.is_finite() || self.lambda <= 0.0 {
            return Err(ConfigurationError::InvalidArrivalRate(self.lambda));
        }
        let entrance = self.entrance.ok_or(ConfigurationError::MissingEntrance)?;
        let mut names = HashSet::new();
        for entry in &self.stations {
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigurationError::DuplicateStation(entry.name.clone()));
            }
        }
        for entry in &self.stations {
            for (exit, _) in &entry.exits {
                if !names.contains(exit.as_str()) {
                    log::warn!(
                        "Station `{}` routes to unknown station `{}`; customers sent there leave the network",
                        entry.name,
                        exit
                    );
                }
            }
        }
        let stations = self
            .stations
            .into_iter()
            .map(|entry| {
                if !entry.service_rate.is_finite() || entry.service_rate < 0.0 {
                    return Err(ConfigurationError::InvalidServiceRate {
                        station: entry.name,
                        mu: entry.service_rate,
                    });
                }
                if entry.capacity == Capacity::Bounded(0) {
                    return Err(ConfigurationError::InvalidCapacity(entry.name));
                }
                let router = match WeightedRouter::new(entry.exits) {
                    Ok(router) => router,
                    Err(source) => {
                        return Err(ConfigurationError::Routing {
                            station: entry.name,
                            source,
                        })
                    }
                };
                log::debug!(
                    "Station `{}`: mu={}, capacity={}, exits: {}",
                    entry.name,
                    entry.service_rate,
                    entry.capacity,
                    router
                );
                Ok(Station::new(
                    entry.name,
                    entry.service_rate,
                    entry.capacity,
                    router,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Topology {
            title: self.title,
            lambda: self.lambda,
            stations,
            entrance: StationId::from(entrance),
        })
    }
}

/// A validated network: stations in display order, one of which is the entrance.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    title: String,
    lambda: f64,
    stations: Vec<Station>,
    entrance: StationId,
}

impl Topology {
    /// Starts building a topology with the given title and arrival rate.
    #[must_use]
    pub fn builder<S: Into<String>>(title: S, lambda: f64) -> TopologyBuilder {
        TopologyBuilder {
            title: title.into(),
            lambda,
            entrance: None,
            stations: Vec::new(),
        }
    }

    /// Constructs a topology from a parsed description.
    ///
    /// # Errors
    ///
    /// See [`TopologyBuilder::build`].
    pub fn from_description(description: TopologyDescription) -> Result<Self, ConfigurationError> {
        let builder = Self::builder(description.name, description.lambda).entrance(
            description.entrance.name,
            exit_pairs(&description.entrance.exits).as_slice(),
        );
        description
            .stations
            .into_iter()
            .fold(builder, |builder, station| {
                let capacity = station
                    .max_service_size
                    .map_or(Capacity::Unbounded, Capacity::Bounded);
                builder.station(
                    station.name,
                    station.mu.unwrap_or(0.0),
                    capacity,
                    exit_pairs(&station.exits).as_slice(),
                )
            })
            .build()
    }

    /// Parses a JSON topology description and constructs the topology.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Malformed`] if the document does not follow the schema,
    /// or any of the errors listed in [`TopologyBuilder::build`].
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Self::from_description(serde_json::from_str(json)?)
    }

    /// Same as [`Topology::from_json`] but reads the document from `reader`.
    ///
    /// # Errors
    ///
    /// See [`Topology::from_json`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigurationError> {
        Self::from_description(serde_json::from_reader(reader)?)
    }

    /// The cheese shop ("Käseladen"): customers pick cheese from a shelf ("Regal") or get it
    /// at a service counter ("Theke"), and pay at one of three tills ("Kasse").
    #[must_use]
    pub fn cheese_shop() -> Self {
        Self::builder("Käseladen", 100.0 / 60.0)
            .entrance("Eingang", &[("Regal", 0.9), ("Theke", 0.1)])
            .station(
                "Regal",
                30.0 / 60.0,
                Capacity::Unbounded,
                &[("Theke", 1.0), ("Kasse", 8.0)],
            )
            .station("Theke", 25.0 / 60.0, Capacity::Bounded(1), &[("Kasse", 1.0)])
            .station("Kasse", 40.0 / 60.0, Capacity::Bounded(3), &[("Ausgang", 1.0)])
            .station::<_, &str>("Ausgang", 0.0, Capacity::Unbounded, &[])
            .build()
            .expect("built-in topology must be valid")
    }

    /// The cheese shop with an additional tasting station ("Probierstand") for two customers
    /// at a time, visited by 30% of the customers right after entering.
    #[must_use]
    pub fn cheese_shop_with_tasting_station() -> Self {
        Self::builder("Käseladen mit Probierstand", 100.0 / 60.0)
            .entrance(
                "Eingang",
                &[
                    ("Probierstand", 0.3),
                    ("Regal", 0.7 * 8.0 / 9.0),
                    ("Theke", 0.7 / 9.0),
                ],
            )
            .station(
                "Probierstand",
                40.0 / 60.0,
                Capacity::Bounded(2),
                &[("Kasse", 0.2), ("Regal", 0.8 * 0.7), ("Theke", 0.8 * 0.3)],
            )
            .station(
                "Regal",
                30.0 / 60.0,
                Capacity::Unbounded,
                &[("Theke", 1.0), ("Kasse", 8.0)],
            )
            .station("Theke", 25.0 / 60.0, Capacity::Bounded(1), &[("Kasse", 1.0)])
            .station("Kasse", 40.0 / 60.0, Capacity::Bounded(3), &[("Ausgang", 1.0)])
            .station::<_, &str>("Ausgang", 0.0, Capacity::Unbounded, &[])
            .build()
            .expect("built-in topology must be valid")
    }

    /// Descriptive title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Arrival rate at the entrance.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Stations in display order.
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// ID of the entrance.
    #[must_use]
    pub fn entrance(&self) -> StationId {
        self.entrance
    }

    pub(crate) fn into_parts(self) -> (String, f64, Vec<Station>, StationId) {
        (self.title, self.lambda, self.stations, self.entrance)
    }
}
