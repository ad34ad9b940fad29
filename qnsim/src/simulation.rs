use crate::{
    format_time, CustomerId, Event, RenderOptions, RngSource, Scheduler, SelectionError, Station,
    StationId, StationStatus, StatusSnapshot, Topology, UniformSource,
};

use std::collections::HashMap;
use std::fmt;

/// What happened to the customer of a dispatched event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Admitted into service and scheduled to arrive at `next` at `departure`.
    Routed {
        /// The successor station.
        next: StationId,
        /// Time of the arrival at the successor.
        departure: f64,
    },
    /// Admitted into service at a station without exits, where it stays for good.
    Exited,
    /// Admitted into service, but routed to a station that does not exist.
    /// The customer is not followed any further.
    UnknownSuccessor(String),
    /// The service desk was full; the customer waits until a slot is freed.
    Waiting,
    /// A freed slot had already been taken, and nobody else was waiting.
    Stale,
}

/// A processed event and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// The event taken from the scheduler.
    pub event: Event,
    /// The customer admitted or parked. Differs from `event.customer` only when a freed slot
    /// was handed over to the next waiting customer.
    pub customer: CustomerId,
    /// What happened.
    pub outcome: Outcome,
}

/// Result of a single [`Simulation::advance`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// No events were pending. The clock has been reset to 0.
    Idle,
    /// One event has been processed.
    Dispatched(Dispatched),
}

/// Human-readable form of an [`Event`], with station names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDescription {
    /// Target station.
    pub target: String,
    /// Origin station, if any.
    pub origin: Option<String>,
    /// Event time.
    pub time: f64,
    /// The customer.
    pub customer: CustomerId,
}

impl fmt::Display for EventDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.customer, self.target)?;
        if let Some(origin) = &self.origin {
            write!(f, " from {}", origin)?;
        }
        write!(f, " [{}]", format_time(self.time))
    }
}

/// The simulation engine.
///
/// Owns the stations, the event scheduler, and the clock, measured in minutes.
/// The network starts with a single arrival of `K_1` at the entrance at time 0, and each
/// call to [`Simulation::advance`] processes exactly one event.
///
/// # Randomness
///
/// All draws come from a single [`UniformSource`], in the following order for each event:
/// 1. the router draw, if the customer was admitted into service and the router has exits;
/// 2. the service time, if the customer was routed to an existing station and the service
///    rate is positive;
/// 3. the time to the next arrival, if the event took place at the entrance.
pub struct Simulation {
    title: String,
    lambda: f64,
    stations: Vec<Station>,
    lookup: HashMap<String, StationId>,
    entrance: StationId,
    scheduler: Scheduler,
    time: f64,
    customers: u64,
    source: Box<dyn UniformSource>,
}

impl Simulation {
    /// Constructs a simulation drawing from a ChaCha generator seeded from system entropy.
    #[must_use]
    pub fn new(topology: Topology) -> Self {
        Self::with_source(topology, RngSource::from_entropy())
    }

    /// Constructs a simulation drawing from a ChaCha generator seeded with `seed`.
    #[must_use]
    pub fn with_seed(topology: Topology, seed: u64) -> Self {
        Self::with_source(topology, RngSource::with_seed(seed))
    }

    /// Constructs a simulation drawing from `source`.
    pub fn with_source<U: UniformSource + 'static>(topology: Topology, source: U) -> Self {
        let (title, lambda, stations, entrance) = topology.into_parts();
        let lookup = stations
            .iter()
            .enumerate()
            .map(|(idx, station)| (station.name().to_string(), StationId::from(idx)))
            .collect();
        let mut simulation = Self {
            title,
            lambda,
            stations,
            lookup,
            entrance,
            scheduler: Scheduler::default(),
            time: 0.0,
            customers: 0,
            source: Box::new(source),
        };
        let first = simulation.next_customer();
        simulation
            .scheduler
            .schedule(Event::new(entrance, None, 0.0, first));
        log::info!(
            "Created simulation `{}` with {} stations",
            simulation.title,
            simulation.stations.len()
        );
        simulation
    }

    fn next_customer(&mut self) -> CustomerId {
        self.customers += 1;
        CustomerId::from(self.customers)
    }

    fn station(&self, id: StationId) -> &Station {
        &self.stations[usize::from(id)]
    }

    fn station_mut(&mut self, id: StationId) -> &mut Station {
        &mut self.stations[usize::from(id)]
    }

    /// Processes the earliest pending event.
    ///
    /// The customer joins the target's waiting queue (unless already there) and, if the event
    /// comes from another station, leaves that station's service desk; if someone waits there,
    /// an immediate event is scheduled to admit them. Then the customer is admitted into
    /// service if there is room and routed to its successor. Each event at the entrance also
    /// schedules the next arrival.
    ///
    /// If nothing is pending, the clock is reset to 0 and [`Step::Idle`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if a router cannot map a draw to an exit, which can only
    /// happen with a faulty [`UniformSource`]. The router draw is taken before anything else
    /// changes, so on error the event stays pending and the stations are left untouched.
    pub fn advance(&mut self) -> Result<Step, SelectionError> {
        let event = match self.scheduler.peek() {
            Some(&event) => event,
            None => {
                log::warn!("No pending events; the simulation is idle");
                self.time = 0.0;
                return Ok(Step::Idle);
            }
        };

        let target = event.target;
        let mut customer = event.customer;
        if event.origin.is_none() && self.station(target).is_serving(customer) {
            match self.station(target).head() {
                Some(head) => {
                    log::debug!(
                        "{} already in service at {}; offering the slot to {}",
                        customer,
                        self.station(target).name(),
                        head
                    );
                    customer = head;
                }
                None => {
                    self.scheduler.pop();
                    self.time = event.time;
                    return Ok(Step::Dispatched(Dispatched {
                        event,
                        customer,
                        outcome: Outcome::Stale,
                    }));
                }
            }
        }

        let exit = if self.admits(target, event.origin, customer) {
            let router = self.stations[usize::from(target)].router();
            Some(router.route(self.source.as_mut())?.map(String::from))
        } else {
            None
        };

        self.scheduler.pop();
        self.time = event.time;
        log::trace!("Dispatching {}", self.describe(&event));

        self.station_mut(target).enqueue(customer);

        if let Some(origin) = event.origin {
            let origin_station = self.station_mut(origin);
            origin_station.release(customer);
            if let Some(head) = origin_station.head() {
                self.scheduler
                    .schedule(Event::new(origin, None, event.time, head));
            }
        }

        let outcome = match exit {
            Some(exit) => {
                let admitted = self.station_mut(target).admit(customer);
                debug_assert!(admitted, "{} must fit into the desk", customer);
                self.depart(target, customer, exit, event.time)
            }
            None => {
                log::debug!("{} waiting at {}", customer, self.station(target).name());
                Outcome::Waiting
            }
        };

        if target == self.entrance {
            let arrival = event.time + self.source.exponential(self.lambda);
            let next = self.next_customer();
            self.scheduler
                .schedule(Event::new(self.entrance, None, arrival, next));
        }

        Ok(Step::Dispatched(Dispatched {
            event,
            customer,
            outcome,
        }))
    }

    /// Whether `customer`, arriving at `target` from `origin`, finds a free service slot.
    /// A customer moving within the same station frees its own slot first.
    fn admits(&self, target: StationId, origin: Option<StationId>, customer: CustomerId) -> bool {
        let desk = self.station(target).desk();
        let own_slot = origin == Some(target) && desk.contains(customer);
        desk.capacity().admits(desk.len() - usize::from(own_slot))
    }

    /// Sends a customer just admitted at `at` towards `exit`.
    fn depart(
        &mut self,
        at: StationId,
        customer: CustomerId,
        exit: Option<String>,
        time: f64,
    ) -> Outcome {
        let station = &self.stations[usize::from(at)];
        let exit = match exit {
            Some(exit) => exit,
            None => return Outcome::Exited,
        };
        let next = match self.lookup.get(&exit) {
            Some(&next) => next,
            None => {
                log::warn!(
                    "{} routed from {} to unknown station {}",
                    customer,
                    station.name(),
                    exit
                );
                return Outcome::UnknownSuccessor(exit);
            }
        };
        let departure = if station.service_rate() > 0.0 {
            time + self.source.exponential(station.service_rate())
        } else {
            time
        };
        log::debug!(
            "{} creating new event at {}, {} with {}",
            station.name(),
            exit,
            format_time(departure),
            customer
        );
        self.scheduler
            .schedule(Event::new(next, Some(at), departure, customer));
        Outcome::Routed { next, departure }
    }

    /// Advances until the clock passes `time`. Returns the number of processed events.
    ///
    /// # Errors
    ///
    /// See [`Simulation::advance`].
    pub fn run_until(&mut self, time: f64) -> Result<usize, SelectionError> {
        let mut steps = 0;
        while self.time <= time {
            if let Step::Idle = self.advance()? {
                break;
            }
            steps += 1;
        }
        Ok(steps)
    }

    /// Resolves station names of `event`.
    #[must_use]
    pub fn describe(&self, event: &Event) -> EventDescription {
        EventDescription {
            target: self.station(event.target).name().to_string(),
            origin: event.origin.map(|o| self.station(o).name().to_string()),
            time: event.time,
            customer: event.customer,
        }
    }

    /// Describes the earliest pending event without processing it.
    #[must_use]
    pub fn peek_next_event(&self) -> Option<EventDescription> {
        self.scheduler.peek().map(|event| self.describe(event))
    }

    /// Current time and occupancy of all stations.
    #[must_use]
    pub fn status(&self, options: RenderOptions) -> StatusSnapshot {
        StatusSnapshot {
            time: self.time,
            font_size: options.font_size,
            stations: self
                .stations
                .iter()
                .map(|station| StationStatus {
                    name: station.name().to_string(),
                    serving: station.desk().occupants().to_vec(),
                    waiting: if station.service_rate() > 0.0 {
                        Some(station.waiting().collect())
                    } else {
                        None
                    },
                })
                .collect(),
        }
    }

    /// Title of the loaded topology.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current simulation time: the time of the last processed event.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// All stations in display order.
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Looks up a station by name.
    #[must_use]
    pub fn station_by_name(&self, name: &str) -> Option<&Station> {
        self.lookup.get(name).map(|&id| self.station(id))
    }

    /// The entrance.
    #[must_use]
    pub fn entrance(&self) -> &Station {
        self.station(self.entrance)
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Capacity, ReplaySource};
    use float_cmp::approx_eq;

    fn id(n: u64) -> CustomerId {
        CustomerId::from(n)
    }

    fn dispatched(step: Step) -> Dispatched {
        match step {
            Step::Dispatched(d) => d,
            Step::Idle => panic!("unexpected idle step"),
        }
    }

    /// Entrance `In` feeding a single-slot `Desk` with `mu = 1` that lets customers out
    /// through `Out`.
    fn single_desk() -> Topology {
        Topology::builder("Desk", 1.0)
            .entrance("In", &[("Desk", 1.0)])
            .station("Desk", 1.0, Capacity::Bounded(1), &[("Out", 1.0)])
            .station::<_, &str>("Out", 0.0, Capacity::Unbounded, &[])
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_step() {
        let mut simulation = Simulation::with_source(single_desk(), ReplaySource::new(vec![0.5]));
        assert_eq!(simulation.pending_events(), 1);
        let step = dispatched(simulation.advance().unwrap());
        assert_eq!(step.event.customer, id(1));
        assert_eq!(step.event.target, StationId::from(0));
        assert_eq!(
            step.outcome,
            Outcome::Routed {
                next: StationId::from(1),
                departure: 0.0
            }
        );
        assert!(approx_eq!(f64, simulation.time(), 0.0));
        assert_eq!(simulation.entrance().desk().occupants(), &[id(1)]);
        assert_eq!(simulation.pending_events(), 2);
        let next = simulation.peek_next_event().unwrap();
        assert_eq!(next.to_string(), "K_1 at Desk from In [0:00]");
    }

    #[test]
    fn test_idle_resets_clock() {
        let topology = Topology::builder("Empty", 1.0)
            .entrance::<_, &str>("In", &[])
            .build()
            .unwrap();
        let mut simulation = Simulation::with_seed(topology, 3);
        simulation.scheduler = Scheduler::default();
        simulation.time = 4.0;
        assert_eq!(simulation.advance(), Ok(Step::Idle));
        assert!(approx_eq!(f64, simulation.time(), 0.0));
        assert!(simulation.peek_next_event().is_none());
    }

    #[test]
    fn test_backpressure_and_unblocking() {
        let mut simulation = Simulation::with_seed(single_desk(), 11);
        simulation.scheduler = Scheduler::default();
        let (desk, out) = (StationId::from(1), StationId::from(2));
        for customer in 1..=3 {
            simulation
                .scheduler
                .schedule(Event::new(desk, None, 0.0, id(customer)));
        }
        for _ in 0..3 {
            simulation.advance().unwrap();
        }
        let station = simulation.station(desk);
        assert_eq!(station.desk().occupants(), &[id(1)]);
        assert_eq!(station.waiting().collect::<Vec<_>>(), vec![id(2), id(3)]);
        assert_eq!(simulation.pending_events(), 1);

        // K_1 leaves for `Out`, which triggers admission of K_2.
        let step = dispatched(simulation.advance().unwrap());
        assert_eq!(step.event.target, out);
        assert_eq!(step.outcome, Outcome::Exited);
        let unblock = simulation.scheduler.peek().copied().unwrap();
        assert_eq!(unblock.target, desk);
        assert_eq!(unblock.origin, None);
        assert_eq!(unblock.customer, id(2));
        assert!(approx_eq!(f64, unblock.time, step.event.time));

        let step = dispatched(simulation.advance().unwrap());
        assert_eq!(step.customer, id(2));
        assert!(matches!(step.outcome, Outcome::Routed { .. }));
        let station = simulation.station(desk);
        assert_eq!(station.desk().occupants(), &[id(2)]);
        assert_eq!(station.waiting().collect::<Vec<_>>(), vec![id(3)]);
    }

    #[test]
    fn test_stale_unblock_goes_to_next_in_line() {
        let topology = Topology::builder("Pair", 1.0)
            .entrance::<_, &str>("In", &[])
            .station("Desk", 1.0, Capacity::Bounded(2), &[("Out", 1.0)])
            .station::<_, &str>("Out", 0.0, Capacity::Unbounded, &[])
            .build()
            .unwrap();
        let mut simulation = Simulation::with_seed(topology, 5);
        simulation.scheduler = Scheduler::default();
        let (desk, out) = (StationId::from(1), StationId::from(2));
        for customer in 1..=4 {
            simulation
                .scheduler
                .schedule(Event::new(desk, None, 0.0, id(customer)));
        }
        for _ in 0..4 {
            simulation.advance().unwrap();
        }
        simulation.scheduler = Scheduler::default();
        // Both served customers leave at the same time; both departures nominate K_3.
        simulation
            .scheduler
            .schedule(Event::new(out, Some(desk), 1.0, id(1)));
        simulation
            .scheduler
            .schedule(Event::new(out, Some(desk), 1.0, id(2)));
        simulation.advance().unwrap();
        simulation.advance().unwrap();
        let first = dispatched(simulation.advance().unwrap());
        assert_eq!(first.customer, id(3));
        let second = dispatched(simulation.advance().unwrap());
        assert_eq!(second.event.customer, id(3));
        assert_eq!(second.customer, id(4));
        let station = simulation.station(desk);
        assert_eq!(station.desk().occupants(), &[id(3), id(4)]);
        assert_eq!(station.waiting_len(), 0);
    }

    /// Replays draws without checking that they are in `[0, 1)`.
    struct UncheckedSource(std::collections::VecDeque<f64>);

    impl UniformSource for UncheckedSource {
        fn next_uniform(&mut self) -> f64 {
            self.0.pop_front().unwrap_or(0.5)
        }
    }

    #[test]
    fn test_failed_selection_keeps_event_pending() {
        let source = UncheckedSource(vec![1.5].into());
        let mut simulation = Simulation::with_source(Topology::cheese_shop(), source);
        assert_eq!(simulation.advance(), Err(SelectionError { draw: 1.5 }));
        assert_eq!(simulation.pending_events(), 1);
        assert!(simulation.entrance().desk().is_empty());
        assert_eq!(simulation.entrance().waiting_len(), 0);

        let step = dispatched(simulation.advance().unwrap());
        assert_eq!(step.customer, id(1));
        assert!(matches!(step.outcome, Outcome::Routed { .. }));
        assert_eq!(simulation.entrance().desk().occupants(), &[id(1)]);
        // Departure of K_1 and the arrival of K_2.
        assert_eq!(simulation.pending_events(), 2);
    }

    #[test]
    fn test_return_to_same_station() {
        let topology = Topology::builder("Loop", 1.0)
            .entrance::<_, &str>("In", &[])
            .station("Loop", 1.0, Capacity::Bounded(1), &[("Loop", 1.0)])
            .build()
            .unwrap();
        let mut simulation = Simulation::with_seed(topology, 2);
        simulation.scheduler = Scheduler::default();
        let looping = StationId::from(1);
        simulation
            .scheduler
            .schedule(Event::new(looping, None, 0.0, id(1)));
        let mut routed = 0;
        for _ in 0..6 {
            let step = dispatched(simulation.advance().unwrap());
            assert_eq!(step.customer, id(1));
            match step.outcome {
                Outcome::Routed { next, .. } => {
                    assert_eq!(next, looping);
                    routed += 1;
                }
                // Leaving frees the slot it is about to take again.
                Outcome::Stale => {}
                other => panic!("unexpected outcome: {:?}", other),
            }
            let station = simulation.station(looping);
            assert_eq!(station.desk().occupants(), &[id(1)]);
            assert_eq!(station.waiting_len(), 0);
        }
        assert_eq!(routed, 4);
    }

    #[test]
    fn test_unknown_successor() {
        let topology = Topology::builder("Lost", 1.0)
            .entrance("In", &[("Nowhere", 1.0)])
            .build()
            .unwrap();
        let mut simulation = Simulation::with_seed(topology, 1);
        let step = dispatched(simulation.advance().unwrap());
        assert_eq!(step.outcome, Outcome::UnknownSuccessor(String::from("Nowhere")));
        // Only the next arrival is pending.
        assert_eq!(simulation.pending_events(), 1);
    }

    #[test]
    fn test_status_hides_queue_of_instant_stations() {
        let mut simulation = Simulation::with_seed(single_desk(), 9);
        simulation.advance().unwrap();
        let status = simulation.status(RenderOptions { font_size: 14 });
        assert_eq!(status.font_size, 14);
        assert_eq!(status.stations.len(), 3);
        assert_eq!(status.stations[0].serving, vec![id(1)]);
        assert!(status.stations[0].waiting.is_none());
        assert_eq!(status.stations[1].waiting, Some(vec![]));
        assert_eq!(
            status.to_string(),
            "Time: 0:00\nIn: [K_1]\nDesk: []  waiting: []\nOut: []"
        );
    }
}
