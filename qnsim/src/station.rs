use crate::{Capacity, CustomerId, WeightedRouter};

use std::collections::VecDeque;

/// Customers currently in service at a station, limited by the station's [`Capacity`].
/// Insertion fails when the desk is full.
///
/// ```
/// # use qnsim::{Capacity, CustomerId, ServiceDesk};
/// let mut desk = ServiceDesk::new(Capacity::Bounded(1));
/// assert!(desk.try_insert(CustomerId::from(1)).is_ok());
/// assert_eq!(desk.try_insert(CustomerId::from(2)), Err(CustomerId::from(2)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDesk {
    occupants: Vec<CustomerId>,
    capacity: Capacity,
}

impl ServiceDesk {
    /// Creates an empty desk.
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        Self {
            occupants: Vec::new(),
            capacity,
        }
    }

    /// Inserts `customer` if there is a free slot; otherwise, returns it back.
    ///
    /// # Errors
    ///
    /// Returns the customer if the desk is full.
    pub fn try_insert(&mut self, customer: CustomerId) -> Result<(), CustomerId> {
        if self.has_room() {
            self.occupants.push(customer);
            Ok(())
        } else {
            Err(customer)
        }
    }

    /// Removes `customer`, returning `true` if it was there.
    pub fn remove(&mut self, customer: CustomerId) -> bool {
        if let Some(pos) = self.occupants.iter().position(|&c| c == customer) {
            self.occupants.remove(pos);
            true
        } else {
            false
        }
    }

    /// Whether another customer can be served.
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.capacity.admits(self.occupants.len())
    }

    /// Whether `customer` is being served.
    #[must_use]
    pub fn contains(&self, customer: CustomerId) -> bool {
        self.occupants.contains(&customer)
    }

    /// Number of customers in service.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    /// Returns `true` if nobody is in service.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Maximum number of customers in service.
    #[must_use]
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Customers in service, in order of admission.
    #[must_use]
    pub fn occupants(&self) -> &[CustomerId] {
        &self.occupants
    }
}

/// A node of the network: a FIFO waiting queue in front of a service desk, a service rate,
/// and a router choosing the successor of each served customer.
///
/// A customer is never in both the queue and the desk of the same station, and never twice in
/// the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    name: String,
    service_rate: f64,
    router: WeightedRouter,
    waiting: VecDeque<CustomerId>,
    desk: ServiceDesk,
}

impl Station {
    /// Constructs an empty station. A `service_rate` of zero means customers pass through
    /// instantly.
    #[must_use]
    pub fn new<S: Into<String>>(
        name: S,
        service_rate: f64,
        capacity: Capacity,
        router: WeightedRouter,
    ) -> Self {
        Self {
            name: name.into(),
            service_rate,
            router,
            waiting: VecDeque::new(),
            desk: ServiceDesk::new(capacity),
        }
    }

    /// Station name, unique within a topology.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service rate `mu`.
    #[must_use]
    pub fn service_rate(&self) -> f64 {
        self.service_rate
    }

    /// Capacity of the service desk.
    #[must_use]
    pub fn capacity(&self) -> Capacity {
        self.desk.capacity()
    }

    /// Outgoing router.
    #[must_use]
    pub fn router(&self) -> &WeightedRouter {
        &self.router
    }

    /// Customers waiting for a free slot, oldest first.
    pub fn waiting(&self) -> impl Iterator<Item = CustomerId> + '_ {
        self.waiting.iter().copied()
    }

    /// Number of waiting customers.
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// The customer that has been waiting the longest.
    #[must_use]
    pub fn head(&self) -> Option<CustomerId> {
        self.waiting.front().copied()
    }

    /// The service desk.
    #[must_use]
    pub fn desk(&self) -> &ServiceDesk {
        &self.desk
    }

    /// Whether `customer` is in the waiting queue.
    #[must_use]
    pub fn is_waiting(&self, customer: CustomerId) -> bool {
        self.waiting.contains(&customer)
    }

    /// Whether `customer` is being served.
    #[must_use]
    pub fn is_serving(&self, customer: CustomerId) -> bool {
        self.desk.contains(customer)
    }

    /// Appends `customer` to the waiting queue unless it is already there.
    /// Returns `true` if it was appended.
    pub fn enqueue(&mut self, customer: CustomerId) -> bool {
        if self.is_waiting(customer) {
            false
        } else {
            self.waiting.push_back(customer);
            true
        }
    }

    /// Moves `customer` from the waiting queue to the service desk if there is room.
    /// Returns `true` on success; otherwise, the customer stays where it was.
    pub fn admit(&mut self, customer: CustomerId) -> bool {
        if self.desk.try_insert(customer).is_err() {
            return false;
        }
        if let Some(pos) = self.waiting.iter().position(|&c| c == customer) {
            self.waiting.remove(pos);
        }
        true
    }

    /// Removes `customer` from the service desk, returning `true` if it was there.
    pub fn release(&mut self, customer: CustomerId) -> bool {
        self.desk.remove(customer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn theke() -> Station {
        Station::new(
            "Theke",
            25.0 / 60.0,
            Capacity::Bounded(1),
            WeightedRouter::new(vec![("Kasse", 1.0)]).unwrap(),
        )
    }

    fn id(n: u64) -> CustomerId {
        CustomerId::from(n)
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut station = theke();
        assert!(station.enqueue(id(1)));
        assert!(station.enqueue(id(2)));
        assert!(!station.enqueue(id(1)));
        assert_eq!(station.waiting().collect::<Vec<_>>(), vec![id(1), id(2)]);
    }

    #[test]
    fn test_admit_respects_capacity() {
        let mut station = theke();
        station.enqueue(id(1));
        station.enqueue(id(2));
        assert!(station.admit(id(1)));
        assert!(!station.admit(id(2)));
        assert_eq!(station.desk().occupants(), &[id(1)]);
        assert_eq!(station.head(), Some(id(2)));
        assert!(!station.is_waiting(id(1)));
        assert!(station.is_serving(id(1)));
    }

    #[test]
    fn test_release_frees_slot() {
        let mut station = theke();
        station.enqueue(id(1));
        station.enqueue(id(2));
        assert!(station.admit(id(1)));
        assert!(station.release(id(1)));
        assert!(!station.release(id(1)));
        assert!(station.desk().has_room());
        assert!(station.admit(id(2)));
        assert_eq!(station.waiting_len(), 0);
    }

    #[test]
    fn test_unbounded_desk() {
        let mut desk = ServiceDesk::new(Capacity::Unbounded);
        for n in 0..1000 {
            assert!(desk.try_insert(id(n)).is_ok());
        }
        assert_eq!(desk.len(), 1000);
        assert!(desk.has_room());
    }
}
