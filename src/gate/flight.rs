//! Per-key single-flight guards for the cache-miss path.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, error::IssueFailure, store::StoreKey};

/// Shared map of in-flight guards, one per store key.
pub(crate) type FlightMap = Arc<Mutex<HashMap<StoreKey, Arc<Flight>>>>;

/// Serializes issuer calls for one key and remembers how the latest call ended.
///
/// A caller snapshots [`Flight::ticket`] before waiting on the lock. If the completion counter
/// moved while it waited, another caller already talked to the issuer on its behalf: a failure is
/// shared as-is, a success is picked up from the store.
#[derive(Debug, Default)]
pub(crate) struct Flight {
	completed: AtomicU64,
	state: AsyncMutex<FlightState>,
}
impl Flight {
	/// Returns the completion counter observed before queuing for the lock.
	pub(crate) fn ticket(&self) -> u64 {
		self.completed.load(Ordering::Acquire)
	}

	/// Waits for exclusive access to the miss path.
	pub(crate) async fn enter(&self, ticket: u64) -> FlightGuard<'_> {
		let state = self.state.lock().await;
		let completed_while_waiting = self.completed.load(Ordering::Acquire) > ticket;

		FlightGuard { flight: self, state, completed_while_waiting }
	}
}

#[derive(Debug, Default)]
pub(crate) struct FlightState {
	last_failure: Option<IssueFailure>,
}

/// Exclusive access to a [`Flight`]; dropping it lets the next waiter in.
pub(crate) struct FlightGuard<'a> {
	flight: &'a Flight,
	state: async_lock::MutexGuard<'a, FlightState>,
	completed_while_waiting: bool,
}
impl FlightGuard<'_> {
	/// Failure produced by a fetch that finished while this caller was queued.
	pub(crate) fn shared_failure(&self) -> Option<IssueFailure> {
		if self.completed_while_waiting { self.state.last_failure.clone() } else { None }
	}

	/// Records the outcome of this caller's issuer call for anyone queued behind it.
	pub(crate) fn complete(&mut self, failure: Option<IssueFailure>) {
		self.state.last_failure = failure;
		self.flight.completed.fetch_add(1, Ordering::AcqRel);
	}
}

/// Returns (and creates on demand) the single-flight guard for a store key.
pub(crate) fn flight_for(flights: &FlightMap, key: &StoreKey) -> Arc<Flight> {
	let mut guards = flights.lock();

	guards.entry(key.clone()).or_default().clone()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn failures_are_shared_only_with_queued_callers() {
		let flights = FlightMap::default();
		let flight = flight_for(&flights, &StoreKey::default());
		let queued_ticket = flight.ticket();

		{
			let mut guard = flight.enter(flight.ticket()).await;

			assert!(guard.shared_failure().is_none());

			guard.complete(Some(IssueFailure::with_status(400, "invalid_client")));
		}

		let queued = flight.enter(queued_ticket).await;

		assert_eq!(queued.shared_failure(), Some(IssueFailure::with_status(400, "invalid_client")));

		drop(queued);

		let late = flight.enter(flight.ticket()).await;

		assert!(late.shared_failure().is_none());
	}

	#[test]
	fn guards_are_reused_per_key() {
		let flights = FlightMap::default();
		let a = flight_for(&flights, &StoreKey::default());
		let b = flight_for(&flights, &StoreKey::default());
		let c = flight_for(&flights, &StoreKey::new("other"));

		assert!(Arc::ptr_eq(&a, &b));
		assert!(!Arc::ptr_eq(&a, &c));
	}
}
