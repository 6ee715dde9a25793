// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for gate admissions.
#[derive(Debug, Default)]
pub struct GateMetrics {
	admissions: AtomicU64,
	hits: AtomicU64,
	issued: AtomicU64,
	failures: AtomicU64,
}
impl GateMetrics {
	/// Returns the total number of admission attempts.
	pub fn admissions(&self) -> u64 {
		self.admissions.load(Ordering::Relaxed)
	}

	/// Returns the number of requests served from the store without an issuer call.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of credentials minted by the issuer and persisted.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns the number of rejected admissions.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_admission(&self) {
		self.admissions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_issued(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
