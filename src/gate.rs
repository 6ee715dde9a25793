//! Refresh coordinator that gates every credentialed request.
//!
//! [`CredentialGate::admit`] runs before any handler that needs to call the upstream API. It
//! trusts the store as the only validity signal: a present entry with a TTL is used as-is, while
//! an absent entry (never written, expired, or left behind without a TTL) triggers one issuer call
//! whose result is persisted with the issuer-reported TTL. Concurrent misses for the same key are
//! collapsed by a per-key single-flight guard so the issuer sees one request per expiry.
//!
//! Shutdown flips the gate closed, evicts the key, and closes the store, so a restarted process
//! always starts from a forced refresh.

mod context;
mod flight;
mod metrics;
mod rejection;

pub use context::RequestContext;
pub use metrics::GateMetrics;
pub use rejection::GateRejection;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	gate::flight::FlightMap,
	issuer::TokenIssuer,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{CredentialStore, StoreError, StoreKey, StoredCredential},
};

/// Per-request gate that resolves, caches, and attaches the bearer credential.
///
/// Cloning is cheap; every clone shares the store, issuer, single-flight guards, metrics, and
/// shutdown flag.
#[derive(Clone)]
pub struct CredentialGate {
	store: Arc<dyn CredentialStore>,
	issuer: Arc<dyn TokenIssuer>,
	key: StoreKey,
	metrics: Arc<GateMetrics>,
	flights: FlightMap,
	closed: Arc<AtomicBool>,
}
impl CredentialGate {
	/// Creates a gate over the provided store and issuer using the default key.
	pub fn new(store: Arc<dyn CredentialStore>, issuer: Arc<dyn TokenIssuer>) -> Self {
		Self {
			store,
			issuer,
			key: StoreKey::default(),
			metrics: Default::default(),
			flights: Default::default(),
			closed: Default::default(),
		}
	}

	/// Overrides the store key holding the credential.
	pub fn with_key(mut self, key: StoreKey) -> Self {
		self.key = key;

		self
	}

	/// Returns the store key holding the credential.
	pub fn key(&self) -> &StoreKey {
		&self.key
	}

	/// Returns the shared admission counters.
	pub fn metrics(&self) -> &GateMetrics {
		&self.metrics
	}

	/// Returns `true` once [`CredentialGate::shutdown`] has started.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	/// Resolves the credential and attaches it to `ctx`.
	///
	/// On failure nothing is attached and the returned [`GateRejection`] must be sent back to the
	/// client instead of running the downstream handler.
	pub async fn admit(&self, ctx: &mut RequestContext) -> Result<(), GateRejection> {
		const KIND: FlowKind = FlowKind::Admit;

		let span = FlowSpan::new(KIND, "admit");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_admission();

		let result = span.instrument(self.resolve()).await;

		match result {
			Ok(secret) => {
				ctx.attach(secret);
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(())
			},
			Err(err) => {
				let rejection = GateRejection::from_error(&err);

				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::log_flow_failure(KIND, Some(rejection.status), &rejection.message);

				Err(rejection)
			},
		}
	}

	/// Resolves the credential without a request context.
	pub async fn current(&self) -> Result<TokenSecret> {
		let span = FlowSpan::new(FlowKind::Admit, "current");

		span.instrument(self.resolve()).await
	}

	/// Deletes the cached credential so the next request fetches a new one.
	///
	/// Useful when the upstream API rejects a credential the store still considers valid.
	pub async fn invalidate(&self) -> Result<()> {
		let flight = flight::flight_for(&self.flights, &self.key);
		let _guard = flight.enter(flight.ticket()).await;

		self.evict().await
	}

	/// Stops admitting requests, evicts the credential, and closes the store.
	///
	/// Safe to call more than once; only the first call touches the store.
	pub async fn shutdown(&self) -> Result<()> {
		if self.closed.swap(true, Ordering::AcqRel) {
			return Ok(());
		}

		// Wait out any in-flight fetch so its write cannot land after the eviction.
		let flight = flight::flight_for(&self.flights, &self.key);
		let guard = flight.enter(flight.ticket()).await;
		let evicted = self.evict().await;

		drop(guard);

		let closed = self.store.close().await.map_err(Error::from);

		obs::log_flow_event(FlowKind::Evict, "store_closed");

		evicted.and(closed)
	}

	async fn resolve(&self) -> Result<TokenSecret> {
		if self.is_closed() {
			return Err(StoreError::Closed.into());
		}
		if let Some(secret) = self.cached().await? {
			self.record_hit();

			return Ok(secret);
		}

		let flight = flight::flight_for(&self.flights, &self.key);
		let mut guard = flight.enter(flight.ticket()).await;

		if self.is_closed() {
			return Err(StoreError::Closed.into());
		}
		if let Some(failure) = guard.shared_failure() {
			return Err(failure.into());
		}
		if let Some(secret) = self.cached().await? {
			self.record_hit();

			return Ok(secret);
		}

		match self.issuer.fetch().await {
			Ok(credential) => {
				guard.complete(None);

				self.store
					.set(&self.key, credential.access_token.clone(), credential.ttl)
					.await
					.map_err(Error::from)?;
				self.metrics.record_issued();
				obs::log_flow_event(FlowKind::Issue, "persisted");

				Ok(credential.access_token)
			},
			Err(failure) => {
				guard.complete(Some(failure.clone()));

				Err(Error::from(failure))
			},
		}
	}

	async fn cached(&self) -> Result<Option<TokenSecret>> {
		let entry = self.store.get(&self.key).await.map_err(Error::from)?;

		Ok(entry.filter(StoredCredential::has_ttl).map(|entry| entry.value))
	}

	async fn evict(&self) -> Result<()> {
		const KIND: FlowKind = FlowKind::Evict;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.store.delete(&self.key).await.map_err(Error::from);

		match &result {
			Ok(()) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				obs::log_flow_event(KIND, "evicted");
			},
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::log_flow_failure(KIND, None, &err.to_string());
			},
		}

		result
	}

	fn record_hit(&self) {
		self.metrics.record_hit();
		obs::record_flow_outcome(FlowKind::Admit, FlowOutcome::Hit);
	}
}
impl Debug for CredentialGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialGate")
			.field("key", &self.key)
			.field("closed", &self.is_closed())
			.field("metrics", &self.metrics)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::AtomicUsize;
	// self
	use super::*;
	use crate::{
		auth::Credential,
		error::IssueFailure,
		issuer::IssueFuture,
		store::{MemoryStore, StoreFuture},
	};

	#[derive(Default)]
	struct CountingIssuer {
		calls: AtomicUsize,
		failure: Option<IssueFailure>,
	}
	impl CountingIssuer {
		fn failing(failure: IssueFailure) -> Self {
			Self { calls: AtomicUsize::new(0), failure: Some(failure) }
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl TokenIssuer for CountingIssuer {
		fn fetch(&self) -> IssueFuture<'_> {
			Box::pin(async move {
				let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

				match &self.failure {
					Some(failure) => Err(failure.clone()),
					None => Ok(Credential::new(format!("T{n}"), Duration::seconds(3600))),
				}
			})
		}
	}

	struct BrokenStore;
	impl CredentialStore for BrokenStore {
		fn get<'a>(&'a self, _key: &'a StoreKey) -> StoreFuture<'a, Option<StoredCredential>> {
			Box::pin(async { Err(StoreError::Backend { message: "connection refused".into() }) })
		}

		fn set<'a>(
			&'a self,
			_key: &'a StoreKey,
			_value: TokenSecret,
			_ttl: Duration,
		) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "connection refused".into() }) })
		}

		fn delete<'a>(&'a self, _key: &'a StoreKey) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "connection refused".into() }) })
		}

		fn close(&self) -> StoreFuture<'_, ()> {
			Box::pin(async { Ok(()) })
		}
	}

	struct UnboundedIssuer;
	impl TokenIssuer for UnboundedIssuer {
		fn fetch(&self) -> IssueFuture<'_> {
			Box::pin(async { Ok(Credential::new("T1", Duration::seconds(i64::MAX))) })
		}
	}

	fn gate_with(issuer: Arc<CountingIssuer>) -> (CredentialGate, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::default());
		let gate = CredentialGate::new(store.clone(), issuer);

		(gate, store)
	}

	#[tokio::test]
	async fn ttl_less_entries_force_a_refresh() {
		let issuer = Arc::new(CountingIssuer::default());
		let (gate, store) = gate_with(issuer.clone());

		store.insert_without_ttl(gate.key(), TokenSecret::new("legacy"));

		let mut ctx = RequestContext::new();

		gate.admit(&mut ctx).await.expect("TTL-less entries should be replaced, not rejected.");

		assert_eq!(ctx.authorization().as_deref(), Some("Bearer T1"));
		assert_eq!(issuer.calls(), 1);

		let entry = store
			.get(gate.key())
			.await
			.expect("Memory store reads should succeed.")
			.expect("Fresh credential should be stored.");

		assert_eq!(entry.value.expose(), "T1");
		assert!(entry.has_ttl());
	}

	#[tokio::test]
	async fn store_outage_rejects_without_calling_issuer() {
		let issuer = Arc::new(CountingIssuer::default());
		let gate = CredentialGate::new(Arc::new(BrokenStore), issuer.clone());
		let mut ctx = RequestContext::new();
		let rejection =
			gate.admit(&mut ctx).await.expect_err("Store outages must not bypass the cache.");

		assert_eq!(rejection.status, 503);
		assert!(rejection.message.contains("connection refused"));
		assert!(!ctx.is_authorized());
		assert_eq!(issuer.calls(), 0);
		assert_eq!(gate.metrics().failures(), 1);
	}

	#[tokio::test]
	async fn issuer_failure_leaves_store_untouched() {
		let issuer =
			Arc::new(CountingIssuer::failing(IssueFailure::with_status(400, "invalid_client")));
		let (gate, store) = gate_with(issuer.clone());
		let mut ctx = RequestContext::new();
		let rejection = gate.admit(&mut ctx).await.expect_err("Issuer failures should reject.");

		assert_eq!(rejection.status, 400);
		assert_eq!(rejection.message, "Authentication Unsuccessful: invalid_client");
		assert!(!store.contains(gate.key()));

		gate.admit(&mut ctx).await.expect_err("The next request should retry and fail again.");

		assert_eq!(issuer.calls(), 2);
	}

	#[tokio::test]
	async fn closed_gate_rejects_and_shutdown_is_idempotent() {
		let issuer = Arc::new(CountingIssuer::default());
		let (gate, store) = gate_with(issuer.clone());

		gate.current().await.expect("Initial resolution should succeed.");
		gate.shutdown().await.expect("Shutdown should evict and close.");
		gate.shutdown().await.expect("Second shutdown should be a no-op.");

		assert!(gate.is_closed());
		assert!(store.is_closed());
		assert!(!store.contains(gate.key()));

		let rejection = gate
			.admit(&mut RequestContext::new())
			.await
			.expect_err("Closed gates must not admit requests.");

		assert_eq!(rejection, GateRejection::shutting_down());
		assert_eq!(issuer.calls(), 1);
	}

	#[tokio::test]
	async fn invalidate_forces_next_fetch() {
		let issuer = Arc::new(CountingIssuer::default());
		let (gate, _store) = gate_with(issuer.clone());
		let first = gate.current().await.expect("First resolution should succeed.");

		gate.invalidate().await.expect("Invalidation should delete the key.");

		let second = gate.current().await.expect("Second resolution should succeed.");

		assert_eq!(first.expose(), "T1");
		assert_eq!(second.expose(), "T2");
		assert_eq!(gate.metrics().issued(), 2);
	}

	#[tokio::test]
	async fn unrepresentable_ttl_rejects_instead_of_panicking() {
		let store = Arc::new(MemoryStore::default());
		let gate = CredentialGate::new(store.clone(), Arc::new(UnboundedIssuer));
		let mut ctx = RequestContext::new();
		let rejection =
			gate.admit(&mut ctx).await.expect_err("Out-of-range TTLs should not be persisted.");

		assert_eq!(rejection.status, GateRejection::UNAVAILABLE_STATUS);
		assert!(rejection.message.contains("out of range"), "{}", rejection.message);
		assert!(!ctx.is_authorized());
		assert!(!store.contains(gate.key()));
	}
}
