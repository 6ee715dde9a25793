//! Redis-backed [`CredentialStore`] shared by every process instance.
//!
//! Redis enforces expiry natively through `SET EX`, so an expired credential simply disappears.
//! Reads pair `GET` with `TTL` inside one `MULTI` block; a `TTL` of `-1` reports an entry with no
//! expiry, which surfaces as [`StoredCredential::ttl`] `None`.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use redis::{AsyncCommands, Client, RedisError, aio::MultiplexedConnection};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	store::{CredentialStore, StoreError, StoreFuture, StoreKey, StoredCredential},
};

/// Credential store backed by a shared Redis instance.
pub struct RedisStore {
	client: Client,
	namespace: Arc<str>,
	connection: AsyncMutex<Option<MultiplexedConnection>>,
	closed: AtomicBool,
}
impl RedisStore {
	const DEFAULT_NAMESPACE: &'static str = "credential-gate";

	/// Creates a store for the provided connection URL (`redis://host:port/db`).
	///
	/// The connection is established lazily on first use.
	pub fn open(url: &str) -> Result<Self, ConfigError> {
		let client = Client::open(url)
			.map_err(|e| ConfigError::InvalidStore { message: e.to_string() })?;

		Ok(Self::with_client(client))
	}

	/// Wraps an existing Redis client.
	pub fn with_client(client: Client) -> Self {
		Self {
			client,
			namespace: Arc::from(Self::DEFAULT_NAMESPACE),
			connection: AsyncMutex::new(None),
			closed: AtomicBool::new(false),
		}
	}

	/// Adjusts the key namespace (defaults to `credential-gate`).
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Arc::from(namespace.into());

		self
	}

	fn redis_key(&self, key: &StoreKey) -> String {
		format!("{}:{key}", self.namespace)
	}

	async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
		if self.closed.load(Ordering::Acquire) {
			return Err(StoreError::Closed);
		}

		let mut slot = self.connection.lock().await;

		if let Some(conn) = slot.as_ref() {
			return Ok(conn.clone());
		}

		let conn = self.client.get_multiplexed_async_connection().await.map_err(backend_error)?;

		*slot = Some(conn.clone());

		Ok(conn)
	}
}
impl Debug for RedisStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedisStore")
			.field("namespace", &self.namespace)
			.field("closed", &self.closed.load(Ordering::Relaxed))
			.finish()
	}
}
impl CredentialStore for RedisStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<StoredCredential>> {
		Box::pin(async move {
			let mut conn = self.connection().await?;
			let redis_key = self.redis_key(key);
			let (value, ttl): (Option<String>, i64) = redis::pipe()
				.atomic()
				.get(&redis_key)
				.ttl(&redis_key)
				.query_async(&mut conn)
				.await
				.map_err(backend_error)?;

			Ok(value.map(|value| StoredCredential {
				value: TokenSecret::new(value),
				ttl: remaining_ttl(ttl),
			}))
		})
	}

	fn set<'a>(
		&'a self,
		key: &'a StoreKey,
		value: TokenSecret,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut conn = self.connection().await?;
			let ttl_secs = u64::try_from(ttl.whole_seconds()).unwrap_or(0).max(1);

			conn.set_ex::<_, _, ()>(self.redis_key(key), value.expose(), ttl_secs)
				.await
				.map_err(backend_error)
		})
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut conn = self.connection().await?;

			conn.del::<_, ()>(self.redis_key(key)).await.map_err(backend_error)
		})
	}

	fn close(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.closed.store(true, Ordering::Release);
			// Dropping the last handle tears down the multiplexed connection.
			self.connection.lock().await.take();

			Ok(())
		})
	}
}

fn backend_error(err: RedisError) -> StoreError {
	StoreError::Backend { message: err.to_string() }
}

fn remaining_ttl(raw: i64) -> Option<Duration> {
	// Redis reports `-1` for keys without expiry and `-2` for missing keys.
	if raw < 0 { None } else { Some(Duration::seconds(raw)) }
}
