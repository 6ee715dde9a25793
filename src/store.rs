//! Storage contracts and built-in TTL stores for the cached credential.

pub mod memory;
#[cfg(feature = "redis")] pub mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")] pub use redis::RedisStore;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by every [`CredentialStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key/value contract with per-key expiry used as the source of truth for the credential.
///
/// Implementations enforce expiry natively: an expired entry must look exactly like one that was
/// never written. Writes reset the TTL countdown and reads never extend it.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the entry stored under `key`, if present and not expired.
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<StoredCredential>>;

	/// Writes `value` under `key`, expiring it after `ttl`.
	fn set<'a>(
		&'a self,
		key: &'a StoreKey,
		value: TokenSecret,
		ttl: Duration,
	) -> StoreFuture<'a, ()>;

	/// Removes the entry stored under `key`. Missing keys are not an error.
	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, ()>;

	/// Releases the underlying connection. Later operations fail with [`StoreError::Closed`].
	fn close(&self) -> StoreFuture<'_, ()>;
}

/// Entry returned by [`CredentialStore::get`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredCredential {
	/// Cached credential value.
	pub value: TokenSecret,
	/// Remaining time-to-live as reported by the backend; `None` when the entry never expires.
	pub ttl: Option<Duration>,
}
impl StoredCredential {
	/// Returns `true` when the backend attached an expiry to the entry.
	pub fn has_ttl(&self) -> bool {
		self.ttl.is_some()
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The store was closed during shutdown.
	#[error("Store connection is closed.")]
	Closed,
}

/// Well-known key naming the cached credential.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey(String);
impl StoreKey {
	/// Key used when no override is configured.
	pub const DEFAULT: &'static str = "access_token";

	/// Builds a key from the provided name.
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	/// Returns the raw key name.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Default for StoreKey {
	fn default() -> Self {
		Self::new(Self::DEFAULT)
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;
	use std::error::Error as StdError;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "connection reset".into() };
		let err: Error = store_error.clone().into();

		assert!(matches!(err, Error::Storage(_)));
		assert!(err.to_string().contains("connection reset"));

		let source = StdError::source(&err)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn default_key_is_well_known() {
		assert_eq!(StoreKey::default().as_str(), "access_token");
		assert_eq!(StoreKey::new("upstream").to_string(), "upstream");
	}
}
