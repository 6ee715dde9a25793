//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{CredentialStore, StoreError, StoreFuture, StoreKey, StoredCredential},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, MemoryEntry>>>;

#[derive(Clone, Debug)]
struct MemoryEntry {
	value: TokenSecret,
	expires_at: Option<OffsetDateTime>,
}
impl MemoryEntry {
	fn is_live_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|instant| now < instant)
	}
}

/// Thread-safe storage backend that keeps entries in-process for tests and demos.
///
/// Expired entries are purged lazily on the next read so they are indistinguishable from keys
/// that were never written.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	map: StoreMap,
	closed: Arc<AtomicBool>,
}
impl MemoryStore {
	/// Writes an entry without any expiry.
	///
	/// Models values left behind by tooling that bypasses the TTL contract; the gate treats such
	/// entries as absent.
	pub fn insert_without_ttl(&self, key: &StoreKey, value: TokenSecret) {
		self.map.write().insert(key.to_owned(), MemoryEntry { value, expires_at: None });
	}

	/// Returns `true` if a live entry exists for `key`.
	pub fn contains(&self, key: &StoreKey) -> bool {
		Self::get_now(&self.map, key, OffsetDateTime::now_utc()).is_some()
	}

	/// Returns `true` once [`CredentialStore::close`] has been called.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	fn ensure_open(&self) -> Result<(), StoreError> {
		if self.is_closed() { Err(StoreError::Closed) } else { Ok(()) }
	}

	fn get_now(map: &StoreMap, key: &StoreKey, now: OffsetDateTime) -> Option<StoredCredential> {
		{
			let guard = map.read();

			match guard.get(key) {
				Some(entry) if entry.is_live_at(now) =>
					return Some(StoredCredential {
						value: entry.value.clone(),
						ttl: entry.expires_at.map(|instant| instant - now),
					}),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = map.write();

		// Re-check under the write lock; a concurrent `set` may have replaced the entry.
		if guard.get(key).is_some_and(|entry| !entry.is_live_at(now)) {
			guard.remove(key);
		}

		guard.get(key).filter(|entry| entry.is_live_at(now)).map(|entry| StoredCredential {
			value: entry.value.clone(),
			ttl: entry.expires_at.map(|instant| instant - now),
		})
	}

	fn set_now(
		map: &StoreMap,
		key: &StoreKey,
		value: TokenSecret,
		ttl: Duration,
	) -> Result<(), StoreError> {
		if !ttl.is_positive() {
			return Err(StoreError::Backend {
				message: format!("TTL for `{key}` must be positive, got {ttl}"),
			});
		}

		let expires_at = OffsetDateTime::now_utc().checked_add(ttl).ok_or_else(|| {
			StoreError::Backend { message: format!("TTL for `{key}` is out of range, got {ttl}") }
		})?;

		map.write().insert(key.to_owned(), MemoryEntry { value, expires_at: Some(expires_at) });

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<StoredCredential>> {
		Box::pin(async move {
			self.ensure_open()?;

			Ok(Self::get_now(&self.map, key, OffsetDateTime::now_utc()))
		})
	}

	fn set<'a>(
		&'a self,
		key: &'a StoreKey,
		value: TokenSecret,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.ensure_open()?;

			Self::set_now(&self.map, key, value, ttl)
		})
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.ensure_open()?;
			self.map.write().remove(key);

			Ok(())
		})
	}

	fn close(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.closed.store(true, Ordering::Release);

			Ok(())
		})
	}
}
