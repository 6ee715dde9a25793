//! The bearer credential minted by the issuer and cached by the store.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Bearer credential plus the validity window reported by the issuer.
///
/// The store enforces expiry on its own; `issued_at` and `ttl` exist so the gate can hand the
/// store a TTL and so callers can reason about freshness without another round trip.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the credential was received from the issuer.
	pub issued_at: OffsetDateTime,
	/// Validity window reported by the issuer (`expires_in`).
	pub ttl: Duration,
}
impl Credential {
	/// Creates a credential issued at the current UTC instant.
	pub fn new(access_token: impl Into<String>, ttl: Duration) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			issued_at: OffsetDateTime::now_utc(),
			ttl,
		}
	}

	/// Overrides the issued-at instant.
	pub fn with_issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = instant;

		self
	}

	/// Absolute expiry derived from `issued_at + ttl`.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at.saturating_add(self.ttl)
	}

	/// Returns `true` if the credential has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at()
	}

	/// Renders the `Authorization` header value (`Bearer <token>`).
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.access_token.expose())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("ttl", &self.ttl)
			.finish()
	}
}
