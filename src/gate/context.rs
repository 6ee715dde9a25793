//! Per-request context that carries the resolved credential to downstream handlers.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Outgoing context for one inbound request.
///
/// The gate attaches the credential here; handlers read it back instead of querying the store.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
	credential: Option<TokenSecret>,
}
impl RequestContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches (or replaces) the bearer credential.
	pub fn attach(&mut self, credential: TokenSecret) {
		self.credential = Some(credential);
	}

	/// Returns the attached credential, if any.
	pub fn credential(&self) -> Option<&TokenSecret> {
		self.credential.as_ref()
	}

	/// Returns `true` once the gate attached a credential.
	pub fn is_authorized(&self) -> bool {
		self.credential.is_some()
	}

	/// Renders the `Authorization` header value (`Bearer <token>`).
	pub fn authorization(&self) -> Option<String> {
		self.credential.as_ref().map(|secret| format!("Bearer {}", secret.expose()))
	}

	/// Applies the attached credential to an outgoing upstream request.
	#[cfg(feature = "reqwest")]
	pub fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match self.credential.as_ref() {
			Some(secret) => builder.bearer_auth(secret.expose()),
			None => builder,
		}
	}
}
