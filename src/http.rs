//! Transport primitives for token endpoint calls.
//!
//! The module exposes [`TokenHttpClient`] so the issuer never depends on a concrete HTTP stack.
//! Requests and responses are plain crate-owned structs; the issuer builds a
//! [`TokenHttpRequest`], hands it to the transport, and classifies the returned
//! [`TokenHttpResponse`] or transport error itself.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	header::{ACCEPT, AUTHORIZATION},
	redirect::Policy,
};
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`TokenHttpClient::post_form`].
pub type HttpFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Abstraction over HTTP transports capable of posting a form to a token endpoint.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by every
/// request handled through the gate.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves with whatever HTTP response came back, success or not.
	///
	/// Only failures that prevented a response (DNS, TCP, TLS, timeouts) map to `Err`.
	fn post_form(
		&self,
		request: TokenHttpRequest,
	) -> HttpFuture<'_, Result<TokenHttpResponse, Self::TransportError>>;
}

/// Form POST destined for a token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenHttpRequest {
	/// Token endpoint URL.
	pub url: Url,
	/// Value of the `Authorization` header, if any.
	pub authorization: Option<String>,
	/// URL-encoded form fields in send order.
	pub form: Vec<(String, String)>,
}
impl Debug for TokenHttpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenHttpRequest")
			.field("url", &self.url.as_str())
			.field("authorization_set", &self.authorization.is_some())
			.field("form_keys", &self.form.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
			.finish()
	}
}

/// Raw response returned by a token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenHttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl TokenHttpResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects; the default client disables them. Configure any
/// custom [`ReqwestClient`] the same way before passing it to [`ReqwestHttpClient::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client that refuses redirects.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn post_form(
		&self,
		request: TokenHttpRequest,
	) -> HttpFuture<'_, Result<TokenHttpResponse, Self::TransportError>> {
		Box::pin(async move {
			let mut builder =
				self.0.post(request.url).header(ACCEPT, "application/json").form(&request.form);

			if let Some(value) = request.authorization {
				builder = builder.header(AUTHORIZATION, value);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(TokenHttpResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_debug_hides_credentials() {
		let request = TokenHttpRequest {
			url: Url::parse("https://issuer.example.com/oauth/token")
				.expect("Token URL fixture should parse."),
			authorization: Some("Basic c2VjcmV0".into()),
			form: vec![("grant_type".into(), "account_credentials".into())],
		};
		let rendered = format!("{request:?}");

		assert!(!rendered.contains("c2VjcmV0"));
		assert!(rendered.contains("grant_type"));
	}

	#[test]
	fn success_covers_2xx_only() {
		assert!(TokenHttpResponse { status: 200, body: Vec::new() }.is_success());
		assert!(TokenHttpResponse { status: 204, body: Vec::new() }.is_success());
		assert!(!TokenHttpResponse { status: 302, body: Vec::new() }.is_success());
		assert!(!TokenHttpResponse { status: 401, body: Vec::new() }.is_success());
	}
}
