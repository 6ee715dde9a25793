//! Gate-level error types shared across the issuer, stores, and coordinator.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token issuer returned a failure instead of a credential.
	#[error(transparent)]
	Issue(#[from] IssueFailure),
}

/// Configuration and validation failures raised while wiring the gate.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::issuer::IssuerDescriptorError),
	/// Store connection string cannot be used.
	#[error("Store connection is invalid: {message}.")]
	InvalidStore {
		/// Backend-supplied reason string.
		message: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Structured failure produced by a token issuer.
///
/// Every network, authentication, or malformed-response problem collapses into this shape so
/// callers only ever inspect an optional upstream status and a human-readable message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{message}")]
pub struct IssueFailure {
	/// HTTP status code returned by the token endpoint, when one was received.
	pub status: Option<u16>,
	/// Upstream- or issuer-supplied message.
	pub message: String,
}
impl IssueFailure {
	/// Builds a failure that carries an upstream HTTP status.
	pub fn with_status(status: u16, message: impl Into<String>) -> Self {
		Self { status: Some(status), message: message.into() }
	}

	/// Builds a failure that never reached an HTTP response.
	pub fn without_status(message: impl Into<String>) -> Self {
		Self { status: None, message: message.into() }
	}
}
