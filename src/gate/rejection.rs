//! The single user-visible failure shape produced by the gate.

// self
use crate::{
	_prelude::*,
	error::{Error, IssueFailure},
	store::StoreError,
};

/// Request rejected at the gate; rendered to the client as `{"message": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct GateRejection {
	/// HTTP status to answer with.
	pub status: u16,
	/// Human-readable explanation.
	pub message: String,
}
impl GateRejection {
	/// Prefix applied to every issuer failure.
	pub const AUTHENTICATION_PREFIX: &'static str = "Authentication Unsuccessful";
	/// Status used when the issuer failure carries no usable HTTP status.
	pub const DEFAULT_STATUS: u16 = 401;
	/// Status used for store outages and shutdown.
	pub const UNAVAILABLE_STATUS: u16 = 503;

	/// Wraps an issuer failure, passing its status through when it is an error status.
	pub fn authentication(failure: &IssueFailure) -> Self {
		let status = failure
			.status
			.filter(|status| (400..600).contains(status))
			.unwrap_or(Self::DEFAULT_STATUS);

		Self { status, message: format!("{}: {}", Self::AUTHENTICATION_PREFIX, failure.message) }
	}

	/// Rejection used when the store cannot answer.
	pub fn store_unavailable(err: &StoreError) -> Self {
		Self {
			status: Self::UNAVAILABLE_STATUS,
			message: format!("Credential store unavailable: {err}"),
		}
	}

	/// Rejection used once shutdown has begun.
	pub fn shutting_down() -> Self {
		Self { status: Self::UNAVAILABLE_STATUS, message: "Service is shutting down.".into() }
	}

	/// Collapses any crate error into a rejection.
	pub fn from_error(err: &Error) -> Self {
		match err {
			Error::Issue(failure) => Self::authentication(failure),
			Error::Storage(StoreError::Closed) => Self::shutting_down(),
			Error::Storage(inner) => Self::store_unavailable(inner),
			Error::Config(inner) => Self { status: 500, message: inner.to_string() },
		}
	}

	/// Renders the JSON response body.
	pub fn body(&self) -> String {
		serde_json::json!({ "message": self.message }).to_string()
	}
}
impl From<Error> for GateRejection {
	fn from(err: Error) -> Self {
		Self::from_error(&err)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn issuer_status_passes_through_with_prefix() {
		let rejection =
			GateRejection::authentication(&IssueFailure::with_status(400, "invalid_client"));

		assert_eq!(rejection.status, 400);
		assert_eq!(rejection.message, "Authentication Unsuccessful: invalid_client");
		assert_eq!(
			rejection.body(),
			r#"{"message":"Authentication Unsuccessful: invalid_client"}"#
		);
	}

	#[test]
	fn missing_or_non_error_status_falls_back_to_401() {
		let offline = GateRejection::authentication(&IssueFailure::without_status("timed out"));
		let malformed = GateRejection::authentication(&IssueFailure::with_status(200, "bad json"));

		assert_eq!(offline.status, 401);
		assert_eq!(offline.message, "Authentication Unsuccessful: timed out");
		assert_eq!(malformed.status, 401);
	}

	#[test]
	fn store_errors_map_to_unavailable() {
		let err = Error::from(StoreError::Backend { message: "connection reset".into() });
		let rejection = GateRejection::from(err);

		assert_eq!(rejection.status, 503);
		assert!(rejection.message.starts_with("Credential store unavailable"));
		assert_eq!(
			GateRejection::from(Error::from(StoreError::Closed)),
			GateRejection::shutting_down()
		);
	}
}
