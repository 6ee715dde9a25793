//! Process-held client secrets used to authenticate against the token endpoint.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::TokenSecret, error::IssueFailure};

/// Account identifier, client identifier, and client secret.
///
/// Every field is optional at construction time; a missing value only becomes a failure when a
/// fetch actually needs it, so a process can boot before its secrets are provisioned.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientCredentials {
	/// Account identifier sent as the `account_id` form field.
	pub account_id: Option<String>,
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// OAuth client secret.
	pub client_secret: Option<TokenSecret>,
}
impl ClientCredentials {
	/// Environment variable holding the account identifier.
	pub const ACCOUNT_ID_VAR: &'static str = "ACCOUNT_ID";
	/// Environment variable holding the client identifier.
	pub const CLIENT_ID_VAR: &'static str = "CLIENT_ID";
	/// Environment variable holding the client secret.
	pub const CLIENT_SECRET_VAR: &'static str = "CLIENT_SECRET";

	/// Creates a fully populated credential set.
	pub fn new(
		account_id: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self {
			account_id: Some(account_id.into()),
			client_id: Some(client_id.into()),
			client_secret: Some(TokenSecret::new(client_secret)),
		}
	}

	/// Reads `ACCOUNT_ID`, `CLIENT_ID`, and `CLIENT_SECRET` from the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`ClientCredentials::from_env`] but reads variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| lookup(name).filter(|value| !value.is_empty());

		Self {
			account_id: read(Self::ACCOUNT_ID_VAR),
			client_id: read(Self::CLIENT_ID_VAR),
			client_secret: read(Self::CLIENT_SECRET_VAR).map(TokenSecret::new),
		}
	}

	/// Returns the account identifier or a failure naming the missing variable.
	pub fn require_account_id(&self) -> Result<&str, IssueFailure> {
		self.account_id.as_deref().ok_or_else(|| missing(Self::ACCOUNT_ID_VAR))
	}

	/// Returns the client identifier/secret pair or a failure naming the missing variable.
	pub fn require_client(&self) -> Result<(&str, &TokenSecret), IssueFailure> {
		let client_id = self.client_id.as_deref().ok_or_else(|| missing(Self::CLIENT_ID_VAR))?;
		let client_secret =
			self.client_secret.as_ref().ok_or_else(|| missing(Self::CLIENT_SECRET_VAR))?;

		Ok((client_id, client_secret))
	}

	/// Renders an HTTP Basic `Authorization` header value from the client pair.
	pub fn basic_authorization(&self) -> Result<String, IssueFailure> {
		let (client_id, client_secret) = self.require_client()?;
		let encoded = STANDARD.encode(format!("{client_id}:{}", client_secret.expose()));

		Ok(format!("Basic {encoded}"))
	}
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("account_id", &self.account_id)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.finish()
	}
}

fn missing(var: &str) -> IssueFailure {
	IssueFailure::without_status(format!("Missing required environment variable {var}."))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn basic_authorization_encodes_client_pair() {
		let credentials = ClientCredentials::new("acct", "acct-client", "acct-secret");

		assert_eq!(
			credentials.basic_authorization().expect("Complete credentials should encode."),
			"Basic YWNjdC1jbGllbnQ6YWNjdC1zZWNyZXQ="
		);
	}

	#[test]
	fn missing_values_fail_at_use_not_at_load() {
		let credentials = ClientCredentials::from_lookup(|name| {
			(name == ClientCredentials::CLIENT_ID_VAR).then(|| "client".to_owned())
		});

		assert_eq!(credentials.client_id.as_deref(), Some("client"));

		let err = credentials.require_account_id().expect_err("Account id should be missing.");

		assert_eq!(err.status, None);
		assert!(err.message.contains("ACCOUNT_ID"));

		let err = credentials.basic_authorization().expect_err("Client secret should be missing.");

		assert!(err.message.contains("CLIENT_SECRET"));
	}

	#[test]
	fn empty_variables_count_as_missing_and_debug_hides_secret() {
		let credentials = ClientCredentials::from_lookup(|_| Some(String::new()));

		assert_eq!(credentials, ClientCredentials::default());

		let rendered = format!("{:?}", ClientCredentials::new("a", "b", "hunter2"));

		assert!(!rendered.contains("hunter2"));
	}
}
