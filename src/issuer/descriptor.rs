//! Token endpoint descriptor plus its validating builder.

// self
use crate::{_prelude::*, error::ConfigError};

/// Token grants understood by the issuer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Account-scoped server-to-server grant; sends `account_id` alongside the grant type.
	#[default]
	AccountCredentials,
	/// RFC 6749 Client Credentials grant.
	ClientCredentials,
}
impl GrantType {
	/// Returns the `grant_type` form value.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AccountCredentials => "account_credentials",
			GrantType::ClientCredentials => "client_credentials",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	#[default]
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum IssuerDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Endpoints must use HTTPS.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Immutable description of the identity provider's token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuerDescriptor {
	/// Token endpoint URL.
	pub token_endpoint: Url,
	/// Grant sent with every request.
	pub grant: GrantType,
	/// How client credentials are presented.
	pub client_auth_method: ClientAuthMethod,
}
impl IssuerDescriptor {
	/// Token endpoint used when `TOKEN_ENDPOINT` is not set.
	pub const DEFAULT_TOKEN_ENDPOINT: &'static str = "https://zoom.us/oauth/token";
	/// Environment variable overriding the token endpoint.
	pub const TOKEN_ENDPOINT_VAR: &'static str = "TOKEN_ENDPOINT";

	/// Creates a new builder.
	pub fn builder() -> IssuerDescriptorBuilder {
		IssuerDescriptorBuilder::default()
	}

	/// Builds the default account-credentials descriptor, honoring `TOKEN_ENDPOINT`.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`IssuerDescriptor::from_env`] but reads variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let raw = lookup(Self::TOKEN_ENDPOINT_VAR)
			.filter(|value| !value.trim().is_empty())
			.unwrap_or_else(|| Self::DEFAULT_TOKEN_ENDPOINT.to_owned());
		let url = Url::parse(raw.trim())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;

		Ok(Self::builder().token_endpoint(url).build()?)
	}
}

/// Builder for [`IssuerDescriptor`] values.
#[derive(Debug, Default)]
pub struct IssuerDescriptorBuilder {
	/// Token endpoint URL.
	pub token_endpoint: Option<Url>,
	/// Grant sent with every request.
	pub grant: GrantType,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl IssuerDescriptorBuilder {
	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the grant type.
	pub fn grant(mut self, grant: GrantType) -> Self {
		self.grant = grant;

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<IssuerDescriptor, IssuerDescriptorError> {
		let token_endpoint =
			self.token_endpoint.ok_or(IssuerDescriptorError::MissingTokenEndpoint)?;

		if token_endpoint.scheme() != "https" {
			return Err(IssuerDescriptorError::InsecureEndpoint { url: token_endpoint.to_string() });
		}

		Ok(IssuerDescriptor {
			token_endpoint,
			grant: self.grant,
			client_auth_method: self.client_auth_method,
		})
	}
}
