//! Account-credentials token exchange with explicit failure mapping.
//!
//! The issuer posts `grant_type=account_credentials&account_id=<id>` to the descriptor's token
//! endpoint with HTTP Basic client authentication, then classifies the response:
//!
//! - 2xx with `{access_token, expires_in}` becomes a [`Credential`];
//! - any other status becomes an [`IssueFailure`] carrying that status and the provider's
//!   `message` (falling back to `reason`, `error_description`, `error`, or a body preview);
//! - transport failures become an [`IssueFailure`] without a status.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::IssueFailure,
	http::{TokenHttpClient, TokenHttpRequest, TokenHttpResponse},
	issuer::{
		ClientAuthMethod, ClientCredentials, GrantType, IssueFuture, IssuerDescriptor, TokenIssuer,
	},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

const BODY_PREVIEW_LIMIT: usize = 256;
// Ten years; anything longer is treated as a broken response.
const MAX_EXPIRES_IN_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[cfg(feature = "reqwest")]
/// Issuer specialized for the crate's default reqwest transport.
pub type ReqwestIssuer = AccountCredentialsIssuer<ReqwestHttpClient>;

/// [`TokenIssuer`] that exchanges process-held client secrets for a bearer credential.
pub struct AccountCredentialsIssuer<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// HTTP client wrapper used for every token request.
	pub http_client: Arc<C>,
	/// Token endpoint description.
	pub descriptor: IssuerDescriptor,
	/// Client secrets presented to the endpoint.
	pub credentials: ClientCredentials,
}
impl<C> AccountCredentialsIssuer<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates an issuer that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptor: IssuerDescriptor,
		credentials: ClientCredentials,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { http_client: http_client.into(), descriptor, credentials }
	}

	/// Performs one token exchange.
	pub async fn exchange(&self) -> Result<Credential, IssueFailure> {
		const KIND: FlowKind = FlowKind::Issue;

		let span = FlowSpan::new(KIND, self.descriptor.grant.as_str());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.build_request()?;
				let response = self
					.http_client
					.post_form(request)
					.await
					.map_err(|err| map_transport_error(&err))?;

				map_token_response(&response)
			})
			.await;

		match &result {
			Ok(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				obs::log_flow_event(KIND, "issued");
			},
			Err(failure) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::log_flow_failure(KIND, failure.status, &failure.message);
			},
		}

		result
	}

	fn build_request(&self) -> Result<TokenHttpRequest, IssueFailure> {
		let grant = self.descriptor.grant;
		let mut form = vec![("grant_type".to_owned(), grant.as_str().to_owned())];

		if matches!(grant, GrantType::AccountCredentials) {
			form.push(("account_id".into(), self.credentials.require_account_id()?.to_owned()));
		}

		let authorization = match self.descriptor.client_auth_method {
			ClientAuthMethod::ClientSecretBasic => Some(self.credentials.basic_authorization()?),
			ClientAuthMethod::ClientSecretPost => {
				let (client_id, client_secret) = self.credentials.require_client()?;

				form.push(("client_id".into(), client_id.to_owned()));
				form.push(("client_secret".into(), client_secret.expose().to_owned()));

				None
			},
		};

		Ok(TokenHttpRequest { url: self.descriptor.token_endpoint.clone(), authorization, form })
	}
}
#[cfg(feature = "reqwest")]
impl AccountCredentialsIssuer<ReqwestHttpClient> {
	/// Creates an issuer backed by a fresh reqwest client that refuses redirects.
	pub fn new(
		descriptor: IssuerDescriptor,
		credentials: ClientCredentials,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(descriptor, credentials, ReqwestHttpClient::new()?))
	}

	/// Wires the issuer entirely from the process environment.
	///
	/// Only the endpoint is validated here; missing secrets surface on the first fetch.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::new(IssuerDescriptor::from_env()?, ClientCredentials::from_env())
	}
}
impl<C> TokenIssuer for AccountCredentialsIssuer<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fetch(&self) -> IssueFuture<'_> {
		Box::pin(self.exchange())
	}
}
impl<C> Debug for AccountCredentialsIssuer<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccountCredentialsIssuer")
			.field("descriptor", &self.descriptor)
			.field("credentials", &self.credentials)
			.finish()
	}
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct ErrorResponse {
	message: Option<String>,
	reason: Option<String>,
	error_description: Option<String>,
	error: Option<String>,
}
impl ErrorResponse {
	fn into_message(self) -> Option<String> {
		[self.message, self.reason, self.error_description, self.error]
			.into_iter()
			.flatten()
			.find(|value| !value.trim().is_empty())
	}
}

fn map_token_response(response: &TokenHttpResponse) -> Result<Credential, IssueFailure> {
	if !response.is_success() {
		return Err(map_error_response(response));
	}

	let status = response.status;
	let mut de = serde_json::Deserializer::from_slice(&response.body);
	let parsed: TokenResponse = serde_path_to_error::deserialize(&mut de).map_err(|err| {
		IssueFailure::with_status(
			status,
			format!("Token endpoint returned malformed JSON at `{}`: {}", err.path(), err.inner()),
		)
	})?;

	if parsed.access_token.is_empty() {
		return Err(IssueFailure::with_status(
			status,
			"Token endpoint returned an empty access_token.",
		));
	}

	let expires_in = parsed.expires_in.ok_or_else(|| {
		IssueFailure::with_status(status, "Token endpoint response is missing expires_in.")
	})?;

	if expires_in <= 0 {
		return Err(IssueFailure::with_status(status, "The expires_in value must be positive."));
	}
	if expires_in > MAX_EXPIRES_IN_SECS {
		return Err(IssueFailure::with_status(
			status,
			"The expires_in value exceeds the supported range.",
		));
	}

	Ok(Credential::new(parsed.access_token, Duration::seconds(expires_in)))
}

fn map_error_response(response: &TokenHttpResponse) -> IssueFailure {
	let status = response.status;
	let message = serde_json::from_slice::<ErrorResponse>(&response.body)
		.ok()
		.and_then(ErrorResponse::into_message)
		.or_else(|| body_preview(&response.body))
		.unwrap_or_else(|| format!("Token endpoint responded with HTTP {status}."));

	IssueFailure::with_status(status, message)
}

fn map_transport_error(err: &(dyn StdError + 'static)) -> IssueFailure {
	let mut message = err.to_string();
	let mut source = err.source();

	while let Some(inner) = source {
		message.push_str(": ");
		message.push_str(&inner.to_string());

		source = inner.source();
	}

	IssueFailure::without_status(message)
}

fn body_preview(body: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return None;
	}

	Some(trimmed.chars().take(BODY_PREVIEW_LIMIT).collect())
}
