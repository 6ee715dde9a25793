//! Demonstrates gating upstream calls with a cached account-credentials token.
//!
//! A mock identity provider issues the token and a mock upstream API checks the bearer header.
//! The second request is served from the in-memory store; shutdown evicts the cached entry.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use credential_gate::{
	gate::{CredentialGate, RequestContext},
	http::ReqwestHttpClient,
	issuer::{AccountCredentialsIssuer, ClientCredentials, IssuerDescriptor, TokenIssuer},
	reqwest::Client,
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let upstream_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/users/me").header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body("{\"id\":\"me\"}");
		})
		.await;
	let descriptor = IssuerDescriptor::builder()
		.token_endpoint(Url::parse(&server.url("/oauth/token"))?)
		.build()?;
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;
	let issuer: Arc<dyn TokenIssuer> = Arc::new(AccountCredentialsIssuer::with_http_client(
		descriptor,
		ClientCredentials::new("demo-account", "demo-client", "demo-secret"),
		ReqwestHttpClient::with_client(client.clone()),
	));
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let gate = CredentialGate::new(store, issuer);

	for _ in 0..2 {
		let mut ctx = RequestContext::new();

		if let Err(rejection) = gate.admit(&mut ctx).await {
			println!("Rejected with HTTP {}: {}", rejection.status, rejection.body());

			continue;
		}

		let response = ctx.authorize(client.get(server.url("/v2/users/me"))).send().await?;

		println!("Upstream answered HTTP {}: {}", response.status(), response.text().await?);
	}

	println!("Token endpoint calls: {}", token_mock.calls_async().await);
	println!("Upstream calls: {}", upstream_mock.calls_async().await);
	println!("Gate metrics: {:?}", gate.metrics());

	gate.shutdown().await?;

	Ok(())
}
