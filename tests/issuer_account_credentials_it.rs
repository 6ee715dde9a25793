// crates.io
use httpmock::prelude::*;
// self
use credential_gate::{
	_preludet::*,
	error::IssueFailure,
	issuer::{ClientAuthMethod, ClientCredentials, IssuerDescriptor, TokenIssuer},
};

const ACCOUNT_ID: &str = "acct";
const CLIENT_ID: &str = "acct-client";
const CLIENT_SECRET: &str = "acct-secret";
const BASIC_AUTHORIZATION: &str = "Basic YWNjdC1jbGllbnQ6YWNjdC1zZWNyZXQ=";

fn credentials() -> ClientCredentials {
	ClientCredentials::new(ACCOUNT_ID, CLIENT_ID, CLIENT_SECRET)
}

#[tokio::test]
async fn fetch_posts_account_credentials_grant() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("authorization", BASIC_AUTHORIZATION)
				.form_urlencoded_tuple("grant_type", "account_credentials")
				.form_urlencoded_tuple("account_id", ACCOUNT_ID);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"T1\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let issuer = build_reqwest_test_issuer(test_descriptor(&server.url("/token")), credentials());
	let credential = issuer.fetch().await.expect("Token exchange should succeed.");

	assert_eq!(credential.access_token.expose(), "T1");
	assert_eq!(credential.ttl, Duration::seconds(3600));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn client_secret_post_moves_secrets_into_the_form() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T2\",\"expires_in\":60}");
		})
		.await;
	let descriptor = IssuerDescriptor::builder()
		.token_endpoint(Url::parse(&server.url("/token")).expect("Mock token URL should parse."))
		.client_auth_method(ClientAuthMethod::ClientSecretPost)
		.build()
		.expect("Descriptor should build.");
	let issuer = build_reqwest_test_issuer(descriptor, credentials());
	let credential = issuer.fetch().await.expect("Token exchange should succeed.");

	assert_eq!(credential.access_token.expose(), "T2");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn provider_rejection_carries_status_and_message() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400).header("content-type", "application/json").body(
				"{\"reason\":\"Invalid client\",\"message\":\"invalid_client\"}",
			);
		})
		.await;
	let issuer = build_reqwest_test_issuer(test_descriptor(&server.url("/token")), credentials());
	let failure = issuer.fetch().await.expect_err("HTTP 400 should fail the exchange.");

	assert_eq!(failure, IssueFailure::with_status(400, "invalid_client"));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn malformed_success_body_reports_the_field() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":\"soon\"}");
		})
		.await;
	let issuer = build_reqwest_test_issuer(test_descriptor(&server.url("/token")), credentials());
	let failure = issuer.fetch().await.expect_err("Malformed bodies should fail the exchange.");

	assert_eq!(failure.status, Some(200));
	assert!(failure.message.contains("expires_in"), "{}", failure.message);
}

#[tokio::test]
async fn missing_secrets_fail_without_contacting_the_provider() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).body("{\"access_token\":\"never\",\"expires_in\":60}");
		})
		.await;
	let credentials = ClientCredentials::from_lookup(|name| {
		(name == ClientCredentials::ACCOUNT_ID_VAR).then(|| ACCOUNT_ID.to_owned())
	});
	let issuer = build_reqwest_test_issuer(test_descriptor(&server.url("/token")), credentials);
	let failure = issuer.fetch().await.expect_err("Missing client secrets should fail.");

	assert_eq!(failure.status, None);
	assert_eq!(failure.message, "Missing required environment variable CLIENT_ID.");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn unreachable_endpoint_is_a_statusless_failure() {
	let issuer = build_reqwest_test_issuer(
		test_descriptor("https://127.0.0.1:9/token"),
		credentials(),
	);
	let failure = issuer.fetch().await.expect_err("Connection failures should fail.");

	assert_eq!(failure.status, None);
	assert!(!failure.message.is_empty());
}
