//! Short-lived OAuth credential cache: TTL-backed token stores, single-flight refresh, and a
//! per-request gate that attaches bearer credentials for upstream calls.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod gate;
pub mod http;
pub mod issuer;
pub mod obs;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		gate::CredentialGate,
		http::ReqwestHttpClient,
		issuer::{ClientCredentials, IssuerDescriptor, ReqwestIssuer, TokenIssuer},
		store::{CredentialStore, MemoryStore},
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds an HTTPS-only descriptor pointing at `token_url`.
	pub fn test_descriptor(token_url: &str) -> IssuerDescriptor {
		IssuerDescriptor::builder()
			.token_endpoint(Url::parse(token_url).expect("Mock token endpoint should parse."))
			.build()
			.expect("Mock token endpoint should pass descriptor validation.")
	}

	/// Constructs a reqwest-backed issuer for the provided descriptor + secrets.
	pub fn build_reqwest_test_issuer(
		descriptor: IssuerDescriptor,
		credentials: ClientCredentials,
	) -> ReqwestIssuer {
		ReqwestIssuer::with_http_client(
			descriptor,
			credentials,
			test_reqwest_http_client(),
		)
	}

	/// Constructs a [`CredentialGate`] backed by an in-memory store and the reqwest issuer used
	/// across integration tests.
	pub fn build_reqwest_test_gate(
		descriptor: IssuerDescriptor,
		credentials: ClientCredentials,
	) -> (CredentialGate, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let issuer: Arc<dyn TokenIssuer> =
			Arc::new(build_reqwest_test_issuer(descriptor, credentials));

		(CredentialGate::new(store, issuer), store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
