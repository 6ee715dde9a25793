//! Token issuer contract plus the account-credentials client that talks to the identity provider.
//!
//! [`TokenIssuer`] is the seam the gate depends on: one call, one fresh [`Credential`] or one
//! [`IssueFailure`]. [`AccountCredentialsIssuer`] implements it over any [`TokenHttpClient`],
//! using an [`IssuerDescriptor`] for the endpoint and [`ClientCredentials`] for the secrets.
//!
//! [`TokenHttpClient`]: crate::http::TokenHttpClient

pub mod account_credentials;
pub mod credentials;
pub mod descriptor;

pub use account_credentials::*;
pub use credentials::*;
pub use descriptor::*;

// self
use crate::{_prelude::*, auth::Credential, error::IssueFailure};

/// Boxed future returned by [`TokenIssuer::fetch`].
pub type IssueFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Credential, IssueFailure>> + 'a + Send>>;

/// Mints fresh credentials.
pub trait TokenIssuer
where
	Self: Send + Sync,
{
	/// Requests a new credential from the identity provider.
	///
	/// Every problem (network, authentication, malformed response, missing secrets) is reported
	/// through [`IssueFailure`]; implementations never panic.
	fn fetch(&self) -> IssueFuture<'_>;
}
