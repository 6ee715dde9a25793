//! Optional observability helpers for gate flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `credential_gate.flow` with the `flow` and
//!   `stage` (call site) fields, plus `warn` events for rejected requests.
//! - Enable `metrics` to increment the `credential_gate_flow_total` counter for every
//!   attempt/hit/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Per-request admission through the gate.
	Admit,
	/// Token issuance against the identity provider.
	Issue,
	/// Credential eviction during shutdown or invalidation.
	Evict,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Admit => "admit",
			FlowKind::Issue => "issue",
			FlowKind::Evict => "evict",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a gate helper.
	Attempt,
	/// Cached credential reused without contacting the issuer.
	Hit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Hit => "hit",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
