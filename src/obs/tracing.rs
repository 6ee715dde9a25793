// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by gate flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("credential_gate.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `warn` event describing a failed flow. Never pass secret material as `message`.
pub fn log_flow_failure(kind: FlowKind, status: Option<u16>, message: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			flow = kind.as_str(),
			status,
			reason = message,
			"credential gate flow failed"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, status, message);
	}
}

/// Emits a `debug` event for lifecycle transitions (issued, evicted, closed).
pub fn log_flow_event(kind: FlowKind, event: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(flow = kind.as_str(), event, "credential gate lifecycle event");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, event);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn logging_helpers_noop_without_tracing() {
		log_flow_failure(FlowKind::Issue, Some(400), "invalid_client");
		log_flow_event(FlowKind::Evict, "evicted");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Admit, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
