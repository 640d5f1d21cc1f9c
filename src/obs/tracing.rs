// self
use crate::{
	_prelude::*,
	obs::{CacheEvent, CallKind},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + method.
	pub fn new(kind: CallKind, method: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("zuggr_cloud.call", kind = kind.as_str(), method);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, method);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
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

/// Emits a `debug` event describing route-cache activity (when enabled).
pub fn trace_cache_event(event: CacheEvent, key_path: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(event = event.as_str(), key_path, "route cache");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, key_path);
	}
}

/// Emits a `debug` event when a token-bearing call is replayed after a refresh (when enabled).
pub fn trace_token_retry(status: u16, uri: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(status, uri, "token rejected; refreshing app token and replaying once");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (status, uri);
	}
}

/// Emits a `debug` event when a response rotates the caller's token (when enabled).
pub fn trace_token_rotation(auth_type: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(auth_type, "response carried a fresh token; cache updated");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = auth_type;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::Request, "GET");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn events_noop_without_tracing() {
		trace_cache_event(CacheEvent::Miss, "admin/42");
		trace_token_retry(422, "/admin/42");
		trace_token_rotation("app");
	}
}
