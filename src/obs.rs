//! Optional observability helpers for client calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `zuggr_cloud.call` with the `kind` and
//!   `method` fields, plus `debug` events for route-cache activity and the expired-token retry.
//! - Enable `metrics` to increment `zuggr_cloud_call_total` (labeled by `kind` + `outcome`) and
//!   `zuggr_cloud_route_cache_total` (labeled by `event`).

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Call kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Live API request through the executor.
	Request,
	/// App-token fetch against the auth endpoint.
	AppToken,
	/// Mock dataset bootstrap fetch.
	MockDataset,
	/// Canned response served in mock mode.
	MockResponse,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Request => "request",
			CallKind::AppToken => "app_token",
			CallKind::MockDataset => "mock_dataset",
			CallKind::MockResponse => "mock_response",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a client helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Route-cache activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// A read-through GET was served from the cache.
	Hit,
	/// A read-through GET found nothing and went to the network.
	Miss,
	/// An entry was written (GET fill or POST/PUT refill).
	Refill,
	/// An entry was deleted without refill.
	Invalidate,
}
impl CacheEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Miss => "miss",
			CacheEvent::Refill => "refill",
			CacheEvent::Invalidate => "invalidate",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a route-cache event through both the metrics and tracing backends.
pub fn record_cache_event(event: CacheEvent, key_path: &str) {
	count_cache_event(event);
	trace_cache_event(event, key_path);
}

/// Runs `fut` inside a call span and records its attempt/outcome counters.
pub async fn observe_call<T, Fut>(kind: CallKind, method: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = CallSpan::new(kind, method);

	record_call_outcome(kind, CallOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_call_outcome(kind, CallOutcome::Success),
		Err(_) => record_call_outcome(kind, CallOutcome::Failure),
	}

	result
}
