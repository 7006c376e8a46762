//! Optional observability for adapter requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap every send operation in an `oauth2_transport.request` span carrying
//!   `method`, `stage` (call site) and the final `outcome`, plus events for proxy rewrites and
//!   classified failures.
//! - Enable `metrics` to increment the `oauth2_transport_request_total` counter for every
//!   attempt and outcome, labeled by `method` + `outcome`.
//!
//! With both features off every helper here compiles down to nothing.

// self
use crate::{_prelude::*, http::HttpMethod};

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to a send operation.
	Attempt,
	/// An envelope was returned, whatever its HTTP status.
	Success,
	/// The request could not be issued while the platform reported itself offline.
	NoNetwork,
	/// The request could not be issued while the platform was online.
	RequestFailed,
	/// The response body could not be read or parsed.
	ParseFailed,
}
impl RequestOutcome {
	/// Classifies the result of a send operation.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => RequestOutcome::Success,
			Err(Error::NoNetworkConnectivity) => RequestOutcome::NoNetwork,
			Err(Error::GetRequestFailed { .. } | Error::PostRequestFailed { .. }) =>
				RequestOutcome::RequestFailed,
			Err(Error::ResponseParseFailed { .. }) => RequestOutcome::ParseFailed,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::NoNetwork => "no_network",
			RequestOutcome::RequestFailed => "request_failed",
			RequestOutcome::ParseFailed => "parse_failed",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Observation of one send operation, from attempt to classified outcome.
#[derive(Debug)]
pub struct RequestScope {
	method: HttpMethod,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestScope {
	/// Opens the scope and records the attempt.
	pub fn start(method: HttpMethod, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		let scope = Self {
			method,
			span: tracing::info_span!(
				"oauth2_transport.request",
				method = method.as_str(),
				stage,
				outcome = tracing::field::Empty
			),
		};
		#[cfg(not(feature = "tracing"))]
		let scope = {
			let _ = stage;

			Self { method }
		};

		scope.count(RequestOutcome::Attempt);

		scope
	}

	/// Drives `fut` inside the scope and records how it ended.
	///
	/// The span is entered only while `fut` is polled, never held across `.await` points.
	pub async fn run<T, F>(self, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		#[cfg(feature = "tracing")]
		let result = {
			use tracing::Instrument;

			fut.instrument(self.span.clone()).await
		};
		#[cfg(not(feature = "tracing"))]
		let result = fut.await;
		let outcome = RequestOutcome::of(&result);

		#[cfg(feature = "tracing")]
		self.span.record("outcome", outcome.as_str());

		self.count(outcome);

		result
	}

	fn count(&self, outcome: RequestOutcome) {
		#[cfg(feature = "metrics")]
		{
			metrics::counter!(
				"oauth2_transport_request_total",
				"method" => self.method.as_str(),
				"outcome" => outcome.as_str()
			)
			.increment(1);
		}
		#[cfg(not(feature = "metrics"))]
		{
			let _ = (self.method, outcome);
		}
	}
}

/// Emits a debug event when a POST is redirected to the proxy relay.
pub fn trace_proxy_rewrite(url: &str, relay: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(target_url = url, relay, "routing token request through proxy relay");
	#[cfg(not(feature = "tracing"))]
	let _ = (url, relay);
}

/// Emits a warning for a classified request failure.
pub fn trace_transport_failure(method: HttpMethod, url: &str, online: bool) {
	#[cfg(feature = "tracing")]
	tracing::warn!(method = method.as_str(), url, online, "request could not be issued");
	#[cfg(not(feature = "tracing"))]
	let _ = (method, url, online);
}
