//! Adapter-level error types surfaced by every send operation.

// self
use crate::{_prelude::*, http::HttpMethod};

/// Adapter-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed transport cause attached to request failures.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Classified failure returned by the adapter.
///
/// HTTP error statuses (4xx/5xx) are never reported here; they arrive as ordinary
/// envelopes so callers can interpret the protocol-level outcome themselves.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The transport call failed while the platform reported itself offline.
	#[error("No network connectivity; the platform reports itself offline.")]
	NoNetworkConnectivity,
	/// The transport call for a GET request failed while the platform was online.
	#[error("GET request to `{url}` failed.")]
	GetRequestFailed {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
		/// URL requested by the caller.
		url: String,
	},
	/// The transport call for a POST request failed while the platform was online.
	#[error("POST request to `{url}` failed.")]
	PostRequestFailed {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
		/// URL requested by the caller, before any proxy rewrite.
		url: String,
	},
	/// A response arrived but its body could not be read or parsed as JSON.
	#[error("Response from `{url}` could not be parsed.")]
	ResponseParseFailed {
		/// URL requested by the caller, before any proxy rewrite.
		url: String,
		/// Read or decode failure.
		#[source]
		source: ResponseParseError,
	},
}
impl Error {
	/// Builds the method-specific request failure for a transport cause.
	pub fn request_failed(
		method: HttpMethod,
		src: impl 'static + Send + Sync + StdError,
		url: impl Into<String>,
	) -> Self {
		let source = Box::new(src);
		let url = url.into();

		match method {
			HttpMethod::Get => Self::GetRequestFailed { source, url },
			HttpMethod::Post => Self::PostRequestFailed { source, url },
		}
	}

	/// Builds a [`Error::ResponseParseFailed`] for `url`.
	pub fn response_parse_failed(url: impl Into<String>, source: ResponseParseError) -> Self {
		Self::ResponseParseFailed { url: url.into(), source }
	}

	/// Returns `true` when no response was received.
	pub fn is_transport_failure(&self) -> bool {
		matches!(
			self,
			Self::NoNetworkConnectivity
				| Self::GetRequestFailed { .. }
				| Self::PostRequestFailed { .. }
		)
	}
}

/// Reasons a received response body could not be turned into the caller's type.
#[derive(Debug, ThisError)]
pub enum ResponseParseError {
	/// Reading the body from the transport failed.
	#[error("Response body could not be read.")]
	Body(#[source] BoxError),
	/// The body is not JSON or does not match the requested shape.
	#[error("Response body is not valid JSON for the requested type.")]
	Json(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// The JSON document is followed by non-whitespace data.
	#[error("Response body has trailing data after the JSON document.")]
	TrailingData(#[source] serde_json::Error),
}
impl ResponseParseError {
	/// Wraps a transport body-read failure.
	pub fn body(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Body(Box::new(src))
	}
}

/// A header name or value that cannot be sent over HTTP.
///
/// Never returned on its own: the adapter treats it like any other failure to issue the
/// request and classifies it as a request failure or missing connectivity.
#[derive(Debug, ThisError)]
#[error("Header `{name}` is not a valid HTTP header.")]
pub struct InvalidHeaderError {
	/// Offending header name as supplied.
	pub name: String,
	/// Underlying validation failure.
	#[source]
	pub source: oauth2::http::Error,
}
impl InvalidHeaderError {
	/// Wraps a header validation failure for `name`.
	pub fn new(name: impl Into<String>, source: impl Into<oauth2::http::Error>) -> Self {
		Self { name: name.into(), source: source.into() }
	}
}
