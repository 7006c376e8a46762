//! Transport primitives consumed by the adapter.
//!
//! The module exposes [`TransportPort`] and [`TransportResponse`] so downstream crates can plug
//! any HTTP stack into [`HttpAdapter`](crate::adapter::HttpAdapter). A transport resolves a
//! [`TransportRequest`] into a response whose status and headers are available immediately and
//! whose body is read in a second step, mirroring the fetch contract. Connection-level failures
//! are reported through [`TransportPort::TransportError`]; HTTP error statuses are ordinary
//! responses.

// std
use std::convert::Infallible;
// crates.io
use oauth2::http::Method;
// self
use crate::_prelude::*;

/// Boxed, `Send` future returned by transports.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Request methods issued by the adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`, used for discovery and metadata documents.
	Get,
	/// `POST`, used for token exchanges.
	Post,
}
impl HttpMethod {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
		}
	}

	/// Converts into the `http` crate method.
	pub fn as_http(self) -> Method {
		match self {
			HttpMethod::Get => Method::GET,
			HttpMethod::Post => Method::POST,
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully built request handed to a [`TransportPort`].
///
/// The adapter constructs one per call and never mutates it afterwards. `url` is either the
/// caller's absolute URL or, for proxy-routed POSTs, the relay path.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// Request method.
	pub method: HttpMethod,
	/// Target URL or path.
	pub url: String,
	/// Native header collection.
	pub headers: HeaderMap,
	/// Request body; always `None` for GET.
	pub body: Option<String>,
}
impl TransportRequest {
	/// Builds a GET request without a body.
	pub fn get(url: impl Into<String>, headers: HeaderMap) -> Self {
		Self { method: HttpMethod::Get, url: url.into(), headers, body: None }
	}

	/// Builds a POST request carrying `body`.
	pub fn post(url: impl Into<String>, headers: HeaderMap, body: impl Into<String>) -> Self {
		Self { method: HttpMethod::Post, url: url.into(), headers, body: Some(body.into()) }
	}
}

/// Response produced by a [`TransportPort`] whose body has not been read yet.
pub trait TransportResponse
where
	Self: 'static + Send,
{
	/// Error emitted while reading the body.
	type BodyError: 'static + Send + Sync + StdError;

	/// Numeric HTTP status code.
	fn status(&self) -> u16;

	/// Native response header collection.
	fn headers(&self) -> &HeaderMap;

	/// Reads the full body.
	fn into_body(self) -> TransportFuture<'static, Result<Vec<u8>, Self::BodyError>>;
}

/// Network-call primitive the adapter depends on.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back many adapters
/// behind an `Arc`. The returned future must be `Send` and must own whatever it needs beyond
/// the borrow of `self`. Reject only on connection-level failures (DNS, TCP, TLS, invalid
/// target); a 4xx/5xx response is a successful call.
pub trait TransportPort
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted when the call itself fails.
	type TransportError: 'static + Send + Sync + StdError;
	/// Response type carrying status, headers, and the unread body.
	type Response: TransportResponse;

	/// Issues `request`.
	fn call(
		&self,
		request: TransportRequest,
	) -> TransportFuture<'_, Result<Self::Response, Self::TransportError>>;
}

/// Response whose body is already in memory.
///
/// Handy for transports that buffer eagerly and for scripted transports in tests.
#[derive(Clone, Debug, Default)]
pub struct BufferedResponse {
	/// Numeric HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl BufferedResponse {
	/// Builds a response with no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Appends a header; panics on invalid names or values, so keep it to literals.
	pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
		self.headers.append(name, HeaderValue::from_static(value));

		self
	}
}
impl TransportResponse for BufferedResponse {
	type BodyError = Infallible;

	fn status(&self) -> u16 {
		self.status
	}

	fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	fn into_body(self) -> TransportFuture<'static, Result<Vec<u8>, Self::BodyError>> {
		Box::pin(async move { Ok(self.body) })
	}
}

/// Errors raised by [`ReqwestTransport`].
#[cfg(feature = "reqwest")]
#[derive(Debug, ThisError)]
pub enum ReqwestTransportError {
	/// The request URL is neither absolute nor resolvable against the base URL.
	#[error("Request URL `{url}` could not be resolved.")]
	InvalidUrl {
		/// URL or path as handed to the transport.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Underlying reqwest failure.
	#[error(transparent)]
	Reqwest(#[from] ReqwestError),
}

/// Thin wrapper around [`ReqwestClient`] implementing [`TransportPort`].
///
/// Relative targets (such as the proxy relay path) are resolved against `base_url`; without
/// one they fail as transport errors. Redirect handling is whatever the wrapped client is
/// configured to do.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: Option<Url>,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, base_url: None }
	}

	/// Sets the origin relative request targets resolve against.
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = Some(base_url);

		self
	}

	/// Returns the configured base URL, if any.
	pub fn base_url(&self) -> Option<&Url> {
		self.base_url.as_ref()
	}

	fn resolve(&self, target: &str) -> Result<Url, ReqwestTransportError> {
		let resolved = match (Url::parse(target), &self.base_url) {
			(Ok(url), _) => Ok(url),
			(Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base.join(target),
			(Err(e), _) => Err(e),
		};

		resolved
			.map_err(|source| ReqwestTransportError::InvalidUrl { url: target.to_owned(), source })
	}

	async fn send(
		&self,
		request: TransportRequest,
	) -> Result<reqwest::Response, ReqwestTransportError> {
		let url = self.resolve(&request.url)?;
		let mut builder =
			self.client.request(request.method.as_http(), url).headers(request.headers);

		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		Ok(builder.send().await?)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl TransportPort for ReqwestTransport {
	type Response = reqwest::Response;
	type TransportError = ReqwestTransportError;

	fn call(
		&self,
		request: TransportRequest,
	) -> TransportFuture<'_, Result<Self::Response, Self::TransportError>> {
		Box::pin(self.send(request))
	}
}
#[cfg(feature = "reqwest")]
impl TransportResponse for reqwest::Response {
	type BodyError = ReqwestError;

	fn status(&self) -> u16 {
		reqwest::Response::status(self).as_u16()
	}

	fn headers(&self) -> &HeaderMap {
		reqwest::Response::headers(self)
	}

	fn into_body(self) -> TransportFuture<'static, Result<Vec<u8>, Self::BodyError>> {
		Box::pin(async move { Ok(self.bytes().await?.to_vec()) })
	}
}
